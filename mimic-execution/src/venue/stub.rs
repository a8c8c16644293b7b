use crate::error::ExecutionError;
use mimic_message::envelope::MessageEnvelope;
use parking_lot::RwLock;
use smol_str::{SmolStr, format_smolstr};
use std::{
    fmt::{Debug, Formatter},
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tracing::warn;

/// Predicate deciding whether a stub rule applies to an inbound message.
pub type StubPredicate = Arc<dyn Fn(&MessageEnvelope) -> bool + Send + Sync>;

/// Synthesises a venue response from the matched inbound message.
///
/// Returning `None` means the rule declines to respond for this invocation.
pub type ResponseGenerator = Arc<dyn Fn(&MessageEnvelope) -> Option<MessageEnvelope> + Send + Sync>;

/// A single programmed venue behaviour: predicate, ordered response sequence, delay and label.
///
/// The response sequence advances by one per invocation and saturates at the final generator,
/// which then answers every subsequent invocation (the sticky terminal generator). Advancement
/// is linearizable across concurrent callers.
pub struct StubRule {
    predicate: StubPredicate,
    responses: Vec<ResponseGenerator>,
    delay: Duration,
    label: SmolStr,
    invocations: AtomicU64,
}

impl StubRule {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Number of times [`Self::generate_response`] has been invoked.
    pub fn call_count(&self) -> u64 {
        self.invocations.load(Ordering::Acquire)
    }

    pub fn response_sequence_len(&self) -> usize {
        self.responses.len()
    }

    /// Evaluate the predicate, converting any panic into "no match".
    ///
    /// A malformed message must not abort the registry scan, so faults are logged and the rule
    /// simply does not match. The rule stays registered.
    pub fn matches(&self, message: &MessageEnvelope) -> bool {
        catch_unwind(AssertUnwindSafe(|| (self.predicate)(message))).unwrap_or_else(|_| {
            warn!(
                label = %self.label,
                %message,
                "stub predicate panicked - treating as no match"
            );
            false
        })
    }

    /// Run the next response generator in the sequence against `request`.
    pub fn generate_response(&self, request: &MessageEnvelope) -> Option<MessageEnvelope> {
        let invocation = self.invocations.fetch_add(1, Ordering::AcqRel);
        let index = (invocation as usize).min(self.responses.len() - 1);
        (self.responses[index])(request)
    }
}

impl Debug for StubRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubRule")
            .field("label", &self.label)
            .field("responses", &self.responses.len())
            .field("delay", &self.delay)
            .field("invocations", &self.call_count())
            .finish_non_exhaustive()
    }
}

/// Ordered, thread-safe rule set programming the synthetic venue.
///
/// Rules are evaluated in registration order; concurrent readers evaluate against a snapshot of
/// the prefix visible at entry, so [`Self::reset`] never synchronises with evaluations in
/// flight.
#[derive(Debug, Default)]
pub struct StubRegistry {
    rules: RwLock<Vec<Arc<StubRule>>>,
}

impl StubRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin registering a rule matching messages the `predicate` accepts.
    pub fn when<P>(&self, predicate: P) -> StubBuilder<'_>
    where
        P: Fn(&MessageEnvelope) -> bool + Send + Sync + 'static,
    {
        StubBuilder {
            registry: self,
            predicate: Arc::new(predicate),
            responses: Vec::new(),
            delay: Duration::ZERO,
            label: None,
        }
    }

    /// First rule, in registration order, whose predicate accepts `message`.
    pub fn find_match(&self, message: &MessageEnvelope) -> Option<Arc<StubRule>> {
        let rules: Vec<_> = self.rules.read().clone();

        rules.into_iter().find(|rule| rule.matches(message))
    }

    /// Drop every registered rule. Matches already in flight keep their rule alive.
    pub fn reset(&self) {
        self.rules.write().clear();
    }

    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }

    /// Snapshot copy of the current rule list.
    pub fn mappings(&self) -> Vec<Arc<StubRule>> {
        self.rules.read().clone()
    }

    fn register(&self, rule: StubRule) -> Arc<StubRule> {
        let rule = Arc::new(rule);
        self.rules.write().push(Arc::clone(&rule));
        rule
    }
}

/// Fluent registration of a [`StubRule`], obtained via [`StubRegistry::when`].
pub struct StubBuilder<'a> {
    registry: &'a StubRegistry,
    predicate: StubPredicate,
    responses: Vec<ResponseGenerator>,
    delay: Duration,
    label: Option<SmolStr>,
}

impl StubBuilder<'_> {
    /// Append a response generator. Call repeatedly to build a sequential response sequence.
    pub fn respond<G>(mut self, generator: G) -> Self
    where
        G: Fn(&MessageEnvelope) -> Option<MessageEnvelope> + Send + Sync + 'static,
    {
        self.responses.push(Arc::new(generator));
        self
    }

    /// Append an already-boxed generator, eg/ one built by [`super::respond`].
    pub fn respond_with(mut self, generator: ResponseGenerator) -> Self {
        self.responses.push(generator);
        self
    }

    /// Suspend for `delay` before responding. The suspension is cancelled on engine shutdown.
    pub fn delay(self, delay: Duration) -> Self {
        Self { delay, ..self }
    }

    pub fn label<S: Into<SmolStr>>(self, label: S) -> Self {
        Self {
            label: Some(label.into()),
            ..self
        }
    }

    /// Append the rule to the registry.
    ///
    /// Fails with [`ExecutionError::EmptyResponseSequence`] when no generator was supplied.
    pub fn register(self) -> Result<Arc<StubRule>, ExecutionError> {
        if self.responses.is_empty() {
            return Err(ExecutionError::EmptyResponseSequence);
        }

        let label = self
            .label
            .unwrap_or_else(|| format_smolstr!("stub-{}", self.registry.len()));

        Ok(self.registry.register(StubRule {
            predicate: self.predicate,
            responses: self.responses,
            delay: self.delay,
            label,
            invocations: AtomicU64::new(0),
        }))
    }
}

impl Debug for StubBuilder<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubBuilder")
            .field("responses", &self.responses.len())
            .field("delay", &self.delay)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
