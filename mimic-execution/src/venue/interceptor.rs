use super::stub::{StubRegistry, StubRule};
use crate::error::ExecutionError;
use mimic_integration::{
    channel::UnboundedRx,
    transport::{Session, TransportSink},
};
use mimic_message::{envelope::MessageEnvelope, tag};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Signals the owning [`Interceptor`] to stop, aborting any response delay in flight.
///
/// Dropping the handle is equivalent to calling [`Self::shutdown`].
#[derive(Debug)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

/// Venue-side message handler: matches inbound order messages against the stub registry,
/// applies the rule's delay, synthesises the response, normalises routing headers, propagates
/// correlation fields and hands the response to the transport sink.
#[derive(Debug)]
pub struct Interceptor<Sink> {
    registry: Arc<StubRegistry>,
    sink: Sink,
    session: Session,
    correlation_tags: Vec<u32>,
    shutdown_rx: watch::Receiver<bool>,
}

impl<Sink> Interceptor<Sink>
where
    Sink: TransportSink,
{
    /// Construct an `Interceptor` for the venue side of `session` (`session.local` is the
    /// venue's identity).
    pub fn new(registry: Arc<StubRegistry>, sink: Sink, session: Session) -> (Self, ShutdownHandle) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        (
            Self {
                registry,
                sink,
                session,
                correlation_tags: vec![tag::CL_ORD_ID],
                shutdown_rx,
            },
            ShutdownHandle { tx: shutdown_tx },
        )
    }

    /// Override the tags copied from request to response (minimally the client order id).
    pub fn with_correlation_tags(self, tags: Vec<u32>) -> Self {
        Self {
            correlation_tags: tags,
            ..self
        }
    }

    /// Handle one inbound venue-side message.
    ///
    /// Returns `Ok(false)` when the message is unhandled (no rule matched, the rule declined to
    /// respond, or shutdown interrupted the delay), `Ok(true)` once the response has been handed
    /// to the transport sink.
    pub async fn intercept(&self, message: &MessageEnvelope) -> Result<bool, ExecutionError> {
        let Some(rule) = self.registry.find_match(message) else {
            return Ok(false);
        };

        if !rule.delay().is_zero() && !self.sleep_through_delay(&rule).await {
            info!(
                label = %rule.label(),
                session = %self.session,
                "interceptor shut down mid-delay - dropping response"
            );
            return Ok(false);
        }

        let Some(mut response) = rule.generate_response(message) else {
            warn!(
                label = %rule.label(),
                %message,
                "stub rule generated no response"
            );
            return Ok(false);
        };

        // Route the response back to the original sender
        response.set_sender_comp_id(self.session.local.0.clone());
        response.set_target_comp_id(self.session.remote.0.clone());

        for correlation_tag in &self.correlation_tags {
            if let Some(value) = message.get(*correlation_tag) {
                response.set(*correlation_tag, value.clone());
            }
        }

        match self.sink.send(response, &self.session) {
            Ok(()) => Ok(true),
            Err(transport) => {
                error!(
                    label = %rule.label(),
                    session = %self.session,
                    error = %transport,
                    "interceptor failed to deliver response"
                );
                Err(ExecutionError::Transport(transport))
            }
        }
    }

    /// Wait out the rule's delay. Returns false if shutdown fired first.
    async fn sleep_through_delay(&self, rule: &StubRule) -> bool {
        let mut shutdown_rx = self.shutdown_rx.clone();

        if *shutdown_rx.borrow() {
            return false;
        }

        tokio::select! {
            _ = tokio::time::sleep(rule.delay()) => true,
            // A dropped ShutdownHandle also counts as shutdown
            _ = shutdown_rx.changed() => false,
        }
    }

    /// Consume inbound messages until the channel closes or shutdown fires.
    ///
    /// Transport failures are logged and reported per message; they never terminate the loop.
    pub async fn run(self, mut rx: UnboundedRx<MessageEnvelope>) {
        let mut shutdown_rx = self.shutdown_rx.clone();

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            tokio::select! {
                maybe_message = rx.rx.recv() => match maybe_message {
                    Some(message) => match self.intercept(&message).await {
                        Ok(true) => {}
                        Ok(false) => debug!(%message, "inbound message unhandled"),
                        Err(error) => error!(%error, "interceptor error"),
                    },
                    None => break,
                },
                _ = shutdown_rx.changed() => break,
            }
        }

        info!(session = %self.session, "interceptor shutting down");
    }
}
