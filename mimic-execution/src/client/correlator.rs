use crate::error::ExecutionError;
use fnv::FnvHashMap;
use mimic_integration::transport::{Session, TransportSink};
use mimic_message::{envelope::MessageEnvelope, key::RequestKey, tag};
use parking_lot::{Mutex, RwLock};
use std::{collections::hash_map::Entry, time::Duration};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Deadline applied when a caller does not supply one.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

/// Initiator-side request/response correlator.
///
/// Outstanding requests are one-shot completion slots keyed by [`RequestKey`]. The transport
/// source calls [`Self::deliver`] for every inbound application message; the first message whose
/// extracted key matches a slot completes it, exactly once. Slots expire on timeout, and a
/// late-arriving match is discarded rather than re-opening the slot.
#[derive(Debug)]
pub struct Correlator<Sink> {
    sink: Sink,
    session: RwLock<Option<Session>>,
    slots: Mutex<FnvHashMap<RequestKey, oneshot::Sender<MessageEnvelope>>>,
    key_tag: u32,
}

impl<Sink> Correlator<Sink>
where
    Sink: TransportSink,
{
    pub fn new(sink: Sink) -> Self {
        Self {
            sink,
            session: RwLock::new(None),
            slots: Mutex::new(FnvHashMap::default()),
            key_tag: tag::CL_ORD_ID,
        }
    }

    /// Override the tag the correlation key is extracted from.
    pub fn with_key_tag(self, key_tag: u32) -> Self {
        Self { key_tag, ..self }
    }

    pub fn bind_session(&self, session: Session) {
        *self.session.write() = Some(session);
    }

    pub fn unbind_session(&self) {
        *self.session.write() = None;
    }

    pub fn session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    /// Send `message` and await the first inbound message correlated to `key`.
    ///
    /// The slot is registered before the send, so a response arriving faster than this task can
    /// resume cannot be lost. Completes with [`ExecutionError::Timeout`] after `timeout`; the
    /// slot is removed atomically and any later match is silently discarded.
    pub async fn send_and_await(
        &self,
        message: MessageEnvelope,
        key: RequestKey,
        timeout: Duration,
    ) -> Result<MessageEnvelope, ExecutionError> {
        let session = self.session().ok_or(ExecutionError::NoSession)?;

        let (slot_tx, slot_rx) = oneshot::channel();
        match self.slots.lock().entry(key.clone()) {
            Entry::Occupied(_) => return Err(ExecutionError::DuplicateKey(key)),
            Entry::Vacant(vacant) => {
                vacant.insert(slot_tx);
            }
        }

        if let Err(transport) = self.sink.send(message, &session) {
            self.remove_slot(&key);
            return Err(ExecutionError::Transport(transport));
        }

        match tokio::time::timeout(timeout, slot_rx).await {
            Ok(Ok(response)) => Ok(response),
            // Slot sender dropped without completing, eg/ the correlator was cleared
            Ok(Err(_)) => Err(ExecutionError::Timeout(key)),
            Err(_) => {
                self.remove_slot(&key);
                Err(ExecutionError::Timeout(key))
            }
        }
    }

    /// [`Self::send_and_await`] with [`DEFAULT_RESPONSE_TIMEOUT`].
    pub async fn send_and_await_default(
        &self,
        message: MessageEnvelope,
        key: RequestKey,
    ) -> Result<MessageEnvelope, ExecutionError> {
        self.send_and_await(message, key, DEFAULT_RESPONSE_TIMEOUT)
            .await
    }

    /// Fire-and-forget send; no completion slot is registered.
    pub fn send(&self, message: MessageEnvelope) -> Result<(), ExecutionError> {
        let session = self.session().ok_or(ExecutionError::NoSession)?;

        self.sink
            .send(message, &session)
            .map_err(ExecutionError::Transport)
    }

    /// Transport-source entry point for inbound application messages.
    ///
    /// Returns whether this correlator claimed the message; unclaimed messages may be handled
    /// by another observer.
    pub fn deliver(&self, message: &MessageEnvelope) -> bool {
        let Some(key) = message.get_text(self.key_tag) else {
            debug!(%message, "inbound message carries no correlation key - not claimed");
            return false;
        };
        let key = RequestKey::new(key);

        let Some(slot) = self.slots.lock().remove(&key) else {
            debug!(%key, "no outstanding request for inbound message - not claimed");
            return false;
        };

        if slot.send(message.clone()).is_err() {
            // The awaiting side gave up (timed out or was cancelled) after we won the slot
            warn!(%key, "request abandoned before correlated response could be handed over");
            return false;
        }

        true
    }

    /// Number of outstanding request slots.
    pub fn pending(&self) -> usize {
        self.slots.lock().len()
    }

    /// Drop every outstanding slot, failing their awaiting futures.
    pub fn clear(&self) {
        self.slots.lock().clear();
    }

    fn remove_slot(&self, key: &RequestKey) {
        self.slots.lock().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimic_integration::{
        channel::mpsc_unbounded,
        transport::{ChannelSink, CompId},
    };
    use std::sync::Arc;

    fn session() -> Session {
        Session::new(CompId::new("INITIATOR"), CompId::new("VENUE"))
    }

    fn correlator() -> (Correlator<ChannelSink>, mimic_integration::channel::UnboundedRx<(MessageEnvelope, Session)>)
    {
        let (tx, rx) = mpsc_unbounded();
        let correlator = Correlator::new(ChannelSink::new(tx));
        correlator.bind_session(session());
        (correlator, rx)
    }

    fn request(key: &str) -> MessageEnvelope {
        MessageEnvelope::new(tag::msg_type::NEW_ORDER_SINGLE).with_text(tag::CL_ORD_ID, key)
    }

    fn response(key: &str) -> MessageEnvelope {
        MessageEnvelope::new(tag::msg_type::EXECUTION_REPORT)
            .with_text(tag::CL_ORD_ID, key)
            .with_char(tag::EXEC_TYPE, '2')
    }

    #[tokio::test]
    async fn test_send_and_await_completes_on_matching_delivery() {
        let (correlator, mut outbound) = correlator();
        let correlator = Arc::new(correlator);

        let awaiting = tokio::spawn({
            let correlator = Arc::clone(&correlator);
            async move {
                correlator
                    .send_and_await(
                        request("K1"),
                        RequestKey::new("K1"),
                        Duration::from_secs(1),
                    )
                    .await
            }
        });

        // The request reached the transport before any response
        let (sent, _) = outbound.rx.recv().await.unwrap();
        assert_eq!(sent.get_text(tag::CL_ORD_ID), Some("K1"));

        assert!(correlator.deliver(&response("K1")));

        let received = awaiting.await.unwrap().unwrap();
        assert_eq!(received.get_char(tag::EXEC_TYPE), Some('2'));
        assert_eq!(correlator.pending(), 0);
    }

    #[tokio::test]
    async fn test_send_and_await_times_out_and_late_delivery_is_dropped() {
        let (correlator, _outbound) = correlator();

        let result = correlator
            .send_and_await(
                request("K1"),
                RequestKey::new("K1"),
                Duration::from_millis(50),
            )
            .await;

        assert!(matches!(result, Err(ExecutionError::Timeout(_))));
        assert_eq!(correlator.pending(), 0);

        // The slot is not re-opened by a late match
        assert!(!correlator.deliver(&response("K1")));
        assert_eq!(correlator.pending(), 0);
    }

    #[tokio::test]
    async fn test_no_session_fails_synchronously() {
        let (tx, _rx) = mpsc_unbounded();
        let correlator = Correlator::new(ChannelSink::new(tx));

        let result = correlator
            .send_and_await(
                request("K1"),
                RequestKey::new("K1"),
                Duration::from_millis(50),
            )
            .await;

        assert!(matches!(result, Err(ExecutionError::NoSession)));
        assert!(correlator.send(request("K2")).is_err());
    }

    #[tokio::test]
    async fn test_duplicate_key_is_rejected() {
        let (correlator, _outbound) = correlator();
        let correlator = Arc::new(correlator);

        let first = tokio::spawn({
            let correlator = Arc::clone(&correlator);
            async move {
                correlator
                    .send_and_await(
                        request("K1"),
                        RequestKey::new("K1"),
                        Duration::from_millis(250),
                    )
                    .await
            }
        });
        tokio::task::yield_now().await;

        let second = correlator
            .send_and_await(
                request("K1"),
                RequestKey::new("K1"),
                Duration::from_millis(250),
            )
            .await;

        assert!(matches!(second, Err(ExecutionError::DuplicateKey(_))));
        assert!(matches!(
            first.await.unwrap(),
            Err(ExecutionError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_deliveries_complete_slot_exactly_once() {
        let (correlator, _outbound) = correlator();
        let correlator = Arc::new(correlator);

        let awaiting = tokio::spawn({
            let correlator = Arc::clone(&correlator);
            async move {
                correlator
                    .send_and_await(
                        request("K1"),
                        RequestKey::new("K1"),
                        Duration::from_secs(1),
                    )
                    .await
            }
        });
        tokio::task::yield_now().await;

        let claims: Vec<bool> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let correlator = Arc::clone(&correlator);
                    scope.spawn(move || correlator.deliver(&response("K1")))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(claims.iter().filter(|claimed| **claimed).count(), 1);
        assert!(awaiting.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_deliver_without_key_or_slot_is_not_claimed() {
        let (correlator, _outbound) = correlator();

        assert!(!correlator.deliver(&MessageEnvelope::new(tag::msg_type::EXECUTION_REPORT)));
        assert!(!correlator.deliver(&response("UNSEEN")));
    }

    #[tokio::test]
    async fn test_fire_and_forget_send_registers_no_slot() {
        let (correlator, mut outbound) = correlator();

        correlator.send(request("K1")).unwrap();

        assert_eq!(correlator.pending(), 0);
        let (sent, _) = outbound.rx.recv().await.unwrap();
        assert_eq!(sent.get_text(tag::CL_ORD_ID), Some("K1"));
    }
}
