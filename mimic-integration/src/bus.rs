use crate::error::BusError;
use fnv::FnvHashMap;
use parking_lot::Mutex;
use smol_str::SmolStr;
use std::{future::Future, time::Duration};
use tokio::sync::broadcast;

/// Messaging-bus collaborator: destination-addressed publish and awaited consumption with
/// timeouts. Tests use this seam to populate the MQ reconciliation source.
pub trait MessageBus
where
    Self: Send + Sync,
{
    fn publish(
        &self,
        destination: &str,
        payload: String,
    ) -> impl Future<Output = Result<(), BusError>> + Send;

    fn listen(
        &self,
        destination: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<String, BusError>> + Send;

    fn listen_with_filter<F>(
        &self,
        destination: &str,
        predicate: F,
        timeout: Duration,
    ) -> impl Future<Output = Result<String, BusError>> + Send
    where
        F: Fn(&str) -> bool + Send + Sync;
}

const TOPIC_CAPACITY: usize = 256;

/// In-process [`MessageBus`] backed by one broadcast channel per destination.
///
/// Messages published to a destination with no active listener are dropped, matching topic
/// semantics.
#[derive(Debug, Default)]
pub struct ChannelBus {
    topics: Mutex<FnvHashMap<SmolStr, broadcast::Sender<String>>>,
}

impl ChannelBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn topic(&self, destination: &str) -> broadcast::Sender<String> {
        self.topics
            .lock()
            .entry(SmolStr::new(destination))
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .clone()
    }
}

impl MessageBus for ChannelBus {
    async fn publish(&self, destination: &str, payload: String) -> Result<(), BusError> {
        // A send error only means no listener is currently subscribed
        let _ = self.topic(destination).send(payload);
        Ok(())
    }

    async fn listen(&self, destination: &str, timeout: Duration) -> Result<String, BusError> {
        self.listen_with_filter(destination, |_| true, timeout)
            .await
    }

    async fn listen_with_filter<F>(
        &self,
        destination: &str,
        predicate: F,
        timeout: Duration,
    ) -> Result<String, BusError>
    where
        F: Fn(&str) -> bool + Send + Sync,
    {
        let mut rx = self.topic(destination).subscribe();

        let consume = async {
            loop {
                match rx.recv().await {
                    Ok(payload) if predicate(&payload) => break Ok(payload),
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => {
                        break Err(BusError::Closed(SmolStr::new(destination)));
                    }
                }
            }
        };

        tokio::time::timeout(timeout, consume)
            .await
            .map_err(|_| BusError::Timeout(SmolStr::new(destination)))?
    }
}
