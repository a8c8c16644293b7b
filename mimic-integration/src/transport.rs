use crate::{
    channel::{Tx, UnboundedTx},
    error::TransportError,
};
use derive_more::{Constructor, Display, From};
use mimic_message::envelope::MessageEnvelope;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt::Formatter;

/// Identifier of one party on a protocol session.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display, From,
)]
pub struct CompId(pub SmolStr);

impl CompId {
    pub fn new<S: Into<SmolStr>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A protocol session as seen from one side: `local` is this side's identity, `remote` is the
/// counterparty.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Constructor,
)]
pub struct Session {
    pub local: CompId,
    pub remote: CompId,
}

impl Session {
    /// The same session viewed from the counterparty's side.
    pub fn reverse(&self) -> Self {
        Self {
            local: self.remote.clone(),
            remote: self.local.clone(),
        }
    }
}

impl std::fmt::Display for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}", self.local, self.remote)
    }
}

/// Outbound delivery seam for protocol messages.
///
/// Concrete wire codecs live outside the harness core; tests and the in-process harness use
/// [`ChannelSink`].
pub trait TransportSink
where
    Self: Send + Sync,
{
    fn send(&self, message: MessageEnvelope, session: &Session) -> Result<(), TransportError>;
}

/// [`TransportSink`] backed by an in-process unbounded channel.
#[derive(Debug, Clone, Constructor)]
pub struct ChannelSink {
    tx: UnboundedTx<(MessageEnvelope, Session), TransportError>,
}

impl TransportSink for ChannelSink {
    fn send(&self, message: MessageEnvelope, session: &Session) -> Result<(), TransportError> {
        self.tx.send((message, session.clone()))
    }
}
