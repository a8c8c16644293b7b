/// Initiator-side map of outstanding requests to one-shot completion slots.
pub mod correlator;
