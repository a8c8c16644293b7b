use crate::record::FieldName;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use thiserror::Error;

#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize, Error)]
pub enum LedgerError {
    #[error("trade record carries neither a request key nor a venue order id")]
    MissingCorrelationKey,

    #[error("reconciliation mismatch for {key} field {field}: fix={fix} mq={mq} api={api}")]
    AssertionFailure {
        key: SmolStr,
        field: FieldName,
        fix: String,
        mq: String,
        api: String,
    },

    #[error("reconciliation parity failed for {key}:\n{mismatches}")]
    ParityFailure { key: SmolStr, mismatches: String },

    #[error("reconciliation for {key} produced no verdict for field {field}")]
    MissingVerdict { key: SmolStr, field: FieldName },
}
