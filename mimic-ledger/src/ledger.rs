use crate::{
    compare::ComparisonConfig,
    error::LedgerError,
    record::{FieldName, TradeRecord, TradeSource},
};
use chrono::NaiveDate;
use derive_more::Display;
use fnv::FnvHashSet;
use indexmap::IndexMap;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tracing::debug;

/// Typed field value carried on a verdict. An absent side renders as `N/A`.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize, Display)]
pub enum VerdictValue {
    #[display("{_0}")]
    Decimal(Decimal),
    #[display("{_0}")]
    Date(NaiveDate),
    #[display("{_0}")]
    Text(SmolStr),
}

impl VerdictValue {
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(value) => Some(*value),
            _ => None,
        }
    }
}

/// Render an optional verdict side, using `N/A` for a source that did not report the field.
pub fn display_or_na(value: Option<&VerdictValue>) -> String {
    value
        .map(ToString::to_string)
        .unwrap_or_else(|| "N/A".to_string())
}

/// Per-field comparison outcome across the three sources.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct FieldVerdict {
    pub field: FieldName,
    pub fix: Option<VerdictValue>,
    pub mq: Option<VerdictValue>,
    pub api: Option<VerdictValue>,
    pub matched: bool,
}

impl FieldVerdict {
    pub fn value(&self, source: TradeSource) -> Option<&VerdictValue> {
        match source {
            TradeSource::Fix => self.fix.as_ref(),
            TradeSource::Mq => self.mq.as_ref(),
            TradeSource::Api => self.api.as_ref(),
        }
    }
}

/// Ordered verdicts for one correlation key, with the aggregate outcome.
///
/// `passed` holds iff every verdict matched.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct ReconciliationResult {
    pub key: SmolStr,
    pub verdicts: Vec<FieldVerdict>,
    pub passed: bool,
}

impl ReconciliationResult {
    pub fn verdict(&self, field: FieldName) -> Option<&FieldVerdict> {
        self.verdicts.iter().find(|verdict| verdict.field == field)
    }
}

#[derive(Debug, Default)]
struct Shards {
    fix: IndexMap<SmolStr, TradeRecord>,
    mq: IndexMap<SmolStr, TradeRecord>,
    api: IndexMap<SmolStr, TradeRecord>,
}

impl Shards {
    fn shard(&self, source: TradeSource) -> &IndexMap<SmolStr, TradeRecord> {
        match source {
            TradeSource::Fix => &self.fix,
            TradeSource::Mq => &self.mq,
            TradeSource::Api => &self.api,
        }
    }

    fn shard_mut(&mut self, source: TradeSource) -> &mut IndexMap<SmolStr, TradeRecord> {
        match source {
            TradeSource::Fix => &mut self.fix,
            TradeSource::Mq => &mut self.mq,
            TradeSource::Api => &mut self.api,
        }
    }
}

/// Append-only (within a test) store of trade records, sharded by source, with the three-way
/// comparison engine over them.
///
/// Sources may be read and written concurrently; reconciling a key takes a consistent snapshot
/// of that key's three records.
#[derive(Debug, Default)]
pub struct ReconciliationLedger {
    shards: RwLock<Shards>,
    config: ComparisonConfig,
}

impl ReconciliationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ComparisonConfig) -> Self {
        Self {
            shards: RwLock::new(Shards::default()),
            config,
        }
    }

    pub fn config(&self) -> ComparisonConfig {
        self.config
    }

    /// Insert `record` under its correlation key; a repeated key overwrites in place.
    ///
    /// Fails with [`LedgerError::MissingCorrelationKey`] when the record carries neither a
    /// request key nor a venue order id.
    pub fn add_record(&self, record: TradeRecord) -> Result<SmolStr, LedgerError> {
        let key = record
            .correlation_key()
            .ok_or(LedgerError::MissingCorrelationKey)?;

        debug!(source = %record.source, %key, symbol = %record.symbol, "ledger record added");
        self.shards
            .write()
            .shard_mut(record.source)
            .insert(key.clone(), record);

        Ok(key)
    }

    /// Snapshot of the record stored for `key` on `source`.
    pub fn record(&self, source: TradeSource, key: &str) -> Option<TradeRecord> {
        self.shards.read().shard(source).get(key).cloned()
    }

    pub fn len(&self, source: TradeSource) -> usize {
        self.shards.read().shard(source).len()
    }

    pub fn is_empty(&self) -> bool {
        let shards = self.shards.read();
        shards.fix.is_empty() && shards.mq.is_empty() && shards.api.is_empty()
    }

    /// Drop all records from all three sources.
    pub fn clear(&self) {
        let mut shards = self.shards.write();
        shards.fix.clear();
        shards.mq.clear();
        shards.api.clear();
    }

    /// Compare the records stored under `key` field by field.
    ///
    /// Pure with respect to the stored records: reconciling the same key twice yields identical
    /// verdicts.
    pub fn reconcile(&self, key: &str) -> ReconciliationResult {
        let (fix, mq, api) = {
            let shards = self.shards.read();
            (
                shards.fix.get(key).cloned(),
                shards.mq.get(key).cloned(),
                shards.api.get(key).cloned(),
            )
        };

        self.compare(key, fix.as_ref(), mq.as_ref(), api.as_ref())
    }

    /// Reconcile the union of keys across the three sources, preserving insertion order (FIX
    /// first, then unseen MQ keys, then unseen API keys).
    pub fn reconcile_all(&self) -> Vec<ReconciliationResult> {
        let snapshots: Vec<(SmolStr, Option<TradeRecord>, Option<TradeRecord>, Option<TradeRecord>)> = {
            let shards = self.shards.read();
            let mut seen = FnvHashSet::default();

            shards
                .fix
                .keys()
                .chain(shards.mq.keys())
                .chain(shards.api.keys())
                .filter(|key| seen.insert(key.clone()))
                .map(|key| {
                    (
                        key.clone(),
                        shards.fix.get(key).cloned(),
                        shards.mq.get(key).cloned(),
                        shards.api.get(key).cloned(),
                    )
                })
                .collect()
        };

        snapshots
            .iter()
            .map(|(key, fix, mq, api)| self.compare(key, fix.as_ref(), mq.as_ref(), api.as_ref()))
            .collect()
    }

    /// Whether the FIX source observed a rejection (exec-type "8") for `symbol`.
    pub fn verify_rejection_handled(&self, symbol: &str) -> bool {
        self.shards.read().fix.values().any(|record| {
            record.symbol == symbol && record.exec_type.as_deref() == Some("8")
        })
    }

    fn compare(
        &self,
        key: &str,
        fix: Option<&TradeRecord>,
        mq: Option<&TradeRecord>,
        api: Option<&TradeRecord>,
    ) -> ReconciliationResult {
        let verdicts: Vec<FieldVerdict> = FieldName::ORDERED
            .into_iter()
            .map(|field| self.field_verdict(field, fix, mq, api))
            .collect();

        let passed = verdicts.iter().all(|verdict| verdict.matched);

        ReconciliationResult {
            key: SmolStr::new(key),
            verdicts,
            passed,
        }
    }

    fn field_verdict(
        &self,
        field: FieldName,
        fix: Option<&TradeRecord>,
        mq: Option<&TradeRecord>,
        api: Option<&TradeRecord>,
    ) -> FieldVerdict {
        let fix = fix.and_then(|record| field_value(field, record));
        let mq = mq.and_then(|record| field_value(field, record));
        let api = api.and_then(|record| field_value(field, record));

        let matched = match field {
            FieldName::Price | FieldName::Quantity | FieldName::Amount => {
                pairwise_present(&fix, &mq, &api, |a, b| match (a.as_decimal(), b.as_decimal()) {
                    (Some(a), Some(b)) => self.config.numeric_eq(a, b),
                    _ => false,
                })
            }
            FieldName::SettlementDate
            | FieldName::Symbol
            | FieldName::Currency
            | FieldName::Account => pairwise_present(&fix, &mq, &api, |a, b| a == b),
        };

        FieldVerdict {
            field,
            fix,
            mq,
            api,
            matched,
        }
    }
}

fn field_value(field: FieldName, record: &TradeRecord) -> Option<VerdictValue> {
    match field {
        FieldName::Price => record.price.map(VerdictValue::Decimal),
        FieldName::Quantity => record.quantity.map(VerdictValue::Decimal),
        FieldName::Amount => record.amount.map(VerdictValue::Decimal),
        FieldName::SettlementDate => record.settlement_date.map(VerdictValue::Date),
        FieldName::Symbol => Some(VerdictValue::Text(record.symbol.clone())),
        FieldName::Currency => record.currency.clone().map(VerdictValue::Text),
        FieldName::Account => record.account.clone().map(VerdictValue::Text),
    }
}

/// All pair relations across the three sides hold; a pair with an absent side holds trivially
/// (the verdict reports that side as `N/A`).
fn pairwise_present<F>(
    fix: &Option<VerdictValue>,
    mq: &Option<VerdictValue>,
    api: &Option<VerdictValue>,
    eq: F,
) -> bool
where
    F: Fn(&VerdictValue, &VerdictValue) -> bool,
{
    [(fix, mq), (fix, api), (mq, api)]
        .into_iter()
        .all(|(a, b)| match (a, b) {
            (Some(a), Some(b)) => eq(a, b),
            _ => true,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimic_message::key::RequestKey;
    use rust_decimal_macros::dec;

    fn settlement() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 11).unwrap()
    }

    fn full_record(source: TradeSource, key: &str, price: Decimal) -> TradeRecord {
        TradeRecord::builder(source, "MSFT")
            .request_key(RequestKey::new(key))
            .quantity(dec!(250))
            .price(price)
            .amount(price * dec!(250))
            .currency("USD")
            .settlement_date(settlement())
            .account("ACC-1")
            .build()
    }

    #[test]
    fn test_reconcile_matching_records_passes_with_seven_ordered_verdicts() {
        let ledger = ReconciliationLedger::new();
        for source in [TradeSource::Fix, TradeSource::Mq, TradeSource::Api] {
            ledger.add_record(full_record(source, "K1", dec!(420.5))).unwrap();
        }

        let result = ledger.reconcile("K1");

        assert!(result.passed);
        let fields: Vec<FieldName> = result.verdicts.iter().map(|v| v.field).collect();
        assert_eq!(fields, FieldName::ORDERED);
        assert!(result.verdicts.iter().all(|verdict| verdict.matched));
    }

    #[test]
    fn test_reconcile_price_outside_tolerance_fails() {
        let ledger = ReconciliationLedger::new();
        ledger.add_record(full_record(TradeSource::Fix, "K1", dec!(420.5))).unwrap();
        ledger.add_record(full_record(TradeSource::Mq, "K1", dec!(420.5))).unwrap();
        ledger.add_record(full_record(TradeSource::Api, "K1", dec!(420.51))).unwrap();

        let result = ledger.reconcile("K1");

        assert!(!result.passed);
        assert!(!result.verdict(FieldName::Price).unwrap().matched);
        // Quantity still matches; a single field failure is localised
        assert!(result.verdict(FieldName::Quantity).unwrap().matched);
    }

    #[test]
    fn test_reconcile_within_tolerance_passes() {
        let ledger = ReconciliationLedger::new();
        ledger.add_record(full_record(TradeSource::Fix, "K1", dec!(420.5))).unwrap();
        ledger.add_record(full_record(TradeSource::Mq, "K1", dec!(420.50009))).unwrap();

        let price = ledger.reconcile("K1");
        assert!(price.verdict(FieldName::Price).unwrap().matched);
    }

    #[test]
    fn test_absent_source_reports_na_and_matches() {
        let ledger = ReconciliationLedger::new();
        ledger.add_record(full_record(TradeSource::Fix, "K1", dec!(420.5))).unwrap();
        ledger.add_record(full_record(TradeSource::Mq, "K1", dec!(420.5))).unwrap();

        let result = ledger.reconcile("K1");

        assert!(result.passed);
        let price = result.verdict(FieldName::Price).unwrap();
        assert!(price.api.is_none());
        assert_eq!(display_or_na(price.api.as_ref()), "N/A");
    }

    #[test]
    fn test_record_without_correlation_key_is_rejected() {
        let ledger = ReconciliationLedger::new();

        let result = ledger.add_record(TradeRecord::builder(TradeSource::Fix, "MSFT").build());

        assert!(matches!(result, Err(LedgerError::MissingCorrelationKey)));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_repeat_key_overwrites_in_place() {
        let ledger = ReconciliationLedger::new();
        ledger.add_record(full_record(TradeSource::Fix, "K1", dec!(1))).unwrap();
        ledger.add_record(full_record(TradeSource::Fix, "K1", dec!(2))).unwrap();

        assert_eq!(ledger.len(TradeSource::Fix), 1);
        assert_eq!(
            ledger.record(TradeSource::Fix, "K1").unwrap().price,
            Some(dec!(2))
        );
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let ledger = ReconciliationLedger::new();
        ledger.add_record(full_record(TradeSource::Fix, "K1", dec!(420.5))).unwrap();
        ledger.add_record(full_record(TradeSource::Api, "K1", dec!(421.5))).unwrap();

        let first: Vec<bool> = ledger.reconcile("K1").verdicts.iter().map(|v| v.matched).collect();
        let second: Vec<bool> = ledger.reconcile("K1").verdicts.iter().map(|v| v.matched).collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_reconcile_all_preserves_insertion_order_across_sources() {
        let ledger = ReconciliationLedger::new();
        ledger.add_record(full_record(TradeSource::Fix, "K1", dec!(1))).unwrap();
        ledger.add_record(full_record(TradeSource::Fix, "K2", dec!(1))).unwrap();
        ledger.add_record(full_record(TradeSource::Mq, "K2", dec!(1))).unwrap();
        ledger.add_record(full_record(TradeSource::Mq, "K3", dec!(1))).unwrap();
        ledger.add_record(full_record(TradeSource::Api, "K4", dec!(1))).unwrap();

        let results = ledger.reconcile_all();
        let keys: Vec<&str> = results.iter().map(|result| result.key.as_str()).collect();

        assert_eq!(keys, vec!["K1", "K2", "K3", "K4"]);
    }

    #[test]
    fn test_verify_rejection_handled_requires_fix_exec_type_8() {
        let ledger = ReconciliationLedger::new();
        ledger
            .add_record(
                TradeRecord::builder(TradeSource::Fix, "AAPL")
                    .request_key(RequestKey::new("K1"))
                    .exec_type("8")
                    .build(),
            )
            .unwrap();
        ledger
            .add_record(
                TradeRecord::builder(TradeSource::Mq, "TSLA")
                    .request_key(RequestKey::new("K2"))
                    .exec_type("8")
                    .build(),
            )
            .unwrap();

        assert!(ledger.verify_rejection_handled("AAPL"));
        // MQ-source rejections do not count
        assert!(!ledger.verify_rejection_handled("TSLA"));
        assert!(!ledger.verify_rejection_handled("MSFT"));
    }

    #[test]
    fn test_clear_drops_all_three_shards() {
        let ledger = ReconciliationLedger::new();
        for source in [TradeSource::Fix, TradeSource::Mq, TradeSource::Api] {
            ledger.add_record(full_record(source, "K1", dec!(1))).unwrap();
        }

        ledger.clear();

        assert!(ledger.is_empty());
        assert!(ledger.reconcile_all().is_empty());
    }

    #[test]
    fn test_settlement_date_mismatch_fails_exactly() {
        let ledger = ReconciliationLedger::new();
        ledger.add_record(full_record(TradeSource::Fix, "K1", dec!(1))).unwrap();

        let shifted = TradeRecord::builder(TradeSource::Api, "MSFT")
            .request_key(RequestKey::new("K1"))
            .settlement_date(NaiveDate::from_ymd_opt(2026, 8, 12).unwrap())
            .build();
        ledger.add_record(shifted).unwrap();

        let result = ledger.reconcile("K1");
        assert!(!result.verdict(FieldName::SettlementDate).unwrap().matched);
    }
}
