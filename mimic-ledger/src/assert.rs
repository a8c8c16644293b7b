use crate::{
    error::LedgerError,
    ledger::{FieldVerdict, ReconciliationResult, display_or_na},
    record::FieldName,
};
use itertools::Itertools;
use rust_decimal::Decimal;

impl ReconciliationResult {
    /// Assert every verdict matched.
    ///
    /// The failure message lists every mismatching field with all three values.
    pub fn assert_parity(&self) -> Result<&Self, LedgerError> {
        if self.passed {
            return Ok(self);
        }

        let mismatches = self
            .verdicts
            .iter()
            .filter(|verdict| !verdict.matched)
            .map(format_verdict)
            .join("\n");

        Err(LedgerError::ParityFailure {
            key: self.key.clone(),
            mismatches,
        })
    }

    /// Re-check the `amount` and `price` verdicts pairwise against the supplied `tolerance`.
    ///
    /// Only pairs with both sides present are re-checked; a side reported as `N/A` by
    /// reconciliation does not participate, unlike the reconciliation match itself which records
    /// the absence on the verdict.
    pub fn assert_amount_match(&self, tolerance: Decimal) -> Result<&Self, LedgerError> {
        for field in [FieldName::Amount, FieldName::Price] {
            let verdict = self.require_verdict(field)?;

            let sides = [&verdict.fix, &verdict.mq, &verdict.api];
            let pairs = [(0usize, 1usize), (0, 2), (1, 2)];

            let within = pairs.into_iter().all(|(left, right)| {
                match (
                    sides[left].as_ref().and_then(|value| value.as_decimal()),
                    sides[right].as_ref().and_then(|value| value.as_decimal()),
                ) {
                    (Some(a), Some(b)) => (a - b).abs() <= tolerance,
                    _ => true,
                }
            });

            if !within {
                return Err(self.failure(verdict));
            }
        }

        Ok(self)
    }

    /// Assert the settlement-date verdict matched.
    pub fn assert_settlement_date_match(&self) -> Result<&Self, LedgerError> {
        self.assert_field_match(FieldName::SettlementDate)
    }

    /// Assert the named verdict matched.
    pub fn assert_field_match(&self, field: FieldName) -> Result<&Self, LedgerError> {
        let verdict = self.require_verdict(field)?;

        if verdict.matched {
            Ok(self)
        } else {
            Err(self.failure(verdict))
        }
    }

    fn require_verdict(&self, field: FieldName) -> Result<&FieldVerdict, LedgerError> {
        self.verdict(field).ok_or(LedgerError::MissingVerdict {
            key: self.key.clone(),
            field,
        })
    }

    fn failure(&self, verdict: &FieldVerdict) -> LedgerError {
        LedgerError::AssertionFailure {
            key: self.key.clone(),
            field: verdict.field,
            fix: display_or_na(verdict.fix.as_ref()),
            mq: display_or_na(verdict.mq.as_ref()),
            api: display_or_na(verdict.api.as_ref()),
        }
    }
}

fn format_verdict(verdict: &FieldVerdict) -> String {
    format!(
        "{}: fix={} mq={} api={}",
        verdict.field,
        display_or_na(verdict.fix.as_ref()),
        display_or_na(verdict.mq.as_ref()),
        display_or_na(verdict.api.as_ref()),
    )
}
