use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Precision and tolerance applied when comparing numeric reconciliation fields.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct ComparisonConfig {
    /// Significant figures both sides are rounded to before differencing.
    pub precision: u32,
    /// Maximum absolute difference still considered equal.
    pub tolerance: Decimal,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            precision: 8,
            // 1e-4
            tolerance: Decimal::new(1, 4),
        }
    }
}

impl ComparisonConfig {
    pub fn new(precision: u32, tolerance: Decimal) -> Self {
        Self {
            precision,
            tolerance,
        }
    }

    /// `a ≈ b` iff `|round(a, precision) - round(b, precision)| <= tolerance`.
    pub fn numeric_eq(&self, a: Decimal, b: Decimal) -> bool {
        let a = round_significant(a, self.precision);
        let b = round_significant(b, self.precision);

        (a - b).abs() <= self.tolerance
    }
}

/// Round to `figures` significant figures using banker's rounding.
pub fn round_significant(value: Decimal, figures: u32) -> Decimal {
    value
        .round_sf_with_strategy(figures, RoundingStrategy::MidpointNearestEven)
        .unwrap_or(value)
}
