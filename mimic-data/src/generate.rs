use crate::{calendar::BusinessCalendar, clock::Clock, error::DataError};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use derive_more::Display;
use mimic_message::key::RequestKey;
use rand::Rng;
use rand_distr::{Distribution, Normal, Poisson};
use rust_decimal::{Decimal, RoundingStrategy, prelude::FromPrimitive};
use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, format_smolstr};
use std::cell::RefCell;

/// Settlement cycle relative to trade date.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
pub enum SettlementCycle {
    T0,
    T1,
    T2,
}

impl SettlementCycle {
    pub fn days(&self) -> u32 {
        match self {
            Self::T0 => 0,
            Self::T1 => 1,
            Self::T2 => 2,
        }
    }
}

/// Prices are quoted to 10 significant figures.
const PRICE_SIGNIFICANT_FIGURES: u32 = 10;

const MARKET_OPEN_SECONDS: u32 = 9 * 3600 + 30 * 60;
const MARKET_CLOSE_SECONDS: u32 = 16 * 3600;

thread_local! {
    static LAST_REQUEST_KEY: RefCell<Option<SmolStr>> = const { RefCell::new(None) };
}

/// Statistical generator of realistic order inputs.
///
/// Thread-safe: pseudo-random state is obtained per call via [`rand::rng`], so concurrent test
/// threads never contend on a shared generator.
#[derive(Debug, Clone)]
pub struct SyntheticData<C> {
    calendar: BusinessCalendar,
    clock: C,
    key_prefix: SmolStr,
}

impl<C> SyntheticData<C>
where
    C: Clock,
{
    pub fn new(calendar: BusinessCalendar, clock: C) -> Self {
        Self {
            calendar,
            clock,
            key_prefix: SmolStr::new_static("ORD"),
        }
    }

    pub fn with_key_prefix<S: Into<SmolStr>>(self, prefix: S) -> Self {
        Self {
            key_prefix: prefix.into(),
            ..self
        }
    }

    pub fn calendar(&self) -> &BusinessCalendar {
        &self.calendar
    }

    /// Sample a price from Normal(`mean`, `std_dev`), absolute value, rounded to 10 significant
    /// figures.
    ///
    /// `std_dev = 0` returns `|mean|` exactly.
    pub fn price(&self, mean: f64, std_dev: f64) -> Result<Decimal, DataError> {
        if !mean.is_finite() {
            return Err(DataError::InvalidParameter(format!(
                "price mean must be finite, got: {mean}"
            )));
        }

        if !(std_dev >= 0.0) || !std_dev.is_finite() {
            return Err(DataError::InvalidParameter(format!(
                "price std_dev must be non-negative, got: {std_dev}"
            )));
        }

        let sampled = if std_dev == 0.0 {
            mean
        } else {
            Normal::new(mean, std_dev)
                .map_err(|error| DataError::InvalidParameter(error.to_string()))?
                .sample(&mut rand::rng())
        };

        decimal_price(sampled.abs())
    }

    /// Sample a volume from Poisson(`lambda`), clamped to at least 1.
    pub fn volume(&self, lambda: f64) -> Result<u64, DataError> {
        if !(lambda > 0.0) || !lambda.is_finite() {
            return Err(DataError::InvalidParameter(format!(
                "volume lambda must be positive, got: {lambda}"
            )));
        }

        let sampled = Poisson::new(lambda)
            .map_err(|error| DataError::InvalidParameter(error.to_string()))?
            .sample(&mut rand::rng());

        Ok((sampled as u64).max(1))
    }

    /// Sample an AR(1) series of `n` positive prices with serial correlation `rho`.
    ///
    /// Z₀ ∼ N(0,1); Zᵢ = ρ·Zᵢ₋₁ + √(1−ρ²)·εᵢ with εᵢ ∼ N(0,1) iid; priceᵢ = |μ + σ·Zᵢ|.
    pub fn correlated_prices(
        &self,
        mean: f64,
        std_dev: f64,
        rho: f64,
        n: usize,
    ) -> Result<Vec<Decimal>, DataError> {
        if !mean.is_finite() || !(std_dev >= 0.0) || !std_dev.is_finite() {
            return Err(DataError::InvalidParameter(format!(
                "correlated series requires finite mean and non-negative std_dev, got: \
                 mean={mean}, std_dev={std_dev}"
            )));
        }

        if !(-1.0..=1.0).contains(&rho) {
            return Err(DataError::InvalidParameter(format!(
                "serial correlation must be within [-1, 1], got: {rho}"
            )));
        }

        if n == 0 {
            return Err(DataError::InvalidParameter(
                "series length must be positive".to_string(),
            ));
        }

        let mut rng = rand::rng();
        let unit_normal = Normal::new(0.0, 1.0).expect("unit normal parameters are valid");
        let noise_scale = (1.0 - rho * rho).sqrt();

        let mut z = unit_normal.sample(&mut rng);
        let mut prices = Vec::with_capacity(n);
        prices.push(decimal_price((mean + std_dev * z).abs())?);

        for _ in 1..n {
            z = rho * z + noise_scale * unit_normal.sample(&mut rng);
            prices.push(decimal_price((mean + std_dev * z).abs())?);
        }

        Ok(prices)
    }

    /// Settlement date for the provided cycle, advanced over the configured calendar from the
    /// clock's current date.
    pub fn settlement_date(&self, cycle: SettlementCycle) -> NaiveDate {
        self.calendar
            .add_business_days(self.clock.today(), cycle.days())
    }

    /// Uniformly distributed second-granularity instant within today's 09:30-16:00 trading
    /// window.
    pub fn market_hours_timestamp(&self) -> DateTime<Utc> {
        let second = rand::rng().random_range(MARKET_OPEN_SECONDS..=MARKET_CLOSE_SECONDS);
        let time = NaiveTime::from_num_seconds_from_midnight_opt(second, 0)
            .expect("trading window seconds are within a day");

        self.clock.today().and_time(time).and_utc()
    }

    /// Mint a request key of the form `{prefix}-{ms-since-epoch}-{4-digit random}`.
    ///
    /// Two consecutive calls on the same thread never return the same key.
    pub fn request_key(&self) -> RequestKey {
        LAST_REQUEST_KEY.with(|last| {
            let mut last = last.borrow_mut();
            loop {
                let millis = self.clock.time().timestamp_millis();
                let suffix: u16 = rand::rng().random_range(0..10_000);
                let key = format_smolstr!("{}-{millis}-{suffix:04}", self.key_prefix);

                if last.as_ref() != Some(&key) {
                    *last = Some(key.clone());
                    break RequestKey::from(key);
                }
            }
        })
    }

    /// Mint an account identifier of the form `{prefix}-{8-digit zero-padded random}`.
    pub fn account_id(&self, prefix: &str) -> SmolStr {
        let suffix: u32 = rand::rng().random_range(0..100_000_000);
        format_smolstr!("{prefix}-{suffix:08}")
    }
}

fn decimal_price(value: f64) -> Result<Decimal, DataError> {
    Decimal::from_f64(value)
        .and_then(|decimal| {
            decimal.round_sf_with_strategy(
                PRICE_SIGNIFICANT_FIGURES,
                RoundingStrategy::MidpointNearestEven,
            )
        })
        .ok_or_else(|| {
            DataError::InvalidParameter(format!("sampled price {value} is not representable"))
        })
}
