#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms,
    rust_2024_compatibility
)]
#![allow(clippy::type_complexity, clippy::too_many_arguments, type_alias_bounds)]

//! # Mimic-Data
//! Time and synthetic market data for the Mimic test harness: a [`Clock`](clock::Clock)
//! abstraction, business-day calendar arithmetic, and statistical generation of realistic order
//! inputs (Gaussian prices, Poisson volumes, serially correlated series, unique identifiers).

/// All [`Error`](std::error::Error)s generated in Mimic-Data.
pub mod error;

/// Defines how harness components determine the current time.
///
/// eg/ [`LiveClock`](clock::LiveClock), [`FixedClock`](clock::FixedClock).
pub mod clock;

/// [`BusinessCalendar`](calendar::BusinessCalendar) with weekend, explicit-holiday and
/// recurring-holiday rules, plus venue presets.
pub mod calendar;

/// Statistical [`SyntheticData`](generate::SyntheticData) generator.
pub mod generate;
