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

//! # Mimic-Ledger
//! Three-way reconciliation of trade records observed on independent channels: the FIX
//! order-protocol stream, the messaging bus, and the query API.
//!
//! Records are stored per source, keyed by correlation key. [`reconcile`](ledger::ReconciliationLedger::reconcile)
//! compares the (at most) three records for a key field by field - numeric fields under a
//! configurable significant-figure precision and tolerance, dates and strings exactly - and
//! emits an ordered verdict list with an aggregate pass/fail. A fluent assertion surface over
//! those verdicts produces deterministic failure messages carrying the key, the field and all
//! three values.

/// All [`Error`](std::error::Error)s generated in Mimic-Ledger.
pub mod error;

/// Per-source [`TradeRecord`](record::TradeRecord) and the reconciliation field taxonomy.
pub mod record;

/// Numeric comparison under significant-figure rounding and absolute tolerance.
pub mod compare;

/// The sharded [`ReconciliationLedger`](ledger::ReconciliationLedger) and its verdict model.
pub mod ledger;

/// Fluent assertions over [`ReconciliationResult`](ledger::ReconciliationResult)s.
pub mod assert;
