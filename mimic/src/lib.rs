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

//! # Mimic
//! Mimic is a test harness for financial order protocols. A test author programs a synthetic
//! trading venue to answer incoming order messages from user-declared stub rules, correlates
//! the asynchronous responses back to the requests that produced them, and reconciles the
//! resulting trade records observed on three independent channels (FIX, messaging bus, query
//! API) under a configurable numeric tolerance.
//!
//! This crate wires the ecosystem together:
//! * [`VenueHarness`](harness::VenueHarness) - in-process loopback of venue, correlator and
//!   ledger for end-to-end tests.
//! * [`ScenarioTranslator`](scenario::ScenarioTranslator) - deterministic free-text to
//!   [`OrderRequest`](mimic_message::order::OrderRequest) extraction, with optional LLM
//!   preference.
//! * [`logging`] - `tracing` subscriber initialisation.
//!
//! The heavy lifting lives in the member crates: `mimic-message`, `mimic-integration`,
//! `mimic-data`, `mimic-execution` and `mimic-ledger`, re-exported here for convenience.

pub use mimic_data as data;
pub use mimic_execution as execution;
pub use mimic_integration as integration;
pub use mimic_ledger as ledger;
pub use mimic_message as message;

/// Initialise Mimic `tracing` logging.
pub mod logging;

/// Deterministic keyword-based scenario translation, with a pluggable LLM preference.
pub mod scenario;

/// In-process harness wiring the synthetic venue, correlator and reconciliation ledger.
pub mod harness;
