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

//! # Mimic-Execution
//! The two sides of the Mimic order-protocol engine:
//! - **Venue (acceptor)**: a thread-safe [`StubRegistry`](venue::stub::StubRegistry) of
//!   user-declared rules evaluated in registration order, and the
//!   [`Interceptor`](venue::interceptor::Interceptor) that matches inbound order messages
//!   against it, applies delays, normalises routing headers, propagates correlation fields and
//!   hands responses to a transport sink.
//! - **Initiator (client)**: the [`Correlator`](client::correlator::Correlator) mapping
//!   outstanding request keys to one-shot completion slots, resolved by inbound venue messages,
//!   with timeouts and at-most-once delivery.

/// All [`Error`](std::error::Error)s generated in Mimic-Execution.
pub mod error;

/// Synthetic venue: stub rules, canned response generators, and the interceptor loop.
pub mod venue;

/// Initiator side: request/response correlation.
pub mod client;
