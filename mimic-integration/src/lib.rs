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

//! # Mimic-Integration
//! Low-level abstractions gluing the Mimic test harness to its collaborators.
//!
//! The harness core never owns a concrete protocol codec, JMS session or HTTP stack. Instead it
//! declares the seams here:
//! - **Transport**: [`TransportSink`](transport::TransportSink) plus the [`Session`](transport::Session)
//!   identity a message travels on, with an in-process channel-backed implementation for tests.
//! - **Message bus**: [`MessageBus`](bus::MessageBus) publish/listen with timeouts.
//! - **REST**: [`RestClient`](rest::RestClient) and [`Authenticator`](rest::Authenticator).
//! - **LLM**: optional [`LlmProvider`](llm::LlmProvider); absence is normal.

/// All [`Error`](std::error::Error)s generated in Mimic-Integration.
pub mod error;

/// Defines a trait [`Tx`](channel::Tx) abstraction over different channel kinds, as well as
/// other channel utilities.
///
/// eg/ `UnboundedTx`, `UnboundedRx`, etc.
pub mod channel;

/// Protocol [`Session`](transport::Session) identity and the [`TransportSink`](transport::TransportSink)
/// delivery seam.
pub mod transport;

/// Messaging-bus collaborator interface and an in-process implementation.
pub mod bus;

/// Path-based REST client and bearer-token authenticator interfaces.
pub mod rest;

/// Optional large-language-model collaborator interface.
pub mod llm;
