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

//! # Mimic-Message
//! Mimic-Message contains the tag-addressed message envelope, order domain enums and the fluent
//! [`OrderRequest`](order::OrderRequest) builder used across the Mimic test harness.
//!
//! The envelope is deliberately wire-format agnostic: the harness reads and writes fields by
//! numeric tag and never inspects an encoding. Concrete protocol codecs live outside this
//! workspace.

/// Tag constants for the fields the harness touches, plus well-known message type values.
pub mod tag;

/// Opaque tag-addressed [`MessageEnvelope`](envelope::MessageEnvelope) with typed field access
/// and distinct header/body sections.
pub mod envelope;

/// Order domain enums (`Side`, `OrderType`, etc.) and the immutable
/// [`OrderRequest`](order::OrderRequest) value with its fluent builder.
pub mod order;

/// Identifier newtypes.
///
/// eg/ [`RequestKey`](key::RequestKey), [`OrderId`](key::OrderId).
pub mod key;
