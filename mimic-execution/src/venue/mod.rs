/// Ordered, thread-safe collection of `(predicate, response-sequence, delay, label)` stub
/// rules, with a fluent registration builder.
pub mod stub;

/// Canned execution-report response generators.
///
/// eg/ `fill`, `partial_fill`, `reject`.
pub mod respond;

/// Consumes inbound venue-side messages and synthesises responses from the stub registry.
pub mod interceptor;
