//! Ownership-safe decoding of native inference engine output values.

/// Native handle ownership, type-tag driven decoding, and disposable views.
pub mod output;

/// In-memory engine implementing the native boundary for tests and tooling.
#[cfg(any(test, feature = "sim"))]
pub mod sim;
