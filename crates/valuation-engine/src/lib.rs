//! Pure valuation engine: ratio derivation and rule-based scoring.
//!
//! Everything in this crate is synchronous and deterministic. Derivations are
//! total functions that map invalid arithmetic to `None`, and `decide` skips
//! any factor whose metric is absent, so partial data degrades gracefully
//! instead of being guessed at.

pub mod metrics;
pub mod scoring;

pub use metrics::derive_metrics;
pub use scoring::{decide, recommend};
