use crate::{AdvisorError, RawFundamentals};
use async_trait::async_trait;

/// Trait for market-data fetchers that assemble raw fundamentals for a symbol.
#[async_trait]
pub trait FundamentalsProvider: Send + Sync {
    async fn fetch_fundamentals(&self, symbol: &str) -> Result<RawFundamentals, AdvisorError>;
}

/// Trait for narrative generators that turn an analysis prompt into prose.
///
/// Implementations must not fail: when the backing service is unavailable
/// they return a fallback string instead.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn summarize(&self, prompt: &str) -> String;
}
