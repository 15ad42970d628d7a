use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw per-symbol inputs collected by a data fetcher.
///
/// Every numeric field is optional: providers routinely omit fields, and an
/// absent input must flow through derivation as "no value" rather than zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFundamentals {
    pub symbol: String,
    pub price: Option<f64>,
    pub eps: Option<f64>,
    pub book_value_per_share: Option<f64>,
    pub dividend_per_share: Option<f64>,
    pub net_income: Option<f64>,
    pub shareholders_equity: Option<f64>,
    pub net_debt: Option<f64>,
    pub ebitda: Option<f64>,
    /// Newest and oldest annual earnings plus the span between them, for CAGR.
    pub earnings_current: Option<f64>,
    pub earnings_past: Option<f64>,
    pub earnings_span_years: Option<f64>,
    pub insider_buyers: bool,
    pub insider_sellers: bool,
}

/// Derived valuation ratios for one symbol.
///
/// `None` means "insufficient data for this factor" — distinct from a
/// legitimate zero — and the scoring engine skips such factors entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    pub pl: Option<f64>,
    pub pvp: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub roe: Option<f64>,
    pub debt_ebitda: Option<f64>,
    pub cagr: Option<f64>,
    #[serde(default)]
    pub insider_buyers: bool,
    #[serde(default)]
    pub insider_sellers: bool,
}

/// Output of the scoring engine: the running score and one reason per
/// evaluated factor, in canonical factor order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: i32,
    pub reasons: Vec<String>,
}

impl ScoreResult {
    pub fn verdict(&self) -> Verdict {
        Verdict::from_score(self.score)
    }
}

/// Final categorical recommendation, ordered by increasing favorability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Verdict {
    Avoid,
    Hold,
    Buy,
    StrongBuy,
}

impl Verdict {
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s >= 5 => Verdict::StrongBuy,
            s if s >= 2 => Verdict::Buy,
            s if s >= 0 => Verdict::Hold,
            _ => Verdict::Avoid,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::StrongBuy => "STRONG BUY",
            Verdict::Buy => "BUY",
            Verdict::Hold => "HOLD",
            Verdict::Avoid => "AVOID",
        }
    }
}

/// Complete analysis for presentation: metrics, decision, and the optional
/// generated narrative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub metrics: MetricSet,
    pub score: i32,
    pub verdict: Verdict,
    pub reasons: Vec<String>,
    pub narrative: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_thresholds_are_inclusive() {
        assert_eq!(Verdict::from_score(5), Verdict::StrongBuy);
        assert_eq!(Verdict::from_score(4), Verdict::Buy);
        assert_eq!(Verdict::from_score(2), Verdict::Buy);
        assert_eq!(Verdict::from_score(1), Verdict::Hold);
        assert_eq!(Verdict::from_score(0), Verdict::Hold);
        assert_eq!(Verdict::from_score(-1), Verdict::Avoid);
    }

    #[test]
    fn verdicts_order_by_favorability() {
        assert!(Verdict::Avoid < Verdict::Hold);
        assert!(Verdict::Hold < Verdict::Buy);
        assert!(Verdict::Buy < Verdict::StrongBuy);
    }

    #[test]
    fn verdict_labels() {
        assert_eq!(Verdict::StrongBuy.label(), "STRONG BUY");
        assert_eq!(Verdict::Avoid.label(), "AVOID");
    }
}
