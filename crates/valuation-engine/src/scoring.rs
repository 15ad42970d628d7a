//! Rule-based scoring: a fixed-order factor table mapped over a `MetricSet`.
//!
//! The rule set is data, not control flow: each factor names the metric it
//! reads, a display unit, and its tiers in priority order. Adding a factor
//! means adding a table row.

use advisor_core::{MetricSet, ScoreResult, Verdict};

#[derive(Clone, Copy)]
enum Bound {
    Below(f64),
    AtLeast(f64),
    AtMost(f64),
}

impl Bound {
    fn matches(self, value: f64) -> bool {
        match self {
            Bound::Below(limit) => value < limit,
            Bound::AtLeast(limit) => value >= limit,
            Bound::AtMost(limit) => value <= limit,
        }
    }
}

struct Tier {
    /// `None` is the catch-all tier; it must come last.
    bound: Option<Bound>,
    delta: i32,
    theme: &'static str,
}

#[derive(Clone, Copy)]
enum Unit {
    Plain,
    Percent,
    Multiple,
}

impl Unit {
    fn suffix(self) -> &'static str {
        match self {
            Unit::Plain => "",
            Unit::Percent => "%",
            Unit::Multiple => "x",
        }
    }
}

struct Factor {
    metric: fn(&MetricSet) -> Option<f64>,
    unit: Unit,
    tiers: &'static [Tier],
}

const FACTORS: &[Factor] = &[
    Factor {
        metric: |m| m.pl,
        unit: Unit::Plain,
        tiers: &[
            Tier { bound: Some(Bound::Below(10.0)), delta: 2, theme: "P/L low" },
            Tier { bound: Some(Bound::Below(20.0)), delta: 1, theme: "P/L moderate" },
            Tier { bound: None, delta: -1, theme: "P/L high" },
        ],
    },
    Factor {
        metric: |m| m.pvp,
        unit: Unit::Plain,
        tiers: &[
            Tier { bound: Some(Bound::Below(1.0)), delta: 2, theme: "P/VP below book value" },
            Tier { bound: Some(Bound::Below(2.0)), delta: 1, theme: "P/VP reasonable" },
            Tier { bound: None, delta: -1, theme: "P/VP high" },
        ],
    },
    Factor {
        metric: |m| m.dividend_yield,
        unit: Unit::Percent,
        tiers: &[
            Tier { bound: Some(Bound::AtLeast(6.0)), delta: 2, theme: "Dividend yield high" },
            Tier { bound: Some(Bound::AtLeast(3.0)), delta: 1, theme: "Dividend yield reasonable" },
            Tier { bound: None, delta: 0, theme: "Dividend yield low" },
        ],
    },
    Factor {
        metric: |m| m.roe,
        unit: Unit::Percent,
        tiers: &[
            Tier { bound: Some(Bound::AtLeast(15.0)), delta: 2, theme: "ROE strong" },
            Tier { bound: Some(Bound::AtLeast(8.0)), delta: 1, theme: "ROE satisfactory" },
            Tier { bound: None, delta: 0, theme: "ROE weak" },
        ],
    },
    Factor {
        metric: |m| m.debt_ebitda,
        unit: Unit::Multiple,
        tiers: &[
            Tier { bound: Some(Bound::AtMost(3.0)), delta: 2, theme: "Debt/EBITDA healthy" },
            Tier { bound: Some(Bound::AtMost(5.0)), delta: 0, theme: "Debt/EBITDA high" },
            Tier { bound: None, delta: -2, theme: "Debt/EBITDA very high" },
        ],
    },
    Factor {
        metric: |m| m.cagr,
        unit: Unit::Percent,
        tiers: &[
            Tier { bound: Some(Bound::AtLeast(10.0)), delta: 2, theme: "Consistent growth" },
            Tier { bound: Some(Bound::AtLeast(3.0)), delta: 1, theme: "Moderate growth" },
            Tier { bound: None, delta: 0, theme: "Weak growth" },
        ],
    },
];

/// Score a metric set against the factor table.
///
/// Factors whose metric is absent contribute neither score nor reason.
/// Reasons come out in table order, each embedding the value at two decimal
/// places. Insider flags are evaluated last and only when set.
pub fn decide(metrics: &MetricSet) -> ScoreResult {
    let mut score = 0;
    let mut reasons = Vec::new();

    for factor in FACTORS {
        let Some(value) = (factor.metric)(metrics) else {
            continue;
        };
        // The catch-all tier guarantees a match.
        if let Some(tier) = factor
            .tiers
            .iter()
            .find(|t| t.bound.map_or(true, |b| b.matches(value)))
        {
            score += tier.delta;
            reasons.push(format!("{} ({:.2}{})", tier.theme, value, factor.unit.suffix()));
        }
    }

    if metrics.insider_buyers {
        score += 1;
        reasons.push("Insiders buying (positive signal)".to_string());
    }
    if metrics.insider_sellers {
        score -= 1;
        reasons.push("Insiders selling (caution)".to_string());
    }

    ScoreResult { score, reasons }
}

/// Convenience wrapper returning the verdict alongside the score result.
pub fn recommend(metrics: &MetricSet) -> (Verdict, ScoreResult) {
    let result = decide(metrics);
    (result.verdict(), result)
}
