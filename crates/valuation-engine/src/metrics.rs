//! Ratio derivations over optional inputs.
//!
//! Each function is total: a zero or absent denominator, a domain error, or
//! a non-finite result yields `None`, never a panic or an infinity.

use advisor_core::{MetricSet, RawFundamentals};

fn safe_div(num: Option<f64>, den: Option<f64>) -> Option<f64> {
    let n = num?;
    let d = den?;
    if d == 0.0 {
        return None;
    }
    let value = n / d;
    value.is_finite().then_some(value)
}

/// P/L: price over earnings per share.
pub fn price_earnings(price: Option<f64>, eps: Option<f64>) -> Option<f64> {
    safe_div(price, eps)
}

/// P/VP: price over book value per share.
pub fn price_book(price: Option<f64>, book_value_per_share: Option<f64>) -> Option<f64> {
    safe_div(price, book_value_per_share)
}

/// Dividend yield as a percentage of price.
pub fn dividend_yield(dividend_per_share: Option<f64>, price: Option<f64>) -> Option<f64> {
    safe_div(dividend_per_share, price).map(|v| v * 100.0)
}

/// Return on equity as a percentage.
pub fn return_on_equity(net_income: Option<f64>, equity: Option<f64>) -> Option<f64> {
    safe_div(net_income, equity).map(|v| v * 100.0)
}

/// Net debt over EBITDA.
pub fn debt_to_ebitda(net_debt: Option<f64>, ebitda: Option<f64>) -> Option<f64> {
    safe_div(net_debt, ebitda)
}

/// Compound annual growth rate, in percent, between `past` and `current`
/// over `years`. Requires a positive `past` and a positive span; a negative
/// growth base raising a domain error (NaN) also yields `None`.
pub fn cagr(current: Option<f64>, past: Option<f64>, years: Option<f64>) -> Option<f64> {
    let current = current?;
    let past = past?;
    let years = years?;
    if past <= 0.0 || years <= 0.0 {
        return None;
    }
    let value = ((current / past).powf(1.0 / years) - 1.0) * 100.0;
    value.is_finite().then_some(value)
}

/// Derive the full metric set from raw fundamentals, carrying the insider
/// flags through unchanged.
pub fn derive_metrics(raw: &RawFundamentals) -> MetricSet {
    MetricSet {
        pl: price_earnings(raw.price, raw.eps),
        pvp: price_book(raw.price, raw.book_value_per_share),
        dividend_yield: dividend_yield(raw.dividend_per_share, raw.price),
        roe: return_on_equity(raw.net_income, raw.shareholders_equity),
        debt_ebitda: debt_to_ebitda(raw.net_debt, raw.ebitda),
        cagr: cagr(raw.earnings_current, raw.earnings_past, raw.earnings_span_years),
        insider_buyers: raw.insider_buyers,
        insider_sellers: raw.insider_sellers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_by_zero_or_absent_yields_none() {
        assert_eq!(price_earnings(Some(30.0), Some(0.0)), None);
        assert_eq!(price_earnings(Some(30.0), None), None);
        assert_eq!(price_earnings(None, Some(2.5)), None);
        assert_eq!(price_book(Some(30.0), Some(0.0)), None);
        assert_eq!(dividend_yield(Some(1.2), Some(0.0)), None);
        assert_eq!(dividend_yield(Some(1.2), None), None);
        assert_eq!(return_on_equity(Some(10.0), Some(0.0)), None);
        assert_eq!(debt_to_ebitda(Some(10.0), Some(0.0)), None);
        assert_eq!(debt_to_ebitda(Some(10.0), None), None);
    }

    #[test]
    fn ratios_compute_expected_values() {
        assert_eq!(price_earnings(Some(30.0), Some(3.0)), Some(10.0));
        assert_eq!(price_book(Some(20.0), Some(25.0)), Some(0.8));
        assert_eq!(dividend_yield(Some(1.5), Some(25.0)), Some(6.0));
        assert_eq!(return_on_equity(Some(18.0), Some(100.0)), Some(18.0));
        assert_eq!(debt_to_ebitda(Some(6.0), Some(2.0)), Some(3.0));
    }

    #[test]
    fn negative_denominator_is_still_a_value() {
        // Only zero/absent denominators are invalid; a loss-making company
        // produces a negative P/L, not a missing one.
        assert_eq!(price_earnings(Some(30.0), Some(-3.0)), Some(-10.0));
    }

    #[test]
    fn non_finite_inputs_never_escape() {
        assert_eq!(price_earnings(Some(f64::INFINITY), Some(1.0)), None);
        assert_eq!(price_earnings(Some(f64::NAN), Some(1.0)), None);
        assert_eq!(safe_div(Some(1.0), Some(f64::NAN)), None);
    }

    #[test]
    fn cagr_guards_domain() {
        assert_eq!(cagr(Some(100.0), None, Some(5.0)), None);
        assert_eq!(cagr(Some(100.0), Some(0.0), Some(5.0)), None);
        assert_eq!(cagr(Some(100.0), Some(-10.0), Some(5.0)), None);
        assert_eq!(cagr(Some(100.0), Some(50.0), Some(0.0)), None);
        assert_eq!(cagr(Some(100.0), Some(50.0), None), None);
        // Negative current over positive past: fractional power of a
        // negative base is NaN and must collapse to None.
        assert_eq!(cagr(Some(-100.0), Some(50.0), Some(3.0)), None);
    }

    #[test]
    fn cagr_flat_earnings_is_zero() {
        let v = cagr(Some(80.0), Some(80.0), Some(4.0)).unwrap();
        assert!(v.abs() < 1e-12);
    }

    #[test]
    fn cagr_doubling_over_one_year() {
        let v = cagr(Some(200.0), Some(100.0), Some(1.0)).unwrap();
        assert!((v - 100.0).abs() < 1e-9);
    }

    #[test]
    fn derive_metrics_maps_all_fields() {
        let raw = RawFundamentals {
            symbol: "ACME".to_string(),
            price: Some(25.0),
            eps: Some(2.5),
            book_value_per_share: Some(12.5),
            dividend_per_share: Some(1.0),
            net_income: Some(150.0),
            shareholders_equity: Some(1000.0),
            net_debt: Some(300.0),
            ebitda: Some(100.0),
            earnings_current: Some(150.0),
            earnings_past: Some(100.0),
            earnings_span_years: Some(4.0),
            insider_buyers: true,
            insider_sellers: false,
        };
        let m = derive_metrics(&raw);
        assert_eq!(m.pl, Some(10.0));
        assert_eq!(m.pvp, Some(2.0));
        assert_eq!(m.dividend_yield, Some(4.0));
        assert_eq!(m.roe, Some(15.0));
        assert_eq!(m.debt_ebitda, Some(3.0));
        assert!(m.cagr.is_some());
        assert!(m.insider_buyers);
        assert!(!m.insider_sellers);
    }

    #[test]
    fn derive_metrics_with_empty_input_is_all_none() {
        let m = derive_metrics(&RawFundamentals::default());
        assert_eq!(m, MetricSet::default());
    }
}
