//! Adapter from Alpha Vantage responses to `RawFundamentals`.
//!
//! The overview and quote are load-bearing; statement and insider fetches
//! degrade to absent fields so one flaky endpoint cannot sink the analysis.

use crate::{parse_number, AlphaVantageClient, BalanceReport, IncomeReport, InsiderTransaction};
use advisor_core::{AdvisorError, FundamentalsProvider, RawFundamentals};
use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};

const INSIDER_WINDOW_DAYS: u64 = 90;
const INSIDER_MAX_RECORDS: usize = 200;

impl AlphaVantageClient {
    /// Assemble everything the valuation engine needs for one symbol.
    pub async fn fetch_fundamentals(
        &self,
        symbol: &str,
    ) -> Result<RawFundamentals, AdvisorError> {
        let overview = self.company_overview(symbol).await?;

        let price = match self.global_quote(symbol).await {
            Ok(price) => price,
            Err(e) => {
                tracing::warn!("quote fetch failed for {}: {}", symbol, e);
                None
            }
        };

        let mut raw = RawFundamentals {
            symbol: symbol.to_string(),
            price,
            eps: parse_number(overview.eps.as_deref()),
            book_value_per_share: parse_number(overview.book_value.as_deref()),
            dividend_per_share: parse_number(overview.dividend_per_share.as_deref()),
            ebitda: parse_number(overview.ebitda.as_deref()),
            ..Default::default()
        };

        if raw.price.is_none() && raw.eps.is_none() && raw.book_value_per_share.is_none() {
            return Err(AdvisorError::InsufficientData(format!(
                "no usable quote or overview data for {}",
                symbol
            )));
        }

        match self.income_statements(symbol).await {
            Ok(reports) => apply_income(&mut raw, &reports),
            Err(e) => tracing::warn!("income statements unavailable for {}: {}", symbol, e),
        }

        match self.balance_sheets(symbol).await {
            Ok(reports) => apply_balance(&mut raw, &reports),
            Err(e) => tracing::warn!("balance sheets unavailable for {}: {}", symbol, e),
        }

        match self.insider_transactions(symbol).await {
            Ok(transactions) => {
                let today = Utc::now().date_naive();
                let (buyers, sellers) = insider_activity(&transactions, today);
                raw.insider_buyers = buyers;
                raw.insider_sellers = sellers;
            }
            Err(e) => tracing::warn!("insider transactions unavailable for {}: {}", symbol, e),
        }

        Ok(raw)
    }
}

#[async_trait]
impl FundamentalsProvider for AlphaVantageClient {
    async fn fetch_fundamentals(&self, symbol: &str) -> Result<RawFundamentals, AdvisorError> {
        AlphaVantageClient::fetch_fundamentals(self, symbol).await
    }
}

/// Latest net income plus the oldest report as the CAGR baseline.
fn apply_income(raw: &mut RawFundamentals, reports: &[IncomeReport]) {
    let Some(newest) = reports.first() else {
        return;
    };
    raw.net_income = parse_number(newest.net_income.as_deref());
    raw.earnings_current = raw.net_income;

    if reports.len() > 1 {
        if let Some(oldest) = reports.last() {
            raw.earnings_past = parse_number(oldest.net_income.as_deref());
            if let (Some(a), Some(b)) = (
                fiscal_year(&newest.fiscal_date_ending),
                fiscal_year(&oldest.fiscal_date_ending),
            ) {
                raw.earnings_span_years = Some((a - b) as f64);
            }
        }
    }
}

fn apply_balance(raw: &mut RawFundamentals, reports: &[BalanceReport]) {
    let Some(latest) = reports.first() else {
        return;
    };
    raw.shareholders_equity = parse_number(latest.total_shareholder_equity.as_deref());
    raw.net_debt = net_debt(
        parse_number(latest.short_term_debt.as_deref()),
        parse_number(latest.long_term_debt.as_deref()),
        parse_number(latest.cash_and_equivalents.as_deref()),
    );
}

/// Short plus long debt minus cash. `None` only when no debt figure exists
/// at all; missing components count as zero once one of them is present.
fn net_debt(short: Option<f64>, long: Option<f64>, cash: Option<f64>) -> Option<f64> {
    if short.is_none() && long.is_none() {
        return None;
    }
    Some(short.unwrap_or(0.0) + long.unwrap_or(0.0) - cash.unwrap_or(0.0))
}

fn fiscal_year(date: &str) -> Option<i32> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .map(|d| chrono::Datelike::year(&d))
}

/// Scan recent transactions for acquisitions and disposals inside the
/// lookback window.
fn insider_activity(transactions: &[InsiderTransaction], today: NaiveDate) -> (bool, bool) {
    let cutoff = today
        .checked_sub_days(Days::new(INSIDER_WINDOW_DAYS))
        .unwrap_or(today);
    let mut buyers = false;
    let mut sellers = false;

    for tx in transactions.iter().take(INSIDER_MAX_RECORDS) {
        let in_window = tx
            .transaction_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .is_some_and(|d| d >= cutoff);
        if !in_window {
            continue;
        }
        match tx.acquisition_or_disposal.as_deref() {
            Some("A") => buyers = true,
            Some("D") => sellers = true,
            _ => {}
        }
    }

    (buyers, sellers)
}
