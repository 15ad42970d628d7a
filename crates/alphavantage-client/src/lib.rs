use advisor_core::AdvisorError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

mod fundamentals;

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Sliding-window rate limiter: at most `max_requests` per `window`.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests,
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            let oldest = *ts.front().expect("non-empty at capacity");
            let sleep_dur =
                self.window.saturating_sub(now.duration_since(oldest)) + Duration::from_millis(50);
            drop(ts);
            tracing::debug!(
                "Rate limiter: waiting {:.1}s for Alpha Vantage slot",
                sleep_dur.as_secs_f64()
            );
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

#[derive(Clone)]
pub struct AlphaVantageClient {
    api_key: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl AlphaVantageClient {
    pub fn new(api_key: String) -> Self {
        // Free tier allows 5 requests/min; paid tiers can raise this.
        let rate_limit: usize = std::env::var("ALPHAVANTAGE_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            client,
            rate_limiter: RateLimiter::new(rate_limit, Duration::from_secs(60)),
        }
    }

    /// Issue one API call and return the JSON body.
    ///
    /// Alpha Vantage signals throttling with HTTP 200 plus a "Note" or
    /// "Information" field, so throttle detection happens on the body, with
    /// up to three retries. A malformed symbol comes back as "Error Message".
    async fn get_json(
        &self,
        function: &str,
        symbol: &str,
    ) -> Result<serde_json::Value, AdvisorError> {
        for attempt in 0..3u32 {
            self.rate_limiter.acquire().await;

            let response = self
                .client
                .get(BASE_URL)
                .query(&[
                    ("function", function),
                    ("symbol", symbol),
                    ("apikey", self.api_key.as_str()),
                ])
                .send()
                .await
                .map_err(|e| AdvisorError::ApiError(e.to_string()))?;

            if !response.status().is_success() {
                return Err(AdvisorError::ApiError(format!(
                    "HTTP {}: {}",
                    response.status(),
                    response.text().await.unwrap_or_default()
                )));
            }

            let body: serde_json::Value = response
                .json()
                .await
                .map_err(|e| AdvisorError::ApiError(e.to_string()))?;

            if let Some(msg) = body.get("Error Message").and_then(|v| v.as_str()) {
                return Err(AdvisorError::InvalidData(format!(
                    "{} for {}: {}",
                    function, symbol, msg
                )));
            }

            if body.get("Note").is_some() || body.get("Information").is_some() {
                let wait_secs = 20u64;
                tracing::warn!(
                    "Alpha Vantage throttled {} for {}, waiting {}s before retry {}/3",
                    function,
                    symbol,
                    wait_secs,
                    attempt + 1
                );
                tokio::time::sleep(Duration::from_secs(wait_secs)).await;
                continue;
            }

            return Ok(body);
        }

        Err(AdvisorError::ApiError(format!(
            "Rate limited by Alpha Vantage after 3 retries ({} {})",
            function, symbol
        )))
    }

    /// Latest traded price, if the quote carries one.
    pub async fn global_quote(&self, symbol: &str) -> Result<Option<f64>, AdvisorError> {
        let body = self.get_json("GLOBAL_QUOTE", symbol).await?;
        let quote: GlobalQuoteResponse = serde_json::from_value(body)
            .map_err(|e| AdvisorError::ApiError(e.to_string()))?;
        Ok(quote
            .global_quote
            .and_then(|q| parse_number(q.price.as_deref())))
    }

    /// Company overview: per-share and profitability fields.
    pub async fn company_overview(&self, symbol: &str) -> Result<CompanyOverview, AdvisorError> {
        let body = self.get_json("OVERVIEW", symbol).await?;
        serde_json::from_value(body).map_err(|e| AdvisorError::ApiError(e.to_string()))
    }

    /// Annual income statements, newest first.
    pub async fn income_statements(&self, symbol: &str) -> Result<Vec<IncomeReport>, AdvisorError> {
        let body = self.get_json("INCOME_STATEMENT", symbol).await?;
        let parsed: IncomeStatementResponse = serde_json::from_value(body)
            .map_err(|e| AdvisorError::ApiError(e.to_string()))?;
        Ok(parsed.annual_reports)
    }

    /// Annual balance sheets, newest first.
    pub async fn balance_sheets(&self, symbol: &str) -> Result<Vec<BalanceReport>, AdvisorError> {
        let body = self.get_json("BALANCE_SHEET", symbol).await?;
        let parsed: BalanceSheetResponse = serde_json::from_value(body)
            .map_err(|e| AdvisorError::ApiError(e.to_string()))?;
        Ok(parsed.annual_reports)
    }

    /// Recent insider transactions, newest first.
    pub async fn insider_transactions(
        &self,
        symbol: &str,
    ) -> Result<Vec<InsiderTransaction>, AdvisorError> {
        let body = self.get_json("INSIDER_TRANSACTIONS", symbol).await?;
        let parsed: InsiderTransactionsResponse = serde_json::from_value(body)
            .map_err(|e| AdvisorError::ApiError(e.to_string()))?;
        Ok(parsed.data)
    }
}

/// Alpha Vantage serializes every number as a string and spells absence as
/// "None", "-", or an empty string.
pub(crate) fn parse_number(field: Option<&str>) -> Option<f64> {
    let raw = field?.trim();
    if raw.is_empty() || raw == "None" || raw == "-" {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

// --- Response shapes ---------------------------------------------------

#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
}

#[derive(Debug, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyOverview {
    #[serde(rename = "Symbol")]
    pub symbol: Option<String>,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "EPS")]
    pub eps: Option<String>,
    #[serde(rename = "BookValue")]
    pub book_value: Option<String>,
    #[serde(rename = "DividendPerShare")]
    pub dividend_per_share: Option<String>,
    #[serde(rename = "EBITDA")]
    pub ebitda: Option<String>,
    #[serde(rename = "ReturnOnEquityTTM")]
    pub return_on_equity_ttm: Option<String>,
    #[serde(rename = "SharesOutstanding")]
    pub shares_outstanding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IncomeStatementResponse {
    #[serde(rename = "annualReports", default)]
    annual_reports: Vec<IncomeReport>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomeReport {
    #[serde(rename = "fiscalDateEnding")]
    pub fiscal_date_ending: String,
    #[serde(rename = "netIncome")]
    pub net_income: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BalanceSheetResponse {
    #[serde(rename = "annualReports", default)]
    annual_reports: Vec<BalanceReport>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BalanceReport {
    #[serde(rename = "fiscalDateEnding")]
    pub fiscal_date_ending: String,
    #[serde(rename = "totalShareholderEquity")]
    pub total_shareholder_equity: Option<String>,
    #[serde(rename = "shortTermDebt")]
    pub short_term_debt: Option<String>,
    #[serde(rename = "longTermDebt")]
    pub long_term_debt: Option<String>,
    #[serde(rename = "cashAndCashEquivalentsAtCarryingValue")]
    pub cash_and_equivalents: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InsiderTransactionsResponse {
    #[serde(default)]
    data: Vec<InsiderTransaction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsiderTransaction {
    pub transaction_date: Option<String>,
    /// "A" for acquisition, "D" for disposal.
    pub acquisition_or_disposal: Option<String>,
}
