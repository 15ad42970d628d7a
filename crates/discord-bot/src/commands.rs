//! Command parsing and the analysis pipeline.

use advisor_core::{AdvisorError, Analysis, FundamentalsProvider, Narrator};
use chrono::Utc;
use gemini_client::build_prompt;
use valuation_engine::{decide, derive_metrics};

pub const COMMAND_PREFIX: char = '!';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Analyze(String),
    Help,
}

/// Parse a chat message into a command, if it is one.
pub fn parse_command(content: &str) -> Option<Command> {
    let trimmed = content.trim();
    let rest = trimmed.strip_prefix(COMMAND_PREFIX)?;
    let mut parts = rest.split_whitespace();
    match parts.next()? {
        "analyze" => {
            let ticker = parts.next()?;
            Some(Command::Analyze(ticker.to_uppercase()))
        }
        "help" => Some(Command::Help),
        _ => None,
    }
}

/// Tickers are 1-10 characters, alphanumeric plus '.' for exchange suffixes.
pub fn valid_ticker(ticker: &str) -> bool {
    !ticker.is_empty()
        && ticker.len() <= 10
        && ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.')
}

/// Fetch, derive, decide, and narrate one symbol.
pub async fn run_analysis(
    provider: &dyn FundamentalsProvider,
    narrator: &dyn Narrator,
    symbol: &str,
) -> Result<Analysis, AdvisorError> {
    let raw = provider.fetch_fundamentals(symbol).await?;
    let metrics = derive_metrics(&raw);
    let result = decide(&metrics);
    let verdict = result.verdict();

    let prompt = build_prompt(symbol, &metrics, verdict, &result.reasons);
    let narrative = narrator.summarize(&prompt).await;

    Ok(Analysis {
        symbol: symbol.to_string(),
        timestamp: Utc::now(),
        metrics,
        score: result.score,
        verdict,
        reasons: result.reasons,
        narrative: Some(narrative),
    })
}

pub fn help_text() -> String {
    [
        "**StockAdvisor commands**",
        "`!analyze TICKER` — fetch fundamentals, score them, and post a verdict",
        "`!help` — this message",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::{RawFundamentals, Verdict};
    use async_trait::async_trait;

    struct FixedProvider(RawFundamentals);

    #[async_trait]
    impl FundamentalsProvider for FixedProvider {
        async fn fetch_fundamentals(&self, _symbol: &str) -> Result<RawFundamentals, AdvisorError> {
            Ok(self.0.clone())
        }
    }

    struct EchoNarrator;

    #[async_trait]
    impl Narrator for EchoNarrator {
        async fn summarize(&self, prompt: &str) -> String {
            format!("summary: {}", prompt)
        }
    }

    #[test]
    fn commands_parse() {
        assert_eq!(
            parse_command("!analyze petr4"),
            Some(Command::Analyze("PETR4".to_string()))
        );
        assert_eq!(parse_command("  !analyze AAPL  "), Some(Command::Analyze("AAPL".to_string())));
        assert_eq!(parse_command("!help"), Some(Command::Help));
        assert_eq!(parse_command("!analyze"), None);
        assert_eq!(parse_command("!watchlist"), None);
        assert_eq!(parse_command("hello"), None);
    }

    #[test]
    fn ticker_validation() {
        assert!(valid_ticker("AAPL"));
        assert!(valid_ticker("PETR4.SA"));
        assert!(!valid_ticker(""));
        assert!(!valid_ticker("WAY_TOO_LONG_TICKER"));
        assert!(!valid_ticker("AA PL"));
        assert!(!valid_ticker("A$PL"));
    }

    #[tokio::test]
    async fn pipeline_produces_verdict_and_narrative() {
        let provider = FixedProvider(RawFundamentals {
            symbol: "ACME".to_string(),
            price: Some(19.0),
            eps: Some(2.0),
            ..Default::default()
        });
        let analysis = run_analysis(&provider, &EchoNarrator, "ACME")
            .await
            .unwrap();
        assert_eq!(analysis.symbol, "ACME");
        assert_eq!(analysis.score, 2);
        assert_eq!(analysis.verdict, Verdict::Buy);
        assert_eq!(analysis.reasons, vec!["P/L low (9.50)".to_string()]);
        let narrative = analysis.narrative.unwrap();
        assert!(narrative.contains("ACME"));
        assert!(narrative.contains("BUY"));
    }

    #[tokio::test]
    async fn pipeline_holds_on_empty_data() {
        let provider = FixedProvider(RawFundamentals {
            symbol: "ACME".to_string(),
            price: Some(10.0),
            ..Default::default()
        });
        let analysis = run_analysis(&provider, &EchoNarrator, "ACME")
            .await
            .unwrap();
        assert_eq!(analysis.score, 0);
        assert_eq!(analysis.verdict, Verdict::Hold);
        assert!(analysis.reasons.is_empty());
    }
}
