use advisor_core::{Analysis, Verdict};
use serenity::builder::{CreateEmbed, CreateEmbedFooter};
use serenity::model::Timestamp;

const COLOR_GREEN: u32 = 0x00FF00;
const COLOR_RED: u32 = 0xFF0000;
const COLOR_GOLD: u32 = 0xFFD700;

const EMBED_FIELD_MAX: usize = 1024;

fn verdict_color(verdict: Verdict) -> u32 {
    match verdict {
        Verdict::StrongBuy | Verdict::Buy => COLOR_GREEN,
        Verdict::Hold => COLOR_GOLD,
        Verdict::Avoid => COLOR_RED,
    }
}

fn verdict_emoji(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::StrongBuy => "\u{1F680}",
        Verdict::Buy => "\u{1F4C8}",
        Verdict::Hold => "\u{27A1}\u{FE0F}",
        Verdict::Avoid => "\u{26A0}\u{FE0F}",
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max.saturating_sub(3);
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

fn footer() -> CreateEmbedFooter {
    CreateEmbedFooter::new("StockAdvisor | Powered by Alpha Vantage")
}

/// Render one analysis as a Discord embed: verdict, score, factor reasons,
/// and the generated summary.
pub fn analysis_embed(analysis: &Analysis) -> CreateEmbed {
    let details = if analysis.reasons.is_empty() {
        "Insufficient data".to_string()
    } else {
        analysis.reasons.join("\n")
    };

    let mut embed = CreateEmbed::new()
        .title(format!(
            "{} Analysis — {}",
            verdict_emoji(analysis.verdict),
            analysis.symbol
        ))
        .description(format!(
            "Verdict: **{}** (score {})",
            analysis.verdict.label(),
            analysis.score
        ))
        .color(verdict_color(analysis.verdict))
        .field("Details", truncate(&details, EMBED_FIELD_MAX), false)
        .footer(footer())
        .timestamp(Timestamp::from_unix_timestamp(analysis.timestamp.timestamp()).unwrap_or_else(|_| Timestamp::now()));

    if let Some(narrative) = &analysis.narrative {
        embed = embed.field("Summary", truncate(narrative, EMBED_FIELD_MAX), false);
    }

    embed
}
