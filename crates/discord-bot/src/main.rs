mod commands;
mod embeds;

use alphavantage_client::AlphaVantageClient;
use anyhow::Context as _;
use commands::{help_text, parse_command, run_analysis, valid_ticker, Command};
use gemini_client::{GeminiClient, GeminiConfig};
use serenity::{
    async_trait,
    builder::CreateMessage,
    model::{channel::Message, gateway::Ready, id::UserId},
    prelude::*,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const RATE_LIMIT_COMMANDS: u32 = 5;
const RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Startup configuration for the bot and its collaborators. The scoring
/// engine itself takes none.
struct BotConfig {
    discord_token: String,
    alphavantage_api_key: String,
    gemini: GeminiConfig,
}

impl BotConfig {
    fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            discord_token: std::env::var("DISCORD_BOT_TOKEN")
                .context("DISCORD_BOT_TOKEN must be set")?,
            alphavantage_api_key: std::env::var("ALPHAVANTAGE_API_KEY")
                .context("ALPHAVANTAGE_API_KEY must be set")?,
            gemini: GeminiConfig::default(),
        })
    }
}

struct Handler {
    market: Arc<AlphaVantageClient>,
    narrator: Arc<GeminiClient>,
    rate_limits: Arc<RwLock<HashMap<UserId, (Instant, u32)>>>,
}

impl Handler {
    /// Sliding per-user window; Err carries the seconds left to wait.
    async fn check_rate_limit(&self, user_id: UserId) -> Result<(), u64> {
        let mut limits = self.rate_limits.write().await;
        let now = Instant::now();

        if limits.len() > 1000 {
            limits.retain(|_, (ts, _)| now.duration_since(*ts).as_secs() < RATE_LIMIT_WINDOW_SECS);
        }

        if let Some((window_start, count)) = limits.get_mut(&user_id) {
            let elapsed = now.duration_since(*window_start).as_secs();
            if elapsed >= RATE_LIMIT_WINDOW_SECS {
                *window_start = now;
                *count = 1;
                Ok(())
            } else if *count >= RATE_LIMIT_COMMANDS {
                Err(RATE_LIMIT_WINDOW_SECS - elapsed)
            } else {
                *count += 1;
                Ok(())
            }
        } else {
            limits.insert(user_id, (now, 1));
            Ok(())
        }
    }

    async fn handle_analyze(&self, ctx: &Context, msg: &Message, ticker: &str) {
        if !valid_ticker(ticker) {
            let _ = msg
                .channel_id
                .say(&ctx.http, format!("`{}` does not look like a ticker. Try `!analyze AAPL`.", ticker))
                .await;
            return;
        }

        let _ = msg
            .channel_id
            .say(&ctx.http, format!("Analyzing **{}**...", ticker))
            .await;

        match run_analysis(self.market.as_ref(), self.narrator.as_ref(), ticker).await {
            Ok(analysis) => {
                tracing::info!(
                    "analysis for {}: {} (score {})",
                    analysis.symbol,
                    analysis.verdict.label(),
                    analysis.score
                );
                let message = CreateMessage::new().embed(embeds::analysis_embed(&analysis));
                if let Err(e) = msg.channel_id.send_message(&ctx.http, message).await {
                    tracing::error!("failed to send analysis embed: {}", e);
                }
            }
            Err(e) => {
                tracing::warn!("analysis failed for {}: {}", ticker, e);
                let _ = msg
                    .channel_id
                    .say(
                        &ctx.http,
                        format!("Could not analyze `{}`: {}", ticker, e),
                    )
                    .await;
            }
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let Some(command) = parse_command(&msg.content) else {
            return;
        };

        if let Err(wait_secs) = self.check_rate_limit(msg.author.id).await {
            let _ = msg
                .channel_id
                .say(&ctx.http, format!("Rate limited — try again in {}s.", wait_secs))
                .await;
            return;
        }

        match command {
            Command::Analyze(ticker) => self.handle_analyze(&ctx, &msg, &ticker).await,
            Command::Help => {
                let _ = msg.channel_id.say(&ctx.http, help_text()).await;
            }
        }
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        tracing::info!("Connected as {}", ready.user.name);
        if !self.narrator.is_configured() {
            tracing::warn!("Gemini key not set — summaries will use the fallback text");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "discord_bot=info".into());

    if json_logging {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let config = BotConfig::from_env()?;

    let handler = Handler {
        market: Arc::new(AlphaVantageClient::new(config.alphavantage_api_key.clone())),
        narrator: Arc::new(GeminiClient::new(config.gemini.clone())),
        rate_limits: Arc::new(RwLock::new(HashMap::new())),
    };

    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .context("failed to build Discord client")?;

    tracing::info!("Starting StockAdvisor bot");
    client.start().await.context("Discord client error")?;

    Ok(())
}
