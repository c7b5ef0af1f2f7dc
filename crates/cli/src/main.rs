mod auth_commands;
mod context;
mod market_commands;
mod prompt;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    quotebridge_marketdata::{FrequencyType, PeriodType},
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use crate::{context::Context, market_commands::HistoryArgs};

#[derive(Parser)]
#[command(name = "quotebridge", about = "Brokerage OAuth and market data from the command line", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ./quotebridge.toml, then ~/.config/quotebridge/).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Authorization and token management.
    Auth {
        #[command(subcommand)]
        action: auth_commands::AuthAction,
    },
    /// Real-time quotes for one or more symbols.
    Quote {
        #[arg(required = true)]
        symbols: Vec<String>,
    },
    /// OHLCV candles for a symbol.
    History {
        symbol: String,
        /// day, month, year or ytd.
        #[arg(long, default_value = "day")]
        period_type: PeriodType,
        #[arg(long, default_value_t = 1)]
        period: u32,
        /// minute, daily, weekly or monthly.
        #[arg(long, default_value = "minute")]
        frequency_type: FrequencyType,
        #[arg(long, default_value_t = 1)]
        frequency: u32,
    },
    /// Whether US equities are in regular trading hours.
    MarketStatus,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    // Logs go to stderr so command output stays machine-readable.
    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    debug!(version = env!("CARGO_PKG_VERSION"), "quotebridge starting");

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Auth { action } => {
            auth_commands::handle_auth(&Context::load(config_path)?, action).await
        },
        Commands::Quote { symbols } => {
            market_commands::quote(&Context::load(config_path)?, &symbols).await
        },
        Commands::History {
            symbol,
            period_type,
            period,
            frequency_type,
            frequency,
        } => {
            let args = HistoryArgs {
                symbol,
                period_type,
                period,
                frequency_type,
                frequency,
            };
            market_commands::history(&Context::load(config_path)?, args).await
        },
        Commands::MarketStatus => market_commands::status(),
    }
}
