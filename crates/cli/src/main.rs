use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tapebot_core::{Config, Exchange, Liquidity};
use tapebot_exchanges_coinbase::CoinbaseExchange;
use tapebot_exchanges_common::drain_trades;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "tapebot")]
#[command(about = "Query exchange trade history, balances and quotes")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "tapebot.toml")]
    config: PathBuf,

    /// HTTP request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Page backward through a product's trade history, printing JSON lines
    Trades {
        /// Product identifier (e.g. "BTC-USD")
        product: String,

        /// Stop after this many pages
        #[arg(long)]
        max_pages: Option<usize>,
    },

    /// Show balances for a quote currency and base asset
    Balance {
        /// Quote currency code (e.g. "USD")
        currency: String,

        /// Base asset code (e.g. "BTC")
        asset: String,
    },

    /// Show the current best bid/ask for a product
    Quote {
        /// Product identifier (e.g. "BTC-USD")
        product: String,
    },

    /// Print the loaded configuration with secrets redacted
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    if let Commands::Config = cli.command {
        println!("{config:#?}");
        return Ok(());
    }

    let mut exchange = connect(&config, Duration::from_secs(cli.timeout_secs))?;

    match cli.command {
        Commands::Trades { product, max_pages } => {
            tracing::info!(product = %product, "Starting trade backfill");
            let total = drain_trades(&mut exchange, &product, max_pages, |page| {
                for trade in page {
                    match serde_json::to_string(&trade) {
                        Ok(line) => println!("{line}"),
                        Err(e) => tracing::error!(error = %e, trade_id = %trade.trade_id, "Failed to encode trade"),
                    }
                }
            })
            .await?;
            tracing::info!(trades = total, "Backfill complete");
        }
        Commands::Balance { currency, asset } => {
            let balance = exchange.get_balance(&currency, &asset).await?;
            let sides = [(&currency, balance.currency), (&asset, balance.asset)];
            for (code, holding) in sides {
                match holding {
                    Some(h) => println!("{code:<6} balance {:>20}  hold {:>20}", h.available, h.hold),
                    None => println!("{code:<6} no account"),
                }
            }
        }
        Commands::Quote { product } => {
            let quote = exchange.get_quote(&product).await?;
            let fees = exchange.fees();
            println!("{product}");
            println!("  Bid:        {}", quote.bid);
            println!("  Ask:        {}", quote.ask);
            println!("  Spread:     {}", quote.spread());
            println!(
                "  Taker fee:  {}% ({} per unit at ask)",
                fees.taker,
                fees.fee(Liquidity::Taker, quote.ask)
            );
        }
        Commands::Config => {}
    }

    Ok(())
}

fn connect(config: &Config, timeout: Duration) -> Result<CoinbaseExchange> {
    let credentials = config
        .coinbase
        .as_ref()
        .context("Configuration has no [coinbase] section")?;

    let http = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let exchange = CoinbaseExchange::new(credentials, http)?;
    tracing::info!(exchange = exchange.name(), "Exchange adapter ready");
    Ok(exchange)
}
