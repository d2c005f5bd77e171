//! Dashboard Client - terminal front end for the trading dashboard backend
//!
//! 1. Starts/stops bots and re-syncs the bots list
//! 2. Launches training jobs and follows them to completion
//! 3. Renders account, pairs, trades, news and candle snapshots

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use tokio::time::interval;
use tracing::{error, info, Level};

use dashboard_client::config::split_list;
use dashboard_client::{
    api, diff_by_key, BotRecord, DashboardApi, DashboardClient, DisplayFormat, HistoryRequest,
    JobOutcome, JobTracker, ListRefresher, Presenter, ResourceController, Settings,
    TerminalPresenter,
};

/// Trading dashboard client
#[derive(Parser, Debug)]
#[clap(name = "dashboard-client", version, about, long_about = None)]
struct Cli {
    /// Backend base URL (overrides DASHBOARD_BASE_URL)
    #[clap(long, value_name = "URL")]
    url: Option<String>,

    /// Output format
    #[clap(short, long, value_enum, default_value = "text")]
    format: DisplayFormat,

    /// Log level (logs go to stderr)
    #[clap(short, long, value_name = "LEVEL", default_value = "info")]
    log_level: String,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage running bots
    Bots {
        #[clap(subcommand)]
        command: BotCommands,
    },

    /// Launch a training job and follow it until it ends
    Train {
        symbol: String,
        /// Years of history to train on
        #[clap(long)]
        years: Option<u32>,
        /// Comma-separated timeframes
        #[clap(long)]
        timeframes: Option<String>,
    },

    /// Start a history download (does not wait for it)
    Sync {
        /// Symbol to sync; all configured symbols when omitted
        symbol: Option<String>,
        #[clap(long)]
        years: Option<u32>,
        #[clap(long)]
        timeframes: Option<String>,
    },

    /// Show pair training status
    Pairs,

    /// Show recent trades
    Trades {
        #[clap(long, default_value = "200")]
        limit: u32,
    },

    /// Show recent news
    News {
        #[clap(long, default_value = "24")]
        hours: u32,
    },

    /// Show mainnet and testnet account summaries
    Account,

    /// Show live candles for a symbol
    Candles {
        symbol: String,
        #[clap(long, default_value = "1h")]
        timeframe: String,
        #[clap(long, default_value = "200")]
        limit: u32,
    },

    /// Refresh accounts, pairs, trades and news together
    Dashboard,

    /// Refresh the bots list periodically and log what changed
    Watch {
        /// Seconds between refreshes
        #[clap(long, default_value = "10")]
        every: u64,
    },
}

#[derive(Subcommand, Debug)]
enum BotCommands {
    /// List bots
    List,

    /// Start a bot
    Start {
        symbol: String,
        /// Comma-separated timeframes
        #[clap(long)]
        timeframes: Option<String>,
        /// Seconds between bot iterations
        #[clap(long)]
        interval: Option<u64>,
    },

    /// Stop a bot
    Stop { symbol: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level: Level = cli
        .log_level
        .parse()
        .map_err(|_| anyhow!("Invalid log level: {}", cli.log_level))?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let mut settings = Settings::load()?;
    if let Some(url) = cli.url.clone() {
        settings.base_url = url;
    }
    info!("Dashboard backend: {}", settings.base_url);

    let api: Arc<dyn DashboardApi> =
        Arc::new(DashboardClient::new(&settings.base_url, settings.request_timeout())?);
    let presenter: Arc<dyn Presenter> = Arc::new(TerminalPresenter::new(cli.format));
    let refresher = ListRefresher::new(Arc::clone(&api), Arc::clone(&presenter));

    match cli.command {
        Commands::Bots { command } => {
            let controller = ResourceController::new(Arc::clone(&api), Arc::clone(&presenter));
            match command {
                BotCommands::List => {
                    refresher.bots().await?;
                }
                BotCommands::Start {
                    symbol,
                    timeframes,
                    interval,
                } => {
                    let tfs = timeframes_or_default(timeframes, &settings);
                    let interval = interval.unwrap_or(settings.bot_interval_secs);
                    controller.start(&symbol, &tfs, interval).await?;
                }
                BotCommands::Stop { symbol } => {
                    controller.stop(&symbol).await?;
                }
            }
        }
        Commands::Train {
            symbol,
            years,
            timeframes,
        } => {
            let req = history_request(symbol, years, timeframes, &settings);
            if req.symbol.is_empty() {
                return Err(anyhow!("symbol is required"));
            }
            let mut tracker =
                JobTracker::with_policy(Arc::clone(&api), Arc::clone(&presenter), settings.poll_policy());
            let handle = tracker.launch(&req).await?;

            let finished = tokio::select! {
                outcome = tracker.wait() => Some(outcome),
                _ = tokio::signal::ctrl_c() => None,
            };
            let outcome = match finished {
                Some(outcome) => outcome,
                None => {
                    tracker.cancel();
                    info!("Interrupted; job {} keeps running on the backend", handle);
                    None
                }
            };
            report_outcome(outcome)?;
        }
        Commands::Sync {
            symbol,
            years,
            timeframes,
        } => {
            let req = history_request(symbol.unwrap_or_default(), years, timeframes, &settings);
            api::sync_history(api.as_ref(), &req).await?;
            presenter.notify("History sync started");
        }
        Commands::Pairs => {
            refresher.pairs().await?;
        }
        Commands::Trades { limit } => {
            refresher.trades(limit).await?;
        }
        Commands::News { hours } => {
            refresher.news(hours).await?;
        }
        Commands::Account => {
            refresher.accounts().await?;
        }
        Commands::Candles {
            symbol,
            timeframe,
            limit,
        } => {
            refresher.candles(&symbol, &timeframe, limit).await?;
        }
        Commands::Dashboard => {
            let (accounts, pairs, trades, news) = tokio::join!(
                refresher.accounts(),
                refresher.pairs(),
                refresher.trades(200),
                refresher.news(24)
            );
            // each region fails on its own
            let mut failed = 0;
            for (region, res) in [
                ("accounts", accounts.map(|_| ())),
                ("pairs", pairs.map(|_| ())),
                ("trades", trades.map(|_| ())),
                ("news", news.map(|_| ())),
            ] {
                if let Err(e) = res {
                    error!("Failed to refresh {}: {}", region, e);
                    failed += 1;
                }
            }
            if failed > 0 {
                return Err(anyhow!("{} of 4 refreshes failed", failed));
            }
        }
        Commands::Watch { every } => {
            watch_bots(&refresher, Duration::from_secs(every.max(1))).await?;
        }
    }

    Ok(())
}

fn timeframes_or_default(raw: Option<String>, settings: &Settings) -> Vec<String> {
    match raw.map(|r| split_list(&r)) {
        Some(tfs) if !tfs.is_empty() => tfs,
        _ => settings.timeframes(),
    }
}

fn history_request(
    symbol: String,
    years: Option<u32>,
    timeframes: Option<String>,
    settings: &Settings,
) -> HistoryRequest {
    HistoryRequest {
        symbol: symbol.trim().to_string(),
        years: years.unwrap_or(settings.history_years),
        timeframes: timeframes_or_default(timeframes, settings),
    }
}

fn report_outcome(outcome: Option<JobOutcome>) -> anyhow::Result<()> {
    match outcome {
        Some(JobOutcome::Finished(_)) => Ok(()),
        Some(JobOutcome::Failed(status)) => Err(anyhow!(
            "Training failed: {}",
            status.message.unwrap_or_else(|| "no message".to_string())
        )),
        Some(JobOutcome::PollFailed(e)) => Err(e).context("Lost track of training job"),
        Some(JobOutcome::Exhausted { attempts }) => Err(anyhow!(
            "Training job still running after {} polls",
            attempts
        )),
        Some(JobOutcome::Cancelled) | None => Err(anyhow!("Stopped following training job")),
    }
}

/// Periodic bots refresh with keyed change logging, until Ctrl-C
async fn watch_bots(refresher: &ListRefresher, every: Duration) -> anyhow::Result<()> {
    let mut ticker = interval(every);
    let mut previous: Vec<BotRecord> = Vec::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match refresher.bots().await {
                    Ok(bots) => {
                        diff_by_key(&previous, &bots).log("bots");
                        previous = bots;
                    }
                    Err(e) => error!("Bots refresh error: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping bots watch");
                return Ok(());
            }
        }
    }
}
