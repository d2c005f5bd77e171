//! List refresher - snapshot fetch and full re-render of one region

use chrono::{DateTime, NaiveDateTime};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

use crate::api;
use crate::client::DashboardApi;
use crate::error::Result;
use crate::types::{
    AccountSummary, BotRecord, Candle, Network, NewsItem, PairStatus, TradeRecord,
};
use crate::view::{Presenter, Region, Table};

/// Placeholder for missing values
pub const EMPTY_CELL: &str = "—";

/// A row type served by one of the list endpoints
pub trait Listing: DeserializeOwned + Send {
    const REGION: Region;
    const HEADERS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;

    /// Natural identity, when the entity has one
    fn key(&self) -> Option<&str> {
        None
    }
}

impl Listing for BotRecord {
    const REGION: Region = Region::Bots;
    const HEADERS: &'static [&'static str] = &["symbol", "status", "stats", "started_at"];

    fn cells(&self) -> Vec<String> {
        let stats = match &self.stats {
            Some(v) if !v.is_null() => v.to_string(),
            _ => "{}".to_string(),
        };
        vec![
            self.symbol.clone(),
            self.status.clone(),
            stats,
            self.started_at.clone().unwrap_or_else(|| EMPTY_CELL.to_string()),
        ]
    }

    fn key(&self) -> Option<&str> {
        Some(&self.symbol)
    }
}

impl Listing for PairStatus {
    const REGION: Region = Region::Pairs;
    const HEADERS: &'static [&'static str] =
        &["symbol", "trained", "full_train", "incremental_train", "accuracy"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.symbol.clone(),
            if self.is_trained { "✅" } else { EMPTY_CELL }.to_string(),
            time_cell(self.last_full_train_end.as_deref()),
            time_cell(self.last_incremental_train_end.as_deref()),
            // zero accuracy means "never evaluated"
            match self.accuracy {
                Some(a) if a != 0.0 => format!("{:.1}%", a * 100.0),
                _ => EMPTY_CELL.to_string(),
            },
        ]
    }

    fn key(&self) -> Option<&str> {
        Some(&self.symbol)
    }
}

impl Listing for TradeRecord {
    const REGION: Region = Region::Trades;
    const HEADERS: &'static [&'static str] = &["time", "symbol", "side", "pnl"];

    fn cells(&self) -> Vec<String> {
        let t = self.exit_time.as_deref().or(self.entry_time.as_deref());
        vec![
            time_cell(t),
            self.symbol.clone(),
            text_cell(self.side.as_deref()),
            self.pnl_percent
                .map(|p| format!("{:.2}%", p))
                .unwrap_or_else(|| EMPTY_CELL.to_string()),
        ]
    }
}

impl Listing for NewsItem {
    const REGION: Region = Region::News;
    const HEADERS: &'static [&'static str] = &["published", "provider", "title", "url", "sentiment"];

    fn cells(&self) -> Vec<String> {
        vec![
            time_cell(self.published_at.as_deref()),
            text_cell(self.provider.as_deref()),
            text_cell(self.title.as_deref()),
            text_cell(self.url.as_deref()),
            self.sentiment
                .map(|s| format!("{:.2}", s))
                .unwrap_or_else(|| EMPTY_CELL.to_string()),
        ]
    }
}

impl Listing for Candle {
    const REGION: Region = Region::Candles;
    const HEADERS: &'static [&'static str] = &["open_time", "open", "high", "low", "close", "volume"];

    fn cells(&self) -> Vec<String> {
        vec![
            time_cell(Some(self.open_time.as_str())),
            self.open.to_string(),
            self.high.to_string(),
            self.low.to_string(),
            self.close.to_string(),
            self.volume.to_string(),
        ]
    }
}

const ACCOUNT_HEADERS: &[&str] = &["network", "balance_usdt", "open", "closed", "pnl"];

fn account_row(network: Network, acc: &AccountSummary) -> Vec<String> {
    let count = |n: Option<u64>| n.map(|v| v.to_string()).unwrap_or_else(|| EMPTY_CELL.to_string());
    vec![
        network.as_str().to_string(),
        acc.balance_usdt
            .map(|b| b.to_string())
            .unwrap_or_else(|| EMPTY_CELL.to_string()),
        count(acc.open_positions),
        count(acc.closed_trades),
        format!("{:.2}%", acc.total_pnl_percent.unwrap_or(0.0)),
    ]
}

fn text_cell(s: Option<&str>) -> String {
    match s {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => EMPTY_CELL.to_string(),
    }
}

/// Format a backend timestamp; unparseable values pass through untouched
pub fn time_cell(raw: Option<&str>) -> String {
    let raw = match raw {
        Some(r) if !r.is_empty() => r,
        _ => return EMPTY_CELL.to_string(),
    };

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.naive_utc().format(FORMAT).to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, pattern) {
            return dt.format(FORMAT).to_string();
        }
    }
    raw.to_string()
}

/// Build a table from a full snapshot
pub fn build_table<T: Listing>(items: &[T]) -> Table {
    let mut table = Table::new(T::REGION, T::HEADERS);
    table.rows = items.iter().map(T::cells).collect();
    table
}

/// Stateless snapshot refresher
#[derive(Clone)]
pub struct ListRefresher {
    api: Arc<dyn DashboardApi>,
    presenter: Arc<dyn Presenter>,
}

impl ListRefresher {
    pub fn new(api: Arc<dyn DashboardApi>, presenter: Arc<dyn Presenter>) -> Self {
        Self { api, presenter }
    }

    /// Fetch `path`, rebuild the region for `T`, and return the items
    pub async fn refresh<T: Listing>(&self, path: &str) -> Result<Vec<T>> {
        let items: Vec<T> = api::get_data(self.api.as_ref(), path)
            .await?
            .unwrap_or_default();
        debug!("Refreshed {:?}: {} rows", T::REGION, items.len());

        self.presenter.render_table(&build_table(&items));
        Ok(items)
    }

    pub async fn bots(&self) -> Result<Vec<BotRecord>> {
        self.refresh(api::BOTS).await
    }

    pub async fn pairs(&self) -> Result<Vec<PairStatus>> {
        self.refresh(api::PAIRS_STATUS).await
    }

    pub async fn trades(&self, limit: u32) -> Result<Vec<TradeRecord>> {
        self.refresh(&api::trades_path(limit)).await
    }

    pub async fn news(&self, hours: u32) -> Result<Vec<NewsItem>> {
        self.refresh(&api::news_path(hours)).await
    }

    pub async fn candles(&self, symbol: &str, timeframe: &str, limit: u32) -> Result<Vec<Candle>> {
        self.refresh(&api::live_candles_path(symbol, timeframe, limit))
            .await
    }

    /// Both networks in one table
    pub async fn accounts(&self) -> Result<Vec<(Network, AccountSummary)>> {
        let client = self.api.as_ref();
        let (main, test) = tokio::join!(
            api::account(client, Network::Mainnet),
            api::account(client, Network::Testnet)
        );
        let accounts = vec![(Network::Mainnet, main?), (Network::Testnet, test?)];

        let mut table = Table::new(Region::Accounts, ACCOUNT_HEADERS);
        table.rows = accounts
            .iter()
            .map(|(net, acc)| account_row(*net, acc))
            .collect();
        self.presenter.render_table(&table);
        Ok(accounts)
    }
}
