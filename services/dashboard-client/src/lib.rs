//! Dashboard Client Library
//!
//! Client side of the trading dashboard: REST transport, bot start/stop,
//! training job tracking, and snapshot list refreshes.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod jobs;
pub mod reconcile;
pub mod refresh;
pub mod resources;
pub mod types;
pub mod view;

// Re-export main types for convenience
pub use crate::client::{DashboardApi, DashboardClient};
pub use crate::config::Settings;
pub use crate::error::{ClientError, TransportError};
pub use crate::jobs::{JobOutcome, JobPhase, JobSnapshot, JobTracker, PollPolicy};
pub use crate::reconcile::{diff_by_key, SnapshotDiff};
pub use crate::refresh::{ListRefresher, Listing};
pub use crate::resources::ResourceController;
pub use crate::types::{
    AccountSummary, BotRecord, Candle, HistoryRequest, JobHandle, JobStatus, Network, NewsItem,
    OperationStatus, PairStatus, TradeRecord,
};
pub use crate::view::{DisplayFormat, JobProgress, MemoryPresenter, Presenter, Region, Table, TerminalPresenter};
