//! Core types for the dashboard backend API
//!
//! These types define the wire contract between the client and the
//! dashboard backend's `/api` routes.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque identifier of an accepted training job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for JobHandle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Backend hands out integer row ids; accept strings too
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Int(n) => Ok(Self(n.to_string())),
            RawId::Text(s) if !s.is_empty() => Ok(Self(s)),
            RawId::Text(_) => Err(serde::de::Error::custom("empty job id")),
        }
    }
}

/// Status reported for a training job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Queued,
    Running,
    Finished,
    Error,
    /// Any other value; treated as still in progress
    Other(String),
}

impl JobStatus {
    /// Terminal states end polling
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Error)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Error => "error",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "queued" => Self::Queued,
            "running" => Self::Running,
            "finished" => Self::Finished,
            "error" => Self::Error,
            _ => Self::Other(s),
        }
    }
}

impl From<JobStatus> for String {
    fn from(s: JobStatus) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One poll result for a training job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationStatus {
    pub status: JobStatus,
    /// Fraction in [0, 1]
    #[serde(default, deserialize_with = "null_as_zero")]
    pub progress: f64,
    #[serde(default)]
    pub message: Option<String>,
}

impl OperationStatus {
    /// Snapshot shown right after a job is accepted
    pub fn queued() -> Self {
        Self {
            status: JobStatus::Queued,
            progress: 0.0,
            message: None,
        }
    }

    /// Progress as a whole percentage, clamped to 0..=100
    pub fn percent(&self) -> u8 {
        let p = if self.progress.is_finite() {
            self.progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
        (p * 100.0).round() as u8
    }
}

fn null_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

/// Running bot as reported by `GET /api/bots`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotRecord {
    pub symbol: String,
    pub status: String,
    #[serde(default)]
    pub stats: Option<serde_json::Value>,
    #[serde(default)]
    pub started_at: Option<String>,
}

/// Account summary for one network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSummary {
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub balance_usdt: Option<f64>,
    #[serde(default)]
    pub open_positions: Option<u64>,
    #[serde(default)]
    pub closed_trades: Option<u64>,
    #[serde(default)]
    pub total_pnl_percent: Option<f64>,
}

/// Exchange network an account lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
        }
    }
}

/// Training state of a trading pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairStatus {
    pub symbol: String,
    #[serde(default)]
    pub is_trained: bool,
    #[serde(default)]
    pub last_full_train_end: Option<String>,
    #[serde(default)]
    pub last_incremental_train_end: Option<String>,
    #[serde(default)]
    pub accuracy: Option<f64>,
}

/// Trade journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    #[serde(default)]
    pub entry_time: Option<String>,
    #[serde(default)]
    pub exit_time: Option<String>,
    pub symbol: String,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub pnl_percent: Option<f64>,
}

/// Ingested news headline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sentiment: Option<f64>,
}

/// OHLCV candle from the live feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

// Request/Response types

#[derive(Debug, Clone, Serialize)]
pub struct StartBotRequest {
    pub symbol: String,
    pub timeframes: Vec<String>,
    pub interval_sec: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StopBotRequest {
    pub symbol: String,
}

/// Body shared by `/api/train` and `/api/sync_history`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRequest {
    pub symbol: String,
    pub years: u32,
    pub timeframes: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommandResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LaunchResponse {
    pub job_id: JobHandle,
}

/// `{ "data": ... }` envelope used by every read endpoint
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_handle_accepts_number_or_string() {
        let a: LaunchResponse = serde_json::from_value(json!({"job_id": 42, "status": "queued"})).unwrap();
        assert_eq!(a.job_id.as_str(), "42");

        let b: LaunchResponse = serde_json::from_value(json!({"job_id": "a1b2"})).unwrap();
        assert_eq!(b.job_id, JobHandle::new("a1b2"));

        assert!(serde_json::from_value::<LaunchResponse>(json!({"job_id": ""})).is_err());
        assert!(serde_json::from_value::<LaunchResponse>(json!({})).is_err());
    }

    #[test]
    fn test_unknown_status_is_not_terminal() {
        let s: OperationStatus =
            serde_json::from_value(json!({"status": "preparing", "progress": 0.1})).unwrap();
        assert_eq!(s.status, JobStatus::Other("preparing".to_string()));
        assert!(!s.status.is_terminal());
        assert!(JobStatus::Finished.is_terminal());
        assert!(JobStatus::Error.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
    }

    #[test]
    fn test_percent_rounds_and_clamps() {
        let mut s = OperationStatus::queued();
        assert_eq!(s.percent(), 0);
        s.progress = 0.555;
        assert_eq!(s.percent(), 56);
        s.progress = 0.994;
        assert_eq!(s.percent(), 99);
        s.progress = 1.7;
        assert_eq!(s.percent(), 100);
        s.progress = -0.3;
        assert_eq!(s.percent(), 0);
        s.progress = f64::NAN;
        assert_eq!(s.percent(), 0);
    }

    #[test]
    fn test_null_progress_reads_as_zero() {
        let s: OperationStatus =
            serde_json::from_value(json!({"status": "running", "progress": null, "message": null})).unwrap();
        assert_eq!(s.progress, 0.0);
        assert_eq!(s.message, None);
    }

    #[test]
    fn test_command_response_reads_only_message() {
        let r: CommandResponse =
            serde_json::from_value(json!({"ok": true, "message": "Bot BTCUSDT started"})).unwrap();
        assert_eq!(r.message.as_deref(), Some("Bot BTCUSDT started"));

        let bare: CommandResponse = serde_json::from_value(json!({"ok": false})).unwrap();
        assert_eq!(bare.message, None);
    }

    #[test]
    fn test_status_serializes_as_plain_string() {
        let v = serde_json::to_value(OperationStatus::queued()).unwrap();
        assert_eq!(v["status"], "queued");
    }
}
