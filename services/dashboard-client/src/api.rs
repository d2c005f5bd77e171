//! Typed calls for each dashboard backend route

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::client::DashboardApi;
use crate::error::TransportError;
use crate::types::{
    AccountSummary, CommandResponse, DataEnvelope, HistoryRequest, JobHandle, LaunchResponse,
    Network, OperationStatus, StartBotRequest, StopBotRequest,
};

pub const BOTS: &str = "/api/bots";
pub const BOTS_START: &str = "/api/bots/start";
pub const BOTS_STOP: &str = "/api/bots/stop";
pub const PAIRS_STATUS: &str = "/api/pairs_status";
pub const SYNC_HISTORY: &str = "/api/sync_history";
pub const TRAIN: &str = "/api/train";

pub fn account_path(network: Network) -> String {
    format!("/api/account?network={}", network.as_str())
}

pub fn trades_path(limit: u32) -> String {
    format!("/api/trades?limit={}", limit)
}

pub fn news_path(hours: u32) -> String {
    format!("/api/news?hours={}", hours)
}

pub fn training_path(job: &JobHandle) -> String {
    format!("/api/training/{}", urlencoding::encode(job.as_str()))
}

pub fn live_candles_path(symbol: &str, timeframe: &str, limit: u32) -> String {
    format!(
        "/api/live_candles?symbol={}&timeframe={}&limit={}",
        urlencoding::encode(symbol),
        urlencoding::encode(timeframe),
        limit
    )
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, TransportError> {
    serde_json::from_value(value).map_err(|e| TransportError::Decode(e.to_string()))
}

fn to_body<T: Serialize>(req: &T) -> Result<Value, TransportError> {
    serde_json::to_value(req).map_err(|e| TransportError::Decode(e.to_string()))
}

/// Unwrap the `data` field of a read endpoint
pub async fn get_data<T: DeserializeOwned>(
    api: &dyn DashboardApi,
    path: &str,
) -> Result<Option<T>, TransportError> {
    let envelope: DataEnvelope<T> = decode(api.get_json(path).await?)?;
    Ok(envelope.data)
}

pub async fn start_bot(
    api: &dyn DashboardApi,
    req: &StartBotRequest,
) -> Result<CommandResponse, TransportError> {
    decode(api.post_json(BOTS_START, to_body(req)?).await?)
}

pub async fn stop_bot(
    api: &dyn DashboardApi,
    req: &StopBotRequest,
) -> Result<CommandResponse, TransportError> {
    decode(api.post_json(BOTS_STOP, to_body(req)?).await?)
}

pub async fn account(
    api: &dyn DashboardApi,
    network: Network,
) -> Result<AccountSummary, TransportError> {
    get_data::<AccountSummary>(api, &account_path(network))
        .await?
        .ok_or_else(|| TransportError::Decode("account response has no data".to_string()))
}

/// Fire-and-forget history download; the acknowledgement body is ignored
pub async fn sync_history(
    api: &dyn DashboardApi,
    req: &HistoryRequest,
) -> Result<(), TransportError> {
    api.post_json(SYNC_HISTORY, to_body(req)?).await?;
    Ok(())
}

pub async fn launch_training(
    api: &dyn DashboardApi,
    req: &HistoryRequest,
) -> Result<JobHandle, TransportError> {
    let resp: LaunchResponse = decode(api.post_json(TRAIN, to_body(req)?).await?)?;
    Ok(resp.job_id)
}

pub async fn training_status(
    api: &dyn DashboardApi,
    job: &JobHandle,
) -> Result<OperationStatus, TransportError> {
    get_data::<OperationStatus>(api, &training_path(job))
        .await?
        .ok_or_else(|| TransportError::Decode(format!("job {} status has no data", job)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(account_path(Network::Testnet), "/api/account?network=testnet");
        assert_eq!(trades_path(200), "/api/trades?limit=200");
        assert_eq!(news_path(24), "/api/news?hours=24");
        assert_eq!(training_path(&JobHandle::new("7")), "/api/training/7");
    }

    #[test]
    fn test_training_path_keeps_handle_in_one_segment() {
        assert_eq!(
            training_path(&JobHandle::new("run/7?x=1")),
            "/api/training/run%2F7%3Fx%3D1"
        );
    }

    #[test]
    fn test_live_candles_path_encodes_symbol() {
        assert_eq!(
            live_candles_path("BTC/USDT", "1h", 50),
            "/api/live_candles?symbol=BTC%2FUSDT&timeframe=1h&limit=50"
        );
        assert_eq!(
            live_candles_path("BTC USDT", "4h", 10),
            "/api/live_candles?symbol=BTC%20USDT&timeframe=4h&limit=10"
        );
    }
}
