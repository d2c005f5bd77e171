//! Bot start/stop commands
//!
//! The controller holds no bot state. Every successful command is followed
//! by a full bots refresh so the rendered list reflects the backend.

use std::sync::Arc;
use tracing::{info, warn};

use crate::api;
use crate::client::DashboardApi;
use crate::error::{ClientError, Result};
use crate::refresh::ListRefresher;
use crate::types::{CommandResponse, StartBotRequest, StopBotRequest};
use crate::view::Presenter;

pub struct ResourceController {
    api: Arc<dyn DashboardApi>,
    presenter: Arc<dyn Presenter>,
    refresher: ListRefresher,
}

impl ResourceController {
    pub fn new(api: Arc<dyn DashboardApi>, presenter: Arc<dyn Presenter>) -> Self {
        let refresher = ListRefresher::new(Arc::clone(&api), Arc::clone(&presenter));
        Self {
            api,
            presenter,
            refresher,
        }
    }

    /// Start a bot for `symbol`; returns the backend's message
    pub async fn start(
        &self,
        symbol: &str,
        timeframes: &[String],
        interval_sec: u64,
    ) -> Result<String> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(ClientError::Validation("symbol is required".to_string()));
        }

        let req = StartBotRequest {
            symbol: symbol.to_string(),
            timeframes: timeframes.to_vec(),
            interval_sec,
        };
        let resp = api::start_bot(self.api.as_ref(), &req).await?;
        info!("Bot start requested: {} every {}s", symbol, interval_sec);

        Ok(self.acknowledge(resp).await)
    }

    /// Stop the bot running for `symbol`; returns the backend's message
    pub async fn stop(&self, symbol: &str) -> Result<String> {
        let req = StopBotRequest {
            symbol: symbol.to_string(),
        };
        let resp = api::stop_bot(self.api.as_ref(), &req).await?;
        info!("Bot stop requested: {}", symbol);

        Ok(self.acknowledge(resp).await)
    }

    async fn acknowledge(&self, resp: CommandResponse) -> String {
        let message = resp
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "OK".to_string());
        self.presenter.notify(&message);

        if let Err(e) = self.refresher.bots().await {
            warn!("Bots refresh after command failed: {}", e);
        }
        message
    }
}
