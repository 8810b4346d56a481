//! 处理器共享状态

use anyhow::Result;

use crate::config::AppConfig;
use crate::services::auth::AuthClient;
use crate::services::finnhub::FinnhubClient;

/// 所有处理器共享的外部服务客户端（内部自带连接池）
#[derive(Clone)]
pub struct AppState {
    pub finnhub: FinnhubClient,
    pub auth: AuthClient,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            finnhub: FinnhubClient::new(config.finnhub.clone(), &config.api),
            auth: AuthClient::new(&config.auth, &config.api)?,
        })
    }
}
