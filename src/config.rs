//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置，并允许环境变量覆盖关键项

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// 外部 HTTP 请求配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Finnhub 行情接口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinnhubConfig {
    /// API Token（可由 FINNHUB_API_KEY 覆盖）
    #[serde(default)]
    pub api_key: String,
    /// 接口根地址
    #[serde(default = "default_finnhub_url")]
    pub base_url: String,
    /// 搜索建议条数上限
    #[serde(default = "default_max_items")]
    pub max_suggestions: usize,
    /// 新闻条数上限
    #[serde(default = "default_max_items")]
    pub max_news: usize,
    /// 新闻回溯天数
    #[serde(default = "default_news_lookback")]
    pub news_lookback_days: i64,
    /// 历史K线回溯天数
    #[serde(default = "default_history_lookback")]
    pub history_lookback_days: i64,
    /// K线请求失败时返回示例数据（演示用）
    #[serde(default)]
    pub sample_history_on_error: bool,
}

/// 用户后端与会话配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// 用户后端根地址（可由 AUTH_BACKEND_URL 覆盖）
    #[serde(default = "default_auth_url")]
    pub backend_url: String,
    /// 会话空闲过期时间（秒）
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
    /// 过期会话清理间隔（秒）
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 外部请求配置
    #[serde(default)]
    pub api: ApiConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
    /// Finnhub 配置
    #[serde(default)]
    pub finnhub: FinnhubConfig,
    /// 用户后端配置
    #[serde(default)]
    pub auth: AuthConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_timeout() -> u64 { 30 }
fn default_connect_timeout() -> u64 { 10 }
fn default_log_level() -> String { "info".to_string() }
fn default_finnhub_url() -> String { "https://finnhub.io/api/v1".to_string() }
fn default_max_items() -> usize { 5 }
fn default_news_lookback() -> i64 { 1 }
fn default_history_lookback() -> i64 { 365 }
fn default_auth_url() -> String { "https://stock-pitch-genrator-backend.onrender.com".to_string() }
fn default_session_ttl() -> u64 { 24 * 60 * 60 }
fn default_sweep_interval() -> u64 { 300 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for FinnhubConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_finnhub_url(),
            max_suggestions: default_max_items(),
            max_news: default_max_items(),
            news_lookback_days: default_news_lookback(),
            history_lookback_days: default_history_lookback(),
            sample_history_on_error: false,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            backend_url: default_auth_url(),
            session_ttl_secs: default_session_ttl(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，优先从文件，失败则使用默认值，最后应用环境变量
    pub fn load() -> Self {
        let mut config = Self::load_file();
        config.apply_env(|key| env::var(key).ok());
        config
    }

    fn load_file() -> Self {
        let config_paths = ["config.json", "config/config.json"];

        for path in config_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => {
                        log::info!("从 {} 加载配置成功", path);
                        return config;
                    }
                    Err(e) => {
                        log::warn!("加载配置文件 {} 失败: {}", path, e);
                    }
                }
            }
        }

        log::info!("使用默认配置");
        Self::default()
    }

    /// 应用环境变量覆盖
    ///
    /// - FINNHUB_API_KEY: Finnhub Token
    /// - AUTH_BACKEND_URL: 用户后端地址
    /// - SERVER_PORT: 监听端口
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("FINNHUB_API_KEY").filter(|v| !v.is_empty()) {
            self.finnhub.api_key = key;
        }
        if let Some(url) = lookup("AUTH_BACKEND_URL").filter(|v| !v.is_empty()) {
            self.auth.backend_url = url;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => log::warn!("SERVER_PORT={} 不是合法端口，忽略", port),
            }
        }
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.finnhub.base_url, "https://finnhub.io/api/v1");
        assert_eq!(config.finnhub.max_news, 5);
        assert_eq!(config.finnhub.max_suggestions, 5);
        assert_eq!(config.finnhub.history_lookback_days, 365);
        assert!(!config.finnhub.sample_history_on_error);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{"server": {"port": 9000}, "finnhub": {"api_key": "abc", "max_news": 3}}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.finnhub.api_key, "abc");
        assert_eq!(config.finnhub.max_news, 3);
        assert_eq!(config.finnhub.news_lookback_days, 1);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.auth.session_ttl_secs, 86400);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("FINNHUB_API_KEY", "token-1"),
            ("AUTH_BACKEND_URL", "http://localhost:8000"),
            ("SERVER_PORT", "3001"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.finnhub.api_key, "token-1");
        assert_eq!(config.auth.backend_url, "http://localhost:8000");
        assert_eq!(config.server.port, 3001);
    }

    #[test]
    fn test_invalid_port_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(|k| (k == "SERVER_PORT").then(|| "not-a-port".to_string()));
        assert_eq!(config.server.port, 8080);
    }
}
