//! 投资推介相关的请求与响应模型

use serde::{Deserialize, Serialize};

use super::stock::{NewsItem, PriceHistory, StockMetrics};

/// 生成推介所需的三项输入，任一缺失即视为数据未就绪
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PitchInputs {
    #[serde(default)]
    pub metrics: Option<StockMetrics>,
    #[serde(default)]
    pub history: Option<PriceHistory>,
    #[serde(default)]
    pub news: Option<Vec<NewsItem>>,
}

impl PitchInputs {
    /// 列出缺失的输入名称
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.metrics.is_none() {
            missing.push("metrics");
        }
        match &self.history {
            None => missing.push("history"),
            Some(h) if h.is_empty() => missing.push("history"),
            Some(_) => {}
        }
        if self.news.is_none() {
            missing.push("news");
        }
        missing
    }
}

/// POST /pitch 请求体
#[derive(Debug, Deserialize)]
pub struct PitchRequest {
    pub ticker: String,
    #[serde(flatten)]
    pub inputs: PitchInputs,
}

/// 推介生成结果
///
/// 输入不完整时 `ready` 为 false，`pitch` 保留会话中上一次的结果
#[derive(Debug, Serialize, Deserialize)]
pub struct PitchResponse {
    pub ticker: String,
    pub ready: bool,
    pub pitch: Option<String>,
    pub missing: Vec<String>,
}
