//! Finnhub 行情接口实现
//!
//! 提供代码搜索、财务指标、日K线、公司新闻等数据
//! 对接 https://finnhub.io/api/v1

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{TimeZone, Utc};
use chrono_tz::America::New_York;
use reqwest::Client;
use serde::Deserialize;

use crate::config::{ApiConfig, FinnhubConfig};
use crate::models::{
    MetricValue, NewsItem, PitchInputs, PriceHistory, StockMetrics, SymbolSuggestion,
};

/// 搜索关键词最短长度，短于此长度不发请求
const MIN_QUERY_LEN: usize = 2;

/// Finnhub 数据服务
///
/// 持有一个带超时设置的 HTTP 客户端，可在各 worker 间共享
#[derive(Clone)]
pub struct FinnhubClient {
    client: Client,
    config: FinnhubConfig,
}

impl FinnhubClient {
    /// 创建新的 Finnhub 客户端
    pub fn new(config: FinnhubConfig, api: &ApiConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .connect_timeout(Duration::from_secs(api.connect_timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, config }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// 发送 GET 请求并返回响应文本
    async fn get_text(&self, path: &str, params: &[(&str, String)]) -> Result<String> {
        if self.config.api_key.is_empty() {
            return Err(anyhow!("未配置 Finnhub API Key"));
        }

        let url = self.endpoint(path);
        log::debug!("📡 请求 Finnhub URL: {} {:?}", url, params);

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("token", self.config.api_key.as_str())])
            .send()
            .await
            .with_context(|| format!("请求 {} 失败", path))?;

        if !response.status().is_success() {
            return Err(anyhow!("Finnhub {} 返回错误状态: {}", path, response.status()));
        }

        Ok(response.text().await?)
    }

    // ==================== 代码搜索 ====================

    /// 按关键词搜索股票代码
    ///
    /// 关键词不足 2 个字符时直接返回空列表
    pub async fn search_symbols(&self, query: &str) -> Result<Vec<SymbolSuggestion>> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            return Ok(Vec::new());
        }

        let text = self.get_text("/search", &[("q", query.to_string())]).await?;
        parse_search_results(&text, self.config.max_suggestions)
    }

    // ==================== 财务指标 ====================

    /// 获取财务指标（市值、市盈率、每股收益、股息率）
    pub async fn get_stock_metrics(&self, symbol: &str) -> Result<StockMetrics> {
        let text = self
            .get_text(
                "/stock/metric",
                &[("symbol", symbol.to_string()), ("metric", "all".to_string())],
            )
            .await?;
        parse_stock_metrics(&text, symbol)
    }

    // ==================== 历史K线 ====================

    /// 获取日K线收盘价序列
    ///
    /// 数据源返回无数据状态时为 Ok(None)；
    /// 开启 sample_history_on_error 时，请求失败返回示例数据
    pub async fn get_stock_history(&self, symbol: &str) -> Result<Option<PriceHistory>> {
        let to = Utc::now().timestamp();
        let from = to - self.config.history_lookback_days * 24 * 60 * 60;

        let result = self
            .get_text(
                "/stock/candle",
                &[
                    ("symbol", symbol.to_string()),
                    ("resolution", "D".to_string()),
                    ("from", from.to_string()),
                    ("to", to.to_string()),
                ],
            )
            .await;

        match result {
            Ok(text) => parse_candles(&text),
            Err(e) if self.config.sample_history_on_error => {
                log::warn!("获取 {} 历史数据失败，使用示例数据: {:#}", symbol, e);
                sample_history().map(Some)
            }
            Err(e) => Err(e),
        }
    }

    // ==================== 公司新闻 ====================

    /// 获取最近的公司新闻，最多 max_news 条
    pub async fn get_company_news(&self, symbol: &str) -> Result<Vec<NewsItem>> {
        let today = Utc::now().date_naive();
        let from = today - chrono::Duration::days(self.config.news_lookback_days);

        let text = self
            .get_text(
                "/company-news",
                &[
                    ("symbol", symbol.to_string()),
                    ("from", from.format("%Y-%m-%d").to_string()),
                    ("to", today.format("%Y-%m-%d").to_string()),
                ],
            )
            .await?;
        parse_company_news(&text, self.config.max_news)
    }

    // ==================== 推介输入 ====================

    /// 并发拉取指标、K线、新闻
    ///
    /// 任一请求失败只记录日志并置为 None，不向上传播
    pub async fn fetch_pitch_inputs(&self, symbol: &str) -> PitchInputs {
        let (metrics, history, news) = futures::join!(
            self.get_stock_metrics(symbol),
            self.get_stock_history(symbol),
            self.get_company_news(symbol),
        );

        PitchInputs {
            metrics: metrics
                .map_err(|e| log::error!("获取 {} 财务指标失败: {:#}", symbol, e))
                .ok(),
            history: history
                .map_err(|e| log::error!("获取 {} 历史数据失败: {:#}", symbol, e))
                .ok()
                .flatten(),
            news: news
                .map_err(|e| log::error!("获取 {} 新闻失败: {:#}", symbol, e))
                .ok(),
        }
    }
}

// ==================== 响应解析 ====================

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Option<Vec<SymbolSuggestion>>,
}

/// 解析搜索结果，保留前 limit 条
fn parse_search_results(data: &str, limit: usize) -> Result<Vec<SymbolSuggestion>> {
    let response: SearchResponse = serde_json::from_str(data).context("解析搜索结果失败")?;
    let mut results = response.result.unwrap_or_default();
    results.truncate(limit);
    Ok(results)
}

#[derive(Deserialize)]
struct MetricResponse {
    #[serde(default)]
    metric: Option<RawMetrics>,
}

#[derive(Deserialize)]
struct RawMetrics {
    #[serde(default, rename = "marketCapitalization")]
    market_capitalization: Option<f64>,
    #[serde(default, rename = "peTTM")]
    pe_ttm: Option<f64>,
    #[serde(default, rename = "epsTTM")]
    eps_ttm: Option<f64>,
    #[serde(default, rename = "currentDividendYieldTTM")]
    dividend_yield_ttm: Option<f64>,
}

/// 解析财务指标
///
/// metric 字段缺失时返回全部未知的指标
fn parse_stock_metrics(data: &str, symbol: &str) -> Result<StockMetrics> {
    let response: MetricResponse = serde_json::from_str(data).context("解析财务指标失败")?;

    let Some(raw) = response.metric else {
        log::warn!("{} 的财务指标缺失 metric 字段", symbol);
        return Ok(StockMetrics::default());
    };

    Ok(StockMetrics {
        market_cap: MetricValue::from_provider(raw.market_capitalization),
        pe_ratio: MetricValue::from_provider(raw.pe_ttm),
        eps: MetricValue::from_provider(raw.eps_ttm),
        dividend_yield: MetricValue::from_provider(raw.dividend_yield_ttm),
    })
}

#[derive(Deserialize)]
struct CandleResponse {
    s: String,
    #[serde(default)]
    c: Vec<f64>,
    #[serde(default)]
    t: Vec<i64>,
}

/// 解析日K线，状态不是 ok 时返回 None
fn parse_candles(data: &str) -> Result<Option<PriceHistory>> {
    let response: CandleResponse = serde_json::from_str(data).context("解析K线数据失败")?;

    if response.s != "ok" {
        log::warn!("K线数据状态异常: {}", response.s);
        return Ok(None);
    }

    let dates = response
        .t
        .iter()
        .map(|&ts| format_candle_date(ts).ok_or_else(|| anyhow!("无效的时间戳: {}", ts)))
        .collect::<Result<Vec<_>>>()?;

    PriceHistory::new(dates, response.c)
        .map(Some)
        .map_err(|e| anyhow!(e))
}

/// 将 Unix 秒级时间戳格式化为美东日期
fn format_candle_date(timestamp: i64) -> Option<String> {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .map(|dt| dt.with_timezone(&New_York).format("%Y-%m-%d").to_string())
}

/// 解析公司新闻，保留前 limit 条
fn parse_company_news(data: &str, limit: usize) -> Result<Vec<NewsItem>> {
    let mut news: Vec<NewsItem> = serde_json::from_str(data).context("解析新闻数据失败")?;
    news.truncate(limit);
    Ok(news)
}

/// 示例K线：10 个交易日的固定价格
fn sample_history() -> Result<PriceHistory> {
    let dates = (1..=10).map(|d| format!("2023-12-{:02}", d)).collect();
    let prices = vec![150.0, 155.0, 160.0, 162.0, 158.0, 159.0, 157.0, 160.0, 164.0, 168.0];
    PriceHistory::new(dates, prices).map_err(|e| anyhow!(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_key: &str) -> FinnhubClient {
        let config = FinnhubConfig {
            api_key: api_key.to_string(),
            ..FinnhubConfig::default()
        };
        FinnhubClient::new(config, &ApiConfig::default())
    }

    #[test]
    fn test_parse_search_results_truncates() {
        let data = r#"{"count": 7, "result": [
            {"description": "APPLE INC", "displaySymbol": "AAPL", "symbol": "AAPL", "type": "Common Stock"},
            {"description": "B", "displaySymbol": "B", "symbol": "B", "type": "Common Stock"},
            {"description": "C", "displaySymbol": "C", "symbol": "C", "type": "Common Stock"},
            {"description": "D", "displaySymbol": "D", "symbol": "D", "type": "Common Stock"},
            {"description": "E", "displaySymbol": "E", "symbol": "E", "type": "Common Stock"},
            {"description": "F", "displaySymbol": "F", "symbol": "F", "type": "Common Stock"},
            {"description": "G", "displaySymbol": "G", "symbol": "G", "type": "Common Stock"}
        ]}"#;
        let results = parse_search_results(data, 5).unwrap();
        assert_eq!(results.len(), 5);
        assert_eq!(results[0].symbol, "AAPL");
        assert_eq!(results[0].description, "APPLE INC");
        assert_eq!(results[0].kind, "Common Stock");
    }

    #[test]
    fn test_parse_search_results_without_result_field() {
        assert!(parse_search_results(r#"{"count": 0}"#, 5).unwrap().is_empty());
    }

    #[test]
    fn test_parse_stock_metrics() {
        let data = r#"{"metric": {
            "marketCapitalization": 2950000.5,
            "peTTM": 29.4,
            "epsTTM": 6.42,
            "currentDividendYieldTTM": null,
            "52WeekHigh": 199.62
        }, "metricType": "all", "symbol": "AAPL"}"#;
        let metrics = parse_stock_metrics(data, "AAPL").unwrap();
        assert_eq!(metrics.market_cap, MetricValue::Known(2950000.5));
        assert_eq!(metrics.pe_ratio, MetricValue::Known(29.4));
        assert_eq!(metrics.eps, MetricValue::Known(6.42));
        assert_eq!(metrics.dividend_yield, MetricValue::Unknown);
    }

    #[test]
    fn test_parse_stock_metrics_zero_and_missing_become_unknown() {
        let data = r#"{"metric": {"peTTM": 0}, "symbol": "XYZ"}"#;
        let metrics = parse_stock_metrics(data, "XYZ").unwrap();
        assert_eq!(metrics, StockMetrics::default());

        let metrics = parse_stock_metrics(r#"{"symbol": "XYZ"}"#, "XYZ").unwrap();
        assert_eq!(metrics, StockMetrics::default());
    }

    #[test]
    fn test_parse_candles() {
        // 2024-01-02 14:30 UTC 与 2024-01-03 14:30 UTC
        let data = r#"{"c": [185.64, 184.25], "t": [1704205800, 1704292200], "s": "ok"}"#;
        let history = parse_candles(data).unwrap().unwrap();
        assert_eq!(history.dates(), ["2024-01-02", "2024-01-03"]);
        assert_eq!(history.prices(), [185.64, 184.25]);
    }

    #[test]
    fn test_parse_candles_no_data() {
        assert!(parse_candles(r#"{"s": "no_data"}"#).unwrap().is_none());
    }

    #[test]
    fn test_parse_candles_length_mismatch() {
        let data = r#"{"c": [1.0, 2.0], "t": [1704205800], "s": "ok"}"#;
        assert!(parse_candles(data).is_err());
    }

    #[test]
    fn test_format_candle_date_uses_eastern_time() {
        // 2024-01-03 02:00 UTC 在美东仍是 2024-01-02
        assert_eq!(format_candle_date(1704247200).as_deref(), Some("2024-01-02"));
    }

    #[test]
    fn test_parse_company_news() {
        let data = r#"[
            {"category": "company", "datetime": 1704205800, "headline": "Apple shares drop", "id": 1,
             "image": "", "related": "AAPL", "source": "Yahoo", "summary": "s1", "url": "https://a"},
            {"headline": "h2", "summary": "s2", "url": "https://b"},
            {"headline": "h3", "summary": "s3", "url": "https://c"},
            {"headline": "h4", "summary": "s4", "url": "https://d"},
            {"headline": "h5", "summary": "s5", "url": "https://e"},
            {"headline": "h6", "summary": "s6", "url": "https://f"}
        ]"#;
        let news = parse_company_news(data, 5).unwrap();
        assert_eq!(news.len(), 5);
        assert_eq!(news[0].headline, "Apple shares drop");
        assert_eq!(news[0].url, "https://a");
        assert_eq!(news[4].headline, "h5");
    }

    #[test]
    fn test_parse_company_news_empty() {
        assert!(parse_company_news("[]", 5).unwrap().is_empty());
    }

    #[test]
    fn test_sample_history() {
        let history = sample_history().unwrap();
        assert_eq!(history.len(), 10);
        assert_eq!(history.price_change(), Some(18.0));
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let mut c = client("k");
        c.config.base_url = "http://localhost:9999/api/v1/".to_string();
        assert_eq!(c.endpoint("/search"), "http://localhost:9999/api/v1/search");
    }

    #[actix_web::test]
    async fn test_short_query_skips_request() {
        // 未配置 token 也不会报错，说明没有发出请求
        let results = client("").search_symbols("a").await.unwrap();
        assert!(results.is_empty());
    }

    #[actix_web::test]
    async fn test_missing_token_is_an_error() {
        assert!(client("").get_stock_metrics("AAPL").await.is_err());
    }

    #[actix_web::test]
    async fn test_history_falls_back_to_sample_when_enabled() {
        // 默认配置：请求失败直接返回错误
        assert!(client("").get_stock_history("AAPL").await.is_err());

        let config = FinnhubConfig {
            api_key: String::new(),
            sample_history_on_error: true,
            ..FinnhubConfig::default()
        };
        let with_sample = FinnhubClient::new(config, &ApiConfig::default());
        let history = with_sample.get_stock_history("AAPL").await.unwrap().unwrap();
        assert_eq!(history.len(), 10);
        assert_eq!(history.dates()[0], "2023-12-01");

        let inputs = with_sample.fetch_pitch_inputs("AAPL").await;
        assert!(inputs.history.is_some());
        assert_eq!(inputs.missing(), vec!["metrics", "news"]);
    }

    #[actix_web::test]
    async fn test_fetch_pitch_inputs_degrades_to_none() {
        let inputs = client("").fetch_pitch_inputs("AAPL").await;
        assert!(inputs.metrics.is_none());
        assert!(inputs.history.is_none());
        assert!(inputs.news.is_none());
        assert_eq!(inputs.missing(), vec!["metrics", "history", "news"]);
    }
}
