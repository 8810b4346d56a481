//! 股票数据模型
//!
//! 定义指标、历史价格、新闻和搜索建议等数据结构

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// 单项财务指标
///
/// 数据源缺失时为 `Unknown`，序列化为字符串 "N/A"，
/// 阈值比较时不会被当作数值参与
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MetricValue {
    Known(f64),
    #[default]
    Unknown,
}

impl MetricValue {
    /// 按数据源的取值规则转换：缺失、0 或非有限值均视为未知
    pub fn from_provider(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() && v != 0.0 => MetricValue::Known(v),
            _ => MetricValue::Unknown,
        }
    }

    /// 严格大于阈值；未知值返回 None
    pub fn exceeds(self, threshold: f64) -> Option<bool> {
        match self {
            MetricValue::Known(v) => Some(v > threshold),
            MetricValue::Unknown => None,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Known(v) => write!(f, "{}", v),
            MetricValue::Unknown => write!(f, "N/A"),
        }
    }
}

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetricValue::Known(v) => serializer.serialize_f64(*v),
            MetricValue::Unknown => serializer.serialize_str("N/A"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMetric {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for MetricValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = match Option::<RawMetric>::deserialize(deserializer)? {
            Some(RawMetric::Number(v)) if v.is_finite() => MetricValue::Known(v),
            Some(RawMetric::Text(s)) => match s.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => MetricValue::Known(v),
                _ => MetricValue::Unknown,
            },
            _ => MetricValue::Unknown,
        };
        Ok(value)
    }
}

/// 股票财务指标快照
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMetrics {
    /// 总市值
    #[serde(default)]
    pub market_cap: MetricValue,
    /// 市盈率（TTM）
    #[serde(default)]
    pub pe_ratio: MetricValue,
    /// 每股收益（TTM）
    #[serde(default)]
    pub eps: MetricValue,
    /// 股息率（TTM，百分比）
    #[serde(default)]
    pub dividend_yield: MetricValue,
}

/// 历史收盘价序列
///
/// 日期与价格按下标一一对应，按时间升序排列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPriceHistory")]
pub struct PriceHistory {
    dates: Vec<String>,
    prices: Vec<f64>,
}

#[derive(Deserialize)]
struct RawPriceHistory {
    dates: Vec<String>,
    prices: Vec<f64>,
}

impl TryFrom<RawPriceHistory> for PriceHistory {
    type Error = String;

    fn try_from(raw: RawPriceHistory) -> Result<Self, Self::Error> {
        PriceHistory::new(raw.dates, raw.prices)
    }
}

impl PriceHistory {
    /// 构造序列，日期与价格数量不一致时返回错误
    pub fn new(dates: Vec<String>, prices: Vec<f64>) -> Result<Self, String> {
        if dates.len() != prices.len() {
            return Err(format!(
                "dates 与 prices 长度不一致: {} != {}",
                dates.len(),
                prices.len()
            ));
        }
        Ok(Self { dates, prices })
    }

    pub fn dates(&self) -> &[String] {
        &self.dates
    }

    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// 末值减首值，序列为空时返回 None
    pub fn price_change(&self) -> Option<f64> {
        let first = self.prices.first()?;
        let last = self.prices.last()?;
        Some(last - first)
    }
}

/// 新闻条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    /// 标题
    pub headline: String,
    /// 摘要
    #[serde(default)]
    pub summary: String,
    /// 原文链接
    #[serde(default)]
    pub url: String,
}

/// 股票代码搜索建议
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolSuggestion {
    /// 股票代码
    pub symbol: String,
    /// 公司名称
    #[serde(default)]
    pub description: String,
    /// 展示用代码
    #[serde(default)]
    pub display_symbol: String,
    /// 证券类型
    #[serde(default, rename = "type")]
    pub kind: String,
}

/// 搜索查询参数
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// 搜索关键词
    #[serde(default)]
    pub q: String,
}

/// 规范化股票代码：去除空白并转大写
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}
