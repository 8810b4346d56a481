//! 投资推介生成
//!
//! 根据财务指标、历史价格和新闻标题拼装一段固定结构的推介文本。
//! 纯函数，无副作用：相同输入得到相同输出。
//!
//! ## 段落结构
//! - 标题：股票代码
//! - Financial Overview：四项指标原样列出
//! - 分析段：估值（P/E）、盈利（EPS）、股息（Dividend Yield）
//! - Growth Potential：首尾价格差决定增长方向
//! - Risks：标题中包含风险关键词的新闻
//! - Conclusion：按 P/E 阈值给出结论

use std::fmt;

use crate::models::{MetricValue, NewsItem, PitchInputs, PriceHistory, StockMetrics};

/// P/E 高估阈值（严格大于）
pub const PE_RATIO_THRESHOLD: f64 = 20.0;
/// EPS 盈利能力阈值（严格大于）
pub const EPS_THRESHOLD: f64 = 3.0;
/// 股息率吸引力阈值（严格大于，百分比）
pub const DIVIDEND_YIELD_THRESHOLD: f64 = 1.0;
/// 新闻标题中的风险关键词，区分大小写的子串匹配
pub const RISK_KEYWORDS: [&str; 2] = ["decline", "drop"];

/// 估值判断
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Valuation {
    High,
    Moderate,
    Unknown,
}

impl Valuation {
    pub fn classify(pe_ratio: MetricValue) -> Self {
        match pe_ratio.exceeds(PE_RATIO_THRESHOLD) {
            Some(true) => Valuation::High,
            Some(false) => Valuation::Moderate,
            None => Valuation::Unknown,
        }
    }

    fn sentence(self, ticker: &str) -> String {
        match self {
            Valuation::High => format!(
                "Based on the financial data, {} shows a high P/E ratio, indicating that it is potentially overvalued in the current market.",
                ticker
            ),
            Valuation::Moderate => format!(
                "Based on the financial data, {} shows a moderate P/E ratio, indicating that it is reasonably valued in the current market.",
                ticker
            ),
            Valuation::Unknown => format!(
                "Based on the financial data, {} does not report a P/E ratio, so its valuation in the current market cannot be assessed.",
                ticker
            ),
        }
    }
}

/// 盈利能力判断
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profitability {
    Strong,
    Challenged,
    Unknown,
}

impl Profitability {
    pub fn classify(eps: MetricValue) -> Self {
        match eps.exceeds(EPS_THRESHOLD) {
            Some(true) => Profitability::Strong,
            Some(false) => Profitability::Challenged,
            None => Profitability::Unknown,
        }
    }

    fn sentence(self, eps: MetricValue) -> String {
        match self {
            Profitability::Strong => format!(
                "The earnings per share (EPS) of {} suggests that the company is generating strong profits.",
                eps
            ),
            Profitability::Challenged => format!(
                "The earnings per share (EPS) of {} suggests that the company is facing some profitability challenges.",
                eps
            ),
            Profitability::Unknown => {
                "The earnings per share (EPS) is not available, so the company's profitability cannot be assessed."
                    .to_string()
            }
        }
    }
}

/// 股息吸引力判断
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncomeAppeal {
    Attractive,
    Low,
    Unknown,
}

impl IncomeAppeal {
    pub fn classify(dividend_yield: MetricValue) -> Self {
        match dividend_yield.exceeds(DIVIDEND_YIELD_THRESHOLD) {
            Some(true) => IncomeAppeal::Attractive,
            Some(false) => IncomeAppeal::Low,
            None => IncomeAppeal::Unknown,
        }
    }

    fn sentence(self, dividend_yield: MetricValue) -> String {
        let verdict = match self {
            IncomeAppeal::Attractive => "attractive",
            IncomeAppeal::Low => "relatively low",
            IncomeAppeal::Unknown => {
                return "The dividend yield is not available, so its appeal to income-seeking investors cannot be assessed."
                    .to_string()
            }
        };
        format!(
            "The dividend yield of {}% reflects the company’s approach to returning value to shareholders, which is {} for income-seeking investors.",
            dividend_yield, verdict
        )
    }
}

/// 增长方向
///
/// 首尾价格差大于 0 为正增长，其余（包括 0 和只有一个价格点）均为负增长
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthOutlook {
    Positive,
    Negative,
}

impl GrowthOutlook {
    /// 序列为空时返回 None
    pub fn classify(history: &PriceHistory) -> Option<Self> {
        let change = history.price_change()?;
        Some(if change > 0.0 {
            GrowthOutlook::Positive
        } else {
            GrowthOutlook::Negative
        })
    }

    pub fn label(self) -> &'static str {
        match self {
            GrowthOutlook::Positive => "positive growth potential",
            GrowthOutlook::Negative => "negative growth potential",
        }
    }

    fn sentence(self) -> String {
        format!(
            "The stock has shown {}, indicating strong momentum in the market.",
            self.label()
        )
    }
}

/// 结论基调，与估值使用同一个 P/E 阈值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outlook {
    Risky,
    Promising,
    Uncertain,
}

impl Outlook {
    pub fn from_valuation(valuation: Valuation) -> Self {
        match valuation {
            Valuation::High => Outlook::Risky,
            Valuation::Moderate => Outlook::Promising,
            Valuation::Unknown => Outlook::Uncertain,
        }
    }

    fn phrase(self) -> &'static str {
        match self {
            Outlook::Risky => "a risky",
            Outlook::Promising => "a promising",
            Outlook::Uncertain => "an uncertain",
        }
    }
}

/// 从新闻标题中提取的风险提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskNote {
    pub headline: String,
}

impl fmt::Display for RiskNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Risk: Potential decline in stock price due to negative news: {}",
            self.headline
        )
    }
}

/// 扫描新闻标题，每条命中关键词的新闻生成一条风险提示
pub fn scan_risks(news: &[NewsItem]) -> Vec<RiskNote> {
    news.iter()
        .filter(|item| RISK_KEYWORDS.iter().any(|kw| item.headline.contains(kw)))
        .map(|item| RiskNote {
            headline: item.headline.clone(),
        })
        .collect()
}

/// 结构化的推介内容，`Display` 输出完整文本
#[derive(Debug, Clone, PartialEq)]
pub struct Pitch {
    pub ticker: String,
    pub metrics: StockMetrics,
    pub valuation: Valuation,
    pub profitability: Profitability,
    pub income: IncomeAppeal,
    pub growth: GrowthOutlook,
    pub risks: Vec<RiskNote>,
    pub outlook: Outlook,
}

impl Pitch {
    pub fn overview_section(&self) -> String {
        format!(
            "1. Financial Overview:\n\
             - Market Capitalization: {}\n\
             - P/E Ratio: {}\n\
             - Earnings Per Share (EPS): {}\n\
             - Dividend Yield: {}",
            self.metrics.market_cap,
            self.metrics.pe_ratio,
            self.metrics.eps,
            self.metrics.dividend_yield
        )
    }

    pub fn analysis_section(&self) -> String {
        format!(
            "{} {} {}",
            self.valuation.sentence(&self.ticker),
            self.profitability.sentence(self.metrics.eps),
            self.income.sentence(self.metrics.dividend_yield)
        )
    }

    pub fn growth_section(&self) -> String {
        format!(
            "2. Growth Potential:\n\
             {}\n\
             With the company's ongoing innovation in [insert relevant sector/technology], there is significant potential for growth. \
             However, market fluctuations or external factors like [insert specific influences, e.g., global demand, tech trends] \
             could affect this trajectory in the near future.",
            self.growth.sentence()
        )
    }

    pub fn risks_section(&self) -> String {
        let body = if self.risks.is_empty() {
            "Currently, there are no significant risks identified.".to_string()
        } else {
            let lines: Vec<String> = self.risks.iter().map(|r| format!("- {}", r)).collect();
            format!("Some of the key risks include:\n{}", lines.join("\n"))
        };
        format!(
            "3. Risks:\n\
             {}\n\
             Key factors to monitor include potential changes in [market trends, regulations, etc.] \
             or any emerging challenges in the company's core business areas.",
            body
        )
    }

    pub fn conclusion_section(&self) -> String {
        format!(
            "#Conclusion:\n\
             In conclusion, while {} presents {} investment opportunity, it’s important to keep an eye on \
             [market trends, economic conditions] for any potential shifts in the company's growth trajectory.",
            self.ticker,
            self.outlook.phrase()
        )
    }

    pub fn text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stock: {}\n\n{}\n\n{}\n\n{}\n\n{}\n\n{}\n",
            self.ticker,
            self.overview_section(),
            self.analysis_section(),
            self.growth_section(),
            self.risks_section(),
            self.conclusion_section()
        )
    }
}

/// 生成推介
///
/// 指标、历史价格、新闻任一缺失，或价格序列为空时返回 None。
/// 空的新闻列表视为已就绪。
pub fn synthesize(
    ticker: &str,
    metrics: Option<&StockMetrics>,
    history: Option<&PriceHistory>,
    news: Option<&[NewsItem]>,
) -> Option<Pitch> {
    let (metrics, history, news) = (metrics?, history?, news?);
    let growth = GrowthOutlook::classify(history)?;
    let valuation = Valuation::classify(metrics.pe_ratio);

    Some(Pitch {
        ticker: ticker.to_string(),
        metrics: metrics.clone(),
        valuation,
        profitability: Profitability::classify(metrics.eps),
        income: IncomeAppeal::classify(metrics.dividend_yield),
        growth,
        risks: scan_risks(news),
        outlook: Outlook::from_valuation(valuation),
    })
}

impl PitchInputs {
    pub fn synthesize(&self, ticker: &str) -> Option<Pitch> {
        synthesize(
            ticker,
            self.metrics.as_ref(),
            self.history.as_ref(),
            self.news.as_deref(),
        )
    }
}
