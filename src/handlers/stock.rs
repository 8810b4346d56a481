//! 股票接口处理器
//!
//! ## API 列表
//! - GET /stocks/search?q= - 搜索股票代码
//! - GET /stocks/{symbol}/metrics - 获取财务指标
//! - GET /stocks/{symbol}/history - 获取一年日K线收盘价
//! - GET /stocks/{symbol}/news - 获取最近公司新闻
//! - GET /stocks/{symbol}/pitch - 拉取以上数据并生成推介

use actix_web::{web, HttpResponse, Result};

use crate::handlers::pitch::{build_pitch_response, pitch_message};
use crate::models::{
    normalize_symbol, ApiResponse, NewsItem, PriceHistory, SearchQuery, StockMetrics,
    SymbolSuggestion,
};
use crate::services::session::{SessionStore, SessionToken};
use crate::state::AppState;

fn bad_gateway<T>(e: anyhow::Error) -> HttpResponse
where
    T: serde::Serialize,
{
    log::error!("行情数据请求失败: {:#}", e);
    HttpResponse::BadGateway().json(ApiResponse::<T>::error(format!("{:#}", e)))
}

/// 搜索股票代码
///
/// GET /api/v1/stocks/search?q=apple
pub async fn search_stocks(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse> {
    match state.finnhub.search_symbols(&query.q).await {
        Ok(suggestions) => Ok(HttpResponse::Ok().json(ApiResponse::success(suggestions))),
        Err(e) => Ok(bad_gateway::<Vec<SymbolSuggestion>>(e)),
    }
}

/// 获取财务指标
///
/// GET /api/v1/stocks/{symbol}/metrics
pub async fn get_stock_metrics(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let symbol = normalize_symbol(&path.into_inner());

    match state.finnhub.get_stock_metrics(&symbol).await {
        Ok(metrics) => Ok(HttpResponse::Ok().json(ApiResponse::success(metrics))),
        Err(e) => Ok(bad_gateway::<StockMetrics>(e)),
    }
}

/// 获取历史收盘价
///
/// GET /api/v1/stocks/{symbol}/history
pub async fn get_stock_history(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let symbol = normalize_symbol(&path.into_inner());

    match state.finnhub.get_stock_history(&symbol).await {
        Ok(Some(history)) => Ok(HttpResponse::Ok().json(ApiResponse::success(history))),
        Ok(None) => {
            let response =
                ApiResponse::<PriceHistory>::error(format!("{} 暂无历史数据", symbol));
            Ok(HttpResponse::NotFound().json(response))
        }
        Err(e) => Ok(bad_gateway::<PriceHistory>(e)),
    }
}

/// 获取最近公司新闻
///
/// GET /api/v1/stocks/{symbol}/news
pub async fn get_stock_news(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let symbol = normalize_symbol(&path.into_inner());

    match state.finnhub.get_company_news(&symbol).await {
        Ok(news) => Ok(HttpResponse::Ok().json(ApiResponse::success(news))),
        Err(e) => Ok(bad_gateway::<Vec<NewsItem>>(e)),
    }
}

/// 拉取指标、K线、新闻并生成推介
///
/// GET /api/v1/stocks/{symbol}/pitch
pub async fn get_stock_pitch(
    state: web::Data<AppState>,
    sessions: web::Data<SessionStore>,
    token: web::ReqData<SessionToken>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let symbol = normalize_symbol(&path.into_inner());
    let inputs = state.finnhub.fetch_pitch_inputs(&symbol).await;

    let result = build_pitch_response(&sessions, &token, symbol, &inputs);
    let message = pitch_message(&result);
    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(result, message)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/stocks")
            .route("/search", web::get().to(search_stocks))
            .route("/{symbol}/metrics", web::get().to(get_stock_metrics))
            .route("/{symbol}/history", web::get().to(get_stock_history))
            .route("/{symbol}/news", web::get().to(get_stock_news))
            .route("/{symbol}/pitch", web::get().to(get_stock_pitch))
    );
}
