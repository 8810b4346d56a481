//! Stock Pitch 后端服务
//!
//! 提供股票搜索、财务指标、历史行情、公司新闻与投资推介的 RESTful API 服务
//! 数据来源：Finnhub；用户认证由远端用户服务完成

mod config;     // 配置加载
mod handlers;   // HTTP 请求处理器
mod middleware; // 中间件
mod models;     // 数据模型定义
mod services;   // 业务逻辑服务
mod state;      // 共享状态

use std::time::Duration;

use actix_web::{web, App, HttpServer, middleware::Logger};
use env_logger::Env;

use crate::config::AppConfig;
use crate::middleware::SessionMiddleware;
use crate::services::session::SessionStore;
use crate::state::AppState;

/// 应用程序入口
///
/// 加载配置后启动 HTTP 服务器，默认监听 0.0.0.0:8080
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // 读取 .env（如存在），FINNHUB_API_KEY 通常放在这里
    dotenvy::dotenv().ok();

    let config = AppConfig::load();

    // 初始化日志系统，RUST_LOG 优先，否则使用配置中的级别（默认 info）
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));

    if config.finnhub.api_key.is_empty() {
        log::warn!("未设置 FINNHUB_API_KEY，行情接口请求将被拒绝");
    }

    let state = AppState::from_config(&config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    let state = web::Data::new(state);
    let sessions = web::Data::new(SessionStore::new(config.auth.session_ttl_secs));

    spawn_session_sweeper(sessions.clone(), config.auth.sweep_interval_secs);

    log::info!("启动 Stock Pitch 后端服务: {}", config.bind_addr());

    // 创建并启动 HTTP 服务器
    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(sessions.clone())
            .wrap(SessionMiddleware::new(sessions.clone()))  // 会话认证
            .wrap(Logger::default())  // 添加请求日志中间件
            .configure(handlers::config)  // 配置路由
    });

    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(config.bind_addr())?.run().await
}

/// 定期清理过期会话
fn spawn_session_sweeper(sessions: web::Data<SessionStore>, interval_secs: u64) {
    if interval_secs == 0 {
        return;
    }

    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            let purged = sessions.purge_expired();
            if purged > 0 {
                log::info!("清理过期会话 {} 个", purged);
            }
        }
    });
}
