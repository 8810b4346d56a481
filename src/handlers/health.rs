use actix_web::{web, HttpResponse, Result};
use serde::Serialize;

use crate::models::ApiResponse;
use crate::services::session::SessionStore;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub active_sessions: usize,
}

pub async fn health_check(sessions: web::Data<SessionStore>) -> Result<HttpResponse> {
    let response = ApiResponse::success(HealthStatus {
        status: "Service is healthy",
        active_sessions: sessions.len(),
    });
    Ok(HttpResponse::Ok().json(response))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
