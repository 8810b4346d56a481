//! 用户接口处理器
//!
//! ## API 列表
//! - POST /user/register - 注册
//! - POST /user/login - 登录，返回会话令牌
//! - GET /user/me - 当前用户
//! - GET /user/logout - 登出

use actix_web::{http::StatusCode, web, HttpResponse, Result};

use crate::models::{ApiResponse, LoginRequest, LoginResponse, RegisterRequest, UserProfile};
use crate::services::auth::BackendRejection;
use crate::services::session::{Session, SessionStore, SessionToken};
use crate::state::AppState;

/// 后端错误转换为响应：后端拒绝时透传状态码与提示，其余为 502
fn backend_error<T: serde::Serialize>(e: anyhow::Error) -> HttpResponse {
    match e.downcast_ref::<BackendRejection>() {
        Some(rejection) => {
            let status =
                StatusCode::from_u16(rejection.status).unwrap_or(StatusCode::BAD_GATEWAY);
            HttpResponse::build(status).json(ApiResponse::<T>::error(rejection.message.clone()))
        }
        None => {
            log::error!("用户后端请求失败: {:#}", e);
            HttpResponse::BadGateway().json(ApiResponse::<T>::error(format!("{:#}", e)))
        }
    }
}

/// 注册
///
/// POST /api/v1/user/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let request = body.into_inner();
    if let Err(msg) = request.validate() {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error(msg)));
    }

    match state.auth.register(&request).await {
        Ok(reply) => {
            log::info!("用户注册成功: {}", request.email);
            Ok(HttpResponse::Ok().json(ApiResponse::success_with_message((), reply.message)))
        }
        Err(e) => Ok(backend_error::<()>(e)),
    }
}

/// 登录
///
/// POST /api/v1/user/login
pub async fn login(
    state: web::Data<AppState>,
    sessions: web::Data<SessionStore>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let request = body.into_inner();
    if let Err(msg) = request.validate() {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::<LoginResponse>::error(msg)));
    }

    match state.auth.login(&request).await {
        Ok(reply) => {
            let mut session = Session::anonymous();
            session.sign_in(reply.user.clone().unwrap_or_default(), reply.cookie);
            let token = sessions.insert(session);
            log::info!("用户登录成功: {}", request.email);

            let response = LoginResponse {
                token,
                message: reply.message.clone(),
                user: reply.user,
            };
            Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(response, reply.message)))
        }
        Err(e) => Ok(backend_error::<LoginResponse>(e)),
    }
}

/// 当前用户
///
/// GET /api/v1/user/me
///
/// 后端不再认可该会话时，本地会话同步回到匿名状态
pub async fn me(
    state: web::Data<AppState>,
    sessions: web::Data<SessionStore>,
    token: web::ReqData<SessionToken>,
) -> Result<HttpResponse> {
    let cookie = sessions
        .get(&token.0)
        .and_then(|s| s.backend_cookie().map(str::to_string));

    match state.auth.current_user(cookie.as_deref()).await {
        Ok(user) => {
            sessions.update(&token.0, |s| s.refresh_user(user.clone()));
            Ok(HttpResponse::Ok().json(ApiResponse::success(user)))
        }
        Err(e) => {
            if e.downcast_ref::<BackendRejection>().is_some() {
                log::info!("用户后端拒绝会话，本地登出");
                sessions.update(&token.0, |s| s.sign_out());
            }
            Ok(backend_error::<UserProfile>(e))
        }
    }
}

/// 登出
///
/// GET /api/v1/user/logout
pub async fn logout(
    state: web::Data<AppState>,
    sessions: web::Data<SessionStore>,
    token: web::ReqData<SessionToken>,
) -> Result<HttpResponse> {
    let cookie = sessions
        .get(&token.0)
        .and_then(|s| s.backend_cookie().map(str::to_string));

    match state.auth.logout(cookie.as_deref()).await {
        Ok(reply) => {
            sessions.update(&token.0, |s| s.sign_out());
            sessions.remove(&token.0);
            Ok(HttpResponse::Ok().json(ApiResponse::success_with_message((), reply.message)))
        }
        Err(e) => Ok(backend_error::<()>(e)),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/user")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/me", web::get().to(me))
            .route("/logout", web::get().to(logout))
    );
}
