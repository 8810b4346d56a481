//! 会话认证中间件
//!
//! 通过 Header 中的 Authorization: Bearer <session token> 识别已登录会话，
//! 并把令牌写入请求扩展供处理器读取

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage, HttpResponse,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::models::ApiResponse;
use crate::services::session::{SessionStore, SessionToken};

/// 无需登录即可访问的路径后缀
const PUBLIC_SUFFIXES: [&str; 3] = ["/health", "/user/login", "/user/register"];

/// 会话中间件
pub struct SessionMiddleware {
    sessions: web::Data<SessionStore>,
}

impl SessionMiddleware {
    pub fn new(sessions: web::Data<SessionStore>) -> Self {
        Self { sessions }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = SessionMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(SessionMiddlewareService {
            service: Rc::new(service),
            sessions: self.sessions.clone(),
        })
    }
}

pub struct SessionMiddlewareService<S> {
    service: Rc<S>,
    sessions: web::Data<SessionStore>,
}

impl<S, B> Service<ServiceRequest> for SessionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let sessions = self.sessions.clone();

        Box::pin(async move {
            // 跳过公开接口
            if PUBLIC_SUFFIXES.iter().any(|p| req.path().ends_with(p)) {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            }

            // 验证 Bearer Token 对应的会话已登录
            let token = req
                .headers()
                .get("Authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|v| v.trim().to_string());

            let authenticated = token
                .as_deref()
                .and_then(|t| sessions.get(t))
                .map(|s| s.is_authenticated())
                .unwrap_or(false);

            match token {
                Some(token) if authenticated => {
                    req.extensions_mut().insert(SessionToken(token));
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                _ => {
                    log::debug!("拒绝未登录请求: {}", req.path());
                    let response = HttpResponse::Unauthorized()
                        .json(ApiResponse::<()>::error("Please login to continue".to_string()));
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};

    use crate::models::UserProfile;
    use crate::services::session::Session;

    async fn echo_token(token: web::ReqData<SessionToken>) -> HttpResponse {
        HttpResponse::Ok().body(token.into_inner().0)
    }

    async fn public() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    fn store() -> web::Data<SessionStore> {
        web::Data::new(SessionStore::new(3600))
    }

    #[actix_web::test]
    async fn test_rejects_missing_token() {
        let sessions = store();
        let app = test::init_service(
            App::new()
                .wrap(SessionMiddleware::new(sessions.clone()))
                .route("/api/v1/stocks/search", web::get().to(echo_token)),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/stocks/search").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_rejects_anonymous_session() {
        let sessions = store();
        let token = sessions.insert(Session::anonymous());
        let app = test::init_service(
            App::new()
                .wrap(SessionMiddleware::new(sessions.clone()))
                .route("/api/v1/stocks/search", web::get().to(echo_token)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/stocks/search")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_passes_authenticated_session() {
        let sessions = store();
        let mut session = Session::anonymous();
        session.sign_in(UserProfile::default(), None);
        let token = sessions.insert(session);

        let app = test::init_service(
            App::new()
                .wrap(SessionMiddleware::new(sessions.clone()))
                .route("/api/v1/stocks/search", web::get().to(echo_token)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/stocks/search")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, token.as_bytes());
    }

    #[actix_web::test]
    async fn test_public_paths_skip_auth() {
        let app = test::init_service(
            App::new()
                .wrap(SessionMiddleware::new(store()))
                .route("/api/v1/health", web::get().to(public))
                .route("/api/v1/user/login", web::post().to(public)),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/health").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::post().uri("/api/v1/user/login").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }
}
