pub mod stock;
pub mod pitch;
pub mod user;
pub mod health;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(health::config)
            .configure(user::config)
            .configure(stock::config)
            .configure(pitch::config)
    );
}

#[cfg(test)]
pub(crate) mod test_support {
    use actix_web::web;

    use crate::config::AppConfig;
    use crate::models::UserProfile;
    use crate::services::session::{Session, SessionStore};
    use crate::state::AppState;

    /// 不含 Finnhub Token 的默认状态，任何行情请求都会在发出前失败
    pub fn app_state() -> web::Data<AppState> {
        web::Data::new(AppState::from_config(&AppConfig::default()).unwrap())
    }

    pub fn sessions() -> web::Data<SessionStore> {
        web::Data::new(SessionStore::new(3600))
    }

    /// 创建一个已登录会话，返回 Authorization 头
    pub fn sign_in(sessions: &SessionStore) -> (String, String) {
        let mut session = Session::anonymous();
        session.sign_in(UserProfile::default(), None);
        let token = sessions.insert(session);
        (token.clone(), format!("Bearer {}", token))
    }
}
