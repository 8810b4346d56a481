//! 会话管理
//!
//! 会话生命周期：匿名 -> 已登录 -> 匿名（登出）。
//! 会话以随机令牌为键保存在内存中，按最后访问时间过期。

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::models::UserProfile;

/// 会话状态
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated(UserProfile),
}

/// 单个用户会话
#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    /// 用户后端下发的 Cookie，后续请求原样带回
    backend_cookie: Option<String>,
    /// 上一次成功生成的推介文本
    last_pitch: Option<String>,
    last_seen: DateTime<Utc>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self {
            state: SessionState::Anonymous,
            backend_cookie: None,
            last_pitch: None,
            last_seen: Utc::now(),
        }
    }

    /// 登录成功，进入已登录状态
    pub fn sign_in(&mut self, user: UserProfile, backend_cookie: Option<String>) {
        self.state = SessionState::Authenticated(user);
        self.backend_cookie = backend_cookie;
    }

    /// 登出，回到匿名状态并清空与用户相关的数据
    pub fn sign_out(&mut self) {
        self.state = SessionState::Anonymous;
        self.backend_cookie = None;
        self.last_pitch = None;
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated(_))
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn user(&self) -> Option<&UserProfile> {
        match &self.state {
            SessionState::Authenticated(user) => Some(user),
            SessionState::Anonymous => None,
        }
    }

    /// 刷新用户信息，匿名会话不受影响
    pub fn refresh_user(&mut self, user: UserProfile) {
        if self.is_authenticated() {
            self.state = SessionState::Authenticated(user);
        }
    }

    pub fn backend_cookie(&self) -> Option<&str> {
        self.backend_cookie.as_deref()
    }

    pub fn last_pitch(&self) -> Option<&str> {
        self.last_pitch.as_deref()
    }

    pub fn set_last_pitch(&mut self, pitch: String) {
        self.last_pitch = Some(pitch);
    }

    fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.last_seen > ttl
    }
}

/// 请求扩展中携带的会话令牌，由会话中间件写入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(pub String);

/// chrono::Duration 可表示的最大秒数
const MAX_TTL_SECS: i64 = i64::MAX / 1000;

/// 内存会话存储，在所有 worker 间共享
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: Duration::seconds(
                i64::try_from(ttl_secs)
                    .unwrap_or(i64::MAX)
                    .min(MAX_TTL_SECS),
            ),
        }
    }

    /// 保存会话并返回新令牌
    pub fn insert(&self, session: Session) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.insert(token.clone(), session);
        token
    }

    /// 读取会话快照，已过期的会话视为不存在并被移除
    pub fn get(&self, token: &str) -> Option<Session> {
        self.update(token, |session| session.clone())
    }

    /// 修改会话并刷新最后访问时间
    pub fn update<F, R>(&self, token: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut Session) -> R,
    {
        let now = Utc::now();
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());

        if sessions.get(token)?.is_expired(now, self.ttl) {
            sessions.remove(token);
            return None;
        }

        let session = sessions.get_mut(token)?;
        session.last_seen = now;
        Some(f(session))
    }

    pub fn remove(&self, token: &str) -> Option<Session> {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.remove(token)
    }

    /// 清理过期会话，返回清理数量
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now, self.ttl));
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserProfile {
        UserProfile {
            email: Some("ada@example.com".into()),
            ..UserProfile::default()
        }
    }

    #[test]
    fn test_session_lifecycle() {
        let mut session = Session::anonymous();
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());

        session.sign_in(user(), Some("token=abc".into()));
        assert!(session.is_authenticated());
        assert_eq!(session.user(), Some(&user()));
        assert_eq!(session.backend_cookie(), Some("token=abc"));

        session.set_last_pitch("pitch".into());
        session.sign_out();
        assert_eq!(session.state(), &SessionState::Anonymous);
        assert!(session.backend_cookie().is_none());
        assert!(session.last_pitch().is_none());
    }

    #[test]
    fn test_refresh_user_ignores_anonymous() {
        let mut session = Session::anonymous();
        session.refresh_user(user());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_store_insert_get_remove() {
        let store = SessionStore::new(3600);
        let mut session = Session::anonymous();
        session.sign_in(user(), None);

        let token = store.insert(session);
        assert_eq!(token.len(), 32);
        assert!(store.get(&token).unwrap().is_authenticated());
        assert!(store.get("unknown").is_none());

        store.update(&token, |s| s.set_last_pitch("hello".into()));
        assert_eq!(store.get(&token).unwrap().last_pitch(), Some("hello"));

        assert!(store.remove(&token).is_some());
        assert!(store.get(&token).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_tokens_are_unique() {
        let store = SessionStore::new(3600);
        let a = store.insert(Session::anonymous());
        let b = store.insert(Session::anonymous());
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_huge_ttl_is_clamped() {
        for ttl in [u64::MAX, i64::MAX as u64, (i64::MAX / 1000) as u64 + 1] {
            let store = SessionStore::new(ttl);
            assert_eq!(store.ttl, Duration::seconds(MAX_TTL_SECS));
            let token = store.insert(Session::anonymous());
            assert!(store.get(&token).is_some());
        }
    }

    #[test]
    fn test_expired_sessions() {
        let store = SessionStore::new(60);
        let mut stale = Session::anonymous();
        stale.last_seen = Utc::now() - Duration::seconds(120);
        let stale_token = store.insert(stale);
        let fresh_token = store.insert(Session::anonymous());

        assert!(store.get(&stale_token).is_none());
        assert!(store.get(&fresh_token).is_some());

        let mut stale = Session::anonymous();
        stale.last_seen = Utc::now() - Duration::seconds(120);
        store.insert(stale);
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
    }
}
