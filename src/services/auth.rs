//! 用户后端接口
//!
//! 注册、登录、查询当前用户、登出都转发到远端用户服务。
//! 登录时记录后端下发的 Cookie，后续请求原样带回。

use std::fmt;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client, Response};
use url::Url;

use crate::config::{ApiConfig, AuthConfig};
use crate::models::{BackendReply, LoginRequest, RegisterRequest, UserProfile};

/// 用户后端拒绝请求（非 2xx），保留状态码与提示信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendRejection {
    pub status: u16,
    pub message: String,
}

impl fmt::Display for BackendRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for BackendRejection {}

/// 后端调用结果
#[derive(Debug, Clone)]
pub struct AuthReply {
    pub message: String,
    pub user: Option<UserProfile>,
    /// 登录时后端下发的 Cookie
    pub cookie: Option<String>,
}

/// 用户后端客户端
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: Url,
}

impl AuthClient {
    pub fn new(config: &AuthConfig, api: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.backend_url)
            .with_context(|| format!("无效的用户后端地址: {}", config.backend_url))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .connect_timeout(Duration::from_secs(api.connect_timeout_secs))
            .build()?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, action: &str) -> Result<Url> {
        self.base_url
            .join(&format!("/api/v1/user/{}", action))
            .with_context(|| format!("拼接用户后端地址失败: {}", action))
    }

    /// 注册新用户
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthReply> {
        let url = self.endpoint("register")?;
        log::debug!("📡 注册用户: {}", url);

        let response = self.client.post(url).json(request).send().await?;
        read_reply(response, "Registration failed").await
    }

    /// 登录，成功时返回后端 Cookie
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthReply> {
        let url = self.endpoint("login")?;
        log::debug!("📡 用户登录: {}", url);

        let response = self.client.post(url).json(request).send().await?;
        read_reply(response, "Login failed").await
    }

    /// 查询当前登录用户
    pub async fn current_user(&self, cookie: Option<&str>) -> Result<UserProfile> {
        let url = self.endpoint("me")?;
        let mut builder = self.client.get(url);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }

        let reply = read_reply(builder.send().await?, "Not authenticated").await?;
        reply.user.ok_or_else(|| anyhow!("用户后端未返回用户信息"))
    }

    /// 登出
    pub async fn logout(&self, cookie: Option<&str>) -> Result<AuthReply> {
        let url = self.endpoint("logout")?;
        let mut builder = self.client.get(url);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }

        read_reply(builder.send().await?, "Logout failed").await
    }
}

/// 读取后端响应，非 2xx 转为 BackendRejection
async fn read_reply(response: Response, fallback: &str) -> Result<AuthReply> {
    let status = response.status();
    let cookie = extract_cookie(&response);
    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => {
            log::warn!("读取用户后端响应失败 ({}): {:#}", status, e);
            String::new()
        }
    };
    let body = decode_body(&text, status.as_u16());

    if !status.is_success() {
        return Err(BackendRejection {
            status: status.as_u16(),
            message: body.message.unwrap_or_else(|| fallback.to_string()),
        }
        .into());
    }

    Ok(AuthReply {
        message: body.message.unwrap_or_else(|| "Success".to_string()),
        user: body.user,
        cookie,
    })
}

/// 解析后端响应体，无法解析时记录警告并按空响应处理
fn decode_body(text: &str, status: u16) -> BackendReply {
    match serde_json::from_str(text) {
        Ok(body) => body,
        Err(e) => {
            log::warn!("用户后端响应无法解析 ({}): {}", status, e);
            BackendReply::default()
        }
    }
}

/// 拼接 Set-Cookie 中的 name=value 部分
fn extract_cookie(response: &Response) -> Option<String> {
    let pairs: Vec<&str> = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(cookie_pair)
        .collect();

    (!pairs.is_empty()).then(|| pairs.join("; "))
}

fn cookie_pair(set_cookie: &str) -> Option<&str> {
    let pair = set_cookie.split(';').next()?.trim();
    pair.contains('=').then_some(pair)
}
