//! 用户与登录相关的数据模型

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static PHONE_RE: OnceLock<Option<Regex>> = OnceLock::new();

fn phone_re() -> Option<&'static Regex> {
    PHONE_RE.get_or_init(|| Regex::new(r"^\d{10}$").ok()).as_ref()
}

/// 登录请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    /// 邮箱和密码都不能为空
    pub fn validate(&self) -> Result<(), String> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err("Email and password are required".to_string());
        }
        Ok(())
    }
}

/// 注册请求，字段名与用户后端保持一致
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub password: String,
}

impl RegisterRequest {
    /// 手机号必须是 10 位数字
    pub fn validate(&self) -> Result<(), String> {
        let valid = phone_re().map_or(false, |re| re.is_match(self.phone.trim()));
        if !valid {
            return Err("phone must contain 10 digits".to_string());
        }
        Ok(())
    }
}

/// 用户后端返回的用户信息
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
}

/// 用户后端的通用响应体
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendReply {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// 登录成功后返回给调用方的内容
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// 会话令牌，后续请求放在 Authorization: Bearer 中
    pub token: String,
    pub message: String,
    pub user: Option<UserProfile>,
}
