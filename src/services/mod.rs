//! 业务逻辑服务模块
//! 
//! 封装数据获取和处理逻辑

pub mod auth;     // 用户后端
pub mod finnhub;  // Finnhub 行情数据
pub mod pitch;    // 推介生成
pub mod session;  // 会话管理
