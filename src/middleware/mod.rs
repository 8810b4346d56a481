//! 中间件

mod session;

pub use session::SessionMiddleware;
