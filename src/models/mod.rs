pub mod stock;
pub mod pitch;
pub mod user;
pub mod response;

pub use stock::*;
pub use pitch::*;
pub use user::*;
pub use response::*;
