pub mod dispatch;
pub mod error;
pub mod sink;
pub mod team;
