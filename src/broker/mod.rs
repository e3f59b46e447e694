//! 券商模块
//!
//! 账户注册表、会话管理与报价/订单路由

pub mod account;
pub mod brokerage;
pub mod outcome;

pub use account::Account;
pub use brokerage::{Broker, BrokerSnapshot};
pub use outcome::{LoginOutcome, RegisterOutcome};
