//! # QABROKER-RS
//!
//! SafeTrade 交易模拟系统的券商核心
//!
//! ## 核心能力
//!
//! - **账户注册表**: 开户校验 (用户名/密码长度、用户名唯一性)
//! - **会话管理**: 登录/登出，已登录账户集合
//! - **路由**: 报价请求与订单转发到交易场所，报价结果回送到发起会话
//!
//! ## 架构设计
//!
//! ```text
//! 客户端会话 (Session)
//!     ↓  register / login / logout / request_quote / place_order
//! Broker (broker/)
//!     ↓  get_quote / place_order
//! 交易场所 (Venue, venue/)
//! ```
//!
//! 领域失败 (用户名非法、密码错误、重复登录等) 以结果枚举返回，
//! 只有基础设施错误 (密码哈希、序列化、配置) 走 [`BrokerError`]。

// ============================================================================
// 内部模块
// ============================================================================

/// 券商核心：账户注册表、会话管理、路由
pub mod broker;

/// 客户端会话协作者
pub mod session;

/// 交易场所协作者
pub mod venue;

/// 工具模块
pub mod utils;

// ============================================================================
// 重导出常用类型
// ============================================================================

pub use broker::{Account, Broker, BrokerSnapshot, LoginOutcome, RegisterOutcome};
pub use session::{ChannelSession, ChannelSessionFactory, Session, SessionEvent, SessionFactory};
pub use utils::config::BrokerConfig;
pub use venue::{OrderSide, SimulatedVenue, TradeOrder, Venue};

// ============================================================================
// 全局错误类型
// ============================================================================

/// 券商基础设施错误
///
/// 领域失败不会出现在这里，见 [`RegisterOutcome`] 与 [`LoginOutcome`]。
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("Password hash error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BrokerError>;
