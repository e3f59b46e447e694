//! 客户端会话协作者
//!
//! Broker 只通过 [`Session`] trait 与会话交互：
//! - 登录成功时推送欢迎消息并激活交互界面
//! - 报价请求的结果回送到发起会话
//!
//! 会话的渲染与 I/O 不在本 crate 范围内，[`ChannelSession`] 把调用转成
//! 事件流供演示程序和测试消费。

pub mod channel;

use std::sync::Arc;

pub use channel::{ChannelSession, ChannelSessionFactory, SessionEvent};

/// 会话协作者
#[cfg_attr(test, mockall::automock)]
pub trait Session: Send + Sync {
    /// 接收一条文本消息（欢迎语、报价等）
    fn receive_message(&self, text: &str);

    /// 展示交互界面，登录成功时调用一次
    fn activate_interface(&self);
}

/// 会话工厂
///
/// 开户时为新账户创建其会话协作者
#[cfg_attr(test, mockall::automock)]
pub trait SessionFactory: Send + Sync {
    fn create_session(&self, account_name: &str) -> Arc<dyn Session>;
}
