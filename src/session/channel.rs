//! 基于通道的会话实现
//!
//! 每个账户一条 crossbeam 通道，会话调用按发生顺序入队

use super::{Session, SessionFactory};
use crossbeam::channel::{unbounded, Receiver, Sender};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 会话事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// 收到文本消息
    Message(String),
    /// 交互界面已激活
    InterfaceActivated,
}

/// 通道会话
///
/// 使用无界通道，接收端不消费时事件会一直积压
pub struct ChannelSession {
    account_name: String,
    sender: Sender<SessionEvent>,
}

impl ChannelSession {
    pub fn new(account_name: impl Into<String>, sender: Sender<SessionEvent>) -> Self {
        Self {
            account_name: account_name.into(),
            sender,
        }
    }

    /// 创建会话及其接收端
    pub fn pair(account_name: impl Into<String>) -> (Self, Receiver<SessionEvent>) {
        let (tx, rx) = unbounded();
        (Self::new(account_name, tx), rx)
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    fn push(&self, event: SessionEvent) {
        // 接收端已关闭说明客户端断开，事件直接丢弃
        if self.sender.send(event).is_err() {
            log::debug!("Session receiver closed: {}", self.account_name);
        }
    }
}

impl Session for ChannelSession {
    fn receive_message(&self, text: &str) {
        self.push(SessionEvent::Message(text.to_string()));
    }

    fn activate_interface(&self) {
        self.push(SessionEvent::InterfaceActivated);
    }
}

/// 通道会话工厂
///
/// 保存每个账户的接收端 (account_name -> Receiver)
#[derive(Default)]
pub struct ChannelSessionFactory {
    receivers: DashMap<String, Receiver<SessionEvent>>,
}

impl ChannelSessionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取账户会话的接收端
    pub fn receiver(&self, account_name: &str) -> Option<Receiver<SessionEvent>> {
        self.receivers.get(account_name).map(|r| r.value().clone())
    }

    /// 取出账户会话当前积压的全部事件
    pub fn drain(&self, account_name: &str) -> Vec<SessionEvent> {
        self.receiver(account_name)
            .map(|rx| rx.try_iter().collect())
            .unwrap_or_default()
    }
}

impl SessionFactory for ChannelSessionFactory {
    fn create_session(&self, account_name: &str) -> Arc<dyn Session> {
        let (session, rx) = ChannelSession::pair(account_name);
        self.receivers.insert(account_name.to_string(), rx);
        Arc::new(session)
    }
}
