//! 交易账户
//!
//! 账户只能通过 [`Broker::register`] 创建，创建后用户名不可变，不支持销户。
//! 账户持有所属 Broker 的弱引用，用于向 Broker 请求服务。

use super::Broker;
use crate::session::Session;
use crate::venue::Venue;
use crate::Result;
use chrono::{DateTime, Utc};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

/// 交易账户
pub struct Account<V: Venue> {
    /// 用户名（注册表唯一键）
    name: String,

    /// bcrypt 密码哈希
    password_hash: String,

    /// 该账户的会话协作者
    session: Arc<dyn Session>,

    /// 所属 Broker（非拥有关系）
    broker: Weak<Broker<V>>,

    created_at: DateTime<Utc>,
}

impl<V: Venue> Account<V> {
    pub(crate) fn new(
        name: String,
        password_hash: String,
        session: Arc<dyn Session>,
        broker: Weak<Broker<V>>,
    ) -> Self {
        Self {
            name,
            password_hash,
            session,
            broker,
            created_at: Utc::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// 校验密码
    pub fn verify_secret(&self, secret: &str) -> Result<bool> {
        Ok(bcrypt::verify(secret, &self.password_hash)?)
    }

    /// 通过所属 Broker 查询报价，结果回送到本账户会话
    pub fn get_quote(&self, symbol: &str) {
        match self.broker.upgrade() {
            Some(broker) => broker.request_quote(symbol, self.session.as_ref()),
            None => log::warn!("Broker dropped, quote request ignored: {}", self.name),
        }
    }

    /// 通过所属 Broker 下单
    pub fn place_order(&self, order: V::Order) {
        match self.broker.upgrade() {
            Some(broker) => broker.place_order(Some(order)),
            None => log::warn!("Broker dropped, order ignored: {}", self.name),
        }
    }

    /// 登出
    pub fn logout(&self) {
        match self.broker.upgrade() {
            Some(broker) => broker.logout(self),
            None => log::warn!("Broker dropped, logout ignored: {}", self.name),
        }
    }
}

// 注册表保证用户名唯一，按用户名判等即按注册项判等
impl<V: Venue> PartialEq for Account<V> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<V: Venue> Eq for Account<V> {}

impl<V: Venue> Hash for Account<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl<V: Venue> fmt::Debug for Account<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("name", &self.name)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
