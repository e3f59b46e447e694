//! 券商核心 (Broker)
//!
//! 职责：
//! 1. 账户注册表：开户校验、按用户名查询
//! 2. 会话管理：登录/登出，维护已登录账户集合
//! 3. 路由：报价请求与订单转发到交易场所，报价回送到发起会话
//!
//! 注册表与登录集合由同一把 `RwLock` 保护，`register`/`login`/`logout`
//! 各自在一个临界区内完成；报价与下单不持有该锁。

use super::{Account, LoginOutcome, RegisterOutcome};
use crate::session::{Session, SessionFactory};
use crate::utils::config::{AccountRules, BrokerConfig};
use crate::venue::Venue;
use crate::Result;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Weak};

/// 注册表与登录集合
struct BrokerState<V: Venue> {
    /// 账户映射 (name -> Account)
    accounts: HashMap<String, Arc<Account<V>>>,

    /// 已登录账户 (name)
    logged_in: HashSet<String>,
}

/// 诊断快照
#[derive(Debug, Clone, Serialize)]
pub struct BrokerSnapshot {
    pub venue: String,
    pub account_count: usize,
    pub session_count: usize,
    /// 已登录用户名（排序）
    pub logged_in: Vec<String>,
    pub taken_at: DateTime<Utc>,
}

/// 券商
pub struct Broker<V: Venue> {
    state: RwLock<BrokerState<V>>,

    /// 交易场所（共享，不管理其生命周期）
    venue: Arc<V>,

    /// 会话工厂
    sessions: Arc<dyn SessionFactory>,

    rules: AccountRules,
    bcrypt_cost: u32,
    welcome_message: String,

    /// 自身弱引用，开户时交给账户
    self_ref: Weak<Broker<V>>,
}

impl<V: Venue> Broker<V> {
    /// 使用默认配置创建
    pub fn new(venue: Arc<V>, sessions: Arc<dyn SessionFactory>) -> Arc<Self> {
        Self::with_config(venue, sessions, &BrokerConfig::default())
    }

    pub fn with_config(
        venue: Arc<V>,
        sessions: Arc<dyn SessionFactory>,
        config: &BrokerConfig,
    ) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            state: RwLock::new(BrokerState {
                accounts: HashMap::new(),
                logged_in: HashSet::new(),
            }),
            venue,
            sessions,
            rules: config.accounts,
            bcrypt_cost: config.security.bcrypt_cost,
            welcome_message: config.session.welcome_message.clone(),
            self_ref: self_ref.clone(),
        })
    }

    pub fn venue(&self) -> &Arc<V> {
        &self.venue
    }

    // ==================== 账户注册表 ====================

    /// 开户
    ///
    /// 校验顺序：用户名长度 → 密码长度 → 用户名唯一性。
    /// 外层 `Err` 只表示密码哈希失败。
    pub fn register(&self, name: &str, secret: &str) -> Result<RegisterOutcome> {
        if !self.rules.name_len_ok(name) {
            return Ok(RegisterOutcome::InvalidName);
        }
        if !self.rules.secret_len_ok(secret) {
            return Ok(RegisterOutcome::InvalidSecret);
        }
        if self.state.read().accounts.contains_key(name) {
            return Ok(RegisterOutcome::NameTaken);
        }

        // 哈希较慢，不在写锁内计算
        let password_hash = bcrypt::hash(secret, self.bcrypt_cost)?;

        let mut state = self.state.write();
        // 读锁释放后可能被并发注册抢先
        if state.accounts.contains_key(name) {
            return Ok(RegisterOutcome::NameTaken);
        }

        let session = self.sessions.create_session(name);
        let account = Account::new(
            name.to_string(),
            password_hash,
            session,
            self.self_ref.clone(),
        );
        state.accounts.insert(name.to_string(), Arc::new(account));

        log::info!("Account registered: {}", name);

        Ok(RegisterOutcome::Created)
    }

    /// 按用户名查询账户
    pub fn account(&self, name: &str) -> Option<Arc<Account<V>>> {
        self.state.read().accounts.get(name).cloned()
    }

    pub fn contains_account(&self, name: &str) -> bool {
        self.state.read().accounts.contains_key(name)
    }

    pub fn account_count(&self) -> usize {
        self.state.read().accounts.len()
    }

    // ==================== 会话管理 ====================

    /// 登录
    ///
    /// 成功时依次：推送欢迎语 → 激活交互界面 → 加入登录集合。
    /// 会话回调在写锁内执行，回调中不得再调用本 Broker 的
    /// `register`/`login`/`logout`。
    pub fn login(&self, name: &str, secret: &str) -> Result<LoginOutcome> {
        let Some(account) = self.account(name) else {
            return Ok(LoginOutcome::UnknownUser);
        };

        // 账户创建后密码不可变，可在锁外校验
        if !account.verify_secret(secret)? {
            log::debug!("Login rejected, bad password: {}", name);
            return Ok(LoginOutcome::BadPassword);
        }

        let mut state = self.state.write();
        if state.logged_in.contains(name) {
            return Ok(LoginOutcome::AlreadyLoggedIn);
        }

        let session = account.session();
        session.receive_message(&self.welcome_message);
        session.activate_interface();
        state.logged_in.insert(name.to_string());

        log::info!("Account logged in: {}", name);

        Ok(LoginOutcome::Success)
    }

    /// 登出，未登录时为空操作
    pub fn logout(&self, account: &Account<V>) {
        if self.state.write().logged_in.remove(account.name()) {
            log::info!("Account logged out: {}", account.name());
        }
    }

    pub fn is_logged_in(&self, name: &str) -> bool {
        self.state.read().logged_in.contains(name)
    }

    pub fn session_count(&self) -> usize {
        self.state.read().logged_in.len()
    }

    // ==================== 路由 ====================

    /// 查询报价并原样回送到发起会话
    pub fn request_quote(&self, symbol: &str, session: &dyn Session) {
        let quote = self.venue.get_quote(symbol);
        log::debug!("Quote routed: {} -> {}", symbol, quote);
        session.receive_message(&quote);
    }

    /// 转发订单，`None` 时为空操作
    pub fn place_order(&self, order: Option<V::Order>) {
        let Some(order) = order else {
            return;
        };
        log::debug!("Order forwarded to venue: {}", self.venue.name());
        self.venue.place_order(order);
    }

    // ==================== 诊断 ====================

    pub fn snapshot(&self) -> BrokerSnapshot {
        let state = self.state.read();
        let mut logged_in: Vec<String> = state.logged_in.iter().cloned().collect();
        logged_in.sort();

        BrokerSnapshot {
            venue: self.venue.name().to_string(),
            account_count: state.accounts.len(),
            session_count: state.logged_in.len(),
            logged_in,
            taken_at: Utc::now(),
        }
    }

    pub fn snapshot_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }
}

impl<V: Venue> fmt::Display for Broker<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        write!(
            f,
            "Broker[accounts={}, sessions={}]",
            state.accounts.len(),
            state.logged_in.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ChannelSessionFactory, MockSession, MockSessionFactory, SessionEvent};
    use mockall::Sequence;
    use parking_lot::Mutex;

    /// 记录型交易场所：报价回显 symbol，订单按顺序记录
    #[derive(Default)]
    struct RecordingVenue {
        quotes: Mutex<Vec<String>>,
        orders: Mutex<Vec<String>>,
    }

    impl Venue for RecordingVenue {
        type Order = String;

        fn name(&self) -> &str {
            "recording"
        }

        fn get_quote(&self, symbol: &str) -> String {
            self.quotes.lock().push(symbol.to_string());
            format!("{} 12.50", symbol)
        }

        fn place_order(&self, order: String) {
            self.orders.lock().push(order);
        }
    }

    fn test_config() -> BrokerConfig {
        let mut config = BrokerConfig::default();
        config.security.bcrypt_cost = 4;
        config
    }

    fn new_broker() -> (Arc<Broker<RecordingVenue>>, Arc<ChannelSessionFactory>) {
        let factory = Arc::new(ChannelSessionFactory::new());
        let broker = Broker::with_config(
            Arc::new(RecordingVenue::default()),
            factory.clone(),
            &test_config(),
        );
        (broker, factory)
    }

    // ==================== 开户 ====================

    #[test]
    fn test_register_validation_order() {
        let (broker, _) = new_broker();

        // 用户名和密码同时非法时，报告用户名
        assert_eq!(broker.register("abc", "x").unwrap(), RegisterOutcome::InvalidName);
        assert_eq!(
            broker.register("abcdefghijk", "pw").unwrap(),
            RegisterOutcome::InvalidName
        );
        assert_eq!(broker.register("abcd", "x").unwrap(), RegisterOutcome::InvalidSecret);
        assert_eq!(
            broker.register("abcd", "12345678901").unwrap(),
            RegisterOutcome::InvalidSecret
        );
        assert_eq!(broker.account_count(), 0);

        assert_eq!(broker.register("abcd", "pw").unwrap(), RegisterOutcome::Created);
        // 已占用的用户名配非法密码，仍先报告密码
        assert_eq!(broker.register("abcd", "x").unwrap(), RegisterOutcome::InvalidSecret);
        assert_eq!(broker.register("abcd", "pw2").unwrap(), RegisterOutcome::NameTaken);
        assert_eq!(broker.account_count(), 1);
        assert!(broker.contains_account("abcd"));
        assert!(!broker.contains_account("abc"));
    }

    #[test]
    fn test_register_keeps_first_secret() {
        let (broker, _) = new_broker();

        assert_eq!(broker.register("alice", "first").unwrap(), RegisterOutcome::Created);
        assert_eq!(broker.register("alice", "second").unwrap(), RegisterOutcome::NameTaken);

        let account = broker.account("alice").unwrap();
        assert!(account.verify_secret("first").unwrap());
        assert!(!account.verify_secret("second").unwrap());
    }

    #[test]
    fn test_names_are_exact_match() {
        let (broker, _) = new_broker();

        assert_eq!(broker.register("alice", "pw").unwrap(), RegisterOutcome::Created);
        assert_eq!(broker.register("Alice", "pw").unwrap(), RegisterOutcome::Created);
        assert_eq!(broker.register(" alice", "pw").unwrap(), RegisterOutcome::Created);
        assert_eq!(broker.account_count(), 3);
    }

    #[test]
    fn test_register_creates_one_session_per_account() {
        let mut factory = MockSessionFactory::new();
        factory
            .expect_create_session()
            .withf(|name| name == "alice")
            .times(1)
            .returning(|_| Arc::new(MockSession::new()) as Arc<dyn Session>);

        let broker = Broker::with_config(
            Arc::new(RecordingVenue::default()),
            Arc::new(factory),
            &test_config(),
        );

        assert_eq!(broker.register("alice", "pw").unwrap(), RegisterOutcome::Created);
        assert_eq!(broker.register("alice", "pw").unwrap(), RegisterOutcome::NameTaken);
        assert_eq!(broker.register("al", "pw").unwrap(), RegisterOutcome::InvalidName);
    }

    // ==================== 登录/登出 ====================

    #[test]
    fn test_login_outcomes() {
        let (broker, _) = new_broker();
        broker.register("alice", "pw1").unwrap();

        assert_eq!(broker.login("nobody", "pw1").unwrap(), LoginOutcome::UnknownUser);
        assert_eq!(broker.login("alice", "wrong").unwrap(), LoginOutcome::BadPassword);
        assert!(!broker.is_logged_in("alice"));

        assert_eq!(broker.login("alice", "pw1").unwrap(), LoginOutcome::Success);
        // 已登录时密码错误仍报告密码错误
        assert_eq!(broker.login("alice", "wrong").unwrap(), LoginOutcome::BadPassword);
        assert_eq!(broker.login("alice", "pw1").unwrap(), LoginOutcome::AlreadyLoggedIn);
        assert_eq!(broker.session_count(), 1);
    }

    #[test]
    fn test_login_notifies_before_activating() {
        let mut seq = Sequence::new();
        let mut session = MockSession::new();
        session
            .expect_receive_message()
            .withf(|text| text == "Welcome to SafeTrade!")
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        session
            .expect_activate_interface()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        let session: Arc<dyn Session> = Arc::new(session);

        let mut factory = MockSessionFactory::new();
        factory
            .expect_create_session()
            .returning(move |_| session.clone());

        let broker = Broker::with_config(
            Arc::new(RecordingVenue::default()),
            Arc::new(factory),
            &test_config(),
        );
        broker.register("alice", "pw1").unwrap();

        assert_eq!(broker.login("alice", "pw1").unwrap(), LoginOutcome::Success);
        // 第二次登录不再触发会话回调（times(1) 校验）
        assert_eq!(broker.login("alice", "pw1").unwrap(), LoginOutcome::AlreadyLoggedIn);
    }

    #[test]
    fn test_failed_login_has_no_side_effects() {
        let (broker, factory) = new_broker();
        broker.register("alice", "pw1").unwrap();

        broker.login("alice", "nope").unwrap();

        assert!(factory.drain("alice").is_empty());
        assert_eq!(broker.session_count(), 0);
    }

    #[test]
    fn test_logout_is_idempotent() {
        let (broker, _) = new_broker();
        broker.register("alice", "pw1").unwrap();
        broker.register("bobby", "pw2").unwrap();
        let alice = broker.account("alice").unwrap();
        let bobby = broker.account("bobby").unwrap();

        // 从未登录
        broker.logout(&bobby);
        assert!(!broker.is_logged_in("bobby"));

        broker.login("alice", "pw1").unwrap();
        broker.logout(&alice);
        broker.logout(&alice);
        assert!(!broker.is_logged_in("alice"));
        assert_eq!(broker.session_count(), 0);

        assert_eq!(broker.login("alice", "pw1").unwrap(), LoginOutcome::Success);
    }

    #[test]
    fn test_custom_welcome_message() {
        let factory = Arc::new(ChannelSessionFactory::new());
        let mut config = test_config();
        config.session.welcome_message = "hello trader".to_string();
        let broker = Broker::with_config(
            Arc::new(RecordingVenue::default()),
            factory.clone(),
            &config,
        );

        broker.register("alice", "pw1").unwrap();
        broker.login("alice", "pw1").unwrap();

        assert_eq!(
            factory.drain("alice"),
            vec![
                SessionEvent::Message("hello trader".to_string()),
                SessionEvent::InterfaceActivated,
            ]
        );
    }

    // ==================== 路由 ====================

    #[test]
    fn test_quote_delivered_verbatim() {
        let (broker, _) = new_broker();

        let mut session = MockSession::new();
        session
            .expect_receive_message()
            .withf(|text| text == "GGGL 12.50")
            .times(1)
            .return_const(());

        broker.request_quote("GGGL", &session);
        assert_eq!(*broker.venue().quotes.lock(), vec!["GGGL".to_string()]);
    }

    #[test]
    fn test_place_order_forwards_unmodified() {
        let (broker, _) = new_broker();

        broker.place_order(None);
        assert!(broker.venue().orders.lock().is_empty());

        broker.place_order(Some("buy 100 GGGL".to_string()));
        assert_eq!(*broker.venue().orders.lock(), vec!["buy 100 GGGL".to_string()]);
    }

    #[test]
    fn test_account_requests_go_through_broker() {
        let (broker, factory) = new_broker();
        broker.register("alice", "pw1").unwrap();
        let alice = broker.account("alice").unwrap();

        alice.get_quote("NSTL");
        alice.place_order("sell 5 NSTL".to_string());

        assert_eq!(
            factory.drain("alice"),
            vec![SessionEvent::Message("NSTL 12.50".to_string())]
        );
        assert_eq!(*broker.venue().orders.lock(), vec!["sell 5 NSTL".to_string()]);

        broker.login("alice", "pw1").unwrap();
        alice.logout();
        assert!(!broker.is_logged_in("alice"));
    }

    #[test]
    fn test_account_outlives_broker() {
        let (broker, factory) = new_broker();
        broker.register("alice", "pw1").unwrap();
        let alice = broker.account("alice").unwrap();
        drop(broker);

        alice.get_quote("GGGL");
        alice.place_order("buy".to_string());
        alice.logout();

        assert!(factory.drain("alice").is_empty());
    }

    // ==================== 诊断 ====================

    #[test]
    fn test_display_and_snapshot() {
        let (broker, _) = new_broker();
        broker.register("bobby", "pw").unwrap();
        broker.register("alice", "pw").unwrap();
        broker.register("carol", "pw").unwrap();
        broker.login("bobby", "pw").unwrap();
        broker.login("alice", "pw").unwrap();

        assert_eq!(broker.to_string(), "Broker[accounts=3, sessions=2]");

        let snapshot = broker.snapshot();
        assert_eq!(snapshot.venue, "recording");
        assert_eq!(snapshot.account_count, 3);
        assert_eq!(snapshot.logged_in, vec!["alice".to_string(), "bobby".to_string()]);

        let json: serde_json::Value = serde_json::from_str(&broker.snapshot_json().unwrap()).unwrap();
        assert_eq!(json["session_count"], 2);
    }
}
