//! QABroker 演示程序
//!
//! 流程：
//! 1. 加载配置（缺省时使用默认配置）
//! 2. 构建模拟交易场所与通道会话
//! 3. 按脚本执行 开户 → 登录 → 报价 → 下单 → 登出
//!
//! 运行: cargo run --bin qabroker-demo [config/broker.toml]

use anyhow::Context;
use qabroker::utils::config::DEFAULT_CONFIG_PATH;
use qabroker::{
    Broker, BrokerConfig, ChannelSessionFactory, OrderSide, SimulatedVenue, TradeOrder,
};
use std::sync::Arc;

fn load_config() -> anyhow::Result<BrokerConfig> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    if !std::path::Path::new(&path).exists() {
        return Ok(BrokerConfig::default());
    }

    BrokerConfig::load_from_file(&path).with_context(|| format!("loading config from {}", path))
}

fn drain_session(factory: &ChannelSessionFactory, name: &str) {
    for event in factory.drain(name) {
        log::info!("[{}] {:?}", name, event);
    }
}

fn main() -> anyhow::Result<()> {
    let config = load_config()?;

    // 初始化日志
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.server.log_level.as_str()),
    )
    .init();

    log::info!("Starting {} broker", config.server.name);

    let venue = Arc::new(SimulatedVenue::from_config(&config.venue));
    if config.venue.quotes.is_empty() {
        venue.set_quote("GGGL", "Giggle.com Price: 10.00 Open: 9.50 Vol: 1200");
        venue.set_quote("NSTL", "Nasty Loops Inc. Price: 0.75 Open: 0.80 Vol: 300");
    }

    let factory = Arc::new(ChannelSessionFactory::new());
    let broker = Broker::with_config(venue.clone(), factory.clone(), &config);

    for (name, secret) in [("alice", "pw1"), ("bob", "pw2"), ("carol", "x")] {
        let outcome = broker.register(name, secret)?;
        log::info!("register({}) -> {}", name, outcome);
    }

    let outcome = broker.login("alice", "pw1")?;
    log::info!("login(alice) -> {}", outcome);
    let outcome = broker.login("alice", "pw1")?;
    log::info!("login(alice) -> {}", outcome);
    drain_session(&factory, "alice");

    if let Some(alice) = broker.account("alice") {
        alice.get_quote("GGGL");
        alice.get_quote("ABCD");
        alice.place_order(TradeOrder::limit("alice", "GGGL", OrderSide::Buy, 100, 10.0));
        drain_session(&factory, "alice");

        alice.logout();
    }

    log::info!("{}", broker);
    log::info!("snapshot: {}", broker.snapshot_json()?);
    log::info!("venue received {} order(s)", venue.order_count());

    Ok(())
}
