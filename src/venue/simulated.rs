//! 模拟交易场所
//!
//! 报价来自配置表，订单按到达顺序记录，不做撮合

use super::Venue;
use crate::utils::config::VenueConfig;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// 买卖方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// 交易订单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOrder {
    pub account: String,
    pub symbol: String,
    pub side: OrderSide,
    pub volume: u32,
    /// None 表示市价单
    pub price: Option<f64>,
}

impl TradeOrder {
    pub fn limit(
        account: impl Into<String>,
        symbol: impl Into<String>,
        side: OrderSide,
        volume: u32,
        price: f64,
    ) -> Self {
        Self {
            account: account.into(),
            symbol: symbol.into(),
            side,
            volume,
            price: Some(price),
        }
    }

    pub fn market(
        account: impl Into<String>,
        symbol: impl Into<String>,
        side: OrderSide,
        volume: u32,
    ) -> Self {
        Self {
            account: account.into(),
            symbol: symbol.into(),
            side,
            volume,
            price: None,
        }
    }

    pub fn is_market(&self) -> bool {
        self.price.is_none()
    }
}

/// 模拟交易场所
pub struct SimulatedVenue {
    name: String,

    /// 报价表 (symbol -> quote text)
    quotes: DashMap<String, String>,

    /// 已接收订单（到达顺序）
    orders: Mutex<Vec<TradeOrder>>,
}

impl SimulatedVenue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quotes: DashMap::new(),
            orders: Mutex::new(Vec::new()),
        }
    }

    /// 从配置构建
    pub fn from_config(config: &VenueConfig) -> Self {
        let venue = Self::new(config.name.clone());
        for entry in &config.quotes {
            venue.set_quote(entry.symbol.clone(), entry.quote.clone());
        }
        venue
    }

    /// 设置/覆盖报价
    pub fn set_quote(&self, symbol: impl Into<String>, quote: impl Into<String>) {
        self.quotes.insert(symbol.into(), quote.into());
    }

    /// 已接收订单快照
    pub fn orders(&self) -> Vec<TradeOrder> {
        self.orders.lock().clone()
    }

    pub fn order_count(&self) -> usize {
        self.orders.lock().len()
    }
}

impl Venue for SimulatedVenue {
    type Order = TradeOrder;

    fn name(&self) -> &str {
        &self.name
    }

    fn get_quote(&self, symbol: &str) -> String {
        self.quotes
            .get(symbol)
            .map(|q| q.value().clone())
            .unwrap_or_else(|| format!("{} not found", symbol))
    }

    fn place_order(&self, order: TradeOrder) {
        log::info!(
            "Order received: account={}, symbol={}, side={:?}, volume={}, price={:?}",
            order.account,
            order.symbol,
            order.side,
            order.volume,
            order.price
        );
        self.orders.lock().push(order);
    }
}
