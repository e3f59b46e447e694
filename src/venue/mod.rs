//! 交易场所协作者
//!
//! 场所负责报价与订单执行，其定价与撮合算法不在本 crate 范围内。
//! Broker 只转发，不检查订单内容。

pub mod simulated;

pub use simulated::{OrderSide, SimulatedVenue, TradeOrder};

/// 交易场所
pub trait Venue: Send + Sync {
    /// 订单载荷，对 Broker 不透明
    type Order: Send;

    /// 场所名称（诊断用）
    fn name(&self) -> &str;

    /// 查询报价，错误或占位文本同样以字符串返回
    fn get_quote(&self, symbol: &str) -> String;

    /// 下单，确认/拒绝由场所自己的通知路径回送
    fn place_order(&self, order: Self::Order);
}
