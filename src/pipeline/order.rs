use crate::models::order::{OrderRequest, OrderType, TimeInForce};
use crate::models::signal::TradeSignal;

/// Limit, good-till-canceled order for a signal. Quantities and prices are
/// copied as-is.
pub fn build_order(signal: &TradeSignal) -> OrderRequest {
    OrderRequest {
        symbol: signal.symbol.clone(),
        qty: signal.qty,
        side: signal.side,
        order_type: OrderType::Limit,
        time_in_force: TimeInForce::Gtc,
        limit_price: signal.limit_price,
    }
}

impl From<&TradeSignal> for OrderRequest {
    fn from(signal: &TradeSignal) -> Self {
        build_order(signal)
    }
}
