//! Shared data models spanning the relay layers.

pub mod bar;
pub mod order;
pub mod signal;

pub use bar::{Bar, BarsRequest, CandleWindow, Candles, Timeframe};
pub use order::{OrderRequest, OrderResult, OrderType, TimeInForce};
pub use signal::{validate_signal, FieldError, OrderSide, TradeSignal};
