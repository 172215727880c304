use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trade instruction sent by a TradingView alert.
///
/// Field order matches the webhook body and is also the shape forwarded to the
/// advisory service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub symbol: String,
    pub qty: f64,
    pub side: OrderSide,
    pub limit_price: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Validate a raw webhook body into a [`TradeSignal`].
///
/// Every field is checked so the caller gets the full list of problems at once.
pub fn validate_signal(payload: &Value) -> Result<TradeSignal, Vec<FieldError>> {
    let Some(object) = payload.as_object() else {
        return Err(vec![FieldError::new("body", "expected a JSON object")]);
    };

    let mut errors = Vec::new();

    let symbol = match object.get("symbol") {
        None | Some(Value::Null) => {
            errors.push(FieldError::new("symbol", "is required"));
            None
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            errors.push(FieldError::new("symbol", "must not be empty"));
            None
        }
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(_) => {
            errors.push(FieldError::new("symbol", "must be a string"));
            None
        }
    };

    let qty = positive_number(object.get("qty"), "qty", &mut errors);

    let side = match object.get("side") {
        None | Some(Value::Null) => {
            errors.push(FieldError::new("side", "is required"));
            None
        }
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Some(OrderSide::Buy),
            "sell" => Some(OrderSide::Sell),
            _ => {
                errors.push(FieldError::new("side", "must be \"buy\" or \"sell\""));
                None
            }
        },
        Some(_) => {
            errors.push(FieldError::new("side", "must be a string"));
            None
        }
    };

    let limit_price = positive_number(object.get("limit_price"), "limit_price", &mut errors);

    match (symbol, qty, side, limit_price) {
        (Some(symbol), Some(qty), Some(side), Some(limit_price)) if errors.is_empty() => {
            Ok(TradeSignal {
                symbol,
                qty,
                side,
                limit_price,
            })
        }
        _ => Err(errors),
    }
}

// TradingView renders placeholders like {{close}} as text when they are quoted
// in the alert template, so numeric strings are accepted too.
fn positive_number(
    value: Option<&Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<f64> {
    let number = match value {
        None | Some(Value::Null) => {
            errors.push(FieldError::new(field, "is required"));
            return None;
        }
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match number {
        Some(n) if n.is_finite() && n > 0.0 => Some(n),
        Some(_) => {
            errors.push(FieldError::new(field, "must be greater than zero"));
            None
        }
        None => {
            errors.push(FieldError::new(field, "must be a number"));
            None
        }
    }
}
