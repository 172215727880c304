//! Alpaca REST wire types

use serde::Deserialize;

use crate::models::bar::Bar;

#[derive(Debug, Deserialize)]
pub struct BarsPage {
    /// Alpaca sends `null` rather than `[]` when the window has no bars
    #[serde(default)]
    pub bars: Option<Vec<Bar>>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}
