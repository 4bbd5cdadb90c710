//! Reusable terminal widgets.

mod asset_card;
mod status_bar;

pub use asset_card::{AssetCard, CARD_HEIGHT, truncate_to_width};
pub use status_bar::{StatusBar, StatusLevel};
