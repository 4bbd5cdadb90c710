//! Presentation layer.

/// Terminal user interface.
pub mod ui;
/// Reusable terminal widgets.
pub mod widgets;

pub use ui::{AppServices, GalleryApp};
