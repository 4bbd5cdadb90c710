//! Terminal user interface.

mod app;

pub use app::{AppServices, GalleryApp};
