//! Galleria - a terminal gallery client.
//!
//! This crate browses a remote photo collection and loads images
//! progressively: viewport-aware deferred loading, a per-asset load state
//! machine with bounded retry, and a persistent preload cache that warms
//! upcoming content ahead of the real fetch.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing the load, preload, and collection services.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;
/// Presentation layer containing the terminal UI and widgets.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "galleria";
