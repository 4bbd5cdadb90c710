//! Configuration loading and layering.

mod app_config;

pub use app_config::{AppConfig, LogLevel, project_dirs};
