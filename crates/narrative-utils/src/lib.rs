//! Shared utilities for narrative-rs
//!
//! This crate provides common functionality used across the narrative-rs
//! workspace: tracing setup and application-level configuration.

pub mod config;
pub mod logging;

pub use config::{Config, ConfigError, LogFormat};
pub use logging::{init_tracing, init_tracing_json, init_tracing_with};
