//! # chemsafe common library
//!
//! Shared code for the chemsafe crates:
//! - Error type
//! - Configuration loading (root folder, TOML file)
//! - Text normalization for scraped content
//! - Substance / statement / symbol models
//! - SQLite schema initialization

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod text;

pub use error::{Error, Result};
pub use models::{CompositeKey, Statement, StatementType, Substance, Symbol};
