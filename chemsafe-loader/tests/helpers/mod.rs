//! Test Helper Utilities
//!
//! Shared utilities for testing chemsafe-loader

#![allow(dead_code)]

pub mod db_utils;
pub mod fixtures;
pub mod log_capture;
pub mod scripted_fetcher;

pub use db_utils::{count_rows, create_test_db, create_test_store, seed_substance};
pub use log_capture::LogCapture;
pub use scripted_fetcher::ScriptedFetcher;
