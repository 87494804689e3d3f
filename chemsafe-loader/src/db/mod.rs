//! Canonical store access for chemsafe-loader

pub mod statements;
pub mod store;
pub mod substances;
pub mod symbols;

pub use store::{Entity, PendingBatch, SqliteStore, SubstanceStore};
