//! Canonical store capability and its SQLite implementation
//!
//! Lookups read committed state. Writes go through a `PendingBatch` owned by
//! one unit of work (a resolution pass, an import run); `commit` writes the
//! whole batch in one transaction. Statements and symbols are written as
//! insert-or-fetch keyed on their unique name, and substances are re-checked
//! by composite key (by exact name when the key is empty) inside the
//! transaction, so a row written meanwhile by a concurrent pass is reused
//! instead of duplicated.

use super::{statements, substances, symbols};
use async_trait::async_trait;
use chemsafe_common::{CompositeKey, Error, Result, Statement, Substance, Symbol};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Entity queued for commit
#[derive(Debug, Clone)]
pub enum Entity {
    Statement(Statement),
    Symbol(Symbol),
    Substance(Substance),
}

/// Entities queued by one unit of work
///
/// Dropping a batch discards it.
#[derive(Debug, Default)]
pub struct PendingBatch {
    entities: Vec<Entity>,
}

impl PendingBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an entity for the commit of this batch
    pub fn save(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Substances queued so far
    pub fn substance_count(&self) -> usize {
        self.entities
            .iter()
            .filter(|e| matches!(e, Entity::Substance(_)))
            .count()
    }
}

/// Canonical store used by the resolver, registry and importer
#[async_trait]
pub trait SubstanceStore: Send + Sync {
    /// Match by CAS number, formula, pubchem id or name substring; lowest id wins
    async fn find_by_any(&self, term: &str) -> Result<Option<Substance>>;

    async fn find_by_composite(&self, key: &CompositeKey) -> Result<Option<Substance>>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Substance>>;

    async fn find_statement_by_name(&self, name: &str) -> Result<Option<Statement>>;

    async fn find_symbol_by_name(&self, name: &str) -> Result<Option<Symbol>>;

    /// Persist a batch; returns its stored substances in queue order
    async fn commit(&self, batch: PendingBatch) -> Result<Vec<Substance>>;
}

/// SQLite-backed store
pub struct SqliteStore {
    pool: SqlitePool,
    /// Held for the whole commit transaction
    write: Mutex<()>,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write: Mutex::new(()),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl SubstanceStore for SqliteStore {
    async fn find_by_any(&self, term: &str) -> Result<Option<Substance>> {
        substances::find_by_any(&self.pool, term).await
    }

    async fn find_by_composite(&self, key: &CompositeKey) -> Result<Option<Substance>> {
        substances::find_by_composite(&self.pool, key).await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Substance>> {
        substances::find_by_name(&self.pool, name).await
    }

    async fn find_statement_by_name(&self, name: &str) -> Result<Option<Statement>> {
        statements::load_statement_by_name(&self.pool, name).await
    }

    async fn find_symbol_by_name(&self, name: &str) -> Result<Option<Symbol>> {
        symbols::load_symbol_by_name(&self.pool, name).await
    }

    async fn commit(&self, batch: PendingBatch) -> Result<Vec<Substance>> {
        let pending = batch.entities;
        if pending.is_empty() {
            return Ok(Vec::new());
        }

        let _write = self.write.lock().await;
        let mut tx = self.pool.begin().await?;

        // Reference entities first: substance links are resolved by name
        for entity in &pending {
            match entity {
                Entity::Statement(statement) => {
                    statements::upsert_statement(&mut tx, statement).await?;
                }
                Entity::Symbol(symbol) => {
                    symbols::upsert_symbol(&mut tx, symbol).await?;
                }
                Entity::Substance(substance) => {
                    for statement in &substance.statements {
                        statements::upsert_statement(&mut tx, statement).await?;
                    }
                    for symbol in &substance.symbols {
                        symbols::upsert_symbol(&mut tx, symbol).await?;
                    }
                }
            }
        }

        let mut ids = Vec::new();
        for entity in &pending {
            if let Entity::Substance(substance) = entity {
                let key = substance.composite_key();
                let existing = if key.is_empty() {
                    substances::name_id(&mut tx, &substance.name).await?
                } else {
                    substances::composite_id(&mut tx, &key).await?
                };
                let id = match existing {
                    Some(existing) => {
                        debug!(id = existing, name = %substance.name, "Substance already stored, reusing");
                        existing
                    }
                    None => substances::insert_substance(&mut tx, substance).await?,
                };
                ids.push(id);
            }
        }

        tx.commit().await?;
        info!(entities = pending.len(), substances = ids.len(), "Committed pending entities");

        let mut stored = Vec::with_capacity(ids.len());
        for id in ids {
            let substance = substances::load_substance(&self.pool, id)
                .await?
                .ok_or_else(|| Error::Internal(format!("Substance {} vanished after commit", id)))?;
            stored.push(substance);
        }
        Ok(stored)
    }
}
