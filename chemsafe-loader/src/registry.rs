//! Reference registry: code → shared Statement / Symbol
//!
//! One registry lives for one resolution pass and owns that pass's pending
//! batch. Every code seen during the pass is routed through it, so a code
//! that is not yet committed still resolves to the same entity the second
//! time it appears instead of being queued for creation twice.

use crate::db::{Entity, PendingBatch, SubstanceStore};
use crate::error::LoaderResult;
use chemsafe_common::{text, Statement, Symbol};
use std::collections::HashMap;
use tracing::debug;

pub struct ReferenceRegistry<'a> {
    store: &'a dyn SubstanceStore,
    statements: HashMap<String, Statement>,
    symbols: HashMap<String, Symbol>,
    pending: PendingBatch,
}

impl<'a> ReferenceRegistry<'a> {
    pub fn new(store: &'a dyn SubstanceStore) -> Self {
        Self {
            store,
            statements: HashMap::new(),
            symbols: HashMap::new(),
            pending: PendingBatch::new(),
        }
    }

    /// Queue another entity with this pass's references
    pub fn queue(&mut self, entity: Entity) {
        self.pending.save(entity);
    }

    pub fn pending(&self) -> &PendingBatch {
        &self.pending
    }

    /// Hand the pass's batch over for commit
    pub fn into_pending(self) -> PendingBatch {
        self.pending
    }

    /// Existing statement for the code, or a new one queued for persistence
    ///
    /// An empty code (after trimming) yields `None`.
    pub async fn resolve_statement(&mut self, code: &str) -> LoaderResult<Option<Statement>> {
        let code = text::trim(code);
        if code.is_empty() {
            return Ok(None);
        }
        if let Some(known) = self.statements.get(code) {
            return Ok(Some(known.clone()));
        }

        let statement = match self.store.find_statement_by_name(code).await? {
            Some(existing) => existing,
            None => {
                let created = Statement::new(code);
                debug!(code = %code, statement_type = ?created.statement_type, "Creating statement");
                self.pending.save(Entity::Statement(created.clone()));
                created
            }
        };

        self.statements.insert(code.to_string(), statement.clone());
        Ok(Some(statement))
    }

    /// Existing symbol for the name, or a new one queued for persistence
    pub async fn resolve_symbol(&mut self, name: &str) -> LoaderResult<Option<Symbol>> {
        let name = text::trim(name);
        if name.is_empty() {
            return Ok(None);
        }
        if let Some(known) = self.symbols.get(name) {
            return Ok(Some(known.clone()));
        }

        let symbol = match self.store.find_symbol_by_name(name).await? {
            Some(existing) => existing,
            None => {
                debug!(symbol = %name, "Creating symbol");
                let created = Symbol::new(name);
                self.pending.save(Entity::Symbol(created.clone()));
                created
            }
        };

        self.symbols.insert(name.to_string(), symbol.clone());
        Ok(Some(symbol))
    }

    /// Resolve every code, dropping empty ones
    pub async fn resolve_statements<I, S>(&mut self, codes: I) -> LoaderResult<Vec<Statement>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut resolved = Vec::new();
        for code in codes {
            if let Some(statement) = self.resolve_statement(code.as_ref()).await? {
                resolved.push(statement);
            }
        }
        Ok(resolved)
    }

    /// Resolve every symbol name, dropping empty ones
    pub async fn resolve_symbols<I, S>(&mut self, names: I) -> LoaderResult<Vec<Symbol>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut resolved = Vec::new();
        for name in names {
            if let Some(symbol) = self.resolve_symbol(name.as_ref()).await? {
                resolved.push(symbol);
            }
        }
        Ok(resolved)
    }
}
