//! Bulk statement import
//!
//! Reads JSON objects mapping statement codes to their canonical
//! descriptions. Unknown codes are created (type from the leading
//! character), stored codes whose description differs are updated, and the
//! whole import is committed once at the end.

use crate::db::{Entity, PendingBatch, SubstanceStore};
use crate::error::LoaderResult;
use chemsafe_common::{text, Statement};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info};

/// Counts from one import run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
}

pub struct StatementImporter<'a> {
    store: &'a dyn SubstanceStore,
    /// Statements already handled in this run, keyed by code
    staged: HashMap<String, Statement>,
    pending: PendingBatch,
    summary: ImportSummary,
}

impl<'a> StatementImporter<'a> {
    pub fn new(store: &'a dyn SubstanceStore) -> Self {
        Self {
            store,
            staged: HashMap::new(),
            pending: PendingBatch::new(),
            summary: ImportSummary::default(),
        }
    }

    /// Stage every entry of one JSON file
    pub async fn import_file(&mut self, path: &Path) -> LoaderResult<()> {
        let content = tokio::fs::read_to_string(path).await?;
        let entries: BTreeMap<String, String> = serde_json::from_str(&content)?;
        info!(file = %path.display(), entries = entries.len(), "Importing statements");
        self.import_entries(entries).await
    }

    /// Stage code → description entries
    pub async fn import_entries<I>(&mut self, entries: I) -> LoaderResult<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (code, description) in entries {
            self.stage(&code, &description).await?;
        }
        Ok(())
    }

    async fn stage(&mut self, code: &str, description: &str) -> LoaderResult<()> {
        let code = text::trim(code);
        if code.is_empty() {
            return Ok(());
        }
        let incoming = Statement::new(code).with_description(description);

        let current = match self.staged.get(code) {
            Some(staged) => Some(staged.clone()),
            None => self.store.find_statement_by_name(code).await?,
        };

        match current {
            None => {
                debug!(code = %code, "Creating statement");
                self.summary.created += 1;
                self.commit_later(incoming);
            }
            Some(existing) if incoming.description.is_some() && existing.description != incoming.description => {
                debug!(code = %code, "Updating statement description");
                self.summary.updated += 1;
                let updated = Statement {
                    description: incoming.description,
                    ..existing
                };
                self.commit_later(updated);
            }
            Some(_) => self.summary.unchanged += 1,
        }
        Ok(())
    }

    fn commit_later(&mut self, statement: Statement) {
        self.staged.insert(statement.name.clone(), statement.clone());
        self.pending.save(Entity::Statement(statement));
    }

    /// Commit everything staged and return the counts
    pub async fn finish(self) -> LoaderResult<ImportSummary> {
        self.store.commit(self.pending).await?;
        info!(
            created = self.summary.created,
            updated = self.summary.updated,
            unchanged = self.summary.unchanged,
            "Statement import committed"
        );
        Ok(self.summary)
    }
}

/// Import the hazard file, then the precautionary file, in one commit
pub async fn import_statements(
    store: &dyn SubstanceStore,
    hazard: Option<&Path>,
    precautionary: Option<&Path>,
) -> LoaderResult<ImportSummary> {
    let mut importer = StatementImporter::new(store);
    for path in [hazard, precautionary].into_iter().flatten() {
        importer.import_file(path).await?;
    }
    importer.finish().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;
    use chemsafe_common::db::init_in_memory;

    fn entries(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(c, d)| (c.to_string(), d.to_string())).collect()
    }

    #[tokio::test]
    async fn test_same_code_twice_in_one_run() {
        let store = SqliteStore::new(init_in_memory().await.unwrap());
        let mut importer = StatementImporter::new(&store);
        importer
            .import_entries(entries(&[("H225", "Highly flammable"), ("H225", "Highly flammable")]))
            .await
            .unwrap();
        let summary = importer.finish().await.unwrap();

        assert_eq!(summary, ImportSummary { created: 1, updated: 0, unchanged: 1 });
    }

    #[tokio::test]
    async fn test_blank_codes_skipped() {
        let store = SqliteStore::new(init_in_memory().await.unwrap());
        let mut importer = StatementImporter::new(&store);
        importer.import_entries(entries(&[(" ", "nothing")])).await.unwrap();

        assert_eq!(importer.finish().await.unwrap(), ImportSummary::default());
    }
}
