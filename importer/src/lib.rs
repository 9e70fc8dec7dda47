//! Bulk import of vocabulary entries into a category-aware word store.
//!
//! An import runs three steps in order: [`resolver::resolve`] creates the categories the entries
//! name, [`writer::write_words`] uploads the words in bounded group commits, and
//! [`reconcile::reconcile`] brings each touched category's word count up to date.

use serde_json::Value;
use std::{collections::BTreeMap, fmt::Display};
use thiserror::Error;

pub mod input;
pub mod reconcile;
pub mod resolver;
pub mod store;
pub mod writer;

pub use input::{load_words, InputError, DEFAULT_INPUT};
pub use reconcile::{recount_all, Strategy};
pub use resolver::CreatedCategory;
pub use store::{SqliteStore, Store, StoreError, MAX_BATCH_WRITES};
pub use vocab_data::RecordError;

/// What a non-fatal error is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Category(String),
    /// 0-based position in the input.
    Record(usize),
    /// 0-based chunk of the upload.
    Chunk(usize),
}

impl Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Item::Category(name) => write!(f, "category {name:?}"),
            Item::Record(i) => write!(f, "record #{i}"),
            Item::Chunk(i) => write!(f, "chunk #{i}"),
        }
    }
}

#[derive(Error, Debug)]
#[error("error in importing {item}: {kind}")]
pub struct ItemError {
    pub item: Item,
    #[source]
    pub kind: ItemErrorKind,
}

#[derive(Error, Debug)]
pub enum ItemErrorKind {
    #[error("could not create category: {0}")]
    CreateCategory(StoreError),
    #[error("invalid entry: {0}")]
    InvalidRecord(#[from] RecordError),
    #[error("category {0:?} does not exist")]
    UnresolvedCategory(String),
    #[error("group commit of {records} words failed: {source}")]
    Commit {
        records: usize,
        #[source]
        source: StoreError,
    },
    #[error("could not update word count: {0}")]
    Reconcile(StoreError),
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("could not list existing categories: {0}")]
    ListCategories(#[source] StoreError),
}

/// Outcome of an import. `uploaded + failed == total`.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub total: usize,
    pub created: Vec<CreatedCategory>,
    pub uploaded: usize,
    pub failed: usize,
    pub chunks: usize,
    pub failed_chunks: Vec<usize>,
    pub word_counts: BTreeMap<String, u64>,
    pub errors: Vec<ItemError>,
}

/// Import the entries into the store.
///
/// Only a failure to read the existing categories aborts the import, before anything is
/// written. Everything else is collected into the report.
pub fn import<S: Store + ?Sized>(
    store: &mut S,
    records: &[Value],
    strategy: Strategy,
) -> Result<ImportReport, ImportError> {
    tracing::info!("importing {} words", records.len());

    let resolution = resolver::resolve(store, records).map_err(ImportError::ListCategories)?;
    let upload = writer::write_words(store, &resolution.categories, records);
    tracing::info!(
        "upload finished: {} uploaded, {} failed",
        upload.uploaded,
        upload.failed
    );
    let reconciliation = reconcile::reconcile(
        store,
        &resolution.categories,
        resolver::required_categories(records),
        &upload,
        strategy,
    );

    let mut errors = resolution.errors;
    errors.extend(upload.errors);
    errors.extend(reconciliation.errors);
    Ok(ImportReport {
        total: records.len(),
        created: resolution.created,
        uploaded: upload.uploaded,
        failed: upload.failed,
        chunks: upload.chunks,
        failed_chunks: upload.failed_chunks,
        word_counts: reconciliation.word_counts,
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::FlakyStore;
    use serde_json::json;
    use vocab_data::PALETTE;

    fn entries(n: usize, category: &str) -> Vec<Value> {
        (0..n)
            .map(|i| json!({"english": format!("w{i}"), "turkish": format!("k{i}"), "category": category}))
            .collect()
    }

    #[test]
    fn imports_into_empty_store() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let records = vec![
            json!({"english": "cat", "turkish": "kedi", "category": "Animals"}),
            json!({"english": "dog", "turkish": "köpek", "category": "Animals"}),
        ];

        let report = import(&mut store, &records, Strategy::default()).unwrap();
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.created[0].name, "Animals");
        assert_eq!(report.created[0].color, PALETTE[0]);
        assert_eq!(report.uploaded, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(report.word_counts["Animals"], 2);
        assert!(report.errors.is_empty());

        let stored = store.categories().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].word_count, 2);
    }

    #[test]
    fn failed_last_chunk() {
        let mut store = FlakyStore::new();
        store.inner.add_category("Animals", "#FF5722").unwrap();
        store.failing_commits.insert(1);
        let records = entries(501, "Animals");

        let report = import(&mut store, &records, Strategy::Recompute).unwrap();
        assert_eq!(store.commits.len(), 2);
        assert_eq!(report.chunks, 2);
        assert_eq!(report.uploaded, 500);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failed_chunks, vec![1]);
        assert!(report.created.is_empty());
        assert_eq!(report.word_counts["Animals"], 500);
    }

    #[test]
    fn incremental_counts_only_committed_words() {
        let mut store = FlakyStore::new();
        let id = store.inner.add_category("Animals", "#FF5722").unwrap();
        store.inner.set_word_count(id, 3).unwrap();
        store.failing_commits.insert(0);
        let records = entries(501, "Animals");

        let report = import(&mut store, &records, Strategy::Incremental).unwrap();
        assert_eq!(report.uploaded, 1);
        assert_eq!(report.failed, 500);
        assert_eq!(report.word_counts["Animals"], 4);
    }

    #[test]
    fn unresolved_category_fails_its_records() {
        let mut store = FlakyStore::new();
        store.failing_categories.insert("Broken".to_owned());
        let mut records = entries(3, "Broken");
        records.extend(entries(2, "Fine"));
        records.push(json!({"english": "no", "category": "Fine"}));

        let report = import(&mut store, &records, Strategy::Recompute).unwrap();
        assert_eq!(report.uploaded, 2);
        assert_eq!(report.failed, 4);
        assert_eq!(report.uploaded + report.failed, report.total);
        assert!(report
            .errors
            .iter()
            .any(|e| e.item == Item::Category("Broken".to_owned())));
        let unresolved = report
            .errors
            .iter()
            .filter(|e| matches!(e.kind, ItemErrorKind::UnresolvedCategory(_)))
            .count();
        assert_eq!(unresolved, 3);
        assert!(!report.word_counts.contains_key("Broken"));
        assert_eq!(report.word_counts["Fine"], 2);
    }

    #[test]
    fn listing_failure_writes_nothing() {
        let mut store = FlakyStore::new();
        store.fail_listing = true;
        let records = entries(3, "Animals");
        assert!(matches!(
            import(&mut store, &records, Strategy::Recompute),
            Err(ImportError::ListCategories(_))
        ));
        assert!(store.commits.is_empty());
    }

    #[test]
    fn rerun_keeps_counts_consistent() {
        let records = entries(4, "Animals");
        for strategy in [Strategy::Recompute, Strategy::Incremental] {
            let mut store = SqliteStore::open_in_memory().unwrap();
            let first = import(&mut store, &records, strategy).unwrap();
            assert_eq!(first.word_counts["Animals"], 4);
            // Words are appended again; the count follows the stored words.
            let second = import(&mut store, &records, strategy).unwrap();
            assert!(second.created.is_empty());
            assert_eq!(second.word_counts["Animals"], 8);
            assert_eq!(store.count_words("Animals").unwrap(), 8);
        }
    }

    #[test]
    fn item_error_display() {
        let err = ItemError {
            item: Item::Record(4),
            kind: RecordError::MissingField("turkish").into(),
        };
        assert_eq!(
            err.to_string(),
            "error in importing record #4: invalid entry: missing field `turkish`"
        );
    }
}
