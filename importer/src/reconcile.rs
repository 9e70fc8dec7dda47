use std::collections::BTreeMap;
use vocab_data::CategoryId;

use crate::{
    resolver::CategoryMap,
    store::{Store, StoreError},
    writer::Upload,
    Item, ItemError, ItemErrorKind,
};

/// How word counts are brought up to date after an upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Overwrite each count with the number of stored words in the category.
    #[default]
    Recompute,
    /// Add the words uploaded in this run. Words already counted are not added again.
    Incremental,
}

#[derive(Debug, Default)]
pub struct Reconciliation {
    pub word_counts: BTreeMap<String, u64>,
    pub errors: Vec<ItemError>,
}

impl Reconciliation {
    fn record(&mut self, name: &str, result: Result<u64, StoreError>) {
        match result {
            Ok(count) => {
                tracing::info!("{name}: {count} words");
                self.word_counts.insert(name.to_owned(), count);
            }
            Err(e) => {
                tracing::warn!("could not update word count of {name:?}: {e}");
                self.errors.push(ItemError {
                    item: Item::Category(name.to_owned()),
                    kind: ItemErrorKind::Reconcile(e),
                });
            }
        }
    }
}

fn recompute<S: Store + ?Sized>(
    store: &mut S,
    id: CategoryId,
    name: &str,
) -> Result<u64, StoreError> {
    let count = store.count_words(name)?;
    store.set_word_count(id, count)?;
    Ok(count)
}

/// Update the word count of each touched category. Categories missing from `categories` (their
/// creation failed) are skipped.
pub fn reconcile<'a, S, I>(
    store: &mut S,
    categories: &CategoryMap,
    touched: I,
    upload: &Upload,
    strategy: Strategy,
) -> Reconciliation
where
    S: Store + ?Sized,
    I: IntoIterator<Item = &'a str>,
{
    let mut out = Reconciliation::default();
    for name in touched {
        let Some(&id) = categories.get(name) else {
            continue;
        };
        let result = match strategy {
            Strategy::Recompute => recompute(store, id, name),
            Strategy::Incremental => {
                let ids = upload
                    .uploaded_ids
                    .get(name)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                store.add_word_count(id, ids)
            }
        };
        out.record(name, result);
    }
    out
}

/// Recompute the word count of every stored category.
pub fn recount_all<S: Store + ?Sized>(store: &mut S) -> Result<Reconciliation, StoreError> {
    let mut out = Reconciliation::default();
    for category in store.categories()? {
        let result = recompute(store, category.id, &category.name);
        out.record(&category.name, result);
    }
    Ok(out)
}
