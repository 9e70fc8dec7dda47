use serde_json::Value;
use std::collections::BTreeMap;
use vocab_data::{WordId, WordRecord};

use crate::{
    resolver::CategoryMap,
    store::{Store, MAX_BATCH_WRITES},
    Item, ItemError, ItemErrorKind,
};

/// Running totals of a batch upload.
#[derive(Debug, Default)]
pub struct Upload {
    pub uploaded: usize,
    pub failed: usize,
    /// Group commits attempted.
    pub chunks: usize,
    pub failed_chunks: Vec<usize>,
    /// Ids of the words written, by category.
    pub uploaded_ids: BTreeMap<String, Vec<WordId>>,
    pub errors: Vec<ItemError>,
}

/// Build the word for one entry, checking its category resolved.
fn stage(value: &Value, categories: &CategoryMap) -> Result<WordRecord, ItemErrorKind> {
    let word = WordRecord::from_json(value)?;
    if !categories.contains_key(&word.category) {
        return Err(ItemErrorKind::UnresolvedCategory(word.category));
    }
    Ok(word)
}

/// Write the entries in chunks of at most [`MAX_BATCH_WRITES`], one group commit per chunk.
///
/// Entries that cannot be staged are left out of their chunk. A chunk whose commit fails counts
/// every staged entry as failed; the writer carries on with the next chunk.
pub fn write_words<S: Store + ?Sized>(
    store: &mut S,
    categories: &CategoryMap,
    records: &[Value],
) -> Upload {
    let mut upload = Upload::default();
    let total_chunks = records.len().div_ceil(MAX_BATCH_WRITES);

    for (chunk_index, chunk) in records.chunks(MAX_BATCH_WRITES).enumerate() {
        let base = chunk_index * MAX_BATCH_WRITES;
        let mut staged = Vec::with_capacity(chunk.len());
        for (offset, value) in chunk.iter().enumerate() {
            match stage(value, categories) {
                Ok(word) => {
                    tracing::debug!("staged record #{}: {word}", base + offset);
                    staged.push(word);
                }
                Err(kind) => {
                    tracing::warn!("skipping record #{}: {kind}", base + offset);
                    upload.failed += 1;
                    upload.errors.push(ItemError {
                        item: Item::Record(base + offset),
                        kind,
                    });
                }
            }
        }
        if staged.is_empty() {
            tracing::warn!("chunk {}/{total_chunks} has nothing to write", chunk_index + 1);
            continue;
        }

        let n = staged.len();
        upload.chunks += 1;
        match store.commit_words(&staged) {
            Ok(ids) => {
                upload.uploaded += n;
                for (word, id) in staged.into_iter().zip(ids) {
                    upload.uploaded_ids.entry(word.category).or_default().push(id);
                }
                tracing::info!(
                    "chunk {}/{total_chunks} committed ({n} words, {} so far)",
                    chunk_index + 1,
                    upload.uploaded
                );
            }
            Err(source) => {
                tracing::error!("chunk {}/{total_chunks} failed: {source}", chunk_index + 1);
                upload.failed += n;
                upload.failed_chunks.push(chunk_index);
                upload.errors.push(ItemError {
                    item: Item::Chunk(chunk_index),
                    kind: ItemErrorKind::Commit { records: n, source },
                });
            }
        }
    }

    upload
}
