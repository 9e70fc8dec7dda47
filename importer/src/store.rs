//! Document storage for categories and words.
//!
//! Every component of the importer takes a [`Store`] handle rather than reaching for a global
//! connection. [`SqliteStore`] is the on-disk implementation; tests wrap it to inject faults.

use rusqlite::{named_params, Connection, OptionalExtension};
use std::path::Path;
use thiserror::Error;
use vocab_data::{CategoryId, CategoryRecord, StoredWord, WordId, WordRecord};

/// Most writes a single atomic group commit may carry.
pub const MAX_BATCH_WRITES: usize = 500;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("error in performing SQL query: {0}")]
    SqlError(#[from] rusqlite::Error),
    #[error("a category named {0:?} already exists")]
    DuplicateCategory(String),
    #[error("no category with id {0}")]
    MissingCategory(CategoryId),
    #[error("group commit of {0} writes exceeds the limit of {MAX_BATCH_WRITES}")]
    BatchTooLarge(usize),
}

/// Handle to the categories and words collections.
pub trait Store {
    /// All categories, ordered by name.
    fn categories(&mut self) -> Result<Vec<CategoryRecord>, StoreError>;

    /// Create a category with a zero word count. Names are unique.
    fn add_category(&mut self, name: &str, color: &str) -> Result<CategoryId, StoreError>;

    fn category(&mut self, id: CategoryId) -> Result<Option<CategoryRecord>, StoreError>;

    /// Overwrite the stored word count of a category.
    fn set_word_count(&mut self, id: CategoryId, count: u64) -> Result<(), StoreError>;

    /// Mark the given words as counted against the category and add the number of words that
    /// were not already counted. Returns the resulting word count.
    fn add_word_count(&mut self, id: CategoryId, words: &[WordId]) -> Result<u64, StoreError>;

    /// Write all of `words` or none of them.
    fn commit_words(&mut self, words: &[WordRecord]) -> Result<Vec<WordId>, StoreError>;

    /// Number of stored words whose category is exactly `category`.
    fn count_words(&mut self, category: &str) -> Result<u64, StoreError>;

    /// Stored words whose category is exactly `category`, newest first.
    fn words(&mut self, category: &str) -> Result<Vec<StoredWord>, StoreError>;
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL UNIQUE,
    color       TEXT NOT NULL,
    word_count  INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
);
CREATE TABLE IF NOT EXISTS words (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    english     TEXT NOT NULL,
    turkish     TEXT NOT NULL,
    category    TEXT NOT NULL,
    created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
    counted     INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS words_by_category ON words (category);
"#;

/// [`Store`] backed by a single SQLite database.
pub struct SqliteStore {
    conn: Connection,
}

fn destruct_category(row: &rusqlite::Row) -> rusqlite::Result<CategoryRecord> {
    Ok(CategoryRecord {
        id: CategoryId(row.get("id")?),
        name: row.get("name")?,
        color: row.get("color")?,
        word_count: row.get("word_count")?,
        created_at: row.get("created_at")?,
    })
}

fn destruct_word(row: &rusqlite::Row) -> rusqlite::Result<StoredWord> {
    Ok(StoredWord {
        id: WordId(row.get("id")?),
        word: WordRecord {
            english: row.get("english")?,
            turkish: row.get("turkish")?,
            category: row.get("category")?,
        },
        created_at: row.get("created_at")?,
    })
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        tracing::debug!("opening store at {}", path.display());
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(SqliteStore { conn })
    }
}

impl Store for SqliteStore {
    fn categories(&mut self) -> Result<Vec<CategoryRecord>, StoreError> {
        let rows: Result<Vec<_>, _> = self
            .conn
            .prepare_cached("SELECT * FROM categories ORDER BY name ASC")?
            .query_map(named_params! {}, destruct_category)?
            .collect();
        Ok(rows?)
    }

    fn add_category(&mut self, name: &str, color: &str) -> Result<CategoryId, StoreError> {
        let inserted = self.conn.execute(
            "INSERT INTO categories (name, color, word_count) VALUES (:name, :color, 0)",
            named_params! {":name": name, ":color": color},
        );
        match inserted {
            Ok(_) => Ok(CategoryId(self.conn.last_insert_rowid())),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::DuplicateCategory(name.to_owned()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn category(&mut self, id: CategoryId) -> Result<Option<CategoryRecord>, StoreError> {
        Ok(self
            .conn
            .prepare_cached("SELECT * FROM categories WHERE id = :id")?
            .query_row(named_params! {":id": id.0}, destruct_category)
            .optional()?)
    }

    fn set_word_count(&mut self, id: CategoryId, count: u64) -> Result<(), StoreError> {
        let updated = self.conn.execute(
            "UPDATE categories SET word_count = :count WHERE id = :id",
            named_params! {":count": count, ":id": id.0},
        )?;
        if updated == 0 {
            return Err(StoreError::MissingCategory(id));
        }
        Ok(())
    }

    fn add_word_count(&mut self, id: CategoryId, words: &[WordId]) -> Result<u64, StoreError> {
        let tx = self.conn.transaction()?;
        let mut fresh: u64 = 0;
        {
            let mut q =
                tx.prepare_cached("UPDATE words SET counted = 1 WHERE id = :id AND counted = 0")?;
            for word in words {
                fresh += q.execute(named_params! {":id": word.0})? as u64;
            }
        }
        let updated = tx.execute(
            "UPDATE categories SET word_count = word_count + :fresh WHERE id = :id",
            named_params! {":fresh": fresh, ":id": id.0},
        )?;
        if updated == 0 {
            // Dropping the transaction rolls back the counted marks.
            return Err(StoreError::MissingCategory(id));
        }
        let count = tx.query_row(
            "SELECT word_count FROM categories WHERE id = :id",
            named_params! {":id": id.0},
            |row| row.get(0),
        )?;
        tx.commit()?;
        Ok(count)
    }

    fn commit_words(&mut self, words: &[WordRecord]) -> Result<Vec<WordId>, StoreError> {
        if words.len() > MAX_BATCH_WRITES {
            return Err(StoreError::BatchTooLarge(words.len()));
        }
        let tx = self.conn.transaction()?;
        let mut ids = Vec::with_capacity(words.len());
        {
            let mut q = tx.prepare_cached(
                r#"
INSERT INTO words
        ( english,  turkish,  category )
VALUES  (:english, :turkish, :category );"#,
            )?;
            for word in words {
                q.execute(named_params! {
                    ":english": word.english,
                    ":turkish": word.turkish,
                    ":category": word.category,
                })?;
                ids.push(WordId(tx.last_insert_rowid()));
            }
        }
        tx.commit()?;
        Ok(ids)
    }

    fn count_words(&mut self, category: &str) -> Result<u64, StoreError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM words WHERE category = :category",
            named_params! {":category": category},
            |row| row.get(0),
        )?)
    }

    fn words(&mut self, category: &str) -> Result<Vec<StoredWord>, StoreError> {
        let rows: Result<Vec<_>, _> = self
            .conn
            .prepare_cached(
                "SELECT * FROM words WHERE category = :category ORDER BY created_at DESC, id DESC",
            )?
            .query_map(named_params! {":category": category}, destruct_word)?
            .collect();
        Ok(rows?)
    }
}
