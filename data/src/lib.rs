use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use std::fmt::Display;
use thiserror::Error;

/// Display colours handed out to new categories, in order.
pub const PALETTE: [&str; 20] = [
    "#FF5722", "#2196F3", "#4CAF50", "#FF9800", "#9C27B0", "#F44336", "#009688", "#795548",
    "#607D8B", "#E91E63", "#3F51B5", "#8BC34A", "#FFC107", "#673AB7", "#00BCD4", "#CDDC39",
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4",
];

/// Colour for the k-th category created in a run.
pub fn palette_color(k: usize) -> &'static str {
    PALETTE[k % PALETTE.len()]
}

/// Storage-assigned identifier of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryId(pub i64);

impl Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage-assigned identifier of a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WordId(pub i64);

impl Display for WordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecordError {
    #[error("entry is not a JSON object")]
    NotAnObject,
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{0}` is not a string")]
    NotAString(&'static str),
    #[error("field `{0}` is empty")]
    EmptyField(&'static str),
}

/// English/Turkish word pair with the name of its category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordRecord {
    pub english: String,
    pub turkish: String,
    pub category: String,
}

fn field<'v>(obj: &'v Map<String, Value>, name: &'static str) -> Result<&'v str, RecordError> {
    match obj.get(name) {
        None | Some(Value::Null) => Err(RecordError::MissingField(name)),
        Some(Value::String(s)) if s.is_empty() => Err(RecordError::EmptyField(name)),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(RecordError::NotAString(name)),
    }
}

impl WordRecord {
    /// Build a record from one entry of the input file.
    pub fn from_json(value: &Value) -> Result<Self, RecordError> {
        let obj = value.as_object().ok_or(RecordError::NotAnObject)?;
        Ok(WordRecord {
            english: field(obj, "english")?.to_owned(),
            turkish: field(obj, "turkish")?.to_owned(),
            category: field(obj, "category")?.to_owned(),
        })
    }

    /// The category named by an input entry, if it names one at all.
    /// Entries that fail here fail again, per record, when they are staged.
    pub fn category_of(value: &Value) -> Option<&str> {
        value
            .as_object()
            .and_then(|obj| field(obj, "category").ok())
    }
}

impl Display for WordRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -- {} ({})", self.english, self.turkish, self.category)
    }
}

/// Category row in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRecord {
    pub id: CategoryId,
    pub name: String,
    pub color: String,
    pub word_count: u64,
    pub created_at: NaiveDateTime,
}

/// Word row in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredWord {
    pub id: WordId,
    pub word: WordRecord,
    pub created_at: NaiveDateTime,
}
