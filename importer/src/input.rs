use serde_json::Value;
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Input file read when none is given.
pub const DEFAULT_INPUT: &str = "words_to_upload.json";

#[derive(Error, Debug)]
#[error("error in reading words from {file}: {kind}")]
pub struct InputError {
    file: PathBuf,
    #[source]
    kind: InputErrorKind,
}

#[derive(Error, Debug)]
pub enum InputErrorKind {
    #[error("I/O error reading input file: {0}")]
    IOError(#[from] std::io::Error),
    #[error("input is not a JSON array: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Read the entries of a JSON array file.
///
/// Entries are returned as-is; each one is validated when it is staged for writing, so one bad
/// entry never fails the whole file.
pub fn load_words(file: &Path) -> Result<Vec<Value>, InputError> {
    let read = || -> Result<Vec<Value>, InputErrorKind> {
        let f = BufReader::new(File::open(file)?);
        Ok(serde_json::from_reader(f)?)
    };
    let words = read().map_err(|kind| InputError {
        file: file.to_owned(),
        kind,
    })?;
    tracing::debug!("read {} entries from {}", words.len(), file.display());
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn file_with(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn keeps_malformed_entries() {
        let f = file_with(
            r#"[{"english": "cat", "turkish": "kedi", "category": "Animals"}, 5, {"english": "dog"}]"#,
        );
        let words = load_words(f.path()).unwrap();
        assert_eq!(words.len(), 3);
        assert_eq!(words[1], Value::from(5));
    }

    #[test]
    fn rejects_non_array() {
        let f = file_with(r#"{"english": "cat"}"#);
        let err = load_words(f.path()).unwrap_err();
        assert!(matches!(err.kind, InputErrorKind::JsonError(_)));
    }

    #[test]
    fn rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_words(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err.kind, InputErrorKind::IOError(_)));
        assert!(err.to_string().contains("nope.json"));
    }
}
