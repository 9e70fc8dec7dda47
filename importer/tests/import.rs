use importer::{import, load_words, SqliteStore, Store, Strategy};
use std::fs;

const WORDS: &str = r#"[
    {"english": "cat", "turkish": "kedi", "category": "Animals"},
    {"english": "dog", "turkish": "köpek", "category": "Animals"},
    {"english": "red", "turkish": "kırmızı", "category": "Colors"},
    {"english": "blue", "category": "Colors"}
]"#;

#[test]
fn import_from_file_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("words_to_upload.json");
    let db = dir.path().join("vocab.sqlite");
    fs::write(&input, WORDS).unwrap();

    let records = load_words(&input).unwrap();
    let report = {
        let mut store = SqliteStore::open(&db).unwrap();
        import(&mut store, &records, Strategy::Recompute).unwrap()
    };
    assert_eq!(report.total, 4);
    assert_eq!(report.uploaded, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(report.errors.len(), 1);
    let created: Vec<_> = report.created.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(created, vec!["Animals", "Colors"]);

    let mut store = SqliteStore::open(&db).unwrap();
    let categories = store.categories().unwrap();
    let counts: Vec<_> = categories
        .iter()
        .map(|c| (c.name.as_str(), c.word_count))
        .collect();
    assert_eq!(counts, vec![("Animals", 2), ("Colors", 1)]);

    let words = store.words("Animals").unwrap();
    assert_eq!(words.len(), 2);
    assert!(words.iter().any(|w| w.word.turkish == "köpek"));
}

#[test]
fn incremental_then_recompute_agree() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("words.json");
    fs::write(&input, WORDS).unwrap();
    let records = load_words(&input).unwrap();

    let mut store = SqliteStore::open(&dir.path().join("vocab.sqlite")).unwrap();
    let incremental = import(&mut store, &records, Strategy::Incremental).unwrap();
    let recount = importer::recount_all(&mut store).unwrap();
    assert_eq!(incremental.word_counts, recount.word_counts);
}
