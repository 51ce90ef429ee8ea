//! Fuzz target for reading an existing dataset CSV.
//!
//! Arbitrary store contents must be accepted or reported as corrupt,
//! never panic.

#![no_main]

use describe_this::DatasetStore;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(dir) = tempfile::tempdir() else {
        return;
    };
    let csv_path = dir.path().join("captions.csv");
    if std::fs::write(&csv_path, data).is_err() {
        return;
    }

    let store = DatasetStore::new(csv_path, dir.path().join("images"));
    if let Ok(rows) = store.read_rows() {
        assert_eq!(store.row_count().ok(), Some(rows.len()));
    }
});
