//! CSV dataset store with an image directory.
//!
//! The store is append-only: rows are added at the end of the CSV file and
//! images are created once under a fresh UUID. A mutex serializes the
//! check-then-append cycle so concurrent submissions cannot lose rows.

use super::record::{DatasetRow, StoreSchema, StoredRecordRef, SubmissionRecord, HEADER};
use super::validation::validate_submission;
use super::DatasetError;
use crate::config::DatasetConfig;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Create the CSV file with its header if it does not exist yet.
///
/// Returns `true` when the file was created. An existing file is left
/// untouched.
pub fn initialize_store(path: &Path) -> Result<bool, DatasetError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| DatasetError::storage_write(parent, e))?;
    }

    let file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            debug!("Dataset store already exists: {}", path.display());
            return Ok(false);
        }
        Err(e) => return Err(DatasetError::storage_write(path, e)),
    };

    let mut writer = csv::Writer::from_writer(file);
    writer
        .write_record(HEADER)
        .map_err(|e| DatasetError::storage_write(path, e))?;
    writer
        .flush()
        .map_err(|e| DatasetError::storage_write(path, e))?;

    info!("Initialized dataset store: {}", path.display());
    Ok(true)
}

/// What a scan of the existing CSV found.
struct StoreScan {
    schema: StoreSchema,
    rows: usize,
    /// File does not end with a line break
    needs_newline: bool,
}

/// Read the whole store, checking the header and every row.
fn scan_store(path: &Path) -> Result<StoreScan, DatasetError> {
    let bytes = fs::read(path).map_err(|e| DatasetError::store_corrupt(path, e))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes.as_slice());

    let headers = reader
        .headers()
        .map_err(|e| DatasetError::store_corrupt(path, e))?
        .clone();
    let schema = StoreSchema::from_header(headers.iter()).ok_or_else(|| {
        DatasetError::store_corrupt(
            path,
            format!("unexpected header: {}", headers.iter().collect::<Vec<_>>().join(",")),
        )
    })?;

    let mut rows = 0;
    for record in reader.records() {
        record.map_err(|e| DatasetError::store_corrupt(path, e))?;
        rows += 1;
    }

    Ok(StoreScan {
        schema,
        rows,
        needs_newline: !bytes.is_empty() && !bytes.ends_with(b"\n"),
    })
}

/// Append one row without rewriting the file.
fn append_row(path: &Path, fields: &[String], needs_newline: bool) -> Result<(), DatasetError> {
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| DatasetError::storage_write(path, e))?;

    if needs_newline {
        file.write_all(b"\n")
            .map_err(|e| DatasetError::storage_write(path, e))?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    writer
        .write_record(fields)
        .map_err(|e| DatasetError::storage_write(path, e))?;
    let file = writer
        .into_inner()
        .map_err(|e| DatasetError::storage_write(path, e.error()))?;
    file.sync_all()
        .map_err(|e| DatasetError::storage_write(path, e))?;

    Ok(())
}

/// Write image bytes to a path that must not exist yet.
fn write_image(path: &Path, bytes: &[u8]) -> Result<(), DatasetError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| DatasetError::storage_write(parent, e))?;
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| DatasetError::storage_write(path, e))?;

    let written = file.write_all(bytes).and_then(|_| file.sync_all());
    if let Err(e) = written {
        drop(file);
        let _ = fs::remove_file(path);
        return Err(DatasetError::storage_write(path, e));
    }

    Ok(())
}

/// Submission dataset: one CSV file plus an image directory.
pub struct DatasetStore {
    csv_path: PathBuf,
    images_dir: PathBuf,
    legacy_png_suffix: bool,
    max_image_bytes: usize,
    write_lock: Mutex<()>,
}

impl DatasetStore {
    pub fn new(csv_path: impl Into<PathBuf>, images_dir: impl Into<PathBuf>) -> Self {
        Self {
            csv_path: csv_path.into(),
            images_dir: images_dir.into(),
            legacy_png_suffix: false,
            max_image_bytes: DatasetConfig::default().max_image_bytes,
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &DatasetConfig) -> Self {
        Self::new(config.csv_path(), config.images_path())
            .with_legacy_png_suffix(config.legacy_png_suffix)
            .with_max_image_bytes(config.max_image_bytes)
    }

    /// Name every image `<uuid>.png` regardless of its format.
    pub fn with_legacy_png_suffix(mut self, legacy: bool) -> Self {
        self.legacy_png_suffix = legacy;
        self
    }

    pub fn with_max_image_bytes(mut self, max: usize) -> Self {
        self.max_image_bytes = max;
        self
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    pub fn max_image_bytes(&self) -> usize {
        self.max_image_bytes
    }

    /// Create the image directory and the CSV file (with header) if missing.
    pub fn initialize(&self) -> Result<bool, DatasetError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        fs::create_dir_all(&self.images_dir)
            .map_err(|e| DatasetError::storage_write(&self.images_dir, e))?;
        initialize_store(&self.csv_path)
    }

    /// Check a submission against this store's limits without writing.
    ///
    /// Lets callers reject a submission before doing expensive work such as
    /// translating its caption.
    pub fn validate(
        &self,
        record: &SubmissionRecord,
        image_bytes: &[u8],
    ) -> Result<(), DatasetError> {
        validate_submission(record, image_bytes, self.max_image_bytes)?;
        Ok(())
    }

    /// Persist a submission: image file first, then one CSV row.
    ///
    /// Nothing is written when validation fails or the store is malformed.
    /// A failed image write leaves the CSV untouched; a failed row append
    /// removes the image again.
    pub fn append_record(
        &self,
        record: &SubmissionRecord,
        image_bytes: &[u8],
    ) -> Result<StoredRecordRef, DatasetError> {
        validate_submission(record, image_bytes, self.max_image_bytes)?;

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        initialize_store(&self.csv_path)?;
        let scan = scan_store(&self.csv_path)?;

        let image_ref = Uuid::new_v4();
        let image_path = self
            .images_dir
            .join(format!("{}.{}", image_ref, self.image_extension(image_bytes)));
        write_image(&image_path, image_bytes)?;
        debug!(
            "Stored image {} ({} bytes)",
            image_path.display(),
            image_bytes.len()
        );

        let timestamp = chrono::Local::now()
            .format("%Y-%m-%dT%H:%M:%S%.6f")
            .to_string();
        let fields = record.row_fields(&timestamp, &image_ref, scan.schema);
        if scan.schema == StoreSchema::Legacy {
            warn!(
                "{} has no image_ref column; image_ref {} is not recorded in row {}",
                self.csv_path.display(),
                image_ref,
                scan.rows
            );
        }

        if let Err(e) = append_row(&self.csv_path, &fields, scan.needs_newline) {
            if let Err(rm) = fs::remove_file(&image_path) {
                warn!(
                    "Failed to remove orphan image {}: {}",
                    image_path.display(),
                    rm
                );
            }
            return Err(e);
        }

        info!(
            "Recorded submission {} (row {}, category {})",
            image_ref, scan.rows, record.category
        );

        Ok(StoredRecordRef {
            image_ref,
            image_path,
            row_index: scan.rows,
            timestamp,
        })
    }

    /// All data rows, oldest first.
    pub fn read_rows(&self) -> Result<Vec<DatasetRow>, DatasetError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.csv_path.exists() {
            return Ok(Vec::new());
        }
        // Validates header and row widths first
        scan_store(&self.csv_path)?;

        let mut reader = csv::Reader::from_path(&self.csv_path)
            .map_err(|e| DatasetError::store_corrupt(&self.csv_path, e))?;
        reader
            .deserialize()
            .map(|row| row.map_err(|e| DatasetError::store_corrupt(&self.csv_path, e)))
            .collect()
    }

    /// Number of data rows.
    pub fn row_count(&self) -> Result<usize, DatasetError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.csv_path.exists() {
            return Ok(0);
        }
        Ok(scan_store(&self.csv_path)?.rows)
    }

    /// The CSV file, byte for byte.
    pub fn export(&self) -> Result<Vec<u8>, DatasetError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        initialize_store(&self.csv_path)?;
        fs::read(&self.csv_path).map_err(|e| DatasetError::store_corrupt(&self.csv_path, e))
    }

    fn image_extension(&self, bytes: &[u8]) -> &'static str {
        if self.legacy_png_suffix {
            return "png";
        }
        image::guess_format(bytes)
            .ok()
            .and_then(|format| format.extensions_str().first().copied())
            .unwrap_or("bin")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::record::{Category, Contributor, LEGACY_HEADER};
    use crate::dataset::validation::ValidationError;
    use std::collections::HashSet;
    use std::sync::Arc;
    use tempfile::TempDir;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const JPEG_MAGIC: &[u8] = b"\xFF\xD8\xFF\xE0\0\x10JFIF\0";

    fn store_in(dir: &TempDir) -> DatasetStore {
        DatasetStore::new(
            dir.path().join("data").join("captions.csv"),
            dir.path().join("data").join("images"),
        )
    }

    fn scenario_record() -> SubmissionRecord {
        SubmissionRecord {
            contributor: Contributor {
                name: "A".into(),
                email: "a@x.com".into(),
                location: "City".into(),
            },
            consent: true,
            title: "T".into(),
            description: "D".into(),
            category: Category::Food,
            latitude: 1.0,
            longitude: 2.0,
            caption: "hello".into(),
            translated_caption: String::new(),
        }
    }

    fn image_files(store: &DatasetStore) -> Vec<PathBuf> {
        match fs::read_dir(store.images_dir()) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    #[test]
    fn test_initialize_writes_header() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert!(store.initialize().unwrap());
        assert!(store.images_dir().is_dir());

        let contents = fs::read_to_string(store.csv_path()).unwrap();
        assert_eq!(
            contents,
            "timestamp,name,email,location,title,description,category,latitude,longitude,caption,translated_caption,image_ref\n"
        );
        assert_eq!(store.row_count().unwrap(), 0);
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.initialize().unwrap();
        let first = fs::read(store.csv_path()).unwrap();
        assert!(!store.initialize().unwrap());
        assert!(!initialize_store(store.csv_path()).unwrap());
        assert_eq!(fs::read(store.csv_path()).unwrap(), first);
    }

    #[test]
    fn test_append_scenario() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.initialize().unwrap();

        let stored = store.append_record(&scenario_record(), &[7u8; 10]).unwrap();

        let rows = store.read_rows().unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.name, "A");
        assert_eq!(row.email, "a@x.com");
        assert_eq!(row.location, "City");
        assert_eq!(row.title, "T");
        assert_eq!(row.description, "D");
        assert_eq!(row.category, Category::Food);
        assert_eq!(row.latitude, 1.0);
        assert_eq!(row.longitude, 2.0);
        assert_eq!(row.caption, "hello");
        assert_eq!(row.translated_caption, "");
        assert_eq!(row.image_ref, stored.image_ref.to_string());
        assert_eq!(row.timestamp, stored.timestamp);
        assert!(!row.timestamp.is_empty());

        assert_eq!(stored.row_index, 0);
        assert_eq!(fs::metadata(&stored.image_path).unwrap().len(), 10);
        assert_eq!(image_files(&store), vec![stored.image_path.clone()]);

        let contents = fs::read_to_string(store.csv_path()).unwrap();
        assert!(contents.contains(",Food,1.0,2.0,hello,,"));
    }

    #[test]
    fn test_append_without_initialize() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.append_record(&scenario_record(), b"abc").unwrap();
        assert_eq!(store.row_count().unwrap(), 1);
    }

    #[test]
    fn test_append_grows_by_one_and_keeps_prior_rows() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.initialize().unwrap();

        let mut record = scenario_record();
        for i in 0..5 {
            let before = fs::read(store.csv_path()).unwrap();
            record.caption = format!("caption, \"quoted\" #{}\nsecond line", i);

            let stored = store.append_record(&record, b"same bytes").unwrap();
            assert_eq!(stored.row_index, i);
            assert_eq!(store.row_count().unwrap(), i + 1);

            let after = fs::read(store.csv_path()).unwrap();
            assert!(after.starts_with(&before));
        }

        let rows = store.read_rows().unwrap();
        assert_eq!(rows[3].caption, "caption, \"quoted\" #3\nsecond line");
    }

    #[test]
    fn test_image_refs_are_unique() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let refs: HashSet<Uuid> = (0..20)
            .map(|_| store.append_record(&scenario_record(), b"identical").unwrap().image_ref)
            .collect();
        assert_eq!(refs.len(), 20);
        assert_eq!(image_files(&store).len(), 20);
    }

    #[test]
    fn test_validation_blocks_everything() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut record = scenario_record();
        record.contributor.name.clear();
        let err = store.append_record(&record, b"img").unwrap_err();
        assert!(matches!(
            err,
            DatasetError::Validation(ValidationError::MissingField("name"))
        ));

        let err = store.append_record(&scenario_record(), &[]).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::Validation(ValidationError::EmptyImage)
        ));

        assert!(!store.csv_path().exists());
        assert!(image_files(&store).is_empty());
    }

    #[test]
    fn test_image_write_failure_leaves_store_unchanged() {
        let dir = TempDir::new().unwrap();
        let images_blocker = dir.path().join("images");
        // A regular file where the image directory should be
        fs::write(&images_blocker, b"not a directory").unwrap();

        let store = DatasetStore::new(dir.path().join("captions.csv"), &images_blocker);
        initialize_store(store.csv_path()).unwrap();
        let before = fs::read(store.csv_path()).unwrap();

        let err = store.append_record(&scenario_record(), &[1u8; 10]).unwrap_err();
        assert!(matches!(err, DatasetError::StorageWrite { .. }));
        assert_eq!(store.row_count().unwrap(), 0);
        assert_eq!(fs::read(store.csv_path()).unwrap(), before);
    }

    #[test]
    fn test_corrupt_store_is_surfaced() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.csv_path().parent().unwrap()).unwrap();

        fs::write(store.csv_path(), "id,text\n1,hello\n").unwrap();
        let err = store.append_record(&scenario_record(), b"img").unwrap_err();
        assert!(matches!(err, DatasetError::StoreCorrupt { .. }));
        assert!(image_files(&store).is_empty());
        // Not repaired
        assert_eq!(
            fs::read_to_string(store.csv_path()).unwrap(),
            "id,text\n1,hello\n"
        );

        let mut ragged = HEADER.join(",");
        ragged.push_str("\nonly,three,fields\n");
        fs::write(store.csv_path(), &ragged).unwrap();
        assert!(matches!(
            store.row_count(),
            Err(DatasetError::StoreCorrupt { .. })
        ));
        assert!(matches!(
            store.append_record(&scenario_record(), b"img"),
            Err(DatasetError::StoreCorrupt { .. })
        ));

        fs::write(store.csv_path(), "").unwrap();
        assert!(matches!(
            store.append_record(&scenario_record(), b"img"),
            Err(DatasetError::StoreCorrupt { .. })
        ));
    }

    #[test]
    fn test_legacy_store_keeps_legacy_columns() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.csv_path().parent().unwrap()).unwrap();

        // Existing dataset, no trailing newline after the last row
        let legacy = format!(
            "{}\n2024-01-01T10:00:00.000000,B,b@x.com,Town,,,Festival,0.0,0.0,old,",
            LEGACY_HEADER.join(",")
        );
        fs::write(store.csv_path(), &legacy).unwrap();

        let stored = store.append_record(&scenario_record(), b"img").unwrap();
        assert_eq!(stored.row_index, 1);

        let contents = fs::read_to_string(store.csv_path()).unwrap();
        assert!(contents.starts_with(&legacy));
        let last_line = contents.lines().last().unwrap();
        assert_eq!(last_line.split(',').count(), LEGACY_HEADER.len());

        let rows = store.read_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].caption, "old");
        assert_eq!(rows[1].image_ref, "");
    }

    /// Collects formatted log output for assertions.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

    impl Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_legacy_store_warns_about_unrecorded_image_ref() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.csv_path().parent().unwrap()).unwrap();
        fs::write(store.csv_path(), format!("{}\n", LEGACY_HEADER.join(","))).unwrap();

        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let stored = tracing::subscriber::with_default(subscriber, || {
            store.append_record(&scenario_record(), b"img").unwrap()
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"));
        assert!(output.contains("no image_ref column"));
        assert!(output.contains(&stored.image_ref.to_string()));
    }

    #[test]
    fn test_current_store_does_not_warn() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            store.append_record(&scenario_record(), b"img").unwrap()
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(!output.contains("no image_ref column"));
    }

    #[test]
    fn test_validate_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).with_max_image_bytes(4);

        store.validate(&scenario_record(), b"img").unwrap();

        let mut record = scenario_record();
        record.consent = false;
        assert!(matches!(
            store.validate(&record, b"img"),
            Err(DatasetError::Validation(ValidationError::MissingConsent))
        ));
        assert!(matches!(
            store.validate(&scenario_record(), b"too big"),
            Err(DatasetError::Validation(ValidationError::ImageTooLarge(7, 4)))
        ));

        assert!(!store.csv_path().exists());
        assert!(image_files(&store).is_empty());
    }

    #[test]
    fn test_reads_during_appends_never_see_partial_rows() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(store_in(&dir));
        store.initialize().unwrap();

        let writer = {
            let store = store.clone();
            std::thread::spawn(move || {
                for _ in 0..30 {
                    store.append_record(&scenario_record(), b"img").unwrap();
                }
            })
        };
        let reader = {
            let store = store.clone();
            std::thread::spawn(move || {
                let mut last = 0;
                for _ in 0..60 {
                    let rows = store.read_rows().unwrap().len();
                    let count = store.row_count().unwrap();
                    assert!(rows >= last);
                    assert!(count >= rows);
                    last = count;
                }
            })
        };

        writer.join().unwrap();
        reader.join().unwrap();
        assert_eq!(store.row_count().unwrap(), 30);
    }

    #[test]
    fn test_image_extension_from_content() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let png = store.append_record(&scenario_record(), PNG_MAGIC).unwrap();
        let jpeg = store.append_record(&scenario_record(), JPEG_MAGIC).unwrap();
        let unknown = store.append_record(&scenario_record(), b"plain bytes").unwrap();

        assert_eq!(png.image_path.extension().unwrap(), "png");
        assert_eq!(jpeg.image_path.extension().unwrap(), "jpg");
        assert_eq!(unknown.image_path.extension().unwrap(), "bin");
        assert_eq!(
            png.image_path.file_stem().unwrap().to_str().unwrap(),
            png.image_ref.to_string()
        );
    }

    #[test]
    fn test_legacy_png_suffix() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).with_legacy_png_suffix(true);

        let jpeg = store.append_record(&scenario_record(), JPEG_MAGIC).unwrap();
        assert_eq!(jpeg.image_path.extension().unwrap(), "png");
        assert_eq!(fs::read(&jpeg.image_path).unwrap(), JPEG_MAGIC);
    }

    #[test]
    fn test_max_image_bytes() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).with_max_image_bytes(4);

        let err = store.append_record(&scenario_record(), b"12345").unwrap_err();
        assert!(matches!(
            err,
            DatasetError::Validation(ValidationError::ImageTooLarge(5, 4))
        ));
    }

    #[test]
    fn test_export_is_verbatim() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert_eq!(
            store.export().unwrap(),
            format!("{}\n", HEADER.join(",")).into_bytes()
        );

        store.append_record(&scenario_record(), b"img").unwrap();
        assert_eq!(
            store.export().unwrap(),
            fs::read(store.csv_path()).unwrap()
        );
    }

    #[test]
    fn test_concurrent_appends_lose_nothing() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(store_in(&dir));
        store.initialize().unwrap();

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    let mut record = scenario_record();
                    for i in 0..5 {
                        record.caption = format!("thread {} item {}", t, i);
                        store.append_record(&record, b"img").unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let rows = store.read_rows().unwrap();
        assert_eq!(rows.len(), 40);
        let refs: HashSet<_> = rows.iter().map(|r| r.image_ref.clone()).collect();
        assert_eq!(refs.len(), 40);
    }
}
