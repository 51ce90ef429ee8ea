//! describe-this library exports for the binary, integration tests and fuzzing.
//!
//! The two components are independent: [`translation`] turns a caption into
//! another language, [`dataset`] persists a submission. Callers compose them.

pub mod api;
pub mod caption;
pub mod config;
pub mod dataset;
pub mod translation;

// Re-export commonly used types for convenience
pub use config::Config;
pub use dataset::{DatasetError, DatasetStore, StoredRecordRef, SubmissionRecord};
pub use translation::{Language, SharedTranslator, TranslationError, Translator};
