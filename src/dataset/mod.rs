//! Submission dataset.
//!
//! A submission is an image plus contributor metadata and a caption. It is
//! persisted as `<images>/<uuid>.<ext>` and one row of a CSV file whose
//! header is fixed:
//!
//! ```text
//! timestamp,name,email,location,title,description,category,latitude,longitude,caption,translated_caption,image_ref
//! ```
//!
//! Stores created before `image_ref` was recorded keep their eleven-column
//! layout.

mod record;
mod store;
mod validation;

pub use record::{
    Category, Contributor, DatasetRow, StoreSchema, StoredRecordRef, SubmissionRecord, HEADER,
    LEGACY_HEADER,
};
pub use store::{initialize_store, DatasetStore};
pub use validation::{validate_submission, ValidationError};

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Dataset errors.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Invalid submission: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to write {}: {reason}", .path.display())]
    StorageWrite { path: PathBuf, reason: String },

    #[error("Dataset store {} is unreadable or malformed: {reason}", .path.display())]
    StoreCorrupt { path: PathBuf, reason: String },
}

impl DatasetError {
    pub(crate) fn storage_write(path: &Path, reason: impl fmt::Display) -> Self {
        Self::StorageWrite {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn store_corrupt(path: &Path, reason: impl fmt::Display) -> Self {
        Self::StoreCorrupt {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}
