//! Submission types and the CSV row layout.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use utoipa::ToSchema;
use uuid::Uuid;

/// Columns written before `image_ref` existed.
pub const LEGACY_HEADER: [&str; 11] = [
    "timestamp",
    "name",
    "email",
    "location",
    "title",
    "description",
    "category",
    "latitude",
    "longitude",
    "caption",
    "translated_caption",
];

/// Columns of a freshly initialized store.
pub const HEADER: [&str; 12] = [
    "timestamp",
    "name",
    "email",
    "location",
    "title",
    "description",
    "category",
    "latitude",
    "longitude",
    "caption",
    "translated_caption",
    "image_ref",
];

/// Column layout of an existing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreSchema {
    /// Eleven columns, no `image_ref`
    Legacy,
    /// Twelve columns ending with `image_ref`
    Current,
}

impl StoreSchema {
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Legacy => &LEGACY_HEADER,
            Self::Current => &HEADER,
        }
    }

    /// Identify a header row; `None` for anything else.
    pub fn from_header<'a, I>(header: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let header: Vec<&str> = header.into_iter().collect();
        [Self::Current, Self::Legacy]
            .into_iter()
            .find(|schema| schema.columns() == header.as_slice())
    }
}

/// Who submitted the image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub name: String,
    pub email: String,
    pub location: String,
}

/// What the image shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Category {
    #[serde(rename = "Cultural Event")]
    CulturalEvent,
    Festival,
    #[serde(rename = "Street Scene")]
    StreetScene,
    Food,
    Object,
    Nature,
    People,
    #[default]
    Other,
}

impl Category {
    /// All categories, in the order they are offered.
    pub const ALL: [Category; 8] = [
        Category::CulturalEvent,
        Category::Festival,
        Category::StreetScene,
        Category::Food,
        Category::Object,
        Category::Nature,
        Category::People,
        Category::Other,
    ];

    /// Name stored in the dataset.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::CulturalEvent => "Cultural Event",
            Self::Festival => "Festival",
            Self::StreetScene => "Street Scene",
            Self::Food => "Food",
            Self::Object => "Object",
            Self::Nature => "Nature",
            Self::People => "People",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");
        Self::ALL
            .into_iter()
            .find(|c| c.display_name().to_lowercase() == normalized)
            .ok_or_else(|| {
                format!(
                    "Unknown category '{}'. Use one of: {}",
                    s,
                    Self::ALL.map(|c| c.display_name()).join(", ")
                )
            })
    }
}

/// One submission, assembled before it is written.
///
/// `timestamp` and `image_ref` are assigned by the store at write time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionRecord {
    pub contributor: Contributor,
    /// Consent to use the data for open-source AI research; never persisted
    pub consent: bool,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub latitude: f64,
    pub longitude: f64,
    pub caption: String,
    /// Empty unless translation was requested
    pub translated_caption: String,
}

impl SubmissionRecord {
    /// Row fields in column order for `schema`.
    pub(crate) fn row_fields(
        &self,
        timestamp: &str,
        image_ref: &Uuid,
        schema: StoreSchema,
    ) -> Vec<String> {
        let mut fields = vec![
            timestamp.to_string(),
            self.contributor.name.clone(),
            self.contributor.email.clone(),
            self.contributor.location.clone(),
            self.title.clone(),
            self.description.clone(),
            self.category.display_name().to_string(),
            format_coordinate(self.latitude),
            format_coordinate(self.longitude),
            self.caption.clone(),
            self.translated_caption.clone(),
        ];
        if schema == StoreSchema::Current {
            fields.push(image_ref.to_string());
        }
        fields
    }
}

/// Always keeps a decimal point: `1.0`, `17.385`.
fn format_coordinate(value: f64) -> String {
    format!("{:?}", value)
}

/// Where a submission ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecordRef {
    pub image_ref: Uuid,
    pub image_path: PathBuf,
    /// 0-based index among the data rows
    pub row_index: usize,
    pub timestamp: String,
}

/// A data row read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
    pub timestamp: String,
    pub name: String,
    pub email: String,
    pub location: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub latitude: f64,
    pub longitude: f64,
    pub caption: String,
    pub translated_caption: String,
    /// Empty for rows of a legacy store
    #[serde(default)]
    pub image_ref: String,
}
