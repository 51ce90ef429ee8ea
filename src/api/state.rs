//! Shared state for API handlers.

use crate::config::TranslationConfig;
use crate::dataset::DatasetStore;
use crate::translation::SharedTranslator;
use std::sync::Arc;

/// Base64 inflates payloads by 4/3; leave room for the other JSON fields.
const JSON_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    /// Dataset the submissions go to
    pub store: Arc<DatasetStore>,
    /// Translator, loaded on first use
    pub translator: &'static SharedTranslator,
    /// Model settings used for that first load
    pub translation: Arc<TranslationConfig>,
}

impl ApiState {
    /// Create new API state.
    pub fn new(
        store: Arc<DatasetStore>,
        translator: &'static SharedTranslator,
        translation: TranslationConfig,
    ) -> Self {
        Self {
            store,
            translator,
            translation: Arc::new(translation),
        }
    }

    /// Largest request body accepted, sized for the largest allowed image.
    pub fn max_body_bytes(&self) -> usize {
        self.store.max_image_bytes().div_ceil(3) * 4 + JSON_OVERHEAD_BYTES
    }
}
