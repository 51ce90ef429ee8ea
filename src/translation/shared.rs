//! Process-wide translator.
//!
//! Loading NLLB takes seconds and a couple of GB, so the model is loaded at
//! most once per process and shared by every caller. A failed load is not
//! cached; the next caller tries again.

use super::{NllbEngine, NllbOptions, TranslationError, Translator};
use crate::config::TranslationConfig;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::info;

/// Do-once holder for a [`Translator`].
pub struct SharedTranslator {
    cell: OnceLock<Arc<Translator>>,
    init: Mutex<()>,
}

static GLOBAL: SharedTranslator = SharedTranslator::new();

impl SharedTranslator {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    /// The instance shared by the whole process.
    pub fn global() -> &'static SharedTranslator {
        &GLOBAL
    }

    /// The translator, if it has been loaded.
    pub fn get(&self) -> Option<Arc<Translator>> {
        self.cell.get().cloned()
    }

    /// Return the loaded translator, running `load` if nobody has yet.
    ///
    /// Concurrent first callers serialize on the init lock; only one of them
    /// runs `load`.
    pub fn get_or_load<F>(&self, load: F) -> Result<Arc<Translator>, TranslationError>
    where
        F: FnOnce() -> Result<Translator, TranslationError>,
    {
        if let Some(translator) = self.cell.get() {
            return Ok(translator.clone());
        }

        let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(translator) = self.cell.get() {
            return Ok(translator.clone());
        }

        let translator = Arc::new(load()?);
        Ok(self.cell.get_or_init(|| translator).clone())
    }

    /// Load the configured NLLB model on first use.
    pub fn get_or_load_nllb(
        &self,
        config: &TranslationConfig,
    ) -> Result<Arc<Translator>, TranslationError> {
        self.get_or_load(|| {
            let dir = config
                .resolved_model_dir()
                .map_err(|e| TranslationError::ModelUnavailable(e.to_string()))?;
            let options = NllbOptions {
                max_new_tokens: config.max_new_tokens,
                intra_threads: config.intra_threads,
            };
            let engine = NllbEngine::load(&dir, options)?;
            info!("Translator ready ({})", config.model);
            Ok(Translator::new(Arc::new(engine)))
        })
    }
}

impl Default for SharedTranslator {
    fn default() -> Self {
        Self::new()
    }
}
