//! Caption translation.
//!
//! Translates contributor captions between the supported Indic languages and
//! English with NLLB-200. Callers speak in display names ("Telugu"); the
//! [`Translator`] resolves them to model codes and delegates the model call
//! to a [`TranslationEngine`].

mod languages;
mod nllb;
mod shared;

pub use languages::{resolve_source, resolve_target, Language, SOURCE_FALLBACK, TARGET_FALLBACK};
pub use nllb::{
    download_model as download_nllb_model, is_model_downloaded as is_nllb_downloaded,
    remove_model as remove_nllb_model, NllbEngine, NllbError, NllbModel, NllbOptions,
    MAX_SOURCE_TOKENS,
};
pub use shared::SharedTranslator;

use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

/// Translation-related errors.
#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("Translation model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Translation failed: {0}")]
    Inference(String),

    #[error("Nothing to translate: text is empty")]
    EmptyText,
}

/// Model backend: translates between model-specific language codes.
pub trait TranslationEngine: Send + Sync {
    /// Translate `text` from `src_code` to `tgt_code`.
    fn generate(&self, text: &str, src_code: &str, tgt_code: &str) -> Result<String, TranslationError>;

    /// Get the name of the translation engine.
    fn name(&self) -> &str;
}

/// Caption translator working on display-name language tags.
pub struct Translator {
    engine: Arc<dyn TranslationEngine>,
}

impl Translator {
    pub fn new(engine: Arc<dyn TranslationEngine>) -> Self {
        Self { engine }
    }

    /// Translate `text` from `source_lang` to `target_lang`.
    ///
    /// Unknown source names translate as English, unknown target names as
    /// Hindi. An empty model result is an error. Single attempt; errors go
    /// straight to the caller.
    pub fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslationError> {
        if text.trim().is_empty() {
            return Err(TranslationError::EmptyText);
        }

        let from = resolve_source(source_lang);
        let to = resolve_target(target_lang);
        debug!(
            "Translating {} chars {} -> {} with {}",
            text.chars().count(),
            from,
            to,
            self.engine.name()
        );

        let start = Instant::now();
        let translated = self.engine.generate(text, from.nllb_code(), to.nllb_code())?;
        if translated.trim().is_empty() {
            return Err(TranslationError::Inference("model produced no output".into()));
        }

        info!(
            "Translated caption {} -> {} in {}ms",
            from,
            to,
            start.elapsed().as_millis()
        );
        Ok(translated)
    }

    /// Get the name of the translation engine.
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }
}
