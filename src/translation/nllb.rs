//! NLLB-200 neural translation engine.
//!
//! NLLB-200 is a multilingual encoder-decoder model covering 200 languages.
//! This engine runs the distilled 600M checkpoint exported to ONNX as two
//! graphs (encoder, decoder without KV cache) on ONNX Runtime and decodes
//! greedily.
//!
//! Token layout:
//! - source: `[src_lang] tokens... </s>`
//! - decoder start: `</s> [tgt_lang]` (the target code is the forced BOS)
//!
//! Model files are downloaded on demand into the model directory.

use super::{TranslationEngine, TranslationError};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use thiserror::Error;
use tokenizers::Tokenizer;
use tracing::{debug, info};

/// Encoder graph file name.
pub const ENCODER_FILE: &str = "encoder_model.onnx";

/// Decoder graph file name.
pub const DECODER_FILE: &str = "decoder_model.onnx";

/// Tokenizer file name.
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Longest source sequence the model accepts, special tokens included.
pub const MAX_SOURCE_TOKENS: usize = 1024;

const EOS_TOKEN: &str = "</s>";

/// NLLB specific errors.
#[derive(Error, Debug)]
pub enum NllbError {
    #[error("Model not downloaded at {0}. Run: describe-this model download 600m")]
    ModelNotDownloaded(PathBuf),

    #[error("Failed to load model: {0}")]
    Load(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Unknown language token: {0}")]
    UnknownLanguage(String),

    #[error("Input too long: {0} tokens exceeds maximum {1}")]
    InputTooLong(usize, usize),

    #[error("Model download failed: {0}")]
    DownloadFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<NllbError> for TranslationError {
    fn from(err: NllbError) -> Self {
        match err {
            NllbError::ModelNotDownloaded(_) | NllbError::Load(_) | NllbError::Io(_) => {
                TranslationError::ModelUnavailable(err.to_string())
            }
            NllbError::DownloadFailed(_) => TranslationError::ModelUnavailable(err.to_string()),
            NllbError::Tokenizer(_)
            | NllbError::Inference(_)
            | NllbError::UnknownLanguage(_)
            | NllbError::InputTooLong(..) => TranslationError::Inference(err.to_string()),
        }
    }
}

/// NLLB model variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NllbModel {
    /// facebook/nllb-200-distilled-600M, fp32 (~2.5GB)
    #[default]
    Distilled600M,
    /// Same checkpoint with int8 weights (~0.9GB)
    Distilled600MQuantized,
}

impl NllbModel {
    /// All variants.
    pub const ALL: [NllbModel; 2] = [NllbModel::Distilled600M, NllbModel::Distilled600MQuantized];

    /// Get the model name used on the command line and in config.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Distilled600M => "600m",
            Self::Distilled600MQuantized => "600m-quantized",
        }
    }

    /// Get the upstream Hugging Face model ID.
    pub fn hf_model_id(&self) -> &'static str {
        "facebook/nllb-200-distilled-600M"
    }

    /// Base URL of the pre-converted ONNX export.
    pub fn base_url(&self) -> &'static str {
        "https://huggingface.co/Xenova/nllb-200-distilled-600M/resolve/main"
    }

    /// Remote path and local file name of every file the engine needs.
    pub fn files(&self) -> [(&'static str, &'static str); 3] {
        match self {
            Self::Distilled600M => [
                ("onnx/encoder_model.onnx", ENCODER_FILE),
                ("onnx/decoder_model.onnx", DECODER_FILE),
                ("tokenizer.json", TOKENIZER_FILE),
            ],
            Self::Distilled600MQuantized => [
                ("onnx/encoder_model_quantized.onnx", ENCODER_FILE),
                ("onnx/decoder_model_quantized.onnx", DECODER_FILE),
                ("tokenizer.json", TOKENIZER_FILE),
            ],
        }
    }

    /// Approximate download size in MB.
    pub fn size_mb(&self) -> u32 {
        match self {
            Self::Distilled600M => 2500,
            Self::Distilled600MQuantized => 900,
        }
    }
}

impl fmt::Display for NllbModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for NllbModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "600m" | "distilled-600m" | "nllb-200-distilled-600m" => Ok(Self::Distilled600M),
            "600m-quantized" | "600m-int8" | "quantized" => Ok(Self::Distilled600MQuantized),
            _ => Err(format!("Unknown model: {}", s)),
        }
    }
}

/// Check that every model file is present in `dir`.
pub fn is_model_downloaded(dir: &Path) -> bool {
    [ENCODER_FILE, DECODER_FILE, TOKENIZER_FILE]
        .iter()
        .all(|f| dir.join(f).is_file())
}

/// Download any missing model files into `dir`.
pub async fn download_model(model: NllbModel, dir: &Path) -> Result<(), NllbError> {
    tokio::fs::create_dir_all(dir).await?;

    for (remote, local) in model.files() {
        let path = dir.join(local);
        if path.is_file() {
            debug!("{} already present, skipping", path.display());
            continue;
        }

        let url = format!("{}/{}", model.base_url(), remote);
        info!("Downloading {} ({})...", local, model);
        download_file(&url, &path).await?;
    }

    info!("Model {} ready in {}", model, dir.display());
    Ok(())
}

/// Stream one file to disk through a `.part` file.
async fn download_file(url: &str, path: &Path) -> Result<(), NllbError> {
    use futures_util::StreamExt;
    use std::io::Write;

    let response = reqwest::get(url)
        .await
        .map_err(|e| NllbError::DownloadFailed(e.to_string()))?;

    if !response.status().is_success() {
        return Err(NllbError::DownloadFailed(format!(
            "HTTP {}: {}",
            response.status(),
            url
        )));
    }

    let part_path = path.with_file_name(format!(
        "{}.part",
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("download")
    ));

    let total_size = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;
    let mut last_percent = 0;
    let mut file = std::fs::File::create(&part_path)?;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| NllbError::DownloadFailed(e.to_string()))?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;

        if total_size > 0 {
            let percent = (downloaded as f64 / total_size as f64 * 100.0) as u32;
            if percent >= last_percent + 10 {
                last_percent = percent;
                debug!("Download progress: {}%", percent);
            }
        }
    }

    file.flush()?;
    drop(file);
    std::fs::rename(&part_path, path)?;

    info!("Downloaded: {}", path.display());
    Ok(())
}

/// Delete a downloaded model directory.
pub fn remove_model(dir: &Path) -> Result<bool, NllbError> {
    if !dir.exists() {
        return Ok(false);
    }
    std::fs::remove_dir_all(dir)?;
    info!("Removed model directory: {}", dir.display());
    Ok(true)
}

/// Runtime knobs for the engine.
#[derive(Debug, Clone, Copy)]
pub struct NllbOptions {
    /// Maximum number of generated tokens
    pub max_new_tokens: usize,
    /// ONNX Runtime intra-op threads
    pub intra_threads: usize,
}

impl Default for NllbOptions {
    fn default() -> Self {
        Self {
            max_new_tokens: 200,
            intra_threads: 4,
        }
    }
}

/// NLLB-200 translation engine.
///
/// Sessions sit behind mutexes because a run needs exclusive access; the
/// engine itself is shared through `Arc`.
pub struct NllbEngine {
    encoder: Mutex<Session>,
    decoder: Mutex<Session>,
    tokenizer: Tokenizer,
    eos_id: u32,
    options: NllbOptions,
}

impl NllbEngine {
    /// Load tokenizer and both graphs from `dir`.
    pub fn load(dir: &Path, options: NllbOptions) -> Result<Self, NllbError> {
        info!("Loading NLLB model from: {}", dir.display());

        if !is_model_downloaded(dir) {
            return Err(NllbError::ModelNotDownloaded(dir.to_path_buf()));
        }

        let tokenizer = Tokenizer::from_file(dir.join(TOKENIZER_FILE))
            .map_err(|e| NllbError::Load(format!("tokenizer: {}", e)))?;
        let eos_id = tokenizer
            .token_to_id(EOS_TOKEN)
            .ok_or_else(|| NllbError::Load(format!("tokenizer has no {} token", EOS_TOKEN)))?;

        let start = Instant::now();
        let encoder = build_session(&dir.join(ENCODER_FILE), options.intra_threads)?;
        let decoder = build_session(&dir.join(DECODER_FILE), options.intra_threads)?;

        info!("NLLB model loaded in {}ms", start.elapsed().as_millis());

        Ok(Self {
            encoder: Mutex::new(encoder),
            decoder: Mutex::new(decoder),
            tokenizer,
            eos_id,
            options,
        })
    }

    fn language_id(&self, code: &str) -> Result<u32, NllbError> {
        self.tokenizer
            .token_to_id(code)
            .ok_or_else(|| NllbError::UnknownLanguage(code.to_string()))
    }

    /// Tokenize `text` with the source language prefix and `</s>` suffix.
    fn encode_source(&self, text: &str, src_code: &str) -> Result<Vec<i64>, NllbError> {
        let src_id = self.language_id(src_code)?;
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| NllbError::Tokenizer(e.to_string()))?;

        let mut ids = Vec::with_capacity(encoding.get_ids().len() + 2);
        ids.push(i64::from(src_id));
        ids.extend(encoding.get_ids().iter().map(|&id| i64::from(id)));
        ids.push(i64::from(self.eos_id));

        if ids.len() > MAX_SOURCE_TOKENS {
            return Err(NllbError::InputTooLong(ids.len(), MAX_SOURCE_TOKENS));
        }
        Ok(ids)
    }

    /// Run the encoder, returning the flattened hidden states and their width.
    fn run_encoder(&self, input_ids: &[i64]) -> Result<(Vec<f32>, usize), NllbError> {
        let len = input_ids.len();
        let ids = Tensor::from_array(([1usize, len], input_ids.to_vec())).map_err(inference)?;
        let mask = Tensor::from_array(([1usize, len], vec![1i64; len])).map_err(inference)?;

        let mut session = self
            .encoder
            .lock()
            .map_err(|_| NllbError::Inference("encoder session poisoned".into()))?;
        let outputs = session
            .run(ort::inputs!["input_ids" => ids, "attention_mask" => mask])
            .map_err(inference)?;

        let hidden = outputs
            .get("last_hidden_state")
            .ok_or_else(|| NllbError::Inference("encoder has no last_hidden_state".into()))?;
        let (shape, data) = hidden.try_extract_tensor::<f32>().map_err(inference)?;
        let hidden_dim = shape.last().copied().unwrap_or(0) as usize;
        if hidden_dim == 0 || data.len() != len * hidden_dim {
            return Err(NllbError::Inference(format!(
                "unexpected encoder output shape {:?}",
                shape
            )));
        }

        Ok((data.to_vec(), hidden_dim))
    }

    /// Run the decoder over the prefix and pick the most likely next token.
    fn next_token(
        &self,
        decoder_ids: &[i64],
        hidden: &[f32],
        hidden_dim: usize,
    ) -> Result<i64, NllbError> {
        let dec_len = decoder_ids.len();
        let src_len = hidden.len() / hidden_dim;

        let ids = Tensor::from_array(([1usize, dec_len], decoder_ids.to_vec())).map_err(inference)?;
        let mask = Tensor::from_array(([1usize, src_len], vec![1i64; src_len])).map_err(inference)?;
        let states = Tensor::from_array(([1usize, src_len, hidden_dim], hidden.to_vec()))
            .map_err(inference)?;

        let mut session = self
            .decoder
            .lock()
            .map_err(|_| NllbError::Inference("decoder session poisoned".into()))?;
        let outputs = session
            .run(ort::inputs![
                "input_ids" => ids,
                "encoder_attention_mask" => mask,
                "encoder_hidden_states" => states
            ])
            .map_err(inference)?;

        let logits = outputs
            .get("logits")
            .ok_or_else(|| NllbError::Inference("decoder has no logits output".into()))?;
        let (shape, data) = logits.try_extract_tensor::<f32>().map_err(inference)?;
        let vocab = shape.last().copied().unwrap_or(0) as usize;
        if vocab == 0 || data.len() < dec_len * vocab {
            return Err(NllbError::Inference(format!(
                "unexpected decoder output shape {:?}",
                shape
            )));
        }

        let last = &data[(dec_len - 1) * vocab..dec_len * vocab];
        argmax(last)
            .map(|id| id as i64)
            .ok_or_else(|| NllbError::Inference("empty logits".into()))
    }

    /// Translate `text` between two NLLB language codes.
    pub fn translate_sync(
        &self,
        text: &str,
        src_code: &str,
        tgt_code: &str,
    ) -> Result<String, NllbError> {
        let tgt_id = self.language_id(tgt_code)?;
        let input_ids = self.encode_source(text, src_code)?;
        debug!("Encoded {} source tokens ({})", input_ids.len(), src_code);

        let (hidden, hidden_dim) = self.run_encoder(&input_ids)?;

        let eos = i64::from(self.eos_id);
        let mut decoder_ids: Vec<i64> = vec![eos, i64::from(tgt_id)];
        for _ in 0..self.options.max_new_tokens {
            let next = self.next_token(&decoder_ids, &hidden, hidden_dim)?;
            if next == eos {
                break;
            }
            decoder_ids.push(next);
        }

        let generated: Vec<u32> = decoder_ids[2..].iter().map(|&id| id as u32).collect();
        debug!("Generated {} tokens ({})", generated.len(), tgt_code);

        let translated = self
            .tokenizer
            .decode(&generated, true)
            .map_err(|e| NllbError::Tokenizer(e.to_string()))?;
        Ok(translated.trim().to_string())
    }
}

impl TranslationEngine for NllbEngine {
    fn generate(&self, text: &str, src_code: &str, tgt_code: &str) -> Result<String, TranslationError> {
        self.translate_sync(text, src_code, tgt_code)
            .map_err(TranslationError::from)
    }

    fn name(&self) -> &str {
        "nllb"
    }
}

fn build_session(path: &Path, intra_threads: usize) -> Result<Session, NllbError> {
    debug!("Creating ONNX session for {}", path.display());
    Session::builder()
        .map_err(load_error)?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(load_error)?
        .with_intra_threads(intra_threads)
        .map_err(load_error)?
        .commit_from_file(path)
        .map_err(load_error)
}

fn load_error(e: impl fmt::Display) -> NllbError {
    NllbError::Load(e.to_string())
}

fn inference(e: impl fmt::Display) -> NllbError {
    NllbError::Inference(e.to_string())
}

/// Index of the largest logit.
fn argmax(logits: &[f32]) -> Option<usize> {
    logits
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
}
