use anyhow::Context;
use clap::{Parser, Subcommand};
use describe_this::api::{self, ApiState};
use describe_this::caption::{resolve_caption, PlaceholderCaptioner};
use describe_this::config::{self, Config};
use describe_this::dataset::{Category, Contributor, DatasetStore, SubmissionRecord};
use describe_this::translation::{
    download_nllb_model, is_nllb_downloaded, remove_nllb_model, Language, NllbModel,
    SharedTranslator,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "describe-this")]
#[command(author, version, about = "Collect captioned images for a multilingual dataset", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Dataset directory (overrides dataset.dir from the config file)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the dataset CSV and image directory
    Init,

    /// Record one submission
    Submit {
        /// Contributor name
        #[arg(long)]
        name: String,

        /// Contributor email
        #[arg(long)]
        email: String,

        /// Contributor location
        #[arg(long)]
        location: String,

        /// Consent to use the data for open-source AI research
        #[arg(long)]
        consent: bool,

        /// Image file
        #[arg(long, value_name = "FILE")]
        image: PathBuf,

        #[arg(long, default_value = "")]
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Image category (e.g. "Festival", "street-scene")
        #[arg(long, default_value = "Other")]
        category: Category,

        /// Latitude in degrees
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        lat: f64,

        /// Longitude in degrees
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        lon: f64,

        /// Caption in the contributor's language
        #[arg(long)]
        caption: Option<String>,

        /// Use the placeholder caption when --caption is not given
        #[arg(long)]
        generate_caption: bool,

        /// Translate the caption and store the result
        #[arg(long)]
        translate: bool,

        /// Caption language (default: translation.source_language)
        #[arg(long)]
        source_lang: Option<String>,

        /// Translation target (default: translation.target_language)
        #[arg(long)]
        target_lang: Option<String>,

        /// Model directory (overrides translation.model_dir)
        #[arg(long, value_name = "DIR")]
        model_dir: Option<String>,
    },

    /// Translate a caption
    Translate {
        /// Text to translate
        text: String,

        /// Source language display name (default: translation.source_language)
        #[arg(long)]
        from: Option<String>,

        /// Target language display name (default: translation.target_language)
        #[arg(long)]
        to: Option<String>,

        /// Model directory (overrides translation.model_dir)
        #[arg(long, value_name = "DIR")]
        model_dir: Option<String>,
    },

    /// Write the dataset CSV to stdout or a file
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List caption languages
    Languages,

    /// List image categories
    Categories,

    /// Configure settings
    Config {
        /// Set the dataset directory
        #[arg(long)]
        dataset_dir: Option<String>,

        /// Set the translation model (600m, 600m-quantized)
        #[arg(long)]
        model: Option<String>,

        /// Set the default source language
        #[arg(long)]
        source_language: Option<String>,

        /// Set the default target language
        #[arg(long)]
        target_language: Option<String>,

        /// Name stored images <uuid>.png regardless of format (true/false)
        #[arg(long)]
        legacy_png_suffix: Option<bool>,

        /// Set the API bind address
        #[arg(long)]
        bind: Option<String>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },

    /// Manage translation models
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Run the REST API server
    Serve {
        /// Bind address (overrides api.bind)
        #[arg(long)]
        bind: Option<String>,
    },
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download a model
    Download {
        /// Model name (600m, 600m-quantized; default: translation.model)
        name: Option<String>,
    },

    /// Show which models are downloaded
    Status,

    /// Remove a downloaded model
    Remove {
        /// Model name
        name: String,
    },
}

fn init_logging(verbose: bool, level: &str) {
    let filter = if verbose {
        EnvFilter::new("describe_this=debug,ort=warn")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("describe_this={},ort=warn", level)))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Directory of `model`: the configured override applies to the configured model only.
fn model_dir_for(config: &Config, model: NllbModel) -> anyhow::Result<PathBuf> {
    let mut translation = config.translation.clone();
    if translation.nllb_model()? != model {
        translation.model = model.name().to_string();
        translation.model_dir = None;
    }
    Ok(translation.resolved_model_dir()?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(dir) = cli.data_dir {
        config.dataset.dir = dir.display().to_string();
    }
    init_logging(cli.verbose, &config.logging.level);

    match cli.command {
        Commands::Init => {
            let store = DatasetStore::from_config(&config.dataset);
            if store.initialize()? {
                println!("Created {}", store.csv_path().display());
            } else {
                println!("Dataset already exists: {}", store.csv_path().display());
            }
        }

        Commands::Submit {
            name,
            email,
            location,
            consent,
            image,
            title,
            description,
            category,
            lat,
            lon,
            caption,
            generate_caption,
            translate,
            source_lang,
            target_lang,
            model_dir,
        } => {
            let bytes = std::fs::read(&image)
                .with_context(|| format!("Failed to read image {}", image.display()))?;

            let caption = resolve_caption(
                caption.as_deref(),
                generate_caption,
                &PlaceholderCaptioner,
                &bytes,
            );

            let mut record = SubmissionRecord {
                contributor: Contributor {
                    name,
                    email,
                    location,
                },
                consent,
                title,
                description,
                category,
                latitude: lat,
                longitude: lon,
                caption,
                translated_caption: String::new(),
            };

            let store = DatasetStore::from_config(&config.dataset);
            store.validate(&record, &bytes)?;

            if translate && !record.caption.is_empty() {
                if model_dir.is_some() {
                    config.translation.model_dir = model_dir;
                }
                let source = source_lang
                    .unwrap_or_else(|| config.translation.source_language.clone());
                let target = target_lang
                    .unwrap_or_else(|| config.translation.target_language.clone());
                record.translated_caption = SharedTranslator::global()
                    .get_or_load_nllb(&config.translation)?
                    .translate(&record.caption, &source, &target)?;
            }

            let stored = store.append_record(&record, &bytes)?;
            println!(
                "Stored submission {} (row {}): {}",
                stored.image_ref,
                stored.row_index,
                stored.image_path.display()
            );
            if !record.translated_caption.is_empty() {
                println!("Translated caption: {}", record.translated_caption);
            }
        }

        Commands::Translate {
            text,
            from,
            to,
            model_dir,
        } => {
            if model_dir.is_some() {
                config.translation.model_dir = model_dir;
            }
            let source = from.unwrap_or_else(|| config.translation.source_language.clone());
            let target = to.unwrap_or_else(|| config.translation.target_language.clone());
            let translated = SharedTranslator::global()
                .get_or_load_nllb(&config.translation)?
                .translate(&text, &source, &target)?;
            println!("{}", translated);
        }

        Commands::Export { output } => {
            let store = DatasetStore::from_config(&config.dataset);
            let bytes = store.export()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &bytes)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Exported {} bytes to {}", bytes.len(), path.display());
                }
                None => std::io::stdout().write_all(&bytes)?,
            }
        }

        Commands::Languages => {
            for language in Language::ALL {
                println!("{:<10} {}", language.display_name(), language.nllb_code());
            }
        }

        Commands::Categories => {
            for category in Category::ALL {
                println!("{}", category);
            }
        }

        Commands::Config {
            dataset_dir,
            model,
            source_language,
            target_language,
            legacy_png_suffix,
            bind,
            show,
        } => {
            if show {
                config::show()?;
            } else {
                config::update(
                    dataset_dir,
                    model,
                    source_language,
                    target_language,
                    legacy_png_suffix,
                    bind,
                )?;
            }
        }

        Commands::Model { action } => match action {
            ModelAction::Download { name } => {
                let model: NllbModel = name
                    .unwrap_or_else(|| config.translation.model.clone())
                    .parse()
                    .map_err(anyhow::Error::msg)?;
                let dir = model_dir_for(&config, model)?;
                if is_nllb_downloaded(&dir) {
                    println!("Model {} already downloaded: {}", model, dir.display());
                } else {
                    println!(
                        "Downloading {} ({}, ~{} MB) to {}",
                        model,
                        model.hf_model_id(),
                        model.size_mb(),
                        dir.display()
                    );
                    download_nllb_model(model, &dir).await?;
                    println!("Model {} ready.", model);
                }
            }
            ModelAction::Status => {
                for model in NllbModel::ALL {
                    let dir = model_dir_for(&config, model)?;
                    let state = if is_nllb_downloaded(&dir) {
                        "downloaded"
                    } else {
                        "not downloaded"
                    };
                    println!(
                        "{:<16} ~{:>5} MB  {:<15} {}",
                        model.name(),
                        model.size_mb(),
                        state,
                        dir.display()
                    );
                }
            }
            ModelAction::Remove { name } => {
                let model: NllbModel = name.parse().map_err(anyhow::Error::msg)?;
                let dir = model_dir_for(&config, model)?;
                if remove_nllb_model(&dir)? {
                    println!("Removed model {}", model);
                } else {
                    println!("Model {} is not downloaded", model);
                }
            }
        },

        Commands::Serve { bind } => {
            if let Some(addr) = bind {
                config.api.bind = addr;
            }
            let store = DatasetStore::from_config(&config.dataset);
            store.initialize()?;
            info!("Dataset: {}", store.csv_path().display());

            let state = ApiState::new(
                Arc::new(store),
                SharedTranslator::global(),
                config.translation.clone(),
            );
            api::serve(state, &config.api).await?;
        }
    }

    Ok(())
}
