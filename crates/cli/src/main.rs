//! Headless ingestion and vault commands: the same four stages the HTTP
//! facade exposes, run one at a time from a terminal. A flat four-command
//! surface since ReMind's CLI has no daemon/interactive mode to dispatch
//! into.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use remind_adapters::{
    DeterministicEmbedder, HttpAudioDecoderAdapter, HttpAudioDecoderConfig, HttpEmbeddingAdapter, HttpEmbeddingConfig,
    HttpFaceRecognitionAdapter, HttpFaceRecognitionConfig, HttpLlmAdapter, HttpLlmConfig, HttpObjectStorageAdapter,
    HttpObjectStoreConfig, HttpVoiceCloneConfig, HttpVoiceCloneRegistry, LocalFsObjectStore, QdrantConfig,
    QdrantVectorStore,
};
use remind_config::{load_settings, Settings};
use remind_core::traits::{
    AudioDecoderAdapter, EmbeddingAdapter, FaceRecognitionAdapter, LlmAdapter, ObjectStorageAdapter, VoiceCloneRegistry,
};
use remind_core::{FaceCluster, RemindError};
use remind_ingestion::IngestionPipeline;
use remind_people::PersonRegistry;
use remind_vault::VaultStore;

#[derive(Debug, Parser)]
#[command(name = "remind-cli", version, about = "Headless ReMind ingestion and vault commands")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extracts and clusters faces from an event's media, writing the
    /// sampled-face review bundle to `<archive>.clusters.json`.
    IngestExtractFaces {
        /// Event name under the configured object store bucket.
        archive: String,
    },
    /// Applies a caregiver-authored `names.json` mapping to a previously
    /// extracted cluster bundle, finalizing the event's `context.json`.
    IngestApplyNames {
        /// Event name; its cluster bundle is read from `<archive>.clusters.json`.
        archive: String,
        /// Path to the caregiver's names.json mapping file.
        names_json: PathBuf,
    },
    /// Walks the object store and writes a metadata CSV to stdout.
    VaultBuildMetadata,
    /// Reads a metadata CSV and upserts every row into the Vault.
    VaultUpload {
        /// Path to a metadata CSV, as produced by `vault-build-metadata`.
        csv: PathBuf,
    },
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "remind_cli=info".into());
    let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
}

fn load_cli_settings() -> Settings {
    let env = std::env::var("REMIND_ENV").unwrap_or_else(|_| "development".to_string());
    load_settings(&env).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load configuration, using built-in defaults");
        Settings::default()
    })
}

fn build_pipeline(settings: &Settings) -> (IngestionPipeline, Arc<VaultStore>) {
    let http = reqwest::Client::new();
    let strict = settings.environment.is_strict();

    let object_store: Arc<dyn ObjectStorageAdapter> = match &settings.object_store.endpoint {
        Some(endpoint) => Arc::new(HttpObjectStorageAdapter::new(
            http.clone(),
            HttpObjectStoreConfig {
                endpoint: endpoint.clone(),
                credentials: settings.object_store.credentials.clone(),
                public_base_url: settings.object_store.public_base_url.clone(),
            },
        )),
        None => {
            if strict {
                tracing::error!("no object store endpoint configured in a strict environment");
            }
            Arc::new(LocalFsObjectStore::new(
                settings.object_store.local_root.clone(),
                settings.object_store.public_base_url.clone(),
            ))
        }
    };

    let face_recognition: Arc<dyn FaceRecognitionAdapter> = Arc::new(HttpFaceRecognitionAdapter::new(
        http.clone(),
        HttpFaceRecognitionConfig {
            endpoint: settings.external_apis.face_recognition_endpoint.clone(),
            api_key: settings.external_apis.face_recognition_api_key.clone(),
        },
    ));
    let audio_decoder: Arc<dyn AudioDecoderAdapter> = Arc::new(HttpAudioDecoderAdapter::new(
        http.clone(),
        HttpAudioDecoderConfig {
            endpoint: settings.external_apis.audio_decoder_endpoint.clone(),
            api_key: settings.external_apis.audio_decoder_api_key.clone(),
        },
    ));
    let llm: Arc<dyn LlmAdapter> = Arc::new(HttpLlmAdapter::new(
        http.clone(),
        HttpLlmConfig {
            endpoint: settings.llm.endpoint.clone(),
            model: settings.llm.model.clone(),
            api_key: settings.llm.api_key.clone(),
            ..HttpLlmConfig::default()
        },
    ));
    let voice_clone_registry: Arc<dyn VoiceCloneRegistry> = Arc::new(HttpVoiceCloneRegistry::new(
        http.clone(),
        HttpVoiceCloneConfig {
            endpoint: settings.external_apis.voice_clone_endpoint.clone(),
            api_key: settings.external_apis.voice_clone_api_key.clone(),
        },
    ));
    let person_registry = Arc::new(PersonRegistry::new());
    let bucket = settings.object_store.bucket.clone().unwrap_or_else(|| "remind".to_string());

    let pipeline = IngestionPipeline::new(
        object_store,
        face_recognition,
        audio_decoder,
        llm,
        voice_clone_registry,
        person_registry,
        bucket,
    );

    let embedder: Arc<dyn EmbeddingAdapter> = if !strict && settings.embedding.api_key.is_none() {
        Arc::new(DeterministicEmbedder {
            dimension: settings.embedding.dimension,
        })
    } else {
        Arc::new(HttpEmbeddingAdapter::new(
            http.clone(),
            HttpEmbeddingConfig {
                endpoint: settings.embedding.endpoint.clone(),
                model_name: settings.embedding.model_name.clone(),
                dimension: settings.embedding.dimension,
                api_key: settings.embedding.api_key.clone(),
            },
        ))
    };
    let vector_store = match QdrantVectorStore::new(QdrantConfig {
        endpoint: settings.vector_store.endpoint.clone(),
        collection: settings.vector_store.collection.clone(),
        vector_dim: settings.embedding.dimension,
        api_key: settings.vector_store.api_key.clone(),
    }) {
        Ok(store) => Arc::new(store) as Arc<dyn remind_core::traits::VectorStoreAdapter>,
        Err(e) => {
            tracing::warn!(error = %e, "failed to construct qdrant client, falling back to in-memory vector store");
            Arc::new(remind_core::traits::vector_store::fixtures::InMemoryVectorStore::new())
        }
    };
    let vault = Arc::new(VaultStore::new(embedder, vector_store));

    (pipeline, vault)
}

/// Exit codes: `0` success, `1` input error, `2` external dependency
/// failure, `3` internal invariant violation.
fn exit_code_for(err: &RemindError) -> ExitCode {
    match err {
        RemindError::InputError(_) | RemindError::NotFound(_) => ExitCode::from(1),
        RemindError::RetrievalUnavailable(_)
        | RemindError::NarrationUnavailable(_)
        | RemindError::ComposeFailed(_)
        | RemindError::TtsUnavailable(_)
        | RemindError::LipSyncUnavailable(_)
        | RemindError::ExternalUnavailable(_)
        | RemindError::QuotaExceeded(_)
        | RemindError::Timeout(_) => ExitCode::from(2),
        RemindError::InvariantViolation(_) => ExitCode::from(3),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let settings = load_cli_settings();

    let result = match cli.command {
        Commands::IngestExtractFaces { archive } => ingest_extract_faces(&settings, &archive).await,
        Commands::IngestApplyNames { archive, names_json } => ingest_apply_names(&settings, &archive, &names_json).await,
        Commands::VaultBuildMetadata => vault_build_metadata(&settings).await,
        Commands::VaultUpload { csv } => vault_upload(&settings, &csv).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            match e.downcast_ref::<RemindError>() {
                Some(remind_error) => exit_code_for(remind_error),
                None => ExitCode::from(1),
            }
        }
    }
}

async fn ingest_extract_faces(settings: &Settings, archive: &str) -> anyhow::Result<()> {
    let (pipeline, _vault) = build_pipeline(settings);
    let clusters = pipeline.extract_faces(archive).await?;
    let bundle_path = format!("{archive}.clusters.json");
    std::fs::write(&bundle_path, serde_json::to_string_pretty(&clusters)?)?;
    println!("wrote {} sampled face clusters to {bundle_path}", clusters.len());
    Ok(())
}

async fn ingest_apply_names(settings: &Settings, archive: &str, names_json_path: &PathBuf) -> anyhow::Result<()> {
    let (pipeline, _vault) = build_pipeline(settings);

    let bundle_path = format!("{archive}.clusters.json");
    let clusters_text = std::fs::read_to_string(&bundle_path).map_err(|e| {
        RemindError::InputError(format!(
            "could not read cluster bundle {bundle_path} (run ingest-extract-faces first): {e}"
        ))
    })?;
    let clusters: Vec<FaceCluster> = serde_json::from_str(&clusters_text)
        .map_err(|e| RemindError::InputError(format!("malformed cluster bundle {bundle_path}: {e}")))?;

    let names_text = std::fs::read_to_string(names_json_path)
        .map_err(|e| RemindError::InputError(format!("could not read names.json: {e}")))?;
    let names_json: serde_json::Value = serde_json::from_str(&names_text)
        .map_err(|e| RemindError::InputError(format!("malformed names.json: {e}")))?;

    let context = pipeline.apply_names(archive, &clusters, &names_json, None).await?;
    println!("{}", serde_json::to_string_pretty(&context)?);
    Ok(())
}

async fn vault_build_metadata(settings: &Settings) -> anyhow::Result<()> {
    let (pipeline, _vault) = build_pipeline(settings);
    let rows = pipeline.build_metadata().await?;
    let csv = remind_ingestion::write_metadata_csv(&rows)?;
    print!("{csv}");
    Ok(())
}

async fn vault_upload(settings: &Settings, csv_path: &PathBuf) -> anyhow::Result<()> {
    let (pipeline, vault) = build_pipeline(settings);
    let csv_text =
        std::fs::read_to_string(csv_path).map_err(|e| RemindError::InputError(format!("could not read CSV: {e}")))?;
    let rows = remind_ingestion::read_metadata_csv(&csv_text)?;
    let count = pipeline.upload_metadata(&vault, rows).await?;
    println!("upserted {count} records");
    Ok(())
}
