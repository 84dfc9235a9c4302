use crate::constants;
use crate::error::ConfigError;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// The deployment environment, read from `REMIND_ENV` (default
/// `development`). `is_strict` governs whether missing external
/// credentials are a hard startup error or a warning with an in-memory
/// adapter fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, RuntimeEnvironment::Production)
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, RuntimeEnvironment::Production | RuntimeEnvironment::Staging)
    }
}

impl Default for RuntimeEnvironment {
    fn default() -> Self {
        RuntimeEnvironment::Development
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

fn default_vector_store_endpoint() -> String {
    constants::endpoints::QDRANT_DEFAULT.to_string()
}

fn default_vector_store_collection() -> String {
    "remind_memories".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreSettings {
    #[serde(default = "default_vector_store_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_vector_store_collection")]
    pub collection: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            endpoint: default_vector_store_endpoint(),
            collection: default_vector_store_collection(),
            api_key: None,
        }
    }
}

fn default_object_store_local_root() -> String {
    "./data/object_store".to_string()
}

fn default_object_store_public_base_url() -> String {
    "http://localhost:8080/media".to_string()
}

/// Object storage is an external collaborator; in non-strict environments
/// without a configured `endpoint`, the server falls back to
/// [`remind_adapters::LocalFsObjectStore`] rooted at `local_root` so the
/// whole pipeline is runnable without a live bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreSettings {
    pub bucket: Option<String>,
    pub credentials: Option<String>,
    pub endpoint: Option<String>,
    #[serde(default = "default_object_store_local_root")]
    pub local_root: String,
    #[serde(default = "default_object_store_public_base_url")]
    pub public_base_url: String,
}

impl Default for ObjectStoreSettings {
    fn default() -> Self {
        Self {
            bucket: None,
            credentials: None,
            endpoint: None,
            local_root: default_object_store_local_root(),
            public_base_url: default_object_store_public_base_url(),
        }
    }
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_endpoint() -> String {
    "http://localhost:11434".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_llm_model(),
            endpoint: default_llm_endpoint(),
        }
    }
}

fn default_embed_model_name() -> String {
    "sentence-embed-768".to_string()
}

fn default_embed_endpoint() -> String {
    "http://localhost:8900".to_string()
}

fn default_embed_dimension() -> usize {
    768
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    #[serde(default = "default_embed_model_name")]
    pub model_name: String,
    #[serde(default = "default_embed_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_embed_dimension")]
    pub dimension: usize,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model_name: default_embed_model_name(),
            endpoint: default_embed_endpoint(),
            dimension: default_embed_dimension(),
            api_key: None,
        }
    }
}

fn default_tts_endpoint() -> String {
    "http://localhost:9000".to_string()
}
fn default_lipsync_endpoint() -> String {
    "http://localhost:9100".to_string()
}
fn default_sfx_endpoint() -> String {
    "http://localhost:9200".to_string()
}
fn default_stt_endpoint() -> String {
    "http://localhost:9300".to_string()
}
fn default_voice_clone_endpoint() -> String {
    "http://localhost:9400".to_string()
}
fn default_face_recognition_endpoint() -> String {
    "http://localhost:9500".to_string()
}
fn default_audio_decoder_endpoint() -> String {
    "http://localhost:9600".to_string()
}

/// Endpoints and credentials for the remaining external adapters (C1) not
/// already covered by `VectorStoreSettings`/`LlmSettings`/`EmbeddingSettings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalApiSettings {
    #[serde(default = "default_tts_endpoint")]
    pub tts_endpoint: String,
    pub tts_api_key: Option<String>,
    #[serde(default = "default_lipsync_endpoint")]
    pub lipsync_endpoint: String,
    pub lipsync_api_key: Option<String>,
    #[serde(default = "default_sfx_endpoint")]
    pub sfx_endpoint: String,
    pub sfx_api_key: Option<String>,
    #[serde(default = "default_stt_endpoint")]
    pub stt_endpoint: String,
    pub stt_api_key: Option<String>,
    #[serde(default = "default_voice_clone_endpoint")]
    pub voice_clone_endpoint: String,
    pub voice_clone_api_key: Option<String>,
    #[serde(default = "default_face_recognition_endpoint")]
    pub face_recognition_endpoint: String,
    pub face_recognition_api_key: Option<String>,
    #[serde(default = "default_audio_decoder_endpoint")]
    pub audio_decoder_endpoint: String,
    pub audio_decoder_api_key: Option<String>,
}

impl Default for ExternalApiSettings {
    fn default() -> Self {
        Self {
            tts_endpoint: default_tts_endpoint(),
            tts_api_key: None,
            lipsync_endpoint: default_lipsync_endpoint(),
            lipsync_api_key: None,
            sfx_endpoint: default_sfx_endpoint(),
            sfx_api_key: None,
            stt_endpoint: default_stt_endpoint(),
            stt_api_key: None,
            voice_clone_endpoint: default_voice_clone_endpoint(),
            voice_clone_api_key: None,
            face_recognition_endpoint: default_face_recognition_endpoint(),
            face_recognition_api_key: None,
            audio_decoder_endpoint: default_audio_decoder_endpoint(),
            audio_decoder_api_key: None,
        }
    }
}

fn default_cache_ttl_minutes() -> i64 {
    constants::cache::DEFAULT_TTL_MINUTES
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_ttl_minutes")]
    pub ttl_minutes: i64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_minutes: default_cache_ttl_minutes(),
        }
    }
}

fn default_history_window_turns() -> usize {
    constants::history::DEFAULT_WINDOW_TURNS
}

fn default_history_ttl_hours() -> i64 {
    constants::history::DEFAULT_TTL_HOURS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySettings {
    #[serde(default = "default_history_window_turns")]
    pub window_turns: usize,
    #[serde(default = "default_history_ttl_hours")]
    pub ttl_hours: i64,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            window_turns: default_history_window_turns(),
            ttl_hours: default_history_ttl_hours(),
        }
    }
}

/// Process-wide configuration, loaded once at startup and treated as
/// read-only thereafter (no locks needed on the value itself; the server
/// wraps it in `Arc` for the handful of admin surfaces that may reload it).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub vector_store: VectorStoreSettings,
    #[serde(default)]
    pub object_store: ObjectStoreSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub embedding: EmbeddingSettings,
    #[serde(default)]
    pub external_apis: ExternalApiSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub history: HistorySettings,
}

/// Loads `Settings` layered `environment > config/{env}.yaml >
/// config/default.yaml > built-in defaults`, mirroring the precedence used
/// throughout the example corpus's `load_settings`.
pub fn load_settings(env: &str) -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{env}")).required(false))
        .add_source(
            Environment::with_prefix("REMIND")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;
    config.try_deserialize().map_err(ConfigError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.cache.ttl_minutes, 30);
        assert_eq!(settings.history.window_turns, 10);
        assert_eq!(settings.history.ttl_hours, 24);
    }

    #[test]
    fn load_settings_falls_back_to_defaults_when_no_files_present() {
        let settings = load_settings("development").expect("env source always succeeds");
        assert_eq!(settings.environment, RuntimeEnvironment::Development);
    }
}
