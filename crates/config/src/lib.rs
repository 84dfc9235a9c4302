//! Process-wide configuration (C12). A single `Settings` record, loaded
//! once at startup from environment variables layered over optional YAML
//! files, and treated as read-only for the remainder of the process.

pub mod constants;
pub mod error;
pub mod settings;

pub use error::ConfigError;
pub use settings::{
    load_settings, CacheSettings, EmbeddingSettings, ExternalApiSettings, HistorySettings,
    LlmSettings, ObjectStoreSettings, RuntimeEnvironment, ServerSettings, Settings,
    VectorStoreSettings,
};
