//! Default values shared across the system's components. Centralized so
//! every crate reads the same number instead of re-declaring a magic
//! constant.

/// Cache Layer (C10) defaults.
pub mod cache {
    pub const DEFAULT_TTL_MINUTES: i64 = 30;
}

/// Conversation History (C7) defaults.
pub mod history {
    pub const DEFAULT_WINDOW_TURNS: usize = 10;
    pub const DEFAULT_TTL_HOURS: i64 = 24;
    pub const MAX_CONTEXT_TURNS: usize = 6;
    pub const MAX_ANTI_REPEAT_TURNS: usize = 3;
}

/// Retrieval Engine (C4) defaults.
pub mod retrieval {
    pub const SIMILARITY_FLOOR: f32 = 0.30;
    pub const MIN_RESULTS: usize = 3;
    pub const DEFAULT_TOP_K: usize = 5;
}

/// Narration Builder (C6) defaults.
pub mod narration {
    pub const TEMPERATURE: f32 = 0.9;
    pub const MAX_TOKENS: u32 = 400;
    pub const TARGET_WORDS_MIN: usize = 60;
    pub const TARGET_WORDS_MAX: usize = 120;
    pub const NEAR_DUPLICATE_OVERLAP_THRESHOLD: f32 = 0.80;
}

/// Ingestion Pipeline (C3) defaults.
pub mod ingestion {
    pub const VIDEO_SAMPLE_FPS: f32 = 1.0;
    pub const FACE_CLUSTER_EPS: f32 = 0.4;
    pub const FACE_CLUSTER_MIN_SAMPLES: usize = 1;
    pub const MAX_SAMPLED_FACES: usize = 16;
    pub const MAX_EXEMPLARS_PER_PERSON: usize = 3;
    pub const CONTEXT_GENERATION_CONCURRENCY: usize = 2;
    /// Fraction of the detected bounding box's larger side added as padding
    /// on every edge before cropping a face sample.
    pub const FACE_CROP_MARGIN_RATIO: f32 = 0.4;
}

/// Intent/Display Classifier (C5) defaults.
pub mod classifier {
    pub const LLM_TEMPERATURE: f32 = 0.0;
    pub const LLM_MAX_TOKENS: u32 = 16;
}

/// Adapter call timeouts, in seconds.
pub mod timeouts {
    pub const EMBEDDING_SECS: u64 = 10;
    pub const VECTOR_SEARCH_SECS: u64 = 10;
    pub const LLM_GENERATE_SECS: u64 = 60;
    pub const TTS_SECS: u64 = 60;
    pub const LIPSYNC_SECS: u64 = 120;
    pub const STT_SECS: u64 = 60;
}

/// Well-known service endpoints used as configuration defaults.
pub mod endpoints {
    pub const QDRANT_DEFAULT: &str = "http://localhost:6334";
}
