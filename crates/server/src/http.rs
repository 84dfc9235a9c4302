//! The HTTP Facade (C11): routes, shape validation, error translation — no
//! business rules. Every handler deserializes its input, calls exactly one
//! business-layer method, and wraps the result. CORS/trace/compression are
//! layered outside `with_state`; handlers take `State<AppState>` plus
//! `Path`/`Json`/`Query` extractors.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use remind_core::traits::{SfxParams, VectorFilter};
use remind_core::{normalize_topic, DisplayPacket, RemindError};
use remind_experience::ComposeRequest;
use remind_history::ResetOptions;
use remind_ingestion::MetadataRow;
use remind_runtime::QueryRequest;
use serde::{Deserialize, Serialize};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Debug, Serialize)]
struct SuccessBody<T: Serialize> {
    status: &'static str,
    #[serde(flatten)]
    data: T,
}

fn ok<T: Serialize>(data: T) -> Json<SuccessBody<T>> {
    Json(SuccessBody { status: "success", data })
}

pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.settings.server.cors_allowed_origins);

    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/ingestion/extract-faces/:event_name", post(ingestion_extract_faces))
        .route("/ingestion/apply-names/:event_name", post(ingestion_apply_names))
        .route("/vault/health", get(vault_health))
        .route("/vault/count", get(vault_count))
        .route("/vault/build-metadata", post(vault_build_metadata))
        .route("/vault/upload-metadata", post(vault_upload_metadata))
        .route("/retrieval/search", post(retrieval_search_post))
        .route("/retrieval/search", get(retrieval_search_get))
        .route("/experience", post(experience_create))
        .route("/experience", get(experience_list))
        .route("/experience/:experience_id", get(experience_get_by_id))
        .route("/experience/by-topic/:title", get(experience_get_by_topic))
        .route("/patient/query", post(patient_query_text))
        .route("/patient/query/audio", post(patient_query_audio))
        .route("/adapters/transcribe", post(transcribe_passthrough))
        .route("/adapters/tts", post(tts_passthrough))
        .route("/adapters/lipsync", post(lipsync_passthrough))
        .route("/adapters/sfx", post(sfx_passthrough))
        .route("/history/:patient_id/:topic", get(history_get))
        .route("/history/:patient_id/:topic/stats", get(history_stats))
        .route("/history/:patient_id/:topic/reset", post(history_reset))
        .route("/history/:patient_id/:topic/export", get(history_export))
        .route("/cache/stats", get(cache_stats))
        .route("/cache/clear", post(cache_clear))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

/// An empty configured origin list permits any origin (development
/// default); a populated one is parsed into exact-match `HeaderValue`s.
fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(tower_http::cors::Any);
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// Liveness says the process is up; readiness says the Vault's backing
/// vector store answers. A single cheap `count()` call is the adapter
/// probe, one lightweight dependency check rather than pinging every
/// adapter.
async fn ready(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.vault.count().await?;
    Ok(StatusCode::OK)
}

// ---- Ingestion (C3) ----

async fn ingestion_extract_faces(
    State(state): State<AppState>,
    Path(event_name): Path<String>,
) -> Result<Json<SuccessBody<serde_json::Value>>, ApiError> {
    let clusters = state.ingestion.extract_faces(&event_name).await?;
    Ok(ok(serde_json::json!({ "clusters": clusters })))
}

#[derive(Debug, Deserialize)]
struct ApplyNamesRequest {
    clusters: Vec<remind_core::FaceCluster>,
    names: serde_json::Value,
    #[serde(default)]
    event_summary: Option<String>,
}

async fn ingestion_apply_names(
    State(state): State<AppState>,
    Path(event_name): Path<String>,
    Json(body): Json<ApplyNamesRequest>,
) -> Result<Json<SuccessBody<remind_core::ContextFile>>, ApiError> {
    let context = state
        .ingestion
        .apply_names(&event_name, &body.clusters, &body.names, body.event_summary)
        .await?;
    Ok(ok(context))
}

// ---- Vault (C2) ----

async fn vault_health(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.vault.count().await?;
    Ok(StatusCode::OK)
}

async fn vault_count(State(state): State<AppState>) -> Result<Json<SuccessBody<serde_json::Value>>, ApiError> {
    let count = state.vault.count().await?;
    Ok(ok(serde_json::json!({ "count": count })))
}

async fn vault_build_metadata(
    State(state): State<AppState>,
) -> Result<Json<SuccessBody<serde_json::Value>>, ApiError> {
    let rows = state.ingestion.build_metadata().await?;
    let csv = remind_ingestion::write_metadata_csv(&rows)?;
    Ok(ok(serde_json::json!({ "rows": rows.len(), "csv": csv })))
}

#[derive(Debug, Deserialize)]
struct UploadMetadataRequest {
    csv: String,
}

async fn vault_upload_metadata(
    State(state): State<AppState>,
    Json(body): Json<UploadMetadataRequest>,
) -> Result<Json<SuccessBody<serde_json::Value>>, ApiError> {
    let rows: Vec<MetadataRow> = remind_ingestion::read_metadata_csv(&body.csv)?;
    let count = state.ingestion.upload_metadata(&state.vault, rows).await?;
    Ok(ok(serde_json::json!({ "upserted": count })))
}

// ---- Retrieval (C4) ----

#[derive(Debug, Deserialize)]
struct RetrievalSearchRequest {
    query: String,
    #[serde(default)]
    k: Option<usize>,
    #[serde(default)]
    event_name: Option<String>,
    #[serde(default)]
    people: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RetrievalSearchQuery {
    query: String,
    #[serde(default)]
    k: Option<usize>,
}

async fn retrieval_search_post(
    State(state): State<AppState>,
    Json(body): Json<RetrievalSearchRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let filter = if body.event_name.is_some() || !body.people.is_empty() {
        Some(VectorFilter {
            event_name: body.event_name,
            people: body.people,
        })
    } else {
        None
    };
    let result = state
        .retrieval
        .retrieve(&body.query, body.k.unwrap_or(remind_config::constants::retrieval::DEFAULT_TOP_K), filter)
        .await?;
    Ok(Json(retrieval_response_json(&result)))
}

async fn retrieval_search_get(
    State(state): State<AppState>,
    Query(params): Query<RetrievalSearchQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = state
        .retrieval
        .retrieve(&params.query, params.k.unwrap_or(remind_config::constants::retrieval::DEFAULT_TOP_K), None)
        .await?;
    Ok(Json(retrieval_response_json(&result)))
}

fn retrieval_response_json(result: &remind_retrieval::RetrievalResult) -> serde_json::Value {
    let memories: Vec<serde_json::Value> = result
        .memories
        .iter()
        .map(|m| {
            serde_json::json!({
                "event_name": m.record.event_name,
                "file_name": m.record.file_name,
                "file_type": m.record.file_type,
                "description": m.record.description,
                "people": m.record.people,
                "event_summary": m.record.event_summary,
                "file_url": m.record.file_url,
                "similarity": m.similarity,
            })
        })
        .collect();
    serde_json::json!({
        "status": "success",
        "query": result.query,
        "answer": result.answer,
        "memories": memories,
        "model_used": result.model_used,
    })
}

// ---- Experience (C8) ----

async fn experience_create(
    State(state): State<AppState>,
    Json(request): Json<ComposeRequest>,
) -> Result<Json<SuccessBody<remind_core::Experience>>, ApiError> {
    let experience = state.experience_composer.compose(request).await?;
    Ok(ok(experience))
}

async fn experience_list(
    State(state): State<AppState>,
) -> Result<Json<SuccessBody<Vec<remind_core::Experience>>>, ApiError> {
    Ok(ok(state.experience_store.list()))
}

async fn experience_get_by_id(
    State(state): State<AppState>,
    Path(experience_id): Path<String>,
) -> Result<Json<SuccessBody<remind_core::Experience>>, ApiError> {
    let experience = state
        .experience_store
        .get(&experience_id)
        .ok_or_else(|| RemindError::NotFound(format!("no experience with id {experience_id}")))?;
    Ok(ok(experience))
}

async fn experience_get_by_topic(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> Result<Json<SuccessBody<remind_core::Experience>>, ApiError> {
    let experience = state
        .experience_store
        .get_by_topic(&title)
        .ok_or_else(|| RemindError::NotFound(format!("no experience with title {title}")))?;
    Ok(ok(experience))
}

// ---- Patient Query Runtime (C9) ----

#[derive(Debug, Deserialize)]
struct PatientQueryTextRequest {
    transcript: String,
    topic: String,
    #[serde(default)]
    patient_id: Option<String>,
}

async fn patient_query_text(
    State(state): State<AppState>,
    Json(body): Json<PatientQueryTextRequest>,
) -> Result<Json<SuccessBody<DisplayPacket>>, ApiError> {
    let packet = state
        .runtime
        .query(QueryRequest {
            audio: None,
            transcript: Some(body.transcript),
            topic: normalize_topic(&body.topic),
            patient_id: body.patient_id.unwrap_or_else(|| "anonymous".to_string()),
        })
        .await?;
    Ok(ok(packet))
}

/// Multipart form carrying `audio_file`, `topic`, and an optional
/// `patient_id` field, per the bit-exact contract.
async fn patient_query_audio(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SuccessBody<DisplayPacket>>, ApiError> {
    let mut audio: Option<Vec<u8>> = None;
    let mut topic: Option<String> = None;
    let mut patient_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RemindError::InputError(format!("malformed multipart body: {e}")))?
    {
        match field.name().unwrap_or_default() {
            "audio_file" => {
                audio = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| RemindError::InputError(format!("malformed audio_file field: {e}")))?
                        .to_vec(),
                );
            }
            "topic" => {
                topic = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| RemindError::InputError(format!("malformed topic field: {e}")))?,
                );
            }
            "patient_id" => {
                patient_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| RemindError::InputError(format!("malformed patient_id field: {e}")))?,
                );
            }
            _ => {}
        }
    }

    let topic = topic.ok_or_else(|| RemindError::InputError("patient query requires a topic field".to_string()))?;

    let packet = state
        .runtime
        .query(QueryRequest {
            audio,
            transcript: None,
            topic: normalize_topic(&topic),
            patient_id: patient_id.unwrap_or_else(|| "anonymous".to_string()),
        })
        .await?;
    Ok(ok(packet))
}

// ---- Adapter passthroughs ----

async fn transcribe_passthrough(
    State(state): State<AppState>,
    body: axum::body::Bytes,
) -> Result<Json<SuccessBody<serde_json::Value>>, ApiError> {
    let transcript = state.stt.transcribe(&body).await?;
    Ok(ok(serde_json::json!({ "transcript": transcript })))
}

#[derive(Debug, Deserialize)]
struct TtsRequest {
    text: String,
    voice_name: String,
}

async fn tts_passthrough(
    State(state): State<AppState>,
    Json(body): Json<TtsRequest>,
) -> Result<Vec<u8>, ApiError> {
    Ok(state.tts.synthesize(&body.text, &body.voice_name).await?)
}

#[derive(Debug, Deserialize)]
struct LipSyncRequest {
    image_or_video_url: String,
    /// base64-encoded audio; the facade does no business-logic decoding,
    /// only shape validation, so this stays a plain passthrough field.
    audio_base64: String,
}

async fn lipsync_passthrough(
    State(state): State<AppState>,
    Json(body): Json<LipSyncRequest>,
) -> Result<Json<SuccessBody<serde_json::Value>>, ApiError> {
    use base64::Engine;
    let audio = base64::engine::general_purpose::STANDARD
        .decode(&body.audio_base64)
        .map_err(|e| RemindError::InputError(format!("malformed audio_base64: {e}")))?;
    let video_url = state.lipsync.generate(&body.image_or_video_url, audio).await?;
    Ok(ok(serde_json::json!({ "video_url": video_url })))
}

#[derive(Debug, Deserialize)]
struct SfxRequest {
    prompt: String,
    duration_s: f32,
    prompt_influence: f32,
}

async fn sfx_passthrough(State(state): State<AppState>, Json(body): Json<SfxRequest>) -> Result<Vec<u8>, ApiError> {
    Ok(state
        .sfx
        .generate(
            &body.prompt,
            SfxParams {
                duration_s: body.duration_s,
                prompt_influence: body.prompt_influence,
            },
        )
        .await?)
}

// ---- Conversation History (C7) ----

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    #[serde(default)]
    max_turns: Option<usize>,
}

async fn history_get(
    State(state): State<AppState>,
    Path((patient_id, topic)): Path<(String, String)>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<SuccessBody<Vec<remind_core::ConversationTurn>>>, ApiError> {
    let turns = state
        .history
        .slice(&patient_id, &topic, params.max_turns.unwrap_or(usize::MAX));
    Ok(ok(turns))
}

async fn history_stats(
    State(state): State<AppState>,
    Path((patient_id, topic)): Path<(String, String)>,
) -> Result<Json<SuccessBody<remind_core::ConversationStats>>, ApiError> {
    Ok(ok(state.history.stats(&patient_id, &topic)))
}

#[derive(Debug, Deserialize, Default)]
struct HistoryResetRequest {
    #[serde(default)]
    conversation: bool,
    #[serde(default)]
    shown_memories: bool,
}

async fn history_reset(
    State(state): State<AppState>,
    Path((patient_id, topic)): Path<(String, String)>,
    Json(body): Json<HistoryResetRequest>,
) -> Result<StatusCode, ApiError> {
    state.history.reset(
        &patient_id,
        &topic,
        ResetOptions {
            conversation: body.conversation,
            shown_memories: body.shown_memories,
        },
    );
    Ok(StatusCode::NO_CONTENT)
}

async fn history_export(
    State(state): State<AppState>,
    Path((patient_id, topic)): Path<(String, String)>,
) -> Result<Json<SuccessBody<Vec<remind_core::ConversationTurn>>>, ApiError> {
    Ok(ok(state.history.slice(&patient_id, &topic, usize::MAX)))
}

// ---- Cache Layer (C10) ----

async fn cache_stats(State(state): State<AppState>) -> Json<SuccessBody<serde_json::Value>> {
    ok(serde_json::json!({
        "retrieval_cache_entries": state.retrieval.cache_len(),
        "classifier_cache_entries": state.classifier.cache_len(),
    }))
}

async fn cache_clear(State(state): State<AppState>) -> StatusCode {
    state.retrieval.clear_cache();
    state.classifier.clear_cache();
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use remind_config::Settings;

    #[test]
    fn router_builds_from_default_settings() {
        let state = AppState::bootstrap(Settings::default());
        let _ = create_router(state);
    }
}
