//! HTTP route handlers for the collection API.
//!
//! Query responses mirror a batched-query shape: every field is a list with
//! one inner list per query vector. Only one query vector is evaluated, so
//! the outer lists always have exactly one element.

use crate::collection::{Include, PeekResult, QueryRequest};
use crate::config::{DEFAULT_N_RESULTS, DEFAULT_PEEK_LIMIT};
use crate::error::VectorDbError;
use crate::metadata::{Metadata, MetadataFilter};
use crate::registry::CollectionInfo;
use crate::server::AppState;
use crate::vector::Vector;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

// --- Request/Response types ---

#[derive(Deserialize)]
pub struct CreateCollectionRequest {
    pub name: String,
    #[serde(default)]
    pub get_or_create: bool,
}

#[derive(Deserialize)]
pub struct RecordsRequest {
    pub ids: Vec<String>,
    pub embeddings: Vec<Vec<f32>>,
    pub metadatas: Option<Vec<Metadata>>,
}

#[derive(Deserialize)]
pub struct DeleteRecordsRequest {
    pub ids: Vec<String>,
}

#[derive(Deserialize)]
pub struct QueryRecordsRequest {
    pub query_embeddings: Vec<Vec<f32>>,
    pub n_results: Option<usize>,
    #[serde(default, rename = "where")]
    pub filter: MetadataFilter,
    #[serde(default)]
    pub include: Vec<String>,
}

#[derive(Deserialize)]
pub struct PeekParams {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct CollectionResponse {
    pub name: String,
    pub count: usize,
    pub dimension: Option<usize>,
}

#[derive(Serialize)]
pub struct QueryResponse {
    pub ids: Vec<Vec<String>>,
    pub distances: Vec<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadatas: Option<Vec<Vec<Metadata>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Vec<Vec<Vector>>>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub collection_count: usize,
}

#[derive(Serialize)]
pub struct MetricsResponse {
    pub total_queries: u64,
    pub records_added: u64,
    pub records_upserted: u64,
    pub records_deleted: u64,
    pub avg_query_latency_us: f64,
    pub p50_query_latency_us: f64,
    pub p95_query_latency_us: f64,
    pub p99_query_latency_us: f64,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<T, ApiError>;

fn api_error(e: VectorDbError) -> ApiError {
    let status = match &e {
        VectorDbError::CollectionNotFound { .. } => StatusCode::NOT_FOUND,
        VectorDbError::CollectionAlreadyExists { .. } => StatusCode::CONFLICT,
        VectorDbError::InvalidCollectionName { .. }
        | VectorDbError::LengthMismatch { .. }
        | VectorDbError::InvalidArgument { .. }
        | VectorDbError::DimensionMismatch { .. }
        | VectorDbError::InvalidVector { .. } => StatusCode::BAD_REQUEST,
        VectorDbError::IoError(_) | VectorDbError::SerializationError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    warn!(status = status.as_u16(), error = %e, "Request rejected");
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

// --- Router ---

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(get_metrics))
        .route("/reset", post(reset))
        .route("/collections", get(list_collections).post(create_collection))
        .route(
            "/collections/:name",
            get(get_collection).delete(delete_collection),
        )
        .route("/collections/:name/add", post(add_records))
        .route("/collections/:name/upsert", post(upsert_records))
        .route("/collections/:name/delete", post(delete_records))
        .route("/collections/:name/query", post(query_records))
        .route("/collections/:name/peek", get(peek_records))
        .route("/collections/:name/count", get(count_records))
        .with_state(state)
}

// --- Handlers ---

async fn list_collections(State(state): State<Arc<AppState>>) -> Json<Vec<CollectionInfo>> {
    Json(state.registry.list_collections())
}

async fn create_collection(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCollectionRequest>,
) -> ApiResult<(StatusCode, Json<CollectionResponse>)> {
    let collection = if req.get_or_create {
        state.registry.get_or_create_collection(&req.name)
    } else {
        state.registry.create_collection(&req.name)
    }
    .map_err(api_error)?;

    Ok((
        StatusCode::CREATED,
        Json(CollectionResponse {
            name: collection.name().to_string(),
            count: collection.count(),
            dimension: collection.dimension(),
        }),
    ))
}

async fn get_collection(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<CollectionResponse>> {
    let collection = state.registry.get_collection(&name).map_err(api_error)?;
    Ok(Json(CollectionResponse {
        name,
        count: collection.count(),
        dimension: collection.dimension(),
    }))
}

async fn delete_collection(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    state.registry.delete_collection(&name).map_err(api_error)?;
    Ok(Json(serde_json::json!({"name": name, "status": "deleted"})))
}

async fn reset(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    state.registry.reset();
    Json(serde_json::json!({"status": "reset"}))
}

async fn add_records(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<RecordsRequest>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let collection = state.registry.get_collection(&name).map_err(api_error)?;
    let added = req.ids.len();
    collection
        .add(req.ids, req.embeddings, req.metadatas)
        .map_err(api_error)?;

    state.metrics.write().record_add(added);

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({"added": added})),
    ))
}

async fn upsert_records(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<RecordsRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let collection = state.registry.get_collection(&name).map_err(api_error)?;
    let upserted = req.ids.len();
    collection
        .upsert(req.ids, req.embeddings, req.metadatas)
        .map_err(api_error)?;

    state.metrics.write().record_upsert(upserted);

    Ok(Json(serde_json::json!({"upserted": upserted})))
}

async fn delete_records(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<DeleteRecordsRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let collection = state.registry.get_collection(&name).map_err(api_error)?;
    let deleted = collection.delete(&req.ids);

    state.metrics.write().record_delete(deleted);

    Ok(Json(serde_json::json!({"deleted": deleted})))
}

async fn query_records(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<QueryRecordsRequest>,
) -> ApiResult<Json<QueryResponse>> {
    let collection = state.registry.get_collection(&name).map_err(api_error)?;

    let vector = req
        .query_embeddings
        .into_iter()
        .next()
        .ok_or_else(|| {
            api_error(VectorDbError::InvalidArgument {
                reason: "query_embeddings must contain a vector".to_string(),
            })
        })?;
    let request = QueryRequest::new(vector)
        .n_results(req.n_results.unwrap_or(DEFAULT_N_RESULTS))
        .filter(req.filter)
        .include(Include::from_names(&req.include));

    let start = Instant::now();
    let result = collection.query(&request).map_err(api_error)?;
    state.metrics.write().record_query(start.elapsed());

    Ok(Json(QueryResponse {
        ids: vec![result.ids],
        distances: vec![result.distances],
        metadatas: result.metadatas.map(|m| vec![m]),
        embeddings: result.embeddings.map(|e| vec![e]),
    }))
}

async fn peek_records(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<PeekParams>,
) -> ApiResult<Json<PeekResult>> {
    let collection = state.registry.get_collection(&name).map_err(api_error)?;
    Ok(Json(
        collection.peek(params.limit.unwrap_or(DEFAULT_PEEK_LIMIT)),
    ))
}

async fn count_records(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<usize>> {
    let collection = state.registry.get_collection(&name).map_err(api_error)?;
    Ok(Json(collection.count()))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        collection_count: state.registry.len(),
    })
}

async fn get_metrics(State(state): State<Arc<AppState>>) -> Json<MetricsResponse> {
    let metrics = state.metrics.read();

    Json(MetricsResponse {
        total_queries: metrics.total_queries(),
        records_added: metrics.records_added(),
        records_upserted: metrics.records_upserted(),
        records_deleted: metrics.records_deleted(),
        avg_query_latency_us: metrics.avg_query_latency_us(),
        p50_query_latency_us: metrics.percentile_query_latency_us(50.0),
        p95_query_latency_us: metrics.percentile_query_latency_us(95.0),
        p99_query_latency_us: metrics.percentile_query_latency_us(99.0),
    })
}
