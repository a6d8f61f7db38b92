use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, MutexGuard};
use std::time::Instant;
use tracing::info;

use crate::dedup::DedupMatch;
use crate::entity::{Point, PointEntity, PointId, PointKind, PointRecord};
use crate::error::{GeoError, StoreError};
use crate::geo::{self, BoundingBox, Coordinates};
use crate::ingest::IngestOutcome;
use crate::store::{JsonStore, PointStore, ZoneStore};
use crate::zone::{Zone, ZoneId, MAX_PRECISION};

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

#[derive(Debug)]
pub(super) struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

impl From<GeoError> for ApiError {
    fn from(e: GeoError) -> Self {
        api_error(StatusCode::BAD_REQUEST, e.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        let status = match e {
            StoreError::PointNotFound(_) | StoreError::ZoneNotFound(_) => StatusCode::NOT_FOUND,
            StoreError::DuplicateExternalId(_) => StatusCode::CONFLICT,
            StoreError::Io { .. } | StoreError::Serde(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        api_error(status, e.to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        api_error(StatusCode::BAD_REQUEST, e.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        api_error(StatusCode::BAD_REQUEST, e.body_text())
    }
}

fn lock_store(state: &AppState) -> Result<MutexGuard<'_, JsonStore>, ApiError> {
    state
        .store
        .lock()
        .map_err(|_| api_error(StatusCode::INTERNAL_SERVER_ERROR, "Store lock poisoned"))
}

fn require<T>(value: Option<T>, name: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| api_error(StatusCode::BAD_REQUEST, format!("Missing '{}' parameter", name)))
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

// ─── GET /api/geohash ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct GeohashQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub precision: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct GeohashResponse {
    pub geohash: String,
    pub precision: usize,
    pub bbox: BoundingBox,
    pub neighbors: Vec<String>,
}

pub async fn geohash(
    State(state): State<Arc<AppState>>,
    params: Result<Query<GeohashQuery>, QueryRejection>,
) -> Result<Json<GeohashResponse>, ApiError> {
    let start = Instant::now();
    let Query(params) = params?;

    let lat = require(params.lat, "lat")?;
    let lng = require(params.lng, "lng")?;
    let precision = params
        .precision
        .unwrap_or_else(|| state.ingestor.assigner().precision());
    if precision > MAX_PRECISION {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("Precision must be 1-{}", MAX_PRECISION),
        ));
    }

    let hash = geo::encode(lat, lng, precision)?;
    let resp = GeohashResponse {
        bbox: geo::decode_bbox(&hash)?,
        neighbors: geo::neighbors(&hash)?,
        precision,
        geohash: hash,
    };

    info!(geohash = %resp.geohash, elapsed_ms = elapsed_ms(start), "GET /api/geohash");
    Ok(Json(resp))
}

// ─── GET /api/distance ───────────────────────────────────────────

#[derive(Deserialize)]
pub struct DistanceQuery {
    pub lat1: Option<f64>,
    pub lng1: Option<f64>,
    pub lat2: Option<f64>,
    pub lng2: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct DistanceResponse {
    pub meters: f64,
}

pub async fn distance(
    params: Result<Query<DistanceQuery>, QueryRejection>,
) -> Result<Json<DistanceResponse>, ApiError> {
    let start = Instant::now();
    let Query(params) = params?;

    let a = Coordinates::new(require(params.lat1, "lat1")?, require(params.lng1, "lng1")?)?;
    let b = Coordinates::new(require(params.lat2, "lat2")?, require(params.lng2, "lng2")?)?;
    let meters = a.distance_to(&b);

    info!(meters, elapsed_ms = elapsed_ms(start), "GET /api/distance");
    Ok(Json(DistanceResponse { meters }))
}

// ─── GET /api/match ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct MatchQuery {
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub external_id: Option<String>,
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub matched: bool,
    #[serde(rename = "match")]
    pub found: Option<DedupMatch>,
}

pub async fn find_match(
    State(state): State<Arc<AppState>>,
    params: Result<Query<MatchQuery>, QueryRejection>,
) -> Result<Json<MatchResponse>, ApiError> {
    let start = Instant::now();
    let Query(params) = params?;

    let name = require(params.name, "name")?;
    let kind = match params.kind.as_deref() {
        Some(k) => k
            .parse::<PointKind>()
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?,
        None => PointKind::Poi,
    };
    let candidate = Point::new(kind, name, params.lat, params.lng, params.external_id);

    let found = {
        let store = lock_store(&state)?;
        state.ingestor.matcher().find_match(&candidate, &*store)?
    };

    info!(
        name = candidate.name(),
        matched = ?found.as_ref().map(|m| m.id),
        elapsed_ms = elapsed_ms(start),
        "GET /api/match"
    );

    Ok(Json(MatchResponse {
        matched: found.is_some(),
        found,
    }))
}

// ─── POST /api/points ────────────────────────────────────────────

pub async fn ingest_point(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Point>, JsonRejection>,
) -> Result<(StatusCode, Json<IngestOutcome>), ApiError> {
    let start = Instant::now();
    let Json(point) = body?;

    let outcome = {
        let mut store = lock_store(&state)?;
        state.ingestor.ingest(point, &mut *store)?
    };

    let status = match outcome {
        IngestOutcome::Created { .. } => StatusCode::CREATED,
        IngestOutcome::Existing { .. } => StatusCode::OK,
    };
    info!(id = %outcome.id(), status = status.as_u16(), elapsed_ms = elapsed_ms(start), "POST /api/points");

    Ok((status, Json(outcome)))
}

// ─── GET /api/points/{id} ────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PointResponse {
    #[serde(flatten)]
    pub record: PointRecord,
    pub zone: Option<ZoneId>,
}

pub async fn get_point(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<PointResponse>, ApiError> {
    let start = Instant::now();
    let id: PointId = raw_id
        .parse()
        .map_err(|_| api_error(StatusCode::BAD_REQUEST, format!("Invalid point id '{}'", raw_id)))?;

    let (record, zone) = {
        let store = lock_store(&state)?;
        let record = store
            .get(id)?
            .ok_or_else(|| StoreError::PointNotFound(id.to_string()))?;
        (record, store.zone_of(id)?)
    };

    info!(%id, zone = ?zone, elapsed_ms = elapsed_ms(start), "GET /api/points/{{id}}");
    Ok(Json(PointResponse { record, zone }))
}

// ─── GET /api/zones ──────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ZoneSummary {
    #[serde(flatten)]
    pub zone: Zone,
    pub point_count: usize,
}

pub async fn zone_list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ZoneSummary>>, ApiError> {
    let start = Instant::now();

    let summaries = {
        let store = lock_store(&state)?;
        store
            .zones()?
            .into_iter()
            .map(|zone| {
                let point_count = store.points_in_zone(&zone.id)?.len();
                Ok(ZoneSummary { zone, point_count })
            })
            .collect::<Result<Vec<_>, StoreError>>()?
    };

    info!(zones = summaries.len(), elapsed_ms = elapsed_ms(start), "GET /api/zones");
    Ok(Json(summaries))
}

// ─── GET /api/zones/{slug} ───────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ZoneDetail {
    #[serde(flatten)]
    pub zone: Zone,
    pub bbox: BoundingBox,
    pub points: Vec<PointRecord>,
}

pub async fn zone_detail(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<ZoneDetail>, ApiError> {
    let start = Instant::now();

    let (zone, points) = {
        let store = lock_store(&state)?;
        let zone = store
            .find_zone(&slug)?
            .ok_or_else(|| StoreError::ZoneNotFound(slug.clone()))?;

        let mut points = Vec::new();
        for id in store.points_in_zone(&zone.id)? {
            if let Some(record) = store.get(id)? {
                points.push(record);
            }
        }
        (zone, points)
    };

    info!(zone = %zone.id, points = points.len(), elapsed_ms = elapsed_ms(start), "GET /api/zones/{{slug}}");
    Ok(Json(ZoneDetail {
        bbox: zone.bbox()?,
        zone,
        points,
    }))
}
