use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::address::{Resolution, ResolutionError};
use crate::gazetteer::{CityRecord, RefreshOutcome};

use super::state::AppState;

const DEFAULT_TOPK: usize = 5;

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

impl From<ResolutionError> for ApiError {
    fn from(err: ResolutionError) -> Self {
        api_error(StatusCode::BAD_REQUEST, err.to_string())
    }
}

/// Run blocking resolver work off the async runtime.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("worker failed: {}", e)))
}

// ─── GET /health ─────────────────────────────────────────────────

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ─── GET|POST /api/resolve ───────────────────────────────────────

#[derive(Deserialize)]
pub struct ResolveQuery {
    pub address: Option<String>,
    pub topk: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CandidateView {
    pub name: String,
    pub region: String,
    pub score: u32,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    /// `null` when no city could be determined with confidence.
    pub city: Option<CityRecord>,
    pub score: Option<u32>,
    pub region: Option<String>,
    pub source: String,
    pub candidates: Vec<CandidateView>,
}

impl ResolveResponse {
    fn from_resolution(resolution: Resolution, topk: usize) -> Self {
        Self {
            region: resolution.city.as_ref().map(|c| c.region.clone()),
            city: resolution.city,
            score: resolution.score,
            source: resolution.origin.to_string(),
            candidates: resolution
                .candidates
                .into_iter()
                .take(topk)
                .map(|c| CandidateView {
                    name: c.city.name,
                    region: c.city.region,
                    score: c.score,
                })
                .collect(),
        }
    }
}

pub async fn resolve_query(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveQuery>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let address = params
        .address
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Missing 'address' parameter"))?;
    resolve(state, address, params.topk, "GET").await
}

pub async fn resolve_body(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResolveQuery>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let address = body
        .address
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Missing 'address' field"))?;
    resolve(state, address, body.topk, "POST").await
}

async fn resolve(
    state: Arc<AppState>,
    address: String,
    topk: Option<usize>,
    method: &str,
) -> Result<Json<ResolveResponse>, ApiError> {
    let start = Instant::now();
    let resolver = Arc::clone(&state.resolver);
    let result = blocking(move || resolver.resolve_detailed(&address)).await?;

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    let resolution = match result {
        Ok(r) => r,
        Err(e) => {
            warn!("{} /api/resolve -> rejected: {} ({:.1}ms)", method, e, elapsed_ms);
            return Err(e.into());
        }
    };

    info!(
        "{} /api/resolve -> {} ({:.1}ms)",
        method,
        resolution.city.as_ref().map_or("no confident match", |c| c.name.as_str()),
        elapsed_ms,
    );
    Ok(Json(ResolveResponse::from_resolution(resolution, topk.unwrap_or(DEFAULT_TOPK))))
}

// ─── GET /api/cities ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CityListResponse {
    pub source: String,
    pub fetched_at: DateTime<Utc>,
    pub count: usize,
    pub cities: Vec<CityRecord>,
}

pub async fn city_list(State(state): State<Arc<AppState>>) -> Result<Json<CityListResponse>, ApiError> {
    let resolver = Arc::clone(&state.resolver);
    let snapshot = blocking(move || resolver.gazetteer()).await?;

    Ok(Json(CityListResponse {
        source: snapshot.origin.to_string(),
        fetched_at: snapshot.fetched_at,
        count: snapshot.len(),
        cities: snapshot.records.clone(),
    }))
}

// ─── POST /api/gazetteer/refresh ─────────────────────────────────

#[derive(Deserialize)]
pub struct RefreshQuery {
    /// Refetch even when the held snapshot is within its TTL. Defaults to `false`.
    pub force: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub count: usize,
    pub source: String,
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RefreshQuery>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let force = params.force.unwrap_or(false);
    let resolver = Arc::clone(&state.resolver);
    let (outcome, snapshot) = blocking(move || {
        let outcome = resolver.refresh_gazetteer(force);
        (outcome, resolver.cache().current())
    })
    .await?;

    let (label, reason) = match outcome {
        RefreshOutcome::Fresh => ("fresh", None),
        RefreshOutcome::Fetched { .. } => ("fetched", None),
        RefreshOutcome::KeptPrevious { reason } => ("kept_previous", Some(reason.to_string())),
        RefreshOutcome::Fallback { reason } => ("fallback", Some(reason.to_string())),
    };
    info!("POST /api/gazetteer/refresh force={} -> {}", force, label);

    Ok(Json(RefreshResponse {
        outcome: label,
        reason,
        count: snapshot.as_ref().map_or(0, |s| s.len()),
        source: snapshot.map_or_else(String::new, |s| s.origin.to_string()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AddressResolver;
    use crate::gazetteer::cache::testing::{configured, two_city_rows, ManualClock, ScriptedSource};
    use crate::gazetteer::{FetchError, GazetteerCache};

    fn state(results: Vec<Result<Vec<Vec<String>>, FetchError>>) -> Arc<AppState> {
        let cache = GazetteerCache::with_clock(Box::new(ScriptedSource::new(results)), configured(), ManualClock::new());
        Arc::new(AppState {
            resolver: Arc::new(AddressResolver::new(Arc::new(cache))),
        })
    }

    fn query(address: &str) -> Query<ResolveQuery> {
        Query(ResolveQuery {
            address: Some(address.to_string()),
            topk: None,
        })
    }

    #[tokio::test]
    async fn test_resolve_query_finds_city() {
        let Json(resp) = resolve_query(State(state(vec![Ok(two_city_rows())])), query("Nimal\n4 Hill St\nKandy\n0771234567"))
            .await
            .unwrap();
        assert_eq!(resp.city.unwrap().name, "Kandy");
        assert_eq!(resp.region.as_deref(), Some("Kandy"));
        assert_eq!(resp.source, "Remote");
        assert_eq!(resp.candidates[0].name, "Kandy");
    }

    #[tokio::test]
    async fn test_resolve_ambiguous_is_null_city() {
        let Json(resp) = resolve_query(State(state(vec![Ok(two_city_rows())])), query("Somewhere far"))
            .await
            .unwrap();
        assert!(resp.city.is_none());
        assert!(resp.score.is_none());
    }

    #[tokio::test]
    async fn test_resolve_short_address_is_bad_request() {
        let err = resolve_query(State(state(vec![Ok(two_city_rows())])), query(" a "))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_resolve_missing_address() {
        let params = Query(ResolveQuery { address: None, topk: None });
        let err = resolve_query(State(state(vec![])), params).await.unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_resolve_body_with_topk() {
        let body = Json(ResolveQuery {
            address: Some("John Doe\n123 Main Street\nColombo 01".into()),
            topk: Some(1),
        });
        let Json(resp) = resolve_body(State(state(vec![Err(FetchError::Forbidden)])), body)
            .await
            .unwrap();
        assert_eq!(resp.source, "Built-in");
        assert_eq!(resp.city.unwrap().name, "Colombo");
        assert_eq!(resp.candidates.len(), 1);
    }

    #[tokio::test]
    async fn test_city_list() {
        let Json(resp) = city_list(State(state(vec![Ok(two_city_rows())]))).await.unwrap();
        assert_eq!(resp.count, 2);
        assert_eq!(resp.source, "Remote");
    }

    #[tokio::test]
    async fn test_refresh_reports_fallback() {
        let params = Query(RefreshQuery { force: Some(true) });
        let Json(resp) = refresh(State(state(vec![Err(FetchError::NotFound)])), params).await.unwrap();
        assert_eq!(resp.outcome, "fallback");
        assert_eq!(resp.reason.as_deref(), Some("Sheet not found"));
        assert_eq!(resp.source, "Built-in");
        assert!(resp.count > 0);
    }

    #[tokio::test]
    async fn test_refresh_without_force_leaves_fresh_cache() {
        let st = state(vec![Ok(two_city_rows())]);
        st.resolver.refresh_gazetteer(true);

        let params = Query(RefreshQuery { force: None });
        let Json(resp) = refresh(State(st), params).await.unwrap();
        assert_eq!(resp.outcome, "fresh");
        assert!(resp.reason.is_none());
        assert_eq!(resp.count, 2);
        assert_eq!(resp.source, "Remote");
    }
}
