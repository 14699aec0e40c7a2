/// HTTP request handlers
use crate::domain::{Collection, Health, ImageDetail, SearchResponse, SearchState};
use crate::errors::{ApiError, ApiResult};
use crate::services::{SearchAggregator, FIRST_PAGE};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Application state shared across handlers.
///
/// The mutex serializes searches against the single aggregator.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Mutex<SearchAggregator>>,
    pub default_query: String,
}

/// Successful response wrapper
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub ok: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { ok: true, data }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub page: Option<u32>,
}

/// Health check handler
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        now: Utc::now(),
    })
}

/// Run one search; `q` defaults to the current query
pub async fn search(
    Query(params): Query<SearchParams>,
    State(state): State<AppState>,
) -> ApiResult<Json<SuccessResponse<SearchResponse>>> {
    let page = params.page.unwrap_or(FIRST_PAGE);
    if page == 0 {
        return Err(ApiError::InvalidInput("page must be at least 1".to_string()));
    }

    let mut aggregator = state.aggregator.lock().await;
    let query = params
        .q
        .or_else(|| aggregator.current_query().map(str::to_string))
        .unwrap_or_else(|| state.default_query.clone());

    let response = aggregator.search(&query, page).await.map_err(|e| {
        tracing::error!(query = %query, page, error = %e, "search failed");
        e
    })?;

    Ok(Json(SuccessResponse::new(response)))
}

/// Body of `/search/next`: the fetched page, or a message when none is left
#[derive(Debug, Serialize)]
pub struct NextBody {
    #[serde(flatten)]
    pub response: Option<SearchResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// Fetch the next page of the current query
pub async fn search_next(
    State(state): State<AppState>,
) -> ApiResult<Json<SuccessResponse<NextBody>>> {
    let mut aggregator = state.aggregator.lock().await;
    let body = match aggregator.search_next().await? {
        Some(response) => NextBody {
            response: Some(response),
            message: None,
        },
        None => NextBody {
            response: None,
            message: Some("no further pages"),
        },
    };
    Ok(Json(SuccessResponse::new(body)))
}

/// Current aggregator state
pub async fn get_state(State(state): State<AppState>) -> Json<SuccessResponse<SearchState>> {
    let aggregator = state.aggregator.lock().await;
    Json(SuccessResponse::new(aggregator.state()))
}

#[derive(Debug, Serialize)]
pub struct PagesBody {
    pub pages: Vec<Collection>,
}

/// Accumulated pages in page order
pub async fn list_pages(State(state): State<AppState>) -> Json<SuccessResponse<PagesBody>> {
    let aggregator = state.aggregator.lock().await;
    Json(SuccessResponse::new(PagesBody {
        pages: aggregator.all_pages().to_vec(),
    }))
}

/// Detail view of one accumulated item
pub async fn get_item(
    Path(nasa_id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<SuccessResponse<ImageDetail>>> {
    let aggregator = state.aggregator.lock().await;
    let detail = aggregator
        .find_item(&nasa_id)
        .and_then(ImageDetail::from_item)
        .ok_or_else(|| ApiError::NotFound(format!("item {}", nasa_id)))?;
    Ok(Json(SuccessResponse::new(detail)))
}
