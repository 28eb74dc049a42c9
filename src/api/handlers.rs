//! API endpoint handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{add_sites, fetch_result, AppState};
use crate::output::load_statistics;
use crate::CrawlError;

/// Response envelope shared by every endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    pub error: Option<String>,
    pub status: String,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Response {
        Json(Self {
            data: Some(data),
            error: None,
            status: "success".to_string(),
        })
        .into_response()
    }
}

fn failure(err: &CrawlError) -> Response {
    let (code, status) = match err {
        CrawlError::InvalidInput(_) | CrawlError::Url(_) | CrawlError::UrlParse(_) => {
            (StatusCode::BAD_REQUEST, "error")
        }
        e if e.is_not_found() => (StatusCode::NOT_FOUND, "error"),
        _ => {
            tracing::error!("API request failed: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
        }
    };

    let body = ApiResponse::<()> {
        data: None,
        error: Some(err.to_string()),
        status: status.to_string(),
    };
    (code, Json(body)).into_response()
}

/// Body of `POST /crawl/add`.
#[derive(Debug, Deserialize)]
pub struct AddSitesRequest {
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Query of `GET /crawl/fetch`.
#[derive(Debug, Deserialize)]
pub struct FetchParams {
    #[serde(default)]
    pub weburl: String,
}

/// Queue every site in the request body.
pub async fn add_sites_handler(
    State(state): State<AppState>,
    Json(request): Json<AddSitesRequest>,
) -> Response {
    match add_sites(state.storage.queue.as_ref(), &request.urls) {
        Ok(report) => ApiResponse::success(report),
        Err(e) => failure(&e),
    }
}

/// Return the collected product links for one site.
pub async fn fetch_result_handler(
    State(state): State<AppState>,
    Query(params): Query<FetchParams>,
) -> Response {
    match fetch_result(state.storage.results.as_ref(), &params.weburl) {
        Ok(links) => ApiResponse::success(links),
        Err(e) => failure(&e),
    }
}

/// Pipeline counts plus live worker information.
pub async fn status_handler(State(state): State<AppState>) -> Response {
    let stats = match load_statistics(&state.storage) {
        Ok(stats) => stats,
        Err(e) => return failure(&e),
    };

    let active_workers = state.supervisor.as_ref().map(|s| s.active_count());

    ApiResponse::success(serde_json::json!({
        "statistics": stats,
        "active_workers": active_workers,
    }))
}
