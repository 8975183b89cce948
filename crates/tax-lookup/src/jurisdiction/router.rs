use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::ZipCode;
use super::resolver::RateResolver;
use super::result::TaxRateResult;
use super::suggestion::SettingsSuggestion;

#[derive(Debug, Default, Deserialize)]
pub struct LookupQuery {
    #[serde(default)]
    pub zip: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LookupResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: TaxRateResult,
}

#[derive(Debug, Serialize)]
pub struct SuggestionResponse {
    pub success: bool,
    pub suggestion: SettingsSuggestion,
}

/// Router builder exposing the ZIP lookup. Authentication is layered on by the host
/// application.
pub fn lookup_router(resolver: Arc<RateResolver>) -> Router {
    Router::new()
        .route("/api/tax/lookup", get(lookup_handler))
        .route("/api/tax/lookup/suggestion", get(suggestion_handler))
        .with_state(resolver)
}

fn sanitize_query(query: &LookupQuery) -> Result<ZipCode, Response> {
    query
        .zip
        .as_deref()
        .ok_or_else(|| invalid_zip_response(None))
        .and_then(|raw| ZipCode::sanitize(raw).map_err(|_| invalid_zip_response(Some(raw))))
}

fn invalid_zip_response(raw: Option<&str>) -> Response {
    tracing::debug!(raw, "rejected tax lookup zip");
    let payload = json!({ "error": "Valid 5-digit ZIP code required" });
    (StatusCode::BAD_REQUEST, Json(payload)).into_response()
}

pub(crate) async fn lookup_handler(
    State(resolver): State<Arc<RateResolver>>,
    Query(query): Query<LookupQuery>,
) -> Response {
    let zip = match sanitize_query(&query) {
        Ok(zip) => zip,
        Err(response) => return response,
    };

    let result = resolver.resolve(&zip);
    (
        StatusCode::OK,
        Json(LookupResponse {
            success: true,
            result,
        }),
    )
        .into_response()
}

pub(crate) async fn suggestion_handler(
    State(resolver): State<Arc<RateResolver>>,
    Query(query): Query<LookupQuery>,
) -> Response {
    let zip = match sanitize_query(&query) {
        Ok(zip) => zip,
        Err(response) => return response,
    };

    let suggestion = resolver.suggest(&zip);
    (
        StatusCode::OK,
        Json(SuggestionResponse {
            success: true,
            suggestion,
        }),
    )
        .into_response()
}
