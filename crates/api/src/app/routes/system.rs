use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::app::dto;
use crate::app::services::AppServices;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Current wizard step and counts.
pub async fn session(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let session = services.session().lock().await;
    (StatusCode::OK, Json(dto::session_to_json(&session))).into_response()
}
