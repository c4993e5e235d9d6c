use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use mailmerge_workflow::Upload;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_recipients).delete(clear_recipients))
        .route("/upload", post(upload_recipients))
}

pub async fn list_recipients(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let session = services.session().lock().await;
    (StatusCode::OK, Json(dto::recipients_to_json(&session))).into_response()
}

/// Raw file body; `file_name` and `start_row` come from the query string.
pub async fn upload_recipients(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::UploadQuery>,
    body: Bytes,
) -> axum::response::Response {
    let mut upload = Upload::new(&body);
    if let Some(name) = query.file_name.as_deref() {
        upload = upload.named(name);
    }
    if let Some(row) = query.start_row {
        upload = upload.start_row(row);
    }

    let mut session = services.session().lock().await;
    match session.upload_recipients(upload).await {
        Ok(_) => (StatusCode::OK, Json(dto::recipients_to_json(&session))).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn clear_recipients(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let mut session = services.session().lock().await;
    match session.clear_recipients().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}
