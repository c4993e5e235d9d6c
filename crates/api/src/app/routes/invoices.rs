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
        .route("/", get(list_invoices))
        .route("/upload", post(upload_invoices))
}

pub async fn list_invoices(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let session = services.session().lock().await;
    let items = session.invoices().iter().map(|i| &i.fields).collect::<Vec<_>>();
    (
        StatusCode::OK,
        Json(serde_json::json!({ "count": items.len(), "items": items })),
    )
        .into_response()
}

pub async fn upload_invoices(
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
    match session.upload_invoices(upload) {
        Ok(count) => (StatusCode::OK, Json(serde_json::json!({ "count": count }))).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}
