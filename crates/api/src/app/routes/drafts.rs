use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use mailmerge_core::JoinKey;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_drafts))
        .route("/export.csv", get(export_csv))
        .route("/dispatch-all", post(dispatch_all))
        .route("/:key/dispatch", post(dispatch_draft))
        .route("/:key/mark", post(mark_dispatched))
}

pub async fn list_drafts(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let session = services.session().lock().await;
    let drafts = match session.drafts() {
        Ok(d) => d,
        Err(e) => return errors::workflow_error_to_response(e),
    };
    let items = drafts
        .iter()
        .map(|d| dto::draft_to_json(d, session.is_dispatched(&d.group_key)))
        .collect::<Vec<_>>();
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "items": items,
            "progress": dto::progress_to_json(session.progress()),
        })),
    )
        .into_response()
}

pub async fn dispatch_draft(
    Extension(services): Extension<Arc<AppServices>>,
    Path(key): Path<String>,
) -> axum::response::Response {
    let key = JoinKey::new(key);
    let mut session = services.session().lock().await;
    match session.dispatch(&key, services.dispatcher()).await {
        Ok(receipt) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "group_key": key,
                "receipt": receipt,
                "progress": dto::progress_to_json(session.progress()),
            })),
        )
            .into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

/// For drafts sent outside the service (e.g. the client opened the mailto link itself).
pub async fn mark_dispatched(
    Extension(services): Extension<Arc<AppServices>>,
    Path(key): Path<String>,
) -> axum::response::Response {
    let key = JoinKey::new(key);
    let mut session = services.session().lock().await;
    match session.mark_dispatched(&key) {
        Ok(progress) => (StatusCode::OK, Json(dto::progress_to_json(progress))).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn dispatch_all(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let mut session = services.session().lock().await;
    match session.dispatch_all(services.dispatcher()).await {
        Ok(report) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "succeeded": report.succeeded,
                "failed": report.failed.iter().map(|(k, e)| serde_json::json!({
                    "group_key": k,
                    "error": e,
                })).collect::<Vec<_>>(),
                "skipped": report.skipped,
                "progress": dto::progress_to_json(session.progress()),
            })),
        )
            .into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn export_csv(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let session = services.session().lock().await;
    match session.export_csv() {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"drafts.csv\""),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}
