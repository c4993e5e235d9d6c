use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

/// Step transitions of the wizard.
pub fn router() -> Router {
    Router::new()
        .route("/process", post(process))
        .route("/preview", get(preview))
        .route("/generate", post(generate))
        .route("/back", post(back))
        .route("/start-over", post(start_over))
}

pub async fn process(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let mut session = services.session().lock().await;
    match session.process() {
        Ok(groups) => {
            let items = groups.iter().map(dto::group_to_json).collect::<Vec<_>>();
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "count": items.len(),
                    "invoice_count": groups.invoice_count(),
                    "items": items,
                })),
            )
                .into_response()
        }
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn preview(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let session = services.session().lock().await;
    match session.preview() {
        Ok(drafts) => {
            let items = drafts
                .iter()
                .map(|d| dto::draft_to_json(d, session.is_dispatched(&d.group_key)))
                .collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn generate(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let mut session = services.session().lock().await;
    let items = match session.generate() {
        Ok(drafts) => drafts.iter().map(|d| dto::draft_to_json(d, false)).collect::<Vec<_>>(),
        Err(e) => return errors::workflow_error_to_response(e),
    };
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "items": items,
            "progress": dto::progress_to_json(session.progress()),
        })),
    )
        .into_response()
}

pub async fn back(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let mut session = services.session().lock().await;
    match session.back() {
        Ok(_) => (StatusCode::OK, Json(dto::session_to_json(&session))).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn start_over(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let mut session = services.session().lock().await;
    session.start_over();
    (StatusCode::OK, Json(dto::session_to_json(&session))).into_response()
}
