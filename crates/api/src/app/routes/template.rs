use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use mailmerge_template::placeholders;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(get_template).put(put_template))
        .route("/rewrite", post(rewrite_template))
}

fn template_json(subject: &str, body: &str) -> serde_json::Value {
    serde_json::json!({
        "subject": subject,
        "body": body,
        "placeholders": placeholders(body),
    })
}

pub async fn get_template(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let session = services.session().lock().await;
    let t = session.template();
    (StatusCode::OK, Json(template_json(&t.subject, &t.body))).into_response()
}

pub async fn put_template(
    Extension(services): Extension<Arc<AppServices>>,
    Json(req): Json<dto::TemplateRequest>,
) -> axum::response::Response {
    let mut session = services.session().lock().await;
    if let Err(e) = session.set_template(req.body, req.subject) {
        return errors::workflow_error_to_response(e);
    }
    let t = session.template();
    (StatusCode::OK, Json(template_json(&t.subject, &t.body))).into_response()
}

pub async fn rewrite_template(
    Extension(services): Extension<Arc<AppServices>>,
    Json(req): Json<dto::RewriteTemplateRequest>,
) -> axum::response::Response {
    let Some(rewriter) = services.rewriter() else {
        return errors::json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "rewrite_disabled",
            "no template rewriter is configured",
        );
    };

    let mut session = services.session().lock().await;
    match session.rewrite_template(&**rewriter, &req.guidance).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "body": outcome.template,
                "placeholders": outcome.placeholders,
            })),
        )
            .into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}
