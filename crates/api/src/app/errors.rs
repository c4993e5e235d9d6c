use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use mailmerge_workflow::WorkflowError;

pub fn workflow_error_to_response(err: WorkflowError) -> axum::response::Response {
    let code = err.code();
    let status = match code {
        "invalid_start_row" | "missing_header_row" | "unknown_column" | "malformed_file" | "validation_error"
        | "missing_inputs" | "empty_template" => StatusCode::BAD_REQUEST,
        "no_matches" | "placeholders_dropped" | "template_error" => StatusCode::UNPROCESSABLE_ENTITY,
        "invalid_step" => StatusCode::CONFLICT,
        "not_found" => StatusCode::NOT_FOUND,
        "rewrite_unavailable" | "rewrite_invalid_response" | "transport_error" => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(code, error = %err, "request failed");
    }
    json_error(status, code, err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
