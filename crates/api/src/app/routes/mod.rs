use axum::{routing::get, Router};

pub mod drafts;
pub mod invoices;
pub mod process;
pub mod recipients;
pub mod system;
pub mod template;

/// Router for all wizard endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/session", get(system::session))
        .nest("/recipients", recipients::router())
        .nest("/invoices", invoices::router())
        .nest("/template", template::router())
        .nest("/drafts", drafts::router())
        .merge(process::router())
}
