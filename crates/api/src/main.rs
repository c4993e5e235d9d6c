use anyhow::Context;

use mailmerge_api::app::{self, services::ApiSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    mailmerge_observability::init();

    let settings = ApiSettings::from_env()?;
    let app = app::build_app(&settings).await?;

    let listener = tokio::net::TcpListener::bind(&settings.bind)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
