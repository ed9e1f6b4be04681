use exam_analytics::{build_state, config::Config, routes::build_router};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    if config.local_state_path.is_none() {
        tracing::warn!("LOCAL_STATE_PATH is not set, papers and responses live in memory only");
    }
    tracing::info!(
        max_group_dimensions = config.max_group_dimensions,
        weak_area_threshold = config.weak_area_threshold,
        "analytics configured"
    );

    let app = build_router(build_state(config));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("backend listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
