use anyhow::Result;
use axum::serve;
use care_ingress_whatsapp::{IngressConfig, build_router, build_state};
use care_telemetry::install as init_telemetry;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_telemetry("care-ingress-whatsapp")?;

    let config = IngressConfig::from_env()?;
    let router = build_router(build_state(&config)?);
    let listener = TcpListener::bind(config.addr).await?;
    info!("care-ingress-whatsapp listening on {}", config.addr);

    serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    care_telemetry::shutdown();
    Ok(())
}
