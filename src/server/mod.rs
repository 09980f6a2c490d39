/// HTTP query gateway for nodewatch
/// Serves normalized Prometheus snapshots to dashboards

#[cfg(feature = "server")]
pub mod routes;

#[cfg(feature = "server")]
pub mod handlers;

#[cfg(feature = "server")]
pub mod middleware;

#[cfg(feature = "server")]
pub use routes::create_router;

#[cfg(feature = "server")]
pub async fn run(settings: crate::utils::GatewaySettings) -> anyhow::Result<()> {
    use anyhow::Context;
    use std::net::SocketAddr;

    use crate::core::{Gateway, PrometheusClient};
    use handlers::AppState;

    let prometheus = PrometheusClient::new(&settings.prometheus_url, settings.query_timeout)
        .context("Failed to create Prometheus client")?;
    let gateway = Gateway::new(prometheus, settings.job.clone());
    let app = create_router(AppState::new(gateway, settings.require_instance), settings.cors);

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", settings.host, settings.port))?;

    println!("nodewatch gateway");
    println!("   API:        http://{}/api", addr);
    println!("   Prometheus: {} (job=\"{}\")", settings.prometheus_url, settings.job);
    if settings.require_instance {
        println!("   Mode:       instance parameter required");
    } else {
        println!("   Mode:       instance optional (unscoped = all instances)");
    }
    println!();
    println!("API Endpoints:");
    println!("   GET  /api/instances          - List scraped instances");
    println!("   GET  /api/system?instance=   - Current CPU/memory/disk utilization");
    println!("   GET  /api/health             - Health check");
    println!("   GET  /metrics                - Gateway self metrics");
    println!();

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
