use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use profilegrid_core::{config::load_properties, ReportConfigurator, TemplateCatalog};
use profilegrid_server::{ga::GoogleAnalyticsClient, state::AppState};

/// Upstream calls per render above which the reporting API starts refusing
/// requests in practice.
const REQUESTS_PER_RENDER_WARNING: usize = 100;

/// `profilegrid health` — liveness probe for Docker HEALTHCHECK.
///
/// Calls `GET http://localhost:$PROFILEGRID_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("PROFILEGRID_PORT").unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("health") {
        run_health_check();
    }
    // Structured JSON logging. Level controlled via RUST_LOG env var.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("profilegrid=info".parse()?),
        )
        .json()
        .init();

    let cfg = profilegrid_core::config::Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Configuration errors stop startup before any reporting call is made.
    let properties = load_properties(&cfg.properties_path)
        .with_context(|| format!("loading {}", cfg.properties_path))?;
    let configurator = ReportConfigurator::new(TemplateCatalog::builtin(), &properties)
        .context("invalid property configuration")?;

    let total = configurator.total_requests();
    info!(
        properties = configurator.properties().len(),
        requests_per_render = total,
        "Property configuration resolved"
    );
    if total > REQUESTS_PER_RENDER_WARNING {
        warn!(
            requests_per_render = total,
            "Every grid render fires this many reporting API calls; expect rate limiting"
        );
    }
    if cfg.ga_token.is_none() {
        warn!("PROFILEGRID_GA_TOKEN not set; reporting API calls will be unauthenticated");
    }

    let client = Arc::new(GoogleAnalyticsClient::new(
        &cfg.ga_endpoint,
        cfg.ga_token.clone(),
    ));
    let state = Arc::new(AppState::new(cfg.clone(), configurator, client));

    let addr = format!("0.0.0.0:{}", cfg.port);
    let app = profilegrid_server::app::build_app(state);

    info!(port = cfg.port, "Profilegrid listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
