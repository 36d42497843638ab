use anyhow::Result;
use post_analyser::analyzer::{Collaborators, PostAnalyzer};
use post_analyser::language_repo::LanguageRepo;
use post_analyser::media_repo::MediaRepo;
use post_analyser::orchestrator::BatchOrchestrator;
use post_analyser::retry::RetryPolicy;
use post_analyser::stats::AnalysisStats;
use post_analyser::vision_repo::VisionRepo;
use post_analyser::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    let stats = Arc::new(AnalysisStats::default());

    // Clients are built once and shared by every request.
    let collaborators = Collaborators {
        media: Arc::new(MediaRepo::new(&app_config.media)?),
        vision: Arc::new(VisionRepo::new(&app_config.vision)?),
        language: Arc::new(LanguageRepo::new(&app_config.language)?),
    };
    let retry = RetryPolicy::new(
        app_config.retry.max_backoff_secs,
        app_config.retry.max_attempts,
    )
    .with_counter(stats.rate_limited_total.clone());
    let analyzer = Arc::new(PostAnalyzer::new(
        collaborators,
        retry,
        app_config.vision.max_results,
    ));
    let orchestrator = Arc::new(BatchOrchestrator::new(analyzer, stats.clone()));

    let app = routes::app(orchestrator, stats);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        "{} {} listening on http://{}",
        version::NAME,
        version::VERSION,
        addr
    );

    let in_container = std::path::Path::new("/.dockerenv").exists()
        || std::env::var("CONTAINER").as_deref() == Ok("1");

    if in_container {
        // In Docker: run until error or SIGTERM kills the process
        axum::serve(listener, app).await?;
    } else {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    }

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    tracing::info!("Received shutdown signal");
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("Received shutdown signal");
}
