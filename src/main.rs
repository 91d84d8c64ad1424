use anyhow::Context;
use std::sync::Arc;
use tokio::time::interval;
use tracing::info;
use tracing_subscriber::EnvFilter;

use videosmith::{
    prefs::Preferences, preview::NullAudioBackend, Config, HttpJobService, Session,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let prefs_path = config.prefs_path();
    let prefs = Preferences::load(&prefs_path)
        .with_context(|| format!("failed to read preferences at {}", prefs_path.display()))?;
    info!("Preferences: {:?}, {:?}", prefs.language, prefs.theme);

    let service = HttpJobService::new(&config).context("failed to build service client")?;
    info!("Job service at {}", service.base_url());

    let mut session = Session::new(Arc::new(service), &config, Box::new(NullAudioBackend));
    session.start().await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut tick = interval(config.timings().poll_interval);
    let mut seen = 0;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = tick.tick() => {
                let revision = session.synchronizer().revision().await;
                if revision == seen {
                    continue;
                }
                seen = revision;

                let page = session.job_page().await;
                info!(
                    "Jobs: {} total, {} active, page {}/{}",
                    page.summary.total(),
                    page.summary.active(),
                    page.page,
                    page.total_pages
                );
                for job in &page.jobs {
                    info!(
                        "  {} {:<8} {:>3}% {}",
                        job.id,
                        job.status,
                        job.progress,
                        job.error().unwrap_or("")
                    );
                }
            }
        }
    }

    info!("Shutting down");
    session.dispose().await;
    Ok(())
}
