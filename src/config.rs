use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// How the job list is ordered for display.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobOrdering {
    /// keep the order returned by the service
    Server,
    /// created_at descending, ties broken by id
    #[default]
    NewestFirst,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "videosmith")]
#[command(about = "Video job client engine", long_about = None)]
pub struct Config {
    #[arg(long, env = "VIDEOSMITH_API_URL", default_value = "http://127.0.0.1:8080/api/v1")]
    pub api_url: String,

    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "POLL_INTERVAL_MS", default_value = "4000")]
    pub poll_interval_ms: u64,

    #[arg(long, env = "TOAST_TTL_MS", default_value = "3000")]
    pub toast_ttl_ms: u64,

    #[arg(long, env = "PAGE_SIZE", default_value = "10")]
    pub page_size: usize,

    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout: u64,

    /// largest `limit` the service accepts on GET /jobs
    #[arg(long, env = "LIST_PAGE_LIMIT", default_value = "100")]
    pub list_page_limit: usize,

    #[arg(long, env = "JOB_ORDERING", value_enum, default_value_t = JobOrdering::NewestFirst)]
    pub job_ordering: JobOrdering,

    #[arg(long, env = "VIDEOSMITH_PREFS")]
    pub prefs_path: Option<PathBuf>,
}

/// Durations the engine runs on, derived from `Config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub poll_interval: Duration,
    pub toast_ttl: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(4),
            toast_ttl: Duration::from_secs(3),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::parse()
    }

    pub fn timings(&self) -> Timings {
        Timings {
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            toast_ttl: Duration::from_millis(self.toast_ttl_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn prefs_path(&self) -> PathBuf {
        if let Some(path) = &self.prefs_path {
            return path.clone();
        }
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home).join(".videosmith").join("prefs.toml")
    }
}
