pub mod config;
pub mod confirm;
pub mod error;
pub mod materials;
pub mod models;
pub mod notifications;
pub mod pagination;
pub mod prefs;
pub mod preview;
pub mod request;
pub mod selector;
pub mod services;
pub mod session;
pub mod sync;

pub use config::{Config, JobOrdering, Timings};
pub use error::{ClientError, Result};
pub use services::{HttpJobService, JobService};
pub use session::{Action, PendingAction, Session};
pub use sync::JobSynchronizer;
