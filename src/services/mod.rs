pub mod api;

#[cfg(test)]
pub mod fake;

pub use api::{HttpJobService, JobService};
