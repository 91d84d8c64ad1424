use serde::Deserialize;

use crate::request::ValidationIssue;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid preferences file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Could not write preferences: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("Invalid API url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Job {id} has no downloadable result")]
    NotDownloadable { id: String },

    #[error("Job {id} not found")]
    UnknownJob { id: String },

    #[error("Draft is not ready to submit ({} issue(s))", .0.len())]
    InvalidDraft(Vec<ValidationIssue>),

    #[error("Synchronizer stopped")]
    Stopped,
}

/// error body returned by the job service: `{"error": "..."}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl ClientError {
    pub async fn from_response(response: reqwest::Response) -> ClientError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read response text".to_string());

        let message = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) => parsed.error,
            Err(_) => body,
        };

        ClientError::Http { status, message }
    }

    /// Server-provided detail, if the failure carried one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ClientError::Http { message, .. } if !message.trim().is_empty() => {
                Some(message.as_str())
            }
            _ => None,
        }
    }

    /// Text for a user-facing notification: the server detail when present,
    /// otherwise the given generic message.
    pub fn user_message(&self, generic: &str) -> String {
        match self.detail() {
            Some(detail) => format!("{}: {}", generic, detail),
            None => generic.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
