use thiserror::Error;

#[derive(Error, Debug)]
pub enum StrandError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Expected a Note but received an Activity")]
    Discrimination,

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl StrandError {
    /// Network or store-unreachable failures, as opposed to data problems.
    pub fn is_transport(&self) -> bool {
        matches!(self, StrandError::Http(_) | StrandError::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, StrandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_grouping() {
        assert!(StrandError::Transport("offline".into()).is_transport());
        assert!(!StrandError::NotFound("x".into()).is_transport());
        assert!(!StrandError::Discrimination.is_transport());
    }

    #[test]
    fn test_discrimination_message() {
        assert_eq!(
            StrandError::Discrimination.to_string(),
            "Expected a Note but received an Activity"
        );
    }
}
