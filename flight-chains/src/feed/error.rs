//! Feed error types.

use std::path::PathBuf;

/// Errors from reaching an external data feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Reading feed data failed
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Feed data could not be decoded
    #[error("JSON parse error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The feed has no entry for the requested key
    #[error("not found: {0}")]
    NotFound(String),

    /// The feed could not be reached or refused the request
    #[error("feed unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FeedError::NotFound("airport XYZ".into());
        assert_eq!(err.to_string(), "not found: airport XYZ");

        let err = FeedError::Unavailable("connection refused".into());
        assert_eq!(err.to_string(), "feed unavailable: connection refused");

        let err = FeedError::Io {
            path: PathBuf::from("data/routes.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("data/routes.json"));
    }
}
