use reqwest::StatusCode;
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request failed: {status}\nBody: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Invalid UTF-8 in response stream at byte {offset}")]
    Decode { offset: usize },

    #[error("Render target error: {0}")]
    Target(#[from] std::io::Error),

    #[error("Highlighting failed: {0}")]
    Highlight(String),

    #[error("No handler registered as {0}")]
    UnknownHandler(String),
}

pub type StreamResult<T> = Result<T, StreamError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {env_var}: {reason}")]
    Invalid { env_var: String, reason: String },

    #[error(transparent)]
    Other(#[from] config::ConfigError),
}

/// Maps a dotted settings key such as `server.base_url` to the
/// environment variable that sets it.
pub fn to_env_var(field: &str) -> String {
    format!("MDSTREAM_{}", field.replace('.', "__").to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_env_var() {
        assert_eq!(to_env_var("server.base_url"), "MDSTREAM_SERVER__BASE_URL");
        assert_eq!(to_env_var("render"), "MDSTREAM_RENDER");
    }

    #[test]
    fn test_status_error_message() {
        let err = StreamError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom".to_string(),
        };
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("boom"));
    }
}
