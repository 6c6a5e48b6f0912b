//! Classification of non-success HTTP statuses into readable errors.

use reqwest::StatusCode;

/// A request that reached the server but was answered with a non-success status.
#[derive(Debug)]
pub enum HttpStatusError {
    /// Rate limit exceeded (HTTP 403 with rate limit message or 429)
    RateLimitExceeded(String),
    /// Authentication failed (HTTP 401)
    AuthenticationFailed(String),
    /// Resource not found (HTTP 404)
    NotFound(String),
    /// Forbidden access (HTTP 403 non-rate-limit)
    Forbidden(String),
    /// Other 4xx responses
    ClientError(String),
    /// 5xx responses
    ServerError(String),
}

impl std::fmt::Display for HttpStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpStatusError::RateLimitExceeded(msg) => {
                write!(
                    f,
                    "Rate limit exceeded: {}. Try again later or set GITHUB_TOKEN environment variable.",
                    msg
                )
            }
            HttpStatusError::AuthenticationFailed(msg) => {
                write!(f, "Authentication failed: {}. Check your GITHUB_TOKEN.", msg)
            }
            HttpStatusError::NotFound(msg) => write!(f, "Not found: {}", msg),
            HttpStatusError::Forbidden(msg) => {
                write!(f, "Access forbidden: {}. You may need authentication.", msg)
            }
            HttpStatusError::ClientError(msg) => write!(f, "Request error: {}", msg),
            HttpStatusError::ServerError(msg) => write!(f, "Server error: {}", msg),
        }
    }
}

impl std::error::Error for HttpStatusError {}

/// Classifies an error produced by `error_for_status()`.
///
/// Returns `None` for errors that carry no status (connection failures,
/// timeouts, body decoding).
pub fn classify_status(error: &reqwest::Error) -> Option<HttpStatusError> {
    let status = error.status()?;
    let classified = match status {
        StatusCode::UNAUTHORIZED => HttpStatusError::AuthenticationFailed(
            "Invalid or missing authentication token".to_string(),
        ),
        StatusCode::FORBIDDEN => {
            let msg = error.to_string();
            if msg.contains("rate limit") {
                HttpStatusError::RateLimitExceeded("GitHub API rate limit exceeded".to_string())
            } else {
                HttpStatusError::Forbidden("Access to this resource is forbidden".to_string())
            }
        }
        StatusCode::TOO_MANY_REQUESTS => {
            HttpStatusError::RateLimitExceeded("Too many requests".to_string())
        }
        StatusCode::NOT_FOUND => {
            HttpStatusError::NotFound("The requested resource was not found".to_string())
        }
        s if s.is_client_error() => HttpStatusError::ClientError(format!("HTTP {}", s.as_u16())),
        s => HttpStatusError::ServerError(format!("HTTP {}", s.as_u16())),
    };
    Some(classified)
}

/// Converts an `error_for_status()` failure into an `anyhow::Error`, replacing
/// status errors with their readable classification.
pub fn check_status(error: reqwest::Error) -> anyhow::Error {
    match classify_status(&error) {
        Some(classified) => anyhow::Error::from(classified),
        None => anyhow::Error::from(error),
    }
}
