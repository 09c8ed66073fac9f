//! Status classification for registry requests.

use reqwest::StatusCode;

/// Maximum number of attempts for a registry request.
pub const MAX_RETRIES: usize = 3;

/// Delay between attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// Registry responses that will not change on a second attempt.
#[derive(Debug)]
pub enum NonRetryableError {
    /// HTTP 429
    RateLimited,
    /// HTTP 401
    Unauthorized,
    /// HTTP 403
    Forbidden,
    /// HTTP 404
    NotFound,
    /// Any other 4xx
    ClientError(u16),
}

impl std::fmt::Display for NonRetryableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NonRetryableError::RateLimited => {
                write!(f, "Registry rate limit exceeded. Try again later.")
            }
            NonRetryableError::Unauthorized => write!(
                f,
                "Registry rejected the request as unauthorized. Check the auth token in your .npmrc."
            ),
            NonRetryableError::Forbidden => write!(f, "Registry denied access to this package."),
            NonRetryableError::NotFound => write!(f, "404 Not Found"),
            NonRetryableError::ClientError(status) => {
                write!(f, "Registry request failed with HTTP {}", status)
            }
        }
    }
}

impl std::error::Error for NonRetryableError {}

/// Maps a failed response onto [`NonRetryableError`].
/// Returns Ok(()) when the failure is transient (5xx, connection, timeout).
pub fn classify_error(error: &reqwest::Error) -> Result<(), NonRetryableError> {
    let Some(status) = error.status() else {
        return Ok(());
    };

    match status {
        StatusCode::UNAUTHORIZED => Err(NonRetryableError::Unauthorized),
        StatusCode::FORBIDDEN => Err(NonRetryableError::Forbidden),
        StatusCode::NOT_FOUND => Err(NonRetryableError::NotFound),
        StatusCode::TOO_MANY_REQUESTS => Err(NonRetryableError::RateLimited),
        s if s.is_client_error() => Err(NonRetryableError::ClientError(s.as_u16())),
        _ => Ok(()),
    }
}

/// Converts an `error_for_status()` failure into an `anyhow::Error`, replacing
/// permanent failures with a [`NonRetryableError`].
pub fn check_retryable(error: reqwest::Error) -> anyhow::Error {
    match classify_error(&error) {
        Ok(()) => anyhow::Error::from(error),
        Err(non_retryable) => anyhow::Error::from(non_retryable),
    }
}
