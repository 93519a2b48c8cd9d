use thiserror::Error;

use shared_utils::env::MissingEnvVarError;

/// Errors that can occur while looking up a contact.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The HTTP request itself failed (network, timeout, or a body that
    /// could not be decoded as a contact).
    #[error("CRM request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The CRM kept answering 429 and the retry budget ran out. Distinct
    /// from "not found": the contact may well exist, we just could not ask.
    #[error("CRM rate limit: gave up after {attempts} attempts")]
    RateLimitExhausted {
        /// How many requests were attempted before giving up.
        attempts: u32,
    },

    /// The directory backend reported a condition of its own (used by
    /// non-HTTP implementations).
    #[error("directory error: {0}")]
    Api(String),
}

/// Errors that can occur while constructing a directory client.
#[derive(Debug, Error)]
pub enum DirectoryInitError {
    /// A required environment variable is missing.
    #[error(transparent)]
    MissingEnv(#[from] MissingEnvVarError),

    /// The bearer token cannot be used as an HTTP header value.
    #[error("CRM access token is not a valid header value")]
    InvalidToken(#[from] reqwest::header::InvalidHeaderValue),

    /// The underlying HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured request pacing interval is zero.
    #[error("request pacing interval must be non-zero")]
    InvalidPacing,
}
