use thiserror::Error;

/// An environment variable required by the application is not set.
#[derive(Debug, Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVarError(pub String);

/// Reads a required environment variable, returning a structured error if
/// it's missing.
///
/// Connection strings and credentials are only ever read through this helper
/// so that a missing variable surfaces as a named, actionable error instead
/// of a generic `VarError`.
pub fn var(name: &str) -> Result<String, MissingEnvVarError> {
    std::env::var(name).map_err(|_| MissingEnvVarError(name.to_string()))
}
