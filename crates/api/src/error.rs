use thiserror::Error;

/// Failures surfaced by [`JenkinsClient`](crate::JenkinsClient) operations.
/// Nothing is retried; the caller sees the first failure as-is.
#[derive(Error, Debug)]
pub enum JenkinsError {
    #[error("No server entry for project '{project}' in the configuration")]
    MissingConfig { project: String },

    #[error("Could not reach Jenkins: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Jenkins rejected the credentials: {message}")]
    AuthenticationFailed { message: String },

    #[error("Not found on this Jenkins instance: {resource}")]
    NotFound { resource: String },

    #[error("Jenkins rejected the request: {message}")]
    BadRequest { message: String },

    #[error("Jenkins answered {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Response did not match the expected shape: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, JenkinsError>;
