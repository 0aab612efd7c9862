use thiserror::Error;

/// Everything a dashboard request can fail with.
///
/// The UI never distinguishes these beyond their message, so `Display`
/// is the operator-facing text and nothing more.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Username or password was left empty.
    #[error("Enter username and password before sending a request.")]
    AuthenticationMissing,

    /// A query parameter was malformed.
    #[error("{0}")]
    Validation(String),

    /// The API answered with a non-success status.
    #[error("{0}")]
    Remote(String),

    /// The request never produced a response.
    #[error("Request failed: {0}")]
    Transport(String),

    /// A success response claimed JSON but could not be parsed.
    #[error("Failed to parse response body: {0}")]
    Decode(String),

    /// The base URL could not be turned into a request URL.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl DashboardError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
