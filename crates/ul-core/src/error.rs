//! # Error Taxonomy
//!
//! Failures raised while fetching and decoding profiles, and the
//! classified form the list controller keeps in its state.

use thiserror::Error;

/// Transport-level reasons a fetch can fail.
///
/// The `Display` text is the user-facing message shown on the error screen.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkReason {
    /// No usable network interface / route.
    #[error("You appear to be offline. Please check your internet connection.")]
    Offline,

    #[error("The request timed out. Please try again.")]
    TimedOut,

    /// DNS failure, refused connection or unreachable host.
    #[error("Unable to connect to the server. Please try again later.")]
    HostUnreachable,

    /// The connection dropped mid-request.
    #[error("The network connection was lost. Please try again.")]
    ConnectionLost,

    /// Anything else the transport reported, with its description.
    #[error("A network error occurred: {0}")]
    Other(String),
}

/// A record in the payload could not be turned into a profile.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The birth date did not match `yyyy-MM-ddTHH:mm:ss.SSSZ`.
    #[error("malformed date: {0:?}")]
    MalformedDate(String),

    /// The payload was not the expected JSON shape.
    #[error("invalid payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything a [`ProfileGateway`](crate::traits::ProfileGateway) may fail with.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    Network(#[from] NetworkReason),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("{0}")]
    Unexpected(String),
}

/// The classified failure stored in [`ListState::last_error`](crate::controller::ListState).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorInfo {
    #[error(transparent)]
    NetworkError(NetworkReason),

    #[error("{0}")]
    UnexpectedError(String),
}

impl ErrorInfo {
    /// Maps any gateway failure to exactly one variant.
    pub fn classify(err: FetchError) -> Self {
        match err {
            FetchError::Network(reason) => ErrorInfo::NetworkError(reason),
            FetchError::Decode(decode) => ErrorInfo::UnexpectedError(decode.to_string()),
            FetchError::Unexpected(message) => ErrorInfo::UnexpectedError(message),
        }
    }

    /// Text for the error screen. Unexpected failures are shown verbatim.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ErrorInfo::NetworkError(_))
    }
}

impl From<FetchError> for ErrorInfo {
    fn from(err: FetchError) -> Self {
        ErrorInfo::classify(err)
    }
}

/// A specialized Result type for decoding.
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;
