use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type for calls against the remote file store.
pub type StoreResult<T> = std::result::Result<T, RemoteError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from local filesystem operations (upload, download).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Missing or unusable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bad file or folder name, rejected before anything is sent to the backend.
    #[error("Invalid name: {0}")]
    Validation(String),

    /// Attempt to delete or rename a folder the backend depends on.
    #[error("{0} is a protected folder")]
    ProtectedPath(String),

    /// No editor is registered for the file's extension.
    #[error("No editor available for {path}")]
    UnsupportedFileType { path: String },

    /// A listed path whose parent folder is not part of the tree.
    #[error("Parent not found for {0}")]
    ParentNotFound(String),

    /// A path that is not part of the local tree or open documents.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any failure reported by the file store.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Failures reported by the remote file store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("Request failed: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => RemoteError::Forbidden(message),
            404 => RemoteError::NotFound(message),
            409 => RemoteError::Conflict(message),
            _ => RemoteError::Status { status, message },
        }
    }
}
