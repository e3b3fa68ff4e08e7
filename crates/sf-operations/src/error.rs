//! Error types for sf-operations.

/// Result type alias for sf-operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sf-operations.
///
/// Returned by batch submission. Failures of individual operations are not
/// errors here; they are captured as [`OperationFailure`](crate::OperationFailure)
/// on the operation itself.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if a record type or query template failed to map.
    pub fn is_mapping(&self) -> bool {
        matches!(self.kind, ErrorKind::Mapping(_))
    }

    /// Returns true if an operation was used out of lifecycle order.
    pub fn is_illegal_state(&self) -> bool {
        matches!(self.kind, ErrorKind::IllegalState(_))
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Encoding a request failed on a schema problem. The message carries
    /// the mapping error's own prefix.
    #[error("{0}")]
    Mapping(String),

    /// An operation was submitted twice, or observed before completion.
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// A submitted batch task panicked or was cancelled. Produced by
    /// `handle.await?` on the handle returned from `Executor::submit`.
    #[error("Batch task failed: {0}")]
    Join(String),
}

/// Reading an operation's result or failure in the wrong state, or
/// transitioning it out of order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct IllegalStateError(pub(crate) String);

impl IllegalStateError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<busbar_sf_mapping::Error> for Error {
    fn from(err: busbar_sf_mapping::Error) -> Self {
        Error::with_source(ErrorKind::Mapping(err.kind.to_string()), err)
    }
}

impl From<IllegalStateError> for Error {
    fn from(err: IllegalStateError) -> Self {
        Error::with_source(ErrorKind::IllegalState(err.0.clone()), err)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::with_source(ErrorKind::Join(err.to_string()), err)
    }
}
