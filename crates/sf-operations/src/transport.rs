//! The boundary between the executor and whatever talks to the remote service.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::operation::OperationKind;

/// One encoded request, ready for a transport.
#[derive(Debug, Clone, PartialEq)]
pub enum WireRequest {
    Create {
        object: String,
        body: Value,
    },
    Get {
        object: String,
        id: String,
        /// Wire names of the fields to return.
        fields: Vec<String>,
    },
    Update {
        object: String,
        id: String,
        body: Value,
    },
    Patch {
        object: String,
        id: String,
        body: Value,
    },
    Delete {
        object: String,
        id: String,
    },
    Query {
        soql: String,
    },
    /// Next page of an earlier query.
    QueryMore {
        next_records_url: String,
    },
}

impl WireRequest {
    pub fn kind(&self) -> OperationKind {
        match self {
            WireRequest::Create { .. } => OperationKind::Create,
            WireRequest::Get { .. } => OperationKind::Get,
            WireRequest::Update { .. } => OperationKind::Update,
            WireRequest::Patch { .. } => OperationKind::Patch,
            WireRequest::Delete { .. } => OperationKind::Delete,
            WireRequest::Query { .. } | WireRequest::QueryMore { .. } => OperationKind::Query,
        }
    }

    /// Wire name of the target object; `None` for queries.
    pub fn object(&self) -> Option<&str> {
        match self {
            WireRequest::Create { object, .. }
            | WireRequest::Get { object, .. }
            | WireRequest::Update { object, .. }
            | WireRequest::Patch { object, .. }
            | WireRequest::Delete { object, .. } => Some(object),
            WireRequest::Query { .. } | WireRequest::QueryMore { .. } => None,
        }
    }
}

/// A request the remote service rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{error_code}: {message}")]
pub struct RemoteFailure {
    /// HTTP-style status of the entry.
    pub status: u16,
    pub error_code: String,
    pub message: String,
    /// Fields the remote service blamed, if any.
    pub fields: Vec<String>,
}

impl RemoteFailure {
    pub fn new(status: u16, error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error_code: error_code.into(),
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }
}

/// Outcome of one request: the response document, or why it failed.
pub type WireResponse = std::result::Result<Value, RemoteFailure>;

/// The whole batch failed; no entry can be trusted.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    /// HTTP status of the batch request, when it got that far.
    pub status: Option<u16>,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            source: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status: u16) -> Self {
        Self {
            status: Some(status),
            ..Self::new(message)
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            source: Some(Box::new(source)),
            ..Self::new(message)
        }
    }
}

/// Sends grouped requests to the remote service.
///
/// Responses correspond to requests by position. `Err` fails the whole
/// group; a per-entry `Err` fails only that entry.
pub trait Transport: Send + Sync + 'static {
    /// Largest group the transport accepts in one `send`.
    fn max_batch_size(&self) -> usize;

    fn send(
        &self,
        requests: Vec<WireRequest>,
    ) -> impl Future<Output = std::result::Result<Vec<WireResponse>, TransportError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn max_batch_size(&self) -> usize {
        (**self).max_batch_size()
    }

    fn send(
        &self,
        requests: Vec<WireRequest>,
    ) -> impl Future<Output = std::result::Result<Vec<WireResponse>, TransportError>> + Send {
        (**self).send(requests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_kind_and_object() {
        let create = WireRequest::Create {
            object: "Account".into(),
            body: json!({"Name": "Acme"}),
        };
        assert_eq!(create.kind(), OperationKind::Create);
        assert_eq!(create.object(), Some("Account"));

        let more = WireRequest::QueryMore {
            next_records_url: "/services/data/v62.0/query/01g-2000".into(),
        };
        assert_eq!(more.kind(), OperationKind::Query);
        assert_eq!(more.object(), None);
    }

    #[test]
    fn test_remote_failure_display() {
        let failure = RemoteFailure::new(400, "REQUIRED_FIELD_MISSING", "Required fields are missing: [Name]")
            .with_fields(vec!["Name".into()]);
        assert_eq!(
            failure.to_string(),
            "REQUIRED_FIELD_MISSING: Required fields are missing: [Name]"
        );
        assert_eq!(failure.fields, vec!["Name"]);
    }

    #[test]
    fn test_transport_error_constructors() {
        let err = TransportError::with_status("composite batch failed", 503);
        assert_eq!(err.status, Some(503));
        assert!(err.source.is_none());

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = TransportError::with_source("connection lost", io);
        assert!(std::error::Error::source(&err).is_some());
    }
}
