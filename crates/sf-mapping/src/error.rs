//! Error types for sf-mapping.

/// Result type alias for sf-mapping operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sf-mapping operations.
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

    /// The broad category of this error.
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Returns true for schema problems detected while building descriptors
    /// or expanding query templates.
    pub fn is_mapping(&self) -> bool {
        self.category() == ErrorCategory::Mapping
    }

    /// Returns true for malformed or unrecognizable wire data.
    pub fn is_deserialization(&self) -> bool {
        self.category() == ErrorCategory::Deserialization
    }

    /// Attach the wire name of the field being converted to a type mismatch.
    pub(crate) fn in_field(mut self, wire_name: &str) -> Self {
        if let ErrorKind::TypeMismatch { field, .. } = &mut self.kind {
            if field.is_none() {
                *field = Some(wire_name.to_string());
            }
        }
        self
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

/// Broad grouping of [`ErrorKind`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Build-time schema problems. Always fatal to the call that triggered
    /// descriptor construction.
    Mapping,
    /// Wire data that cannot be turned into records.
    Deserialization,
}

/// The kind of error that occurred.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ErrorKind {
    /// A declared field has neither a read nor a write binding.
    #[error("Mapping error: field '{field}' on {record} has neither a read nor a write binding")]
    UnreachableField { record: String, field: String },

    /// Two fields of one record map to the same wire name.
    #[error("Mapping error: duplicate wire name '{wire_name}' on {record}")]
    DuplicateWireName { record: String, wire_name: String },

    /// A polymorphic field resolved to an empty candidate set.
    #[error("Mapping error: polymorphic field '{field}' on {record} has no candidate types")]
    EmptyCandidates { record: String, field: String },

    /// Two candidates of one polymorphic field share a wire name.
    #[error("Mapping error: candidates of '{field}' on {record} share wire name '{wire_name}'")]
    CandidateCollision {
        record: String,
        field: String,
        wire_name: String,
    },

    /// A polymorphic candidate is not a usable concrete record type.
    #[error("Mapping error: candidate {candidate} of '{field}' on {record} is invalid: {reason}")]
    InvalidCandidate {
        record: String,
        field: String,
        candidate: String,
        reason: String,
    },

    /// A typed record field names an abstract record type.
    #[error("Mapping error: field '{field}' on {record} is typed as abstract {target}; declare it polymorphic")]
    AbstractTarget {
        record: String,
        field: String,
        target: String,
    },

    /// A query wildcard could not be resolved to a record type.
    #[error("Mapping error: cannot expand '{path}' on {record}: {reason}")]
    UnresolvedWildcard {
        record: String,
        path: String,
        reason: String,
    },

    /// A polymorphic discriminator matched none of the candidates.
    #[error("Deserialization error: unrecognized polymorphic type '{discriminator}'")]
    UnrecognizedPolymorphicType { discriminator: String },

    /// A polymorphic value carried no `attributes.type` discriminator.
    #[error("Deserialization error: missing type discriminator (attributes.type)")]
    MissingDiscriminator,

    /// A wire or field value is incompatible with the declared field type.
    #[error(
        "Deserialization error: type mismatch{}: expected {expected}, found {found}",
        field.as_ref().map(|f| format!(" in '{}'", f)).unwrap_or_default()
    )]
    TypeMismatch {
        field: Option<String>,
        expected: &'static str,
        found: String,
    },

    /// A datetime or date string did not parse.
    #[error("Deserialization error: invalid date/time '{0}'")]
    InvalidDateTime(String),

    /// A record document was not a JSON object.
    #[error("Deserialization error: expected a JSON object for {0}")]
    NotAnObject(String),
}

impl ErrorKind {
    /// The broad category of this error kind.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorKind::UnreachableField { .. }
            | ErrorKind::DuplicateWireName { .. }
            | ErrorKind::EmptyCandidates { .. }
            | ErrorKind::CandidateCollision { .. }
            | ErrorKind::InvalidCandidate { .. }
            | ErrorKind::AbstractTarget { .. }
            | ErrorKind::UnresolvedWildcard { .. } => ErrorCategory::Mapping,
            ErrorKind::UnrecognizedPolymorphicType { .. }
            | ErrorKind::MissingDiscriminator
            | ErrorKind::TypeMismatch { .. }
            | ErrorKind::InvalidDateTime(_)
            | ErrorKind::NotAnObject(_) => ErrorCategory::Deserialization,
        }
    }
}
