//! Error types for tirea-merge operations.

use crate::{Operation, Path};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for tirea-merge operations.
pub type MergeResult<T> = Result<T, MergeError>;

/// Who is to blame for an error.
///
/// Transport layers map `Client` to a 4xx-style response and `Fatal` to a
/// 5xx-style response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The request payload is at fault.
    Client,
    /// The domain model or the patch configuration is at fault.
    Fatal,
}

/// Errors that can occur while merging a payload into an object graph.
#[derive(Debug, Error)]
pub enum MergeError {
    /// The JSON payload is empty, unparseable or not an object.
    #[error("malformed input `{argument}`: {message}")]
    MalformedInput {
        /// Name of the offending argument.
        argument: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// A path segment names a member that does not exist on a type.
    #[error("type `{type_name}` has no member `{member}` (path {path})")]
    StructuralMismatch {
        /// The path being resolved.
        path: Path,
        /// The type that lacks the member.
        type_name: &'static str,
        /// The missing member name.
        member: String,
    },

    /// The JSON shape does not fit the kind of member it addresses.
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        /// The path where the mismatch occurred.
        path: Path,
        /// What the member accepts.
        expected: &'static str,
        /// What the payload or graph provided.
        found: &'static str,
    },

    /// A collection element carries an identity that is not a UUID.
    #[error("invalid identity `{raw}` at {path}")]
    InvalidIdentity {
        /// The collection path.
        path: Path,
        /// The raw identity value as sent.
        raw: String,
    },

    /// A collection element references an identity that does not exist.
    #[error("no item with id {id} at {path}{hint}")]
    UnknownIdentity {
        /// The collection path.
        path: Path,
        /// The identity that could not be found.
        id: Uuid,
        /// Additional context appended to the message.
        hint: String,
    },

    /// The validation hook vetoed a mutation.
    #[error("validation rejected {operation} at {path}")]
    ValidationRejected {
        /// The path of the rejected mutation.
        path: Path,
        /// The kind of mutation that was rejected.
        operation: Operation,
    },

    /// An unset intermediate member cannot be default-constructed.
    #[error("cannot construct a default `{type_name}` at {path}")]
    Uninitializable {
        /// The path being resolved.
        path: Path,
        /// The type that has no parameterless construction.
        type_name: &'static str,
    },

    /// A value could not be converted to the target member's type.
    #[error("cannot set {path} to {value}: `{source_type}` does not convert to `{target_type}`")]
    Coercion {
        /// The path being assigned.
        path: Path,
        /// The value that failed to convert.
        value: Value,
        /// Declared type on the patch side.
        source_type: &'static str,
        /// Declared type on the original side.
        target_type: &'static str,
    },

    /// A configuration hook was bound to the wrong type.
    #[error("configuration error at {path}: {message}")]
    Configuration {
        /// The path the entry matched.
        path: Path,
        /// Description of what went wrong.
        message: String,
    },

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MergeError {
    /// Create a malformed input error.
    #[inline]
    pub fn malformed(argument: &'static str, message: impl Into<String>) -> Self {
        MergeError::MalformedInput {
            argument,
            message: message.into(),
        }
    }

    /// Create a structural mismatch error.
    #[inline]
    pub fn structural_mismatch(path: Path, type_name: &'static str, member: impl Into<String>) -> Self {
        MergeError::StructuralMismatch {
            path,
            type_name,
            member: member.into(),
        }
    }

    /// Create a type mismatch error.
    #[inline]
    pub fn type_mismatch(path: Path, expected: &'static str, found: &'static str) -> Self {
        MergeError::TypeMismatch {
            path,
            expected,
            found,
        }
    }

    /// Create an invalid identity error.
    #[inline]
    pub fn invalid_identity(path: Path, raw: impl Into<String>) -> Self {
        MergeError::InvalidIdentity {
            path,
            raw: raw.into(),
        }
    }

    /// Create an unknown identity error.
    #[inline]
    pub fn unknown_identity(path: Path, id: Uuid, hint: impl Into<String>) -> Self {
        MergeError::UnknownIdentity {
            path,
            id,
            hint: hint.into(),
        }
    }

    /// Create a validation rejected error.
    #[inline]
    pub fn rejected(path: Path, operation: Operation) -> Self {
        MergeError::ValidationRejected { path, operation }
    }

    /// Create an uninitializable member error.
    #[inline]
    pub fn uninitializable(path: Path, type_name: &'static str) -> Self {
        MergeError::Uninitializable { path, type_name }
    }

    /// Create a coercion error.
    #[inline]
    pub fn coercion(
        path: Path,
        value: Value,
        source_type: &'static str,
        target_type: &'static str,
    ) -> Self {
        MergeError::Coercion {
            path,
            value,
            source_type,
            target_type,
        }
    }

    /// Create a configuration error.
    #[inline]
    pub fn configuration(path: Path, message: impl Into<String>) -> Self {
        MergeError::Configuration {
            path,
            message: message.into(),
        }
    }

    /// Classify the error for status-code mapping.
    pub fn class(&self) -> ErrorClass {
        match self {
            MergeError::MalformedInput { .. }
            | MergeError::StructuralMismatch { .. }
            | MergeError::TypeMismatch { .. }
            | MergeError::InvalidIdentity { .. }
            | MergeError::UnknownIdentity { .. }
            | MergeError::ValidationRejected { .. } => ErrorClass::Client,
            MergeError::Uninitializable { .. }
            | MergeError::Coercion { .. }
            | MergeError::Configuration { .. }
            | MergeError::Serialization(_) => ErrorClass::Fatal,
        }
    }

    /// Returns true if the request payload caused this error.
    #[inline]
    pub fn is_client_error(&self) -> bool {
        self.class() == ErrorClass::Client
    }
}

/// Get the type name of a JSON value.
#[inline]
pub fn value_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
