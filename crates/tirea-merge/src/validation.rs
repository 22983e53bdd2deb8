//! Validation hook.
//!
//! The caller supplies one predicate that is consulted before every
//! mutation. A single `false` aborts the whole merge.

use crate::{MergeError, MergeObject, MergeResult, Path};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The kind of mutation being validated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// A leaf member is about to be assigned.
    UpdateProperty,
    /// A new element is about to be appended to a collection.
    AddItem,
    /// An existing element is about to be removed from a collection.
    RemoveItem,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::UpdateProperty => "update-property",
            Operation::AddItem => "add-item",
            Operation::RemoveItem => "remove-item",
        })
    }
}

/// Everything the validation hook gets to see about one mutation.
#[derive(Clone, Copy)]
pub struct ValidationRequest<'a> {
    /// Full path of the member or collection.
    pub path: &'a Path,
    /// Name of the member being changed.
    pub property: &'a str,
    /// Candidate value: the new leaf value, or the JSON element for
    /// collection operations.
    pub value: &'a Value,
    /// Kind of mutation.
    pub operation: Operation,
    /// The original-side object being changed: the owner of the member for
    /// updates, the element for adds and removes.
    pub original_item: Option<&'a dyn MergeObject>,
    /// The patch-side counterpart of `original_item`.
    pub patch_item: Option<&'a dyn MergeObject>,
}

impl fmt::Debug for ValidationRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationRequest")
            .field("path", &self.path)
            .field("property", &self.property)
            .field("value", &self.value)
            .field("operation", &self.operation)
            .field("original_item", &self.original_item.map(|o| o.type_name()))
            .field("patch_item", &self.patch_item.map(|p| p.type_name()))
            .finish()
    }
}

/// Veto predicate over individual mutations.
///
/// Implemented for any `Fn(&ValidationRequest<'_>) -> bool`.
pub trait Validator: Send + Sync {
    /// Return `false` to reject the mutation and abort the merge.
    fn validate(&self, request: &ValidationRequest<'_>) -> bool;
}

impl<F> Validator for F
where
    F: Fn(&ValidationRequest<'_>) -> bool + Send + Sync,
{
    fn validate(&self, request: &ValidationRequest<'_>) -> bool {
        self(request)
    }
}

/// The default validator: approves every mutation.
#[derive(Clone, Copy, Debug, Default)]
pub struct ApproveAll;

impl Validator for ApproveAll {
    fn validate(&self, _request: &ValidationRequest<'_>) -> bool {
        true
    }
}

/// Run the hook and turn a rejection into an error.
pub(crate) fn dispatch(validator: &dyn Validator, request: ValidationRequest<'_>) -> MergeResult<()> {
    if validator.validate(&request) {
        return Ok(());
    }
    tracing::warn!(
        path = %request.path,
        operation = %request.operation,
        "validation hook rejected mutation"
    );
    Err(MergeError::rejected(request.path.clone(), request.operation))
}
