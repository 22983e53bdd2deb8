//! Selective merge-patch engine for HTTP PATCH handlers.
//!
//! `tirea-merge` applies only the members that are structurally present in a
//! JSON request body to a persisted object, leaving every other member
//! untouched.
//!
//! # Core Concepts
//!
//! - **Original graph**: the persisted object being patched (`&mut O`)
//! - **Patch graph**: a fully-populated candidate object mapped from the
//!   request; it supplies the values (`&P`)
//! - **Payload**: the raw JSON body; only its key presence decides which
//!   members are applied
//! - **MergeObject**: trait exposing a per-type member table, usually derived
//! - **Identified**: the identity contract for collection elements
//! - **PatchConfig**: per-path overrides (custom assignment, item factories,
//!   forced collection replacement)
//! - **Validator**: veto hook consulted before every mutation
//!
//! A merge is all-or-nothing: on any error the original object is left
//! exactly as it was.
//!
//! # Quick Start
//!
//! ```
//! use tirea_merge::{merge_patch, MergeObject};
//! use uuid::Uuid;
//!
//! #[derive(Debug, Clone, Default, PartialEq, MergeObject)]
//! #[merge(rename_all = "PascalCase")]
//! struct Phone {
//!     #[merge(id)]
//!     id: Uuid,
//!     phone_number: String,
//! }
//!
//! #[derive(Debug, Clone, Default, MergeObject)]
//! #[merge(rename_all = "PascalCase")]
//! struct Person {
//!     first_name: String,
//!     last_name: String,
//!     #[merge(nested)]
//!     phone_numbers: Vec<Phone>,
//! }
//!
//! let phone = Phone { id: Uuid::new_v4(), phone_number: "1234".into() };
//! let mut person = Person {
//!     first_name: "John".into(),
//!     last_name: "Mustermann".into(),
//!     phone_numbers: vec![phone.clone()],
//! };
//! let patch = Person {
//!     first_name: "John".into(),
//!     last_name: "Doe".into(),
//!     phone_numbers: vec![Phone { phone_number: "5678".into(), ..phone.clone() }],
//! };
//!
//! let json = format!(
//!     r#"{{"LastName": "Doe", "PhoneNumbers": [{{"Id": "{}", "PhoneNumber": "5678"}}]}}"#,
//!     phone.id
//! );
//! merge_patch(&mut person, &patch, &json).unwrap();
//!
//! assert_eq!(person.first_name, "John");
//! assert_eq!(person.last_name, "Doe");
//! assert_eq!(person.phone_numbers.len(), 1);
//! assert_eq!(person.phone_numbers[0].phone_number, "5678");
//! ```

mod coerce;
mod collection;
mod config;
mod error;
mod merger;
mod object;
mod path;
mod report;
mod setter;
mod slot;
mod validation;
mod walker;

#[cfg(test)]
mod fixtures;

pub use config::{
    ConfigAction, ConfigEntry, ItemFactory, MergeOptions, PatchConfig, PathMatcher, SetAction,
};
pub use error::{value_type_name, ErrorClass, MergeError, MergeResult};
pub use merger::{merge_patch, parse_payload, Merger};
pub use object::{
    descriptor_of, FieldDescriptor, FieldGetter, FieldKind, FieldSetter, Identified,
    MergeObject, TypeDescriptor,
};
pub use path::Path;
pub use report::{Change, ChangeKind, MergeReport};
pub use slot::{FieldMut, FieldRef, Leaf, LeafMap, ObjectCollection, ObjectMap, OptionalObject};
pub use validation::{ApproveAll, Operation, ValidationRequest, Validator};

// Re-export derive macro when feature is enabled
#[cfg(feature = "derive")]
pub use tirea_merge_derive::MergeObject;

// Re-exports used by generated code
pub use serde_json::Value;
pub use uuid::Uuid;
