//! Derive macro for the tirea-merge `MergeObject` trait.
//!
//! This crate provides the `#[derive(MergeObject)]` macro that generates:
//! - `impl MergeObject for {Name}`: the member table used by the merge engine
//! - `impl Identified for {Name}` when a field is marked `#[merge(id)]`
//!
//! # Usage
//!
//! ```ignore
//! use tirea_merge::MergeObject;
//! use uuid::Uuid;
//!
//! #[derive(Clone, Default, MergeObject)]
//! #[merge(rename_all = "PascalCase")]
//! struct Order {
//!     #[merge(id)]
//!     id: Uuid,
//!     customer: String,
//!     #[merge(nested)]
//!     lines: Vec<OrderLine>,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod codegen;
mod field_kind;
mod parse;

/// Derive the `MergeObject` trait for a struct with named fields.
///
/// # Attributes
///
/// ## Struct Attributes
///
/// - `#[merge(rename_all = "PascalCase")]`: Member naming rule
///   (`PascalCase`, `camelCase` or `snake_case`)
/// - `#[merge(no_default)]`: The type has no parameterless construction; unset
///   nested members and new collection elements of this type are errors
/// - `#[merge(identified)]`: The type implements `Identified` by hand
///
/// ## Field Attributes
///
/// - `#[merge(rename = "Name")]`: Use a different member name
/// - `#[merge(nested)]`: Treat as nested `MergeObject`. **Required** for struct
///   fields (and `Option`/`Vec`/map values of structs) that should be merged
///   member by member. Without this, the field is assigned as a whole value.
/// - `#[merge(id)]`: The `Uuid` identity of the type; generates `Identified`
/// - `#[merge(skip)]`: Exclude from the member table
///
/// Without `no_default` the type must implement `Default`; a `#[merge(id)]`
/// field left nil by `Default` gets a fresh random identity on construction.
#[proc_macro_derive(MergeObject, attributes(merge))]
pub fn derive_merge_object(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match codegen::expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
