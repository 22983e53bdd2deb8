//! Code generation for MergeObject derive macro.

mod descriptor;
pub(crate) mod utils;

use crate::field_kind::FieldKind;
use crate::parse::MergeObjectInput;
use darling::FromDeriveInput;
use proc_macro2::TokenStream;
use syn::DeriveInput;

/// Main entry point for code generation.
pub fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let parsed = MergeObjectInput::from_derive_input(input)
        .map_err(|e| syn::Error::new_spanned(input, e.to_string()))?;

    if !parsed.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &parsed.generics,
            "#[derive(MergeObject)] does not support generic types",
        ));
    }
    let rule = parsed
        .rename_rule()
        .map_err(|message| syn::Error::new_spanned(&parsed.ident, message))?;

    // Validate field attributes
    let mut id_seen = false;
    for field in parsed.fields() {
        if field.id {
            if id_seen {
                return Err(syn::Error::new_spanned(
                    field.ident(),
                    "only one field can be marked #[merge(id)]",
                ));
            }
            if field.skip || field.nested {
                return Err(syn::Error::new_spanned(
                    field.ident(),
                    "#[merge(id)] cannot be combined with #[merge(skip)] or #[merge(nested)]",
                ));
            }
            if parsed.identified {
                return Err(syn::Error::new_spanned(
                    field.ident(),
                    "#[merge(id)] generates `Identified`; remove #[merge(identified)] from the struct",
                ));
            }
            id_seen = true;
        }

        if field.is_included() {
            FieldKind::from_type(&field.ty, field.nested)
                .shape(field.nested)
                .map_err(|message| syn::Error::new_spanned(&field.ty, message))?;
        }
    }

    descriptor::generate(&parsed, rule)
}
