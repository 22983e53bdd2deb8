//! Parsing logic for the MergeObject derive macro.

use crate::codegen::utils::RenameRule;
use darling::{ast, FromDeriveInput, FromField};
use syn::{Generics, Ident, Type};

/// Parsed struct-level options.
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(merge), supports(struct_named))]
pub struct MergeObjectInput {
    /// The struct identifier.
    pub ident: Ident,

    /// Generic parameters.
    pub generics: Generics,

    /// Struct data (fields).
    pub data: ast::Data<(), FieldInput>,

    /// Naming rule applied to fields without `rename`.
    #[darling(default)]
    pub rename_all: Option<String>,

    /// The type cannot be default-constructed.
    #[darling(default)]
    pub no_default: bool,

    /// The type implements `Identified` by hand.
    #[darling(default)]
    pub identified: bool,
}

impl MergeObjectInput {
    /// Get the fields as a vector.
    pub fn fields(&self) -> Vec<&FieldInput> {
        self.data
            .as_ref()
            .take_struct()
            .map(|s| s.fields.to_vec())
            .unwrap_or_default()
    }

    /// The field marked `#[merge(id)]`, if any.
    pub fn id_field(&self) -> Option<&FieldInput> {
        self.fields().into_iter().find(|f| f.id)
    }

    /// Parse the `rename_all` rule.
    pub fn rename_rule(&self) -> Result<RenameRule, String> {
        match self.rename_all.as_deref() {
            None => Ok(RenameRule::None),
            Some(rule) => RenameRule::parse(rule).ok_or_else(|| {
                format!(
                    "unknown rename_all rule `{rule}`; expected \"PascalCase\", \"camelCase\" or \"snake_case\""
                )
            }),
        }
    }
}

/// Parsed field-level options.
#[derive(Debug, FromField)]
#[darling(attributes(merge))]
pub struct FieldInput {
    /// Field identifier.
    pub ident: Option<Ident>,

    /// Field type.
    pub ty: Type,

    /// Rename the member.
    #[darling(default)]
    pub rename: Option<String>,

    /// Exclude from the member table.
    #[darling(default)]
    pub skip: bool,

    /// Treat as nested MergeObject.
    #[darling(default)]
    pub nested: bool,

    /// The identity field.
    #[darling(default)]
    pub id: bool,
}

impl FieldInput {
    /// Get the field identifier.
    ///
    /// `supports(struct_named)` guarantees every field is named.
    pub fn ident(&self) -> &Ident {
        self.ident.as_ref().expect("named field required")
    }

    /// Get the member name for this field.
    pub fn member_name(&self, rule: RenameRule) -> String {
        match &self.rename {
            Some(name) => name.clone(),
            None => {
                let raw = self.ident().to_string();
                rule.apply(raw.strip_prefix("r#").unwrap_or(&raw))
            }
        }
    }

    /// Check if this field is part of the member table.
    pub fn is_included(&self) -> bool {
        !self.skip
    }
}
