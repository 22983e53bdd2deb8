//! Shared utility functions for code generation.

use quote::ToTokens;

/// Extract the type name from a Type.
pub fn get_type_name(ty: &syn::Type) -> String {
    match ty {
        syn::Type::Path(type_path) => match type_path.path.segments.last() {
            Some(segment) => segment.ident.to_string(),
            None => "Unknown".to_string(),
        },
        _ => "Unknown".to_string(),
    }
}

/// Render a type the way it is written, without token spacing.
pub fn declared_type(ty: &syn::Type) -> String {
    ty.to_token_stream()
        .to_string()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Member naming rule from `#[merge(rename_all = "...")]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameRule {
    /// Keep the field name.
    None,
    /// `first_name` → `FirstName`
    PascalCase,
    /// `first_name` → `firstName`
    CamelCase,
    /// Field names are already snake_case.
    SnakeCase,
}

impl RenameRule {
    /// Parse a rule name.
    pub fn parse(rule: &str) -> Option<Self> {
        match rule {
            "PascalCase" => Some(RenameRule::PascalCase),
            "camelCase" => Some(RenameRule::CamelCase),
            "snake_case" => Some(RenameRule::SnakeCase),
            _ => None,
        }
    }

    /// Apply the rule to a snake_case field name.
    pub fn apply(self, field: &str) -> String {
        match self {
            RenameRule::None | RenameRule::SnakeCase => field.to_string(),
            RenameRule::PascalCase => pascal_case(field),
            RenameRule::CamelCase => {
                let pascal = pascal_case(field);
                let mut chars = pascal.chars();
                match chars.next() {
                    Some(first) => first.to_lowercase().chain(chars).collect(),
                    None => pascal,
                }
            }
        }
    }
}

fn pascal_case(field: &str) -> String {
    field
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_rename_rules() {
        assert_eq!(RenameRule::PascalCase.apply("phone_numbers"), "PhoneNumbers");
        assert_eq!(RenameRule::PascalCase.apply("id"), "Id");
        assert_eq!(RenameRule::CamelCase.apply("phone_numbers"), "phoneNumbers");
        assert_eq!(RenameRule::SnakeCase.apply("phone_numbers"), "phone_numbers");
        assert_eq!(RenameRule::None.apply("phone_numbers"), "phone_numbers");
    }

    #[test]
    fn test_declared_type() {
        let ty: syn::Type = parse_quote!(Option<Vec<u32>>);
        assert_eq!(declared_type(&ty), "Option<Vec<u32>>");
        assert_eq!(get_type_name(&ty), "Option");
    }
}
