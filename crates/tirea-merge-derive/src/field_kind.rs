//! Field type analysis for code generation.

use crate::codegen::utils::get_type_name;
use syn::{GenericArgument, PathArguments, Type, TypePath};

/// The kind of a field, determining which member view to generate.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// A value assigned as a whole (String, i32, plain serde structs, ...)
    Primitive,

    /// An Option<T> type
    Option(Box<FieldKind>),

    /// A Vec<T> type
    Vec(Box<FieldKind>),

    /// A BTreeMap<K, V> or HashMap<K, V> type
    Map {
        /// Whether the key type is `String`.
        string_key: bool,
        value: Box<FieldKind>,
    },

    /// A nested MergeObject type
    Nested,
}

/// How the merge engine sees a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberShape {
    Leaf,
    Object,
    OptionalObject,
    Collection,
    Map,
    LeafMap,
}

impl MemberShape {
    /// The runtime `FieldKind` variant name.
    pub fn variant(self) -> &'static str {
        match self {
            MemberShape::Leaf => "Leaf",
            MemberShape::Object => "Object",
            MemberShape::OptionalObject => "OptionalObject",
            MemberShape::Collection => "Collection",
            MemberShape::Map => "Map",
            MemberShape::LeafMap => "LeafMap",
        }
    }
}

impl FieldKind {
    /// Analyze a type and determine its kind.
    ///
    /// The `is_nested_attr` flag marks the **leaf type** as nested,
    /// while container structure (Option/Vec/Map) is preserved.
    ///
    /// Examples:
    /// - `Option<Address>` with `nested=true` → `Option(Nested)`
    /// - `Vec<Phone>` with `nested=true` → `Vec(Nested)`
    /// - `Address` with `nested=true` → `Nested`
    pub fn from_type(ty: &Type, is_nested_attr: bool) -> Self {
        match ty {
            Type::Path(type_path) => Self::from_type_path(type_path, is_nested_attr),
            _ => FieldKind::Primitive,
        }
    }

    fn from_type_path(type_path: &TypePath, is_nested_attr: bool) -> Self {
        let Some(segment) = type_path.path.segments.last() else {
            return FieldKind::Primitive;
        };

        match segment.ident.to_string().as_str() {
            "Option" => match extract_single_generic_arg(&segment.arguments) {
                Some(inner) => FieldKind::Option(Box::new(Self::from_type(inner, is_nested_attr))),
                None => FieldKind::Primitive,
            },
            "Vec" => match extract_single_generic_arg(&segment.arguments) {
                Some(inner) => FieldKind::Vec(Box::new(Self::from_type(inner, is_nested_attr))),
                None => FieldKind::Primitive,
            },
            "BTreeMap" | "HashMap" => match extract_two_generic_args(&segment.arguments) {
                Some((key, value)) => FieldKind::Map {
                    string_key: get_type_name(key) == "String",
                    value: Box::new(Self::from_type(value, is_nested_attr)),
                },
                None => FieldKind::Primitive,
            },
            // Common primitive types
            "String" | "str" | "bool" | "char" | "i8" | "i16" | "i32" | "i64" | "i128"
            | "isize" | "u8" | "u16" | "u32" | "u64" | "u128" | "usize" | "f32" | "f64"
            | "Uuid" | "Value" => FieldKind::Primitive,
            // Unknown types - check nested attr
            _ if is_nested_attr => FieldKind::Nested,
            _ => FieldKind::Primitive,
        }
    }

    /// Map the type structure to a member shape.
    ///
    /// `nested` fields must be a nested type, optionally wrapped in exactly one
    /// `Option`, `Vec` or string-keyed map.
    pub fn shape(&self, nested: bool) -> Result<MemberShape, &'static str> {
        if !nested {
            return Ok(match self {
                FieldKind::Map {
                    string_key: true,
                    value,
                } if !value.contains_nested() => MemberShape::LeafMap,
                _ => MemberShape::Leaf,
            });
        }
        match self {
            FieldKind::Nested => Ok(MemberShape::Object),
            FieldKind::Option(inner) if inner.is_nested() => Ok(MemberShape::OptionalObject),
            FieldKind::Vec(inner) if inner.is_nested() => Ok(MemberShape::Collection),
            FieldKind::Map {
                string_key: true,
                value,
            } if value.is_nested() => Ok(MemberShape::Map),
            FieldKind::Map {
                string_key: false, ..
            } => Err("#[merge(nested)] maps must have `String` keys"),
            FieldKind::Primitive => Err(
                "#[merge(nested)] requires a struct type deriving MergeObject, not a primitive",
            ),
            _ => Err(
                "#[merge(nested)] supports `T`, `Option<T>`, `Vec<T>` and `HashMap/BTreeMap<String, T>` \
                 where `T` derives MergeObject",
            ),
        }
    }

    /// Check if this is a nested type.
    pub fn is_nested(&self) -> bool {
        matches!(self, FieldKind::Nested)
    }

    fn contains_nested(&self) -> bool {
        match self {
            FieldKind::Nested => true,
            FieldKind::Option(inner) | FieldKind::Vec(inner) => inner.contains_nested(),
            FieldKind::Map { value, .. } => value.contains_nested(),
            FieldKind::Primitive => false,
        }
    }
}

/// Extract a single generic type argument from path arguments.
fn extract_single_generic_arg(args: &PathArguments) -> Option<&Type> {
    match args {
        PathArguments::AngleBracketed(ab) if ab.args.len() == 1 => match ab.args.first()? {
            GenericArgument::Type(ty) => Some(ty),
            _ => None,
        },
        _ => None,
    }
}

/// Extract two generic type arguments from path arguments (for Map types).
fn extract_two_generic_args(args: &PathArguments) -> Option<(&Type, &Type)> {
    match args {
        PathArguments::AngleBracketed(ab) if ab.args.len() == 2 => {
            let mut iter = ab.args.iter();
            match (iter.next(), iter.next()) {
                (Some(GenericArgument::Type(key)), Some(GenericArgument::Type(value))) => {
                    Some((key, value))
                }
                _ => None,
            }
        }
        _ => None,
    }
}
