//! Member table code generation.
//!
//! Generates `impl MergeObject` with one `FieldDescriptor` per included field.
//! Accessors are non-capturing closures coerced to fn pointers.

use super::utils::{declared_type, RenameRule};
use crate::field_kind::{FieldKind, MemberShape};
use crate::parse::{FieldInput, MergeObjectInput};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

/// Generate the MergeObject (and Identified) implementations.
pub fn generate(input: &MergeObjectInput, rule: RenameRule) -> syn::Result<TokenStream> {
    let struct_name = &input.ident;
    let type_name = struct_name.to_string();

    let descriptors = input
        .fields()
        .into_iter()
        .filter(|f| f.is_included())
        .map(|f| generate_field(f, rule))
        .collect::<syn::Result<Vec<_>>>()?;

    let id_field = input.id_field();
    let identified = id_field.is_some() || input.identified;
    let construct = generate_construct(input.no_default, id_field);

    let identity = if identified {
        quote! {
            fn identity(&self) -> ::std::option::Option<::tirea_merge::Uuid> {
                ::std::option::Option::Some(<Self as ::tirea_merge::Identified>::id(self))
            }
        }
    } else {
        TokenStream::new()
    };

    let identified_impl = match id_field {
        Some(field) => {
            let field_name = field.ident();
            quote! {
                impl ::tirea_merge::Identified for #struct_name {
                    fn id(&self) -> ::tirea_merge::Uuid {
                        self.#field_name
                    }
                }
            }
        }
        None => TokenStream::new(),
    };

    Ok(quote! {
        impl ::tirea_merge::MergeObject for #struct_name {
            fn describe() -> ::tirea_merge::TypeDescriptor {
                ::tirea_merge::TypeDescriptor::new(
                    #type_name,
                    #identified,
                    ::std::vec![#(#descriptors),*],
                )
            }

            fn construct() -> ::std::option::Option<Self> {
                #construct
            }

            fn descriptor(&self) -> &'static ::tirea_merge::TypeDescriptor {
                ::tirea_merge::descriptor_of::<Self>()
            }

            #identity

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn into_any(
                self: ::std::boxed::Box<Self>,
            ) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }
        }

        #identified_impl
    })
}

/// Generate `construct()`; a nil identity is replaced by a random one.
fn generate_construct(no_default: bool, id_field: Option<&FieldInput>) -> TokenStream {
    if no_default {
        return quote! { ::std::option::Option::None };
    }
    match id_field {
        Some(field) => {
            let field_name = field.ident();
            quote! {
                let mut value = <Self as ::std::default::Default>::default();
                if value.#field_name.is_nil() {
                    value.#field_name = ::tirea_merge::Uuid::new_v4();
                }
                ::std::option::Option::Some(value)
            }
        }
        None => quote! {
            ::std::option::Option::Some(<Self as ::std::default::Default>::default())
        },
    }
}

/// Generate one `FieldDescriptor` expression.
fn generate_field(field: &FieldInput, rule: RenameRule) -> syn::Result<TokenStream> {
    let field_name = field.ident();
    let member_name = field.member_name(rule);
    let declared = declared_type(&field.ty);
    let shape = FieldKind::from_type(&field.ty, field.nested)
        .shape(field.nested)
        .map_err(|message| syn::Error::new_spanned(&field.ty, message))?;
    let kind = format_ident!("{}", shape.variant());

    let (get, get_mut) = match shape {
        MemberShape::Leaf => (
            quote! { ::tirea_merge::FieldRef::Leaf(&v.#field_name) },
            quote! { ::tirea_merge::FieldMut::Leaf(&mut v.#field_name) },
        ),
        MemberShape::Object => (
            quote! {
                ::tirea_merge::FieldRef::Object(::std::option::Option::Some(
                    &v.#field_name as &dyn ::tirea_merge::MergeObject,
                ))
            },
            quote! { ::tirea_merge::FieldMut::Object(&mut v.#field_name) },
        ),
        MemberShape::OptionalObject => (
            quote! {
                ::tirea_merge::FieldRef::Object(
                    v.#field_name
                        .as_ref()
                        .map(|inner| inner as &dyn ::tirea_merge::MergeObject),
                )
            },
            quote! { ::tirea_merge::FieldMut::OptionalObject(&mut v.#field_name) },
        ),
        MemberShape::Collection => (
            quote! { ::tirea_merge::FieldRef::Collection(&v.#field_name) },
            quote! { ::tirea_merge::FieldMut::Collection(&mut v.#field_name) },
        ),
        MemberShape::Map => (
            quote! { ::tirea_merge::FieldRef::Map(&v.#field_name) },
            quote! { ::tirea_merge::FieldMut::Map(&mut v.#field_name) },
        ),
        MemberShape::LeafMap => (
            quote! { ::tirea_merge::FieldRef::LeafMap(&v.#field_name) },
            quote! { ::tirea_merge::FieldMut::LeafMap(&mut v.#field_name) },
        ),
    };

    Ok(quote! {
        ::tirea_merge::FieldDescriptor::new(
            #member_name,
            ::tirea_merge::FieldKind::#kind,
            #declared,
            |any| any.downcast_ref::<Self>().map(|v| #get),
            |any| any.downcast_mut::<Self>().map(|v| #get_mut),
        )
    })
}
