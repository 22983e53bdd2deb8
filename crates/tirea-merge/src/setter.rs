//! Path value setter.
//!
//! Walks the patch graph and the original graph in lock-step along a member
//! path and assigns one leaf from the patch side to the original side.
//! Unset nested members on the original side are default-constructed on the
//! way down so the assignment has a destination.

use crate::error::value_type_name;
use crate::merger::Session;
use crate::object::{FieldDescriptor, FieldKind};
use crate::report::{Change, ChangeKind};
use crate::slot::{FieldMut, FieldRef, LeafMap};
use crate::validation::{Operation, ValidationRequest};
use crate::{coerce, MergeError, MergeObject, MergeResult, Path};
use serde_json::Value;

/// The destination of an assignment, after all intermediate hops.
pub(crate) enum Target<'p, 'o> {
    /// A named member of a pair of objects.
    Member {
        patch: &'p dyn MergeObject,
        original: &'o mut dyn MergeObject,
        name: String,
    },
    /// An entry of a dictionary of objects, which cannot be assigned whole.
    ObjectEntry,
    /// An entry of a dictionary of leaf values.
    LeafEntry {
        patch: &'p dyn LeafMap,
        original: &'o mut dyn LeafMap,
        key: String,
    },
}

/// Whether a member name is the identity key, which is never assigned.
#[inline]
pub(crate) fn is_identity_segment(name: &str) -> bool {
    name.eq_ignore_ascii_case("id")
}

/// Assign the value at `path` from `patch` to `original`.
///
/// `path` is relative to the two roots; `full_path` is the path from the
/// top-level object and is used for override lookup, validation and errors.
/// `node` is the payload value that mentioned the member.
pub(crate) fn set(
    session: &mut Session<'_>,
    patch: &dyn MergeObject,
    original: &mut dyn MergeObject,
    path: &Path,
    full_path: &Path,
    node: &Value,
) -> MergeResult<()> {
    if path.last().is_some_and(is_identity_segment) {
        return Ok(());
    }
    let target = resolve(session, patch, original, path, full_path)?;
    assign(session, target, full_path, node)
}

/// Walk all but the last segment of `path`.
pub(crate) fn resolve<'p, 'o>(
    session: &Session<'_>,
    mut patch: &'p dyn MergeObject,
    mut original: &'o mut dyn MergeObject,
    path: &Path,
    full_path: &Path,
) -> MergeResult<Target<'p, 'o>> {
    let ignore_case = session.options.ignore_case;
    let segments = path.segments();

    let mut index = 0;
    while index + 1 < segments.len() {
        let name = segments[index].as_str();
        let (patch_field, original_field) =
            member_pair(ignore_case, patch, &*original, name, full_path)?;
        let original_type = original.type_name();
        let here = hop_path(full_path, path, index);

        match (patch_field.get(patch), original_field.get_mut(original)) {
            (Some(FieldRef::Object(Some(p))), Some(FieldMut::Object(o))) => {
                patch = p;
                original = o;
                index += 1;
            }
            (Some(FieldRef::Object(Some(p))), Some(FieldMut::OptionalObject(o))) => {
                let element_type = o.element_type();
                original = o
                    .get_or_construct()
                    .ok_or_else(|| MergeError::uninitializable(here, element_type))?;
                patch = p;
                index += 1;
            }
            (Some(FieldRef::Object(None)), Some(FieldMut::Object(_)))
            | (Some(FieldRef::Object(None)), Some(FieldMut::OptionalObject(_))) => {
                return Err(MergeError::type_mismatch(here, "object", "null"));
            }
            (Some(FieldRef::Map(p)), Some(FieldMut::Map(o))) => {
                let key = segments[index + 1].as_str();
                if index + 2 == segments.len() {
                    return Ok(Target::ObjectEntry);
                }
                patch = p.entry_ref(key).ok_or_else(|| {
                    MergeError::structural_mismatch(full_path.clone(), p.value_type(), key)
                })?;
                let value_type = o.value_type();
                original = o.entry_or_construct(key).ok_or_else(|| {
                    MergeError::uninitializable(hop_path(full_path, path, index + 1), value_type)
                })?;
                index += 2;
            }
            (Some(FieldRef::LeafMap(p)), Some(FieldMut::LeafMap(o))) => {
                let key = segments[index + 1].as_str();
                if index + 2 == segments.len() {
                    return Ok(Target::LeafEntry {
                        patch: p,
                        original: o,
                        key: key.to_owned(),
                    });
                }
                return Err(MergeError::type_mismatch(
                    hop_path(full_path, path, index + 1),
                    "value",
                    "object",
                ));
            }
            (Some(p), Some(o)) if p.kind_name() != o.kind_name() => {
                return Err(MergeError::type_mismatch(here, o.kind_name(), p.kind_name()));
            }
            (Some(_), Some(o)) => {
                return Err(MergeError::type_mismatch(here, o.kind_name(), "object"));
            }
            (None, _) => return Err(table_mismatch(here, patch.type_name())),
            (_, None) => return Err(table_mismatch(here, original_type)),
        }
    }

    let name = segments
        .get(index)
        .ok_or_else(|| MergeError::malformed("path", "empty member path"))?;
    Ok(Target::Member {
        patch,
        original,
        name: name.clone(),
    })
}

/// Perform the assignment at a resolved target.
pub(crate) fn assign(
    session: &mut Session<'_>,
    target: Target<'_, '_>,
    full_path: &Path,
    node: &Value,
) -> MergeResult<()> {
    match target {
        Target::Member {
            patch,
            original,
            name,
        } => assign_member(session, patch, original, &name, full_path, node),
        Target::LeafEntry {
            patch,
            original,
            key,
        } => assign_entry(session, patch, original, &key, full_path),
        Target::ObjectEntry => Err(MergeError::type_mismatch(
            full_path.clone(),
            "object",
            value_type_name(node),
        )),
    }
}

fn assign_member(
    session: &mut Session<'_>,
    patch: &dyn MergeObject,
    original: &mut dyn MergeObject,
    name: &str,
    full_path: &Path,
    node: &Value,
) -> MergeResult<()> {
    if is_identity_segment(name) {
        return Ok(());
    }

    let config = session.config;
    if let Some(action) = config.set_action(full_path) {
        action(original, patch)?;
        tracing::trace!(path = %full_path, "applied configured override");
        session.record(Change::new(full_path.clone(), ChangeKind::Custom));
        return Ok(());
    }

    let (patch_field, original_field) =
        member_pair(session.options.ignore_case, patch, &*original, name, full_path)?;
    let original_type = original.type_name();

    match (patch_field.get(patch), original_field.kind()) {
        (Some(FieldRef::Leaf(source)), FieldKind::Leaf) => {
            let value = source.to_json()?;
            session.validate(ValidationRequest {
                path: full_path,
                property: original_field.name(),
                value: &value,
                operation: Operation::UpdateProperty,
                original_item: Some(&*original),
                patch_item: Some(patch),
            })?;
            let Some(FieldMut::Leaf(target)) = original_field.get_mut(original) else {
                return Err(table_mismatch(full_path.clone(), original_type));
            };
            let target_type = target.declared_type();
            if !coerce::assign_with(&value, |v| target.assign_json(v)) {
                return Err(MergeError::coercion(
                    full_path.clone(),
                    value,
                    source.declared_type(),
                    target_type,
                ));
            }
        }
        (Some(FieldRef::Object(None)), FieldKind::OptionalObject) => {
            session.validate(ValidationRequest {
                path: full_path,
                property: original_field.name(),
                value: &Value::Null,
                operation: Operation::UpdateProperty,
                original_item: Some(&*original),
                patch_item: Some(patch),
            })?;
            let Some(FieldMut::OptionalObject(target)) = original_field.get_mut(original) else {
                return Err(table_mismatch(full_path.clone(), original_type));
            };
            target.clear();
        }
        (Some(FieldRef::Leaf(_)), kind) => {
            return Err(MergeError::type_mismatch(
                full_path.clone(),
                kind_name(kind),
                "value",
            ));
        }
        (Some(view), _) => {
            return Err(MergeError::type_mismatch(
                full_path.clone(),
                view.kind_name(),
                value_type_name(node),
            ));
        }
        (None, _) => return Err(table_mismatch(full_path.clone(), patch.type_name())),
    }

    tracing::trace!(path = %full_path, "updated member");
    session.record(Change::new(full_path.clone(), ChangeKind::Updated));
    Ok(())
}

fn assign_entry(
    session: &mut Session<'_>,
    patch: &dyn LeafMap,
    original: &mut dyn LeafMap,
    key: &str,
    full_path: &Path,
) -> MergeResult<()> {
    let value = match patch.entry_json(key) {
        Some(value) => value?,
        None => {
            return Err(MergeError::structural_mismatch(
                full_path.clone(),
                patch.value_type(),
                key,
            ))
        }
    };
    session.validate(ValidationRequest {
        path: full_path,
        property: key,
        value: &value,
        operation: Operation::UpdateProperty,
        original_item: None,
        patch_item: None,
    })?;

    let target_type = original.value_type();
    if !coerce::assign_with(&value, |v| original.assign_entry(key, v)) {
        return Err(MergeError::coercion(
            full_path.clone(),
            value,
            patch.value_type(),
            target_type,
        ));
    }

    tracing::trace!(path = %full_path, "updated dictionary entry");
    session.record(Change::new(full_path.clone(), ChangeKind::Updated));
    Ok(())
}

/// Look up a member on both sides; missing on either is a structural mismatch.
pub(crate) fn member_pair(
    ignore_case: bool,
    patch: &dyn MergeObject,
    original: &dyn MergeObject,
    name: &str,
    full_path: &Path,
) -> MergeResult<(&'static FieldDescriptor, &'static FieldDescriptor)> {
    let patch_field = patch
        .descriptor()
        .field(name, ignore_case)
        .ok_or_else(|| MergeError::structural_mismatch(full_path.clone(), patch.type_name(), name))?;
    let original_field = original
        .descriptor()
        .field(name, ignore_case)
        .ok_or_else(|| {
            MergeError::structural_mismatch(full_path.clone(), original.type_name(), name)
        })?;
    Ok((patch_field, original_field))
}

/// A member table that does not describe the value it was used on.
pub(crate) fn table_mismatch(path: Path, type_name: &'static str) -> MergeError {
    MergeError::configuration(
        path,
        format!("member table of `{type_name}` does not match the value"),
    )
}

pub(crate) fn kind_name(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Leaf => "value",
        FieldKind::Object | FieldKind::OptionalObject => "object",
        FieldKind::Collection => "collection",
        FieldKind::Map | FieldKind::LeafMap => "dictionary",
    }
}

/// The full path up to and including relative segment `depth`.
fn hop_path(full_path: &Path, relative: &Path, depth: usize) -> Path {
    let base = full_path.len().saturating_sub(relative.len());
    full_path
        .iter()
        .take(base + depth + 1)
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{Address, Person, PersonDto};
    use crate::{ApproveAll, MergeOptions, PatchConfig, ValidationRequest};
    use serde_json::json;

    fn run<F>(config: &PatchConfig, f: F) -> MergeResult<crate::MergeReport>
    where
        F: FnOnce(&mut Session<'_>) -> MergeResult<()>,
    {
        let options = MergeOptions::default();
        let mut session = Session::new(config, &ApproveAll, &options);
        f(&mut session)?;
        Ok(session.into_report())
    }

    fn set_path(original: &mut Person, patch: &Person, path: &str, node: Value) -> MergeResult<()> {
        let path = Path::parse(path);
        run(&PatchConfig::new(), |s| set(s, patch, original, &path, &path, &node)).map(|_| ())
    }

    #[test]
    fn test_set_leaf() {
        let mut original = Person::named("John", "Mustermann");
        let patch = Person::named("Jane", "Doe");
        set_path(&mut original, &patch, "LastName", json!("Doe")).unwrap();
        assert_eq!(original.last_name, "Doe");
        assert_eq!(original.first_name, "John");
    }

    #[test]
    fn test_set_uses_patch_value_not_payload() {
        let mut original = Person::named("John", "Mustermann");
        let patch = Person::named("Jane", "Doe");
        set_path(&mut original, &patch, "lastname", json!("ignored")).unwrap();
        assert_eq!(original.last_name, "Doe");
    }

    #[test]
    fn test_set_constructs_unset_intermediate() {
        let mut original = Person::named("John", "Mustermann");
        let mut patch = Person::named("John", "Mustermann");
        patch.address = Some(Address {
            street: "Main".into(),
            city: "Berlin".into(),
        });

        set_path(&mut original, &patch, "Address.City", json!("Berlin")).unwrap();
        let address = original.address.unwrap();
        assert_eq!(address.city, "Berlin");
        assert_eq!(address.street, "");
    }

    #[test]
    fn test_structural_mismatch() {
        let mut original = Person::named("John", "Mustermann");
        let patch = original.clone();
        let err = set_path(&mut original, &patch, "Street", json!("Unknown")).unwrap_err();
        match err {
            MergeError::StructuralMismatch {
                type_name, member, ..
            } => {
                assert_eq!(type_name, "Person");
                assert_eq!(member, "Street");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_identity_segment_is_noop() {
        let mut original = crate::fixtures::Phone::with_number("1234");
        let patch = crate::fixtures::Phone::with_number("5678");
        let before = original.id;
        let path = Path::parse("ID");
        let report = run(&PatchConfig::new(), |s| {
            set(s, &patch, &mut original, &path, &path, &json!("x"))
        })
        .unwrap();
        assert!(report.is_empty());
        assert_eq!(original.id, before);
    }

    #[test]
    fn test_null_clears_optional_object() {
        let mut original = Person::named("John", "Mustermann");
        original.address = Some(Address::default());
        let patch = Person::named("John", "Mustermann");

        set_path(&mut original, &patch, "Address", Value::Null).unwrap();
        assert!(original.address.is_none());
    }

    #[test]
    fn test_scalar_against_collection_is_type_mismatch() {
        let mut original = Person::named("John", "Mustermann");
        let patch = original.clone();
        let err = set_path(&mut original, &patch, "PhoneNumbers", json!("x")).unwrap_err();
        assert!(matches!(
            err,
            MergeError::TypeMismatch {
                expected: "collection",
                found: "string",
                ..
            }
        ));
    }

    #[test]
    fn test_leaf_map_entry() {
        let mut original = Person::named("John", "Mustermann");
        let mut patch = original.clone();
        patch.tags.insert("color".into(), "blue".into());

        set_path(&mut original, &patch, "Tags.color", json!("blue")).unwrap();
        assert_eq!(original.tags.get("color").map(String::as_str), Some("blue"));

        let err = set_path(&mut original, &patch, "Tags.size", json!("L")).unwrap_err();
        assert!(matches!(err, MergeError::StructuralMismatch { .. }));
    }

    #[test]
    fn test_override_replaces_assignment() {
        let config = PatchConfig::new().set_with::<Person, Person, _>("LastName", |o, p| {
            o.last_name = format!("{} (patched)", p.last_name);
        });
        let mut original = Person::named("John", "Mustermann");
        let patch = Person::named("Jane", "Doe");
        let path = Path::parse("LastName");

        let report = run(&config, |s| {
            set(s, &patch, &mut original, &path, &path, &json!("Doe"))
        })
        .unwrap();
        assert_eq!(original.last_name, "Doe (patched)");
        assert_eq!(report.changes()[0].kind, ChangeKind::Custom);
    }

    #[test]
    fn test_coerces_between_declared_types() {
        let mut original = Person::named("John", "Mustermann");
        let mut patch = PersonDto::named("John", "Mustermann");
        patch.age = Some("42".into());

        let path = Path::parse("Age");
        run(&PatchConfig::new(), |s| {
            set(s, &patch, &mut original, &path, &path, &json!("42"))
        })
        .unwrap();
        assert_eq!(original.age, Some(42));
    }

    #[test]
    fn test_coercion_failure_carries_types() {
        let mut original = Person::named("John", "Mustermann");
        let mut patch = PersonDto::named("John", "Mustermann");
        patch.age = Some("old".into());

        let path = Path::parse("Age");
        let err = run(&PatchConfig::new(), |s| {
            set(s, &patch, &mut original, &path, &path, &json!("old"))
        })
        .unwrap_err();
        match err {
            MergeError::Coercion {
                value,
                source_type,
                target_type,
                ..
            } => {
                assert_eq!(value, json!("old"));
                assert!(source_type.contains("String"));
                assert!(target_type.contains("u32"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(original.age, None);
    }

    #[test]
    fn test_validation_sees_owner() {
        let mut original = Person::named("John", "Mustermann");
        let patch = Person::named("Jane", "Doe");
        let path = Path::parse("FirstName");
        let options = MergeOptions::default();
        let config = PatchConfig::new();
        let check = |r: &ValidationRequest<'_>| {
            r.property == "FirstName"
                && r.value == &json!("Jane")
                && r.original_item.map(|o| o.type_name()) == Some("Person")
        };
        let mut session = Session::new(&config, &check, &options);
        set(&mut session, &patch, &mut original, &path, &path, &json!("Jane")).unwrap();
        assert_eq!(original.first_name, "Jane");
    }

    #[test]
    fn test_hop_path() {
        let full = Path::parse("PhoneNumbers.Meta.Label");
        let relative = Path::parse("Meta.Label");
        assert_eq!(hop_path(&full, &relative, 0).to_string(), "PhoneNumbers.Meta");
    }
}
