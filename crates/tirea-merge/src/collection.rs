//! Collection reconciler.
//!
//! A JSON array addressed at a collection of mergeable objects is applied
//! element by element. Each element either names an existing item by its
//! identity (update it, or remove it when the removal marker is set) or
//! carries no identity and describes a new item. Arrays addressed at any other
//! member are assigned as a whole.

use crate::error::value_type_name;
use crate::merger::Session;
use crate::object::{FieldDescriptor, FieldKind};
use crate::report::{Change, ChangeKind};
use crate::setter::{self, Target};
use crate::slot::{FieldMut, FieldRef, ObjectCollection};
use crate::validation::{Operation, ValidationRequest};
use crate::{walker, MergeError, MergeObject, MergeOptions, MergeResult, Path};
use serde_json::{Map, Value};
use std::collections::HashSet;
use uuid::Uuid;

/// What one array element asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    New,
    Update(Uuid),
    Remove(Uuid),
}

/// Apply the array `node` at `path`.
pub(crate) fn apply_array(
    session: &mut Session<'_>,
    patch: &dyn MergeObject,
    original: &mut dyn MergeObject,
    path: &Path,
    full_path: &Path,
    node: &Value,
    items: &[Value],
) -> MergeResult<()> {
    let (patch, original, name) = match setter::resolve(session, patch, original, path, full_path)? {
        Target::Member {
            patch,
            original,
            name,
        } => (patch, original, name),
        entry => return setter::assign(session, entry, full_path, node),
    };
    if setter::is_identity_segment(&name) {
        return Ok(());
    }

    let (patch_field, original_field) =
        setter::member_pair(session.options.ignore_case, patch, &*original, &name, full_path)?;
    if original_field.kind() == FieldKind::Leaf
        && items.is_empty()
        && session.config.set_action(full_path).is_none()
    {
        return clear_list(session, patch, original, original_field, full_path, node);
    }
    if original_field.kind() != FieldKind::Collection {
        // Scalar lists, arrays of arrays and plain serde element types.
        let target = Target::Member {
            patch,
            original,
            name,
        };
        return setter::assign(session, target, full_path, node);
    }

    if let Some(stray) = items.iter().find(|item| !item.is_object()) {
        return Err(MergeError::type_mismatch(
            full_path.clone(),
            "object",
            value_type_name(stray),
        ));
    }

    let patch_items = match patch_field.get(patch) {
        Some(FieldRef::Collection(items)) => items,
        Some(other) => {
            return Err(MergeError::type_mismatch(
                full_path.clone(),
                "collection",
                other.kind_name(),
            ))
        }
        None => return Err(setter::table_mismatch(full_path.clone(), patch.type_name())),
    };
    let identified = match original_field.get(&*original) {
        Some(FieldRef::Collection(items)) => items.element_identified(),
        _ => return Err(setter::table_mismatch(full_path.clone(), original.type_name())),
    };
    let force_replace = session.config.forces_replace(full_path);
    let property = original_field.name();

    // Identity-less collections are cleared by an empty array, or before
    // re-adding every element when replacement is forced.
    let clear_first = !identified && (items.is_empty() || force_replace);
    if clear_first {
        session.validate(ValidationRequest {
            path: full_path,
            property,
            value: node,
            operation: Operation::UpdateProperty,
            original_item: Some(&*original),
            patch_item: Some(patch),
        })?;
    }

    let original_type = original.type_name();
    let Some(FieldMut::Collection(original_items)) = original_field.get_mut(original) else {
        return Err(setter::table_mismatch(full_path.clone(), original_type));
    };

    if clear_first && original_items.item_count() > 0 {
        original_items.clear_items();
        tracing::trace!(path = %full_path, "cleared collection");
        session.record(Change::new(full_path.clone(), ChangeKind::Cleared));
    }
    if items.is_empty() && identified && !force_replace {
        tracing::trace!(path = %full_path, "empty array for identified collection ignored");
        return Ok(());
    }

    let mut reconciler = Reconciler {
        session,
        original_items,
        patch_items,
        full_path,
        property,
        mentioned: HashSet::new(),
    };
    for (position, item) in items.iter().enumerate() {
        let Value::Object(fields) = item else {
            continue;
        };
        match classify(reconciler.session.options, fields, full_path)? {
            Element::New => reconciler.add_item(position, item, fields)?,
            Element::Update(id) => reconciler.update_item(id, fields)?,
            Element::Remove(id) => reconciler.remove_item(id, item)?,
        }
    }
    if force_replace && identified {
        reconciler.drop_unmentioned()?;
    }
    Ok(())
}

/// Empty a list held as a leaf member; its elements carry no identity.
fn clear_list(
    session: &mut Session<'_>,
    patch: &dyn MergeObject,
    original: &mut dyn MergeObject,
    field: &'static FieldDescriptor,
    full_path: &Path,
    node: &Value,
) -> MergeResult<()> {
    session.validate(ValidationRequest {
        path: full_path,
        property: field.name(),
        value: node,
        operation: Operation::UpdateProperty,
        original_item: Some(&*original),
        patch_item: Some(patch),
    })?;

    let original_type = original.type_name();
    let Some(FieldMut::Leaf(target)) = field.get_mut(original) else {
        return Err(setter::table_mismatch(full_path.clone(), original_type));
    };
    let target_type = target.declared_type();
    target
        .assign_json(Value::Array(Vec::new()))
        .map_err(|_| MergeError::type_mismatch(full_path.clone(), target_type, "array"))?;

    tracing::trace!(path = %full_path, "cleared list");
    session.record(Change::new(full_path.clone(), ChangeKind::Cleared));
    Ok(())
}

/// Decide what an element asks for from its identity and removal marker.
fn classify(
    options: &MergeOptions,
    fields: &Map<String, Value>,
    full_path: &Path,
) -> MergeResult<Element> {
    let raw = fields
        .iter()
        .find(|(key, _)| setter::is_identity_segment(key))
        .map(|(_, value)| value);

    let id = match raw {
        None | Some(Value::Null) => return Ok(Element::New),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(Element::New),
        Some(Value::String(s)) => Uuid::parse_str(s.trim())
            .map_err(|_| MergeError::invalid_identity(full_path.clone(), s.as_str()))?,
        Some(other) => {
            return Err(MergeError::invalid_identity(
                full_path.clone(),
                other.to_string(),
            ))
        }
    };
    if id.is_nil() {
        return Ok(Element::New);
    }

    let remove = fields
        .iter()
        .any(|(key, value)| options.is_remove_marker(key) && removal_requested(value));
    Ok(if remove {
        Element::Remove(id)
    } else {
        Element::Update(id)
    })
}

fn removal_requested(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Extra context for an identity that is missing from a collection.
fn identity_hint(items: &dyn ObjectCollection) -> String {
    if items.element_identified() {
        String::new()
    } else {
        format!(
            " (element type `{}` does not implement the identity contract)",
            items.element_type()
        )
    }
}

struct Reconciler<'s, 'm, 'c> {
    session: &'s mut Session<'m>,
    original_items: &'c mut dyn ObjectCollection,
    patch_items: &'c dyn ObjectCollection,
    full_path: &'c Path,
    property: &'static str,
    mentioned: HashSet<Uuid>,
}

impl Reconciler<'_, '_, '_> {
    fn add_item(
        &mut self,
        position: usize,
        item: &Value,
        fields: &Map<String, Value>,
    ) -> MergeResult<()> {
        let full_path = self.full_path;
        let patch_item = self.patch_items.item(position).ok_or_else(|| {
            MergeError::structural_mismatch(
                full_path.clone(),
                self.patch_items.element_type(),
                format!("[{position}]"),
            )
        })?;

        let config = self.session.config;
        let mut fresh = match config.item_factory(full_path) {
            Some(factory) => factory(patch_item)?,
            None => self.original_items.construct_item().ok_or_else(|| {
                MergeError::uninitializable(full_path.clone(), self.original_items.element_type())
            })?,
        };

        self.session
            .quietly(|session| walker::walk(session, fields, patch_item, &mut *fresh, full_path))?;
        self.session.validate(ValidationRequest {
            path: full_path,
            property: self.property,
            value: item,
            operation: Operation::AddItem,
            original_item: Some(&*fresh),
            patch_item: Some(patch_item),
        })?;

        let id = fresh.identity();
        let element_type = self.original_items.element_type();
        self.original_items.push_item(fresh).map_err(|found| {
            MergeError::configuration(
                full_path.clone(),
                format!("new item is `{found}`, collection holds `{element_type}`"),
            )
        })?;
        if let Some(id) = id {
            self.mentioned.insert(id);
        }

        tracing::trace!(path = %full_path, ?id, "added item");
        self.session
            .record(Change::new(full_path.clone(), ChangeKind::Added).with_id(id));
        Ok(())
    }

    fn update_item(&mut self, id: Uuid, fields: &Map<String, Value>) -> MergeResult<()> {
        let full_path = self.full_path;
        let index = self.original_items.position(id).ok_or_else(|| {
            MergeError::unknown_identity(full_path.clone(), id, identity_hint(&*self.original_items))
        })?;
        let patch_item = self
            .patch_items
            .position(id)
            .and_then(|i| self.patch_items.item(i))
            .ok_or_else(|| {
                MergeError::unknown_identity(
                    full_path.clone(),
                    id,
                    format!(" in the patch graph{}", identity_hint(self.patch_items)),
                )
            })?;
        let original_item = self
            .original_items
            .item_mut(index)
            .ok_or_else(|| MergeError::unknown_identity(full_path.clone(), id, ""))?;

        walker::walk(self.session, fields, patch_item, original_item, full_path)?;
        self.mentioned.insert(id);
        Ok(())
    }

    fn remove_item(&mut self, id: Uuid, item: &Value) -> MergeResult<()> {
        let full_path = self.full_path;
        let index = self.original_items.position(id).ok_or_else(|| {
            MergeError::unknown_identity(full_path.clone(), id, identity_hint(&*self.original_items))
        })?;
        self.remove_at(index, id, item)
    }

    /// Remove every pre-existing item no element mentioned.
    fn drop_unmentioned(&mut self) -> MergeResult<()> {
        let mut index = 0;
        while index < self.original_items.item_count() {
            match self.original_items.item(index).and_then(|item| item.identity()) {
                Some(id) if !self.mentioned.contains(&id) => {
                    self.remove_at(index, id, &Value::Null)?;
                }
                _ => index += 1,
            }
        }
        Ok(())
    }

    fn remove_at(&mut self, index: usize, id: Uuid, item: &Value) -> MergeResult<()> {
        let full_path = self.full_path;
        let patch_item = self
            .patch_items
            .position(id)
            .and_then(|i| self.patch_items.item(i));
        self.session.validate(ValidationRequest {
            path: full_path,
            property: self.property,
            value: item,
            operation: Operation::RemoveItem,
            original_item: self.original_items.item(index),
            patch_item,
        })?;

        self.original_items.remove_at(index);
        tracing::trace!(path = %full_path, %id, "removed item");
        self.session
            .record(Change::new(full_path.clone(), ChangeKind::Removed).with_id(Some(id)));
        Ok(())
    }
}
