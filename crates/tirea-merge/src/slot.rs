//! Type-erased views of individual members.
//!
//! A member accessor hands out one of these views; the engine never sees the
//! concrete member type. Blanket implementations cover the standard shapes
//! (`T`, `Option<T>`, `Vec<T>`, `HashMap<String, T>`, `BTreeMap<String, T>`).

use crate::object::{descriptor_of, MergeObject};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Shared view of one member.
pub enum FieldRef<'a> {
    /// A value read as a whole.
    Leaf(&'a dyn Leaf),
    /// A nested object; `None` when an optional member is unset.
    Object(Option<&'a dyn MergeObject>),
    /// A list of mergeable objects.
    Collection(&'a dyn ObjectCollection),
    /// A dictionary of mergeable objects.
    Map(&'a dyn ObjectMap),
    /// A dictionary of leaf values.
    LeafMap(&'a dyn LeafMap),
}

impl FieldRef<'_> {
    /// Short name of the view's shape, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldRef::Leaf(_) => "value",
            FieldRef::Object(_) => "object",
            FieldRef::Collection(_) => "collection",
            FieldRef::Map(_) | FieldRef::LeafMap(_) => "dictionary",
        }
    }
}

/// Mutable view of one member.
pub enum FieldMut<'a> {
    /// A value assigned as a whole.
    Leaf(&'a mut dyn Leaf),
    /// A nested object that is always present.
    Object(&'a mut dyn MergeObject),
    /// A nested object that may be unset.
    OptionalObject(&'a mut dyn OptionalObject),
    /// A list of mergeable objects.
    Collection(&'a mut dyn ObjectCollection),
    /// A dictionary of mergeable objects.
    Map(&'a mut dyn ObjectMap),
    /// A dictionary of leaf values.
    LeafMap(&'a mut dyn LeafMap),
}

impl FieldMut<'_> {
    /// Short name of the view's shape, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldMut::Leaf(_) => "value",
            FieldMut::Object(_) | FieldMut::OptionalObject(_) => "object",
            FieldMut::Collection(_) => "collection",
            FieldMut::Map(_) | FieldMut::LeafMap(_) => "dictionary",
        }
    }
}

/// A member assigned as a whole, through its JSON representation.
pub trait Leaf: Send + Sync {
    /// The declared Rust type.
    fn declared_type(&self) -> &'static str;

    /// Serialize the current value.
    fn to_json(&self) -> Result<Value, serde_json::Error>;

    /// Replace the current value. Leaves the value untouched on error.
    fn assign_json(&mut self, value: Value) -> Result<(), serde_json::Error>;
}

impl<T> Leaf for T
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn declared_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn assign_json(&mut self, value: Value) -> Result<(), serde_json::Error> {
        *self = serde_json::from_value(value)?;
        Ok(())
    }
}

/// An optional nested object.
pub trait OptionalObject: Send + Sync {
    /// Display name of the nested type.
    fn element_type(&self) -> &'static str;

    /// Borrow the nested object if set.
    fn get(&self) -> Option<&dyn MergeObject>;

    /// Borrow the nested object, constructing a default one when unset.
    ///
    /// Returns `None` only if the member is unset and its type cannot be
    /// default-constructed.
    fn get_or_construct(&mut self) -> Option<&mut dyn MergeObject>;

    /// Unset the member.
    fn clear(&mut self);
}

impl<T: MergeObject> OptionalObject for Option<T> {
    fn element_type(&self) -> &'static str {
        descriptor_of::<T>().type_name()
    }

    fn get(&self) -> Option<&dyn MergeObject> {
        self.as_ref().map(|value| value as &dyn MergeObject)
    }

    fn get_or_construct(&mut self) -> Option<&mut dyn MergeObject> {
        if self.is_none() {
            *self = Some(T::construct()?);
        }
        self.as_mut().map(|value| value as &mut dyn MergeObject)
    }

    fn clear(&mut self) {
        *self = None;
    }
}

/// A list of mergeable objects.
pub trait ObjectCollection: Send + Sync {
    /// Display name of the element type.
    fn element_type(&self) -> &'static str;

    /// Whether the element type implements the identity contract.
    fn element_identified(&self) -> bool;

    /// Number of elements.
    fn item_count(&self) -> usize;

    /// Borrow an element by position.
    fn item(&self, index: usize) -> Option<&dyn MergeObject>;

    /// Borrow an element mutably by position.
    fn item_mut(&mut self, index: usize) -> Option<&mut dyn MergeObject>;

    /// Position of the element with the given identity.
    fn position(&self, id: Uuid) -> Option<usize>;

    /// Remove the element at `index`. Returns false if out of range.
    fn remove_at(&mut self, index: usize) -> bool;

    /// Remove all elements.
    fn clear_items(&mut self);

    /// Build a default element, if the element type allows it.
    fn construct_item(&self) -> Option<Box<dyn MergeObject>>;

    /// Append a boxed element.
    ///
    /// Fails with the element's type name if it is not the collection's
    /// element type.
    fn push_item(&mut self, item: Box<dyn MergeObject>) -> Result<(), &'static str>;
}

impl<T: MergeObject> ObjectCollection for Vec<T> {
    fn element_type(&self) -> &'static str {
        descriptor_of::<T>().type_name()
    }

    fn element_identified(&self) -> bool {
        descriptor_of::<T>().is_identified()
    }

    fn item_count(&self) -> usize {
        self.len()
    }

    fn item(&self, index: usize) -> Option<&dyn MergeObject> {
        self.get(index).map(|item| item as &dyn MergeObject)
    }

    fn item_mut(&mut self, index: usize) -> Option<&mut dyn MergeObject> {
        self.get_mut(index).map(|item| item as &mut dyn MergeObject)
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        self.iter().position(|item| item.identity() == Some(id))
    }

    fn remove_at(&mut self, index: usize) -> bool {
        if index < self.len() {
            self.remove(index);
            true
        } else {
            false
        }
    }

    fn clear_items(&mut self) {
        self.clear();
    }

    fn construct_item(&self) -> Option<Box<dyn MergeObject>> {
        T::construct().map(|item| Box::new(item) as Box<dyn MergeObject>)
    }

    fn push_item(&mut self, item: Box<dyn MergeObject>) -> Result<(), &'static str> {
        let found = item.descriptor().type_name();
        let item = item.into_any().downcast::<T>().map_err(|_| found)?;
        self.push(*item);
        Ok(())
    }
}

/// A string-keyed dictionary of mergeable objects.
pub trait ObjectMap: Send + Sync {
    /// Display name of the value type.
    fn value_type(&self) -> &'static str;

    /// Borrow the entry under `key`.
    fn entry_ref(&self, key: &str) -> Option<&dyn MergeObject>;

    /// Borrow the entry under `key`, inserting a default one if missing.
    ///
    /// Returns `None` only if the key is missing and the value type cannot be
    /// default-constructed.
    fn entry_or_construct(&mut self, key: &str) -> Option<&mut dyn MergeObject>;
}

impl<T: MergeObject> ObjectMap for HashMap<String, T> {
    fn value_type(&self) -> &'static str {
        descriptor_of::<T>().type_name()
    }

    fn entry_ref(&self, key: &str) -> Option<&dyn MergeObject> {
        self.get(key).map(|value| value as &dyn MergeObject)
    }

    fn entry_or_construct(&mut self, key: &str) -> Option<&mut dyn MergeObject> {
        if !self.contains_key(key) {
            self.insert(key.to_owned(), T::construct()?);
        }
        self.get_mut(key).map(|value| value as &mut dyn MergeObject)
    }
}

impl<T: MergeObject> ObjectMap for BTreeMap<String, T> {
    fn value_type(&self) -> &'static str {
        descriptor_of::<T>().type_name()
    }

    fn entry_ref(&self, key: &str) -> Option<&dyn MergeObject> {
        self.get(key).map(|value| value as &dyn MergeObject)
    }

    fn entry_or_construct(&mut self, key: &str) -> Option<&mut dyn MergeObject> {
        if !self.contains_key(key) {
            self.insert(key.to_owned(), T::construct()?);
        }
        self.get_mut(key).map(|value| value as &mut dyn MergeObject)
    }
}

/// A string-keyed dictionary of leaf values.
pub trait LeafMap: Send + Sync {
    /// The declared Rust type of the values.
    fn value_type(&self) -> &'static str;

    /// Serialize the entry under `key`, if present.
    fn entry_json(&self, key: &str) -> Option<Result<Value, serde_json::Error>>;

    /// Insert or replace the entry under `key`.
    fn assign_entry(&mut self, key: &str, value: Value) -> Result<(), serde_json::Error>;
}

impl<V> LeafMap for HashMap<String, V>
where
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn value_type(&self) -> &'static str {
        std::any::type_name::<V>()
    }

    fn entry_json(&self, key: &str) -> Option<Result<Value, serde_json::Error>> {
        self.get(key).map(serde_json::to_value)
    }

    fn assign_entry(&mut self, key: &str, value: Value) -> Result<(), serde_json::Error> {
        self.insert(key.to_owned(), serde_json::from_value(value)?);
        Ok(())
    }
}

impl<V> LeafMap for BTreeMap<String, V>
where
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn value_type(&self) -> &'static str {
        std::any::type_name::<V>()
    }

    fn entry_json(&self, key: &str) -> Option<Result<Value, serde_json::Error>> {
        self.get(key).map(serde_json::to_value)
    }

    fn assign_entry(&mut self, key: &str, value: Value) -> Result<(), serde_json::Error> {
        self.insert(key.to_owned(), serde_json::from_value(value)?);
        Ok(())
    }
}
