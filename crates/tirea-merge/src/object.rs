//! Member tables for mergeable types.
//!
//! Every type that can take part in a merge exposes a [`TypeDescriptor`]: a
//! list of named members with typed accessors. The table is built once per
//! type by [`MergeObject::describe`] and memoized in a process-wide cache, so
//! walking a path never inspects type metadata beyond a name lookup.
//!
//! The table is normally generated with `#[derive(MergeObject)]`.

use crate::slot::{FieldMut, FieldRef};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};
use uuid::Uuid;

/// Accessor returning a shared view of one member.
pub type FieldGetter = for<'a> fn(&'a dyn Any) -> Option<FieldRef<'a>>;

/// Accessor returning a mutable view of one member.
pub type FieldSetter = for<'a> fn(&'a mut dyn Any) -> Option<FieldMut<'a>>;

/// The shape of a member, as seen by the merge engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A value assigned as a whole (scalars, `Option<scalar>`, plain lists).
    Leaf,
    /// A nested mergeable object that is always present.
    Object,
    /// An `Option` of a nested mergeable object.
    OptionalObject,
    /// A list of mergeable objects, reconciled element by element.
    Collection,
    /// A string-keyed dictionary of mergeable objects.
    Map,
    /// A string-keyed dictionary of leaf values.
    LeafMap,
}

/// Description of one member of a mergeable type.
#[derive(Clone, Copy)]
pub struct FieldDescriptor {
    name: &'static str,
    kind: FieldKind,
    declared_type: &'static str,
    get: FieldGetter,
    get_mut: FieldSetter,
}

impl FieldDescriptor {
    /// Create a member descriptor.
    pub fn new(
        name: &'static str,
        kind: FieldKind,
        declared_type: &'static str,
        get: FieldGetter,
        get_mut: FieldSetter,
    ) -> Self {
        Self {
            name,
            kind,
            declared_type,
            get,
            get_mut,
        }
    }

    /// The member name as it appears in payloads.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The member's shape.
    #[inline]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// The member's declared Rust type.
    #[inline]
    pub fn declared_type(&self) -> &'static str {
        self.declared_type
    }

    /// Read the member from `object`.
    ///
    /// Returns `None` if `object` is not the type this descriptor was built for.
    #[inline]
    pub fn get<'a>(&self, object: &'a dyn MergeObject) -> Option<FieldRef<'a>> {
        (self.get)(object.as_any())
    }

    /// Borrow the member of `object` mutably.
    #[inline]
    pub fn get_mut<'a>(&self, object: &'a mut dyn MergeObject) -> Option<FieldMut<'a>> {
        (self.get_mut)(object.as_any_mut())
    }
}

impl std::fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("declared_type", &self.declared_type)
            .finish()
    }
}

/// Member table of a mergeable type.
#[derive(Debug)]
pub struct TypeDescriptor {
    type_name: &'static str,
    identified: bool,
    fields: Vec<FieldDescriptor>,
    exact: HashMap<&'static str, usize>,
    folded: HashMap<String, usize>,
}

impl TypeDescriptor {
    /// Build a member table.
    ///
    /// `identified` marks types implementing the identity contract.
    /// When two members fold to the same lowercase name, the first one wins
    /// for case-insensitive lookups.
    pub fn new(type_name: &'static str, identified: bool, fields: Vec<FieldDescriptor>) -> Self {
        let mut exact = HashMap::with_capacity(fields.len());
        let mut folded = HashMap::with_capacity(fields.len());
        for (index, field) in fields.iter().enumerate() {
            exact.entry(field.name).or_insert(index);
            folded
                .entry(field.name.to_ascii_lowercase())
                .or_insert(index);
        }
        Self {
            type_name,
            identified,
            fields,
            exact,
            folded,
        }
    }

    /// The type's display name.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether elements of this type carry a stable identity.
    #[inline]
    pub fn is_identified(&self) -> bool {
        self.identified
    }

    /// All members in declaration order.
    #[inline]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Look up a member by name. Exact matches win over case-folded ones.
    pub fn field(&self, name: &str, ignore_case: bool) -> Option<&FieldDescriptor> {
        let index = match self.exact.get(name) {
            Some(index) => Some(*index),
            None if ignore_case => self.folded.get(&name.to_ascii_lowercase()).copied(),
            None => None,
        }?;
        self.fields.get(index)
    }
}

/// A type whose members can be addressed by name during a merge.
///
/// Implementations are usually generated by `#[derive(MergeObject)]`. The
/// `Sized`-only methods build and construct the concrete type; the rest are
/// object safe so the engine can walk `dyn MergeObject` graphs.
pub trait MergeObject: Any + Send + Sync + 'static {
    /// Build the member table. Called once per type; use [`descriptor_of`].
    fn describe() -> TypeDescriptor
    where
        Self: Sized;

    /// Parameterless construction, used for unset nested members and new
    /// collection elements. `None` means the type cannot be default-built.
    fn construct() -> Option<Self>
    where
        Self: Sized;

    /// The memoized member table of this value's type.
    fn descriptor(&self) -> &'static TypeDescriptor;

    /// Stable identity of this value, for types implementing [`Identified`].
    fn identity(&self) -> Option<Uuid> {
        None
    }

    /// Upcast for downcasting by the member accessors.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting by the member accessors.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Owned upcast, used when appending boxed elements to a typed collection.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl dyn MergeObject {
    /// The display name of the concrete type.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.descriptor().type_name()
    }

    /// Downcast to a concrete type.
    #[inline]
    pub fn downcast_ref<T: MergeObject>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Downcast to a concrete type, mutably.
    #[inline]
    pub fn downcast_mut<T: MergeObject>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// The identity contract for collection elements.
///
/// Elements of types implementing this trait are matched, updated and
/// removed by identity. Collections of other types can only be appended to
/// or cleared.
pub trait Identified {
    /// The element's unique, stable identifier.
    fn id(&self) -> Uuid;
}

type DescriptorCache = RwLock<HashMap<TypeId, &'static TypeDescriptor>>;

static DESCRIPTORS: OnceLock<DescriptorCache> = OnceLock::new();

/// Get the memoized member table of `T`, building it on first use.
pub fn descriptor_of<T: MergeObject>() -> &'static TypeDescriptor {
    let cache = DESCRIPTORS.get_or_init(Default::default);
    let key = TypeId::of::<T>();

    let cached = cache
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
        .copied();
    if let Some(descriptor) = cached {
        return descriptor;
    }

    let mut guard = cache.write().unwrap_or_else(PoisonError::into_inner);
    *guard
        .entry(key)
        .or_insert_with(|| &*Box::leak(Box::new(T::describe())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{Address, Person, Phone};

    #[test]
    fn test_descriptor_is_memoized() {
        let first = descriptor_of::<Person>();
        let second = descriptor_of::<Person>();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.type_name(), "Person");
    }

    #[test]
    fn test_field_lookup_exact_and_folded() {
        let descriptor = descriptor_of::<Person>();
        assert!(descriptor.field("LastName", false).is_some());
        assert!(descriptor.field("lastname", false).is_none());
        assert_eq!(
            descriptor.field("lastname", true).map(FieldDescriptor::name),
            Some("LastName")
        );
        assert!(descriptor.field("Street", true).is_none());
    }

    #[test]
    fn test_identity_flag() {
        assert!(descriptor_of::<Phone>().is_identified());
        assert!(!descriptor_of::<Address>().is_identified());
    }

    #[test]
    fn test_field_access_through_descriptor() {
        let mut person = Person::named("John", "Mustermann");
        let descriptor = person.descriptor();
        let field = descriptor.field("FirstName", false).unwrap();
        assert_eq!(field.kind(), FieldKind::Leaf);

        match field.get(&person).unwrap() {
            FieldRef::Leaf(leaf) => assert_eq!(leaf.to_json().unwrap(), "John"),
            other => panic!("unexpected member view: {}", other.kind_name()),
        }

        match field.get_mut(&mut person).unwrap() {
            FieldMut::Leaf(leaf) => leaf.assign_json(serde_json::json!("Jane")).unwrap(),
            other => panic!("unexpected member view: {}", other.kind_name()),
        }
        assert_eq!(person.first_name, "Jane");
    }

    #[test]
    fn test_downcast_on_dyn() {
        let person = Person::named("John", "Doe");
        let object: &dyn MergeObject = &person;
        assert_eq!(object.type_name(), "Person");
        assert!(object.downcast_ref::<Person>().is_some());
        assert!(object.downcast_ref::<Address>().is_none());
    }
}
