//! Hand-written member tables used by the unit tests.

use crate::{
    descriptor_of, FieldDescriptor, FieldKind, FieldMut, FieldRef, Identified, MergeObject,
    TypeDescriptor,
};
use std::any::Any;
use std::collections::BTreeMap;
use uuid::Uuid;

macro_rules! erased {
    () => {
        fn descriptor(&self) -> &'static TypeDescriptor {
            descriptor_of::<Self>()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }

        fn into_any(self: Box<Self>) -> Box<dyn Any> {
            self
        }
    };
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
    pub age: Option<u32>,
    pub address: Option<Address>,
    pub phone_numbers: Vec<Phone>,
    pub addresses: Vec<Address>,
    pub tags: BTreeMap<String, String>,
}

impl Person {
    pub fn named(first_name: &str, last_name: &str) -> Self {
        Self {
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            ..Self::default()
        }
    }
}

impl MergeObject for Person {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new(
            "Person",
            false,
            vec![
                FieldDescriptor::new(
                    "FirstName",
                    FieldKind::Leaf,
                    "String",
                    |any| any.downcast_ref::<Person>().map(|v| FieldRef::Leaf(&v.first_name)),
                    |any| {
                        any.downcast_mut::<Person>()
                            .map(|v| FieldMut::Leaf(&mut v.first_name))
                    },
                ),
                FieldDescriptor::new(
                    "LastName",
                    FieldKind::Leaf,
                    "String",
                    |any| any.downcast_ref::<Person>().map(|v| FieldRef::Leaf(&v.last_name)),
                    |any| {
                        any.downcast_mut::<Person>()
                            .map(|v| FieldMut::Leaf(&mut v.last_name))
                    },
                ),
                FieldDescriptor::new(
                    "Age",
                    FieldKind::Leaf,
                    "Option<u32>",
                    |any| any.downcast_ref::<Person>().map(|v| FieldRef::Leaf(&v.age)),
                    |any| any.downcast_mut::<Person>().map(|v| FieldMut::Leaf(&mut v.age)),
                ),
                FieldDescriptor::new(
                    "Address",
                    FieldKind::OptionalObject,
                    "Option<Address>",
                    |any| {
                        any.downcast_ref::<Person>().map(|v| {
                            FieldRef::Object(v.address.as_ref().map(|a| a as &dyn MergeObject))
                        })
                    },
                    |any| {
                        any.downcast_mut::<Person>()
                            .map(|v| FieldMut::OptionalObject(&mut v.address))
                    },
                ),
                FieldDescriptor::new(
                    "PhoneNumbers",
                    FieldKind::Collection,
                    "Vec<Phone>",
                    |any| {
                        any.downcast_ref::<Person>()
                            .map(|v| FieldRef::Collection(&v.phone_numbers))
                    },
                    |any| {
                        any.downcast_mut::<Person>()
                            .map(|v| FieldMut::Collection(&mut v.phone_numbers))
                    },
                ),
                FieldDescriptor::new(
                    "Addresses",
                    FieldKind::Collection,
                    "Vec<Address>",
                    |any| {
                        any.downcast_ref::<Person>()
                            .map(|v| FieldRef::Collection(&v.addresses))
                    },
                    |any| {
                        any.downcast_mut::<Person>()
                            .map(|v| FieldMut::Collection(&mut v.addresses))
                    },
                ),
                FieldDescriptor::new(
                    "Tags",
                    FieldKind::LeafMap,
                    "BTreeMap<String, String>",
                    |any| any.downcast_ref::<Person>().map(|v| FieldRef::LeafMap(&v.tags)),
                    |any| {
                        any.downcast_mut::<Person>()
                            .map(|v| FieldMut::LeafMap(&mut v.tags))
                    },
                ),
            ],
        )
    }

    fn construct() -> Option<Self> {
        Some(Self::default())
    }

    erased!();
}

/// Request-side counterpart of [`Person`] with a differently typed `Age`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonDto {
    pub first_name: String,
    pub last_name: String,
    pub age: Option<String>,
}

impl PersonDto {
    pub fn named(first_name: &str, last_name: &str) -> Self {
        Self {
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            age: None,
        }
    }
}

impl MergeObject for PersonDto {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new(
            "PersonDto",
            false,
            vec![
                FieldDescriptor::new(
                    "FirstName",
                    FieldKind::Leaf,
                    "String",
                    |any| {
                        any.downcast_ref::<PersonDto>()
                            .map(|v| FieldRef::Leaf(&v.first_name))
                    },
                    |any| {
                        any.downcast_mut::<PersonDto>()
                            .map(|v| FieldMut::Leaf(&mut v.first_name))
                    },
                ),
                FieldDescriptor::new(
                    "LastName",
                    FieldKind::Leaf,
                    "String",
                    |any| {
                        any.downcast_ref::<PersonDto>()
                            .map(|v| FieldRef::Leaf(&v.last_name))
                    },
                    |any| {
                        any.downcast_mut::<PersonDto>()
                            .map(|v| FieldMut::Leaf(&mut v.last_name))
                    },
                ),
                FieldDescriptor::new(
                    "Age",
                    FieldKind::Leaf,
                    "Option<String>",
                    |any| any.downcast_ref::<PersonDto>().map(|v| FieldRef::Leaf(&v.age)),
                    |any| {
                        any.downcast_mut::<PersonDto>()
                            .map(|v| FieldMut::Leaf(&mut v.age))
                    },
                ),
            ],
        )
    }

    fn construct() -> Option<Self> {
        Some(Self::default())
    }

    erased!();
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Address {
    pub street: String,
    pub city: String,
}

impl MergeObject for Address {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new(
            "Address",
            false,
            vec![
                FieldDescriptor::new(
                    "Street",
                    FieldKind::Leaf,
                    "String",
                    |any| any.downcast_ref::<Address>().map(|v| FieldRef::Leaf(&v.street)),
                    |any| {
                        any.downcast_mut::<Address>()
                            .map(|v| FieldMut::Leaf(&mut v.street))
                    },
                ),
                FieldDescriptor::new(
                    "City",
                    FieldKind::Leaf,
                    "String",
                    |any| any.downcast_ref::<Address>().map(|v| FieldRef::Leaf(&v.city)),
                    |any| {
                        any.downcast_mut::<Address>()
                            .map(|v| FieldMut::Leaf(&mut v.city))
                    },
                ),
            ],
        )
    }

    fn construct() -> Option<Self> {
        Some(Self::default())
    }

    erased!();
}

#[derive(Debug, Clone, PartialEq)]
pub struct Phone {
    pub id: Uuid,
    pub phone_number: String,
}

impl Phone {
    pub fn with_number(number: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            phone_number: number.to_owned(),
        }
    }
}

impl Identified for Phone {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl MergeObject for Phone {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new(
            "Phone",
            true,
            vec![
                FieldDescriptor::new(
                    "Id",
                    FieldKind::Leaf,
                    "Uuid",
                    |any| any.downcast_ref::<Phone>().map(|v| FieldRef::Leaf(&v.id)),
                    |any| any.downcast_mut::<Phone>().map(|v| FieldMut::Leaf(&mut v.id)),
                ),
                FieldDescriptor::new(
                    "PhoneNumber",
                    FieldKind::Leaf,
                    "String",
                    |any| {
                        any.downcast_ref::<Phone>()
                            .map(|v| FieldRef::Leaf(&v.phone_number))
                    },
                    |any| {
                        any.downcast_mut::<Phone>()
                            .map(|v| FieldMut::Leaf(&mut v.phone_number))
                    },
                ),
            ],
        )
    }

    fn construct() -> Option<Self> {
        Some(Self::with_number(""))
    }

    fn identity(&self) -> Option<Uuid> {
        Some(Identified::id(self))
    }

    erased!();
}
