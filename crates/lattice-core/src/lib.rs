//! Lattice Object-Model Runtime
//!
//! This crate builds class semantics on top of a dynamic value model:
//! - Single, multiple and virtual inheritance with diamond sharing
//! - Hiding (`New`) versus overriding, abstract members
//! - Constructor chaining checked at construction time
//! - Computed properties with optional change events
//! - Overloaded functions dispatched on runtime argument patterns
//! - Static and dynamic views scoped to any ancestor
//!
//! Types are defined once with [`TypeBuilder`] (or [`class`]) and then
//! constructed any number of times with [`Type::construct`].

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod event;
pub mod member;
pub mod object;
pub mod overload;
pub mod property;
pub mod types;
pub mod value;

pub use error::{ClassError, ClassResult, HiddenKind};
pub use event::{Event, EventHandler};
pub use member::{
    Access, Member, MemberDescriptor, Payload, Private, Protected, Public, Virtuality,
    CONSTRUCTOR_NAME, RESERVED_PREFIX,
};
pub use object::{Object, ViewMode};
pub use overload::{OverloadItem, OverloadSet, Pattern};
pub use property::{NamingConventions, Property, PropertyConfig};
pub use types::{class, virtual_base, BaseClassSpec, Description, MemberTable, Type, TypeBuilder};
pub use value::{Function, NativeFn, Value, ValueKind, ValueMap};
