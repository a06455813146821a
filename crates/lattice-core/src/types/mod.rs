//! Type records
//!
//! A [`Type`] is the frozen result of a type definition: its own members,
//! the flattened member table after hiding and overriding, its direct bases
//! and the deduplicated lattice of all ancestors. Types are immutable and
//! shared behind an `Arc`; any number of threads may construct instances of
//! one type concurrently.

mod builder;

pub use builder::{class, TypeBuilder};

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::error::ClassResult;
use crate::member::{Member, MemberDescriptor, Payload, Public, Virtuality, CONSTRUCTOR_NAME};
use crate::object::{self, Object};
use crate::value::{Function, Value};

/// Resolved members keyed by name, in declaration order
pub type MemberTable = IndexMap<Arc<str>, Member, FxBuildHasher>;

/// Authored member description of one type, in declaration order
#[derive(Debug, Clone, Default)]
pub struct Description {
    members: IndexMap<String, MemberDescriptor, FxBuildHasher>,
}

impl Description {
    /// Create an empty description
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member; a repeated name replaces the earlier declaration
    pub fn member(mut self, name: impl Into<String>, descriptor: MemberDescriptor) -> Self {
        self.members.insert(name.into(), descriptor);
        self
    }

    /// Add the constructor
    pub fn constructor(self, f: Function) -> Self {
        self.member(CONSTRUCTOR_NAME, Public::member(f))
    }

    /// Number of declared members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if nothing is declared
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub(crate) fn into_members(self) -> IndexMap<String, MemberDescriptor, FxBuildHasher> {
        self.members
    }
}

/// A direct base with its inheritance mode
#[derive(Debug, Clone, PartialEq)]
pub struct BaseClassSpec {
    /// Base type
    pub ty: Type,
    /// Shared across diamonds when true
    pub is_virtual: bool,
}

impl From<&Type> for BaseClassSpec {
    fn from(ty: &Type) -> Self {
        BaseClassSpec {
            ty: ty.clone(),
            is_virtual: false,
        }
    }
}

impl From<Type> for BaseClassSpec {
    fn from(ty: Type) -> Self {
        BaseClassSpec {
            ty,
            is_virtual: false,
        }
    }
}

/// Mark a direct base as virtual
pub fn virtual_base(ty: &Type) -> BaseClassSpec {
    BaseClassSpec {
        ty: ty.clone(),
        is_virtual: true,
    }
}

pub(crate) struct TypeInner {
    pub(crate) full_name: Arc<str>,
    pub(crate) description: MemberTable,
    pub(crate) flattened_description: MemberTable,
    pub(crate) base_classes: Vec<BaseClassSpec>,
    pub(crate) flattened_base_classes: Vec<BaseClassSpec>,
    pub(crate) is_abstract: bool,
}

/// Immutable type record; cloning shares it
#[derive(Clone)]
pub struct Type {
    inner: Arc<TypeInner>,
}

impl Type {
    pub(crate) fn from_inner(inner: Arc<TypeInner>) -> Self {
        Self { inner }
    }

    /// Full name
    pub fn full_name(&self) -> &str {
        &self.inner.full_name
    }

    /// Members declared by this type (constructor included)
    pub fn description(&self) -> &MemberTable {
        &self.inner.description
    }

    /// Own members plus every visible inherited member
    pub fn flattened_description(&self) -> &MemberTable {
        &self.inner.flattened_description
    }

    /// Direct bases in declaration order
    pub fn base_classes(&self) -> &[BaseClassSpec] {
        &self.inner.base_classes
    }

    /// Every ancestor exactly once, bases before the classes deriving from them
    pub fn flattened_base_classes(&self) -> &[BaseClassSpec] {
        &self.inner.flattened_base_classes
    }

    /// Whether any visible member is still abstract
    pub fn is_abstract(&self) -> bool {
        self.inner.is_abstract
    }

    /// Names of the visible members that are still abstract
    pub fn abstract_members(&self) -> Vec<String> {
        self.inner
            .flattened_description
            .values()
            .filter(|m| m.virtuality() == Virtuality::Abstract)
            .map(|m| m.name().to_string())
            .collect()
    }

    /// Visible member by name
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.inner.flattened_description.get(name)
    }

    /// Declared constructor, if any
    pub fn constructor(&self) -> Option<&Function> {
        match self.inner.description.get(CONSTRUCTOR_NAME)?.payload() {
            Payload::Function(f) => Some(f),
            _ => None,
        }
    }

    /// True iff `child` is this type or inherits from it
    pub fn is_assignable_from(&self, child: &Type) -> bool {
        if self == child {
            return true;
        }
        child
            .base_classes()
            .iter()
            .any(|base| self.is_assignable_from(&base.ty))
    }

    /// Create an instance, running the constructor chain with `args`
    pub fn construct(&self, args: &[Value]) -> ClassResult<Object> {
        object::construct(self, args)
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Type {}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Type")
            .field("full_name", &self.full_name())
            .field(
                "bases",
                &self
                    .base_classes()
                    .iter()
                    .map(|b| b.ty.full_name())
                    .collect::<Vec<_>>(),
            )
            .field("abstract", &self.is_abstract())
            .finish()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_name())
    }
}
