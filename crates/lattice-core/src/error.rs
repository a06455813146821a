//! Errors raised while declaring members, defining types, constructing
//! instances and calling members.
//!
//! Every variant is structural: it points at a defect in a type description
//! or in a call site. Nothing in this crate catches or retries them.

use std::fmt;

use thiserror::Error;

/// Result alias used throughout the runtime
pub type ClassResult<T> = Result<T, ClassError>;

/// What a member hides when it is redeclared without `New` or `Override`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiddenKind {
    /// Every hidden member is a normal (non-virtual) member
    Normal,
    /// At least one hidden member is virtual or abstract
    Virtual,
}

impl HiddenKind {
    /// The marker the redeclaration is missing
    pub fn required_marker(self) -> &'static str {
        match self {
            HiddenKind::Normal => "New",
            HiddenKind::Virtual => "Override",
        }
    }
}

impl fmt::Display for HiddenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HiddenKind::Normal => f.write_str("normal"),
            HiddenKind::Virtual => f.write_str("virtual"),
        }
    }
}

/// Errors produced by the object-model runtime
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClassError {
    // ------------------------------------------------------------------
    // Declaration time
    // ------------------------------------------------------------------
    /// A property configuration contradicts itself
    #[error("Invalid property configuration: {reason}")]
    InvalidPropertyConfig {
        /// What is contradictory
        reason: String,
    },

    /// A member declaration combines markers that cannot go together
    #[error("Invalid member declaration: {reason}")]
    InvalidDeclaration {
        /// What is invalid
        reason: String,
    },

    /// The alternating (patterns, implementation) list is malformed
    #[error("Overload list must alternate patterns and implementations, got {len} items")]
    MalformedOverloadList {
        /// Number of items supplied
        len: usize,
    },

    // ------------------------------------------------------------------
    // Definition time
    // ------------------------------------------------------------------
    /// A base class is inherited more than once and not every path is virtual
    #[error("Type \"{type_name}\" cannot non-virtually inherit from \"{base}\" multiple times")]
    DuplicateNonVirtualBase {
        /// Type being defined
        type_name: String,
        /// Base reached more than once
        base: String,
    },

    /// Two distinct types in one lattice share a full name
    #[error("Type \"{type_name}\" reaches two different types named \"{name}\"")]
    AmbiguousName {
        /// Type being defined
        type_name: String,
        /// The colliding full name
        name: String,
    },

    /// Two unrelated ancestors supply the same member name
    #[error("Type \"{type_name}\" inherits multiple members named \"{member}\" without declaring a new one")]
    AmbiguousMember {
        /// Type being defined
        type_name: String,
        /// Member name
        member: String,
    },

    /// `Override` used on a member that only hides normal members
    #[error("Type \"{type_name}\" cannot override non-virtual member \"{member}\"")]
    OverrideTargetNotVirtual {
        /// Type being defined
        type_name: String,
        /// Member name
        member: String,
    },

    /// `Override` used on a member that hides nothing
    #[error("Type \"{type_name}\" cannot find virtual member \"{member}\" to override")]
    NoOverrideTarget {
        /// Type being defined
        type_name: String,
        /// Member name
        member: String,
    },

    /// A member hides an inherited one without `New` or `Override`
    #[error("Type \"{type_name}\" cannot hide {kind} member \"{member}\" without {}", .kind.required_marker())]
    HiddenMemberRequiresNewOrOverride {
        /// Type being defined
        type_name: String,
        /// Member name
        member: String,
        /// What is being hidden
        kind: HiddenKind,
    },

    /// `New` used on a member that hides nothing
    #[error("Type \"{type_name}\" declares member \"{member}\" as New but there is nothing to hide")]
    NothingToHide {
        /// Type being defined
        type_name: String,
        /// Member name
        member: String,
    },

    /// A member hides an inherited event
    #[error("Type \"{type_name}\" cannot hide event \"{member}\"")]
    HiddenEvent {
        /// Type being defined
        type_name: String,
        /// Member name
        member: String,
    },

    /// A member name uses the reserved `__` prefix
    #[error("Type \"{type_name}\" declares member \"{member}\" with the reserved \"__\" prefix")]
    ReservedName {
        /// Type being defined
        type_name: String,
        /// Member name
        member: String,
    },

    // ------------------------------------------------------------------
    // Construction time
    // ------------------------------------------------------------------
    /// The type still has abstract members
    #[error("Cannot instantiate abstract type \"{type_name}\" (abstract members: {})", .members.join(", "))]
    AbstractInstantiation {
        /// Type being constructed
        type_name: String,
        /// Members still abstract
        members: Vec<String>,
    },

    /// An abstract member was called
    #[error("Cannot call an abstract function")]
    AbstractCall,

    /// A base constructor was invoked illegally
    #[error("Constructor chain error on \"{type_name}\": {reason}")]
    ConstructorChain {
        /// The base whose constructor was involved
        type_name: String,
        /// What went wrong
        reason: String,
    },

    /// A base constructor was never invoked
    #[error("Constructing \"{type_name}\" never invoked the constructor of base \"{base}\"")]
    UnconstructedBase {
        /// Type being constructed
        type_name: String,
        /// Base whose constructor did not run
        base: String,
    },

    /// A property accessor names a member that does not exist or is not a function
    #[error("Property \"{property}\" refers to missing accessor \"{accessor}\"")]
    MissingAccessor {
        /// Property name
        property: String,
        /// Getter or setter name
        accessor: String,
    },

    /// `detach` called with a handle this event did not create
    #[error("Only handlers created by this event can be detached")]
    ForeignEventHandle,

    // ------------------------------------------------------------------
    // Member access
    // ------------------------------------------------------------------
    /// No member with that name is visible
    #[error("\"{type_name}\" has no member \"{member}\"")]
    UnknownMember {
        /// Type whose scope was searched
        type_name: String,
        /// Member name
        member: String,
    },

    /// The member exists but is not visible at this access level
    #[error("Member \"{member}\" of \"{type_name}\" is not accessible here")]
    InaccessibleMember {
        /// Type whose scope was searched
        type_name: String,
        /// Member name
        member: String,
    },

    /// Write to a method, event, readonly property or static view
    #[error("Member \"{member}\" is read-only")]
    ReadOnlyMember {
        /// Member name
        member: String,
    },

    /// Call of a member that holds no function
    #[error("Member \"{member}\" is not callable")]
    NotCallable {
        /// Member name
        member: String,
    },

    /// The member exists but holds no event
    #[error("Member \"{member}\" is not an event")]
    NotAnEvent {
        /// Member name
        member: String,
    },

    /// A scoped view was requested for a type outside the lattice
    #[error("\"{ancestor}\" is not \"{type_name}\" or one of its bases")]
    NotAnAncestor {
        /// Concrete type of the instance
        type_name: String,
        /// Requested ancestor
        ancestor: String,
    },

    // ------------------------------------------------------------------
    // Call time
    // ------------------------------------------------------------------
    /// No overload alternative accepts the arguments
    #[error("Cannot find an overload that matches the arguments ({arguments})")]
    NoMatchingOverload {
        /// Kinds of the supplied arguments
        arguments: String,
    },

    /// Failure raised by application code inside a member body
    #[error("{0}")]
    Custom(String),
}

impl From<String> for ClassError {
    fn from(s: String) -> Self {
        ClassError::Custom(s)
    }
}

impl From<&str> for ClassError {
    fn from(s: &str) -> Self {
        ClassError::Custom(s.to_string())
    }
}
