//! Member descriptors
//!
//! A [`MemberDescriptor`] is the authored declaration of one member: access
//! level, virtuality, the `New` flag and a payload. The access-level
//! namespaces [`Private`], [`Protected`] and [`Public`] expose the legal
//! combinations; the `mark_*` methods compose the same markers and reject
//! local contradictions immediately.
//!
//! Once a type is defined every declaration becomes a resolved [`Member`]
//! that knows its name, its declaring type and the ancestor members it hides.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::{ClassError, ClassResult};
use crate::overload::OverloadSet;
use crate::property::{Property, PropertyConfig};
use crate::types::{Type, TypeInner};
use crate::value::{Function, Value};

/// Name of the constructor member
pub const CONSTRUCTOR_NAME: &str = "__Constructor";

/// Prefix reserved for runtime-provided names
pub const RESERVED_PREFIX: &str = "__";

/// Access level, ordered from least to most visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Access {
    /// Visible only to the declaring type's own member bodies
    Private,
    /// Visible to member bodies of the declaring type and its descendants
    Protected,
    /// Visible everywhere, including the external handle
    Public,
}

/// Virtuality state of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Virtuality {
    /// Statically bound
    Normal,
    /// Virtual without an implementation; makes the type abstract
    Abstract,
    /// Virtual with an implementation
    Virtual,
    /// Replaces an inherited virtual implementation
    Override,
}

/// What a member holds
#[derive(Debug, Clone)]
pub enum Payload {
    /// Plain field value
    Value(Value),
    /// Method
    Function(Function),
    /// Computed property
    Property(Property),
    /// Event (each instance gets its own event object)
    Event,
}

impl Payload {
    /// Check if the payload is a function
    pub fn is_function(&self) -> bool {
        matches!(self, Payload::Function(_))
    }

    /// Check if the payload is an event
    pub fn is_event(&self) -> bool {
        matches!(self, Payload::Event)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::Function(f) => Payload::Function(f),
            other => Payload::Value(other),
        }
    }
}

impl From<Function> for Payload {
    fn from(f: Function) -> Self {
        Payload::Function(f)
    }
}

impl From<bool> for Payload {
    fn from(b: bool) -> Self {
        Payload::Value(Value::from(b))
    }
}

impl From<f64> for Payload {
    fn from(n: f64) -> Self {
        Payload::Value(Value::from(n))
    }
}

impl From<i32> for Payload {
    fn from(n: i32) -> Self {
        Payload::Value(Value::from(n))
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Value(Value::from(s))
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Value(Value::from(s))
    }
}

/// Authored declaration of one member
#[derive(Debug, Clone)]
pub struct MemberDescriptor {
    access: Access,
    virtuality: Virtuality,
    introduces_new: bool,
    payload: Payload,
}

impl MemberDescriptor {
    /// Declare a normal member with the given access and payload
    ///
    /// Events and properties must be public.
    pub fn declare(access: Access, payload: impl Into<Payload>) -> ClassResult<Self> {
        let payload = payload.into();
        if access != Access::Public {
            let kind = match payload {
                Payload::Event => Some("events"),
                Payload::Property(_) => Some("properties"),
                _ => None,
            };
            if let Some(kind) = kind {
                return Err(ClassError::InvalidDeclaration {
                    reason: format!("only public members can be {}", kind),
                });
            }
        }
        Ok(Self::plain(access, payload))
    }

    fn plain(access: Access, payload: Payload) -> Self {
        Self::with_markers(access, payload, Virtuality::Normal, false)
    }

    fn require_non_private(&self, marker: &str) -> ClassResult<()> {
        if self.access == Access::Private {
            return Err(ClassError::InvalidDeclaration {
                reason: format!("private members cannot be marked {}", marker),
            });
        }
        Ok(())
    }

    fn require_function(&self, marker: &str) -> ClassResult<()> {
        if !self.payload.is_function() {
            return Err(ClassError::InvalidDeclaration {
                reason: format!("only functions can be marked {}", marker),
            });
        }
        Ok(())
    }

    /// Mark as introducing a new name that hides inherited members
    pub fn mark_new(mut self) -> ClassResult<Self> {
        if self.virtuality == Virtuality::Override {
            return Err(ClassError::InvalidDeclaration {
                reason: "a member cannot be both New and Override".to_string(),
            });
        }
        self.introduces_new = true;
        Ok(self)
    }

    /// Mark a function member as virtual
    pub fn mark_virtual(mut self) -> ClassResult<Self> {
        self.require_non_private("Virtual")?;
        self.require_function("Virtual")?;
        if self.virtuality != Virtuality::Normal {
            return Err(ClassError::InvalidDeclaration {
                reason: format!("a {:?} member cannot be marked Virtual", self.virtuality),
            });
        }
        self.virtuality = Virtuality::Virtual;
        Ok(self)
    }

    /// Mark a function member as overriding an inherited virtual member
    pub fn mark_override(mut self) -> ClassResult<Self> {
        self.require_non_private("Override")?;
        self.require_function("Override")?;
        if self.introduces_new {
            return Err(ClassError::InvalidDeclaration {
                reason: "a member cannot be both New and Override".to_string(),
            });
        }
        if self.virtuality != Virtuality::Normal {
            return Err(ClassError::InvalidDeclaration {
                reason: format!("a {:?} member cannot be marked Override", self.virtuality),
            });
        }
        self.virtuality = Virtuality::Override;
        Ok(self)
    }

    /// Mark as abstract; the payload becomes a function that always fails
    pub fn mark_abstract(mut self) -> ClassResult<Self> {
        self.require_non_private("Abstract")?;
        if self.virtuality == Virtuality::Override {
            return Err(ClassError::InvalidDeclaration {
                reason: "an Override member cannot be marked Abstract".to_string(),
            });
        }
        self.virtuality = Virtuality::Abstract;
        self.payload = Payload::Function(abstract_function());
        Ok(self)
    }

    /// Turn a public member into an event
    pub fn mark_event(mut self) -> ClassResult<Self> {
        if self.access != Access::Public {
            return Err(ClassError::InvalidDeclaration {
                reason: "only public members can be events".to_string(),
            });
        }
        if self.virtuality != Virtuality::Normal {
            return Err(ClassError::InvalidDeclaration {
                reason: "events cannot be virtual".to_string(),
            });
        }
        self.payload = Payload::Event;
        Ok(self)
    }

    /// Turn a public member into a computed property
    pub fn mark_property(mut self, config: &PropertyConfig) -> ClassResult<Self> {
        if self.access != Access::Public {
            return Err(ClassError::InvalidDeclaration {
                reason: "only public members can be properties".to_string(),
            });
        }
        if self.virtuality != Virtuality::Normal {
            return Err(ClassError::InvalidDeclaration {
                reason: "properties cannot be virtual".to_string(),
            });
        }
        self.payload = Payload::Property(config.validate()?);
        Ok(self)
    }

    /// Access level
    pub fn access(&self) -> Access {
        self.access
    }

    /// Virtuality state
    pub fn virtuality(&self) -> Virtuality {
        self.virtuality
    }

    /// Whether the member introduces a new name
    pub fn introduces_new(&self) -> bool {
        self.introduces_new
    }

    /// Payload
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub(crate) fn set_payload(&mut self, payload: Payload) {
        self.payload = payload;
    }

    fn with_markers(
        access: Access,
        payload: Payload,
        virtuality: Virtuality,
        introduces_new: bool,
    ) -> Self {
        Self {
            access,
            virtuality,
            introduces_new,
            payload,
        }
    }
}

fn abstract_function() -> Function {
    Function::free(|_| Err(ClassError::AbstractCall))
}

/// Private member declarations
pub struct Private;

impl Private {
    /// Private field or method
    pub fn member(value: impl Into<Payload>) -> MemberDescriptor {
        MemberDescriptor::plain(Access::Private, value.into())
    }

    /// Private overloaded method
    pub fn overload(set: OverloadSet) -> MemberDescriptor {
        MemberDescriptor::plain(Access::Private, Payload::Function(set.build()))
    }

    /// Private member reusing an inherited name (`New`)
    pub fn hiding(value: impl Into<Payload>) -> MemberDescriptor {
        hiding(Access::Private, value)
    }
}

fn hiding(access: Access, value: impl Into<Payload>) -> MemberDescriptor {
    MemberDescriptor::with_markers(access, value.into(), Virtuality::Normal, true)
}

fn virtual_fn(access: Access, f: Function) -> MemberDescriptor {
    MemberDescriptor::with_markers(access, Payload::Function(f), Virtuality::Virtual, false)
}

fn new_virtual(access: Access, f: Function) -> MemberDescriptor {
    MemberDescriptor::with_markers(access, Payload::Function(f), Virtuality::Virtual, true)
}

fn override_fn(access: Access, f: Function) -> MemberDescriptor {
    MemberDescriptor::with_markers(access, Payload::Function(f), Virtuality::Override, false)
}

fn abstract_fn(access: Access) -> MemberDescriptor {
    MemberDescriptor::with_markers(
        access,
        Payload::Function(abstract_function()),
        Virtuality::Abstract,
        false,
    )
}

/// Protected member declarations
pub struct Protected;

impl Protected {
    /// Protected field or method
    pub fn member(value: impl Into<Payload>) -> MemberDescriptor {
        MemberDescriptor::plain(Access::Protected, value.into())
    }

    /// Protected overloaded method
    pub fn overload(set: OverloadSet) -> MemberDescriptor {
        MemberDescriptor::plain(Access::Protected, Payload::Function(set.build()))
    }

    /// Protected member hiding an inherited one (`New`)
    pub fn hiding(value: impl Into<Payload>) -> MemberDescriptor {
        hiding(Access::Protected, value)
    }

    /// Protected virtual method
    pub fn virtual_fn(f: Function) -> MemberDescriptor {
        virtual_fn(Access::Protected, f)
    }

    /// Protected virtual method hiding an inherited one (`NewVirtual`)
    pub fn new_virtual(f: Function) -> MemberDescriptor {
        new_virtual(Access::Protected, f)
    }

    /// Protected override
    pub fn override_fn(f: Function) -> MemberDescriptor {
        override_fn(Access::Protected, f)
    }

    /// Protected abstract method
    pub fn abstract_fn() -> MemberDescriptor {
        abstract_fn(Access::Protected)
    }
}

/// Public member declarations
pub struct Public;

impl Public {
    /// Public field or method
    pub fn member(value: impl Into<Payload>) -> MemberDescriptor {
        MemberDescriptor::plain(Access::Public, value.into())
    }

    /// Public overloaded method
    pub fn overload(set: OverloadSet) -> MemberDescriptor {
        MemberDescriptor::plain(Access::Public, Payload::Function(set.build()))
    }

    /// Public member hiding an inherited one (`New`)
    pub fn hiding(value: impl Into<Payload>) -> MemberDescriptor {
        hiding(Access::Public, value)
    }

    /// Public virtual method
    pub fn virtual_fn(f: Function) -> MemberDescriptor {
        virtual_fn(Access::Public, f)
    }

    /// Public virtual method hiding an inherited one (`NewVirtual`)
    pub fn new_virtual(f: Function) -> MemberDescriptor {
        new_virtual(Access::Public, f)
    }

    /// Public override
    pub fn override_fn(f: Function) -> MemberDescriptor {
        override_fn(Access::Public, f)
    }

    /// Public abstract method
    pub fn abstract_fn() -> MemberDescriptor {
        abstract_fn(Access::Public)
    }

    /// Public event
    pub fn event() -> MemberDescriptor {
        MemberDescriptor::plain(Access::Public, Payload::Event)
    }

    /// Public computed property
    pub fn property(config: PropertyConfig) -> ClassResult<MemberDescriptor> {
        Ok(MemberDescriptor::plain(
            Access::Public,
            Payload::Property(config.validate()?),
        ))
    }
}

struct MemberInfo {
    name: Arc<str>,
    descriptor: MemberDescriptor,
    declaring_type: Weak<TypeInner>,
    declaring_name: Arc<str>,
    hidden: Vec<Member>,
}

/// A member as resolved by the type builder
#[derive(Clone)]
pub struct Member {
    inner: Arc<MemberInfo>,
}

impl Member {
    pub(crate) fn new(
        name: Arc<str>,
        descriptor: MemberDescriptor,
        declaring_type: Weak<TypeInner>,
        declaring_name: Arc<str>,
        hidden: Vec<Member>,
    ) -> Self {
        Self {
            inner: Arc::new(MemberInfo {
                name,
                descriptor,
                declaring_type,
                declaring_name,
                hidden,
            }),
        }
    }

    /// Member name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Access level
    pub fn access(&self) -> Access {
        self.inner.descriptor.access
    }

    /// Virtuality state
    pub fn virtuality(&self) -> Virtuality {
        self.inner.descriptor.virtuality
    }

    /// Whether the member was declared `New`
    pub fn introduces_new(&self) -> bool {
        self.inner.descriptor.introduces_new
    }

    /// Payload (property names resolved)
    pub fn payload(&self) -> &Payload {
        &self.inner.descriptor.payload
    }

    /// Type that declared this member
    pub fn declaring_type(&self) -> Option<Type> {
        self.inner.declaring_type.upgrade().map(Type::from_inner)
    }

    /// Full name of the declaring type
    pub fn declaring_type_name(&self) -> &str {
        &self.inner.declaring_name
    }

    /// Ancestor members this member hides or overrides
    pub fn hidden_members(&self) -> &[Member] {
        &self.inner.hidden
    }

    /// Check if the member is an event
    pub fn is_event(&self) -> bool {
        self.payload().is_event()
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Member) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name())
            .field("declaring_type", &self.declaring_type_name())
            .field("access", &self.access())
            .field("virtuality", &self.virtuality())
            .field("new", &self.introduces_new())
            .field("hidden", &self.inner.hidden.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Function {
        Function::free(|_| Ok(Value::Undefined))
    }

    #[test]
    fn test_declare_defaults() {
        let d = Public::member(42);
        assert_eq!(d.access(), Access::Public);
        assert_eq!(d.virtuality(), Virtuality::Normal);
        assert!(!d.introduces_new());
        assert!(matches!(d.payload(), Payload::Value(Value::Number(n)) if *n == 42.0));
    }

    #[test]
    fn test_function_value_becomes_function_payload() {
        let d = Private::member(Value::Function(noop()));
        assert!(d.payload().is_function());
    }

    #[test]
    fn test_markers_compose() {
        let d = MemberDescriptor::declare(Access::Protected, noop())
            .and_then(MemberDescriptor::mark_new)
            .and_then(MemberDescriptor::mark_virtual)
            .unwrap();
        assert!(d.introduces_new());
        assert_eq!(d.virtuality(), Virtuality::Virtual);
    }

    #[test]
    fn test_virtual_requires_function() {
        let err = Public::member(1).mark_virtual().unwrap_err();
        assert!(matches!(err, ClassError::InvalidDeclaration { .. }));
    }

    #[test]
    fn test_private_cannot_be_virtual() {
        let err = Private::member(noop()).mark_virtual().unwrap_err();
        assert!(matches!(err, ClassError::InvalidDeclaration { .. }));
        let err = Private::member(noop()).mark_override().unwrap_err();
        assert!(matches!(err, ClassError::InvalidDeclaration { .. }));
    }

    #[test]
    fn test_private_can_be_new() {
        let d = Private::member(1).mark_new().unwrap();
        assert!(d.introduces_new());
        assert_eq!(d.access(), Access::Private);
        assert!(Private::hiding(1).introduces_new());
    }

    #[test]
    fn test_declare_rejects_non_public_events_and_properties() {
        let err = MemberDescriptor::declare(Access::Private, Payload::Event).unwrap_err();
        assert!(matches!(err, ClassError::InvalidDeclaration { .. }));

        let property = PropertyConfig::new().validate().unwrap();
        let err = MemberDescriptor::declare(Access::Protected, Payload::Property(property.clone()))
            .unwrap_err();
        assert!(matches!(err, ClassError::InvalidDeclaration { .. }));

        assert!(MemberDescriptor::declare(Access::Public, Payload::Event).is_ok());
        assert!(MemberDescriptor::declare(Access::Public, Payload::Property(property)).is_ok());
    }

    #[test]
    fn test_new_and_override_conflict() {
        let err = Public::member(noop())
            .mark_override()
            .and_then(MemberDescriptor::mark_new)
            .unwrap_err();
        assert!(matches!(err, ClassError::InvalidDeclaration { .. }));
    }

    #[test]
    fn test_abstract_payload_fails() {
        let d = Public::abstract_fn();
        assert_eq!(d.virtuality(), Virtuality::Abstract);
        match d.payload() {
            Payload::Function(f) => assert_eq!(f.invoke(&[]), Err(ClassError::AbstractCall)),
            other => panic!("Expected function payload, got {:?}", other),
        }
    }

    #[test]
    fn test_event_only_public() {
        assert!(Public::event().payload().is_event());
        let err = Protected::member(0).mark_event().unwrap_err();
        assert!(matches!(err, ClassError::InvalidDeclaration { .. }));
    }

    #[test]
    fn test_property_validated_at_declaration() {
        let err = Public::property(PropertyConfig::new().setter("Put")).unwrap_err();
        assert!(matches!(err, ClassError::InvalidPropertyConfig { .. }));

        let d = Public::member(Value::Undefined)
            .mark_property(&PropertyConfig::new().getter("Read"))
            .unwrap();
        match d.payload() {
            Payload::Property(p) => assert!(p.is_readonly()),
            other => panic!("Expected property payload, got {:?}", other),
        }
    }

    #[test]
    fn test_access_order() {
        assert!(Access::Private < Access::Protected);
        assert!(Access::Protected < Access::Public);
    }
}
