//! Instances and scoped references
//!
//! An [`Object`] is a handle onto one instance seen through one scope:
//!
//! - the external handle sees the concrete type's `Public` members
//! - an internal reference (the `this` of a member body) sees everything its
//!   class can see, `Private` members included
//! - a scoped view sees one ancestor's `Public` members, plus its `Protected`
//!   members when it was requested from inside a member body
//!
//! Dynamic views forward to the live state. Static views are read-only and
//! keep the field values they observed when first requested.

mod construct;
mod record;

pub(crate) use construct::construct;

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use self::record::{Accessor, InstanceState, PropertySlot, RecordId, Resolved, Slot};
use crate::error::{ClassError, ClassResult};
use crate::event::Event;
use crate::member::Access;
use crate::types::Type;
use crate::value::Value;

/// Kind of scoped view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewMode {
    /// Read-only, field values frozen at view creation
    Static,
    /// Read/write, forwards to the live state
    Dynamic,
}

pub(crate) struct ViewState {
    record: RecordId,
    mode: ViewMode,
    min_access: Access,
    snapshot: FxHashMap<Arc<str>, Value>,
}

#[derive(Clone)]
enum Scope {
    External,
    Internal(RecordId),
    View(Arc<ViewState>),
}

/// Handle onto an instance
///
/// Every handle, view and bound method keeps the whole instance alive.
/// Instances are reference counted without cycle collection, so an instance
/// that stores a handle to itself in one of its own fields, or attaches a
/// handler capturing such a handle to one of its own events, is never freed.
/// Clear the field or detach the handler to break the cycle.
#[derive(Clone)]
pub struct Object {
    state: Option<Arc<InstanceState>>,
    scope: Scope,
}

static UNBOUND: Object = Object {
    state: None,
    scope: Scope::External,
};

const UNBOUND_NAME: &str = "<unbound>";

impl Object {
    /// Receiver used for functions called without one; it has no members
    pub fn unbound() -> &'static Object {
        &UNBOUND
    }

    pub(crate) fn internal(state: Arc<InstanceState>, record: RecordId) -> Self {
        Self {
            state: Some(state),
            scope: Scope::Internal(record),
        }
    }

    pub(crate) fn external(state: Arc<InstanceState>) -> Self {
        Self {
            state: Some(state),
            scope: Scope::External,
        }
    }

    fn state(&self, member: &str) -> ClassResult<&Arc<InstanceState>> {
        self.state.as_ref().ok_or_else(|| ClassError::UnknownMember {
            type_name: UNBOUND_NAME.to_string(),
            member: member.to_string(),
        })
    }

    /// Concrete type of the instance; `None` for the unbound receiver
    pub fn type_of(&self) -> Option<Type> {
        self.state.as_ref().map(|state| state.ty.clone())
    }

    /// The class whose view of the instance this handle is
    pub fn scope_type(&self) -> Option<Type> {
        let state = self.state.as_ref()?;
        Some(state.records[self.scope_record(state)].class.clone())
    }

    /// Whether this is the external handle
    pub fn is_external(&self) -> bool {
        self.state.is_some() && matches!(self.scope, Scope::External)
    }

    fn scope_record(&self, state: &InstanceState) -> RecordId {
        match &self.scope {
            Scope::External => state.root(),
            Scope::Internal(record) => *record,
            Scope::View(view) => view.record,
        }
    }

    fn min_access(&self) -> Access {
        match &self.scope {
            Scope::External => Access::Public,
            Scope::Internal(_) => Access::Private,
            Scope::View(view) => view.min_access,
        }
    }

    fn is_static(&self) -> bool {
        matches!(&self.scope, Scope::View(view) if view.mode == ViewMode::Static)
    }

    fn lookup<'a>(&self, state: &'a InstanceState, name: &str) -> ClassResult<Resolved<'a>> {
        let record = self.scope_record(state);
        let resolved = state
            .resolve(record, name)
            .ok_or_else(|| ClassError::UnknownMember {
                type_name: state.class_name(record).to_string(),
                member: name.to_string(),
            })?;
        if resolved.access < self.min_access() {
            return Err(ClassError::InaccessibleMember {
                type_name: state.class_name(record).to_string(),
                member: name.to_string(),
            });
        }
        Ok(resolved)
    }

    /// Check if `name` is visible in this scope
    pub fn has_member(&self, name: &str) -> bool {
        match &self.state {
            Some(state) => self.lookup(state, name).is_ok(),
            None => false,
        }
    }

    /// Names visible in this scope, in declaration order
    pub fn member_names(&self) -> Vec<String> {
        let Some(state) = &self.state else {
            return Vec::new();
        };
        let min_access = self.min_access();
        state.records[self.scope_record(state)]
            .slots
            .iter()
            .filter(|(_, entry)| entry.access >= min_access)
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Read a member
    ///
    /// Methods come back bound to their receiver, properties call their
    /// getter and events return the event object.
    pub fn get(&self, name: &str) -> ClassResult<Value> {
        let state = self.state(name)?;
        let resolved = self.lookup(state, name)?;
        match resolved.slot {
            Slot::Field(value) => {
                if let Scope::View(view) = &self.scope {
                    if let Some(frozen) = view.snapshot.get(name) {
                        return Ok(frozen.clone());
                    }
                }
                Ok(value.read().clone())
            }
            Slot::Method { function, owner } => Ok(Value::Function(
                function.bind(Object::internal(state.clone(), *owner)),
            )),
            Slot::Property(property) => read_property(state, name, property),
            Slot::Event(event) => Ok(Value::Event(event.clone())),
            Slot::Link(_) => Err(unknown(state, resolved.owner, name)),
        }
    }

    /// Write a member
    pub fn set(&self, name: &str, value: impl Into<Value>) -> ClassResult<()> {
        let state = self.state(name)?;
        let resolved = self.lookup(state, name)?;
        if self.is_static() {
            return Err(read_only(name));
        }
        match resolved.slot {
            Slot::Field(slot) => {
                *slot.write() = value.into();
                Ok(())
            }
            Slot::Property(property) => write_property(state, name, property, value.into()),
            Slot::Method { .. } | Slot::Event(_) => Err(read_only(name)),
            Slot::Link(_) => Err(unknown(state, resolved.owner, name)),
        }
    }

    /// Call a member with `args`
    pub fn call(&self, name: &str, args: &[Value]) -> ClassResult<Value> {
        let state = self.state(name)?;
        let resolved = self.lookup(state, name)?;
        match resolved.slot {
            Slot::Method { function, owner } => {
                function.call(&Object::internal(state.clone(), *owner), args)
            }
            Slot::Field(value) => {
                let callee = value.read().as_function().cloned();
                match callee {
                    Some(function) => {
                        function.call(&Object::internal(state.clone(), resolved.owner), args)
                    }
                    None => Err(not_callable(name)),
                }
            }
            Slot::Property(property) => match read_property(state, name, property)? {
                Value::Function(function) => function.invoke(args),
                _ => Err(not_callable(name)),
            },
            Slot::Event(_) | Slot::Link(_) => Err(not_callable(name)),
        }
    }

    /// Event member by name
    pub fn event(&self, name: &str) -> ClassResult<Event> {
        let state = self.state(name)?;
        match self.lookup(state, name)?.slot {
            Slot::Event(event) => Ok(event.clone()),
            _ => Err(ClassError::NotAnEvent {
                member: name.to_string(),
            }),
        }
    }

    /// The public handle of this instance
    pub fn external_reference(&self) -> ClassResult<Object> {
        let state = self.state("external_reference")?;
        Ok(Object::external(state.clone()))
    }

    /// Live read/write view of `ancestor`
    pub fn dynamic_view(&self, ancestor: &Type) -> ClassResult<Object> {
        self.view(ancestor, ViewMode::Dynamic)
    }

    /// Read-only view of `ancestor` with field values frozen on first request
    pub fn static_view(&self, ancestor: &Type) -> ClassResult<Object> {
        self.view(ancestor, ViewMode::Static)
    }

    fn view(&self, ancestor: &Type, mode: ViewMode) -> ClassResult<Object> {
        let state = self.state(ancestor.full_name())?;
        let record = state
            .record_of(ancestor)
            .ok_or_else(|| ClassError::NotAnAncestor {
                type_name: state.ty.full_name().to_string(),
                ancestor: ancestor.full_name().to_string(),
            })?;
        let min_access = match &self.scope {
            Scope::External => Access::Public,
            Scope::Internal(_) => Access::Protected,
            Scope::View(view) => view.min_access,
        };

        let mut views = state.views.lock();
        let view = views
            .entry((record, mode, min_access))
            .or_insert_with(|| {
                tracing::trace!(
                    ancestor = %ancestor.full_name(),
                    ?mode,
                    ?min_access,
                    "created view"
                );
                Arc::new(ViewState {
                    record,
                    mode,
                    min_access,
                    snapshot: match mode {
                        ViewMode::Static => snapshot(state, record, min_access),
                        ViewMode::Dynamic => FxHashMap::default(),
                    },
                })
            })
            .clone();

        Ok(Object {
            state: Some(state.clone()),
            scope: Scope::View(view),
        })
    }

    /// Invoke the constructor of the direct (or delegated) base `base`
    ///
    /// Only valid from a member body while the instance is being constructed.
    pub fn init_base(&self, base: &Type, args: &[Value]) -> ClassResult<()> {
        let state = self.state(base.full_name())?;
        match &self.scope {
            Scope::Internal(caller) => construct::init_base(state, *caller, base, args),
            _ => Err(ClassError::ConstructorChain {
                type_name: base.full_name().to_string(),
                reason: "base constructors can only be invoked from a member body".to_string(),
            }),
        }
    }

    /// Whether both handles refer to the same instance, whatever their scope
    pub fn same_instance(&self, other: &Object) -> bool {
        match (&self.state, &other.state) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Identity comparison: same instance through the same scope
    pub fn ptr_eq(&self, other: &Object) -> bool {
        self.same_instance(other)
            && match (&self.scope, &other.scope) {
                (Scope::External, Scope::External) => true,
                (Scope::Internal(a), Scope::Internal(b)) => a == b,
                (Scope::View(a), Scope::View(b)) => Arc::ptr_eq(a, b),
                _ => false,
            }
    }
}

fn snapshot(state: &InstanceState, record: RecordId, min_access: Access) -> FxHashMap<Arc<str>, Value> {
    state.records[record]
        .slots
        .iter()
        .filter(|(_, entry)| entry.access >= min_access)
        .filter_map(|(name, _)| match state.resolve(record, name)?.slot {
            Slot::Field(value) => Some((name.clone(), value.read().clone())),
            _ => None,
        })
        .collect()
}

fn read_property(state: &Arc<InstanceState>, name: &str, slot: &PropertySlot) -> ClassResult<Value> {
    match &slot.getter {
        Accessor::Bound { function, owner } => {
            function.call(&Object::internal(state.clone(), *owner), &[])
        }
        Accessor::Missing(accessor) => Err(ClassError::MissingAccessor {
            property: name.to_string(),
            accessor: accessor.clone(),
        }),
    }
}

fn write_property(
    state: &Arc<InstanceState>,
    name: &str,
    slot: &PropertySlot,
    value: Value,
) -> ClassResult<()> {
    if slot.property.is_readonly() {
        return Err(read_only(name));
    }
    match &slot.setter {
        Some(Accessor::Bound { function, owner }) => {
            function.call(
                &Object::internal(state.clone(), *owner),
                std::slice::from_ref(&value),
            )?;
        }
        Some(Accessor::Missing(accessor)) => {
            return Err(ClassError::MissingAccessor {
                property: name.to_string(),
                accessor: accessor.clone(),
            })
        }
        None => return Err(read_only(name)),
    }
    Ok(())
}

fn read_only(name: &str) -> ClassError {
    ClassError::ReadOnlyMember {
        member: name.to_string(),
    }
}

fn not_callable(name: &str) -> ClassError {
    ClassError::NotCallable {
        member: name.to_string(),
    }
}

fn unknown(state: &InstanceState, record: RecordId, name: &str) -> ClassError {
    ClassError::UnknownMember {
        type_name: state.class_name(record).to_string(),
        member: name.to_string(),
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(state) = &self.state else {
            return f.write_str("Object(<unbound>)");
        };
        let record = self.scope_record(state);
        match &self.scope {
            Scope::External => write!(f, "Object({})", state.ty.full_name()),
            Scope::Internal(_) => write!(
                f,
                "Object({} as internal {})",
                state.ty.full_name(),
                state.class_name(record)
            ),
            Scope::View(view) => write!(
                f,
                "Object({} as {:?} view of {})",
                state.ty.full_name(),
                view.mode,
                state.class_name(record)
            ),
        }
    }
}
