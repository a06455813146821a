//! Host value model
//!
//! The runtime builds class semantics on top of a small dynamic value model.
//! Primitive values are stored inline, everything else is shared behind an
//! `Arc` so values are cheap to clone and safe to hand across threads.
//!
//! Reference values (`Array`, `Map`, `Function`, `Object`, `Event`) compare
//! by identity, primitives compare by value.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::error::ClassResult;
use crate::event::Event;
use crate::object::Object;

/// Ordered string-keyed map used for plain objects
pub type ValueMap = IndexMap<String, Value, FxBuildHasher>;

/// Dynamic host value
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value; never matches an overload pattern
    #[default]
    Undefined,
    /// Explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// Number (IEEE 754 double)
    Number(f64),
    /// Immutable string
    String(Arc<str>),
    /// Immutable array
    Array(Arc<Vec<Value>>),
    /// Immutable plain object
    Map(Arc<ValueMap>),
    /// Callable
    Function(Function),
    /// Instance handle, internal reference or scoped view
    Object(Object),
    /// Event object
    Event(Event),
}

/// Runtime kind of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `Value::Undefined`
    Undefined,
    /// `Value::Null`
    Null,
    /// `Value::Bool`
    Boolean,
    /// `Value::Number`
    Number,
    /// `Value::String`
    String,
    /// `Value::Array`
    Array,
    /// `Value::Map`
    Map,
    /// `Value::Function`
    Function,
    /// `Value::Object`
    Object,
    /// `Value::Event`
    Event,
}

impl ValueKind {
    /// Lower-case name used in diagnostics
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Undefined => "undefined",
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Map => "map",
            ValueKind::Function => "function",
            ValueKind::Object => "object",
            ValueKind::Event => "event",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    /// Build a string value
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Arc::from(s.as_ref()))
    }

    /// Build an array value
    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(Arc::new(items.into_iter().collect()))
    }

    /// Build a plain-object value
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Map(Arc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Runtime kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Undefined => ValueKind::Undefined,
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Map(_) => ValueKind::Map,
            Value::Function(_) => ValueKind::Function,
            Value::Object(_) => ValueKind::Object,
            Value::Event(_) => ValueKind::Event,
        }
    }

    /// Check if value is undefined
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Extract a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Extract a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extract array items
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Extract a plain object
    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Extract a function
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Extract an object reference
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Extract an event
    pub fn as_event(&self) -> Option<&Event> {
        match self {
            Value::Event(e) => Some(e),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Event(a), Value::Event(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Array(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Map(map) => f.debug_map().entries(map.iter()).finish(),
            Value::Function(func) => func.fmt(f),
            Value::Object(obj) => obj.fmt(f),
            Value::Event(event) => event.fmt(f),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Arc::new(items))
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl From<Event> for Value {
    fn from(e: Event) -> Self {
        Value::Event(e)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Undefined
    }
}

/// Native callable signature: receiver (`this`) and positional arguments
pub type NativeFn = dyn Fn(&Object, &[Value]) -> ClassResult<Value> + Send + Sync;

/// Shared callable value
///
/// Member bodies receive the internal reference of their declaring class as
/// `this`; free functions (event handlers, callbacks) receive an unbound
/// receiver that has no members.
#[derive(Clone)]
pub struct Function {
    inner: Arc<NativeFn>,
}

impl Function {
    /// Wrap a native closure
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Object, &[Value]) -> ClassResult<Value> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Wrap a closure that ignores its receiver
    pub fn free<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> ClassResult<Value> + Send + Sync + 'static,
    {
        Self::new(move |_, args| f(args))
    }

    /// Call with an explicit receiver
    pub fn call(&self, this: &Object, args: &[Value]) -> ClassResult<Value> {
        (self.inner)(this, args)
    }

    /// Call without a receiver
    pub fn invoke(&self, args: &[Value]) -> ClassResult<Value> {
        self.call(Object::unbound(), args)
    }

    /// Fix the receiver; the returned function ignores the receiver it is called with
    pub fn bind(&self, this: Object) -> Function {
        let f = self.clone();
        Function::new(move |_, args| f.call(&this, args))
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({:p})", Arc::as_ptr(&self.inner) as *const ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kinds() {
        assert_eq!(Value::Undefined.kind(), ValueKind::Undefined);
        assert_eq!(Value::from(3).kind(), ValueKind::Number);
        assert_eq!(Value::from("x").kind(), ValueKind::String);
        assert_eq!(Value::from(true).kind(), ValueKind::Boolean);
        assert_eq!(Value::array(vec![Value::Null]).kind(), ValueKind::Array);
        assert_eq!(Value::map([("a", Value::Null)]).kind(), ValueKind::Map);
    }

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::from(1.5), Value::from(1.5));
        assert_eq!(Value::from("a"), Value::from("a"));
        assert_ne!(Value::from("a"), Value::from(1));

        // arrays compare by identity
        let a = Value::array(vec![Value::from(1)]);
        let b = Value::array(vec![Value::from(1)]);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_function_invoke() {
        let add = Function::free(|args| {
            let a = args[0].as_number().unwrap_or(0.0);
            let b = args[1].as_number().unwrap_or(0.0);
            Ok(Value::from(a + b))
        });

        let result = add.invoke(&[Value::from(2), Value::from(3)]).unwrap();
        assert_eq!(result, Value::from(5));
        assert!(add.ptr_eq(&add.clone()));
    }

    #[test]
    fn test_function_free_ignores_receiver() {
        let f = Function::free(|_| Ok(Value::from("ok")));
        assert_eq!(f.call(Object::unbound(), &[]).unwrap(), Value::from("ok"));
    }
}
