//! Overload combinator
//!
//! Builds one dispatchable [`Function`] out of `(patterns, implementation)`
//! alternatives. Resolution happens per call: alternatives are scanned in
//! declaration order and the first one whose arity and positional patterns
//! accept the arguments is called with the caller's receiver.

use std::fmt;
use std::sync::Arc;

use crate::error::{ClassError, ClassResult};
use crate::types::Type;
use crate::value::{Function, Value};

/// Predicate used by [`Pattern::Custom`]
pub type PatternFn = dyn Fn(&Value) -> bool + Send + Sync;

/// Parameter pattern for one positional argument
#[derive(Clone)]
pub enum Pattern {
    /// Any number
    Number,
    /// Any boolean
    Boolean,
    /// Any string
    String,
    /// Any array
    Array,
    /// Any function
    Function,
    /// Any non-primitive, non-function value (null included)
    Object,
    /// An instance whose concrete type is assignable to this type
    Type(Type),
    /// Host-level test
    Custom(Arc<PatternFn>),
}

impl Pattern {
    /// Build a custom pattern from a predicate
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Pattern::Custom(Arc::new(predicate))
    }

    /// Check whether `value` satisfies this pattern
    ///
    /// `Undefined` never matches.
    pub fn matches(&self, value: &Value) -> bool {
        if value.is_undefined() {
            return false;
        }
        match self {
            Pattern::Number => matches!(value, Value::Number(_)),
            Pattern::Boolean => matches!(value, Value::Bool(_)),
            Pattern::String => matches!(value, Value::String(_)),
            Pattern::Array => matches!(value, Value::Array(_)),
            Pattern::Function => matches!(value, Value::Function(_)),
            Pattern::Object => matches!(
                value,
                Value::Null | Value::Array(_) | Value::Map(_) | Value::Object(_) | Value::Event(_)
            ),
            Pattern::Type(ty) => match value {
                Value::Object(object) => object
                    .type_of()
                    .map(|concrete| ty.is_assignable_from(&concrete))
                    .unwrap_or(false),
                _ => false,
            },
            Pattern::Custom(predicate) => predicate(value),
        }
    }
}

impl From<Type> for Pattern {
    fn from(ty: Type) -> Self {
        Pattern::Type(ty)
    }
}

impl From<&Type> for Pattern {
    fn from(ty: &Type) -> Self {
        Pattern::Type(ty.clone())
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Number => f.write_str("Number"),
            Pattern::Boolean => f.write_str("Boolean"),
            Pattern::String => f.write_str("String"),
            Pattern::Array => f.write_str("Array"),
            Pattern::Function => f.write_str("Function"),
            Pattern::Object => f.write_str("Object"),
            Pattern::Type(ty) => write!(f, "Type({})", ty.full_name()),
            Pattern::Custom(_) => f.write_str("Custom"),
        }
    }
}

#[derive(Clone)]
struct Alternative {
    patterns: Vec<Pattern>,
    implementation: Function,
}

impl Alternative {
    fn accepts(&self, args: &[Value]) -> bool {
        self.patterns.len() == args.len()
            && self
                .patterns
                .iter()
                .zip(args)
                .all(|(pattern, arg)| pattern.matches(arg))
    }
}

/// Fluent builder for an overloaded function
#[derive(Clone, Default)]
pub struct OverloadSet {
    alternatives: Vec<Alternative>,
}

impl OverloadSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an alternative; earlier alternatives take priority
    pub fn case(mut self, patterns: impl IntoIterator<Item = Pattern>, implementation: Function) -> Self {
        self.alternatives.push(Alternative {
            patterns: patterns.into_iter().collect(),
            implementation,
        });
        self
    }

    /// Build from an alternating `patterns, implementation, ...` list
    pub fn from_alternating(items: Vec<OverloadItem>) -> ClassResult<Self> {
        let len = items.len();
        if len % 2 != 0 {
            return Err(ClassError::MalformedOverloadList { len });
        }

        let mut set = OverloadSet::new();
        let mut items = items.into_iter();
        while let (Some(patterns), Some(implementation)) = (items.next(), items.next()) {
            match (patterns, implementation) {
                (OverloadItem::Patterns(patterns), OverloadItem::Implementation(f)) => {
                    set = set.case(patterns, f);
                }
                _ => return Err(ClassError::MalformedOverloadList { len }),
            }
        }
        Ok(set)
    }

    /// Number of alternatives
    pub fn len(&self) -> usize {
        self.alternatives.len()
    }

    /// Check if no alternative was added
    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }

    /// Produce the dispatching function
    pub fn build(self) -> Function {
        let alternatives = self.alternatives;
        Function::new(move |this, args| {
            match alternatives.iter().find(|alt| alt.accepts(args)) {
                Some(alt) => alt.implementation.call(this, args),
                None => Err(ClassError::NoMatchingOverload {
                    arguments: args
                        .iter()
                        .map(|arg| arg.kind().name())
                        .collect::<Vec<_>>()
                        .join(", "),
                }),
            }
        })
    }
}

/// One element of an alternating overload list
#[derive(Clone)]
pub enum OverloadItem {
    /// Parameter patterns of the next alternative
    Patterns(Vec<Pattern>),
    /// Implementation of the preceding patterns
    Implementation(Function),
}

impl From<Vec<Pattern>> for OverloadItem {
    fn from(patterns: Vec<Pattern>) -> Self {
        OverloadItem::Patterns(patterns)
    }
}

impl From<Function> for OverloadItem {
    fn from(f: Function) -> Self {
        OverloadItem::Implementation(f)
    }
}
