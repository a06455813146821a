//! Event objects
//!
//! An event owns an ordered list of attached handlers. `execute` iterates a
//! snapshot of that list, so handlers may attach or detach (themselves or
//! others) while a dispatch is in progress without disturbing it.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{ClassError, ClassResult};
use crate::value::{Function, Value};

struct HandlerEntry {
    function: Function,
}

/// Opaque handle returned by [`Event::attach`]
#[derive(Clone)]
pub struct EventHandler {
    entry: Arc<HandlerEntry>,
}

impl EventHandler {
    /// The attached function
    pub fn function(&self) -> &Function {
        &self.entry.function
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entry, &other.entry)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Arc::as_ptr(&self.entry))
    }
}

#[derive(Default)]
struct EventInner {
    handlers: Mutex<Vec<Arc<HandlerEntry>>>,
}

/// Event with attach/detach/execute operations
#[derive(Clone, Default)]
pub struct Event {
    inner: Arc<EventInner>,
}

impl Event {
    /// Create an event with no handlers
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a handler; handlers run in attachment order
    pub fn attach(&self, function: Function) -> EventHandler {
        let entry = Arc::new(HandlerEntry { function });
        self.inner.handlers.lock().push(entry.clone());
        EventHandler { entry }
    }

    /// Detach a handler previously returned by [`Event::attach`] on this event
    pub fn detach(&self, handler: &EventHandler) -> ClassResult<()> {
        let mut handlers = self.inner.handlers.lock();
        let index = handlers
            .iter()
            .position(|h| Arc::ptr_eq(h, &handler.entry))
            .ok_or(ClassError::ForeignEventHandle)?;
        handlers.remove(index);
        Ok(())
    }

    /// Invoke every attached handler with `args`
    ///
    /// The first handler error stops the dispatch and is returned.
    pub fn execute(&self, args: &[Value]) -> ClassResult<()> {
        let snapshot: Vec<Arc<HandlerEntry>> = self.inner.handlers.lock().clone();
        for entry in snapshot {
            entry.function.invoke(args)?;
        }
        Ok(())
    }

    /// Number of attached handlers
    pub fn handler_count(&self) -> usize {
        self.inner.handlers.lock().len()
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Event) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("handlers", &self.handler_count())
            .finish()
    }
}
