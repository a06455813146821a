//! Ancestor state records
//!
//! An instance is an arena of records, one per class in the flattened
//! lattice plus one for the concrete type (always last). A record maps every
//! name visible inside its class to a slot. Inherited names are `Link`s to
//! the record of the declaring class, so state is stored exactly once.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxBuildHasher, FxHashMap};

use super::construct::Ledger;
use super::ViewState;
use crate::event::Event;
use crate::member::Access;
use crate::property::Property;
use crate::types::Type;
use crate::value::{Function, Value};

/// Index of a record inside its instance
pub(crate) type RecordId = usize;

/// Cache key of a scoped view
pub(crate) type ViewKey = (RecordId, super::ViewMode, Access);

pub(crate) enum Slot {
    Field(RwLock<Value>),
    /// `owner` is the record whose internal reference the body receives
    Method {
        function: Function,
        owner: RecordId,
    },
    Property(PropertySlot),
    Event(Event),
    Link(RecordId),
}

pub(crate) struct SlotEntry {
    pub(crate) access: Access,
    pub(crate) slot: Slot,
}

pub(crate) enum Accessor {
    Bound { function: Function, owner: RecordId },
    Missing(String),
}

pub(crate) struct PropertySlot {
    pub(crate) property: Property,
    pub(crate) getter: Accessor,
    pub(crate) setter: Option<Accessor>,
}

impl PropertySlot {
    /// Unbound until the binding pass runs
    pub(crate) fn new(property: Property) -> Self {
        let getter = Accessor::Missing(property.getter_name().unwrap_or_default().to_string());
        Self {
            property,
            getter,
            setter: None,
        }
    }
}

pub(crate) struct Record {
    pub(crate) class: Type,
    pub(crate) slots: IndexMap<Arc<str>, SlotEntry, FxBuildHasher>,
    pub(crate) constructor: Option<Function>,
}

impl Record {
    pub(crate) fn new(class: Type) -> Self {
        let constructor = class.constructor().cloned();
        Self {
            class,
            slots: IndexMap::default(),
            constructor,
        }
    }
}

/// A name resolved through links
pub(crate) struct Resolved<'a> {
    /// Access of the entry in the record the lookup started from
    pub(crate) access: Access,
    /// Record that stores the slot
    pub(crate) owner: RecordId,
    pub(crate) slot: &'a Slot,
}

/// Look `name` up in `record`, following inherited links
pub(crate) fn resolve_slot<'a>(
    records: &'a [Record],
    record: RecordId,
    name: &str,
) -> Option<Resolved<'a>> {
    let entry = records.get(record)?.slots.get(name)?;
    let mut owner = record;
    let mut slot = &entry.slot;
    while let Slot::Link(target) = slot {
        owner = *target;
        slot = &records.get(owner)?.slots.get(name)?.slot;
    }
    Some(Resolved {
        access: entry.access,
        owner,
        slot,
    })
}

/// Position of `class` in the arena
pub(crate) fn record_of(records: &[Record], class: &Type) -> Option<RecordId> {
    records.iter().position(|r| r.class == *class)
}

/// Position of the class called `name` in the arena
pub(crate) fn record_named(records: &[Record], name: &str) -> Option<RecordId> {
    records.iter().position(|r| r.class.full_name() == name)
}

pub(crate) struct InstanceState {
    pub(crate) ty: Type,
    pub(crate) records: Vec<Record>,
    pub(crate) views: Mutex<FxHashMap<ViewKey, Arc<ViewState>>>,
    /// Present only while the constructor chain runs
    pub(crate) ledger: Mutex<Option<Ledger>>,
}

impl InstanceState {
    pub(crate) fn root(&self) -> RecordId {
        self.records.len() - 1
    }

    pub(crate) fn resolve(&self, record: RecordId, name: &str) -> Option<Resolved<'_>> {
        resolve_slot(&self.records, record, name)
    }

    pub(crate) fn record_of(&self, class: &Type) -> Option<RecordId> {
        record_of(&self.records, class)
    }

    pub(crate) fn class_name(&self, record: RecordId) -> &str {
        self.records
            .get(record)
            .map(|r| r.class.full_name())
            .unwrap_or_default()
    }
}
