//! Instance construction
//!
//! Construction runs in one call and either returns the external handle or
//! fails leaving nothing behind:
//!
//! 1. one record per class, bases first, slots in flattened order
//! 2. override redirection into ancestor records
//! 3. property accessors bound to slots
//! 4. constructor chain, guarded by the ledger
//! 5. completeness check, then the ledger is dropped

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::record::{
    record_named, record_of, resolve_slot, Accessor, InstanceState, PropertySlot, Record,
    RecordId, Slot, SlotEntry,
};
use super::Object;
use crate::error::{ClassError, ClassResult};
use crate::event::Event;
use crate::member::{Member, Payload, Virtuality};
use crate::types::Type;
use crate::value::{Function, Value};

/// Constructor bookkeeping, alive only during construction
pub(crate) struct Ledger {
    /// Records allowed to invoke each record's constructor
    callers: Vec<Vec<RecordId>>,
    /// Who invoked each record's constructor
    constructed_by: Vec<Option<RecordId>>,
    /// Constructors that returned successfully
    completed: Vec<bool>,
}

impl Ledger {
    /// Every direct base may be constructed by its deriving classes. A class
    /// without a constructor hands that right to its own callers.
    fn new(records: &[Record]) -> ClassResult<Self> {
        let root = records.len() - 1;
        let mut callers: Vec<Vec<RecordId>> = vec![Vec::new(); records.len()];

        for id in (0..records.len()).rev() {
            let class = &records[id].class;
            let effective = if records[id].constructor.is_some() {
                vec![id]
            } else if id == root {
                Vec::new()
            } else {
                callers[id].clone()
            };

            for base in class.base_classes() {
                let base_id = record_of(records, &base.ty).ok_or_else(|| not_an_ancestor(class, &base.ty))?;
                for caller in &effective {
                    if !callers[base_id].contains(caller) {
                        callers[base_id].push(*caller);
                    }
                }
            }
        }

        for list in &mut callers {
            list.sort_unstable();
        }

        Ok(Self {
            constructed_by: vec![None; records.len()],
            completed: vec![false; records.len()],
            callers,
        })
    }
}

fn not_an_ancestor(ty: &Type, ancestor: &Type) -> ClassError {
    ClassError::NotAnAncestor {
        type_name: ty.full_name().to_string(),
        ancestor: ancestor.full_name().to_string(),
    }
}

pub(crate) fn construct(ty: &Type, args: &[Value]) -> ClassResult<Object> {
    if ty.is_abstract() {
        return Err(ClassError::AbstractInstantiation {
            type_name: ty.full_name().to_string(),
            members: ty.abstract_members(),
        });
    }

    let mut records: Vec<Record> = ty
        .flattened_base_classes()
        .iter()
        .map(|spec| Record::new(spec.ty.clone()))
        .chain(std::iter::once(Record::new(ty.clone())))
        .collect();

    build_slots(&mut records)?;
    for id in 0..records.len() {
        redirect_overrides(&mut records, id);
    }
    bind_properties(&mut records);
    let ledger = Ledger::new(&records)?;

    let state = Arc::new(InstanceState {
        ty: ty.clone(),
        records,
        views: Mutex::default(),
        ledger: Mutex::new(Some(ledger)),
    });
    let root = state.root();

    if let Some(constructor) = &state.records[root].constructor {
        constructor.call(&Object::internal(state.clone(), root), args)?;
    }

    let ledger = state.ledger.lock().take();
    if let Some(ledger) = ledger {
        for (id, record) in state.records.iter().enumerate().take(root) {
            // a failed base constructor whose error was swallowed counts as missing
            if record.constructor.is_some() && !ledger.completed[id] {
                return Err(ClassError::UnconstructedBase {
                    type_name: ty.full_name().to_string(),
                    base: record.class.full_name().to_string(),
                });
            }
        }
    }

    tracing::debug!(
        type_name = %ty.full_name(),
        records = state.records.len(),
        "constructed instance"
    );
    Ok(Object::external(state))
}

/// Own members become slots, inherited members become links to the
/// declaring class's record
fn build_slots(records: &mut [Record]) -> ClassResult<()> {
    for id in 0..records.len() {
        let class = records[id].class.clone();
        for (name, member) in class.flattened_description() {
            let slot = if member.declaring_type_name() == class.full_name() {
                own_slot(member, id)
            } else {
                let target = record_named(records, member.declaring_type_name()).ok_or_else(|| {
                    ClassError::NotAnAncestor {
                        type_name: class.full_name().to_string(),
                        ancestor: member.declaring_type_name().to_string(),
                    }
                })?;
                Slot::Link(target)
            };
            records[id].slots.insert(
                name.clone(),
                SlotEntry {
                    access: member.access(),
                    slot,
                },
            );
        }
    }
    Ok(())
}

fn own_slot(member: &Member, id: RecordId) -> Slot {
    match member.payload() {
        Payload::Value(value) => Slot::Field(RwLock::new(value.clone())),
        Payload::Function(function) => Slot::Method {
            function: function.clone(),
            owner: id,
        },
        Payload::Property(property) => Slot::Property(PropertySlot::new(property.clone())),
        // events are per instance
        Payload::Event => Slot::Event(Event::new()),
    }
}

fn redirect_overrides(records: &mut [Record], id: RecordId) {
    let class = records[id].class.clone();
    for member in class.description().values() {
        if member.virtuality() != Virtuality::Override {
            continue;
        }
        if let Payload::Function(function) = member.payload() {
            redirect(records, member.hidden_members(), member.name(), function, id);
        }
    }
}

/// Replace the slot of every virtual ancestor member `name` hides, stopping
/// at members that introduced a new name
fn redirect(
    records: &mut [Record],
    hidden: &[Member],
    name: &str,
    function: &Function,
    owner: RecordId,
) {
    for target in hidden {
        if let Some(target_id) = record_named(records, target.declaring_type_name()) {
            if target.virtuality() != Virtuality::Normal {
                tracing::trace!(
                    member = name,
                    from = %records[owner].class.full_name(),
                    into = %records[target_id].class.full_name(),
                    "redirected override"
                );
                if let Some(entry) = records[target_id].slots.get_mut(name) {
                    entry.slot = Slot::Method {
                        function: function.clone(),
                        owner,
                    };
                }
            }
        }
        if !target.introduces_new() {
            redirect(records, target.hidden_members(), name, function, owner);
        }
    }
}

fn bind_accessor(records: &[Record], id: RecordId, name: &str) -> Accessor {
    match resolve_slot(records, id, name) {
        Some(resolved) => match resolved.slot {
            Slot::Method { function, owner } => Accessor::Bound {
                function: function.clone(),
                owner: *owner,
            },
            Slot::Field(value) => match &*value.read() {
                Value::Function(function) => Accessor::Bound {
                    function: function.clone(),
                    owner: resolved.owner,
                },
                _ => Accessor::Missing(name.to_string()),
            },
            _ => Accessor::Missing(name.to_string()),
        },
        None => Accessor::Missing(name.to_string()),
    }
}

/// Resolve the accessor names of every property once
fn bind_properties(records: &mut [Record]) {
    for id in 0..records.len() {
        let mut bindings = Vec::new();
        for (name, entry) in &records[id].slots {
            let Slot::Property(slot) = &entry.slot else {
                continue;
            };
            let property = &slot.property;
            let getter = bind_accessor(
                records,
                id,
                property.getter_name().unwrap_or_default(),
            );
            let setter = property
                .setter_name()
                .map(|setter| bind_accessor(records, id, setter));
            bindings.push((name.clone(), getter, setter));
        }

        for (name, getter, setter) in bindings {
            if let Some(SlotEntry {
                slot: Slot::Property(slot),
                ..
            }) = records[id].slots.get_mut(&name)
            {
                slot.getter = getter;
                slot.setter = setter;
            }
        }
    }
}

/// Invoke the constructor of `base` on behalf of the record `caller`
pub(crate) fn init_base(
    state: &Arc<InstanceState>,
    caller: RecordId,
    base: &Type,
    args: &[Value],
) -> ClassResult<()> {
    let base_id = state
        .record_of(base)
        .ok_or_else(|| not_an_ancestor(&state.ty, base))?;
    let chain_error = |reason: String| ClassError::ConstructorChain {
        type_name: base.full_name().to_string(),
        reason,
    };

    {
        let mut guard = state.ledger.lock();
        let ledger = guard
            .as_mut()
            .ok_or_else(|| chain_error("construction has already completed".to_string()))?;

        if !ledger.callers[base_id].contains(&caller) {
            return Err(chain_error(format!(
                "\"{}\" is not allowed to invoke this constructor",
                state.class_name(caller)
            )));
        }
        if let Some(by) = ledger.constructed_by[base_id] {
            return Err(chain_error(format!(
                "constructor already invoked by \"{}\"",
                state.class_name(by)
            )));
        }
        ledger.constructed_by[base_id] = Some(caller);
    }

    tracing::trace!(
        base = %base.full_name(),
        caller = %state.class_name(caller),
        "invoking base constructor"
    );
    if let Some(constructor) = &state.records[base_id].constructor {
        constructor.call(&Object::internal(state.clone(), base_id), args)?;
    }
    if let Some(ledger) = state.ledger.lock().as_mut() {
        ledger.completed[base_id] = true;
    }
    Ok(())
}
