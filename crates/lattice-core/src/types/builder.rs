//! Type definition
//!
//! [`TypeBuilder`] runs the definition algorithm once and freezes the result:
//!
//! 1. property names are resolved and missing change events synthesized
//! 2. reserved names and the constructor shape are checked
//! 3. the ancestor lattice is flattened, sharing virtual bases
//! 4. inherited members are collected and checked for ambiguity
//! 5. every own member that hides something is checked for legality
//!
//! Nothing is returned on failure.

use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use super::{BaseClassSpec, Description, MemberTable, Type, TypeInner};
use crate::error::{ClassError, ClassResult, HiddenKind};
use crate::member::{
    Access, Member, MemberDescriptor, Payload, Public, Virtuality, CONSTRUCTOR_NAME,
    RESERVED_PREFIX,
};
use crate::property::NamingConventions;
use crate::value::Function;

type Candidates = IndexMap<Arc<str>, Vec<Member>, FxBuildHasher>;

/// Fluent type definition
///
/// ```ignore
/// let point = TypeBuilder::new("geometry::Point")
///     .member("X", Public::member(0))
///     .member("Y", Public::member(0))
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct TypeBuilder {
    full_name: String,
    bases: Vec<BaseClassSpec>,
    description: Description,
    conventions: NamingConventions,
}

impl TypeBuilder {
    /// Start defining a type
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            bases: Vec::new(),
            description: Description::new(),
            conventions: NamingConventions::default(),
        }
    }

    /// Add a non-virtual direct base
    pub fn base(mut self, ty: &Type) -> Self {
        self.bases.push(ty.into());
        self
    }

    /// Add a virtual direct base
    pub fn virtual_base(mut self, ty: &Type) -> Self {
        self.bases.push(super::virtual_base(ty));
        self
    }

    /// Add a direct base spec
    pub fn base_spec(mut self, spec: BaseClassSpec) -> Self {
        self.bases.push(spec);
        self
    }

    /// Declare a member
    pub fn member(mut self, name: impl Into<String>, descriptor: MemberDescriptor) -> Self {
        self.description = self.description.member(name, descriptor);
        self
    }

    /// Declare the constructor
    pub fn constructor(mut self, f: Function) -> Self {
        self.description = self.description.constructor(f);
        self
    }

    /// Replace the member description
    pub fn description(mut self, description: Description) -> Self {
        self.description = description;
        self
    }

    /// Naming conventions for property defaults
    pub fn conventions(mut self, conventions: NamingConventions) -> Self {
        self.conventions = conventions;
        self
    }

    /// Run the definition algorithm
    pub fn build(self) -> ClassResult<Type> {
        let TypeBuilder {
            full_name,
            bases,
            description,
            conventions,
        } = self;

        let mut own = description.into_members();
        let inherited = collect_inherited(&bases);

        resolve_properties(&full_name, &mut own, &inherited, &conventions)?;
        check_names(&full_name, &own)?;
        let flattened_bases = flatten_bases(&full_name, &bases)?;
        check_hiding(&full_name, &own, &inherited)?;
        let winners = inherited_winners(&full_name, &own, &inherited)?;

        let name: Arc<str> = Arc::from(full_name.as_str());
        let inner = Arc::new_cyclic(|weak: &Weak<TypeInner>| {
            let mut own_table = MemberTable::default();
            for (member_name, descriptor) in own {
                let key: Arc<str> = Arc::from(member_name.as_str());
                let hidden = inherited.get(&key).cloned().unwrap_or_default();
                let member = Member::new(key.clone(), descriptor, weak.clone(), name.clone(), hidden);
                own_table.insert(key, member);
            }

            let mut flattened = winners;
            for (key, member) in &own_table {
                if &**key != CONSTRUCTOR_NAME {
                    flattened.insert(key.clone(), member.clone());
                }
            }

            let is_abstract = flattened
                .values()
                .any(|m| m.virtuality() == Virtuality::Abstract);

            TypeInner {
                full_name: name.clone(),
                description: own_table,
                flattened_description: flattened,
                base_classes: bases,
                flattened_base_classes: flattened_bases,
                is_abstract,
            }
        });

        let ty = Type::from_inner(inner);
        tracing::debug!(
            type_name = %ty.full_name(),
            bases = ty.flattened_base_classes().len(),
            members = ty.flattened_description().len(),
            is_abstract = ty.is_abstract(),
            "defined type"
        );
        Ok(ty)
    }
}

/// Define a type from its direct bases and member description
pub fn class(
    full_name: &str,
    bases: impl IntoIterator<Item = BaseClassSpec>,
    description: Description,
) -> ClassResult<Type> {
    let mut builder = TypeBuilder::new(full_name).description(description);
    for spec in bases {
        builder = builder.base_spec(spec);
    }
    builder.build()
}

type OwnMembers = IndexMap<String, MemberDescriptor, FxBuildHasher>;

fn resolve_properties(
    type_name: &str,
    own: &mut OwnMembers,
    inherited: &Candidates,
    conventions: &NamingConventions,
) -> ClassResult<()> {
    let mut events = Vec::new();
    for (name, descriptor) in own.iter_mut() {
        let resolved = match descriptor.payload() {
            Payload::Property(property) => property.resolve(name, conventions),
            _ => continue,
        };
        if let Some(event) = resolved.event_name() {
            events.push((name.clone(), event.to_string()));
        }
        descriptor.set_payload(Payload::Property(resolved));
    }

    for (property, event) in events {
        let declared = match own.get(&event) {
            Some(descriptor) => Some(descriptor.payload().is_event()),
            None => inherited
                .get(event.as_str())
                .map(|members| members.iter().all(Member::is_event)),
        };
        match declared {
            Some(true) => {}
            Some(false) => {
                return Err(ClassError::InvalidPropertyConfig {
                    reason: format!(
                        "change event \"{}\" of property \"{}\" in \"{}\" is not an event",
                        event, property, type_name
                    ),
                })
            }
            None => {
                tracing::trace!(type_name, property = %property, event = %event, "synthesized change event");
                own.insert(event, Public::event());
            }
        }
    }
    Ok(())
}

fn check_names(type_name: &str, own: &OwnMembers) -> ClassResult<()> {
    for (name, descriptor) in own {
        if name == CONSTRUCTOR_NAME {
            if !descriptor.payload().is_function()
                || descriptor.virtuality() != Virtuality::Normal
                || descriptor.introduces_new()
            {
                return Err(ClassError::InvalidDeclaration {
                    reason: format!(
                        "the constructor of \"{}\" must be a normal function",
                        type_name
                    ),
                });
            }
        } else if name.starts_with(RESERVED_PREFIX) {
            return Err(ClassError::ReservedName {
                type_name: type_name.to_string(),
                member: name.clone(),
            });
        }
    }
    Ok(())
}

fn flatten_bases(type_name: &str, bases: &[BaseClassSpec]) -> ClassResult<Vec<BaseClassSpec>> {
    let mut flattened = Vec::new();
    for base in bases {
        for ancestor in base.ty.flattened_base_classes() {
            // everything reached through a shared base is shared with it
            let entry = BaseClassSpec {
                ty: ancestor.ty.clone(),
                is_virtual: ancestor.is_virtual || base.is_virtual,
            };
            add_flattened_base(type_name, &mut flattened, entry)?;
        }
        add_flattened_base(type_name, &mut flattened, base.clone())?;
    }
    Ok(flattened)
}

fn add_flattened_base(
    type_name: &str,
    flattened: &mut Vec<BaseClassSpec>,
    entry: BaseClassSpec,
) -> ClassResult<()> {
    if entry.ty.full_name() == type_name {
        return Err(ClassError::AmbiguousName {
            type_name: type_name.to_string(),
            name: type_name.to_string(),
        });
    }

    match flattened
        .iter()
        .find(|existing| existing.ty.full_name() == entry.ty.full_name())
    {
        Some(existing) if existing.ty != entry.ty => Err(ClassError::AmbiguousName {
            type_name: type_name.to_string(),
            name: entry.ty.full_name().to_string(),
        }),
        Some(existing) if existing.is_virtual && entry.is_virtual => Ok(()),
        Some(_) => Err(ClassError::DuplicateNonVirtualBase {
            type_name: type_name.to_string(),
            base: entry.ty.full_name().to_string(),
        }),
        None => {
            flattened.push(entry);
            Ok(())
        }
    }
}

/// Visible members of every direct base, grouped by name, each member once
fn collect_inherited(bases: &[BaseClassSpec]) -> Candidates {
    let mut candidates = Candidates::default();
    for base in bases {
        for (name, member) in base.ty.flattened_description() {
            if member.access() == Access::Private {
                continue;
            }
            let entry = candidates.entry(name.clone()).or_default();
            if !entry.iter().any(|m| m.ptr_eq(member)) {
                entry.push(member.clone());
            }
        }
    }
    candidates
}

fn check_hiding(type_name: &str, own: &OwnMembers, inherited: &Candidates) -> ClassResult<()> {
    for (name, descriptor) in own {
        if name == CONSTRUCTOR_NAME {
            continue;
        }
        let hidden = inherited.get(name.as_str()).map(Vec::as_slice).unwrap_or(&[]);
        let error_name = || (type_name.to_string(), name.clone());

        if hidden.is_empty() {
            if descriptor.virtuality() == Virtuality::Override {
                let (type_name, member) = error_name();
                return Err(ClassError::NoOverrideTarget { type_name, member });
            }
            if descriptor.introduces_new() {
                let (type_name, member) = error_name();
                return Err(ClassError::NothingToHide { type_name, member });
            }
            continue;
        }

        if hidden.iter().any(Member::is_event) {
            let (type_name, member) = error_name();
            return Err(ClassError::HiddenEvent { type_name, member });
        }

        let hides_virtual = hidden
            .iter()
            .any(|m| m.virtuality() != Virtuality::Normal);
        if descriptor.virtuality() == Virtuality::Override {
            if !hides_virtual {
                let (type_name, member) = error_name();
                return Err(ClassError::OverrideTargetNotVirtual { type_name, member });
            }
        } else if !descriptor.introduces_new() {
            let (type_name, member) = error_name();
            return Err(ClassError::HiddenMemberRequiresNewOrOverride {
                type_name,
                member,
                kind: if hides_virtual {
                    HiddenKind::Virtual
                } else {
                    HiddenKind::Normal
                },
            });
        }
    }
    Ok(())
}

fn hides(member: &Member, target: &Member) -> bool {
    member
        .hidden_members()
        .iter()
        .any(|h| h.ptr_eq(target) || hides(h, target))
}

/// Pick the inherited member for every name the type does not redeclare
///
/// A candidate that another candidate hides or overrides is dropped, so a
/// diamond whose shared base member was overridden along one path resolves
/// to the override.
fn inherited_winners(
    type_name: &str,
    own: &OwnMembers,
    inherited: &Candidates,
) -> ClassResult<MemberTable> {
    let mut winners = MemberTable::default();
    for (name, candidates) in inherited {
        if own.contains_key(&**name) {
            continue;
        }
        let mut dominant = candidates
            .iter()
            .filter(|c| !candidates.iter().any(|d| !d.ptr_eq(c) && hides(d, c)));
        match (dominant.next(), dominant.next()) {
            (Some(member), None) => {
                winners.insert(name.clone(), member.clone());
            }
            (Some(_), Some(_)) => {
                return Err(ClassError::AmbiguousMember {
                    type_name: type_name.to_string(),
                    member: name.to_string(),
                })
            }
            (None, _) => {}
        }
    }
    Ok(winners)
}
