//! Computed properties
//!
//! A property wires a member name to a getter (and optionally a setter and a
//! change event) declared elsewhere on the type. Names left unspecified are
//! derived from the member name through [`NamingConventions`].

use crate::error::{ClassError, ClassResult};

/// Naming conventions for property accessors and change events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingConventions {
    /// Prefix of the default getter name
    pub getter_prefix: String,
    /// Prefix of the default setter name
    pub setter_prefix: String,
    /// Suffix of the default change event name
    pub event_suffix: String,
}

impl Default for NamingConventions {
    fn default() -> Self {
        Self {
            getter_prefix: "Get".to_string(),
            setter_prefix: "Set".to_string(),
            event_suffix: "Changed".to_string(),
        }
    }
}

impl NamingConventions {
    /// Default getter name for a property
    pub fn getter_name(&self, property: &str) -> String {
        format!("{}{}", self.getter_prefix, property)
    }

    /// Default setter name for a property
    pub fn setter_name(&self, property: &str) -> String {
        format!("{}{}", self.setter_prefix, property)
    }

    /// Default change event name for a property
    pub fn event_name(&self, property: &str) -> String {
        format!("{}{}", property, self.event_suffix)
    }
}

/// Property declaration as authored; unset fields take their defaults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyConfig {
    /// Explicit readonly flag
    pub readonly: Option<bool>,
    /// Explicit change event flag
    pub has_event: Option<bool>,
    /// Explicit getter name
    pub getter_name: Option<String>,
    /// Explicit setter name
    pub setter_name: Option<String>,
    /// Explicit change event name
    pub event_name: Option<String>,
}

impl PropertyConfig {
    /// Empty configuration: read/write, no event, conventional names
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the readonly flag
    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = Some(readonly);
        self
    }

    /// Set the change event flag
    pub fn has_event(mut self, has_event: bool) -> Self {
        self.has_event = Some(has_event);
        self
    }

    /// Override the getter name
    pub fn getter(mut self, name: impl Into<String>) -> Self {
        self.getter_name = Some(name.into());
        self
    }

    /// Override the setter name
    pub fn setter(mut self, name: impl Into<String>) -> Self {
        self.setter_name = Some(name.into());
        self
    }

    /// Override the change event name
    pub fn event(mut self, name: impl Into<String>) -> Self {
        self.event_name = Some(name.into());
        self
    }

    /// Check the configuration and compute its flags
    ///
    /// - a setter name requires a getter name
    /// - readonly defaults to "getter named, setter not named"
    /// - a readonly property cannot name a setter
    /// - has_event defaults to "event named"
    /// - a property without event cannot name one
    pub fn validate(&self) -> ClassResult<Property> {
        if self.setter_name.is_some() && self.getter_name.is_none() {
            return Err(ClassError::InvalidPropertyConfig {
                reason: "a property that names its setter must also name its getter".to_string(),
            });
        }

        let readonly = self
            .readonly
            .unwrap_or(self.getter_name.is_some() && self.setter_name.is_none());
        if readonly && self.setter_name.is_some() {
            return Err(ClassError::InvalidPropertyConfig {
                reason: "a readonly property cannot have a setter".to_string(),
            });
        }

        let has_event = self.has_event.unwrap_or(self.event_name.is_some());
        if !has_event && self.event_name.is_some() {
            return Err(ClassError::InvalidPropertyConfig {
                reason: "a property without change event cannot name an event".to_string(),
            });
        }

        Ok(Property {
            readonly,
            has_event,
            getter_name: self.getter_name.clone(),
            setter_name: self.setter_name.clone(),
            event_name: self.event_name.clone(),
        })
    }
}

/// Validated property payload
///
/// Name fields hold explicit overrides until [`Property::resolve`] fills in
/// the conventional defaults at type-definition time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    readonly: bool,
    has_event: bool,
    getter_name: Option<String>,
    setter_name: Option<String>,
    event_name: Option<String>,
}

impl Property {
    /// Fill in default names for the property called `name`
    pub fn resolve(&self, name: &str, conventions: &NamingConventions) -> Property {
        Property {
            readonly: self.readonly,
            has_event: self.has_event,
            getter_name: Some(
                self.getter_name
                    .clone()
                    .unwrap_or_else(|| conventions.getter_name(name)),
            ),
            setter_name: if self.readonly {
                None
            } else {
                Some(
                    self.setter_name
                        .clone()
                        .unwrap_or_else(|| conventions.setter_name(name)),
                )
            },
            event_name: if self.has_event {
                Some(
                    self.event_name
                        .clone()
                        .unwrap_or_else(|| conventions.event_name(name)),
                )
            } else {
                None
            },
        }
    }

    /// Whether writes are rejected
    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Whether the property declares a change event
    pub fn has_event(&self) -> bool {
        self.has_event
    }

    /// Getter name (always present once resolved)
    pub fn getter_name(&self) -> Option<&str> {
        self.getter_name.as_deref()
    }

    /// Setter name (absent when readonly)
    pub fn setter_name(&self) -> Option<&str> {
        self.setter_name.as_deref()
    }

    /// Change event name (present iff `has_event`)
    pub fn event_name(&self) -> Option<&str> {
        self.event_name.as_deref()
    }
}
