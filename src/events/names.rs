//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Name validation and routing of subscription keys to a registry.
//
// | Name             | Description                                          | Key Methods       |
// |------------------|------------------------------------------------------|-------------------|
// | NameProfile      | Permissive (subscriptions) or Strict (emission)     | validate          |
// | RouteKey         | Which registry a validated key belongs to           | classify          |
//--------------------------------------------------------------------------------------------------

use super::event_types::{DispatchError, DispatchResult, NameViolation};

/// The universal wildcard key.
pub const UNIVERSAL: &str = "*";

const WILDCARD: char = '*';

/// Validation profile, picked by the calling operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameProfile {
    /// subscribe, unsubscribe, subscribe_once and clear: only empty names fail
    Permissive,
    /// emit and emit_async: empty names and any `*` fail
    Strict,
}

impl NameProfile {
    /// Checks `name` against this profile.
    pub fn validate(self, name: &str) -> DispatchResult<()> {
        if name.trim().is_empty() {
            return Err(DispatchError::invalid_name(name, NameViolation::Empty));
        }
        if self == NameProfile::Strict && name.contains(WILDCARD) {
            return Err(DispatchError::invalid_name(name, NameViolation::Wildcard));
        }
        Ok(())
    }
}

/// Registry a subscription key is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKey<'a> {
    /// A concrete event name
    Exact(&'a str),
    /// The bare `*`
    Universal,
    /// Any other key containing `*`
    Pattern(&'a str),
}

impl<'a> RouteKey<'a> {
    /// Validates `key` permissively and routes it.
    pub fn classify(key: &'a str) -> DispatchResult<Self> {
        NameProfile::Permissive.validate(key)?;
        Ok(if key == UNIVERSAL {
            RouteKey::Universal
        } else if key.contains(WILDCARD) {
            RouteKey::Pattern(key)
        } else {
            RouteKey::Exact(key)
        })
    }

    pub fn is_wildcard(&self) -> bool {
        !matches!(self, RouteKey::Exact(_))
    }
}
