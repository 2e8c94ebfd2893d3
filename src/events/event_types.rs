//--------------------------------------------------------------------------------------------------
// STRUCTS & ENUMS
//--------------------------------------------------------------------------------------------------
// | Name                    | Description                                       | Key Methods       |
// |-------------------------|---------------------------------------------------|------------------|
// | DispatchError           | Error types for subscription and emission        | error, from       |
// | NameViolation           | Why an event name or pattern was rejected        | fmt               |
//--------------------------------------------------------------------------------------------------

use std::fmt;
use thiserror::Error;

/// Reasons a name is refused by validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameViolation {
    /// The name is empty or whitespace only
    Empty,
    /// The name contains `*`, which only subscriptions may use
    Wildcard,
}

impl fmt::Display for NameViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameViolation::Empty => write!(f, "event name must not be empty"),
            NameViolation::Wildcard => {
                write!(f, "wildcard patterns cannot be emitted, use a concrete event name")
            }
        }
    }
}

/// Errors that can occur in the dispatcher
#[derive(Error, Debug)]
pub enum DispatchError {
    /// An operation received a malformed event name or pattern
    #[error("Invalid event name {name:?}: {reason}")]
    InvalidName {
        /// The rejected name, as given
        name: String,
        /// Which rule it broke
        reason: NameViolation,
    },

    /// Nothing matched an emitted event while `throw_on_no_listeners` is on
    #[error("No listeners registered for event: {0}")]
    NoListeners(String),

    /// A subscribed handler failed
    #[error("Handler failed: {0}")]
    Handler(#[source] anyhow::Error),
}

impl DispatchError {
    pub(crate) fn invalid_name(name: &str, reason: NameViolation) -> Self {
        DispatchError::InvalidName {
            name: name.to_string(),
            reason,
        }
    }

    /// Returns the name carried by `InvalidName` and `NoListeners` errors.
    pub fn event_name(&self) -> Option<&str> {
        match self {
            DispatchError::InvalidName { name, .. } => Some(name),
            DispatchError::NoListeners(name) => Some(name),
            DispatchError::Handler(_) => None,
        }
    }
}

/// Type alias for Result with DispatchError
pub type DispatchResult<T> = Result<T, DispatchError>;
