//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module implements an in-process publish/subscribe dispatcher. Handlers subscribe to exact
// event names, to every event, or to `*` glob patterns, and are invoked either fire-and-forget
// (`emit`) or with a completion signal that waits for all of them (`emit_async`).
//
// | Component                | Description                                                |
// |--------------------------|-----------------------------------------------------------|
// | Dispatcher               | Owns the registries and runs both emission paths          |
// | Subscription             | Handle that removes one registration                      |
// | Handler                  | Callable identity, payload-only or name + payload         |
// | Pattern                  | Compiled wildcard matcher for pattern subscriptions       |
// | DispatchError            | Validation, no-listener and handler failures              |
//--------------------------------------------------------------------------------------------------

mod dispatcher;
mod event_types;
mod handlers;
mod names;
mod pattern;
mod registry;


// Re-exports
pub use dispatcher::{Dispatcher, EmitFuture, Subscription};
pub use event_types::{DispatchError, DispatchResult, NameViolation};
pub use handlers::{Handler, HandlerFuture, Invocation};
pub use names::{NameProfile, RouteKey, UNIVERSAL};
pub use pattern::Pattern;
