// Expose the modules
pub mod config;
pub mod events;

// Re-export key types for easier usage
pub use config::{ConfigError, DispatcherConfig};
pub use events::{
    DispatchError, DispatchResult, Dispatcher, EmitFuture, Handler, HandlerFuture, Invocation,
    NameViolation, Pattern, Subscription,
};
