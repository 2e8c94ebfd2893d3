//--------------------------------------------------------------------------------------------------
// STRUCTS
//--------------------------------------------------------------------------------------------------
// | Name                    | Description                                       | Key Methods       |
// |-------------------------|---------------------------------------------------|------------------|
// | Dispatcher              | Routes emitted events to subscribed handlers     | subscribe, emit   |
// |                         |                                                   | emit_async, clear |
// | Subscription            | Removes one registration when asked              | unsubscribe       |
//--------------------------------------------------------------------------------------------------

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use futures::future::{self, BoxFuture};
use parking_lot::RwLock;
use tokio::runtime::{Handle, Runtime};
use tracing::{debug, error, trace, warn};

use super::event_types::{DispatchError, DispatchResult};
use super::handlers::{Handler, HandlerFuture, Invocation};
use super::names::{NameProfile, RouteKey};
use super::registry::{Registries, Slot};
use crate::config::DispatcherConfig;

/// Completion signal returned by [`Dispatcher::emit_async`]
pub type EmitFuture = BoxFuture<'static, DispatchResult<()>>;

/// Publish/subscribe dispatcher keyed by event name.
///
/// Handlers subscribe to a concrete name (`user.created`), to every event
/// (`*`), or to a pattern (`user.*`, `*.created`, `*error*`). Emitting a
/// name runs exact handlers first, then universal handlers, then pattern
/// handlers in the order their patterns were first subscribed.
///
/// The dispatcher is a cheap handle: clones share the same registries, so a
/// handler may capture a clone and emit or (un)subscribe from inside its own
/// invocation. No lock is held while handlers run; each emission works from
/// a snapshot of the handlers that matched when it started.
///
/// # Examples
///
/// ```
/// use event_dispatch::{Dispatcher, Handler};
///
/// let dispatcher = Dispatcher::<String>::new();
/// let greet = Handler::new(|name: &String| {
///     println!("hello {}", name);
///     Ok(())
/// });
///
/// let subscription = dispatcher.subscribe("user.created", &greet).unwrap();
/// dispatcher.emit("user.created", "ada".to_string()).unwrap();
/// subscription.unsubscribe();
/// ```
pub struct Dispatcher<P> {
    registries: Arc<RwLock<Registries<P>>>,
    config: DispatcherConfig,
}

impl<P> Clone for Dispatcher<P> {
    fn clone(&self) -> Self {
        Self {
            registries: Arc::clone(&self.registries),
            config: self.config,
        }
    }
}

impl<P> fmt::Debug for Dispatcher<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<P> Default for Dispatcher<P>
where
    P: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Dispatcher<P>
where
    P: Clone + Send + Sync + 'static,
{
    /// Creates a dispatcher with default options.
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::default())
    }

    /// Creates a dispatcher with the given options.
    pub fn with_config(config: DispatcherConfig) -> Self {
        debug!("Created dispatcher with {:?}", config);
        Self {
            registries: Arc::new(RwLock::new(Registries::default())),
            config,
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Subscribes `handler` to an event name, to `*`, or to a pattern.
    ///
    /// Subscribing a handler that is already registered under the same key
    /// changes nothing.
    ///
    /// # Errors
    /// `InvalidName` if `key` is empty or whitespace only.
    pub fn subscribe(&self, key: &str, handler: &Handler<P>) -> DispatchResult<Subscription<P>> {
        let route = RouteKey::classify(key)?;
        self.register(route, handler.clone())
    }

    /// Subscribes `handler` for one invocation only.
    ///
    /// The registration is removed before `handler` runs, so an emission
    /// triggered from inside `handler` does not reach it again. The returned
    /// [`Subscription`] is the only way to cancel it early; calling
    /// [`Dispatcher::unsubscribe`] with `handler` itself does not touch it.
    pub fn subscribe_once(&self, key: &str, handler: &Handler<P>) -> DispatchResult<Subscription<P>> {
        let route = RouteKey::classify(key)?;
        self.register(route, Handler::once(handler))
    }

    fn register(&self, route: RouteKey<'_>, handler: Handler<P>) -> DispatchResult<Subscription<P>> {
        let added = self.registries.write().add(route, &handler);
        debug!(key = ?route, added, "Subscribed {:?}", handler);

        Ok(Subscription {
            registries: Arc::downgrade(&self.registries),
            slot: Slot::from(route),
            handler,
        })
    }

    /// Removes `handler` from `key`. Removing an absent handler is a no-op.
    pub fn unsubscribe(&self, key: &str, handler: &Handler<P>) -> DispatchResult<()> {
        let route = RouteKey::classify(key)?;
        let removed = self.registries.write().remove(route, handler);
        debug!(key = ?route, removed, "Unsubscribed {:?}", handler);
        Ok(())
    }

    /// With `None`, drops every handler in every registry. With a key, drops
    /// only the entry that key addresses; `*` and patterns are accepted.
    pub fn clear(&self, key: Option<&str>) -> DispatchResult<()> {
        match key {
            None => {
                self.registries.write().clear_all();
                debug!("Cleared all registries");
            }
            Some(key) => {
                let route = RouteKey::classify(key)?;
                self.registries.write().clear_route(route);
                debug!(key = ?route, "Cleared registry entry");
            }
        }
        Ok(())
    }

    /// Number of handlers stored under exactly `key`.
    pub fn listener_count(&self, key: &str) -> DispatchResult<usize> {
        let route = RouteKey::classify(key)?;
        Ok(self.registries.read().count(route))
    }

    /// Returns true if emitting `name` would reach at least one handler.
    pub fn has_listeners(&self, name: &str) -> DispatchResult<bool> {
        NameProfile::Strict.validate(name)?;
        Ok(self.registries.read().has_match(name))
    }

    /// Returns true if no handler is subscribed anywhere.
    pub fn is_empty(&self) -> bool {
        self.registries.read().is_empty()
    }

    /// Fire-and-forget emission.
    ///
    /// Every matched handler is invoked with the payload (wildcard-shaped
    /// handlers also get `name`). Asynchronous work handlers return is not
    /// awaited: it is spawned on the current tokio runtime, or on a shared
    /// single-worker runtime built on first use when the caller is outside
    /// any runtime. Its failures are only logged.
    ///
    /// A handler failing synchronously does not stop the others. Once all
    /// matched handlers have been invoked, the first synchronous failure is
    /// returned as [`DispatchError::Handler`].
    ///
    /// # Errors
    /// * `InvalidName` for empty names and names containing `*`.
    /// * `NoListeners` when nothing matched and the dispatcher was configured
    ///   with `throw_on_no_listeners`.
    /// * `Handler` as described above.
    pub fn emit(&self, name: &str, payload: P) -> DispatchResult<()> {
        NameProfile::Strict.validate(name)?;

        let mut first_failure: Option<anyhow::Error> = None;
        let invoked = self.invoke_matching(name, &payload, |outcome| match outcome {
            Ok(Invocation::Complete) => {}
            Ok(Invocation::Pending(work)) => detach(name, work),
            Err(err) => {
                if first_failure.is_some() {
                    warn!(event = name, "Additional handler failure during emit: {:#}", err);
                } else {
                    first_failure = Some(err);
                }
            }
        });

        if let Some(err) = first_failure {
            return Err(DispatchError::Handler(err));
        }
        if invoked == 0 && self.config.throw_on_no_listeners {
            return Err(DispatchError::NoListeners(name.to_string()));
        }
        Ok(())
    }

    /// Awaiting emission.
    ///
    /// Handlers are invoked before this returns, in the same order as
    /// [`Dispatcher::emit`]. The returned future resolves once every unit of
    /// work they started has settled; a failing unit does not cancel its
    /// siblings. If any failed, the future yields the failure of the earliest
    /// invoked handler that failed. Synchronous failures count as failed
    /// units.
    ///
    /// # Errors
    /// Name validation fails immediately. `NoListeners` and handler failures
    /// are reported by the returned future.
    pub fn emit_async(&self, name: &str, payload: P) -> DispatchResult<EmitFuture> {
        NameProfile::Strict.validate(name)?;

        let mut units: Vec<HandlerFuture> = Vec::new();
        let invoked = self.invoke_matching(name, &payload, |outcome| match outcome {
            Ok(Invocation::Complete) => {}
            Ok(Invocation::Pending(work)) => units.push(work),
            Err(err) => units.push(Box::pin(future::ready(Err(err)))),
        });

        let no_listeners = invoked == 0 && self.config.throw_on_no_listeners;
        let event = name.to_string();

        Ok(Box::pin(async move {
            if no_listeners {
                return Err(DispatchError::NoListeners(event));
            }

            let pending = units.len();
            let outcomes = future::join_all(units).await;
            let mut failures = outcomes.into_iter().filter_map(Result::err);

            match failures.next() {
                Some(first) => {
                    let others = failures.count();
                    trace!(event = %event, pending, others, "Emission settled with failures");
                    Err(DispatchError::Handler(first))
                }
                None => {
                    trace!(event = %event, pending, "Emission settled");
                    Ok(())
                }
            }
        }))
    }

    /// Runs every handler matching `name` and hands each outcome to
    /// `consume`. Returns how many handlers were invoked.
    fn invoke_matching<F>(&self, name: &str, payload: &P, mut consume: F) -> usize
    where
        F: FnMut(anyhow::Result<Invocation>),
    {
        let matched = self.registries.read().resolve(name);
        trace!(event = name, matched = matched.len(), "Dispatching event");

        let mut invoked = 0;
        for (slot, handler) in matched {
            // lost to another emission of the same one-shot handler
            if !handler.claim() {
                continue;
            }
            if handler.is_once() {
                self.registries.write().remove(slot.route(), &handler);
            }
            invoked += 1;
            consume(handler.invoke(name, payload));
        }
        invoked
    }
}

/// Runtime for detached work emitted from outside any tokio context.
static FALLBACK_RUNTIME: OnceLock<Option<Runtime>> = OnceLock::new();

fn fallback_runtime() -> Option<&'static Runtime> {
    FALLBACK_RUNTIME
        .get_or_init(|| {
            match tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .thread_name("event-dispatch-detached")
                .enable_all()
                .build()
            {
                Ok(runtime) => Some(runtime),
                Err(err) => {
                    error!("Failed to build fallback runtime for detached handlers: {}", err);
                    None
                }
            }
        })
        .as_ref()
}

/// Drives asynchronous handler work nobody waits for.
fn detach(event: &str, work: HandlerFuture) {
    let event = event.to_string();
    let task = async move {
        if let Err(err) = work.await {
            warn!(event = %event, "Detached handler failed: {:#}", err);
        }
    };

    match Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn(task);
        }
        Err(_) => match fallback_runtime() {
            Some(runtime) => {
                runtime.spawn(task);
            }
            None => warn!("No runtime available, dropping detached handler work"),
        },
    }
}

/// A live registration returned by [`Dispatcher::subscribe`] and
/// [`Dispatcher::subscribe_once`].
///
/// Dropping it does not unsubscribe. Only a weak reference to the registries
/// is kept, so a subscription never keeps its dispatcher alive.
pub struct Subscription<P> {
    registries: Weak<RwLock<Registries<P>>>,
    slot: Slot,
    handler: Handler<P>,
}

impl<P> Clone for Subscription<P> {
    fn clone(&self) -> Self {
        Self {
            registries: Weak::clone(&self.registries),
            slot: self.slot.clone(),
            handler: self.handler.clone(),
        }
    }
}

impl<P> fmt::Debug for Subscription<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("slot", &self.slot)
            .field("handler", &self.handler)
            .finish()
    }
}

impl<P> Subscription<P> {
    /// Removes the registration. Safe to call any number of times.
    pub fn unsubscribe(&self) {
        if let Some(registries) = self.registries.upgrade() {
            registries.write().remove(self.slot.route(), &self.handler);
        }
    }

    /// The registered handler; for one-shot subscriptions this is the
    /// adapter, not the handler originally passed in.
    pub fn handler(&self) -> &Handler<P> {
        &self.handler
    }
}
