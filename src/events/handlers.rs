//--------------------------------------------------------------------------------------------------
// STRUCTS & ENUMS
//--------------------------------------------------------------------------------------------------
// | Name          | Description                                           | Key Methods          |
// |---------------|-------------------------------------------------------|----------------------|
// | Handler       | Cloneable callable identity registered on events      | new, wildcard, same  |
// | Invocation    | Outcome of calling a handler's entry point            | Complete, Pending    |
//--------------------------------------------------------------------------------------------------

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::BoxFuture;

/// Work left running by an asynchronous handler
pub type HandlerFuture = BoxFuture<'static, anyhow::Result<()>>;

/// What a handler's entry point produced
pub enum Invocation {
    /// The handler finished before returning
    Complete,
    /// The handler returned work that is still in flight
    Pending(HandlerFuture),
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Invocation::Complete => f.write_str("Complete"),
            Invocation::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

type PayloadFn<P> = dyn Fn(&P) -> anyhow::Result<Invocation> + Send + Sync;
type EventFn<P> = dyn Fn(&str, &P) -> anyhow::Result<Invocation> + Send + Sync;

enum Callable<P> {
    /// Receives the payload only
    Payload(Box<PayloadFn<P>>),
    /// Receives the event name and the payload
    Event(Box<EventFn<P>>),
    /// One-shot adapter around another handler
    Once { fired: AtomicBool, inner: Handler<P> },
}

/// A subscribed callback.
///
/// `Handler` is a cheap handle; clones share one identity, and that identity
/// is what [`Dispatcher::unsubscribe`](super::Dispatcher::unsubscribe)
/// compares against. Two handlers built from identical closures are still
/// different handlers.
///
/// The shape is fixed at construction: [`Handler::new`] and
/// [`Handler::new_async`] take the payload only, while [`Handler::wildcard`]
/// and [`Handler::wildcard_async`] also receive the concrete event name,
/// which is what universal and pattern subscribers usually want.
pub struct Handler<P> {
    inner: Arc<Callable<P>>,
}

impl<P> Clone for Handler<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P> fmt::Debug for Handler<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &*self.inner {
            Callable::Payload(_) => "payload",
            Callable::Event(_) => "wildcard",
            Callable::Once { .. } => "once",
        };
        f.debug_struct("Handler")
            .field("kind", &kind)
            .field("id", &Arc::as_ptr(&self.inner))
            .finish()
    }
}

impl<P: Send + Sync + 'static> Handler<P> {
    /// Synchronous handler taking the payload.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&P) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::from_fn(move |payload| f(payload).map(|()| Invocation::Complete))
    }

    /// Asynchronous handler taking an owned copy of the payload.
    pub fn new_async<F, Fut>(f: F) -> Self
    where
        P: Clone,
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::from_fn(move |payload: &P| Ok(Invocation::Pending(Box::pin(f(payload.clone())))))
    }

    /// Handler that decides per call whether it finishes synchronously.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&P) -> anyhow::Result<Invocation> + Send + Sync + 'static,
    {
        Self::wrap(Callable::Payload(Box::new(f)))
    }

    /// Synchronous handler taking the event name and payload.
    pub fn wildcard<F>(f: F) -> Self
    where
        F: Fn(&str, &P) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::wildcard_from_fn(move |name, payload| f(name, payload).map(|()| Invocation::Complete))
    }

    /// Asynchronous handler taking the event name and payload.
    pub fn wildcard_async<F, Fut>(f: F) -> Self
    where
        P: Clone,
        F: Fn(String, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::wildcard_from_fn(move |name: &str, payload: &P| {
            Ok(Invocation::Pending(Box::pin(f(name.to_string(), payload.clone()))))
        })
    }

    /// Name-and-payload counterpart of [`Handler::from_fn`].
    pub fn wildcard_from_fn<F>(f: F) -> Self
    where
        F: Fn(&str, &P) -> anyhow::Result<Invocation> + Send + Sync + 'static,
    {
        Self::wrap(Callable::Event(Box::new(f)))
    }

    /// Wraps `inner` in a fresh one-shot adapter with its own identity.
    pub(crate) fn once(inner: &Handler<P>) -> Self {
        Self::wrap(Callable::Once {
            fired: AtomicBool::new(false),
            inner: inner.clone(),
        })
    }

    fn wrap(callable: Callable<P>) -> Self {
        Self {
            inner: Arc::new(callable),
        }
    }
}

impl<P> Handler<P> {
    /// Returns true if both handles refer to the same handler.
    pub fn same(&self, other: &Handler<P>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns true if the handler receives the event name.
    pub fn is_wildcard(&self) -> bool {
        match &*self.inner {
            Callable::Payload(_) => false,
            Callable::Event(_) => true,
            Callable::Once { inner, .. } => inner.is_wildcard(),
        }
    }

    pub(crate) fn is_once(&self) -> bool {
        matches!(&*self.inner, Callable::Once { .. })
    }

    /// Reserves the right to run. Always succeeds for ordinary handlers; a
    /// one-shot adapter succeeds exactly once across all threads.
    pub(crate) fn claim(&self) -> bool {
        match &*self.inner {
            Callable::Once { fired, .. } => !fired.swap(true, Ordering::AcqRel),
            _ => true,
        }
    }

    pub(crate) fn invoke(&self, name: &str, payload: &P) -> anyhow::Result<Invocation> {
        match &*self.inner {
            Callable::Payload(f) => f(payload),
            Callable::Event(f) => f(name, payload),
            Callable::Once { inner, .. } => inner.invoke(name, payload),
        }
    }
}

impl<P> PartialEq for Handler<P> {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl<P> Eq for Handler<P> {}
