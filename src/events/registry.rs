//--------------------------------------------------------------------------------------------------
// STRUCTS
//--------------------------------------------------------------------------------------------------
// | Name          | Description                                       | Key Methods               |
// |---------------|---------------------------------------------------|---------------------------|
// | Registries    | Exact, universal and pattern handler sets         | add, remove, resolve      |
// | Slot          | Owned address of one registry entry               | route                     |
//--------------------------------------------------------------------------------------------------

use std::collections::HashMap;

use super::handlers::Handler;
use super::names::RouteKey;
use super::pattern::Pattern;

/// Owned form of a [`RouteKey`], kept by subscriptions and dispatch
/// snapshots so they can find their entry again later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Slot {
    Exact(String),
    Universal,
    Pattern(String),
}

impl Slot {
    pub(crate) fn route(&self) -> RouteKey<'_> {
        match self {
            Slot::Exact(name) => RouteKey::Exact(name),
            Slot::Universal => RouteKey::Universal,
            Slot::Pattern(pattern) => RouteKey::Pattern(pattern),
        }
    }
}

impl From<RouteKey<'_>> for Slot {
    fn from(route: RouteKey<'_>) -> Self {
        match route {
            RouteKey::Exact(name) => Slot::Exact(name.to_string()),
            RouteKey::Universal => Slot::Universal,
            RouteKey::Pattern(pattern) => Slot::Pattern(pattern.to_string()),
        }
    }
}

struct PatternEntry<P> {
    pattern: Pattern,
    handlers: Vec<Handler<P>>,
}

/// The three handler registries owned by a dispatcher.
///
/// Handler sets keep insertion order and never hold the same handler twice.
/// An exact or pattern entry is dropped as soon as its set becomes empty.
pub(crate) struct Registries<P> {
    exact: HashMap<String, Vec<Handler<P>>>,
    universal: Vec<Handler<P>>,
    /// Kept in first-subscription order, which is the order patterns fire in
    patterns: Vec<PatternEntry<P>>,
}

impl<P> Default for Registries<P> {
    fn default() -> Self {
        Self {
            exact: HashMap::new(),
            universal: Vec::new(),
            patterns: Vec::new(),
        }
    }
}

fn insert<P>(set: &mut Vec<Handler<P>>, handler: &Handler<P>) -> bool {
    if set.iter().any(|existing| existing.same(handler)) {
        return false;
    }
    set.push(handler.clone());
    true
}

fn discard<P>(set: &mut Vec<Handler<P>>, handler: &Handler<P>) -> bool {
    match set.iter().position(|existing| existing.same(handler)) {
        Some(index) => {
            set.remove(index);
            true
        }
        None => false,
    }
}

impl<P> Registries<P> {
    /// Adds `handler` under `route`. Returns false if it was already there.
    pub(crate) fn add(&mut self, route: RouteKey<'_>, handler: &Handler<P>) -> bool {
        match route {
            RouteKey::Exact(name) => insert(self.exact.entry(name.to_string()).or_default(), handler),
            RouteKey::Universal => insert(&mut self.universal, handler),
            RouteKey::Pattern(source) => {
                if let Some(entry) = self.patterns.iter_mut().find(|e| e.pattern.as_str() == source) {
                    return insert(&mut entry.handlers, handler);
                }
                self.patterns.push(PatternEntry {
                    pattern: Pattern::parse(source),
                    handlers: vec![handler.clone()],
                });
                true
            }
        }
    }

    /// Removes `handler` from `route`. Returns false if it was not there.
    pub(crate) fn remove(&mut self, route: RouteKey<'_>, handler: &Handler<P>) -> bool {
        match route {
            RouteKey::Exact(name) => {
                let Some(set) = self.exact.get_mut(name) else {
                    return false;
                };
                let removed = discard(set, handler);
                if set.is_empty() {
                    self.exact.remove(name);
                }
                removed
            }
            RouteKey::Universal => discard(&mut self.universal, handler),
            RouteKey::Pattern(source) => {
                let Some(index) = self.patterns.iter().position(|e| e.pattern.as_str() == source) else {
                    return false;
                };
                let removed = discard(&mut self.patterns[index].handlers, handler);
                if self.patterns[index].handlers.is_empty() {
                    self.patterns.remove(index);
                }
                removed
            }
        }
    }

    /// Drops every handler stored under `route`.
    pub(crate) fn clear_route(&mut self, route: RouteKey<'_>) {
        match route {
            RouteKey::Exact(name) => {
                self.exact.remove(name);
            }
            RouteKey::Universal => self.universal.clear(),
            RouteKey::Pattern(source) => self.patterns.retain(|e| e.pattern.as_str() != source),
        }
    }

    /// Empties all three registries.
    pub(crate) fn clear_all(&mut self) {
        self.exact.clear();
        self.universal.clear();
        self.patterns.clear();
    }

    /// Number of handlers stored under `route`.
    pub(crate) fn count(&self, route: RouteKey<'_>) -> usize {
        match route {
            RouteKey::Exact(name) => self.exact.get(name).map_or(0, Vec::len),
            RouteKey::Universal => self.universal.len(),
            RouteKey::Pattern(source) => self
                .patterns
                .iter()
                .find(|e| e.pattern.as_str() == source)
                .map_or(0, |e| e.handlers.len()),
        }
    }

    /// Snapshot of every handler matching the concrete event `name`: exact
    /// handlers first, then universal handlers, then pattern handlers in
    /// pattern order.
    pub(crate) fn resolve(&self, name: &str) -> Vec<(Slot, Handler<P>)> {
        let mut matched = Vec::new();

        if let Some(set) = self.exact.get(name) {
            let slot = Slot::Exact(name.to_string());
            matched.extend(set.iter().map(|h| (slot.clone(), h.clone())));
        }

        matched.extend(self.universal.iter().map(|h| (Slot::Universal, h.clone())));

        for entry in self.patterns.iter().filter(|e| e.pattern.matches(name)) {
            let slot = Slot::Pattern(entry.pattern.as_str().to_string());
            matched.extend(entry.handlers.iter().map(|h| (slot.clone(), h.clone())));
        }

        matched
    }

    /// Returns true if any registry would match the concrete event `name`.
    pub(crate) fn has_match(&self, name: &str) -> bool {
        self.exact.contains_key(name)
            || !self.universal.is_empty()
            || self.patterns.iter().any(|e| e.pattern.matches(name))
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.universal.is_empty() && self.patterns.is_empty()
    }
}
