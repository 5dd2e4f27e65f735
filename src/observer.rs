use std::fmt;

use crate::ids::NodeId;

/// Handle returned by [`Observers::subscribe`]; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Subscription(u64);

type Listener<E> = Box<dyn FnMut(&E)>;

struct Entry<E> {
    id: Subscription,
    scope: Option<NodeId>,
    listener: Listener<E>,
}

/// Synchronous listener registry.
///
/// Listeners may be scoped to a node; [`Observers::drop_scope`] removes every
/// listener attached to that node when it is destroyed.
pub struct Observers<E> {
    entries: Vec<Entry<E>>,
    next_id: u64,
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }
}

impl<E> fmt::Debug for Observers<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("listeners", &self.entries.len())
            .finish()
    }
}

impl<E> Observers<E> {
    pub fn subscribe(&mut self, listener: impl FnMut(&E) + 'static) -> Subscription {
        self.insert(None, Box::new(listener))
    }

    pub fn subscribe_scoped(
        &mut self,
        scope: NodeId,
        listener: impl FnMut(&E) + 'static,
    ) -> Subscription {
        self.insert(Some(scope), Box::new(listener))
    }

    fn insert(&mut self, scope: Option<NodeId>, listener: Listener<E>) -> Subscription {
        self.next_id = self.next_id.wrapping_add(1);
        let id = Subscription(self.next_id);
        self.entries.push(Entry {
            id,
            scope,
            listener,
        });
        id
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != subscription);
        before != self.entries.len()
    }

    pub fn drop_scope(&mut self, scope: NodeId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.scope != Some(scope));
        before - self.entries.len()
    }

    pub fn emit(&mut self, event: &E) {
        for entry in &mut self.entries {
            (entry.listener)(event);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn unsubscribe_stops_delivery() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut observers = Observers::default();
        let sink = Rc::clone(&seen);
        let sub = observers.subscribe(move |value: &u32| sink.borrow_mut().push(*value));
        observers.emit(&1);
        assert!(observers.unsubscribe(sub));
        assert!(!observers.unsubscribe(sub));
        observers.emit(&2);
        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn drop_scope_removes_scoped_listeners_only() {
        let mut observers: Observers<u32> = Observers::default();
        observers.subscribe(|_| {});
        observers.subscribe_scoped(NodeId(4), |_| {});
        observers.subscribe_scoped(NodeId(4), |_| {});
        assert_eq!(observers.drop_scope(NodeId(4)), 2);
        assert_eq!(observers.len(), 1);
    }
}
