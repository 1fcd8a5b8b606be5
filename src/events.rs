//! Change and Selection Notifications
//!
//! The engine's only notification mechanism: a synchronous callback-list
//! broadcast. Two event kinds exist — `change` (no payload; consumers
//! re-read via [`Dimension::data`](crate::Dimension::data)) and `selection`
//! (payload = the dimension's exported filter, for propagation to sibling
//! dimensions).
//!
//! Delivery is synchronous and re-entrant: a selection handler typically
//! applies the filter to another dimension, which runs its whole pipeline
//! and emits its own `change` before control returns here. There is no
//! asynchronous delivery and no coalescing beyond what the batch operations
//! already provide.

use crate::filter::DimensionFilter;

/// Handle returned by `on_change` / `on_selection`, used to unsubscribe.
///
/// Closures have no stable identity, so subscriptions are keyed by handle
/// rather than by handler reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type ChangeHandler = Box<dyn FnMut()>;
type SelectionHandler<R> = Box<dyn FnMut(&DimensionFilter<R>)>;

/// Callback registry for one dimension.
pub(crate) struct EventHub<R> {
    next_id: u64,
    change: Vec<(SubscriptionId, ChangeHandler)>,
    selection: Vec<(SubscriptionId, SelectionHandler<R>)>,
}

impl<R> EventHub<R> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 0,
            change: Vec::new(),
            selection: Vec::new(),
        }
    }

    fn next_id(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn on_change(&mut self, handler: impl FnMut() + 'static) -> SubscriptionId {
        let id = self.next_id();
        self.change.push((id, Box::new(handler)));
        id
    }

    pub(crate) fn on_selection(
        &mut self,
        handler: impl FnMut(&DimensionFilter<R>) + 'static,
    ) -> SubscriptionId {
        let id = self.next_id();
        self.selection.push((id, Box::new(handler)));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.change.len() + self.selection.len();
        self.change.retain(|(h, _)| *h != id);
        self.selection.retain(|(h, _)| *h != id);
        before != self.change.len() + self.selection.len()
    }

    pub(crate) fn emit_change(&mut self) {
        for (_, handler) in &mut self.change {
            handler();
        }
    }

    pub(crate) fn emit_selection(&mut self, filter: &DimensionFilter<R>) {
        for (_, handler) in &mut self.selection {
            handler(filter);
        }
    }
}
