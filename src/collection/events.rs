//! Change notifications emitted by a [`RecordCollection`](super::RecordCollection).

use std::fmt;

/// A change to a record collection.
///
/// Row ranges are inclusive. A consensus change is bracketed by
/// [`ResetBegin`](ChangeEvent::ResetBegin) and
/// [`ResetEnd`](ChangeEvent::ResetEnd): between the two, observers must not
/// assume anything about the validity of any row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeEvent {
    /// Everything may be about to change.
    ResetBegin,
    /// Everything may have changed.
    ResetEnd,
    /// Rows `first..=last` were inserted.
    RowsInserted { first: usize, last: usize },
    /// Rows `first..=last` were removed.
    RowsRemoved { first: usize, last: usize },
    /// The data of rows `first..=last` changed.
    RowsChanged { first: usize, last: usize },
}

impl ChangeEvent {
    /// True for either half of a reset bracket.
    pub fn is_reset(&self) -> bool {
        matches!(self, ChangeEvent::ResetBegin | ChangeEvent::ResetEnd)
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeEvent::ResetBegin => write!(f, "reset begin"),
            ChangeEvent::ResetEnd => write!(f, "reset end"),
            ChangeEvent::RowsInserted { first, last } => write!(f, "rows {first}..={last} inserted"),
            ChangeEvent::RowsRemoved { first, last } => write!(f, "rows {first}..={last} removed"),
            ChangeEvent::RowsChanged { first, last } => write!(f, "rows {first}..={last} changed"),
        }
    }
}

/// Handle returned by [`RecordCollection::subscribe`](super::RecordCollection::subscribe).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(super) u64);

type Callback = Box<dyn FnMut(&ChangeEvent) + Send>;

/// Registered observers, notified in registration order.
#[derive(Default)]
pub(super) struct Subscribers {
    next_id: u64,
    callbacks: Vec<(SubscriptionId, Callback)>,
}

impl Subscribers {
    pub(super) fn add(&mut self, callback: Callback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, callback));
        id
    }

    pub(super) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(existing, _)| *existing != id);
        self.callbacks.len() != before
    }

    pub(super) fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub(super) fn emit(&mut self, event: ChangeEvent) {
        for (_, callback) in &mut self.callbacks {
            callback(&event);
        }
    }
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.callbacks.len())
            .finish()
    }
}
