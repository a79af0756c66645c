//! An observable, consensus-tracking collection of image records.
//!
//! [`RecordCollection`] owns an ordered list of records together with the
//! batch [`Consensus`]. Every structural change recomputes the consensus
//! from scratch and notifies subscribers:
//!
//! 1. The row event for the mutation itself (insert, remove or change).
//! 2. If the consensus changed, a [`ChangeEvent::ResetBegin`] /
//!    [`ChangeEvent::ResetEnd`] pair around the swap of the consensus.
//!
//! A mutation that leaves the consensus untouched emits no reset, so
//! observers only re-validate every row when the majority actually shifts.
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use birka::collection::{ChangeEvent, RecordCollection};
//! use birka::record::ImageRecord;
//!
//! let mut images = RecordCollection::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! images.subscribe(move |event| sink.lock().unwrap().push(*event));
//!
//! images.push(ImageRecord::new("a.tif", 64, 64));
//! assert_eq!(
//!     *seen.lock().unwrap(),
//!     vec![ChangeEvent::RowsInserted { first: 0, last: 0 }]
//! );
//! ```

mod events;

pub use events::{ChangeEvent, SubscriptionId};

use log::debug;

use crate::consensus::{compute_consensus, Consensus};
use crate::error::BirkaError;
use crate::record::ImageRecord;
use events::Subscribers;

/// Ordered image records plus their live consensus.
#[derive(Debug, Default)]
pub struct RecordCollection {
    records: Vec<ImageRecord>,
    consensus: Consensus,
    subscribers: Subscribers,
}

impl RecordCollection {
    /// Creates an empty collection with the default consensus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collection holding `records`, with its consensus computed.
    pub fn from_records(records: Vec<ImageRecord>) -> Self {
        let consensus = compute_consensus(&records);
        Self {
            records,
            consensus,
            subscribers: Subscribers::default(),
        }
    }

    /// Registers an observer and returns a handle for unsubscribing.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&ChangeEvent) + Send + 'static,
    {
        self.subscribers.add(Box::new(callback))
    }

    /// Removes an observer. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    /// Number of registered observers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ImageRecord> {
        self.records.get(index)
    }

    /// Current records in collection order.
    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    /// Current consensus.
    pub fn consensus(&self) -> &Consensus {
        &self.consensus
    }

    /// Copies the current records, e.g. to hand them to an export worker.
    pub fn snapshot(&self) -> Vec<ImageRecord> {
        self.records.clone()
    }

    /// Inserts `record` before position `index`.
    ///
    /// `index == len()` appends.
    ///
    /// # Errors
    /// Returns [`BirkaError::IndexOutOfRange`] if `index > len()`.
    pub fn insert(&mut self, index: usize, record: ImageRecord) -> Result<(), BirkaError> {
        if index > self.records.len() {
            return Err(self.out_of_range(index));
        }
        self.records.insert(index, record);
        self.subscribers.emit(ChangeEvent::RowsInserted {
            first: index,
            last: index,
        });
        self.refresh_consensus();
        Ok(())
    }

    /// Appends `record` at the end.
    pub fn push(&mut self, record: ImageRecord) {
        let index = self.records.len();
        self.records.push(record);
        self.subscribers.emit(ChangeEvent::RowsInserted {
            first: index,
            last: index,
        });
        self.refresh_consensus();
    }

    /// Appends each record in turn, as repeated [`push`](Self::push) calls.
    pub fn extend<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = ImageRecord>,
    {
        for record in records {
            self.push(record);
        }
    }

    /// Removes and returns the record at `index`.
    ///
    /// # Errors
    /// Returns [`BirkaError::IndexOutOfRange`] if `index >= len()`.
    pub fn remove(&mut self, index: usize) -> Result<ImageRecord, BirkaError> {
        if index >= self.records.len() {
            return Err(self.out_of_range(index));
        }
        let removed = self.records.remove(index);
        self.subscribers.emit(ChangeEvent::RowsRemoved {
            first: index,
            last: index,
        });
        self.refresh_consensus();
        Ok(removed)
    }

    /// Replaces the record at `index` and returns the previous one.
    ///
    /// # Errors
    /// Returns [`BirkaError::IndexOutOfRange`] if `index >= len()`.
    pub fn replace(&mut self, index: usize, record: ImageRecord) -> Result<ImageRecord, BirkaError> {
        if index >= self.records.len() {
            return Err(self.out_of_range(index));
        }
        let previous = std::mem::replace(&mut self.records[index], record);
        self.subscribers.emit(ChangeEvent::RowsChanged {
            first: index,
            last: index,
        });
        self.refresh_consensus();
        Ok(previous)
    }

    /// Removes every record inside a single reset bracket.
    pub fn clear(&mut self) {
        if self.records.is_empty() {
            return;
        }
        self.subscribers.emit(ChangeEvent::ResetBegin);
        self.records.clear();
        self.consensus = Consensus::default();
        self.subscribers.emit(ChangeEvent::ResetEnd);
    }

    /// Emits a reset bracket without touching the data, for state outside
    /// the collection (such as an identity filter) that changes row validity.
    pub fn invalidate(&mut self) {
        self.subscribers.emit(ChangeEvent::ResetBegin);
        self.subscribers.emit(ChangeEvent::ResetEnd);
    }

    fn refresh_consensus(&mut self) {
        let consensus = compute_consensus(&self.records);
        if consensus == self.consensus {
            return;
        }
        debug!(
            "consensus changed over {} record(s): {:?}",
            self.records.len(),
            consensus
        );
        self.subscribers.emit(ChangeEvent::ResetBegin);
        self.consensus = consensus;
        self.subscribers.emit(ChangeEvent::ResetEnd);
    }

    fn out_of_range(&self, index: usize) -> BirkaError {
        BirkaError::IndexOutOfRange {
            index,
            len: self.records.len(),
        }
    }
}
