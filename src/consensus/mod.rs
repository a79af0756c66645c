//! Batch consensus computation.
//!
//! The consensus of a batch is, per tracked field, the value shared by the
//! most records. Records are scanned in ascending `path` order and ties go to
//! the value seen first in that scan, so the result depends only on the set
//! of records and never on how the batch was assembled.

use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;

use crate::record::{ImageRecord, DEFAULT_DIMENSION_ORDER, DEFAULT_DTYPE};

/// The agreed value of every tracked field of a batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Consensus {
    pub dtype: String,
    pub is_timeseries: bool,
    pub is_zstack: bool,
    pub n_channels: u32,
    pub dimension_order: String,
    /// Fixed-precision pixel sizes; `None` means unknown.
    pub pixel_size_x: Option<String>,
    pub pixel_size_y: Option<String>,
    pub pixel_size_z: Option<String>,
    pub channel_names: Vec<String>,
}

impl Default for Consensus {
    /// The consensus of an empty batch.
    fn default() -> Self {
        Self {
            dtype: DEFAULT_DTYPE.to_string(),
            is_timeseries: false,
            is_zstack: false,
            n_channels: 1,
            dimension_order: DEFAULT_DIMENSION_ORDER.to_string(),
            pixel_size_x: None,
            pixel_size_y: None,
            pixel_size_z: None,
            channel_names: Vec::new(),
        }
    }
}

/// Computes the consensus of a batch of records.
///
/// Returns [`Consensus::default`] for an empty batch. The input is not
/// modified.
pub fn compute_consensus(records: &[ImageRecord]) -> Consensus {
    if records.is_empty() {
        return Consensus::default();
    }

    let mut sorted: Vec<&ImageRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.path.cmp(&b.path));

    Consensus {
        dtype: field_majority(&sorted, |r| r.dtype.clone()),
        is_timeseries: field_majority(&sorted, ImageRecord::is_timeseries),
        is_zstack: field_majority(&sorted, ImageRecord::is_zstack),
        n_channels: field_majority(&sorted, |r| r.n_channels),
        dimension_order: field_majority(&sorted, |r| r.dimension_order.clone()),
        pixel_size_x: field_majority(&sorted, ImageRecord::pixel_size_x_str),
        pixel_size_y: field_majority(&sorted, ImageRecord::pixel_size_y_str),
        pixel_size_z: field_majority(&sorted, ImageRecord::pixel_size_z_str),
        channel_names: field_majority(&sorted, |r| r.channel_names.clone()),
    }
}

fn field_majority<T, F>(sorted: &[&ImageRecord], key: F) -> T
where
    T: Eq + Hash + Clone + Default,
    F: Fn(&ImageRecord) -> T,
{
    majority_vote(sorted.iter().map(|r| key(r))).unwrap_or_default()
}

/// Returns the most frequent value, preferring the earliest one on ties.
///
/// Returns `None` when `values` is empty.
///
/// ```
/// use birka::consensus::majority_vote;
///
/// assert_eq!(majority_vote(["b", "a", "a"]), Some("a"));
/// assert_eq!(majority_vote(["b", "a"]), Some("b"));
/// assert_eq!(majority_vote(Vec::<u32>::new()), None);
/// ```
pub fn majority_vote<T, I>(values: I) -> Option<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    // (value, count) in first-seen order
    let mut tally: Vec<(T, usize)> = Vec::new();
    let mut slots: HashMap<T, usize> = HashMap::new();

    for value in values {
        match slots.get(&value) {
            Some(&slot) => tally[slot].1 += 1,
            None => {
                slots.insert(value.clone(), tally.len());
                tally.push((value, 1));
            }
        }
    }

    let mut best: Option<(T, usize)> = None;
    for (value, count) in tally {
        match &best {
            Some((_, best_count)) if *best_count >= count => {}
            _ => best = Some((value, count)),
        }
    }

    best.map(|(value, _)| value)
}
