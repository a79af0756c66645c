//! The state a front end keeps for one batch.
//!
//! A [`Workspace`] ties together the record collection, the identity filter
//! and at most one running export. While an export runs, every mutating
//! action is refused with [`BirkaError::ExportInProgress`]; reads stay
//! available so the table can still be shown.

use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::archive::{ArchiveOptions, ExportEvent, ExportHandle};
use crate::collection::{ChangeEvent, RecordCollection, SubscriptionId};
use crate::error::BirkaError;
use crate::extract::{load_records, HeaderExtractor, LoadFailure, MetadataExtractor};
use crate::record::ImageRecord;
use crate::validation::{
    duplicate_count, is_export_eligible, row_validity, validate_collection, IdentityFilter,
    RowValidity, ValidationContext, ValidationReport,
};

/// Collection, filter and export state for one batch.
pub struct Workspace {
    collection: RecordCollection,
    extractor: Box<dyn MetadataExtractor + Send>,
    filter: Option<IdentityFilter>,
    filter_error: Option<BirkaError>,
    export: Option<ExportHandle>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    /// Creates an empty workspace reading files with [`HeaderExtractor`].
    pub fn new() -> Self {
        Self::with_extractor(HeaderExtractor)
    }

    pub fn with_extractor(extractor: impl MetadataExtractor + Send + 'static) -> Self {
        Self {
            collection: RecordCollection::new(),
            extractor: Box::new(extractor),
            filter: None,
            filter_error: None,
            export: None,
        }
    }

    pub fn collection(&self) -> &RecordCollection {
        &self.collection
    }

    pub fn records(&self) -> &[ImageRecord] {
        self.collection.records()
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&ChangeEvent) + Send + 'static,
    {
        self.collection.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.collection.unsubscribe(id)
    }

    /// True while an export has not reported its terminal event.
    pub fn is_exporting(&self) -> bool {
        self.export.is_some()
    }

    /// Loads every dropped path and appends the resulting records.
    ///
    /// Files that fail to load are returned instead of aborting the drop.
    pub fn add_paths<I, P>(&mut self, paths: I) -> Result<Vec<LoadFailure>, BirkaError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.ensure_idle()?;

        let mut failures = Vec::new();
        for path in paths {
            let path = path.as_ref();
            match load_records(path, self.extractor.as_ref()) {
                Ok(outcome) => {
                    self.collection.extend(outcome.records);
                    failures.extend(outcome.failures);
                }
                Err(error) => {
                    warn!("Failed to load {}: {}", path.display(), error);
                    failures.push(LoadFailure {
                        path: path.to_path_buf(),
                        error,
                    });
                }
            }
        }
        Ok(failures)
    }

    /// Appends records that were built elsewhere.
    pub fn add_records(&mut self, records: Vec<ImageRecord>) -> Result<(), BirkaError> {
        self.ensure_idle()?;
        self.collection.extend(records);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<ImageRecord, BirkaError> {
        self.ensure_idle()?;
        self.collection.remove(index)
    }

    pub fn replace(&mut self, index: usize, record: ImageRecord) -> Result<ImageRecord, BirkaError> {
        self.ensure_idle()?;
        self.collection.replace(index, record)
    }

    pub fn clear(&mut self) -> Result<(), BirkaError> {
        self.ensure_idle()?;
        self.collection.clear();
        Ok(())
    }

    /// Sets or clears the identity filter.
    ///
    /// An empty pattern clears the filter. A pattern that fails to compile
    /// disables filtering and is kept as [`filter_error`](Self::filter_error).
    /// Subscribers receive a reset bracket whenever the active filter changes.
    /// Returns true if the pattern was accepted.
    pub fn set_filter_pattern(&mut self, pattern: Option<&str>) -> bool {
        let pattern = pattern.filter(|p| !p.is_empty());
        let (filter, error) = match pattern.map(IdentityFilter::new) {
            None => (None, None),
            Some(Ok(filter)) => (Some(filter), None),
            Some(Err(error)) => {
                warn!("Identity filter disabled: {}", error);
                (None, Some(error))
            }
        };
        let accepted = error.is_none();

        let changed = self.filter.as_ref().map(IdentityFilter::pattern)
            != filter.as_ref().map(IdentityFilter::pattern);
        self.filter = filter;
        self.filter_error = error;
        if changed {
            self.collection.invalidate();
        }
        accepted
    }

    pub fn filter(&self) -> Option<&IdentityFilter> {
        self.filter.as_ref()
    }

    /// The error of the last rejected filter pattern, if the latest pattern
    /// was rejected.
    pub fn filter_error(&self) -> Option<&BirkaError> {
        self.filter_error.as_ref()
    }

    /// Which fields of row `index` are flagged.
    pub fn row_validity(&self, index: usize) -> Result<RowValidity, BirkaError> {
        let record = self
            .collection
            .get(index)
            .ok_or(BirkaError::IndexOutOfRange {
                index,
                len: self.collection.len(),
            })?;
        let ctx = ValidationContext::for_collection(&self.collection, self.filter.as_ref());
        Ok(row_validity(record, &ctx))
    }

    pub fn validate(&self) -> ValidationReport {
        validate_collection(
            self.collection.records(),
            self.collection.consensus(),
            self.filter.as_ref(),
        )
    }

    pub fn is_export_eligible(&self) -> bool {
        is_export_eligible(self.collection.records())
    }

    /// Starts exporting a snapshot of the batch to `destination`.
    ///
    /// # Errors
    /// Fails if an export is already running, the batch is not eligible, or
    /// the options are invalid.
    pub fn start_export(
        &mut self,
        destination: impl Into<PathBuf>,
        options: ArchiveOptions,
    ) -> Result<(), BirkaError> {
        self.ensure_idle()?;
        let records = self.collection.records();
        if !is_export_eligible(records) {
            return Err(BirkaError::NotExportEligible {
                record_count: records.len(),
                duplicate_count: duplicate_count(records),
            });
        }
        options.validate()?;

        let destination = destination.into();
        info!(
            "Starting export of {} record(s) to {}",
            records.len(),
            destination.display()
        );
        self.export = Some(ExportHandle::spawn(
            self.collection.snapshot(),
            destination,
            options,
        ));
        Ok(())
    }

    /// Asks the running export, if any, to stop between two records.
    pub fn cancel_export(&self) {
        if let Some(export) = &self.export {
            export.cancel();
        }
    }

    /// Drains pending export events without blocking. Mutations are allowed
    /// again once the terminal event has been returned.
    pub fn poll_export(&mut self) -> Vec<ExportEvent> {
        let mut events = Vec::new();
        if let Some(export) = self.export.as_mut() {
            while let Some(event) = export.try_recv() {
                events.push(event);
            }
            if export.is_finished() {
                self.export = None;
            }
        }
        events
    }

    /// Blocks until the running export sends its next event. Returns `None`
    /// when no export is running; mutations are allowed again once the
    /// terminal event has been returned.
    pub fn next_export_event(&mut self) -> Option<ExportEvent> {
        let export = self.export.as_mut()?;
        let event = export.recv();
        if export.is_finished() {
            self.export = None;
        }
        event
    }

    /// Blocks until the running export ends and returns its terminal event.
    pub fn wait_export(&mut self) -> Option<ExportEvent> {
        self.export.take().and_then(ExportHandle::wait)
    }

    fn ensure_idle(&self) -> Result<(), BirkaError> {
        if self.is_exporting() {
            Err(BirkaError::ExportInProgress)
        } else {
            Ok(())
        }
    }
}
