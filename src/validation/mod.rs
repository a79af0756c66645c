//! Batch validation for birka.
//!
//! This module classifies each record's fields as conforming or not:
//! - Identity: the path is unique in the batch and matches the optional
//!   [`IdentityFilter`]
//! - Consensus: tracked fields equal the batch [`Consensus`]
//! - Eligibility: a batch may be exported only if it is non-empty and no two
//!   records share a path
//!
//! Mismatches are never failures of their own; they are flags. Only an empty
//! batch and duplicate paths are errors, because those block export.

mod fields;
mod filter;
mod report;

pub use fields::{Field, FieldDescriptor, Validator, FIELDS};
pub use filter::IdentityFilter;
pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use std::collections::{HashMap, HashSet};

use crate::collection::RecordCollection;
use crate::consensus::Consensus;
use crate::record::ImageRecord;

/// Options for validation behavior.
#[derive(Clone, Debug, Default)]
pub struct ValidateOptions {
    /// If true, treat warnings as errors.
    pub strict: bool,
}

/// Everything a field rule may compare a record against.
#[derive(Debug)]
pub struct ValidationContext<'a> {
    consensus: &'a Consensus,
    filter: Option<&'a IdentityFilter>,
    path_counts: HashMap<&'a str, usize>,
}

impl<'a> ValidationContext<'a> {
    /// Builds a context for `records` validated against `consensus`.
    pub fn new(
        records: &'a [ImageRecord],
        consensus: &'a Consensus,
        filter: Option<&'a IdentityFilter>,
    ) -> Self {
        let mut path_counts: HashMap<&'a str, usize> = HashMap::new();
        for record in records {
            *path_counts.entry(record.path.as_str()).or_insert(0) += 1;
        }
        Self {
            consensus,
            filter,
            path_counts,
        }
    }

    /// Builds a context for the live state of a collection.
    pub fn for_collection(
        collection: &'a RecordCollection,
        filter: Option<&'a IdentityFilter>,
    ) -> Self {
        Self::new(collection.records(), collection.consensus(), filter)
    }

    pub fn consensus(&self) -> &Consensus {
        self.consensus
    }

    /// True if more than one record in the batch carries `path`.
    pub fn is_duplicate_path(&self, path: &str) -> bool {
        self.path_counts.get(path).copied().unwrap_or(0) > 1
    }

    /// True if no filter is set or `path` matches it in full.
    pub fn filter_matches(&self, path: &str) -> bool {
        self.filter.map_or(true, |filter| filter.matches(path))
    }
}

/// Per-field validity of one record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowValidity {
    invalid: Vec<Field>,
}

impl RowValidity {
    /// True if `field` conforms.
    pub fn is_valid(&self, field: Field) -> bool {
        !self.invalid.contains(&field)
    }

    /// Non-conforming fields in display order.
    pub fn invalid_fields(&self) -> &[Field] {
        &self.invalid
    }

    /// True if every field conforms.
    pub fn is_conforming(&self) -> bool {
        self.invalid.is_empty()
    }
}

/// Classifies every field of `record`.
pub fn row_validity(record: &ImageRecord, ctx: &ValidationContext<'_>) -> RowValidity {
    let invalid = Field::all()
        .filter(|field| !field.is_valid(record, ctx))
        .collect();
    RowValidity { invalid }
}

/// Returns true if the batch may be exported: it is non-empty and every
/// path is distinct.
pub fn is_export_eligible(records: &[ImageRecord]) -> bool {
    if records.is_empty() {
        return false;
    }
    let distinct: HashSet<&str> = records.iter().map(|r| r.path.as_str()).collect();
    distinct.len() == records.len()
}

/// Number of records whose path is also carried by an earlier record.
pub fn duplicate_count(records: &[ImageRecord]) -> usize {
    let distinct: HashSet<&str> = records.iter().map(|r| r.path.as_str()).collect();
    records.len() - distinct.len()
}

/// Validates a batch and returns a report of every flagged field.
pub fn validate_collection(
    records: &[ImageRecord],
    consensus: &Consensus,
    filter: Option<&IdentityFilter>,
) -> ValidationReport {
    let mut report = ValidationReport::new();

    if records.is_empty() {
        report.add(ValidationIssue::error(
            IssueCode::EmptyCollection,
            "Batch is empty",
            IssueContext::Batch,
        ));
        return report;
    }

    let ctx = ValidationContext::new(records, consensus, filter);

    for (index, record) in records.iter().enumerate() {
        let validity = row_validity(record, &ctx);
        for &field in validity.invalid_fields() {
            add_field_issues(&mut report, index, record, field, &ctx);
        }
    }

    report
}

/// Translates one failed field rule into report issues.
fn add_field_issues(
    report: &mut ValidationReport,
    index: usize,
    record: &ImageRecord,
    field: Field,
    ctx: &ValidationContext<'_>,
) {
    let context = || IssueContext::Record {
        index,
        path: record.path.clone(),
    };
    let consensus = ctx.consensus();

    match field {
        Field::Path => {
            // Both halves of the identity rule may fail at once.
            if ctx.is_duplicate_path(&record.path) {
                report.add(ValidationIssue::error(
                    IssueCode::DuplicatePath,
                    format!("Path '{}' is used by more than one record", record.path),
                    context(),
                ));
            }
            if !ctx.filter_matches(&record.path) {
                report.add(ValidationIssue::warning(
                    IssueCode::PathFilterMismatch,
                    format!("Path '{}' does not match the filter", record.path),
                    context(),
                ));
            }
        }
        Field::Dtype => report.add(ValidationIssue::warning(
            IssueCode::DtypeMismatch,
            format!(
                "Data type '{}' differs from consensus '{}'",
                record.dtype, consensus.dtype
            ),
            context(),
        )),
        Field::Timepoints => report.add(ValidationIssue::warning(
            IssueCode::TimeseriesMismatch,
            format!(
                "{} timepoint(s) but the batch is {}a timeseries",
                record.n_timepoints,
                if consensus.is_timeseries { "" } else { "not " }
            ),
            context(),
        )),
        Field::Channels => report.add(ValidationIssue::warning(
            IssueCode::ChannelCountMismatch,
            format!(
                "{} channel(s), consensus is {}",
                record.n_channels, consensus.n_channels
            ),
            context(),
        )),
        Field::ZStack => report.add(ValidationIssue::warning(
            IssueCode::ZStackMismatch,
            format!(
                "Depth {} px but the batch is {}a z-stack",
                record.size_z_px,
                if consensus.is_zstack { "" } else { "not " }
            ),
            context(),
        )),
        Field::DimensionOrder => report.add(ValidationIssue::warning(
            IssueCode::DimensionOrderMismatch,
            format!(
                "Dimension order '{}' differs from consensus '{}'",
                record.dimension_order, consensus.dimension_order
            ),
            context(),
        )),
        Field::PixelSizeX | Field::PixelSizeY | Field::PixelSizeZ => {
            let (axis, value, expected) = match field {
                Field::PixelSizeX => ("X", record.pixel_size_x_str(), &consensus.pixel_size_x),
                Field::PixelSizeY => ("Y", record.pixel_size_y_str(), &consensus.pixel_size_y),
                _ => ("Z", record.pixel_size_z_str(), &consensus.pixel_size_z),
            };
            report.add(ValidationIssue::warning(
                IssueCode::PixelSizeMismatch,
                format!(
                    "Pixel size ({}) {} differs from consensus {}",
                    axis,
                    value.as_deref().unwrap_or("unknown"),
                    expected.as_deref().unwrap_or("unknown")
                ),
                context(),
            ));
        }
        Field::ChannelNames => report.add(ValidationIssue::warning(
            IssueCode::ChannelNamesMismatch,
            format!(
                "Channel names [{}] differ from consensus [{}]",
                record.channel_names.join(", "),
                consensus.channel_names.join(", ")
            ),
            context(),
        )),
        Field::Scenes | Field::Width | Field::Height | Field::Depth => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::compute_consensus;

    fn record(path: &str) -> ImageRecord {
        ImageRecord::new(path, 256, 256)
            .with_channels(2)
            .with_channel_names(["DAPI", "GFP"])
            .with_pixel_size_x(0.5)
            .with_pixel_size_y(0.5)
    }

    fn consistent_batch() -> Vec<ImageRecord> {
        vec![record("a.tif"), record("b.tif"), record("c.tif")]
    }

    fn report_for(records: &[ImageRecord]) -> ValidationReport {
        let consensus = compute_consensus(records);
        validate_collection(records, &consensus, None)
    }

    #[test]
    fn test_consistent_batch_is_clean() {
        let records = consistent_batch();
        let report = report_for(&records);

        assert!(
            report.is_clean(),
            "Expected no issues, got: {:?}",
            report.issues
        );
        assert!(is_export_eligible(&records));
    }

    #[test]
    fn test_channel_mismatch_flags_only_that_field() {
        let mut records = consistent_batch();
        records[1].n_channels = 3;
        let consensus = compute_consensus(&records);
        let ctx = ValidationContext::new(&records, &consensus, None);

        let validity = row_validity(&records[1], &ctx);
        assert_eq!(validity.invalid_fields(), &[Field::Channels]);
        assert!(!validity.is_valid(Field::Channels));
        assert!(validity.is_valid(Field::Dtype));
        assert!(row_validity(&records[0], &ctx).is_conforming());
    }

    #[test]
    fn test_mismatch_is_a_warning() {
        let mut records = consistent_batch();
        records[2].dtype = "uint8".into();

        let report = report_for(&records);
        assert_eq!(report.warning_count(), 1);
        assert_eq!(report.error_count(), 0);
        assert!(report
            .issues
            .iter()
            .any(|i| i.code == IssueCode::DtypeMismatch));
        assert_eq!(report.issues_for(2).count(), 1);
        assert_eq!(report.issues_for(0).count(), 0);
    }

    #[test]
    fn test_duplicate_paths_are_errors_on_every_copy() {
        let records = vec![record("a.tif"), record("a.tif"), record("b.tif")];

        let report = report_for(&records);
        assert_eq!(report.error_count(), 2);
        assert!(report
            .issues
            .iter()
            .all(|i| i.code == IssueCode::DuplicatePath));
        assert!(!is_export_eligible(&records));
        assert_eq!(duplicate_count(&records), 1);
    }

    #[test]
    fn test_filter_and_duplicate_are_anded() {
        let records = vec![record("keep/a.tif"), record("drop/b.tif")];
        let consensus = compute_consensus(&records);
        let filter = IdentityFilter::new(r"keep/.*").unwrap();
        let ctx = ValidationContext::new(&records, &consensus, Some(&filter));

        assert!(Field::Path.is_valid(&records[0], &ctx));
        assert!(!Field::Path.is_valid(&records[1], &ctx));

        let report = validate_collection(&records, &consensus, Some(&filter));
        assert_eq!(report.warning_count(), 1);
        assert!(report.is_ok());
        assert!(!report.passes(true));
    }

    #[test]
    fn test_filter_does_not_touch_other_fields() {
        let records = consistent_batch();
        let consensus = compute_consensus(&records);
        let filter = IdentityFilter::new("nothing-matches").unwrap();
        let ctx = ValidationContext::new(&records, &consensus, Some(&filter));

        for record in &records {
            assert_eq!(row_validity(record, &ctx).invalid_fields(), &[Field::Path]);
        }
    }

    #[test]
    fn test_unknown_pixel_sizes_match_each_other() {
        let records = vec![
            ImageRecord::new("a.tif", 8, 8),
            ImageRecord::new("b.tif", 8, 8),
            ImageRecord::new("c.tif", 8, 8).with_pixel_size_z(1.0),
        ];

        let report = report_for(&records);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].code, IssueCode::PixelSizeMismatch);
        assert!(report.issues[0].message.contains("(Z) 1.000000"));
    }

    #[test]
    fn test_channel_names_order_matters() {
        let mut records = consistent_batch();
        records[0].channel_names = vec!["GFP".into(), "DAPI".into()];

        let report = report_for(&records);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].code, IssueCode::ChannelNamesMismatch);
    }

    #[test]
    fn test_informational_fields_never_flagged() {
        let mut records = consistent_batch();
        records[0].size_x_px = 17;
        records[1].size_y_px = 3;
        records[2].n_scenes = 9;

        assert!(report_for(&records).is_clean());
    }

    #[test]
    fn test_zstack_rule_ignores_exact_depth() {
        let records = vec![
            ImageRecord::new("a.tif", 8, 8).with_depth(10),
            ImageRecord::new("b.tif", 8, 8).with_depth(30),
            ImageRecord::new("c.tif", 8, 8),
        ];

        let report = report_for(&records);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].code, IssueCode::ZStackMismatch);
        assert_eq!(report.issues_for(2).count(), 1);
    }

    #[test]
    fn test_empty_batch() {
        let report = report_for(&[]);

        assert_eq!(report.error_count(), 1);
        assert_eq!(report.issues[0].code, IssueCode::EmptyCollection);
        assert!(!is_export_eligible(&[]));
    }

    #[test]
    fn test_eligibility_examples() {
        let distinct = vec![ImageRecord::new("a", 1, 1), ImageRecord::new("b", 1, 1)];
        let repeated = vec![ImageRecord::new("a", 1, 1), ImageRecord::new("a", 1, 1)];

        assert!(is_export_eligible(&distinct));
        assert!(!is_export_eligible(&repeated));
    }

    #[test]
    fn test_report_errors_agree_with_eligibility() {
        for records in [
            consistent_batch(),
            vec![record("a.tif"), record("a.tif")],
            vec![record("a.tif").with_dtype("uint8"), record("b.tif")],
            vec![],
        ] {
            assert_eq!(report_for(&records).is_ok(), is_export_eligible(&records));
        }
    }
}
