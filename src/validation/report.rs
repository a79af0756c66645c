//! Validation report types for structured batch reporting.
//!
//! A report lists every flagged field of every record, so it can be shown to
//! users, serialized to JSON, or processed programmatically.

use serde::Serialize;
use std::fmt;

/// The result of validating a batch.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ValidationReport {
    /// All issues found during validation.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Adds an issue to the report.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Returns the number of errors in the report.
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    /// Returns the number of warnings in the report.
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// Returns true if there are no errors.
    ///
    /// Only an empty batch or duplicate paths are errors, so this agrees
    /// with [`is_export_eligible`](super::is_export_eligible).
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    /// Returns true if there are no issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns true if validation passed, treating warnings as errors when
    /// `strict` is set.
    pub fn passes(&self, strict: bool) -> bool {
        if strict {
            self.is_clean()
        } else {
            self.is_ok()
        }
    }

    /// Iterates over the issues raised for one record.
    pub fn issues_for(&self, index: usize) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| match &i.context {
            IssueContext::Record { index: at, .. } => *at == index,
            IssueContext::Batch => false,
        })
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(f, "Validation passed: no issues found");
        }

        writeln!(
            f,
            "Validation completed with {} error(s) and {} warning(s):",
            self.error_count(),
            self.warning_count()
        )?;
        writeln!(f)?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// A single validation issue (error or warning).
#[derive(Clone, Debug, Serialize)]
pub struct ValidationIssue {
    /// The severity of the issue.
    pub severity: Severity,

    /// A stable code for the issue type.
    pub code: IssueCode,

    /// A human-readable description of the issue.
    pub message: String,

    /// Where the issue occurred.
    pub context: IssueContext,
}

impl ValidationIssue {
    /// Creates a new validation issue.
    pub fn new(
        severity: Severity,
        code: IssueCode,
        message: impl Into<String>,
        context: IssueContext,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            context,
        }
    }

    /// Creates a new error.
    pub fn error(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Error, code, message, context)
    }

    /// Creates a new warning.
    pub fn warning(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Warning, code, message, context)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        write!(
            f,
            "[{}] {:?} in {}: {}",
            severity, self.code, self.context, self.message
        )
    }
}

/// The severity of a validation issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Inconsistent with the batch, but does not block export.
    Warning,
    /// Blocks export of the batch.
    Error,
}

/// A stable code identifying the type of validation issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IssueCode {
    /// The batch holds no records.
    EmptyCollection,

    // Identity issues
    /// Several records share the same path.
    DuplicatePath,
    /// The path does not match the identity filter.
    PathFilterMismatch,

    // Consensus issues
    /// Sample type differs from the consensus.
    DtypeMismatch,
    /// Timeseries-ness differs from the consensus.
    TimeseriesMismatch,
    /// Channel count differs from the consensus.
    ChannelCountMismatch,
    /// Z-stack-ness differs from the consensus.
    ZStackMismatch,
    /// Axis order differs from the consensus.
    DimensionOrderMismatch,
    /// A physical pixel size differs from the consensus.
    PixelSizeMismatch,
    /// Channel names differ from the consensus.
    ChannelNamesMismatch,
}

/// Where a validation issue occurred.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum IssueContext {
    /// Issue with the batch as a whole.
    Batch,
    /// Issue with one record.
    Record { index: usize, path: String },
}

impl fmt::Display for IssueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueContext::Batch => write!(f, "batch"),
            IssueContext::Record { index, path } => write!(f, "record {} ({})", index, path),
        }
    }
}
