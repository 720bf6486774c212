//! Error types for cohort validation and analysis.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Subjects, metric profiles or confound rows do not line up.
    Alignment,
    /// Group or target column content is unusable.
    InvalidLabel,
    /// The confound design matrix is not full rank.
    SingularRegression,
    /// Analysis parameters or tract selection are invalid.
    Configuration,
}

/// Fatal errors raised before or during an analysis run.
#[derive(Debug, Error)]
pub enum Error {
    /// A subject listed in the metadata table has no metric profile.
    #[error("subject `{subject}` has metadata but no metric profile")]
    MissingMetrics {
        /// Subject identifier.
        subject: String,
    },

    /// A metric profile exists for a subject absent from the metadata table.
    #[error("subject `{subject}` has a metric profile but no metadata row")]
    MissingMetadata {
        /// Subject identifier.
        subject: String,
    },

    /// The same subject identifier appears twice in the metadata table.
    #[error("subject `{subject}` appears more than once in the metadata table")]
    DuplicateSubject {
        /// Subject identifier.
        subject: String,
    },

    /// A subject's profile does not have the cohort-wide `[tract][position]` shape.
    #[error(
        "profile of subject `{subject}` has shape {found_tracts}x{found_points}, expected {expected_tracts}x{expected_points}"
    )]
    ShapeMismatch {
        /// Subject identifier.
        subject: String,
        /// Expected tract count.
        expected_tracts: usize,
        /// Expected positions per tract.
        expected_points: usize,
        /// Tract count found.
        found_tracts: usize,
        /// Positions found in the offending tract.
        found_points: usize,
    },

    /// A metric value is NaN or infinite.
    #[error("subject `{subject}` has a non-finite metric value in tract {tract} at position {position}")]
    NonFiniteMetric {
        /// Subject identifier.
        subject: String,
        /// Tract index in the subject's profile.
        tract: usize,
        /// Position along the tract.
        position: usize,
    },

    /// A confound row has the wrong number of values.
    #[error("subject `{subject}` has {found} confound values, expected {expected}")]
    ConfoundMisaligned {
        /// Subject identifier.
        subject: String,
        /// Number of confound columns declared.
        expected: usize,
        /// Number of values present.
        found: usize,
    },

    /// A confound cell is missing (NaN or infinite).
    #[error("confound `{column}` is missing for subject `{subject}`")]
    MissingConfoundValue {
        /// Subject identifier.
        subject: String,
        /// Confound column name.
        column: String,
    },

    /// The analysis column header is neither `group` nor `target`.
    #[error("analysis column `{header}` not recognized (expected `group` or `target`)")]
    UnrecognizedAnalysisColumn {
        /// Header as found.
        header: String,
    },

    /// A group label outside {0, 1}.
    #[error("subject `{subject}` has group label {value}, expected 0 or 1")]
    InvalidGroupLabel {
        /// Subject identifier.
        subject: String,
        /// Offending value.
        value: f64,
    },

    /// A target value that is NaN or infinite.
    #[error("subject `{subject}` has a non-finite target value")]
    InvalidTarget {
        /// Subject identifier.
        subject: String,
    },

    /// Not enough subjects to estimate a statistic.
    #[error("too few subjects: {reason}")]
    TooFewSubjects {
        /// What is missing.
        reason: String,
    },

    /// The confound design matrix is rank deficient.
    #[error("confound design matrix is singular (rank {rank} < {columns} columns)")]
    SingularDesign {
        /// Numerical rank found.
        rank: usize,
        /// Number of design columns (intercept, protected covariate, confounds).
        columns: usize,
    },

    /// A selected tract name is not part of the cohort.
    #[error("tract `{name}` is not part of the cohort")]
    UnknownTract {
        /// Requested name.
        name: String,
    },

    /// The tract selection is empty.
    #[error("no tracts selected for analysis")]
    EmptySelection,

    /// Analysis parameters are out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingMetrics { .. }
            | Error::MissingMetadata { .. }
            | Error::DuplicateSubject { .. }
            | Error::ShapeMismatch { .. }
            | Error::NonFiniteMetric { .. }
            | Error::ConfoundMisaligned { .. }
            | Error::MissingConfoundValue { .. } => ErrorKind::Alignment,
            Error::UnrecognizedAnalysisColumn { .. }
            | Error::InvalidGroupLabel { .. }
            | Error::InvalidTarget { .. } => ErrorKind::InvalidLabel,
            Error::SingularDesign { .. } => ErrorKind::SingularRegression,
            Error::TooFewSubjects { .. }
            | Error::UnknownTract { .. }
            | Error::EmptySelection
            | Error::InvalidConfig(_) => ErrorKind::Configuration,
        }
    }
}
