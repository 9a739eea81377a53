// =============================================================================
// Error Types
// =============================================================================
//
// Every fallible operation in the library returns `Result<T>` with one of
// the variants below. Grouped runs always attach the offending group key
// so a caller can locate which partition failed.
//
// =============================================================================

use thiserror::Error;

/// Errors produced while normalizing model results or running grouped fits.
#[derive(Debug, Error)]
pub enum TidyError {
    /// No adapter has been registered for this model kind.
    #[error("no adapter registered for model kind '{0}'")]
    UnsupportedModelKind(String),

    /// The registered adapter and the supplied model result disagree.
    /// Indicates a kind tag registered against the wrong adapter type.
    #[error("adapter for kind '{0}' cannot read the supplied model result")]
    AdapterMismatch(String),

    /// Two lengths that must agree do not (e.g. fitted values vs. observations).
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// The model kind does not define this view (e.g. augmentation of a
    /// hypothesis test). Distinct from an empty result.
    #[error("model kind '{kind}' does not support {operation}")]
    UnsupportedOperation {
        kind: String,
        operation: &'static str,
    },

    /// A partition's model fit failed during a grouped run.
    #[error("model fit failed for group '{group}': {source}")]
    PartitionFittingFailure {
        group: String,
        #[source]
        source: Box<TidyError>,
    },

    /// A referenced column does not exist in the frame.
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    /// The column exists but holds the wrong type for the operation.
    #[error("column '{column}' is not a {expected} column")]
    ColumnTypeMismatch {
        column: String,
        expected: &'static str,
    },

    /// The formula string could not be parsed.
    #[error("invalid formula: {0}")]
    FormulaError(String),

    /// An input that must be non-empty was empty.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Too few observations for the requested fit.
    #[error("insufficient observations: need at least {needed}, got {got}")]
    InsufficientObservations { needed: usize, got: usize },

    /// An input value outside its valid domain.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// A linear-algebra step failed (singular or near-singular system).
    #[error("linear algebra error: {0}")]
    LinearAlgebra(String),
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, TidyError>;

impl TidyError {
    /// Wrap an error as a partition failure tagged with its group key.
    pub(crate) fn for_group(self, group: &str) -> TidyError {
        TidyError::PartitionFittingFailure {
            group: group.to_string(),
            source: Box::new(self),
        }
    }
}
