//! Error types shared by every module of the crate

use std::path::PathBuf;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by symmetry math, reflection tables and file codecs
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Rotation part of a symmetry operator is not unimodular
    #[error("Invalid symmetry operator {op}: rotation determinant is {det}, expected ±1")]
    InvalidOperator { op: String, det: i32 },

    /// Symmetry operator text could not be parsed
    #[error("Invalid symmetry operator triplet '{0}'")]
    InvalidTriplet(String),

    /// Space group not present in the built-in catalog
    #[error("Unknown space group: {0}")]
    UnknownSpaceGroup(String),

    /// Unit cell with non-positive (or non-finite) volume
    #[error("Degenerate unit cell ({a}, {b}, {c}, {alpha}, {beta}, {gamma}): volume is not positive")]
    DegenerateCell {
        a: f64,
        b: f64,
        c: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
    },

    /// Named column is required but absent
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Column label already in use
    #[error("Duplicate column label: {0}")]
    DuplicateColumn(String),

    /// Values cannot be stored under the requested column type
    #[error("Column {column}: values are incompatible with type {dtype}")]
    IncompatibleValues { column: String, dtype: String },

    /// M/ISYM code outside the range of the space group's operators
    #[error("Invalid M/ISYM code {isym} for a group of {n_ops} operators")]
    InvalidIsym { isym: i32, n_ops: usize },

    /// Column or argument lengths disagree
    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Argument outside the range an operation accepts
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation needs a unit cell or space group that is not set
    #[error("Missing crystal context: {0} is not set")]
    MissingCrystalContext(&'static str),

    /// Stored Miller index is not an integer
    #[error("Corrupt Miller index in column {column}, row {row}: {value}")]
    CorruptIndex { column: String, row: usize, value: f32 },

    /// Miller index column holds non-integral values at write time
    #[error("Non-integer Miller index in column {column}, row {row}: {value}")]
    NonIntegerIndex { column: String, row: usize, value: f64 },

    /// MTZ column type code not known to the reader
    #[error("Unsupported MTZ column type '{code}' for column {column}")]
    UnsupportedColumnType { column: String, code: char },

    /// Column type without an MTZ type code
    #[error("Column {column} of type {dtype} has no MTZ type code")]
    AmbiguousColumnType { column: String, dtype: String },

    /// Structurally malformed MTZ file
    #[error("Malformed MTZ file {path}: {reason}")]
    Format { path: PathBuf, reason: String },

    /// Failure inside an Arrow compute kernel
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Underlying I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::Format {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
