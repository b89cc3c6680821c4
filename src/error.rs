//! Error taxonomy for the HAR codec and solution reconstructor.
//!
//! Each concern gets its own `thiserror` enum, folded into the crate-level
//! [`Error`]. Nothing in the core ever surfaces a raw string or panics on
//! malformed input; every failure path carries structured context.

/// The kind of structural mismatch a [`Error::DataValidation`] reports.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    #[error("length")]
    Length,
    #[error("padding")]
    Padding,
    #[error("spacer")]
    Spacer,
    #[error("unknown type")]
    UnknownType,
}

/// Errors arising from the length-prefix/padding/spacer framing protocol (§4.1).
#[derive(thiserror::Error, Debug)]
pub enum FramingError {
    #[error("frame length mismatch: opening length {opening} does not match closing length {closing}")]
    LengthMismatch { opening: i32, closing: i32 },

    #[error("padding sentinel mismatch: expected {expected:#010x}, got {actual:#010x}")]
    PaddingMismatch { expected: u32, actual: u32 },

    #[error("spacer sentinel mismatch: expected {expected:#010x}, got {actual:#010x}")]
    SpacerMismatch { expected: u32, actual: u32 },

    #[error("unexpected end of stream while reading a frame ({context})")]
    UnexpectedEof { context: &'static str },

    #[error("frame payload length {0} is negative or otherwise invalid")]
    InvalidLength(i32),
}

/// Errors arising from parsing a record's type-specific blocks (§4.4).
#[derive(thiserror::Error, Debug)]
pub enum RecordError {
    #[error("unknown record type tag {tag:?}")]
    UnknownType { tag: [u8; 2] },

    #[error("unknown storage tag {tag:?} (expected FULL or SPSE)")]
    UnknownStorage { tag: [u8; 4] },

    #[error("dimension count {0} is out of the supported range 1..=7")]
    InvalidDimensionCount(i32),

    #[error("set count mismatch: {c} total sets declared but only {a} distinct names given (expected c == a or c == a + 1)")]
    SetCountMismatch { a: i32, c: i32 },

    #[error("a set used along axis {axis} declares {declared} labels but the array's dimension is {dimension}")]
    SetLabelLengthMismatch {
        axis: usize,
        declared: usize,
        dimension: usize,
    },

    #[error("sparse pointer {pointer} is out of range for a logical array of {len} elements")]
    SparsePointerOutOfRange { pointer: usize, len: usize },

    #[error("segments for record {header} did not cover the full logical array: expected {expected} elements, covered {covered}")]
    IncompleteSegments {
        header: String,
        expected: usize,
        covered: usize,
    },

    #[error("record type {record_type:?} cannot carry {data_kind} data")]
    DataKindMismatch {
        record_type: crate::header_array::RecordType,
        data_kind: &'static str,
    },
}

/// Errors arising from SL4 solution reconstruction (§4.6).
#[derive(thiserror::Error, Debug)]
pub enum SolutionError {
    #[error("required SL4 header {0:?} is missing from the input collection")]
    MissingHeader(&'static str),

    #[error("SL4 index table {table:?} has length {actual}, expected at least {expected}")]
    TableTooShort {
        table: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("variable index {0} references a set catalogue entry that does not exist")]
    UnknownSetIndex(usize),

    #[error("exogenous-position pointer {pointer} is out of range for variable {variable} with {len} elements")]
    ExogenousPointerOutOfRange {
        variable: usize,
        pointer: usize,
        len: usize,
    },

    #[error("shock position pointer {pointer} is out of range for variable {variable} with {len} elements")]
    ShockPointerOutOfRange {
        variable: usize,
        pointer: usize,
        len: usize,
    },
}

/// Errors arising from writer configuration or unsupported emission requests.
#[derive(thiserror::Error, Debug)]
pub enum WriterError {
    #[error("writing RL (legacy real array) records is not supported")]
    LegacyRecordUnsupported,

    #[error("segment limit must be at least 1, got {0}")]
    InvalidSegmentLimit(usize),

    #[error("cannot write an array with no sets and no declared dimensions")]
    EmptyDimensions,
}

/// Top-level crate error.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("data validation failure ({kind}): {source}")]
    DataValidation {
        kind: ValidationKind,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Framing(#[from] FramingError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Solution(#[from] SolutionError),

    #[error(transparent)]
    Writer(#[from] WriterError),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps a framing/record validation error with its [`ValidationKind`], matching
    /// the `DataValidation(kind=..)` shape required by §4.4.5 and §7.
    #[must_use]
    pub fn validation(kind: ValidationKind, source: impl Into<Error>) -> Self {
        Error::DataValidation {
            kind,
            source: Box::new(source.into()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
