/// Error taxonomy for the geometry core
use thiserror::Error;

/// Every failure the core can report. All of them are programming or data errors,
/// raised before any stored state is touched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A matrix was requested with a zero dimension or from ragged rows
    #[error("cannot construct matrix: {0}")]
    Construction(String),

    /// Operand shapes are incompatible for the requested operation
    #[error("dimension mismatch: {op} of {lhs_rows}x{lhs_cols} and {rhs_rows}x{rhs_cols}")]
    DimensionMismatch {
        op: &'static str,
        lhs_rows: usize,
        lhs_cols: usize,
        rhs_rows: usize,
        rhs_cols: usize,
    },

    #[error("index ({row}, {col}) out of range for {rows}x{cols} matrix")]
    IndexRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// The operation needs a square (or 4x4) matrix
    #[error("{op} cannot use a {rows}x{cols} matrix")]
    Shape {
        op: &'static str,
        rows: usize,
        cols: usize,
    },

    #[error("matrix is singular")]
    SingularMatrix,

    /// Vertex, normal, color or face data does not have the expected layout
    #[error("malformed vertex data: {0}")]
    MalformedVertexData(String),

    #[error("invalid argument: {0}")]
    Argument(String),

    #[error("not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, GeometryError>;
