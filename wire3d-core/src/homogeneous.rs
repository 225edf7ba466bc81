/// Promotion of 2D/3D coordinate data into 4-row homogeneous column vectors
use crate::error::{GeometryError, Result};
use crate::matrix::Matrix;

/// Number of rows every spatial matrix carries after promotion
pub const HOMOGENEOUS_ROWS: usize = 4;

/// Promote a matrix of column vectors to homogeneous form.
///
/// Two rows `(x, y)` gain `(z = 0, w = 1)`, three rows `(x, y, z)` gain `w = 1`.
/// Any other row count is rejected.
pub fn promote(coords: &Matrix) -> Result<Matrix> {
    let fill: &[f64] = match coords.rows() {
        2 => &[0.0, 1.0],
        3 => &[1.0],
        rows => {
            return Err(GeometryError::MalformedVertexData(format!(
                "expected 2 or 3 coordinate rows, got {rows}"
            )))
        }
    };
    let mut promoted = coords.clone();
    promoted.resize(HOMOGENEOUS_ROWS, coords.cols(), fill)?;
    Ok(promoted)
}

/// Build a homogeneous 4xN matrix from a list of 3D points, one column each
pub fn promote_points(points: &[[f64; 3]]) -> Result<Matrix> {
    if points.is_empty() {
        return Err(GeometryError::MalformedVertexData(
            "at least one point is required".to_string(),
        ));
    }
    promote(&Matrix::from_columns(points)?)
}
