/// Standalone homogeneous point for transform experiments outside the scene graph
use crate::error::{GeometryError, Result};
use crate::homogeneous;
use crate::matrix::Matrix;
use crate::transform::{Transform, Vec3};

/// A single point carried as a 4x1 homogeneous column.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector {
    coords: Matrix,
}

impl Vector {
    /// A 2D point, promoted to `(x, y, 0, 1)`
    pub fn from_xy(x: f64, y: f64) -> Result<Self> {
        Ok(Self {
            coords: homogeneous::promote(&Matrix::from_column(&[x, y])?)?,
        })
    }

    /// A 3D point, promoted to `(x, y, z, 1)`
    pub fn from_xyz(x: f64, y: f64, z: f64) -> Result<Self> {
        Ok(Self {
            coords: homogeneous::promote(&Matrix::from_column(&[x, y, z])?)?,
        })
    }

    /// Wrap raw column data of 2 or 3 rows
    pub fn from_column(values: &[f64]) -> Result<Self> {
        Ok(Self {
            coords: homogeneous::promote(&Matrix::from_column(values)?)?,
        })
    }

    fn component(&self, row: usize) -> f64 {
        self.coords.as_slice()[row]
    }

    pub fn x(&self) -> f64 {
        self.component(0)
    }

    pub fn y(&self) -> f64 {
        self.component(1)
    }

    pub fn z(&self) -> f64 {
        self.component(2)
    }

    pub fn w(&self) -> f64 {
        self.component(3)
    }

    pub fn xyz(&self) -> Vec3 {
        Vec3::new(self.x(), self.y(), self.z())
    }

    pub fn as_matrix(&self) -> &Matrix {
        &self.coords
    }

    /// Left-multiply by an arbitrary 4x4 transform
    /// Left-multiply by a 4x4 transform
    pub fn apply(&mut self, transform: &Matrix) -> Result<()> {
        if transform.shape() != (4, 4) {
            return Err(GeometryError::Shape {
                op: "Vector::apply",
                rows: transform.rows(),
                cols: transform.cols(),
            });
        }
        self.coords = transform.try_mul(&self.coords)?;
        Ok(())
    }

    pub fn translate(&mut self, delta: &Vec3) -> Result<()> {
        self.apply(&Transform::translation_matrix(delta))
    }

    /// Scale relative to `pivot` instead of the origin
    pub fn scale_about(&mut self, factors: &Vec3, pivot: &Vector) -> Result<()> {
        let m = Self::about(pivot, Transform::scale_matrix(factors))?;
        self.apply(&m)
    }

    /// Rotate by Euler angles (Y then X then Z composition) around `pivot`
    pub fn rotate_about(&mut self, angles: &Vec3, pivot: &Vector) -> Result<()> {
        let m = Self::about(pivot, Transform::rotation_matrix(angles)?)?;
        self.apply(&m)
    }

    /// Conjugate `inner` so it acts around `pivot`: T(p) * inner * T(-p)
    fn about(pivot: &Vector, inner: Matrix) -> Result<Matrix> {
        let p = pivot.xyz();
        let to = Transform::translation_matrix(&p);
        let back = Transform::translation_matrix(&-p);
        to.try_mul(&inner)?.try_mul(&back)
    }
}
