/// Elementary 4x4 transformation matrices and model-matrix composition
use nalgebra::{Matrix4, Vector3};

use crate::error::Result;
use crate::matrix::Matrix;

/// Three-component vector used for origins, scale factors and Euler angles
pub type Vec3 = Vector3<f64>;

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Diagonal scale matrix `(sx, sy, sz, 1)`
    pub fn scale_matrix(scale: &Vec3) -> Matrix {
        Matrix::from(Matrix4::new(
            scale.x, 0.0, 0.0, 0.0, //
            0.0, scale.y, 0.0, 0.0, //
            0.0, 0.0, scale.z, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ))
    }

    /// Right-handed rotation about the x axis
    pub fn rotation_x(angle: f64) -> Matrix {
        let (s, c) = angle.sin_cos();
        Matrix::from(Matrix4::new(
            1.0, 0.0, 0.0, 0.0, //
            0.0, c, -s, 0.0, //
            0.0, s, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ))
    }

    /// Right-handed rotation about the y axis
    pub fn rotation_y(angle: f64) -> Matrix {
        let (s, c) = angle.sin_cos();
        Matrix::from(Matrix4::new(
            c, 0.0, s, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            -s, 0.0, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ))
    }

    /// Right-handed rotation about the z axis
    pub fn rotation_z(angle: f64) -> Matrix {
        let (s, c) = angle.sin_cos();
        Matrix::from(Matrix4::new(
            c, -s, 0.0, 0.0, //
            s, c, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ))
    }

    /// Create a rotation matrix from Euler angles (radians).
    ///
    /// The composition order is fixed: `RotY * RotX * RotZ`, so a column
    /// vector is rotated about z first, then x, then y.
    pub fn rotation_matrix(rotation: &Vec3) -> Result<Matrix> {
        let ry = Self::rotation_y(rotation.y);
        let rx = Self::rotation_x(rotation.x);
        let rz = Self::rotation_z(rotation.z);
        ry.try_mul(&rx)?.try_mul(&rz)
    }

    /// Identity with `(ox, oy, oz)` in the last column
    pub fn translation_matrix(origin: &Vec3) -> Matrix {
        Matrix::from(Matrix4::new(
            1.0, 0.0, 0.0, origin.x, //
            0.0, 1.0, 0.0, origin.y, //
            0.0, 0.0, 1.0, origin.z, //
            0.0, 0.0, 0.0, 1.0,
        ))
    }

    /// Compose `Translate * Rotate * Scale`.
    ///
    /// Column vectors are scaled first, then rotated, then translated.
    pub fn model_matrix(scale: &Vec3, rotation: &Vec3, origin: &Vec3) -> Result<Matrix> {
        let translate = Self::translation_matrix(origin);
        let rotate = Self::rotation_matrix(rotation)?;
        let scale = Self::scale_matrix(scale);
        translate.try_mul(&rotate)?.try_mul(&scale)
    }

    /// Create a model-view-projection matrix
    pub fn mvp_matrix(model: &Matrix, view: &Matrix, projection: &Matrix) -> Result<Matrix> {
        projection.try_mul(view)?.try_mul(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_identity_model() {
        let model = Transform::model_matrix(
            &Vec3::new(1.0, 1.0, 1.0),
            &Vec3::zeros(),
            &Vec3::zeros(),
        )
        .unwrap();
        assert_abs_diff_eq!(model, Matrix::identity_of(4).unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn test_elementary_rotations_match_nalgebra() {
        for angle in [0.3, -1.1, PI] {
            let expected_x = Matrix::from(Matrix4::new_rotation(Vector3::new(angle, 0.0, 0.0)));
            let expected_y = Matrix::from(Matrix4::new_rotation(Vector3::new(0.0, angle, 0.0)));
            let expected_z = Matrix::from(Matrix4::new_rotation(Vector3::new(0.0, 0.0, angle)));
            assert_abs_diff_eq!(Transform::rotation_x(angle), expected_x, epsilon = 1e-12);
            assert_abs_diff_eq!(Transform::rotation_y(angle), expected_y, epsilon = 1e-12);
            assert_abs_diff_eq!(Transform::rotation_z(angle), expected_z, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rotation_order_is_y_x_z() {
        let angles = Vec3::new(0.4, 0.7, -0.2);
        let ry = Matrix4::new_rotation(Vector3::new(0.0, angles.y, 0.0));
        let rx = Matrix4::new_rotation(Vector3::new(angles.x, 0.0, 0.0));
        let rz = Matrix4::new_rotation(Vector3::new(0.0, 0.0, angles.z));
        let expected = Matrix::from(ry * rx * rz);
        let actual = Transform::rotation_matrix(&angles).unwrap();
        assert_abs_diff_eq!(actual, expected, epsilon = 1e-12);

        let reordered = Matrix::from(rz * ry * rx);
        assert!(!approx::abs_diff_eq!(actual, reordered, epsilon = 1e-6));
    }

    #[test]
    fn test_model_applies_scale_then_rotate_then_translate() {
        let model = Transform::model_matrix(
            &Vec3::new(2.0, 1.0, 1.0),
            &Vec3::new(0.0, 0.0, FRAC_PI_2),
            &Vec3::new(10.0, 0.0, 0.0),
        )
        .unwrap();
        let point = Matrix::from_column(&[1.0, 0.0, 0.0, 1.0]).unwrap();
        let moved = model.try_mul(&point).unwrap();
        // (1,0,0) -> scaled (2,0,0) -> rotated (0,2,0) -> translated (10,2,0)
        assert_abs_diff_eq!(moved.get(0, 0).unwrap(), 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(moved.get(1, 0).unwrap(), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(moved.get(2, 0).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_translation_matrix_last_column() {
        let t = Transform::translation_matrix(&Vec3::new(200.0, -100.0, 5.0));
        assert_eq!(t.column(3).unwrap(), vec![200.0, -100.0, 5.0, 1.0]);
    }

    #[test]
    fn test_mvp_order() {
        let model = Transform::translation_matrix(&Vec3::new(1.0, 0.0, 0.0));
        let view = Transform::scale_matrix(&Vec3::new(2.0, 2.0, 2.0));
        let projection = Matrix::identity_of(4).unwrap();
        let mvp = Transform::mvp_matrix(&model, &view, &projection).unwrap();
        // translate first, then scale: x = (0 + 1) * 2
        let p = mvp.try_mul(&Matrix::from_column(&[0.0, 0.0, 0.0, 1.0]).unwrap()).unwrap();
        assert_eq!(p.get(0, 0).unwrap(), 2.0);
    }
}
