/// Camera state: accumulated view transforms and a cached projection matrix
use nalgebra::Matrix4;

use crate::error::{GeometryError, Result};
use crate::matrix::Matrix;
use crate::transform::{Transform, Vec3};

/// Scale applied to the viewport size to get the orthographic box extents
pub const ORTHO_SCALE: f64 = 0.01;

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionMode {
    Orthographic,
    #[default]
    Perspective,
}

/// Camera configuration for 3D rendering.
///
/// View rotation and translation are accumulated from the owning object's
/// transform changes; the projection is rebuilt whenever a setter succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    fov_y: f64,
    width: f64,
    height: f64,
    near: f64,
    far: f64,
    mode: ProjectionMode,
    view_rotation: Matrix,
    view_translation: Matrix,
    projection: Matrix,
}

impl Camera {
    /// A 45 degree perspective camera for a `width x height` viewport
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::with_params(
            std::f64::consts::FRAC_PI_4,
            width as f64,
            height as f64,
            0.1,
            100.0,
            ProjectionMode::Perspective,
        )
    }

    pub fn with_params(
        fov_y: f64,
        width: f64,
        height: f64,
        near: f64,
        far: f64,
        mode: ProjectionMode,
    ) -> Result<Self> {
        validate_fov(fov_y)?;
        validate_positive("width", width)?;
        validate_positive("height", height)?;
        validate_clip(near, far)?;

        let identity = Matrix::identity_of(4)?;
        let mut camera = Self {
            fov_y,
            width,
            height,
            near,
            far,
            mode,
            view_rotation: identity.clone(),
            view_translation: identity.clone(),
            projection: identity,
        };
        camera.recompute_projection();
        Ok(camera)
    }

    pub fn fov_y(&self) -> f64 {
        self.fov_y
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }

    pub fn near(&self) -> f64 {
        self.near
    }

    pub fn far(&self) -> f64 {
        self.far
    }

    pub fn mode(&self) -> ProjectionMode {
        self.mode
    }

    /// Vertical field of view in radians, strictly between 0 and pi
    pub fn set_fov_y(&mut self, fov_y: f64) -> Result<()> {
        validate_fov(fov_y)?;
        self.fov_y = fov_y;
        self.recompute_projection();
        Ok(())
    }

    pub fn set_width(&mut self, width: f64) -> Result<()> {
        validate_positive("width", width)?;
        self.width = width;
        self.recompute_projection();
        Ok(())
    }

    pub fn set_height(&mut self, height: f64) -> Result<()> {
        validate_positive("height", height)?;
        self.height = height;
        self.recompute_projection();
        Ok(())
    }

    pub fn set_near(&mut self, near: f64) -> Result<()> {
        validate_clip(near, self.far)?;
        self.near = near;
        self.recompute_projection();
        Ok(())
    }

    pub fn set_far(&mut self, far: f64) -> Result<()> {
        validate_clip(self.near, far)?;
        self.far = far;
        self.recompute_projection();
        Ok(())
    }

    pub fn set_mode(&mut self, mode: ProjectionMode) {
        self.mode = mode;
        self.recompute_projection();
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> &Matrix {
        &self.projection
    }

    fn recompute_projection(&mut self) {
        let (near, far) = (self.near, self.far);
        let m = match self.mode {
            ProjectionMode::Perspective => {
                let f = 1.0 / (self.fov_y / 2.0).tan();
                Matrix4::new(
                    f / self.aspect(), 0.0, 0.0, 0.0, //
                    0.0, f, 0.0, 0.0, //
                    0.0, 0.0, (far + near) / (near - far), 2.0 * far * near / (near - far), //
                    0.0, 0.0, -1.0, 0.0,
                )
            }
            ProjectionMode::Orthographic => {
                let box_width = self.width * ORTHO_SCALE;
                let box_height = self.height * ORTHO_SCALE;
                Matrix4::new(
                    2.0 / box_width, 0.0, 0.0, 0.0, //
                    0.0, 2.0 / box_height, 0.0, 0.0, //
                    0.0, 0.0, -2.0 / (far - near), -(far + near) / (far - near), //
                    0.0, 0.0, 0.0, 1.0,
                )
            }
        };
        self.projection = Matrix::from(m);
    }

    /// Fold an origin delta into the accumulated view translation
    pub fn translation_changed(&mut self, delta: &Vec3) -> Result<()> {
        // T(d) * T(a) == T(a + d)
        self.view_translation = Transform::translation_matrix(delta).try_mul(&self.view_translation)?;
        Ok(())
    }

    /// Rebuild the view rotation from the owner's current Euler angles
    pub fn rotation_changed(&mut self, rotation: &Vec3) -> Result<()> {
        self.view_rotation = Transform::rotation_matrix(rotation)?;
        Ok(())
    }

    pub fn view_rotation(&self) -> &Matrix {
        &self.view_rotation
    }

    pub fn view_translation(&self) -> &Matrix {
        &self.view_translation
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Result<Matrix> {
        self.view_rotation.try_mul(&self.view_translation)
    }

    /// Project a local-space point to screen space through `projection * view * model`.
    ///
    /// Returns `None` when the point lands on the w = 0 plane or outside the
    /// normalized device square. The mesh pipeline does not use this path.
    pub fn project_to_screen(
        &self,
        point: &Vec3,
        model_matrix: &Matrix,
        width: u32,
        height: u32,
    ) -> Result<Option<(f32, f32, f32)>> {
        let mvp = Transform::mvp_matrix(model_matrix, &self.view_matrix()?, &self.projection)?;
        let clip = mvp.try_mul(&Matrix::from_column(&[point.x, point.y, point.z, 1.0])?)?;
        let clip = clip.as_slice();

        // Prevent division by near-zero w
        if clip[3].abs() < 1e-9 {
            return Ok(None);
        }

        let ndc_x = clip[0] / clip[3];
        let ndc_y = clip[1] / clip[3];
        let depth = clip[2] / clip[3];

        if !(-1.0..=1.0).contains(&ndc_x) || !(-1.0..=1.0).contains(&ndc_y) {
            return Ok(None);
        }

        let screen_x = (ndc_x + 1.0) * 0.5 * width as f64;
        let screen_y = (1.0 - ndc_y) * 0.5 * height as f64;

        Ok(Some((screen_x as f32, screen_y as f32, depth as f32)))
    }
}

fn validate_positive(name: &str, value: f64) -> Result<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(GeometryError::Argument(format!(
            "{name} must be positive, got {value}"
        )));
    }
    Ok(())
}

fn validate_fov(fov_y: f64) -> Result<()> {
    if !(fov_y > 0.0 && fov_y < std::f64::consts::PI) {
        return Err(GeometryError::Argument(format!(
            "fov_y must lie in (0, pi), got {fov_y}"
        )));
    }
    Ok(())
}

fn validate_clip(near: f64, far: f64) -> Result<()> {
    validate_positive("near", near)?;
    validate_positive("far", far)?;
    if near >= far {
        return Err(GeometryError::Argument(format!(
            "near ({near}) must be less than far ({far})"
        )));
    }
    Ok(())
}
