/// Scene entities: one object type carrying transform state and a tagged payload
use log::trace;
use std::fmt;

use crate::error::{GeometryError, Result};
use crate::geometry::{Color, Mesh};
use crate::matrix::Matrix;
use crate::projection::Camera;
use crate::transform::{Transform, Vec3};

/// Stable identifier handed out by the registry. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Light pointing along a fixed direction. Carried as scene data only.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: Color,
    pub intensity: f64,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(0.0, 0.0, -1.0),
            color: Color::WHITE,
            intensity: 1.0,
        }
    }
}

/// Light radiating from the owning object's origin
#[derive(Debug, Clone, PartialEq)]
pub struct PointLight {
    pub color: Color,
    pub intensity: f64,
    pub range: f64,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 1.0,
            range: 10.0,
        }
    }
}

/// What an object is, beyond its transform
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    Mesh(Mesh),
    Camera(Camera),
    DirectionalLight(DirectionalLight),
    PointLight(PointLight),
}

impl ObjectKind {
    pub fn name(&self) -> &'static str {
        match self {
            ObjectKind::Mesh(_) => "mesh",
            ObjectKind::Camera(_) => "camera",
            ObjectKind::DirectionalLight(_) => "directional light",
            ObjectKind::PointLight(_) => "point light",
        }
    }
}

/// A scene entity.
///
/// Every mutator sets `dirty`; the pipeline clears it after recomputing the
/// object's frame output. Camera objects forward origin and rotation changes
/// to their view matrices.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    id: Option<ObjectId>,
    name: String,
    visible: bool,
    origin: Vec3,
    scale: Vec3,
    rotation: Vec3,
    dirty: bool,
    kind: ObjectKind,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            id: None,
            name: name.into(),
            visible: true,
            origin: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            rotation: Vec3::zeros(),
            dirty: true,
            kind,
        }
    }

    pub fn mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self::new(name, ObjectKind::Mesh(mesh))
    }

    pub fn camera(name: impl Into<String>, camera: Camera) -> Self {
        Self::new(name, ObjectKind::Camera(camera))
    }

    pub fn directional_light(name: impl Into<String>, light: DirectionalLight) -> Self {
        Self::new(name, ObjectKind::DirectionalLight(light))
    }

    pub fn point_light(name: impl Into<String>, light: PointLight) -> Self {
        Self::new(name, ObjectKind::PointLight(light))
    }

    /// Registry-assigned id; `None` until the object is added
    pub fn id(&self) -> Option<ObjectId> {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            self.visible = visible;
            self.dirty = true;
        }
    }

    pub fn origin(&self) -> &Vec3 {
        &self.origin
    }

    pub fn scale(&self) -> &Vec3 {
        &self.scale
    }

    pub fn rotation(&self) -> &Vec3 {
        &self.rotation
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    /// Move the origin by `delta`
    pub fn translate(&mut self, delta: &Vec3) -> Result<()> {
        validate_finite("translation", delta)?;
        if let ObjectKind::Camera(camera) = &mut self.kind {
            camera.translation_changed(delta)?;
        }
        self.origin += delta;
        self.dirty = true;
        trace!("{} '{}' translated to {:?}", self.kind.name(), self.name, self.origin);
        Ok(())
    }

    pub fn set_origin(&mut self, origin: &Vec3) -> Result<()> {
        validate_finite("origin", origin)?;
        let delta = origin - self.origin;
        self.translate(&delta)
    }

    /// Add `delta` (radians) to the Euler angles
    pub fn rotate(&mut self, delta: &Vec3) -> Result<()> {
        validate_finite("rotation", delta)?;
        self.set_rotation(&(self.rotation + delta))
    }

    pub fn set_rotation(&mut self, rotation: &Vec3) -> Result<()> {
        validate_finite("rotation", rotation)?;
        if let ObjectKind::Camera(camera) = &mut self.kind {
            camera.rotation_changed(rotation)?;
        }
        self.rotation = *rotation;
        self.dirty = true;
        Ok(())
    }

    pub fn set_scale(&mut self, scale: &Vec3) -> Result<()> {
        validate_finite("scale", scale)?;
        self.scale = *scale;
        self.dirty = true;
        Ok(())
    }

    /// Multiply the current scale component-wise
    pub fn scale_by(&mut self, factors: &Vec3) -> Result<()> {
        validate_finite("scale", factors)?;
        self.set_scale(&self.scale.component_mul(factors))
    }

    pub fn with_origin(mut self, origin: Vec3) -> Result<Self> {
        self.set_origin(&origin)?;
        Ok(self)
    }

    pub fn with_scale(mut self, scale: Vec3) -> Result<Self> {
        self.set_scale(&scale)?;
        Ok(self)
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Result<Self> {
        self.set_rotation(&rotation)?;
        Ok(self)
    }

    /// `Translate * Rotate * Scale` for the current state
    pub fn model_matrix(&self) -> Result<Matrix> {
        Transform::model_matrix(&self.scale, &self.rotation, &self.origin)
    }

    pub fn as_mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            ObjectKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    /// Mutable mesh access; marks the object dirty
    pub fn as_mesh_mut(&mut self) -> Option<&mut Mesh> {
        match &mut self.kind {
            ObjectKind::Mesh(mesh) => {
                self.dirty = true;
                Some(mesh)
            }
            _ => None,
        }
    }

    pub fn as_camera(&self) -> Option<&Camera> {
        match &self.kind {
            ObjectKind::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    /// Mutable camera access; marks the object dirty
    pub fn as_camera_mut(&mut self) -> Option<&mut Camera> {
        match &mut self.kind {
            ObjectKind::Camera(camera) => {
                self.dirty = true;
                Some(camera)
            }
            _ => None,
        }
    }

    pub fn as_directional_light(&self) -> Option<&DirectionalLight> {
        match &self.kind {
            ObjectKind::DirectionalLight(light) => Some(light),
            _ => None,
        }
    }

    pub fn as_point_light(&self) -> Option<&PointLight> {
        match &self.kind {
            ObjectKind::PointLight(light) => Some(light),
            _ => None,
        }
    }
}

fn validate_finite(what: &str, v: &Vec3) -> Result<()> {
    if v.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(GeometryError::Argument(format!("{what} must be finite, got {v:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MeshData;

    fn square() -> SceneObject {
        SceneObject::mesh("square", Mesh::from_data(&MeshData::square(2.0)).unwrap())
    }

    #[test]
    fn test_new_object_defaults() {
        let object = square();
        assert_eq!(object.id(), None);
        assert!(object.is_visible());
        assert!(object.is_dirty());
        assert_eq!(*object.scale(), Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(object.kind().name(), "mesh");
    }

    #[test]
    fn test_mutators_set_dirty() {
        let mut object = square();
        object.clear_dirty();
        object.translate(&Vec3::new(1.0, 0.0, 0.0)).unwrap();
        assert!(object.is_dirty());

        object.clear_dirty();
        object.rotate(&Vec3::new(0.0, 0.1, 0.0)).unwrap();
        assert!(object.is_dirty());

        object.clear_dirty();
        object.scale_by(&Vec3::new(2.0, 2.0, 2.0)).unwrap();
        assert!(object.is_dirty());
        assert_eq!(*object.scale(), Vec3::new(2.0, 2.0, 2.0));

        object.clear_dirty();
        object.set_visible(true);
        assert!(!object.is_dirty());
        object.set_visible(false);
        assert!(object.is_dirty());
    }

    #[test]
    fn test_translate_accumulates_and_set_origin_is_absolute() {
        let mut object = square();
        object.translate(&Vec3::new(1.0, 2.0, 3.0)).unwrap();
        object.translate(&Vec3::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(*object.origin(), Vec3::new(2.0, 4.0, 6.0));
        object.set_origin(&Vec3::new(-1.0, 0.0, 0.0)).unwrap();
        assert_eq!(*object.origin(), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_non_finite_input_is_rejected_without_mutation() {
        let mut object = square();
        object.clear_dirty();
        assert!(object.translate(&Vec3::new(f64::NAN, 0.0, 0.0)).is_err());
        assert!(object.set_scale(&Vec3::new(1.0, f64::INFINITY, 1.0)).is_err());
        assert_eq!(*object.origin(), Vec3::zeros());
        assert!(!object.is_dirty());
    }

    #[test]
    fn test_camera_object_forwards_view_changes() {
        let camera = Camera::new(800, 600).unwrap();
        let mut object = SceneObject::camera("main", camera);
        object.translate(&Vec3::new(0.0, 0.0, -5.0)).unwrap();
        object.set_origin(&Vec3::new(1.0, 0.0, -5.0)).unwrap();
        object.rotate(&Vec3::new(0.0, 0.5, 0.0)).unwrap();

        let camera = object.as_camera().unwrap();
        assert_eq!(
            camera.view_translation().column(3).unwrap(),
            vec![1.0, 0.0, -5.0, 1.0]
        );
        let expected = Transform::rotation_matrix(&Vec3::new(0.0, 0.5, 0.0)).unwrap();
        assert_eq!(camera.view_rotation(), &expected);
        assert!(object.as_mesh().is_none());
    }

    #[test]
    fn test_light_payloads() {
        let light = SceneObject::point_light("lamp", PointLight::default());
        assert_eq!(light.as_point_light().unwrap().range, 10.0);
        assert!(light.as_directional_light().is_none());
        let sun = SceneObject::directional_light("sun", DirectionalLight::default());
        assert_eq!(sun.kind().name(), "directional light");
    }
}
