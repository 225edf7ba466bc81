/// Per-frame transform, backface culling and screen bounds
///
/// Visibility convention: the viewer looks down the -z axis, so a polygon is
/// front facing when its transformed normal has a positive z component. The
/// camera's view matrix is not part of this test.
///
/// Normals are promoted with w = 1 like points and go through the full model
/// matrix, so the object's `origin.z` is added to every normal's z. Once
/// `|origin.z| >= 1` that offset decides visibility on its own and flipping a
/// normal no longer toggles it.
use log::{debug, trace};
use std::collections::HashMap;

use crate::error::{GeometryError, Result};
use crate::geometry::{Color, Mesh};
use crate::matrix::Matrix;
use crate::object::{ObjectId, ObjectKind, SceneObject};
use crate::registry::Registry;

/// Screen-space axis-aligned box of one polygon
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl Bounds {
    /// Stored for polygons that failed the facing test
    pub const CULLED: Bounds = Bounds {
        min_x: -1.0,
        max_x: -1.0,
        min_y: -1.0,
        max_y: -1.0,
    };

    pub fn is_culled(&self) -> bool {
        *self == Self::CULLED
    }

    /// `(min_x, max_x, min_y, max_y)`
    pub fn as_tuple(&self) -> (f32, f32, f32, f32) {
        (self.min_x, self.max_x, self.min_y, self.max_y)
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        !self.is_culled() && x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    fn of_face(face: &[usize], points: &[(f32, f32)]) -> Bounds {
        let mut bounds = Bounds {
            min_x: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            min_y: f32::INFINITY,
            max_y: f32::NEG_INFINITY,
        };
        for &index in face {
            let (x, y) = points[index - 1];
            bounds.min_x = bounds.min_x.min(x);
            bounds.max_x = bounds.max_x.max(x);
            bounds.min_y = bounds.min_y.min(y);
            bounds.max_y = bounds.max_y.max(y);
        }
        bounds
    }
}

/// Output of one object for one frame.
///
/// `points` and `colors` follow the vertex order; `visible_faces` and
/// `bounds` follow the polygon table's flattened face order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectFrame {
    pub points: Vec<(f32, f32)>,
    pub colors: Vec<Color>,
    pub visible_faces: Vec<bool>,
    pub bounds: Vec<Bounds>,
}

impl ObjectFrame {
    fn clear(&mut self) {
        self.points.clear();
        self.colors.clear();
        self.visible_faces.clear();
        self.bounds.clear();
    }

    pub fn visible_face_count(&self) -> usize {
        self.visible_faces.iter().filter(|&&v| v).count()
    }

    /// First visible face whose screen box contains `(x, y)`
    pub fn hit_test(&self, x: f32, y: f32) -> Option<usize> {
        self.bounds.iter().position(|b| b.contains(x, y))
    }
}

/// Transform a mesh with `model` and write the result into `out`.
///
/// `out` is cleared first so its allocations are reused across frames. The
/// mesh itself is left untouched.
pub fn compute_mesh_frame(mesh: &Mesh, model: &Matrix, out: &mut ObjectFrame) -> Result<()> {
    if model.shape() != (4, 4) {
        return Err(GeometryError::Shape {
            op: "compute_mesh_frame",
            rows: model.rows(),
            cols: model.cols(),
        });
    }
    let transformed = model.try_mul(mesh.vertices().positions())?;
    let count = transformed.cols();
    let coords = transformed.as_slice();

    out.clear();
    out.points
        .extend((0..count).map(|c| (coords[c] as f32, coords[count + c] as f32)));
    out.colors.extend_from_slice(mesh.vertices().colors());

    for (_, group) in mesh.polygons().groups() {
        let normals = model.try_mul(group.normals())?;
        let faces = normals.cols();
        let z_row = &normals.as_slice()[2 * faces..3 * faces];

        for (face, &nz) in group.faces().iter().zip(z_row) {
            let visible = nz > 0.0;
            out.visible_faces.push(visible);
            out.bounds.push(if visible {
                Bounds::of_face(face, &out.points)
            } else {
                Bounds::CULLED
            });
        }
    }
    Ok(())
}

/// Compute the frame output of a single object, if it is a mesh
pub fn compute_object_frame(object: &SceneObject, out: &mut ObjectFrame) -> Result<bool> {
    match object.kind() {
        ObjectKind::Mesh(mesh) => {
            compute_mesh_frame(mesh, &object.model_matrix()?, out)?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Counters for one `Pipeline::update` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub recomputed: usize,
    pub culled_faces: usize,
    pub dropped: usize,
}

/// Poll-driven per-frame driver.
///
/// Holds one reusable output buffer per visible mesh. Each `update` recomputes
/// only dirty meshes (or meshes without output yet) and clears their flag.
#[derive(Debug, Default)]
pub struct Pipeline {
    frames: HashMap<ObjectId, ObjectFrame>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, registry: &mut Registry) -> Result<FrameStats> {
        let mut stats = FrameStats::default();

        let before = self.frames.len();
        self.frames.retain(|id, _| {
            registry
                .get(*id)
                .map(|object| object.is_visible())
                .unwrap_or(false)
        });
        stats.dropped = before - self.frames.len();

        for object in registry.iter_mut() {
            let Some(id) = object.id() else {
                continue;
            };
            let is_mesh = object.as_mesh().is_some();
            let stale = object.is_dirty() || (is_mesh && object.is_visible() && !self.frames.contains_key(&id));
            if !stale {
                continue;
            }

            if is_mesh && object.is_visible() {
                let frame = self.frames.entry(id).or_default();
                if let Err(err) = compute_object_frame(object, frame) {
                    self.frames.remove(&id);
                    return Err(err);
                }
                stats.recomputed += 1;
                stats.culled_faces += frame.visible_faces.len() - frame.visible_face_count();
                debug!(
                    "recomputed '{}' ({id}): {} points, {}/{} faces visible",
                    object.name(),
                    frame.points.len(),
                    frame.visible_face_count(),
                    frame.visible_faces.len()
                );
            }
            object.clear_dirty();
        }

        trace!(
            "frame: {} recomputed, {} culled faces, {} dropped",
            stats.recomputed,
            stats.culled_faces,
            stats.dropped
        );
        Ok(stats)
    }

    pub fn frame(&self, id: ObjectId) -> Option<&ObjectFrame> {
        self.frames.get(&id)
    }

    pub fn frames(&self) -> impl Iterator<Item = (ObjectId, &ObjectFrame)> {
        self.frames.iter().map(|(id, frame)| (*id, frame))
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
