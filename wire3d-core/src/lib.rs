/// wire3d Core Library - software geometry pipeline
///
/// This library provides the dense matrix engine, the scene entity model, the
/// object registry and the per-frame transform/culling pipeline. It never
/// draws anything; hosts consume the per-object frame output.

pub mod config;
pub mod error;
pub mod geometry;
pub mod homogeneous;
pub mod matrix;
pub mod object;
pub mod pipeline;
pub mod projection;
pub mod registry;
pub mod transform;
pub mod vector;

// Re-export commonly used types
pub use config::{CameraConfig, ConfigError, DisplayConfig, SceneConfig};
pub use error::{GeometryError, Result};
pub use geometry::{Color, Material, Mesh, MeshData, PolygonTable, Texture, VertexBuffer};
pub use matrix::Matrix;
pub use object::{DirectionalLight, ObjectId, ObjectKind, PointLight, SceneObject};
pub use pipeline::{Bounds, FrameStats, ObjectFrame, Pipeline};
pub use projection::{Camera, ProjectionMode};
pub use registry::Registry;
pub use transform::{Transform, Vec3};
pub use vector::Vector;
