/// Mesh data model: vertex buffers, polygon tables, materials and textures
use log::warn;
use std::collections::{BTreeMap, HashMap};

use crate::error::{GeometryError, Result};
use crate::homogeneous;
use crate::matrix::Matrix;
use crate::transform::Vec3;

/// Material name used when a loader supplies faces without one
pub const DEFAULT_MATERIAL: &str = "";

/// An 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Homogeneous vertex positions (4xN, one column per vertex) with parallel
/// per-vertex colors and optional texture coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexBuffer {
    positions: Matrix,
    colors: Vec<Color>,
    uvs: Option<Vec<[f64; 2]>>,
}

impl VertexBuffer {
    /// Build from 3D points; every vertex gets `w = 1`
    pub fn from_points(points: &[[f64; 3]]) -> Result<Self> {
        Self::from_homogeneous(homogeneous::promote_points(points)?)
    }

    /// Build from a 2xN or 3xN coordinate matrix
    pub fn from_coords(coords: &Matrix) -> Result<Self> {
        Self::from_homogeneous(homogeneous::promote(coords)?)
    }

    fn from_homogeneous(positions: Matrix) -> Result<Self> {
        let count = positions.cols();
        Ok(Self {
            positions,
            colors: vec![Color::default(); count],
            uvs: None,
        })
    }

    pub fn len(&self) -> usize {
        self.positions.cols()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The 4xN homogeneous position matrix
    pub fn positions(&self) -> &Matrix {
        &self.positions
    }

    /// Local-space position of a vertex by 0-based index
    pub fn position(&self, index: usize) -> Result<Vec3> {
        let column = self.positions.column(index)?;
        Ok(Vec3::new(column[0], column[1], column[2]))
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Replace the per-vertex colors. The array must be parallel to the vertices.
    pub fn set_colors(&mut self, colors: Vec<Color>) -> Result<()> {
        if colors.len() != self.len() {
            return Err(GeometryError::MalformedVertexData(format!(
                "{} colors supplied for {} vertices",
                colors.len(),
                self.len()
            )));
        }
        self.colors = colors;
        Ok(())
    }

    pub fn uvs(&self) -> Option<&[[f64; 2]]> {
        self.uvs.as_deref()
    }

    pub fn set_uvs(&mut self, uvs: Vec<[f64; 2]>) -> Result<()> {
        if uvs.len() != self.len() {
            return Err(GeometryError::MalformedVertexData(format!(
                "{} texture coordinates supplied for {} vertices",
                uvs.len(),
                self.len()
            )));
        }
        self.uvs = Some(uvs);
        Ok(())
    }
}

/// Faces sharing one material, with one homogeneous normal column per face
#[derive(Debug, Clone, PartialEq)]
pub struct FaceGroup {
    faces: Vec<Vec<usize>>,
    normals: Matrix,
}

impl FaceGroup {
    /// Vertex index lists, 1-based
    pub fn faces(&self) -> &[Vec<usize>] {
        &self.faces
    }

    /// 4xF normal matrix, promoted with the same rule as vertex positions
    pub fn normals(&self) -> &Matrix {
        &self.normals
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

/// Faces keyed by material name. Iteration follows key order, which defines
/// the flattened face order used by the pipeline output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonTable {
    groups: BTreeMap<String, FaceGroup>,
}

impl PolygonTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) the faces of one material.
    ///
    /// Indices are 1-based and must address a vertex in `vertices`; exactly
    /// one normal must be supplied per face.
    pub fn insert_group(
        &mut self,
        material: impl Into<String>,
        faces: Vec<Vec<usize>>,
        normals: &[[f64; 3]],
        vertices: &VertexBuffer,
    ) -> Result<()> {
        let material = material.into();
        validate_faces(&material, &faces, vertices.len())?;
        if normals.len() != faces.len() {
            return Err(GeometryError::MalformedVertexData(format!(
                "material '{material}' has {} faces but {} normals",
                faces.len(),
                normals.len()
            )));
        }
        let normals = homogeneous::promote_points(normals)?;
        self.groups.insert(material, FaceGroup { faces, normals });
        Ok(())
    }

    /// Insert faces whose normals are derived from their first three vertices
    pub fn insert_group_with_computed_normals(
        &mut self,
        material: impl Into<String>,
        faces: Vec<Vec<usize>>,
        vertices: &VertexBuffer,
    ) -> Result<()> {
        let material = material.into();
        validate_faces(&material, &faces, vertices.len())?;
        let normals = faces
            .iter()
            .map(|face| face_normal(face, vertices))
            .collect::<Result<Vec<_>>>()?;
        self.insert_group(material, faces, &normals, vertices)
    }

    pub fn group(&self, material: &str) -> Option<&FaceGroup> {
        self.groups.get(material)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &FaceGroup)> {
        self.groups.iter().map(|(name, group)| (name.as_str(), group))
    }

    /// Every face in flattened order
    pub fn faces(&self) -> impl Iterator<Item = &[usize]> {
        self.groups
            .values()
            .flat_map(|group| group.faces.iter().map(Vec::as_slice))
    }

    pub fn face_count(&self) -> usize {
        self.groups.values().map(FaceGroup::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.face_count() == 0
    }
}

fn validate_faces(material: &str, faces: &[Vec<usize>], vertex_count: usize) -> Result<()> {
    if faces.is_empty() {
        return Err(GeometryError::MalformedVertexData(format!(
            "material '{material}' has no faces"
        )));
    }
    for (i, face) in faces.iter().enumerate() {
        if face.is_empty() {
            return Err(GeometryError::MalformedVertexData(format!(
                "face {i} of material '{material}' has no vertices"
            )));
        }
        if let Some(&bad) = face.iter().find(|&&index| index == 0 || index > vertex_count) {
            return Err(GeometryError::MalformedVertexData(format!(
                "face {i} of material '{material}' references vertex {bad}, valid range is 1..={vertex_count}"
            )));
        }
    }
    Ok(())
}

/// Calculate the face normal from the face's first three vertices
fn face_normal(face: &[usize], vertices: &VertexBuffer) -> Result<[f64; 3]> {
    if face.len() < 3 {
        return Err(GeometryError::MalformedVertexData(format!(
            "a normal needs at least 3 vertices, face has {}",
            face.len()
        )));
    }
    let v0 = vertices.position(face[0] - 1)?;
    let v1 = vertices.position(face[1] - 1)?;
    let v2 = vertices.position(face[2] - 1)?;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    match edge1.cross(&edge2).try_normalize(f64::EPSILON) {
        Some(n) => Ok([n.x, n.y, n.z]),
        None => {
            warn!("degenerate face {face:?}, using a zero normal");
            Ok([0.0, 0.0, 0.0])
        }
    }
}

/// Surface description handed over by a material loader
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Material {
    pub texture_path: Option<String>,
    pub illum: u32,
    pub specular_exponent: f64,
    pub diffuse: [f64; 3],
    pub specular: [f64; 3],
    pub ambient: [f64; 3],
}

/// Decoded RGBA image. The core stores the bytes and never interprets them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Texture {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(GeometryError::Argument(format!(
                "texture of {width}x{height} needs {expected} RGBA bytes, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Plain numeric mesh description as produced by an external loader
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<[f64; 3]>,
    /// Material name to 1-based vertex index lists
    pub faces: BTreeMap<String, Vec<Vec<usize>>>,
    /// Material name to one normal per face. Missing entries are computed.
    pub normals: BTreeMap<String, Vec<[f64; 3]>>,
    pub materials: BTreeMap<String, Material>,
}

impl MeshData {
    /// A single quad in the z = 0 plane facing +z
    pub fn rectangle(min: [f64; 2], max: [f64; 2]) -> Self {
        let mut data = Self {
            vertices: vec![
                [min[0], min[1], 0.0],
                [max[0], min[1], 0.0],
                [max[0], max[1], 0.0],
                [min[0], max[1], 0.0],
            ],
            ..Default::default()
        };
        data.faces
            .insert(DEFAULT_MATERIAL.to_string(), vec![vec![1, 2, 3, 4]]);
        data.normals
            .insert(DEFAULT_MATERIAL.to_string(), vec![[0.0, 0.0, 1.0]]);
        data
    }

    /// A square of side `size` centered on the local origin
    pub fn square(size: f64) -> Self {
        let half = size / 2.0;
        Self::rectangle([-half, -half], [half, half])
    }

    /// Create a simple cube mesh with outward-facing quads
    pub fn cube(size: f64) -> Self {
        let half = size / 2.0;
        let mut data = Self {
            vertices: vec![
                [-half, -half, -half],
                [half, -half, -half],
                [half, half, -half],
                [-half, half, -half],
                [-half, -half, half],
                [half, -half, half],
                [half, half, half],
                [-half, half, half],
            ],
            ..Default::default()
        };
        let faces = vec![
            vec![5, 6, 7, 8], // front
            vec![2, 1, 4, 3], // back
            vec![8, 7, 3, 4], // top
            vec![1, 2, 6, 5], // bottom
            vec![6, 2, 3, 7], // right
            vec![1, 5, 8, 4], // left
        ];
        let normals = vec![
            [0.0, 0.0, 1.0],
            [0.0, 0.0, -1.0],
            [0.0, 1.0, 0.0],
            [0.0, -1.0, 0.0],
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
        ];
        data.faces.insert(DEFAULT_MATERIAL.to_string(), faces);
        data.normals.insert(DEFAULT_MATERIAL.to_string(), normals);
        data
    }
}

/// Canonical local-space mesh owned by one scene object. The pipeline reads it
/// but never writes screen-space results back into it.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    vertices: VertexBuffer,
    polygons: PolygonTable,
    materials: BTreeMap<String, Material>,
    textures: HashMap<String, Texture>,
}

impl Mesh {
    /// Validate and convert loader output into a mesh
    pub fn from_data(data: &MeshData) -> Result<Self> {
        let vertices = VertexBuffer::from_points(&data.vertices)?;
        let mut polygons = PolygonTable::new();
        for (material, faces) in &data.faces {
            match data.normals.get(material) {
                Some(normals) => {
                    polygons.insert_group(material.as_str(), faces.clone(), normals, &vertices)?
                }
                None => polygons.insert_group_with_computed_normals(
                    material.as_str(),
                    faces.clone(),
                    &vertices,
                )?,
            }
        }
        Ok(Self {
            vertices,
            polygons,
            materials: data.materials.clone(),
            textures: HashMap::new(),
        })
    }

    pub fn vertices(&self) -> &VertexBuffer {
        &self.vertices
    }

    pub fn polygons(&self) -> &PolygonTable {
        &self.polygons
    }

    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    pub fn set_vertex_colors(&mut self, colors: Vec<Color>) -> Result<()> {
        self.vertices.set_colors(colors)
    }

    /// Store a decoded texture under its file path, replacing any previous one
    pub fn add_texture(&mut self, path: impl Into<String>, texture: Texture) {
        self.textures.insert(path.into(), texture);
    }

    pub fn texture(&self, path: &str) -> Option<&Texture> {
        self.textures.get(path)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_buffer_promotes_points() {
        let buffer = VertexBuffer::from_points(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.positions().shape(), (4, 2));
        assert_eq!(buffer.positions().column(1).unwrap(), vec![4.0, 5.0, 6.0, 1.0]);
        assert_eq!(buffer.colors(), &[Color::WHITE, Color::WHITE]);
        assert!(buffer.uvs().is_none());
    }

    #[test]
    fn test_vertex_buffer_from_2d_coords() {
        let coords = Matrix::from_columns(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        let buffer = VertexBuffer::from_coords(&coords).unwrap();
        assert_eq!(buffer.positions().column(0).unwrap(), vec![1.0, 2.0, 0.0, 1.0]);

        let bad = Matrix::new(5, 2).unwrap();
        assert!(matches!(
            VertexBuffer::from_coords(&bad),
            Err(GeometryError::MalformedVertexData(_))
        ));
    }

    #[test]
    fn test_color_and_uv_length_must_match() {
        let mut buffer = VertexBuffer::from_points(&[[0.0; 3], [1.0; 3]]).unwrap();
        assert!(matches!(
            buffer.set_colors(vec![Color::BLACK]),
            Err(GeometryError::MalformedVertexData(_))
        ));
        assert_eq!(buffer.colors()[0], Color::WHITE);
        buffer.set_colors(vec![Color::BLACK, Color::rgb(255, 0, 0)]).unwrap();
        assert_eq!(buffer.colors()[1], Color::rgb(255, 0, 0));

        assert!(buffer.set_uvs(vec![[0.0, 0.0]]).is_err());
        buffer.set_uvs(vec![[0.0, 0.0], [1.0, 1.0]]).unwrap();
        assert_eq!(buffer.uvs().unwrap().len(), 2);
    }

    #[test]
    fn test_face_indices_are_validated() {
        let vertices = VertexBuffer::from_points(&[[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]).unwrap();
        let mut table = PolygonTable::new();
        let normal = [[0.0, 0.0, 1.0]];

        assert!(table.insert_group("", vec![vec![0, 1, 2]], &normal, &vertices).is_err());
        assert!(table.insert_group("", vec![vec![1, 2, 4]], &normal, &vertices).is_err());
        assert!(table.insert_group("", vec![vec![]], &normal, &vertices).is_err());
        assert!(table.insert_group("", vec![vec![1, 2, 3]], &[], &vertices).is_err());
        assert!(table.is_empty());

        table.insert_group("", vec![vec![1, 2, 3]], &normal, &vertices).unwrap();
        assert_eq!(table.face_count(), 1);
        let group = table.group("").unwrap();
        assert_eq!(group.normals().column(0).unwrap(), vec![0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_flattened_face_order_follows_material_names() {
        let vertices = VertexBuffer::from_points(&[[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]).unwrap();
        let mut table = PolygonTable::new();
        table
            .insert_group("steel", vec![vec![3, 2, 1]], &[[0.0, 0.0, -1.0]], &vertices)
            .unwrap();
        table
            .insert_group(DEFAULT_MATERIAL, vec![vec![1, 2, 3]], &[[0.0, 0.0, 1.0]], &vertices)
            .unwrap();
        let faces: Vec<&[usize]> = table.faces().collect();
        assert_eq!(faces, vec![&[1usize, 2, 3][..], &[3usize, 2, 1][..]]);
    }

    #[test]
    fn test_computed_normals_match_cube_normals() {
        let mut data = MeshData::cube(2.0);
        let supplied = data.normals.remove(DEFAULT_MATERIAL).unwrap();
        let mesh = Mesh::from_data(&data).unwrap();
        let group = mesh.polygons().group(DEFAULT_MATERIAL).unwrap();
        for (i, expected) in supplied.iter().enumerate() {
            let column = group.normals().column(i).unwrap();
            for axis in 0..3 {
                assert!((column[axis] - expected[axis]).abs() < 1e-12, "face {i}");
            }
        }
    }

    #[test]
    fn test_computed_normal_needs_three_vertices() {
        let vertices = VertexBuffer::from_points(&[[0.0; 3], [1.0, 0.0, 0.0]]).unwrap();
        let mut table = PolygonTable::new();
        assert!(matches!(
            table.insert_group_with_computed_normals("", vec![vec![1, 2]], &vertices),
            Err(GeometryError::MalformedVertexData(_))
        ));
    }

    #[test]
    fn test_texture_requires_rgba_length() {
        assert!(Texture::new(2, 2, vec![0; 15]).is_err());
        assert!(Texture::new(0, 2, vec![]).is_err());
        let texture = Texture::new(2, 2, vec![0; 16]).unwrap();

        let mut mesh = Mesh::from_data(&MeshData::square(1.0)).unwrap();
        mesh.add_texture("bricks.png", texture);
        assert_eq!(mesh.texture("bricks.png").unwrap().width(), 2);
        assert_eq!(mesh.texture_count(), 1);
    }

    #[test]
    fn test_mesh_from_data_rejects_empty_vertices() {
        assert!(Mesh::from_data(&MeshData::default()).is_err());
    }
}
