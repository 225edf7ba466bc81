/// Owning arena for scene objects with id and name indexes
use log::{debug, warn};
use std::collections::HashMap;

use crate::error::{GeometryError, Result};
use crate::geometry::Mesh;
use crate::object::{ObjectId, SceneObject};
use crate::projection::Camera;

/// Owns every scene object.
///
/// Objects live contiguously in insertion order. `index_by_id` maps each live
/// id to its slot and `id_by_name` maps names to ids. Names are not unique: a
/// later object with the same name takes over the name entry.
#[derive(Debug, Default)]
pub struct Registry {
    objects: Vec<SceneObject>,
    index_by_id: HashMap<ObjectId, usize>,
    id_by_name: HashMap<String, ObjectId>,
    next_id: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `object` and return its freshly assigned id
    pub fn add(&mut self, mut object: SceneObject) -> ObjectId {
        let id = ObjectId::new(self.next_id);
        self.next_id += 1;
        object.assign_id(id);

        if let Some(previous) = self.id_by_name.insert(object.name().to_string(), id) {
            warn!(
                "object name '{}' already used by {previous}, now resolves to {id}",
                object.name()
            );
        }
        debug!("added {} '{}' as {id}", object.kind().name(), object.name());

        self.index_by_id.insert(id, self.objects.len());
        self.objects.push(object);
        id
    }

    fn index_of(&self, id: ObjectId) -> Result<usize> {
        self.index_by_id
            .get(&id)
            .copied()
            .ok_or_else(|| GeometryError::NotFound(format!("object {id}")))
    }

    /// Resolve a name to the id that currently owns it
    pub fn id_of(&self, name: &str) -> Result<ObjectId> {
        self.id_by_name
            .get(name)
            .copied()
            .ok_or_else(|| GeometryError::NotFound(format!("object named '{name}'")))
    }

    pub fn get(&self, id: ObjectId) -> Result<&SceneObject> {
        let index = self.index_of(id)?;
        Ok(&self.objects[index])
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Result<&mut SceneObject> {
        let index = self.index_of(id)?;
        Ok(&mut self.objects[index])
    }

    pub fn get_by_name(&self, name: &str) -> Result<&SceneObject> {
        self.get(self.id_of(name)?)
    }

    pub fn get_by_name_mut(&mut self, name: &str) -> Result<&mut SceneObject> {
        let id = self.id_of(name)?;
        self.get_mut(id)
    }

    pub fn mesh(&self, id: ObjectId) -> Result<&Mesh> {
        self.get(id)?
            .as_mesh()
            .ok_or_else(|| GeometryError::NotFound(format!("mesh {id}")))
    }

    pub fn mesh_mut(&mut self, id: ObjectId) -> Result<&mut Mesh> {
        self.get_mut(id)?
            .as_mesh_mut()
            .ok_or_else(|| GeometryError::NotFound(format!("mesh {id}")))
    }

    pub fn camera(&self, id: ObjectId) -> Result<&Camera> {
        self.get(id)?
            .as_camera()
            .ok_or_else(|| GeometryError::NotFound(format!("camera {id}")))
    }

    pub fn camera_mut(&mut self, id: ObjectId) -> Result<&mut Camera> {
        self.get_mut(id)?
            .as_camera_mut()
            .ok_or_else(|| GeometryError::NotFound(format!("camera {id}")))
    }

    /// Remove an object, shifting every later slot down by one
    pub fn remove(&mut self, id: ObjectId) -> Result<SceneObject> {
        let index = self.index_of(id)?;
        let object = self.objects.remove(index);

        self.index_by_id.remove(&id);
        if self.id_by_name.get(object.name()) == Some(&id) {
            self.id_by_name.remove(object.name());
        }
        for slot in self.index_by_id.values_mut() {
            if *slot > index {
                *slot -= 1;
            }
        }

        debug!("removed {} '{}' ({id})", object.kind().name(), object.name());
        Ok(object)
    }

    pub fn remove_by_name(&mut self, name: &str) -> Result<SceneObject> {
        let id = self.id_of(name)?;
        self.remove(id)
    }

    /// Drop every object. Ids handed out so far are still never reissued.
    pub fn remove_all(&mut self) {
        debug!("removing all {} objects", self.objects.len());
        self.objects.clear();
        self.index_by_id.clear();
        self.id_by_name.clear();
    }

    pub fn count(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.index_by_id.contains_key(&id)
    }

    /// Objects in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SceneObject> {
        self.objects.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MeshData;
    use crate::object::PointLight;

    fn mesh_object(name: &str) -> SceneObject {
        SceneObject::mesh(name, Mesh::from_data(&MeshData::square(1.0)).unwrap())
    }

    #[test]
    fn test_ids_strictly_increase() {
        let mut registry = Registry::new();
        let a = registry.add(mesh_object("a"));
        let b = registry.add(mesh_object("b"));
        let c = registry.add(mesh_object("c"));
        assert!(a < b && b < c);
        assert_eq!(registry.count(), 3);
        assert_eq!(registry.get(b).unwrap().id(), Some(b));
    }

    #[test]
    fn test_lookup_by_id_and_name() {
        let mut registry = Registry::new();
        let id = registry.add(mesh_object("square"));
        assert_eq!(registry.get_by_name("square").unwrap().id(), Some(id));
        assert_eq!(registry.id_of("square").unwrap(), id);
        assert!(matches!(registry.get_by_name("circle"), Err(GeometryError::NotFound(_))));
    }

    #[test]
    fn test_remove_reindexes_survivors() {
        let mut registry = Registry::new();
        let ids: Vec<_> = ["a", "b", "c", "d"]
            .iter()
            .map(|name| registry.add(mesh_object(name)))
            .collect();

        let removed = registry.remove(ids[1]).unwrap();
        assert_eq!(removed.name(), "b");
        assert_eq!(registry.count(), 3);
        assert!(matches!(registry.get(ids[1]), Err(GeometryError::NotFound(_))));
        assert!(registry.get_by_name("b").is_err());

        for (id, name) in [(ids[0], "a"), (ids[2], "c"), (ids[3], "d")] {
            assert_eq!(registry.get(id).unwrap().name(), name);
            assert_eq!(registry.get_by_name(name).unwrap().id(), Some(id));
        }

        assert!(registry.remove(ids[1]).is_err());
    }

    #[test]
    fn test_removed_ids_are_never_reissued() {
        let mut registry = Registry::new();
        let first = registry.add(mesh_object("a"));
        registry.remove(first).unwrap();
        let second = registry.add(mesh_object("a"));
        assert_ne!(first, second);
        assert!(second > first);

        registry.remove_all();
        assert!(registry.is_empty());
        let third = registry.add(mesh_object("a"));
        assert!(third > second);
    }

    #[test]
    fn test_duplicate_names_overwrite_name_entry() {
        let mut registry = Registry::new();
        let old = registry.add(mesh_object("dup"));
        let new = registry.add(mesh_object("dup"));
        assert_eq!(registry.id_of("dup").unwrap(), new);

        // removing the shadowed object leaves the current name entry alone
        registry.remove(old).unwrap();
        assert_eq!(registry.id_of("dup").unwrap(), new);

        registry.remove_by_name("dup").unwrap();
        assert!(registry.id_of("dup").is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_typed_accessors() {
        let mut registry = Registry::new();
        let mesh = registry.add(mesh_object("m"));
        let camera = registry.add(SceneObject::camera("cam", Camera::new(640, 480).unwrap()));
        let lamp = registry.add(SceneObject::point_light("lamp", PointLight::default()));

        assert!(registry.mesh(mesh).is_ok());
        assert!(registry.camera(camera).is_ok());
        assert!(matches!(registry.mesh(camera), Err(GeometryError::NotFound(_))));
        assert!(matches!(registry.camera(lamp), Err(GeometryError::NotFound(_))));

        registry.get_mut(camera).unwrap().clear_dirty();
        registry.camera_mut(camera).unwrap().set_far(10.0).unwrap();
        assert!(registry.get(camera).unwrap().is_dirty());
    }
}
