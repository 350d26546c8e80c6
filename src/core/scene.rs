// Copyright 2026 @lucent

use crate::core::camera::Camera;
use crate::core::field::StructuredField;
use crate::core::geometry::Geometry;
use crate::core::light::Light;
use crate::core::material::Material;
use crate::core::snapshot::SceneSnapshot;
use crate::core::volume::Volume;
use crate::renderers::renderer::Renderer;
use std::sync::Arc;

/// A renderable surface: one geometry shaded by one material, carrying a
/// user-facing id for the `objectId` channel.
#[derive(Clone)]
pub struct Surface {
    pub geometry: usize,
    pub material: usize,
    pub id: u32,
}

#[derive(Clone)]
pub struct SurfaceInstance {
    pub surfaces: Vec<usize>,
    pub id: u32,
}

#[derive(Clone)]
pub struct VolumeInstance {
    pub volumes: Vec<usize>,
    pub id: u32,
}

/// Committed scene model. Every mutation bumps one of two monotonic
/// counters: `last_commit` for parameter edits, `last_upload` for bulk data
/// arrays. The frame state machine polls both to decide accumulation resets;
/// `flush` is the blocking point where pending edits become visible as an
/// immutable snapshot.
pub struct Scene {
    geometries: Vec<Arc<Geometry>>,
    materials: Vec<Material>,
    fields: Vec<Arc<StructuredField>>,
    volumes: Vec<Arc<Volume>>,
    lights: Vec<Light>,
    surfaces: Vec<Surface>,
    surface_instances: Vec<SurfaceInstance>,
    volume_instances: Vec<VolumeInstance>,
    camera: Option<Camera>,
    renderer: Option<Renderer>,

    last_commit: u64,
    last_upload: u64,
    snapshot: Option<Arc<SceneSnapshot>>,
    snapshot_epochs: (u64, u64),
}

impl Scene {
    pub fn new() -> Self {
        Self {
            geometries: Vec::new(),
            materials: Vec::new(),
            fields: Vec::new(),
            volumes: Vec::new(),
            lights: Vec::new(),
            surfaces: Vec::new(),
            surface_instances: Vec::new(),
            volume_instances: Vec::new(),
            camera: None,
            renderer: None,
            last_commit: 0,
            last_upload: 0,
            snapshot: None,
            snapshot_epochs: (0, 0),
        }
    }

    fn mark_committed(&mut self) {
        self.last_commit += 1;
    }

    fn mark_uploaded(&mut self) {
        self.last_upload += 1;
    }

    pub fn last_commit_epoch(&self) -> u64 {
        self.last_commit
    }

    pub fn last_upload_epoch(&self) -> u64 {
        self.last_upload
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> usize {
        self.geometries.push(Arc::new(geometry));
        self.mark_uploaded();
        self.geometries.len() - 1
    }

    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.mark_committed();
        self.materials.len() - 1
    }

    pub fn update_material(&mut self, handle: usize, material: Material) {
        if handle < self.materials.len() {
            self.materials[handle] = material;
            self.mark_committed();
        } else {
            log::warn!("update_material: handle {} out of range", handle);
        }
    }

    pub fn add_field(&mut self, field: StructuredField) -> usize {
        self.fields.push(Arc::new(field));
        self.mark_uploaded();
        self.fields.len() - 1
    }

    pub fn add_volume(&mut self, volume: Volume) -> usize {
        if volume.field >= self.fields.len() {
            log::warn!("volume references unknown field {}; it will contribute nothing",
                       volume.field);
        }
        self.volumes.push(Arc::new(volume));
        self.mark_committed();
        self.volumes.len() - 1
    }

    pub fn add_light(&mut self, light: Light) -> usize {
        self.lights.push(light);
        self.mark_committed();
        self.lights.len() - 1
    }

    pub fn update_light(&mut self, handle: usize, light: Light) {
        if handle < self.lights.len() {
            self.lights[handle] = light;
            self.mark_committed();
        } else {
            log::warn!("update_light: handle {} out of range", handle);
        }
    }

    pub fn add_surface(&mut self, geometry: usize, material: usize, id: u32) -> usize {
        self.surfaces.push(Surface { geometry, material, id });
        self.mark_committed();
        self.surfaces.len() - 1
    }

    pub fn add_surface_instance(&mut self, surfaces: Vec<usize>, id: u32) -> usize {
        self.surface_instances.push(SurfaceInstance { surfaces, id });
        self.mark_committed();
        self.surface_instances.len() - 1
    }

    pub fn add_volume_instance(&mut self, volumes: Vec<usize>, id: u32) -> usize {
        self.volume_instances.push(VolumeInstance { volumes, id });
        self.mark_committed();
        self.volume_instances.len() - 1
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = Some(camera);
        self.mark_committed();
    }

    pub fn set_renderer(&mut self, renderer: Renderer) {
        self.renderer = Some(renderer);
        self.mark_committed();
    }

    pub fn renderer(&self) -> Option<&Renderer> {
        self.renderer.as_ref()
    }

    pub fn is_renderable(&self) -> bool {
        self.camera.is_some() && self.renderer.is_some()
    }

    /// Flushes pending commits and uploads into an immutable snapshot,
    /// rebuilding the acceleration structure only when something changed
    /// since the last flush. Launches hold the returned `Arc`; edits made
    /// afterwards are invisible to them.
    pub fn flush(&mut self) -> Option<Arc<SceneSnapshot>> {
        let (camera, renderer) = match (&self.camera, &self.renderer) {
            (Some(camera), Some(renderer)) => (camera.clone(), renderer.clone()),
            _ => return None,
        };

        let epochs = (self.last_commit, self.last_upload);
        if let Some(snapshot) = &self.snapshot {
            if self.snapshot_epochs == epochs {
                return Some(snapshot.clone());
            }
        }

        let snapshot = Arc::new(SceneSnapshot::build(
            self.geometries.clone(),
            self.materials.clone(),
            self.fields.clone(),
            self.volumes.clone(),
            self.lights.clone(),
            self.surfaces.clone(),
            self.surface_instances.clone(),
            self.volume_instances.clone(),
            camera,
            renderer,
        ));
        self.snapshot = Some(snapshot.clone());
        self.snapshot_epochs = epochs;
        Some(snapshot)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::constants::Vector3f;

    #[test]
    fn test_epochs_advance_per_edit_kind() {
        let mut scene = Scene::new();
        let c0 = scene.last_commit_epoch();
        let u0 = scene.last_upload_epoch();

        scene.add_material(Material::matte(Vector3f::new(1.0, 0.0, 0.0)));
        assert_eq!(scene.last_commit_epoch(), c0 + 1);
        assert_eq!(scene.last_upload_epoch(), u0);

        scene.add_geometry(
            Geometry::spheres(vec![Vector3f::zeros()], vec![1.0]).unwrap(),
        );
        assert_eq!(scene.last_upload_epoch(), u0 + 1);
    }

    #[test]
    fn test_flush_requires_camera_and_renderer() {
        let mut scene = Scene::new();
        assert!(scene.flush().is_none());

        scene.set_camera(Camera::perspective(
            Vector3f::zeros(),
            Vector3f::new(0.0, 0.0, -1.0),
            Vector3f::new(0.0, 1.0, 0.0),
            1.0,
            1.0,
        ));
        assert!(scene.flush().is_none());

        scene.set_renderer(Renderer::default());
        assert!(scene.flush().is_some());
    }

    #[test]
    fn test_flush_caches_until_edit() {
        let mut scene = Scene::new();
        scene.set_camera(Camera::perspective(
            Vector3f::zeros(),
            Vector3f::new(0.0, 0.0, -1.0),
            Vector3f::new(0.0, 1.0, 0.0),
            1.0,
            1.0,
        ));
        scene.set_renderer(Renderer::default());

        let a = scene.flush().unwrap();
        let b = scene.flush().unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        scene.add_light(Light::ambient(Vector3f::new(1.0, 1.0, 1.0), 1.0));
        let c = scene.flush().unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
