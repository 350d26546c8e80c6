// Copyright 2026 @lucent

use crate::core::bvh::Bvh;
use crate::core::camera::Camera;
use crate::core::field::StructuredField;
use crate::core::geometry::Geometry;
use crate::core::interaction::SurfaceHit;
use crate::core::light::Light;
use crate::core::material::Material;
use crate::core::scene::{Surface, SurfaceInstance, VolumeInstance};
use crate::core::volume::Volume;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f, OPACITY_THRESHOLD};
use crate::math::ray::Ray3f;
use std::sync::Arc;

/// One primitive of one surface of one instance, flattened for traversal.
struct PrimRef {
    geometry: usize,
    prim: usize,
    surface: usize,
    instance_id: u32,
}

/// A volume instance ready for marching: field, transfer function, bounds,
/// step size and the per-cell skip table, all resolved at flush time.
pub struct VolumeState {
    pub volume: Arc<Volume>,
    pub field: Arc<StructuredField>,
    pub bounds: AABB,
    pub step_size: Float,
    pub max_opacities: Vec<Float>,
    pub instance_id: u32,
}

/// Flattened, read-only view of the committed scene for one or more
/// launches. Immutable once built; shared with launch threads via `Arc`.
pub struct SceneSnapshot {
    geometries: Vec<Arc<Geometry>>,
    materials: Vec<Material>,
    lights: Vec<Light>,
    surfaces: Vec<Surface>,
    prim_refs: Vec<PrimRef>,
    surfaces_bvh: Bvh,
    volumes: Vec<VolumeState>,
    camera: Camera,
    renderer: crate::renderers::renderer::Renderer,
}

impl SceneSnapshot {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn build(geometries: Vec<Arc<Geometry>>,
                        materials: Vec<Material>,
                        fields: Vec<Arc<StructuredField>>,
                        volumes: Vec<Arc<Volume>>,
                        lights: Vec<Light>,
                        surfaces: Vec<Surface>,
                        surface_instances: Vec<SurfaceInstance>,
                        volume_instances: Vec<VolumeInstance>,
                        camera: Camera,
                        renderer: crate::renderers::renderer::Renderer) -> Self {
        let mut prim_refs = Vec::new();
        let mut prim_bounds = Vec::new();
        for instance in &surface_instances {
            for &surface_idx in &instance.surfaces {
                let surface = match surfaces.get(surface_idx) {
                    Some(s) => s,
                    None => {
                        log::warn!("surface instance references unknown surface {}", surface_idx);
                        continue;
                    }
                };
                let geometry = match geometries.get(surface.geometry) {
                    Some(g) => g,
                    None => {
                        log::warn!("surface {} references unknown geometry {}",
                                   surface_idx, surface.geometry);
                        continue;
                    }
                };
                for prim in 0..geometry.prim_count() {
                    prim_refs.push(PrimRef {
                        geometry: surface.geometry,
                        prim,
                        surface: surface_idx,
                        instance_id: instance.id,
                    });
                    prim_bounds.push(geometry.prim_bounds(prim));
                }
            }
        }
        let surfaces_bvh = Bvh::new(prim_bounds);

        let mut volume_states = Vec::new();
        for instance in &volume_instances {
            for &volume_idx in &instance.volumes {
                let volume = match volumes.get(volume_idx) {
                    Some(v) => v.clone(),
                    None => {
                        log::warn!("volume instance references unknown volume {}", volume_idx);
                        continue;
                    }
                };
                let field = match fields.get(volume.field) {
                    Some(f) => f.clone(),
                    None => continue, // warned about at add_volume
                };
                if !field.is_valid() {
                    // Degenerate fields contribute nothing rather than failing.
                    continue;
                }
                let max_opacities = volume.compute_max_opacities(field.grid());
                volume_states.push(VolumeState {
                    bounds: field.bounds(),
                    step_size: field.step_size(),
                    max_opacities,
                    instance_id: instance.id,
                    volume,
                    field,
                });
            }
        }

        Self {
            geometries,
            materials,
            lights,
            surfaces,
            prim_refs,
            surfaces_bvh,
            volumes: volume_states,
            camera,
            renderer,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn renderer(&self) -> &crate::renderers::renderer::Renderer {
        &self.renderer
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn volumes(&self) -> &[VolumeState] {
        &self.volumes
    }

    pub fn material(&self, handle: usize) -> Option<&Material> {
        self.materials.get(handle)
    }

    /// Nearest surface hit within the ray's interval. Surfaces fully cut
    /// away by an alpha mask are transparent to the classifier.
    pub fn intersect(&self, ray: &Ray3f) -> Option<SurfaceHit> {
        let result = self.surfaces_bvh.intersect(ray, |prim_idx, ray| {
            let pref = &self.prim_refs[prim_idx];
            let geometry = &self.geometries[pref.geometry];
            let hit = geometry.intersect_prim(ray, pref.prim)?;
            let surface = &self.surfaces[pref.surface];
            if let Some(material) = self.materials.get(surface.material) {
                if material.evaluate().opacity <= 0.0 {
                    return None;
                }
            }
            let t = hit.t;
            Some((hit, t))
        });

        result.map(|(prim_idx, hit)| {
            let pref = &self.prim_refs[prim_idx];
            let surface = &self.surfaces[pref.surface];
            let mut geo_normal = hit.geo_normal;
            let mut sh_normal = hit.sh_normal;
            // Face the normals toward the ray.
            if geo_normal.dot(&ray.dir()) > 0.0 {
                geo_normal = -geo_normal;
                sh_normal = -sh_normal;
            }
            SurfaceHit {
                t: hit.t,
                p: ray.at(hit.t),
                geo_normal,
                sh_normal,
                material: surface.material,
                prim_id: hit.prim_id,
                object_id: surface.id,
                instance_id: pref.instance_id,
                epsilon: SurfaceHit::offset_epsilon(hit.t),
            }
        })
    }

    /// Occlusion query for shadow rays: true iff a fully opaque surface
    /// blocks the segment. Partially transparent surfaces are ignored and
    /// contribute no attenuation (a deliberate approximation).
    pub fn occluded(&self, ray: &Ray3f) -> bool {
        self.surfaces_bvh.intersect_any(ray, |prim_idx, ray| {
            let pref = &self.prim_refs[prim_idx];
            let geometry = &self.geometries[pref.geometry];
            if geometry.intersect_prim(ray, pref.prim).is_none() {
                return false;
            }
            let surface = &self.surfaces[pref.surface];
            match self.materials.get(surface.material) {
                Some(material) => material.evaluate().opacity >= OPACITY_THRESHOLD,
                None => true,
            }
        })
    }

    /// Fraction of `samples` cosine-weighted hemisphere rays from `p` that
    /// escape within `max_distance`; 1.0 when sampling is disabled.
    pub fn ambient_occlusion(&self,
                             p: Vector3f,
                             normal: Vector3f,
                             epsilon: Float,
                             samples: u32,
                             max_distance: Float,
                             rng: &mut crate::core::rng::LcgRng) -> Float {
        if samples == 0 {
            return 1.0;
        }

        let mut unoccluded = 0u32;
        for _ in 0..samples {
            let dir = cosine_hemisphere(normal, rng.next_f32(), rng.next_f32());
            let ray = Ray3f::new(p + normal * epsilon, dir, Some(0.0), Some(max_distance));
            if !self.occluded(&ray) {
                unoccluded += 1;
            }
        }
        unoccluded as Float / samples as Float
    }
}

fn cosine_hemisphere(normal: Vector3f, u1: Float, u2: Float) -> Vector3f {
    let r = u1.sqrt();
    let phi = 2.0 * crate::math::constants::PI * u2;
    let x = r * phi.cos();
    let y = r * phi.sin();
    let z = (1.0 - u1).max(0.0).sqrt();

    // Build an orthonormal basis around the normal.
    let tangent = if normal.x.abs() > 0.9 {
        Vector3f::new(0.0, 1.0, 0.0)
    } else {
        Vector3f::new(1.0, 0.0, 0.0)
    };
    let bitangent = normal.cross(&tangent).normalize();
    let tangent = bitangent.cross(&normal);

    (tangent * x + bitangent * y + normal * z).normalize()
}
