// Copyright 2026 @lucent

use crate::core::interaction::INVALID_ID;
use crate::core::light::Light;
use crate::core::rng::LcgRng;
use crate::core::snapshot::SceneSnapshot;
use crate::integrators::marcher;
use crate::math::constants::{Float, Vector2f, Vector3f, Vector4f, FLOAT_MAX, OPACITY_THRESHOLD};
use crate::math::ray::Ray3f;
use crate::renderers::renderer::LightStrategy;

/// Everything one sample produces for one pixel: the premultiplied color
/// the accumulator sums, and the auxiliary values the first-hit channels
/// take from the first sample only.
pub struct ScreenSample {
    pub color: Vector4f,
    pub depth: Float,
    pub prim_id: u32,
    pub object_id: u32,
    pub instance_id: u32,
    pub normal: Vector3f,
    pub albedo: Vector3f,
}

impl ScreenSample {
    fn empty() -> Self {
        Self {
            color: Vector4f::zeros(),
            depth: FLOAT_MAX,
            prim_id: INVALID_ID,
            object_id: INVALID_ID,
            instance_id: INVALID_ID,
            normal: Vector3f::zeros(),
            albedo: Vector3f::zeros(),
        }
    }
}

/// One full sample for pixel (x, y) of a `size.0 x size.1` image: the
/// primary ray is jittered inside the pixel, then surfaces and volumes are
/// composited front to back until the opacity saturates or the ray escapes.
pub fn render_pixel(snapshot: &SceneSnapshot,
                    x: u32,
                    y: u32,
                    size: (u32, u32),
                    frame_id: u32) -> ScreenSample {
    let mut rng = LcgRng::for_pixel(frame_id, x, y);
    let screen = Vector2f::new(
        (x as Float + rng.next_f32()) / size.0 as Float,
        (y as Float + rng.next_f32()) / size.1 as Float,
    );
    let mut ray = snapshot.camera().ray(screen);
    let renderer = snapshot.renderer();
    let jitter = rng.next_f32();

    let mut sample = ScreenSample::empty();
    sample.normal = ray.dir();
    let mut color = Vector3f::zeros();
    let mut opacity: Float = 0.0;
    let mut first_hit = true;

    while opacity < OPACITY_THRESHOLD {
        let hit = snapshot.intersect(&ray);

        // Volumes are marched up to the surface (or the ray's far bound).
        let mut volume_ray = Ray3f::new(ray.origin(), ray.dir(), Some(ray.min_t), Some(ray.max_t));
        if let Some(hit) = &hit {
            volume_ray.max_t = hit.t;
        }
        let volume = marcher::ray_march(snapshot.volumes(), &volume_ray, jitter);

        // Volume lies in front of the surface by construction.
        let weight = 1.0 - opacity;
        color += volume.color * weight;
        opacity += volume.opacity * weight;

        match hit {
            Some(hit) => {
                let material = snapshot.material(hit.material);
                let values = match material {
                    Some(m) => m.evaluate(),
                    None => crate::core::material::Material::matte(
                        Vector3f::new(0.8, 0.8, 0.8),
                    )
                    .evaluate(),
                };

                let shaded = shade_surface(snapshot, &hit, values.base_color, jitter, &mut rng);
                let weight = (1.0 - opacity) * values.opacity;
                color += shaded * weight;
                opacity += weight;

                if first_hit {
                    first_hit = false;
                    // Depth and ids go to whichever was reached first: the
                    // volume's first non-empty sample or the surface.
                    if volume.depth < hit.t {
                        sample.depth = volume.depth;
                        sample.object_id = volume.volume_id;
                        sample.instance_id = volume.instance_id;
                    } else {
                        sample.depth = hit.t;
                        sample.prim_id = hit.prim_id;
                        sample.object_id = hit.object_id;
                        sample.instance_id = hit.instance_id;
                    }
                    sample.normal = hit.sh_normal;
                    sample.albedo = values.base_color;
                }

                ray.advance(hit.t + hit.epsilon);
            }
            None => {
                if first_hit && !volume.is_empty() {
                    sample.depth = volume.depth;
                    sample.object_id = volume.volume_id;
                    sample.instance_id = volume.instance_id;
                }

                let bg = renderer.background;
                let weight = (1.0 - opacity) * bg.w;
                color += Vector3f::new(bg.x, bg.y, bg.z) * weight;
                opacity += weight;
                break;
            }
        }
    }

    sample.color = Vector4f::new(color.x, color.y, color.z, opacity.min(1.0));
    sample
}

/// Local illumination at a surface hit: occlusion-weighted ambient term
/// plus next-event estimation against the light list. Shadow rays treat
/// opaque surfaces as blockers, march volume transmittance, and ignore
/// partially transparent surfaces entirely.
fn shade_surface(snapshot: &SceneSnapshot,
                 hit: &crate::core::interaction::SurfaceHit,
                 base_color: Vector3f,
                 jitter: Float,
                 rng: &mut LcgRng) -> Vector3f {
    let renderer = snapshot.renderer();
    let origin = hit.p + hit.sh_normal * hit.epsilon;

    // Ambient lights join the renderer's own ambient radiance; the combined
    // term is weighted by occlusion.
    let mut ambient = renderer.ambient_color * renderer.ambient_intensity;
    for light in snapshot.lights() {
        if let Light::Ambient { color, intensity } = light {
            ambient += color * *intensity;
        }
    }
    let ao = snapshot.ambient_occlusion(
        hit.p,
        hit.sh_normal,
        hit.epsilon,
        renderer.ao_samples,
        renderer.occlusion_distance,
        rng,
    );
    let mut radiance = ambient * ao;

    let lights = snapshot.lights();
    match renderer.light_strategy {
        LightStrategy::All => {
            for light in lights {
                radiance += direct_light(snapshot, light, origin, hit.sh_normal, jitter, renderer);
            }
        }
        LightStrategy::Single => {
            if !lights.is_empty() {
                let idx = (rng.next_u32() as usize) % lights.len();
                radiance += direct_light(
                    snapshot,
                    &lights[idx],
                    origin,
                    hit.sh_normal,
                    jitter,
                    renderer,
                ) * lights.len() as Float;
            }
        }
    }

    base_color.component_mul(&radiance)
}

fn direct_light(snapshot: &SceneSnapshot,
                light: &Light,
                origin: Vector3f,
                normal: Vector3f,
                jitter: Float,
                renderer: &crate::renderers::renderer::Renderer) -> Vector3f {
    // Ambient lights are folded into the occlusion-weighted ambient term
    // by shade_surface, not sampled as direct lighting.
    if light.is_ambient() {
        return Vector3f::zeros();
    }

    let ls = match light.sample(origin) {
        Some(ls) => ls,
        None => return Vector3f::zeros(),
    };
    let cos_theta = normal.dot(&ls.direction);
    if cos_theta <= 0.0 {
        return Vector3f::zeros();
    }

    let shadow = Ray3f::new(origin, ls.direction, Some(0.0), Some(ls.distance));
    if snapshot.occluded(&shadow) {
        return Vector3f::zeros();
    }
    let transmittance = marcher::ray_march_transmittance(snapshot.volumes(), &shadow, jitter);

    let contribution = ls.radiance * cos_theta * transmittance;
    Vector3f::new(
        contribution.x.min(renderer.direct_clamp),
        contribution.y.min(renderer.direct_clamp),
        contribution.z.min(renderer.direct_clamp),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::camera::Camera;
    use crate::core::field::{FieldFilter, StructuredField};
    use crate::core::geometry::Geometry;
    use crate::core::material::Material;
    use crate::core::scene::Scene;
    use crate::core::volume::{TransferFunction, Volume};
    use crate::renderers::renderer::Renderer;

    const SIZE: (u32, u32) = (16, 16);

    fn looking_down_z() -> Camera {
        Camera::perspective(
            Vector3f::zeros(),
            Vector3f::new(0.0, 0.0, 1.0),
            Vector3f::new(0.0, 1.0, 0.0),
            0.5,
            1.0,
        )
    }

    fn center_sample(scene: &mut Scene) -> ScreenSample {
        let snapshot = scene.flush().expect("renderable scene");
        render_pixel(&snapshot, SIZE.0 / 2, SIZE.1 / 2, SIZE, 0)
    }

    fn add_big_sphere(scene: &mut Scene, z: Float, object_id: u32, instance_id: u32) {
        let geom = scene.add_geometry(
            Geometry::spheres(vec![Vector3f::new(0.0, 0.0, z)], vec![1.0]).unwrap(),
        );
        let mat = scene.add_material(Material::matte(Vector3f::new(0.5, 0.5, 0.5)));
        let surf = scene.add_surface(geom, mat, object_id);
        scene.add_surface_instance(vec![surf], instance_id);
    }

    fn add_box_volume(scene: &mut Scene, origin: Vector3f, volume_id: u32, instance_id: u32) {
        let field = scene.add_field(
            StructuredField::new(
                vec![1.0; 8 * 8 * 8],
                (8, 8, 8),
                origin,
                Vector3f::new(0.25, 0.25, 0.25),
                FieldFilter::Trilinear,
            )
            .unwrap(),
        );
        let tf = TransferFunction::new(
            vec![Vector3f::new(0.0, 1.0, 0.0)],
            vec![1.0],
            (0.0, 1.0),
        )
        .unwrap();
        let volume = scene.add_volume(Volume::new(field, tf, 1.0, volume_id));
        scene.add_volume_instance(vec![volume], instance_id);
    }

    #[test]
    fn test_miss_composites_background() {
        let mut scene = Scene::new();
        scene.set_camera(looking_down_z());
        scene.set_renderer(
            Renderer::default().with_background(Vector4f::new(0.2, 0.4, 0.6, 1.0)),
        );

        let s = center_sample(&mut scene);
        assert!((s.color.x - 0.2).abs() < 1e-5);
        assert!((s.color.w - 1.0).abs() < 1e-5);
        assert_eq!(s.depth, FLOAT_MAX);
        assert_eq!(s.object_id, INVALID_ID);
    }

    #[test]
    fn test_opaque_surface_saturates_alpha() {
        let mut scene = Scene::new();
        add_big_sphere(&mut scene, 5.0, 11, 1);
        scene.set_camera(looking_down_z());
        scene.set_renderer(Renderer::default().with_ambient(Vector3f::new(1.0, 1.0, 1.0), 1.0));

        let s = center_sample(&mut scene);
        assert!((s.color.w - 1.0).abs() < 1e-5);
        assert!(s.depth > 3.5 && s.depth < 4.5);
        assert_eq!(s.object_id, 11);
        assert_eq!(s.instance_id, 1);
        assert!(s.normal.z < -0.9);
        assert!((s.albedo.x - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_stacked_opaque_surfaces_stop_at_first() {
        let mut scene = Scene::new();
        add_big_sphere(&mut scene, 3.0, 11, 1);
        add_big_sphere(&mut scene, 6.0, 12, 1);
        add_big_sphere(&mut scene, 9.0, 13, 1);
        scene.set_camera(looking_down_z());
        scene.set_renderer(Renderer::default());

        let s = center_sample(&mut scene);
        assert_eq!(s.object_id, 11);
        assert!(s.depth < 2.5);
        assert!((s.color.w - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_volume_in_front_wins_attribution() {
        let mut scene = Scene::new();
        add_big_sphere(&mut scene, 8.0, 11, 1);
        // Volume spans z in [1, 2.75], well before the sphere at t ~= 7.
        add_box_volume(&mut scene, Vector3f::new(-1.0, -1.0, 1.0), 77, 9);
        scene.set_camera(looking_down_z());
        scene.set_renderer(Renderer::default());

        let s = center_sample(&mut scene);
        assert_eq!(s.object_id, 77);
        assert_eq!(s.instance_id, 9);
        assert_eq!(s.prim_id, INVALID_ID);
        assert!(s.depth < 3.0);
    }

    #[test]
    fn test_surface_in_front_wins_attribution() {
        let mut scene = Scene::new();
        add_big_sphere(&mut scene, 3.0, 11, 1);
        // Volume starts behind the surface hit at t ~= 2.
        add_box_volume(&mut scene, Vector3f::new(-1.0, -1.0, 6.0), 77, 9);
        scene.set_camera(looking_down_z());
        scene.set_renderer(Renderer::default());

        let s = center_sample(&mut scene);
        assert_eq!(s.object_id, 11);
        assert_eq!(s.instance_id, 1);
        assert!(s.depth > 1.5 && s.depth < 2.5);
    }

    #[test]
    fn test_ambient_lights_shade_unoccluded() {
        let mut scene = Scene::new();
        add_big_sphere(&mut scene, 5.0, 11, 1);
        scene.add_light(Light::ambient(Vector3f::new(1.0, 1.0, 1.0), 2.0));
        scene.set_camera(looking_down_z());
        scene.set_renderer(Renderer::default());

        let s = center_sample(&mut scene);
        // albedo 0.5 * ambient 2.0 = 1.0 per channel.
        assert!((s.color.x - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_ambient_light_darkened_by_occlusion() {
        let mut scene = Scene::new();
        add_big_sphere(&mut scene, 5.0, 11, 1);
        // Enclosing shell: every occlusion ray from the inner sphere hits it.
        let shell = scene.add_geometry(
            Geometry::spheres(vec![Vector3f::zeros()], vec![50.0]).unwrap(),
        );
        let shell_mat = scene.add_material(Material::matte(Vector3f::new(0.9, 0.9, 0.9)));
        let shell_surf = scene.add_surface(shell, shell_mat, 12);
        scene.add_surface_instance(vec![shell_surf], 2);

        scene.add_light(Light::ambient(Vector3f::new(1.0, 1.0, 1.0), 2.0));
        scene.set_camera(looking_down_z());
        scene.set_renderer(Renderer::default().with_ao_samples(4));

        let s = center_sample(&mut scene);
        assert_eq!(s.object_id, 11);
        assert!(s.color.x < 1e-4);
        assert!((s.color.w - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_backlit_surface_is_black() {
        let mut scene = Scene::new();
        add_big_sphere(&mut scene, 5.0, 11, 1);
        // Light travels toward -z, arriving behind the visible pole.
        scene.add_light(Light::directional(
            Vector3f::new(0.0, 0.0, -1.0),
            Vector3f::new(1.0, 1.0, 1.0),
            3.0,
        ));
        scene.set_camera(looking_down_z());
        scene.set_renderer(Renderer::default());

        let s = center_sample(&mut scene);
        assert!(s.color.x < 1e-4);
        assert!((s.color.w - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_directional_light_shadowed_by_opaque_blocker() {
        // Light arrives at an angle so the shadow ray leaves the camera
        // axis; the blocker sits on the shadow ray but off the camera ray.
        let light_travel = Vector3f::new(0.6, 0.0, 0.8);

        let mut lit = Scene::new();
        add_big_sphere(&mut lit, 5.0, 11, 1);
        lit.add_light(Light::directional(light_travel, Vector3f::new(1.0, 1.0, 1.0), 3.0));
        lit.set_camera(looking_down_z());
        lit.set_renderer(Renderer::default());
        let bright = center_sample(&mut lit);
        assert!(bright.color.x > 0.5);

        let mut shadowed = Scene::new();
        add_big_sphere(&mut shadowed, 5.0, 11, 1);
        // Shadow ray from the hit point (~(0,0,4)) toward -light_travel
        // passes (-1.5, 0, 2) at s = 2.5.
        let blocker = shadowed.add_geometry(
            Geometry::spheres(vec![Vector3f::new(-1.5, 0.0, 2.0)], vec![0.5]).unwrap(),
        );
        let blocker_mat = shadowed.add_material(Material::matte(Vector3f::new(0.1, 0.1, 0.1)));
        let blocker_surf = shadowed.add_surface(blocker, blocker_mat, 12);
        shadowed.add_surface_instance(vec![blocker_surf], 2);
        shadowed.add_light(Light::directional(light_travel, Vector3f::new(1.0, 1.0, 1.0), 3.0));
        shadowed.set_camera(looking_down_z());
        shadowed.set_renderer(Renderer::default());

        let dark = center_sample(&mut shadowed);
        assert_eq!(dark.object_id, 11);
        assert!(dark.color.x < 1e-4);
    }
}
