// Copyright 2026 @lucent

use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;

/// Raw hit attributes produced by a single primitive; the snapshot layer
/// promotes this into a full `SurfaceHit` with material/id context.
pub struct GeometryHit {
    pub t: Float,
    pub geo_normal: Vector3f,
    pub sh_normal: Vector3f,
    pub prim_id: u32,
}

/// Closed set of geometry kinds stored in a dense arena; the traversal hot
/// path switches on the tag instead of calling through a vtable.
pub enum GeometryKind {
    Spheres {
        centers: Vec<Vector3f>,
        radii: Vec<Float>,
    },
    Triangles {
        vertices: Vec<Vector3f>,
        indices: Vec<[u32; 3]>,
        vertex_normals: Option<Vec<Vector3f>>,
    },
}

pub struct Geometry {
    kind: GeometryKind,
}

impl Geometry {
    pub fn spheres(centers: Vec<Vector3f>, radii: Vec<Float>) -> Result<Self, String> {
        if centers.len() != radii.len() {
            return Err(format!(
                "sphere geometry: {} centers but {} radii",
                centers.len(),
                radii.len()
            ));
        }
        Ok(Self { kind: GeometryKind::Spheres { centers, radii } })
    }

    pub fn triangles(vertices: Vec<Vector3f>,
                     indices: Vec<[u32; 3]>,
                     vertex_normals: Option<Vec<Vector3f>>) -> Result<Self, String> {
        if let Some(normals) = &vertex_normals {
            if normals.len() != vertices.len() {
                return Err("triangle geometry: vertex normal count mismatch".to_string());
            }
        }
        for tri in &indices {
            for &i in tri {
                if i as usize >= vertices.len() {
                    return Err(format!("triangle geometry: index {} out of range", i));
                }
            }
        }
        Ok(Self { kind: GeometryKind::Triangles { vertices, indices, vertex_normals } })
    }

    /// Quads are stored triangulated: (x, y, z, w) splits into (x, y, w)
    /// and (z, w, y), which keeps a consistent winding across both halves.
    /// Without an index array the vertices are consumed as a quad soup,
    /// four vertices per primitive.
    pub fn quads(vertices: Vec<Vector3f>,
                 indices: Option<Vec<[u32; 4]>>,
                 vertex_normals: Option<Vec<Vector3f>>) -> Result<Self, String> {
        let tris = match indices {
            Some(quads) => {
                let mut tris = Vec::with_capacity(quads.len() * 2);
                for [x, y, z, w] in quads {
                    tris.push([x, y, w]);
                    tris.push([z, w, y]);
                }
                tris
            }
            None => {
                if vertices.len() % 4 != 0 {
                    return Err(format!(
                        "quad geometry: {} vertices is not a multiple of 4",
                        vertices.len()
                    ));
                }
                let mut tris = Vec::with_capacity(vertices.len() / 2);
                for quad in (0..vertices.len() as u32).step_by(4) {
                    tris.push([quad, quad + 1, quad + 3]);
                    tris.push([quad + 2, quad + 3, quad + 1]);
                }
                tris
            }
        };
        Self::triangles(vertices, tris, vertex_normals)
    }

    pub fn prim_count(&self) -> usize {
        match &self.kind {
            GeometryKind::Spheres { centers, .. } => centers.len(),
            GeometryKind::Triangles { indices, .. } => indices.len(),
        }
    }

    pub fn prim_bounds(&self, prim: usize) -> AABB {
        match &self.kind {
            GeometryKind::Spheres { centers, radii } => {
                let c = centers[prim];
                let r = Vector3f::new(radii[prim], radii[prim], radii[prim]);
                AABB::new(c - r, c + r)
            }
            GeometryKind::Triangles { vertices, indices, .. } => {
                let tri = indices[prim];
                let mut bounds = AABB::default();
                for &i in &tri {
                    bounds.expand_by_point(&vertices[i as usize]);
                }
                bounds
            }
        }
    }

    pub fn intersect_prim(&self, ray: &Ray3f, prim: usize) -> Option<GeometryHit> {
        match &self.kind {
            GeometryKind::Spheres { centers, radii } => {
                intersect_sphere(ray, centers[prim], radii[prim]).map(|t| {
                    let n = (ray.at(t) - centers[prim]).normalize();
                    GeometryHit { t, geo_normal: n, sh_normal: n, prim_id: prim as u32 }
                })
            }
            GeometryKind::Triangles { vertices, indices, vertex_normals } => {
                let [i0, i1, i2] = indices[prim];
                let p0 = vertices[i0 as usize];
                let p1 = vertices[i1 as usize];
                let p2 = vertices[i2 as usize];
                intersect_triangle(ray, p0, p1, p2).map(|(t, u, v)| {
                    let geo_normal = (p1 - p0).cross(&(p2 - p0)).normalize();
                    let sh_normal = match vertex_normals {
                        Some(normals) => {
                            let n0 = normals[i0 as usize];
                            let n1 = normals[i1 as usize];
                            let n2 = normals[i2 as usize];
                            (n0 * (1.0 - u - v) + n1 * u + n2 * v).normalize()
                        }
                        None => geo_normal,
                    };
                    GeometryHit { t, geo_normal, sh_normal, prim_id: prim as u32 }
                })
            }
        }
    }
}

fn intersect_sphere(ray: &Ray3f, center: Vector3f, radius: Float) -> Option<Float> {
    let oc = ray.origin() - center;
    let b = oc.dot(&ray.dir());
    let c = oc.dot(&oc) - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }

    let sqrt_disc = disc.sqrt();
    let t0 = -b - sqrt_disc;
    if ray.test_segment(t0) {
        return Some(t0);
    }
    let t1 = -b + sqrt_disc;
    if ray.test_segment(t1) {
        return Some(t1);
    }
    None
}

// Moller-Trumbore; returns (t, u, v).
fn intersect_triangle(ray: &Ray3f,
                      p0: Vector3f,
                      p1: Vector3f,
                      p2: Vector3f) -> Option<(Float, Float, Float)> {
    let e1 = p1 - p0;
    let e2 = p2 - p0;
    let pvec = ray.dir().cross(&e2);
    let det = e1.dot(&pvec);
    if det.abs() < 1e-9 {
        return None;
    }

    let inv_det = 1.0 / det;
    let tvec = ray.origin() - p0;
    let u = tvec.dot(&pvec) * inv_det;
    if u < 0.0 || u > 1.0 {
        return None;
    }

    let qvec = tvec.cross(&e1);
    let v = ray.dir().dot(&qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = e2.dot(&qvec) * inv_det;
    if ray.test_segment(t) {
        Some((t, u, v))
    } else {
        None
    }
}
