// Copyright 2026 @lucent

use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;

const SAH_BUCKETS: usize = 12;
const MAX_LEAF_SIZE: usize = 4;

#[derive(Clone)]
struct Node {
    bounds: AABB,
    left: usize,
    right: usize,
    start: usize,
    count: usize,
}

impl Node {
    fn leaf(bounds: AABB, start: usize, count: usize) -> Self {
        Self { bounds, left: 0, right: 0, start, count }
    }

    fn is_leaf(&self) -> bool {
        self.count > 0
    }
}

/// Bounds-only BVH over primitive references; intersection is delegated to
/// callbacks so one structure serves every geometry kind in the registry.
pub struct Bvh {
    nodes: Vec<Node>,
    indices: Vec<usize>,
    prim_bounds: Vec<AABB>,
    prim_centroids: Vec<Vector3f>,
}

impl Bvh {
    pub fn new(prim_bounds: Vec<AABB>) -> Self {
        let prim_centroids = prim_bounds.iter().map(|b| b.center()).collect();
        let mut bvh = Self {
            indices: (0..prim_bounds.len()).collect(),
            nodes: Vec::new(),
            prim_bounds,
            prim_centroids,
        };

        if !bvh.indices.is_empty() {
            let (bounds, centroid_bounds) = bvh.compute_bounds(0, bvh.indices.len());
            bvh.build(0, bvh.indices.len(), bounds, centroid_bounds);
        }

        bvh
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Closest hit. The callback reports a hit distance for a primitive; the
    /// traversal shrinks the ray's far bound as hits accumulate so later
    /// subtrees are culled against the best distance found so far.
    pub fn intersect<F, T>(&self, ray: &Ray3f, mut hit_fn: F) -> Option<(usize, T)>
    where
        F: FnMut(usize, &Ray3f) -> Option<(T, Float)>,
    {
        if self.nodes.is_empty() {
            return None;
        }

        let mut clipped = Ray3f::new(ray.origin(), ray.dir(), Some(ray.min_t), Some(ray.max_t));
        let mut closest: Option<(usize, T)> = None;
        let mut stack = vec![0usize];

        while let Some(node_idx) = stack.pop() {
            let node = &self.nodes[node_idx];
            if !node.bounds.ray_intersect(&clipped) {
                continue;
            }

            if node.is_leaf() {
                for i in 0..node.count {
                    let prim_idx = self.indices[node.start + i];
                    if let Some((hit, t)) = hit_fn(prim_idx, &clipped) {
                        if clipped.update(t) {
                            closest = Some((prim_idx, hit));
                        }
                    }
                }
            } else {
                stack.push(node.left);
                stack.push(node.right);
            }
        }

        closest
    }

    /// Any-hit traversal for occlusion queries; stops at the first primitive
    /// the callback accepts.
    pub fn intersect_any<F>(&self, ray: &Ray3f, mut hit_fn: F) -> bool
    where
        F: FnMut(usize, &Ray3f) -> bool,
    {
        if self.nodes.is_empty() {
            return false;
        }

        let mut stack = vec![0usize];
        while let Some(node_idx) = stack.pop() {
            let node = &self.nodes[node_idx];
            if !node.bounds.ray_intersect(ray) {
                continue;
            }
            if node.is_leaf() {
                for i in 0..node.count {
                    if hit_fn(self.indices[node.start + i], ray) {
                        return true;
                    }
                }
            } else {
                stack.push(node.left);
                stack.push(node.right);
            }
        }

        false
    }

    fn build(&mut self, start: usize, end: usize, bounds: AABB, centroid_bounds: AABB) -> usize {
        let count = end - start;
        if count <= MAX_LEAF_SIZE {
            let node_idx = self.nodes.len();
            self.nodes.push(Node::leaf(bounds, start, count));
            return node_idx;
        }

        let axis = centroid_bounds.max_extent() as usize;
        let axis_min = centroid_bounds.p_min[axis];
        let axis_max = centroid_bounds.p_max[axis];
        if (axis_max - axis_min).abs() < 1e-6 {
            let node_idx = self.nodes.len();
            self.nodes.push(Node::leaf(bounds, start, count));
            return node_idx;
        }

        // SAH over fixed buckets along the widest centroid axis.
        let bucket_of = |c: Float| -> usize {
            let b = ((c - axis_min) / (axis_max - axis_min) * SAH_BUCKETS as Float) as usize;
            b.min(SAH_BUCKETS - 1)
        };

        let mut bucket_counts = [0usize; SAH_BUCKETS];
        let mut bucket_bounds = [AABB::default(); SAH_BUCKETS];
        for i in start..end {
            let idx = self.indices[i];
            let b = bucket_of(self.prim_centroids[idx][axis]);
            bucket_counts[b] += 1;
            bucket_bounds[b].expand_by_aabb(&self.prim_bounds[idx]);
        }

        let area = bounds.surface_area().max(1e-6);
        let mut min_cost = std::f32::MAX;
        let mut min_split = 0usize;
        for split in 0..(SAH_BUCKETS - 1) {
            let mut b0 = AABB::default();
            let mut b1 = AABB::default();
            let mut count0 = 0usize;
            let mut count1 = 0usize;
            for b in 0..=split {
                count0 += bucket_counts[b];
                b0.expand_by_aabb(&bucket_bounds[b]);
            }
            for b in (split + 1)..SAH_BUCKETS {
                count1 += bucket_counts[b];
                b1.expand_by_aabb(&bucket_bounds[b]);
            }
            let cost0 = if count0 > 0 { count0 as Float * b0.surface_area() } else { 0.0 };
            let cost1 = if count1 > 0 { count1 as Float * b1.surface_area() } else { 0.0 };
            let cost = 1.0 + (cost0 + cost1) / area;
            if cost < min_cost {
                min_cost = cost;
                min_split = split;
            }
        }

        if min_cost >= count as Float {
            let node_idx = self.nodes.len();
            self.nodes.push(Node::leaf(bounds, start, count));
            return node_idx;
        }

        // Partition indices in-place by bucket.
        let mut mid = start;
        for i in start..end {
            let idx = self.indices[i];
            if bucket_of(self.prim_centroids[idx][axis]) <= min_split {
                self.indices.swap(i, mid);
                mid += 1;
            }
        }

        if mid == start || mid == end {
            let node_idx = self.nodes.len();
            self.nodes.push(Node::leaf(bounds, start, count));
            return node_idx;
        }

        let (left_bounds, left_centroids) = self.compute_bounds(start, mid);
        let (right_bounds, right_centroids) = self.compute_bounds(mid, end);
        let node_idx = self.nodes.len();
        self.nodes.push(Node::leaf(bounds, 0, 0));
        let left = self.build(start, mid, left_bounds, left_centroids);
        let right = self.build(mid, end, right_bounds, right_centroids);
        self.nodes[node_idx] = Node { bounds, left, right, start: 0, count: 0 };
        node_idx
    }

    fn compute_bounds(&self, start: usize, end: usize) -> (AABB, AABB) {
        let mut bounds = AABB::default();
        let mut centroid_bounds = AABB::default();
        for i in start..end {
            let idx = self.indices[i];
            bounds.expand_by_aabb(&self.prim_bounds[idx]);
            centroid_bounds.expand_by_point(&self.prim_centroids[idx]);
        }
        (bounds, centroid_bounds)
    }
}
