// Copyright 2026 @lucent

use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f, Vector3i};

/// Voxels covered by one macro cell of the empty-space-skipping grid.
const GRID_CELL_VOXELS: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldFilter {
    Nearest,
    Trilinear,
}

/// Per-macro-cell scalar value ranges, precomputed once at field commit.
/// Volumes fold their transfer function over these ranges to derive the
/// max-opacity table the marcher skips against.
pub struct UniformGrid {
    dims: Vector3i,
    world_bounds: AABB,
    cell_size: Vector3f,
    value_ranges: Vec<(Float, Float)>,
}

impl UniformGrid {
    fn build(field: &StructuredField) -> Self {
        let (nx, ny, nz) = field.dims;
        let gx = ((nx + GRID_CELL_VOXELS - 1) / GRID_CELL_VOXELS).max(1);
        let gy = ((ny + GRID_CELL_VOXELS - 1) / GRID_CELL_VOXELS).max(1);
        let gz = ((nz + GRID_CELL_VOXELS - 1) / GRID_CELL_VOXELS).max(1);

        let world_bounds = field.bounds();
        let diag = world_bounds.diagnal();
        let cell_size = Vector3f::new(
            diag.x / gx as Float,
            diag.y / gy as Float,
            diag.z / gz as Float,
        );

        let mut value_ranges = vec![(std::f32::MAX, std::f32::MIN); gx * gy * gz];
        for cz in 0..gz {
            for cy in 0..gy {
                for cx in 0..gx {
                    // Expand the voxel window by one so trilinear support
                    // from neighbor cells stays inside the range.
                    let x0 = (cx * GRID_CELL_VOXELS).saturating_sub(1);
                    let y0 = (cy * GRID_CELL_VOXELS).saturating_sub(1);
                    let z0 = (cz * GRID_CELL_VOXELS).saturating_sub(1);
                    let x1 = ((cx + 1) * GRID_CELL_VOXELS + 1).min(nx);
                    let y1 = ((cy + 1) * GRID_CELL_VOXELS + 1).min(ny);
                    let z1 = ((cz + 1) * GRID_CELL_VOXELS + 1).min(nz);

                    let mut lo = std::f32::MAX;
                    let mut hi = std::f32::MIN;
                    for z in z0..z1 {
                        for y in y0..y1 {
                            for x in x0..x1 {
                                let v = field.fetch(x, y, z);
                                lo = lo.min(v);
                                hi = hi.max(v);
                            }
                        }
                    }
                    value_ranges[(cz * gy + cy) * gx + cx] = (lo, hi);
                }
            }
        }

        Self {
            dims: Vector3i::new(gx as i32, gy as i32, gz as i32),
            world_bounds,
            cell_size,
            value_ranges,
        }
    }

    pub fn dims(&self) -> Vector3i {
        self.dims
    }

    pub fn world_bounds(&self) -> &AABB {
        &self.world_bounds
    }

    pub fn cell_size(&self) -> Vector3f {
        self.cell_size
    }

    pub fn cell_count(&self) -> usize {
        self.value_ranges.len()
    }

    pub fn cell_index(&self, cx: i32, cy: i32, cz: i32) -> Option<usize> {
        if cx < 0 || cy < 0 || cz < 0
            || cx >= self.dims.x || cy >= self.dims.y || cz >= self.dims.z
        {
            return None;
        }
        Some(((cz * self.dims.y + cy) * self.dims.x + cx) as usize)
    }

    pub fn cell_of_point(&self, p: Vector3f) -> Option<(i32, i32, i32)> {
        if !self.world_bounds.contains(&p) {
            return None;
        }
        let rel = p - self.world_bounds.p_min;
        let cx = (rel.x / self.cell_size.x.max(1e-8)) as i32;
        let cy = (rel.y / self.cell_size.y.max(1e-8)) as i32;
        let cz = (rel.z / self.cell_size.z.max(1e-8)) as i32;
        Some((
            cx.clamp(0, self.dims.x - 1),
            cy.clamp(0, self.dims.y - 1),
            cz.clamp(0, self.dims.z - 1),
        ))
    }

    pub fn value_range(&self, cell: usize) -> (Float, Float) {
        self.value_ranges[cell]
    }
}

/// Structured-regular scalar field: `dims` samples spaced `spacing` apart
/// starting at `origin`, with clamp addressing.
pub struct StructuredField {
    data: Vec<Float>,
    dims: (usize, usize, usize),
    origin: Vector3f,
    spacing: Vector3f,
    filter: FieldFilter,
    grid: Option<UniformGrid>,
}

impl StructuredField {
    pub fn new(data: Vec<Float>,
               dims: (usize, usize, usize),
               origin: Vector3f,
               spacing: Vector3f,
               filter: FieldFilter) -> Result<Self, String> {
        let (nx, ny, nz) = dims;
        let expected = nx
            .checked_mul(ny)
            .and_then(|v| v.checked_mul(nz))
            .ok_or_else(|| "field dimensions overflow".to_string())?;
        if expected != data.len() {
            return Err(format!(
                "field data length {} does not match dims {}x{}x{}",
                data.len(), nx, ny, nz
            ));
        }
        if nx == 0 || ny == 0 || nz == 0 {
            return Err("field dimensions must be positive".to_string());
        }
        if spacing.x <= 0.0 || spacing.y <= 0.0 || spacing.z <= 0.0 {
            return Err("field spacing must be positive".to_string());
        }

        let mut field = Self { data, dims, origin, spacing, filter, grid: None };
        field.grid = Some(UniformGrid::build(&field));
        Ok(field)
    }

    pub fn is_valid(&self) -> bool {
        let (nx, ny, nz) = self.dims;
        !self.data.is_empty() && nx > 0 && ny > 0 && nz > 0 && self.bounds().is_valid()
    }

    pub fn bounds(&self) -> AABB {
        let (nx, ny, nz) = self.dims;
        let extent = Vector3f::new(
            (nx.max(1) - 1) as Float * self.spacing.x,
            (ny.max(1) - 1) as Float * self.spacing.y,
            (nz.max(1) - 1) as Float * self.spacing.z,
        );
        AABB::new(self.origin, self.origin + extent)
    }

    /// Characteristic marching step: half the smallest voxel spacing.
    pub fn step_size(&self) -> Float {
        0.5 * self.spacing.x.min(self.spacing.y).min(self.spacing.z)
    }

    pub fn grid(&self) -> &UniformGrid {
        self.grid.as_ref().expect("grid built at construction")
    }

    fn fetch(&self, x: usize, y: usize, z: usize) -> Float {
        let (nx, ny, _) = self.dims;
        self.data[(z * ny + y) * nx + x]
    }

    pub fn sample(&self, p_world: Vector3f) -> Float {
        let (nx, ny, nz) = self.dims;
        // World -> voxel coordinates.
        let v = Vector3f::new(
            (p_world.x - self.origin.x) / self.spacing.x,
            (p_world.y - self.origin.y) / self.spacing.y,
            (p_world.z - self.origin.z) / self.spacing.z,
        );

        match self.filter {
            FieldFilter::Nearest => {
                let x = ((v.x + 0.5).floor() as isize).clamp(0, nx as isize - 1) as usize;
                let y = ((v.y + 0.5).floor() as isize).clamp(0, ny as isize - 1) as usize;
                let z = ((v.z + 0.5).floor() as isize).clamp(0, nz as isize - 1) as usize;
                self.fetch(x, y, z)
            }
            FieldFilter::Trilinear => {
                let x0 = v.x.floor() as isize;
                let y0 = v.y.floor() as isize;
                let z0 = v.z.floor() as isize;
                let tx = v.x - x0 as Float;
                let ty = v.y - y0 as Float;
                let tz = v.z - z0 as Float;

                let x0u = x0.clamp(0, nx as isize - 1) as usize;
                let y0u = y0.clamp(0, ny as isize - 1) as usize;
                let z0u = z0.clamp(0, nz as isize - 1) as usize;
                let x1u = (x0 + 1).clamp(0, nx as isize - 1) as usize;
                let y1u = (y0 + 1).clamp(0, ny as isize - 1) as usize;
                let z1u = (z0 + 1).clamp(0, nz as isize - 1) as usize;

                let c000 = self.fetch(x0u, y0u, z0u);
                let c100 = self.fetch(x1u, y0u, z0u);
                let c010 = self.fetch(x0u, y1u, z0u);
                let c110 = self.fetch(x1u, y1u, z0u);
                let c001 = self.fetch(x0u, y0u, z1u);
                let c101 = self.fetch(x1u, y0u, z1u);
                let c011 = self.fetch(x0u, y1u, z1u);
                let c111 = self.fetch(x1u, y1u, z1u);

                let c00 = c000 * (1.0 - tx) + c100 * tx;
                let c10 = c010 * (1.0 - tx) + c110 * tx;
                let c01 = c001 * (1.0 - tx) + c101 * tx;
                let c11 = c011 * (1.0 - tx) + c111 * tx;

                let c0 = c00 * (1.0 - ty) + c10 * ty;
                let c1 = c01 * (1.0 - ty) + c11 * ty;

                c0 * (1.0 - tz) + c1 * tz
            }
        }
    }
}
