// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh data structures

use nalgebra::{Isometry3, Point3, Vector3};

/// Triangle mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f32>,
    /// Vertex normals (nx, ny, nz)
    pub normals: Vec<f32>,
    /// Triangle indices (i0, i1, i2)
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Create a mesh with capacity
    pub fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count * 3),
            normals: Vec::with_capacity(vertex_count * 3),
            indices: Vec::with_capacity(index_count),
        }
    }

    /// Closed box spanning `min..max`, 12 triangles with flat face normals.
    ///
    /// Faces wind counter-clockwise when viewed from outside, so the signed
    /// [`volume`](Self::volume) of the result is positive.
    pub fn from_aabb(min: Point3<f64>, max: Point3<f64>) -> Self {
        let mut mesh = Mesh::with_capacity(24, 36);

        let v0 = Point3::new(min.x, min.y, min.z);
        let v1 = Point3::new(max.x, min.y, min.z);
        let v2 = Point3::new(max.x, max.y, min.z);
        let v3 = Point3::new(min.x, max.y, min.z);
        let v4 = Point3::new(min.x, min.y, max.z);
        let v5 = Point3::new(max.x, min.y, max.z);
        let v6 = Point3::new(max.x, max.y, max.z);
        let v7 = Point3::new(min.x, max.y, max.z);

        // One quad per face: -Z, +Z, -X, +X, -Y, +Y
        mesh.add_quad([v0, v3, v2, v1], -Vector3::z());
        mesh.add_quad([v4, v5, v6, v7], Vector3::z());
        mesh.add_quad([v0, v4, v7, v3], -Vector3::x());
        mesh.add_quad([v1, v2, v6, v5], Vector3::x());
        mesh.add_quad([v0, v1, v5, v4], -Vector3::y());
        mesh.add_quad([v3, v7, v6, v2], Vector3::y());

        mesh
    }

    /// Box of the given extents centred on the origin
    pub fn cuboid(size_x: f64, size_y: f64, size_z: f64) -> Self {
        let half = Vector3::new(size_x, size_y, size_z) * 0.5;
        Self::from_aabb(Point3::origin() - half, Point3::origin() + half)
    }

    /// Add a vertex with normal
    #[inline]
    pub fn add_vertex(&mut self, position: Point3<f64>, normal: Vector3<f64>) {
        self.positions.push(position.x as f32);
        self.positions.push(position.y as f32);
        self.positions.push(position.z as f32);

        self.normals.push(normal.x as f32);
        self.normals.push(normal.y as f32);
        self.normals.push(normal.z as f32);
    }

    /// Add a triangle
    #[inline]
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.push(i0);
        self.indices.push(i1);
        self.indices.push(i2);
    }

    /// Add a planar quad (two triangles) sharing one flat normal
    fn add_quad(&mut self, corners: [Point3<f64>; 4], normal: Vector3<f64>) {
        let base = self.vertex_count() as u32;
        for corner in corners {
            self.add_vertex(corner, normal);
        }
        self.add_triangle(base, base + 1, base + 2);
        self.add_triangle(base, base + 2, base + 3);
    }

    /// Merge another mesh into this one
    #[inline]
    pub fn merge(&mut self, other: &Mesh) {
        if other.is_empty() {
            return;
        }

        let vertex_offset = (self.positions.len() / 3) as u32;

        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.indices
            .extend(other.indices.iter().map(|&i| i + vertex_offset));
    }

    /// Copy of this mesh with every vertex and normal moved by `transform`
    pub fn transformed(&self, transform: &Isometry3<f64>) -> Mesh {
        let mut out = Mesh::with_capacity(self.vertex_count(), self.indices.len());
        for (p, n) in self
            .positions
            .chunks_exact(3)
            .zip(self.normals.chunks_exact(3))
        {
            let position = transform * Point3::new(p[0] as f64, p[1] as f64, p[2] as f64);
            let normal = transform * Vector3::new(n[0] as f64, n[1] as f64, n[2] as f64);
            out.add_vertex(position, normal);
        }
        out.indices.extend_from_slice(&self.indices);
        out
    }

    /// Get vertex position in f64
    #[inline]
    pub fn vertex(&self, index: usize) -> Point3<f64> {
        Point3::new(
            self.positions[index * 3] as f64,
            self.positions[index * 3 + 1] as f64,
            self.positions[index * 3 + 2] as f64,
        )
    }

    /// Iterate over triangles as vertex triples
    pub fn triangles(&self) -> impl Iterator<Item = [Point3<f64>; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            [
                self.vertex(tri[0] as usize),
                self.vertex(tri[1] as usize),
                self.vertex(tri[2] as usize),
            ]
        })
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Get triangle count
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if mesh is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    /// Calculate bounds (min, max)
    #[inline]
    pub fn bounds(&self) -> (Point3<f32>, Point3<f32>) {
        if self.is_empty() {
            return (Point3::origin(), Point3::origin());
        }

        let mut min = Point3::new(f32::MAX, f32::MAX, f32::MAX);
        let mut max = Point3::new(f32::MIN, f32::MIN, f32::MIN);

        self.positions.chunks_exact(3).for_each(|chunk| {
            let (x, y, z) = (chunk[0], chunk[1], chunk[2]);
            min.x = min.x.min(x);
            min.y = min.y.min(y);
            min.z = min.z.min(z);
            max.x = max.x.max(x);
            max.y = max.y.max(y);
            max.z = max.z.max(z);
        });

        (min, max)
    }

    /// Enclosed volume of a closed, outward-wound mesh.
    ///
    /// Sums signed tetrahedra against the origin (divergence theorem). T-junctions
    /// left behind by BSP splitting do not affect the result as long as the
    /// surface is closed.
    pub fn volume(&self) -> f64 {
        self.triangles()
            .map(|[a, b, c]| a.coords.dot(&b.coords.cross(&c.coords)) / 6.0)
            .sum()
    }

    /// Total surface area
    pub fn surface_area(&self) -> f64 {
        self.triangles()
            .map(|[a, b, c]| (b - a).cross(&(c - a)).norm() * 0.5)
            .sum()
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Translation3;

    #[test]
    fn test_mesh_creation() {
        let mesh = Mesh::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    fn test_add_vertex() {
        let mut mesh = Mesh::new();
        mesh.add_vertex(Point3::new(1.0, 2.0, 3.0), Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(mesh.vertex_count(), 1);
        assert_eq!(mesh.positions, vec![1.0, 2.0, 3.0]);
        assert_eq!(mesh.normals, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_merge_offsets_indices() {
        let mut a = Mesh::cuboid(1.0, 1.0, 1.0);
        let b = Mesh::cuboid(1.0, 1.0, 1.0);
        let before = a.vertex_count() as u32;
        a.merge(&b);
        assert_eq!(a.triangle_count(), 24);
        assert_eq!(a.indices[36], before);
    }

    #[test]
    fn test_cuboid_volume_and_area() {
        let mesh = Mesh::cuboid(2.0, 2.0, 0.5);
        assert_eq!(mesh.triangle_count(), 12);
        assert_relative_eq!(mesh.volume(), 2.0, epsilon = 1e-6);
        assert_relative_eq!(mesh.surface_area(), 2.0 * (4.0 + 1.0 + 1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_cuboid_bounds_are_centred() {
        let (min, max) = Mesh::cuboid(2.0, 1.0, 0.1).bounds();
        assert_relative_eq!(min.x, -1.0);
        assert_relative_eq!(max.y, 0.5);
        assert_relative_eq!(max.z, 0.05);
    }

    #[test]
    fn test_transformed_moves_bounds_keeps_volume() {
        let mesh = Mesh::cuboid(1.0, 1.0, 1.0);
        let moved = mesh.transformed(&Isometry3::from_parts(
            Translation3::new(3.0, 0.0, 0.0),
            nalgebra::UnitQuaternion::identity(),
        ));
        let (min, max) = moved.bounds();
        assert_relative_eq!(min.x, 2.5);
        assert_relative_eq!(max.x, 3.5);
        assert_relative_eq!(moved.volume(), 1.0, epsilon = 1e-6);
    }
}
