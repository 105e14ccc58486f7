// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CSG (Constructive Solid Geometry) Operations
//!
//! Thin bridge between [`Mesh`] and csgrs BSP meshes. Only the operations the
//! wall compositor needs are exposed: union of tool volumes and difference
//! against a host solid.

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::triangulation::{polygon_normal, project_to_plane, triangulate_polygon};
use nalgebra::{Point3, Vector3};
use smallvec::SmallVec;

type CsgMesh = csgrs::mesh::Mesh<()>;

/// Boolean operations on closed triangle meshes
#[derive(Debug, Clone, Copy)]
pub struct CsgProcessor {
    /// Triangles with a smaller doubled area are dropped on conversion
    pub epsilon: f64,
}

impl CsgProcessor {
    /// Create a new processor
    pub fn new() -> Self {
        Self { epsilon: 1e-10 }
    }

    /// `host - tool`
    pub fn subtract(&self, host: &Mesh, tool: &Mesh) -> Result<Mesh> {
        use csgrs::traits::CSG;

        // Fast path: nothing to remove
        if tool.is_empty() {
            return Ok(host.clone());
        }
        if host.is_empty() {
            return Ok(Mesh::new());
        }

        let host_csg = self.mesh_to_csgrs(host);
        let tool_csg = self.mesh_to_csgrs(tool);
        Self::csgrs_to_mesh(&host_csg.difference(&tool_csg))
    }

    /// Union of all `meshes` as one solid
    pub fn union_all(&self, meshes: &[Mesh]) -> Result<Mesh> {
        use csgrs::traits::CSG;

        let solids: SmallVec<[&Mesh; 4]> = meshes.iter().filter(|m| !m.is_empty()).collect();
        match solids.as_slice() {
            [] => Ok(Mesh::new()),
            [single] => Ok((*single).clone()),
            [first, rest @ ..] => {
                let mut acc = self.mesh_to_csgrs(first);
                for mesh in rest {
                    acc = acc.union(&self.mesh_to_csgrs(mesh));
                }
                Self::csgrs_to_mesh(&acc)
            }
        }
    }

    /// Convert our Mesh format to csgrs Mesh format
    fn mesh_to_csgrs(&self, mesh: &Mesh) -> CsgMesh {
        use csgrs::mesh::{polygon::Polygon, vertex::Vertex};

        let mut polygons = Vec::with_capacity(mesh.triangle_count());

        for [v0, v1, v2] in mesh.triangles() {
            // Flat face normal; degenerate triangles would poison the BSP planes
            let cross = (v1 - v0).cross(&(v2 - v0));
            if cross.norm() <= self.epsilon {
                continue;
            }
            let face_normal = cross.normalize();

            let vertices = vec![
                Vertex::new(v0, face_normal),
                Vertex::new(v1, face_normal),
                Vertex::new(v2, face_normal),
            ];
            polygons.push(Polygon::new(vertices, None));
        }

        CsgMesh::from_polygons(&polygons, None)
    }

    /// Convert csgrs Mesh format back to our Mesh format
    fn csgrs_to_mesh(csg_mesh: &CsgMesh) -> Result<Mesh> {
        let mut mesh = Mesh::new();

        for polygon in &csg_mesh.polygons {
            let vertices = &polygon.vertices;
            if vertices.len() < 3 {
                continue;
            }

            let points: SmallVec<[Point3<f64>; 8]> = vertices
                .iter()
                .map(|v| Point3::new(v.pos[0], v.pos[1], v.pos[2]))
                .collect();

            // Trust the BSP plane normal when it is usable, else recompute
            let raw = Vector3::new(vertices[0].normal[0], vertices[0].normal[1], vertices[0].normal[2]);
            let normal = match raw.try_normalize(1e-10) {
                Some(n) if n.iter().all(|c| c.is_finite()) => n,
                _ => match polygon_normal(&points) {
                    Some(n) => n,
                    None => continue,
                },
            };

            let indices = if points.len() == 3 {
                vec![0, 1, 2]
            } else {
                match triangulate_polygon(&project_to_plane(&points, &normal)) {
                    Ok(idx) => idx,
                    Err(_) => continue,
                }
            };

            let base = mesh.vertex_count() as u32;
            for p in &points {
                mesh.add_vertex(*p, normal);
            }

            for tri in indices.chunks_exact(3) {
                let (a, b, c) = (tri[0], tri[1], tri[2]);
                // earcut does not promise a winding; keep every triangle facing `normal`
                let facing = (points[b] - points[a]).cross(&(points[c] - points[a])).dot(&normal);
                if facing >= 0.0 {
                    mesh.add_triangle(base + a as u32, base + b as u32, base + c as u32);
                } else {
                    mesh.add_triangle(base + a as u32, base + c as u32, base + b as u32);
                }
            }
        }

        if csg_mesh.polygons.is_empty() {
            return Ok(mesh);
        }
        if mesh.is_empty() {
            return Err(Error::Geometry(format!(
                "boolean result had {} polygons but none triangulated",
                csg_mesh.polygons.len()
            )));
        }
        Ok(mesh)
    }
}

impl Default for CsgProcessor {
    fn default() -> Self {
        Self::new()
    }
}
