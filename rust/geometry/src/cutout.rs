// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Window openings cut through the wall slab.
//!
//! Every cutout becomes a box ten times deeper than the slab so the cut goes
//! cleanly through both faces regardless of float alignment. The boxes are
//! unioned first and subtracted in a single pass, which makes the result
//! independent of cutout order and removes the union of overlapping holes.

use crate::csg::CsgProcessor;
use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::{Point2, Point3};
use smallvec::SmallVec;
use std::cmp::Ordering;

/// Hole boxes are this many times deeper than the slab
pub const CUTOUT_DEPTH_FACTOR: f64 = 10.0;

/// Overlap narrower than this counts as touching
const EDGE_TOLERANCE: f64 = 1e-9;

/// Flat wall solid centred on the origin, front face towards +Z
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WallSlab {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl WallSlab {
    pub fn new(width: f64, height: f64, depth: f64) -> Self {
        Self { width, height, depth }
    }

    /// Uncut slab mesh
    pub fn mesh(&self) -> Mesh {
        Mesh::cuboid(self.width, self.height, self.depth)
    }

    pub fn volume(&self) -> f64 {
        self.width * self.height * self.depth
    }
}

/// Axis-aligned rectangular hole, wall-local
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cutout {
    pub center: Point2<f64>,
    pub width: f64,
    pub height: f64,
}

impl Cutout {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            center: Point2::new(x, y),
            width,
            height,
        }
    }

    fn min(&self) -> Point2<f64> {
        Point2::new(self.center.x - self.width / 2.0, self.center.y - self.height / 2.0)
    }

    fn max(&self) -> Point2<f64> {
        Point2::new(self.center.x + self.width / 2.0, self.center.y + self.height / 2.0)
    }

    /// True if the hole and the slab face share a region of positive area.
    /// Holes that only graze an edge within float noise do not count.
    pub fn overlaps(&self, slab: &WallSlab) -> bool {
        let (min, max) = (self.min(), self.max());
        let half_w = slab.width / 2.0 - EDGE_TOLERANCE;
        let half_h = slab.height / 2.0 - EDGE_TOLERANCE;
        min.x < half_w && max.x > -half_w && min.y < half_h && max.y > -half_h
    }

    /// True if the hole removes the whole slab face
    pub fn covers(&self, slab: &WallSlab) -> bool {
        let (min, max) = (self.min(), self.max());
        min.x <= -slab.width / 2.0
            && max.x >= slab.width / 2.0
            && min.y <= -slab.height / 2.0
            && max.y >= slab.height / 2.0
    }

    /// The oversized box actually subtracted from `slab`
    pub fn volume_mesh(&self, slab: &WallSlab) -> Mesh {
        let half_depth = slab.depth * CUTOUT_DEPTH_FACTOR / 2.0;
        let (min, max) = (self.min(), self.max());
        Mesh::from_aabb(
            Point3::new(min.x, min.y, -half_depth),
            Point3::new(max.x, max.y, half_depth),
        )
    }

    fn sort_key_cmp(&self, other: &Cutout) -> Ordering {
        self.center
            .x
            .total_cmp(&other.center.x)
            .then(self.center.y.total_cmp(&other.center.y))
            .then(self.width.total_cmp(&other.width))
            .then(self.height.total_cmp(&other.height))
    }
}

/// Subtracts window cutouts from a wall slab
#[derive(Debug, Clone, Default)]
pub struct CutoutCompositor {
    csg: CsgProcessor,
}

impl CutoutCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the wall mesh with every cutout removed.
    ///
    /// Always starts from a fresh slab. Cutouts that miss the slab entirely
    /// are ignored; a cutout set that removes the whole slab is a
    /// [`Error::Geometry`].
    pub fn composite(&self, slab: &WallSlab, cutouts: &[Cutout]) -> Result<Mesh> {
        if !(slab.width > 0.0 && slab.height > 0.0 && slab.depth > 0.0) {
            return Err(Error::Configuration(format!(
                "wall slab must be positive, got {} x {} x {}",
                slab.width, slab.height, slab.depth
            )));
        }
        if let Some(bad) = cutouts.iter().find(|c| !(c.width > 0.0 && c.height > 0.0)) {
            return Err(Error::Configuration(format!(
                "cutout at ({}, {}) must be positive, got {} x {}",
                bad.center.x, bad.center.y, bad.width, bad.height
            )));
        }

        let mut active: SmallVec<[&Cutout; 4]> =
            cutouts.iter().filter(|c| c.overlaps(slab)).collect();

        if active.is_empty() {
            return Ok(slab.mesh());
        }
        if let Some(full) = active.iter().find(|c| c.covers(slab)) {
            return Err(Error::Geometry(format!(
                "cutout {} x {} at ({}, {}) removes the entire {} x {} wall",
                full.width, full.height, full.center.x, full.center.y, slab.width, slab.height
            )));
        }

        // Canonical order so equal sets give equal meshes
        active.sort_by(|a, b| a.sort_key_cmp(b));

        let holes: Vec<Mesh> = active.iter().map(|c| c.volume_mesh(slab)).collect();
        let tool = self.csg.union_all(&holes)?;
        let result = self.csg.subtract(&slab.mesh(), &tool)?;

        let volume = result.volume();
        if result.is_empty() || volume <= slab.volume() * 1e-9 {
            return Err(Error::Geometry(format!(
                "{} cutouts leave no wall behind (volume {:.3e})",
                active.len(),
                volume
            )));
        }

        tracing::debug!(
            cutouts = active.len(),
            ignored = cutouts.len() - active.len(),
            triangles = result.triangle_count(),
            "Composited wall cutouts"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_and_cover_tests() {
        let slab = WallSlab::new(2.0, 2.0, 0.01);
        assert!(Cutout::new(0.0, 0.35, 0.8, 1.0).overlaps(&slab));
        assert!(!Cutout::new(3.0, 0.0, 0.8, 1.0).overlaps(&slab));
        // Touching the edge is not overlapping, even off by float noise
        assert!(!Cutout::new(1.5, 0.0, 1.0, 1.0).overlaps(&slab));
        assert!(!Cutout::new(1.4, 0.0, 0.8, 1.0).overlaps(&slab));
        assert!(!Cutout::new(0.0, -1.3, 0.5, 0.6).overlaps(&slab));
        assert!(Cutout::new(1.39, 0.0, 0.8, 1.0).overlaps(&slab));

        assert!(Cutout::new(0.0, 0.0, 2.0, 2.0).covers(&slab));
        assert!(Cutout::new(0.1, 0.0, 3.0, 2.5).covers(&slab));
        assert!(!Cutout::new(0.0, 0.0, 1.9, 2.0).covers(&slab));
    }

    #[test]
    fn volume_mesh_is_ten_times_deeper() {
        let slab = WallSlab::new(2.0, 2.0, 0.01);
        let (min, max) = Cutout::new(0.0, 0.0, 0.5, 0.5).volume_mesh(&slab).bounds();
        assert!((max.z - min.z - 0.1).abs() < 1e-6);
    }

    #[test]
    fn no_cutouts_returns_plain_slab() {
        let slab = WallSlab::new(2.0, 2.0, 0.01);
        let mesh = CutoutCompositor::new().composite(&slab, &[]).unwrap();
        assert_eq!(mesh, slab.mesh());
    }

    #[test]
    fn rejects_degenerate_inputs() {
        let compositor = CutoutCompositor::new();
        let flat = WallSlab::new(2.0, 2.0, 0.0);
        assert!(matches!(compositor.composite(&flat, &[]), Err(Error::Configuration(_))));

        let slab = WallSlab::new(2.0, 2.0, 0.01);
        let zero = Cutout::new(0.0, 0.0, 0.0, 1.0);
        assert!(matches!(compositor.composite(&slab, &[zero]), Err(Error::Configuration(_))));
    }
}
