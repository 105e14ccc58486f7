// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Picture-frame outlines made of four wood members.
//!
//! Each board is a box with its length along local X, width along Y and
//! depth along Z. The top board is rotated 180° to become the bottom one and
//! the side board is rotated 90°/270° for left/right, so a frame only needs
//! two distinct board meshes.

use crate::color::Color;
use crate::error::{Error, Result};
use crate::layout::PanelRectangle;
use crate::mesh::Mesh;
use nalgebra::{Isometry3, Point3, Vector3};
use rustc_hash::FxHashMap;
use std::f64::consts::{FRAC_PI_2, PI};
use std::sync::Arc;

/// Default board width (face dimension visible on the wall)
pub const DEFAULT_WOOD_WIDTH: f64 = 0.01;
/// Default board depth (how far it stands off the wall)
pub const DEFAULT_WOOD_DEPTH: f64 = 0.005;

/// Which edge of the panel a member borders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameSide {
    Top,
    Bottom,
    Left,
    Right,
}

impl FrameSide {
    pub const ALL: [FrameSide; 4] = [FrameSide::Top, FrameSide::Bottom, FrameSide::Left, FrameSide::Right];

    /// Rotation about the wall normal, always a multiple of 90°
    pub fn rotation(self) -> f64 {
        match self {
            FrameSide::Top => 0.0,
            FrameSide::Bottom => PI,
            FrameSide::Left => FRAC_PI_2,
            FrameSide::Right => 3.0 * FRAC_PI_2,
        }
    }
}

/// One board of a panel frame
#[derive(Debug, Clone)]
pub struct WoodMember {
    pub side: FrameSide,
    pub length: f64,
    pub width: f64,
    pub depth: f64,
    pub color: Color,
    /// Placement relative to the panel centre
    pub transform: Isometry3<f64>,
    /// Board geometry, shared between opposite sides
    pub board: Arc<Mesh>,
}

impl WoodMember {
    /// The two corners of the board's outer long edge, panel-local
    pub fn outer_corners(&self) -> [Point3<f64>; 2] {
        let half_len = self.length / 2.0;
        let half_width = self.width / 2.0;
        [
            self.transform * Point3::new(-half_len, half_width, 0.0),
            self.transform * Point3::new(half_len, half_width, 0.0),
        ]
    }
}

/// Four members outlining one panel rectangle
#[derive(Debug, Clone)]
pub struct PanelFrame {
    pub rect: PanelRectangle,
    pub members: [WoodMember; 4],
}

impl PanelFrame {
    /// Member transform in wall-local space
    pub fn member_transform(&self, member: &WoodMember) -> Isometry3<f64> {
        Isometry3::translation(self.rect.center.x, self.rect.center.y, self.rect.center.z)
            * member.transform
    }
}

type BoardKey = (u64, u64, u64);

/// Builds panel frames, sharing board meshes of equal size
#[derive(Debug, Default)]
pub struct PanelFrameBuilder {
    boards: FxHashMap<BoardKey, Arc<Mesh>>,
}

impl PanelFrameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct board meshes built so far
    pub fn cached_boards(&self) -> usize {
        self.boards.len()
    }

    /// Drop all cached boards
    pub fn clear(&mut self) {
        self.boards.clear();
    }

    fn board(&mut self, length: f64, width: f64, depth: f64) -> Arc<Mesh> {
        let key = (length.to_bits(), width.to_bits(), depth.to_bits());
        Arc::clone(
            self.boards
                .entry(key)
                .or_insert_with(|| Arc::new(Mesh::cuboid(length, width, depth))),
        )
    }

    /// Outline `rect` with four boards of `wood_width` x `wood_depth`.
    ///
    /// Every board spans the full edge it borders, so neighbouring boards lap
    /// over each other by `wood_width` at the corners and the outer corners
    /// meet exactly.
    pub fn build_frame(
        &mut self,
        rect: &PanelRectangle,
        wood_width: f64,
        wood_depth: f64,
        color: Color,
    ) -> Result<PanelFrame> {
        if !(wood_width > 0.0 && wood_depth > 0.0) {
            return Err(Error::Configuration(format!(
                "wood member must be positive, got {} x {}",
                wood_width, wood_depth
            )));
        }
        if !(rect.width > 0.0 && rect.height > 0.0) {
            return Err(Error::Configuration(format!(
                "panel must be positive, got {} x {}",
                rect.width, rect.height
            )));
        }

        let horizontal = self.board(rect.width, wood_width, wood_depth);
        let vertical = self.board(rect.height, wood_width, wood_depth);

        let inset_y = rect.height / 2.0 - wood_width / 2.0;
        let inset_x = rect.width / 2.0 - wood_width / 2.0;

        let member = |side: FrameSide| {
            let (offset, length, board) = match side {
                FrameSide::Top => (Vector3::new(0.0, inset_y, 0.0), rect.width, &horizontal),
                FrameSide::Bottom => (Vector3::new(0.0, -inset_y, 0.0), rect.width, &horizontal),
                FrameSide::Left => (Vector3::new(-inset_x, 0.0, 0.0), rect.height, &vertical),
                FrameSide::Right => (Vector3::new(inset_x, 0.0, 0.0), rect.height, &vertical),
            };
            WoodMember {
                side,
                length,
                width: wood_width,
                depth: wood_depth,
                color,
                transform: Isometry3::new(offset, Vector3::z() * side.rotation()),
                board: Arc::clone(board),
            }
        };

        Ok(PanelFrame {
            rect: *rect,
            members: FrameSide::ALL.map(member),
        })
    }
}
