// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wallcraft Geometry
//!
//! Pure geometry for parametric wall assemblies: the panel column layout,
//! picture-frame wood members and window cutouts subtracted from the wall
//! slab with csgrs.

pub mod color;
pub mod csg;
pub mod cutout;
pub mod error;
pub mod frame;
pub mod layout;
pub mod mesh;
pub mod triangulation;

// Re-export nalgebra types for convenience
pub use nalgebra::{Isometry3, Point2, Point3, Vector2, Vector3};

pub use color::Color;
pub use csg::CsgProcessor;
pub use cutout::{Cutout, CutoutCompositor, WallSlab, CUTOUT_DEPTH_FACTOR};
pub use error::{Error, Result};
pub use frame::{FrameSide, PanelFrame, PanelFrameBuilder, WoodMember, DEFAULT_WOOD_DEPTH, DEFAULT_WOOD_WIDTH};
pub use layout::{column_width, layout_panels, PanelGrid, PanelRectangle, RowLayout};
pub use mesh::Mesh;
