// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Prebuilt fixture models.
//!
//! Bundles are opaque: the scene only groups, tints and places their parts
//! and never touches vertex data.

use nalgebra::Point3;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use wallcraft_geometry::{Color, Mesh, PanelFrameBuilder, PanelRectangle};

/// Name of a loadable bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKey {
    Windows,
    Socket,
    Switch,
}

impl AssetKey {
    pub const ALL: [AssetKey; 3] = [AssetKey::Windows, AssetKey::Socket, AssetKey::Switch];

    pub fn as_str(self) -> &'static str {
        match self {
            AssetKey::Windows => "windows",
            AssetKey::Socket => "socket",
            AssetKey::Switch => "switch",
        }
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named sub-mesh of a bundle with its authored colour
#[derive(Debug, Clone, PartialEq)]
pub struct AssetPart {
    pub name: String,
    pub mesh: Arc<Mesh>,
    pub color: Color,
}

impl AssetPart {
    pub fn new(name: impl Into<String>, mesh: Mesh, color: Color) -> Self {
        Self {
            name: name.into(),
            mesh: Arc::new(mesh),
            color,
        }
    }

    /// Only frame parts take the user's colour
    pub fn is_tintable(&self) -> bool {
        self.name.starts_with("frame")
    }

    /// Colour to render with when the fixture is painted `tint`
    pub fn tinted(&self, tint: Color) -> Color {
        if self.is_tintable() {
            tint
        } else {
            self.color
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetBundle {
    pub key: AssetKey,
    pub parts: Vec<AssetPart>,
}

/// Source of fixture bundles
pub trait AssetLoader {
    /// `None` while the bundle is unavailable; callers skip the fixture
    fn load(&self, key: AssetKey) -> Option<Arc<AssetBundle>>;
}

/// Loader serving bundles held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryAssets {
    bundles: FxHashMap<AssetKey, Arc<AssetBundle>>,
}

const GLASS: Color = Color::rgb(0xcc, 0xe6, 0xff);
const INSERT: Color = Color::rgb(0x30, 0x30, 0x30);

impl InMemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, bundle: AssetBundle) {
        self.bundles.insert(bundle.key, Arc::new(bundle));
    }

    /// Box placeholders for every bundle. The window is sized to the
    /// default 0.8 x 1 cutout.
    pub fn placeholders() -> Self {
        let mut assets = Self::new();
        assets.insert(window_placeholder(0.8, 1.0));
        assets.insert(plate_placeholder(AssetKey::Socket, 0.08, 0.08, "outlet"));
        assets.insert(plate_placeholder(AssetKey::Switch, 0.08, 0.08, "rocker"));
        assets
    }
}

impl AssetLoader for InMemoryAssets {
    fn load(&self, key: AssetKey) -> Option<Arc<AssetBundle>> {
        self.bundles.get(&key).cloned()
    }
}

fn window_placeholder(width: f64, height: f64) -> AssetBundle {
    let rect = PanelRectangle {
        width,
        height,
        center: Point3::origin(),
        row: 0,
        column: 0,
    };

    let mut frame = Mesh::new();
    // Positive constants cannot fail to frame
    if let Ok(outline) = PanelFrameBuilder::new().build_frame(&rect, 0.04, 0.06, Color::WHITE) {
        for member in &outline.members {
            frame.merge(&member.board.transformed(&member.transform));
        }
    }

    AssetBundle {
        key: AssetKey::Windows,
        parts: vec![
            AssetPart::new("frame", frame, Color::WHITE),
            AssetPart::new("glass", Mesh::cuboid(width - 0.08, height - 0.08, 0.004), GLASS),
        ],
    }
}

fn plate_placeholder(key: AssetKey, width: f64, height: f64, insert: &str) -> AssetBundle {
    AssetBundle {
        key,
        parts: vec![
            AssetPart::new("frame_plate", Mesh::cuboid(width, height, 0.01), Color::WHITE),
            AssetPart::new(insert, Mesh::cuboid(width * 0.5, height * 0.5, 0.014), INSERT),
        ],
    }
}
