// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON summary of an assembled scene.

use serde::Serialize;
use std::collections::BTreeMap;
use wallcraft_geometry::Color;
use wallcraft_scene::{AssemblerStats, NodeGeometry, NodeTag, Scene, SceneNode};

#[derive(Debug, Serialize)]
pub struct SceneSummary {
    pub node_count: usize,
    pub tags: BTreeMap<NodeTag, usize>,
    pub wall: Option<WallSummary>,
    pub stats: AssemblerStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NodeSummary>,
}

#[derive(Debug, Serialize)]
pub struct WallSummary {
    pub color: Color,
    pub triangles: usize,
    pub volume: f64,
    pub bounds: [[f32; 3]; 2],
}

#[derive(Debug, Serialize)]
pub struct NodeSummary {
    pub tag: NodeTag,
    pub color: Color,
    /// Bundle part name for asset nodes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part: Option<String>,
    pub translation: [f64; 3],
    pub triangles: usize,
}

impl NodeSummary {
    fn from_node(node: &SceneNode) -> Self {
        let t = node.transform.translation.vector;
        Self {
            tag: node.tag,
            color: node.color,
            part: match &node.geometry {
                NodeGeometry::Asset { key, part, .. } => Some(format!("{}/{}", key, part)),
                NodeGeometry::Mesh(_) => None,
            },
            translation: [t.x, t.y, t.z],
            triangles: node.geometry.mesh().triangle_count(),
        }
    }
}

impl SceneSummary {
    pub fn new(
        scene: &Scene,
        stats: AssemblerStats,
        last_error: Option<String>,
        include_nodes: bool,
    ) -> Self {
        let mut tags = BTreeMap::new();
        for node in scene.nodes() {
            *tags.entry(node.tag).or_insert(0) += 1;
        }

        let wall = scene.first(NodeTag::Wall).map(|node| {
            let mesh = node.geometry.mesh();
            let (min, max) = mesh.bounds();
            WallSummary {
                color: node.color,
                triangles: mesh.triangle_count(),
                volume: mesh.volume(),
                bounds: [[min.x, min.y, min.z], [max.x, max.y, max.z]],
            }
        });

        let nodes = if include_nodes {
            scene.nodes().map(NodeSummary::from_node).collect()
        } else {
            Vec::new()
        };

        Self {
            node_count: scene.len(),
            tags,
            wall,
            stats,
            last_error,
            nodes,
        }
    }
}
