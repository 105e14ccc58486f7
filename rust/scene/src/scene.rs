// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scene assembly.
//!
//! The scene is split into three branches that rebuild independently: the
//! wall (composited slab plus skirting), the panel frames and the fixtures.
//! [`SceneAssembler::update`] drains the store's dirty scopes and rebuilds
//! only the branches they touch. Colour changes restyle existing nodes
//! without rebuilding geometry. A branch whose inputs fail keeps its last
//! good nodes.

use crate::assets::{AssetKey, AssetLoader};
use crate::error::{Error, Result};
use crate::params::{ParamKey, ParameterStore, Scope};
use crate::placement::{FixtureId, FixtureKind, FixturePlacement};
use nalgebra::Isometry3;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;
use wallcraft_geometry::{
    layout_panels, Color, Cutout, CutoutCompositor, Mesh, PanelFrameBuilder, PanelGrid,
    PanelRectangle, WallSlab,
};

/// Name tag the renderer and pointer handlers key on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeTag {
    Wall,
    Panel,
    Skirting,
    Window,
    Socket,
    Switch,
}

impl NodeTag {
    pub const ALL: [NodeTag; 6] = [
        NodeTag::Wall,
        NodeTag::Panel,
        NodeTag::Skirting,
        NodeTag::Window,
        NodeTag::Socket,
        NodeTag::Switch,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeTag::Wall => "wall",
            NodeTag::Panel => "panel",
            NodeTag::Skirting => "skirting",
            NodeTag::Window => "window",
            NodeTag::Socket => "socket",
            NodeTag::Switch => "switch",
        }
    }

    pub fn fixture_kind(self) -> Option<FixtureKind> {
        match self {
            NodeTag::Window => Some(FixtureKind::Window),
            NodeTag::Socket => Some(FixtureKind::Socket),
            NodeTag::Switch => Some(FixtureKind::Switch),
            _ => None,
        }
    }
}

impl fmt::Display for NodeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        NodeTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| Error::Config(format!("unknown node tag '{}'", s)))
    }
}

/// Geometry of a node: built here, or a part of a loaded bundle
#[derive(Debug, Clone, PartialEq)]
pub enum NodeGeometry {
    Mesh(Arc<Mesh>),
    Asset {
        key: AssetKey,
        part: String,
        mesh: Arc<Mesh>,
    },
}

impl NodeGeometry {
    pub fn mesh(&self) -> &Arc<Mesh> {
        match self {
            NodeGeometry::Mesh(mesh) => mesh,
            NodeGeometry::Asset { mesh, .. } => mesh,
        }
    }
}

/// One renderable item
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub tag: NodeTag,
    pub geometry: NodeGeometry,
    pub color: Color,
    /// Wall-local placement
    pub transform: Isometry3<f64>,
    /// Owning fixture, for fixture nodes
    pub fixture: Option<FixtureId>,
    /// Whether the node follows its colour parameter
    pub paintable: bool,
}

impl SceneNode {
    fn built(tag: NodeTag, mesh: Arc<Mesh>, color: Color, transform: Isometry3<f64>) -> Self {
        Self {
            tag,
            geometry: NodeGeometry::Mesh(mesh),
            color,
            transform,
            fixture: None,
            paintable: true,
        }
    }
}

/// Assembled scene, one list per branch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    /// Wall slab then skirting
    pub wall: Vec<SceneNode>,
    /// Four members per panel, panels in layout order
    pub panels: Vec<SceneNode>,
    /// Fixture parts, fixtures by kind then slot
    pub fixtures: Vec<SceneNode>,
}

impl Scene {
    /// All nodes: wall, skirting, panels, fixtures
    pub fn nodes(&self) -> impl Iterator<Item = &SceneNode> {
        self.wall.iter().chain(&self.panels).chain(&self.fixtures)
    }

    pub fn to_vec(&self) -> Vec<SceneNode> {
        self.nodes().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.wall.len() + self.panels.len() + self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count(&self, tag: NodeTag) -> usize {
        self.nodes().filter(|n| n.tag == tag).count()
    }

    pub fn first(&self, tag: NodeTag) -> Option<&SceneNode> {
        self.nodes().find(|n| n.tag == tag)
    }
}

/// Work counters, mostly for tests and the export summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssemblerStats {
    pub updates: u64,
    pub layout_runs: u64,
    pub layout_cache_hits: u64,
    pub frame_builds: u64,
    pub composite_runs: u64,
    pub composite_cache_hits: u64,
    pub fixture_syncs: u64,
    pub recolors: u64,
}

/// Outcome of one [`SceneAssembler::update`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateReport {
    /// Scopes drained from the store
    pub scopes: Scope,
    /// Branches successfully rebuilt or restyled
    pub rebuilt: Scope,
    /// Failures; the failed branches kept their previous nodes
    pub errors: Vec<Error>,
}

impl UpdateReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Memoized result. The hash is a quick reject; a hit also needs equal
/// inputs.
#[derive(Debug, Clone)]
struct Cached<I, T> {
    key: u64,
    inputs: I,
    value: Arc<T>,
}

impl<I: PartialEq, T> Cached<I, T> {
    fn get(&self, key: u64, inputs: &I) -> Option<Arc<T>> {
        (self.key == key && self.inputs == *inputs).then(|| Arc::clone(&self.value))
    }
}

fn hash_bits(values: impl IntoIterator<Item = f64>) -> u64 {
    let mut hasher = FxHasher::default();
    for value in values {
        value.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

fn grid_key(grid: &PanelGrid) -> u64 {
    let rows = &grid.rows;
    hash_bits(
        [
            grid.wall_width,
            grid.wall_height,
            grid.columns as f64,
            grid.gap,
            rows.gap_ratio,
            rows.anchor as f64,
            rows.offset_ratio,
            rows.ratios.len() as f64,
        ]
        .into_iter()
        .chain(rows.ratios.iter().copied()),
    )
}

fn composite_key(slab: &WallSlab, cutouts: &[Cutout]) -> u64 {
    hash_bits(
        [slab.width, slab.height, slab.depth, cutouts.len() as f64]
            .into_iter()
            .chain(cutouts.iter().flat_map(|c| [c.center.x, c.center.y, c.width, c.height])),
    )
}

/// Builds and incrementally maintains the scene
pub struct SceneAssembler {
    assets: Box<dyn AssetLoader>,
    frames: PanelFrameBuilder,
    compositor: CutoutCompositor,
    layout: Option<Cached<PanelGrid, Vec<PanelRectangle>>>,
    composite: Option<Cached<(WallSlab, Vec<Cutout>), Mesh>>,
    scene: Scene,
    /// Unresolved branch failures, oldest first
    branch_errors: Vec<(Scope, Error)>,
    stats: AssemblerStats,
}

impl fmt::Debug for SceneAssembler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneAssembler")
            .field("nodes", &self.scene.len())
            .field("branch_errors", &self.branch_errors)
            .field("stats", &self.stats)
            .finish()
    }
}

impl SceneAssembler {
    pub fn new(assets: impl AssetLoader + 'static) -> Self {
        Self {
            assets: Box::new(assets),
            frames: PanelFrameBuilder::new(),
            compositor: CutoutCompositor::new(),
            layout: None,
            composite: None,
            scene: Scene::default(),
            branch_errors: Vec::new(),
            stats: AssemblerStats::default(),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn stats(&self) -> AssemblerStats {
        self.stats
    }

    /// Errors of branches still showing stale geometry
    pub fn errors(&self) -> impl Iterator<Item = &Error> {
        self.branch_errors.iter().map(|(_, e)| e)
    }

    /// Rebuild whatever the store marked dirty and return it to idle.
    ///
    /// Fixtures go first because visible windows feed the wall cutouts.
    pub fn update(
        &mut self,
        store: &mut ParameterStore,
        placement: &mut FixturePlacement,
    ) -> UpdateReport {
        let scopes = store.take_dirty();
        let mut report = UpdateReport {
            scopes,
            ..UpdateReport::default()
        };
        if scopes.is_empty() {
            return report;
        }
        self.stats.updates += 1;
        let _span = tracing::debug_span!("scene_update", ?scopes).entered();

        if scopes.contains(Scope::FIXTURES) {
            let result = self.rebuild_fixtures(store, placement);
            self.settle(Scope::FIXTURES, result, &mut report);
        }
        if scopes.contains(Scope::WALL) {
            let result = self.rebuild_wall(store, placement);
            self.settle(Scope::WALL, result, &mut report);
        }
        if scopes.contains(Scope::LAYOUT) {
            let result = self.rebuild_panels(store);
            self.settle(Scope::LAYOUT, result, &mut report);
        }
        if scopes.contains(Scope::APPEARANCE) {
            let result = self.recolor(store, placement);
            self.settle(Scope::APPEARANCE, result, &mut report);
        }

        store.set_last_error(self.branch_errors.last().map(|(_, e)| e.clone()));
        report
    }

    fn settle(&mut self, branch: Scope, result: Result<()>, report: &mut UpdateReport) {
        self.branch_errors.retain(|(scope, _)| *scope != branch);
        match result {
            Ok(()) => report.rebuilt |= branch,
            Err(error) => {
                tracing::warn!(?branch, %error, "Keeping previous geometry");
                report.errors.push(error.clone());
                self.branch_errors.push((branch, error));
            }
        }
    }

    fn rebuild_fixtures(
        &mut self,
        store: &mut ParameterStore,
        placement: &mut FixturePlacement,
    ) -> Result<()> {
        let visible = placement.sync(store)?;
        self.stats.fixture_syncs += 1;

        let mut nodes = Vec::new();
        for (id, fixture) in placement.visible() {
            let key = fixture.slot.kind.asset_key();
            let Some(bundle) = self.assets.load(key) else {
                tracing::debug!(asset = %key, "Bundle not loaded, fixture skipped");
                continue;
            };
            let p = fixture.position;
            let transform = Isometry3::translation(p.x, p.y, p.z);
            for part in &bundle.parts {
                nodes.push(SceneNode {
                    tag: fixture.slot.kind.tag(),
                    geometry: NodeGeometry::Asset {
                        key,
                        part: part.name.clone(),
                        mesh: Arc::clone(&part.mesh),
                    },
                    color: part.tinted(fixture.color),
                    transform,
                    fixture: Some(id),
                    paintable: part.is_tintable(),
                });
            }
        }

        tracing::debug!(fixtures = visible, nodes = nodes.len(), "Rebuilt fixtures");
        self.scene.fixtures = nodes;
        Ok(())
    }

    fn window_cutouts(
        &self,
        store: &ParameterStore,
        placement: &FixturePlacement,
    ) -> Result<Vec<Cutout>> {
        let width = store.number(ParamKey::WindowWidth)?;
        let height = store.number(ParamKey::WindowHeight)?;
        Ok(placement
            .visible()
            .into_iter()
            .filter(|(_, f)| f.slot.kind.cuts_wall())
            .map(|(_, f)| Cutout::new(f.position.x, f.position.y, width, height))
            .collect())
    }

    fn rebuild_wall(&mut self, store: &ParameterStore, placement: &FixturePlacement) -> Result<()> {
        let width = store.number(ParamKey::WallWidth)?;
        let height = store.number(ParamKey::WallHeight)?;
        let depth = store.number(ParamKey::WallDepth)?;
        let skirting_height = store.number(ParamKey::SkirtingHeight)?;
        let skirting_depth = store.number(ParamKey::SkirtingDepth)?;

        if !(skirting_height > 0.0 && skirting_depth > 0.0) {
            return Err(wallcraft_geometry::Error::Configuration(format!(
                "skirting must be positive, got {} x {}",
                skirting_height, skirting_depth
            ))
            .into());
        }

        let slab = WallSlab::new(width, height, depth);
        let cutouts = self.window_cutouts(store, placement)?;
        let key = composite_key(&slab, &cutouts);
        let inputs = (slab, cutouts);

        let hit = self.composite.as_ref().and_then(|c| c.get(key, &inputs));
        let wall_mesh = match hit {
            Some(mesh) => {
                self.stats.composite_cache_hits += 1;
                tracing::debug!(cutouts = inputs.1.len(), "Wall composite unchanged");
                mesh
            }
            None => {
                self.stats.composite_runs += 1;
                let mesh = Arc::new(self.compositor.composite(&inputs.0, &inputs.1)?);
                self.composite = Some(Cached {
                    key,
                    inputs,
                    value: Arc::clone(&mesh),
                });
                mesh
            }
        };

        let skirting = Arc::new(Mesh::cuboid(width, skirting_height, skirting_depth));
        self.scene.wall = vec![
            SceneNode::built(
                NodeTag::Wall,
                wall_mesh,
                store.color(ParamKey::WallColor)?,
                Isometry3::identity(),
            ),
            SceneNode::built(
                NodeTag::Skirting,
                skirting,
                store.color(ParamKey::SkirtingColor)?,
                Isometry3::translation(0.0, -height / 2.0, 0.0),
            ),
        ];
        Ok(())
    }

    fn rebuild_panels(&mut self, store: &ParameterStore) -> Result<()> {
        let grid = PanelGrid {
            wall_width: store.number(ParamKey::WallWidth)?,
            wall_height: store.number(ParamKey::WallHeight)?,
            columns: store.count(ParamKey::ColumnCount)? as usize,
            gap: store.number(ParamKey::ColumnGap)?,
            rows: store.rows(ParamKey::Rows)?.clone(),
        };
        let wood_width = store.number(ParamKey::WoodWidth)?;
        let wood_depth = store.number(ParamKey::WoodDepth)?;
        let color = store.color(ParamKey::PanelColor)?;

        let key = grid_key(&grid);
        let hit = self.layout.as_ref().and_then(|c| c.get(key, &grid));
        let rects = match hit {
            Some(rects) => {
                self.stats.layout_cache_hits += 1;
                rects
            }
            None => {
                self.stats.layout_runs += 1;
                let rects = Arc::new(layout_panels(&grid)?);
                self.layout = Some(Cached {
                    key,
                    inputs: grid.clone(),
                    value: Arc::clone(&rects),
                });
                rects
            }
        };

        // Boards are only shared within one rebuild
        self.frames.clear();
        let mut nodes = Vec::with_capacity(rects.len() * 4);
        for rect in rects.iter() {
            let frame = self.frames.build_frame(rect, wood_width, wood_depth, color)?;
            self.stats.frame_builds += 1;
            for member in &frame.members {
                nodes.push(SceneNode::built(
                    NodeTag::Panel,
                    Arc::clone(&member.board),
                    member.color,
                    frame.member_transform(member),
                ));
            }
        }

        tracing::debug!(
            columns = grid.columns,
            panels = rects.len(),
            boards = self.frames.cached_boards(),
            "Rebuilt panel frames"
        );
        self.scene.panels = nodes;
        Ok(())
    }

    fn recolor(&mut self, store: &ParameterStore, placement: &mut FixturePlacement) -> Result<()> {
        let wall = store.color(ParamKey::WallColor)?;
        let skirting = store.color(ParamKey::SkirtingColor)?;
        let panel = store.color(ParamKey::PanelColor)?;
        let mut fixture_colors = [Color::WHITE; 3];
        for (slot, kind) in fixture_colors.iter_mut().zip(FixtureKind::ALL) {
            *slot = store.color(ParamKey::FixtureColor(kind))?;
        }

        for node in self.scene.nodes_mut() {
            if !node.paintable {
                continue;
            }
            node.color = match node.tag {
                NodeTag::Wall => wall,
                NodeTag::Skirting => skirting,
                NodeTag::Panel => panel,
                NodeTag::Window => fixture_colors[0],
                NodeTag::Socket => fixture_colors[1],
                NodeTag::Switch => fixture_colors[2],
            };
        }
        placement.sync_colors(store)?;

        self.stats.recolors += 1;
        tracing::debug!("Restyled scene");
        Ok(())
    }
}

impl Scene {
    fn nodes_mut(&mut self) -> impl Iterator<Item = &mut SceneNode> {
        self.wall
            .iter_mut()
            .chain(self.panels.iter_mut())
            .chain(self.fixtures.iter_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::InMemoryAssets;
    use crate::config::WallConfig;

    fn build(config: &WallConfig) -> (ParameterStore, FixturePlacement, SceneAssembler) {
        let mut store = ParameterStore::new(config);
        let mut placement = FixturePlacement::new();
        let mut assembler = SceneAssembler::new(InMemoryAssets::placeholders());
        let report = assembler.update(&mut store, &mut placement);
        assert!(report.is_ok(), "{:?}", report.errors);
        (store, placement, assembler)
    }

    #[test]
    fn tags_parse_and_print() {
        for tag in NodeTag::ALL {
            assert_eq!(tag.as_str().parse::<NodeTag>().unwrap(), tag);
        }
        assert!("door".parse::<NodeTag>().is_err());
        assert_eq!(serde_json::to_string(&NodeTag::Skirting).unwrap(), "\"skirting\"");
    }

    #[test]
    fn first_update_builds_every_branch() {
        let (store, _, assembler) = build(&WallConfig::default());
        let scene = assembler.scene();

        assert_eq!(scene.count(NodeTag::Wall), 1);
        assert_eq!(scene.count(NodeTag::Skirting), 1);
        // 4 columns x 3 rows x 4 members
        assert_eq!(scene.count(NodeTag::Panel), 48);
        assert_eq!(scene.fixtures.len(), 0);
        assert_eq!(scene.first(NodeTag::Wall).unwrap().color, Color::ORANGE);

        let stats = assembler.stats();
        assert_eq!(stats.layout_runs, 1);
        assert_eq!(stats.composite_runs, 1);
        assert_eq!(stats.frame_builds, 12);
        assert!(store.last_error().is_none());
    }

    #[test]
    fn idle_store_means_no_work() {
        let (mut store, mut placement, mut assembler) = build(&WallConfig::default());
        let before = assembler.stats();
        let report = assembler.update(&mut store, &mut placement);
        assert!(report.scopes.is_empty());
        assert_eq!(assembler.stats(), before);
    }

    #[test]
    fn panel_colour_restyles_without_rebuilding() {
        let (mut store, mut placement, mut assembler) = build(&WallConfig::default());
        let before = assembler.stats();
        let board = Arc::clone(assembler.scene().panels[0].geometry.mesh());

        store.set(ParamKey::PanelColor, Color::rgb(10, 20, 30)).unwrap();
        let report = assembler.update(&mut store, &mut placement);

        assert_eq!(report.rebuilt, Scope::APPEARANCE);
        let after = assembler.stats();
        assert_eq!(after.composite_runs, before.composite_runs);
        assert_eq!(after.layout_runs, before.layout_runs);
        assert_eq!(after.frame_builds, before.frame_builds);
        assert!(assembler
            .scene()
            .panels
            .iter()
            .all(|n| n.color == Color::rgb(10, 20, 30)));
        assert!(Arc::ptr_eq(&board, assembler.scene().panels[0].geometry.mesh()));
    }

    #[test]
    fn bad_layout_keeps_last_good_panels() {
        let (mut store, mut placement, mut assembler) = build(&WallConfig::default());
        let panels = assembler.scene().panels.clone();

        store.set(ParamKey::ColumnGap, 0.5).unwrap();
        let report = assembler.update(&mut store, &mut placement);

        assert_eq!(report.errors.len(), 1);
        assert!(matches!(
            report.errors[0],
            Error::Geometry(wallcraft_geometry::Error::Configuration(_))
        ));
        assert_eq!(assembler.scene().panels, panels);
        assert!(store.last_error().is_some());

        store.set(ParamKey::ColumnGap, 0.05).unwrap();
        let report = assembler.update(&mut store, &mut placement);
        assert!(report.is_ok());
        assert!(store.last_error().is_none());
        assert_ne!(assembler.scene().panels, panels);
    }

    #[test]
    fn wood_change_reuses_cached_layout() {
        let (mut store, mut placement, mut assembler) = build(&WallConfig::default());
        store.set(ParamKey::WoodWidth, 0.02).unwrap();
        assembler.update(&mut store, &mut placement);

        let stats = assembler.stats();
        assert_eq!(stats.layout_runs, 1);
        assert_eq!(stats.layout_cache_hits, 1);
        assert_eq!(stats.frame_builds, 24);
    }

    #[test]
    fn equal_hash_with_different_inputs_is_a_miss() {
        let (mut store, mut placement, mut assembler) = build(&WallConfig::default());
        let before = assembler.stats();

        // Same keys as the live entries, but built from other inputs
        if let Some(cached) = assembler.layout.as_mut() {
            cached.inputs.columns += 1;
            cached.value = Arc::new(Vec::new());
        }
        if let Some(cached) = assembler.composite.as_mut() {
            cached.inputs.0.width += 1.0;
            cached.value = Arc::new(Mesh::new());
        }

        store.set(ParamKey::WoodWidth, 0.02).unwrap();
        store.set(ParamKey::SkirtingHeight, 0.12).unwrap();
        assert!(assembler.update(&mut store, &mut placement).is_ok());

        let after = assembler.stats();
        assert_eq!(after.layout_runs, before.layout_runs + 1);
        assert_eq!(after.layout_cache_hits, before.layout_cache_hits);
        assert_eq!(after.composite_runs, before.composite_runs + 1);
        assert_eq!(assembler.scene().count(NodeTag::Panel), 48);
        assert!(!assembler.scene().wall[0].geometry.mesh().is_empty());
    }

    #[test]
    fn missing_bundle_skips_fixture() {
        let mut config = WallConfig::default();
        config.sockets.count = 2;
        let mut store = ParameterStore::new(&config);
        let mut placement = FixturePlacement::new();
        let mut assembler = SceneAssembler::new(InMemoryAssets::new());

        let report = assembler.update(&mut store, &mut placement);
        assert!(report.is_ok());
        assert_eq!(placement.visible().len(), 2);
        assert!(assembler.scene().fixtures.is_empty());
    }

    #[test]
    fn skirting_sits_on_the_wall_bottom() {
        let (_, _, assembler) = build(&WallConfig::default());
        let skirting = assembler.scene().first(NodeTag::Skirting).unwrap();
        assert_eq!(skirting.transform.translation.vector.y, -1.0);
        assert_eq!(skirting.color, Color::WHITE);
    }
}
