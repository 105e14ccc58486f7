// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One configurator session: store, fixtures and assembler wired together.

use crate::assets::AssetLoader;
use crate::config::WallConfig;
use crate::dispatch::{dispatch_click, dispatch_missed, PointerHit, Propagation};
use crate::error::Result;
use crate::params::{ParamKey, ParamValue, ParameterStore};
use crate::placement::{FixtureId, FixturePlacement, FixtureSlot, Projection};
use crate::scene::{AssemblerStats, Scene, SceneAssembler, UpdateReport};
use nalgebra::{Point2, Point3};
use wallcraft_geometry::Color;

/// Event handlers write to the store; [`WallSession::update`] brings the
/// scene up to date.
#[derive(Debug)]
pub struct WallSession {
    store: ParameterStore,
    placement: FixturePlacement,
    assembler: SceneAssembler,
}

impl WallSession {
    /// Build the initial scene from `config`
    pub fn new(config: &WallConfig, assets: impl AssetLoader + 'static) -> Self {
        let mut session = Self {
            store: ParameterStore::new(config),
            placement: FixturePlacement::new(),
            assembler: SceneAssembler::new(assets),
        };
        let report = session.update();
        tracing::info!(
            nodes = session.scene().len(),
            errors = report.errors.len(),
            "Session started"
        );
        session
    }

    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    /// Direct store access, e.g. for subscriptions
    pub fn store_mut(&mut self) -> &mut ParameterStore {
        &mut self.store
    }

    pub fn placement(&self) -> &FixturePlacement {
        &self.placement
    }

    pub fn scene(&self) -> &Scene {
        self.assembler.scene()
    }

    pub fn stats(&self) -> AssemblerStats {
        self.assembler.stats()
    }

    pub fn set(&mut self, key: ParamKey, value: impl Into<ParamValue>) -> Result<bool> {
        self.store.set(key, value)
    }

    /// Rebuild what changed since the last update
    pub fn update(&mut self) -> UpdateReport {
        self.assembler.update(&mut self.store, &mut self.placement)
    }

    /// Id of the fixture in `slot`, once it has been shown
    pub fn fixture(&self, slot: FixtureSlot) -> Option<FixtureId> {
        self.placement.id_for(slot)
    }

    pub fn begin_drag(
        &mut self,
        id: FixtureId,
        pointer: Point2<f64>,
        projection: &dyn Projection,
    ) -> Result<()> {
        self.placement.begin_drag(&mut self.store, id, pointer, projection)
    }

    pub fn drag_to(&mut self, id: FixtureId, pointer: Point2<f64>) -> Result<Option<Point3<f64>>> {
        self.placement.update_drag(&mut self.store, id, pointer)
    }

    pub fn end_drag(&mut self, id: FixtureId) -> Result<bool> {
        self.placement.end_drag(&mut self.store, id)
    }

    pub fn click(&mut self, hits: &[PointerHit]) -> Result<Propagation> {
        dispatch_click(&mut self.store, hits)
    }

    pub fn pointer_missed(&mut self) -> Result<()> {
        dispatch_missed(&mut self.store)
    }

    /// Paint the selected item
    pub fn paint(&mut self, color: Color) -> Result<bool> {
        self.store.paint_selection(color)
    }
}
