// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Draggable fixtures.
//!
//! A drag maps pointer movement in pixels to an offset in the wall plane
//! using the pixel-to-world scale captured when the drag starts. While a
//! drag session is open the fixture's placement parameter is locked in the
//! store; only the session writes to it.

use crate::assets::AssetKey;
use crate::error::{Error, Result};
use crate::params::{ParamKey, ParameterStore};
use crate::scene::NodeTag;
use nalgebra::{Point2, Point3, Vector3};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use std::fmt;
use wallcraft_geometry::Color;

/// Kind of fixture mounted on the wall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixtureKind {
    Window,
    Socket,
    Switch,
}

impl FixtureKind {
    pub const ALL: [FixtureKind; 3] = [FixtureKind::Window, FixtureKind::Socket, FixtureKind::Switch];

    pub fn as_str(self) -> &'static str {
        match self {
            FixtureKind::Window => "window",
            FixtureKind::Socket => "socket",
            FixtureKind::Switch => "switch",
        }
    }

    /// Windows open a hole in the wall slab
    pub fn cuts_wall(self) -> bool {
        matches!(self, FixtureKind::Window)
    }

    pub fn asset_key(self) -> AssetKey {
        match self {
            FixtureKind::Window => AssetKey::Windows,
            FixtureKind::Socket => AssetKey::Socket,
            FixtureKind::Switch => AssetKey::Switch,
        }
    }

    pub fn tag(self) -> NodeTag {
        match self {
            FixtureKind::Window => NodeTag::Window,
            FixtureKind::Socket => NodeTag::Socket,
            FixtureKind::Switch => NodeTag::Switch,
        }
    }
}

impl fmt::Display for FixtureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numbered position of a fixture within its kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixtureSlot {
    pub kind: FixtureKind,
    pub index: u32,
}

impl FixtureSlot {
    pub fn new(kind: FixtureKind, index: u32) -> Self {
        Self { kind, index }
    }

    pub fn placement_key(self) -> ParamKey {
        ParamKey::Placement(self)
    }
}

new_key_type! {
    /// Stable handle of a fixture for the whole session
    pub struct FixtureId;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    pub slot: FixtureSlot,
    /// Wall-local position of the fixture origin
    pub position: Point3<f64>,
    pub color: Color,
    pub visible: bool,
}

/// State captured when a drag starts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub origin_pointer: Point2<f64>,
    pub origin_position: Point3<f64>,
    /// Viewport pixels per world unit at drag start
    pub pixel_to_world_scale: f64,
}

impl DragSession {
    /// Position for the pointer at `pointer`. Screen y grows downwards, so
    /// it is negated; z never changes.
    pub fn position_at(&self, pointer: Point2<f64>) -> Point3<f64> {
        let scale = self.pixel_to_world_scale;
        let dx = (pointer.x - self.origin_pointer.x) / scale;
        let dy = (pointer.y - self.origin_pointer.y) / scale;
        self.origin_position + Vector3::new(dx, -dy, 0.0)
    }
}

/// Viewport metadata supplied by the renderer
pub trait Projection {
    /// Viewport width in pixels
    fn viewport_pixel_width(&self) -> f64;

    /// Width of the wall plane visible across the viewport, in world units
    fn viewport_world_width(&self) -> f64;

    fn pixel_to_world_scale(&self) -> f64 {
        self.viewport_pixel_width() / self.viewport_world_width()
    }
}

/// Perspective camera looking straight at the wall plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveViewport {
    pub width_px: f64,
    pub height_px: f64,
    /// Vertical field of view
    pub fov_y_degrees: f64,
    /// Camera distance to the wall plane
    pub distance: f64,
}

impl PerspectiveViewport {
    pub const DEFAULT_FOV_Y_DEGREES: f64 = 50.0;
    pub const DEFAULT_DISTANCE: f64 = 4.0;

    /// Default camera for a viewport of the given pixel size
    pub fn new(width_px: f64, height_px: f64) -> Self {
        Self {
            width_px,
            height_px,
            fov_y_degrees: Self::DEFAULT_FOV_Y_DEGREES,
            distance: Self::DEFAULT_DISTANCE,
        }
    }

    pub fn aspect(&self) -> f64 {
        self.width_px / self.height_px
    }
}

impl Projection for PerspectiveViewport {
    fn viewport_pixel_width(&self) -> f64 {
        self.width_px
    }

    fn viewport_world_width(&self) -> f64 {
        let half_fov = self.fov_y_degrees.to_radians() / 2.0;
        2.0 * self.distance * half_fov.tan() * self.aspect()
    }
}

/// Fixed mapping, for orthographic views and tests
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthographicViewport {
    pub width_px: f64,
    pub world_width: f64,
}

impl Projection for OrthographicViewport {
    fn viewport_pixel_width(&self) -> f64 {
        self.width_px
    }

    fn viewport_world_width(&self) -> f64 {
        self.world_width
    }
}

/// Owns fixtures and their drag sessions
#[derive(Debug, Default)]
pub struct FixturePlacement {
    fixtures: SlotMap<FixtureId, Fixture>,
    slots: FxHashMap<FixtureSlot, FixtureId>,
    sessions: FxHashMap<FixtureId, DragSession>,
}

impl FixturePlacement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile fixtures with the store's counts, colours and placements.
    ///
    /// Slots below the count are shown, created on first use; slots at or
    /// above it are hidden and any drag on them is closed first. Returns the
    /// number of visible fixtures.
    pub fn sync(&mut self, store: &mut ParameterStore) -> Result<usize> {
        let mut visible_count = 0;

        for kind in FixtureKind::ALL {
            let count = store.count(ParamKey::FixtureCount(kind))?;
            let color = store.color(ParamKey::FixtureColor(kind))?;
            let limit = store.limit(ParamKey::FixtureCount(kind)).unwrap_or(count);

            for index in 0..limit.max(count) {
                let slot = FixtureSlot::new(kind, index);
                let visible = index < count;

                let id = match self.slots.get(&slot) {
                    Some(&id) => id,
                    None if visible => {
                        let position = store.point(slot.placement_key())?;
                        let id = self.fixtures.insert(Fixture {
                            slot,
                            position,
                            color,
                            visible,
                        });
                        self.slots.insert(slot, id);
                        tracing::debug!(%kind, index, "Created fixture");
                        id
                    }
                    None => continue,
                };

                if !visible && self.sessions.contains_key(&id) {
                    tracing::debug!(%kind, index, "Hiding fixture closes its drag");
                    self.close_session(store, id)?;
                }

                let position = store.point(slot.placement_key())?;
                if let Some(fixture) = self.fixtures.get_mut(id) {
                    fixture.visible = visible;
                    fixture.color = color;
                    fixture.position = position;
                }
                if visible {
                    visible_count += 1;
                }
            }
        }

        Ok(visible_count)
    }

    /// Refresh fixture colours only
    pub fn sync_colors(&mut self, store: &ParameterStore) -> Result<()> {
        for fixture in self.fixtures.values_mut() {
            fixture.color = store.color(ParamKey::FixtureColor(fixture.slot.kind))?;
        }
        Ok(())
    }

    pub fn get(&self, id: FixtureId) -> Option<&Fixture> {
        self.fixtures.get(id)
    }

    pub fn id_for(&self, slot: FixtureSlot) -> Option<FixtureId> {
        self.slots.get(&slot).copied()
    }

    /// Visible fixtures ordered by kind, then slot index
    pub fn visible(&self) -> Vec<(FixtureId, &Fixture)> {
        let mut visible: Vec<_> = self.fixtures.iter().filter(|(_, f)| f.visible).collect();
        visible.sort_by_key(|(_, f)| f.slot);
        visible
    }

    pub fn session(&self, id: FixtureId) -> Option<&DragSession> {
        self.sessions.get(&id)
    }

    pub fn is_dragging(&self, id: FixtureId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Start dragging `id` from screen position `pointer`
    pub fn begin_drag(
        &mut self,
        store: &mut ParameterStore,
        id: FixtureId,
        pointer: Point2<f64>,
        projection: &dyn Projection,
    ) -> Result<()> {
        let fixture = self.fixtures.get(id).ok_or(Error::UnknownFixture(id))?;
        if !fixture.visible || hidden_by_count(store, fixture.slot)? {
            return Err(Error::HiddenFixture(id));
        }
        if self.sessions.contains_key(&id) {
            return Err(Error::AlreadyDragging(id));
        }

        let scale = projection.pixel_to_world_scale();
        if !(scale.is_finite() && scale > 0.0) {
            return Err(Error::Config(format!(
                "projection gives unusable pixel-to-world scale {}",
                scale
            )));
        }

        let session = DragSession {
            origin_pointer: pointer,
            origin_position: fixture.position,
            pixel_to_world_scale: scale,
        };
        let key = fixture.slot.placement_key();
        tracing::debug!(fixture = %key, scale, "Drag started");

        self.sessions.insert(id, session);
        store.lock(key);
        store.write(ParamKey::Dragging, true.into())?;
        Ok(())
    }

    /// Move the dragged fixture to follow `pointer`.
    ///
    /// Returns the new position, or `None` if `id` has no open session. A
    /// fixture whose count was lowered since the last sync is hidden already:
    /// its session is closed here and the update discarded.
    pub fn update_drag(
        &mut self,
        store: &mut ParameterStore,
        id: FixtureId,
        pointer: Point2<f64>,
    ) -> Result<Option<Point3<f64>>> {
        let Some(session) = self.sessions.get(&id) else {
            return Ok(None);
        };
        let position = session.position_at(pointer);

        let Some(slot) = self.fixtures.get(id).map(|f| f.slot) else {
            return Ok(None);
        };
        if hidden_by_count(store, slot)? {
            tracing::debug!(kind = %slot.kind, index = slot.index, "Dropping drag on hidden fixture");
            self.close_session(store, id)?;
            if let Some(fixture) = self.fixtures.get_mut(id) {
                fixture.visible = false;
            }
            return Ok(None);
        }

        let Some(fixture) = self.fixtures.get_mut(id) else {
            return Ok(None);
        };
        fixture.position = position;
        store.write(fixture.slot.placement_key(), position.into())?;
        Ok(Some(position))
    }

    /// Finish dragging `id`. Returns false if there was no session.
    pub fn end_drag(&mut self, store: &mut ParameterStore, id: FixtureId) -> Result<bool> {
        if !self.sessions.contains_key(&id) {
            return Ok(false);
        }
        self.close_session(store, id)?;
        Ok(true)
    }

    fn close_session(&mut self, store: &mut ParameterStore, id: FixtureId) -> Result<()> {
        self.sessions.remove(&id);
        if let Some(fixture) = self.fixtures.get(id) {
            store.unlock(fixture.slot.placement_key());
        }
        if self.sessions.is_empty() {
            store.write(ParamKey::Dragging, false.into())?;
        }
        Ok(())
    }
}

/// True if the store's count no longer shows `slot`
fn hidden_by_count(store: &ParameterStore, slot: FixtureSlot) -> Result<bool> {
    Ok(slot.index >= store.count(ParamKey::FixtureCount(slot.kind))?)
}
