// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pointer routing: clicks select, misses deselect.

use crate::error::Result;
use crate::params::ParameterStore;
use crate::placement::FixtureId;
use crate::scene::{NodeTag, SceneNode};

/// One object under the pointer, as reported by the renderer's raycast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerHit {
    pub tag: NodeTag,
    /// Distance from the camera along the ray
    pub distance: f64,
    pub fixture: Option<FixtureId>,
}

impl PointerHit {
    pub fn new(tag: NodeTag, distance: f64) -> Self {
        Self {
            tag,
            distance,
            fixture: None,
        }
    }

    pub fn on_node(node: &SceneNode, distance: f64) -> Self {
        Self {
            tag: node.tag,
            distance,
            fixture: node.fixture,
        }
    }
}

/// Whether the event should keep bubbling to objects behind the hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Continue,
    Stop,
}

fn nearest(hits: &[PointerHit]) -> Option<&PointerHit> {
    hits.iter().min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Select the nearest hit. Stops propagation when something was hit.
pub fn dispatch_click(store: &mut ParameterStore, hits: &[PointerHit]) -> Result<Propagation> {
    match nearest(hits) {
        Some(hit) => {
            tracing::debug!(tag = %hit.tag, "Selected");
            store.select(Some(hit.tag))?;
            Ok(Propagation::Stop)
        }
        None => Ok(Propagation::Continue),
    }
}

/// A click that hit nothing clears the selection
pub fn dispatch_missed(store: &mut ParameterStore) -> Result<()> {
    store.select(None)?;
    Ok(())
}

/// Fixture a pointer-down on `hits` would start dragging
pub fn drag_target(hits: &[PointerHit]) -> Option<FixtureId> {
    nearest(hits).and_then(|hit| hit.fixture)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_selects_nearest_and_stops() {
        let mut store = ParameterStore::default();
        let hits = [
            PointerHit::new(NodeTag::Wall, 4.0),
            PointerHit::new(NodeTag::Panel, 3.995),
        ];
        assert_eq!(dispatch_click(&mut store, &hits).unwrap(), Propagation::Stop);
        assert_eq!(store.selection(), Some(NodeTag::Panel));
    }

    #[test]
    fn empty_click_continues_and_miss_clears() {
        let mut store = ParameterStore::default();
        store.select(Some(NodeTag::Skirting)).unwrap();

        assert_eq!(dispatch_click(&mut store, &[]).unwrap(), Propagation::Continue);
        assert_eq!(store.selection(), Some(NodeTag::Skirting));

        dispatch_missed(&mut store).unwrap();
        assert_eq!(store.selection(), None);
    }

    #[test]
    fn drag_target_needs_a_fixture_on_top() {
        assert_eq!(drag_target(&[PointerHit::new(NodeTag::Wall, 1.0)]), None);
        assert_eq!(drag_target(&[]), None);
    }
}
