// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use approx::assert_relative_eq;
use nalgebra::{Point2, Point3};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use wallcraft_geometry::Color;
use wallcraft_scene::{
    Error, FixtureKind, FixtureSlot, InMemoryAssets, NodeGeometry, NodeTag, OrthographicViewport,
    ParamKey, PointerHit, Propagation, Scope, StoreState, WallConfig, WallSession,
};

/// 200 px per world unit
const SCREEN: OrthographicViewport = OrthographicViewport {
    width_px: 800.0,
    world_width: 4.0,
};

fn session_with(windows: u32, sockets: u32) -> WallSession {
    let mut config = WallConfig::default();
    config.windows.fixtures.count = windows;
    config.sockets.count = sockets;
    WallSession::new(&config, InMemoryAssets::placeholders())
}

fn wall_volume(session: &WallSession) -> f64 {
    session
        .scene()
        .first(NodeTag::Wall)
        .map(|n| n.geometry.mesh().volume())
        .unwrap_or(0.0)
}

#[test]
fn default_wall_has_window_cut_through() {
    let session = session_with(1, 0);
    assert_eq!(session.store().state(), StoreState::Idle);

    // 2 x 2 x 0.001 slab minus a 0.8 x 1 window
    assert_relative_eq!(wall_volume(&session), 0.004 - 0.0008, max_relative = 1e-3);

    let window_nodes: Vec<_> = session
        .scene()
        .fixtures
        .iter()
        .filter(|n| n.tag == NodeTag::Window)
        .collect();
    assert_eq!(window_nodes.len(), 2);
    assert!(window_nodes.iter().all(|n| n.fixture.is_some()));
    assert_relative_eq!(window_nodes[0].transform.translation.vector.y, 0.35);
}

#[test]
fn first_panel_column_matches_the_stock_wall() {
    let session = session_with(0, 0);
    let panels = &session.scene().panels;
    assert_eq!(panels.len(), 4 * 3 * 4);

    // Top member of the first panel: column centre x, width 0.375
    let top = &panels[0];
    assert_relative_eq!(top.transform.translation.vector.x, -0.7125, epsilon = 1e-12);
    let (min, max) = top.geometry.mesh().bounds();
    assert_relative_eq!(max.x - min.x, 0.375, epsilon = 1e-6);
}

#[test]
fn column_count_and_panel_colour_never_recomposite() {
    let mut session = session_with(1, 0);
    let composites = session.stats().composite_runs;
    let wall = Arc::clone(session.scene().wall[0].geometry.mesh());

    session.set(ParamKey::ColumnCount, 6u32).unwrap();
    session.set(ParamKey::PanelColor, Color::rgb(0x33, 0x66, 0x99)).unwrap();
    let report = session.update();

    assert!(report.is_ok());
    assert_eq!(report.scopes, Scope::LAYOUT | Scope::APPEARANCE);
    assert_eq!(session.stats().composite_runs, composites);
    assert_eq!(session.scene().count(NodeTag::Panel), 6 * 3 * 4);
    assert!(Arc::ptr_eq(&wall, session.scene().wall[0].geometry.mesh()));
    assert!(session
        .scene()
        .panels
        .iter()
        .all(|n| n.color == Color::rgb(0x33, 0x66, 0x99)));
}

#[test]
fn dragging_a_window_recomposites_the_wall() {
    let mut session = session_with(1, 0);
    let composites = session.stats().composite_runs;
    let id = session.fixture(FixtureSlot::new(FixtureKind::Window, 0)).unwrap();

    session.begin_drag(id, Point2::new(400.0, 300.0), &SCREEN).unwrap();
    let moved = session.drag_to(id, Point2::new(440.0, 320.0)).unwrap().unwrap();
    assert_relative_eq!(moved.x, 0.2, epsilon = 1e-12);
    assert_relative_eq!(moved.y, 0.35 - 0.1, epsilon = 1e-12);

    let report = session.update();
    assert!(report.rebuilt.contains(Scope::WALL | Scope::FIXTURES));
    assert_eq!(session.stats().composite_runs, composites + 1);
    // Moving the hole leaves the removed area unchanged
    assert_relative_eq!(wall_volume(&session), 0.004 - 0.0008, max_relative = 1e-3);

    let frame = session
        .scene()
        .fixtures
        .iter()
        .find(|n| n.tag == NodeTag::Window)
        .unwrap();
    assert_relative_eq!(frame.transform.translation.vector.x, 0.2, epsilon = 1e-12);

    // Back to the start is exactly the original position
    let back = session.drag_to(id, Point2::new(400.0, 300.0)).unwrap().unwrap();
    assert_eq!(back, Point3::new(0.0, 0.35, 0.0));
    session.end_drag(id).unwrap();
    session.update();
    // Same cutouts as the first build, but the cache only holds the latest
    assert_eq!(session.stats().composite_runs, composites + 2);
}

#[test]
fn dragging_a_socket_leaves_the_wall_alone() {
    let mut session = session_with(1, 2);
    let composites = session.stats().composite_runs;
    let id = session.fixture(FixtureSlot::new(FixtureKind::Socket, 0)).unwrap();

    session.begin_drag(id, Point2::new(0.0, 0.0), &SCREEN).unwrap();
    session.drag_to(id, Point2::new(-20.0, 0.0)).unwrap();
    let report = session.update();

    assert!(!report.scopes.contains(Scope::WALL));
    assert_eq!(session.stats().composite_runs, composites);
    assert!(session.store().is_dragging());
    session.end_drag(id).unwrap();
    assert!(!session.store().is_dragging());
}

#[test]
fn placement_set_fails_while_dragged() {
    let mut session = session_with(0, 1);
    let slot = FixtureSlot::new(FixtureKind::Socket, 0);
    let id = session.fixture(slot).unwrap();

    session.begin_drag(id, Point2::origin(), &SCREEN).unwrap();
    let err = session.set(ParamKey::Placement(slot), Point3::new(0.5, 0.5, 0.0));
    assert_eq!(err, Err(Error::Locked(ParamKey::Placement(slot))));

    session.end_drag(id).unwrap();
    assert!(session.set(ParamKey::Placement(slot), Point3::new(0.5, 0.5, 0.0)).unwrap());
}

#[test]
fn hiding_a_socket_mid_drag_ignores_later_updates() {
    let mut session = session_with(0, 2);
    let id = session.fixture(FixtureSlot::new(FixtureKind::Socket, 1)).unwrap();
    session.begin_drag(id, Point2::origin(), &SCREEN).unwrap();
    session.drag_to(id, Point2::new(10.0, 10.0)).unwrap();

    session.set(ParamKey::FixtureCount(FixtureKind::Socket), 1u32).unwrap();
    session.update();

    assert!(!session.placement().is_dragging(id));
    assert!(!session.store().is_dragging());
    assert_eq!(session.drag_to(id, Point2::new(90.0, 90.0)).unwrap(), None);
    assert!(!session.end_drag(id).unwrap());
    assert!(session
        .scene()
        .fixtures
        .iter()
        .all(|n| n.fixture != Some(id)));
}

#[test]
fn lowering_the_count_discards_drags_before_the_next_update() {
    let mut session = session_with(0, 2);
    let slot = FixtureSlot::new(FixtureKind::Socket, 1);
    let id = session.fixture(slot).unwrap();
    let start = session.store().point(ParamKey::Placement(slot)).unwrap();
    session.begin_drag(id, Point2::origin(), &SCREEN).unwrap();

    session.set(ParamKey::FixtureCount(FixtureKind::Socket), 1u32).unwrap();
    assert_eq!(session.drag_to(id, Point2::new(100.0, 0.0)).unwrap(), None);

    assert!(!session.placement().is_dragging(id));
    assert!(!session.store().is_dragging());
    assert_eq!(session.store().point(ParamKey::Placement(slot)).unwrap(), start);

    assert!(session.update().is_ok());
    assert_eq!(session.scene().count(NodeTag::Socket), 2);
}

#[test]
fn dragging_flag_cannot_be_set_directly() {
    let mut session = session_with(0, 0);
    assert_eq!(
        session.set(ParamKey::Dragging, true),
        Err(Error::Locked(ParamKey::Dragging))
    );
    assert!(!session.store().is_dragging());
    assert_eq!(session.placement().active_sessions(), 0);
}

#[test]
fn oversized_window_keeps_the_last_good_wall() {
    let mut session = session_with(1, 0);
    let wall = session.scene().wall.clone();

    session.set(ParamKey::WindowWidth, 3.0).unwrap();
    session.set(ParamKey::WindowHeight, 3.0).unwrap();
    let report = session.update();

    assert_eq!(report.errors.len(), 1);
    assert!(matches!(
        report.errors[0],
        Error::Geometry(wallcraft_geometry::Error::Geometry(_))
    ));
    assert_eq!(session.scene().wall, wall);
    assert!(session.store().last_error().is_some());

    session.set(ParamKey::WindowWidth, 0.5).unwrap();
    session.set(ParamKey::WindowHeight, 0.5).unwrap();
    assert!(session.update().is_ok());
    assert!(session.store().last_error().is_none());
    assert_relative_eq!(wall_volume(&session), 0.004 - 0.00025, max_relative = 1e-3);
}

#[test]
fn click_then_paint_recolours_the_selection() {
    let mut session = session_with(1, 0);
    let composites = session.stats().composite_runs;

    let hits = [
        PointerHit::new(NodeTag::Wall, 4.0),
        PointerHit::new(NodeTag::Window, 3.9),
    ];
    assert_eq!(session.click(&hits).unwrap(), Propagation::Stop);
    assert!(session.paint(Color::ORANGE).unwrap());
    session.update();

    for node in session.scene().fixtures.iter() {
        match &node.geometry {
            NodeGeometry::Asset { part, .. } if part.starts_with("frame") => {
                assert_eq!(node.color, Color::ORANGE)
            }
            _ => assert_ne!(node.color, Color::ORANGE),
        }
    }
    assert_eq!(session.stats().composite_runs, composites);

    session.pointer_missed().unwrap();
    assert_eq!(session.paint(Color::WHITE), Err(Error::NothingSelected));
}

#[test]
fn subscribers_see_only_their_scopes() {
    let mut session = session_with(0, 0);
    let layout_changes = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&layout_changes);
    session
        .store_mut()
        .subscribe(Scope::LAYOUT, move |change| sink.borrow_mut().push(change.key));

    session.set(ParamKey::WallColor, Color::WHITE).unwrap();
    session.set(ParamKey::ColumnGap, 0.05).unwrap();
    session.set(ParamKey::WallWidth, 2.5).unwrap();
    session.set(ParamKey::ColumnGap, 0.05).unwrap();

    assert_eq!(*layout_changes.borrow(), vec![ParamKey::ColumnGap, ParamKey::WallWidth]);
}

#[test]
fn several_sets_coalesce_into_one_update() {
    let mut session = session_with(0, 0);
    let before = session.stats();

    for columns in 1..=8u32 {
        session.set(ParamKey::ColumnCount, columns).unwrap();
    }
    session.update();

    let after = session.stats();
    assert_eq!(after.updates, before.updates + 1);
    assert_eq!(after.layout_runs, before.layout_runs + 1);
    assert_eq!(session.scene().count(NodeTag::Panel), 8 * 3 * 4);
}

#[test]
fn wall_resize_rebuilds_every_geometry_branch() {
    let mut session = session_with(1, 1);
    session.set(ParamKey::WallWidth, 3.0).unwrap();
    let report = session.update();

    assert!(report.is_ok());
    assert!(report.rebuilt.contains(Scope::WALL | Scope::LAYOUT | Scope::FIXTURES));
    let skirting = session.scene().first(NodeTag::Skirting).unwrap();
    let (min, max) = skirting.geometry.mesh().bounds();
    assert_relative_eq!(max.x - min.x, 3.0, epsilon = 1e-6);
}
