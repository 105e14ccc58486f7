// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wallcraft Scene
//!
//! Reactive state and scene assembly for the wall configurator. A
//! [`ParameterStore`] holds every user-editable value and tracks which
//! scene branches a change invalidates; [`SceneAssembler`] rebuilds just
//! those branches from the geometry engines; [`FixturePlacement`] turns
//! pointer drags into fixture positions.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use wallcraft_scene::{InMemoryAssets, ParamKey, WallConfig, WallSession};
//!
//! let mut session = WallSession::new(&WallConfig::default(), InMemoryAssets::placeholders());
//! session.set(ParamKey::ColumnCount, 6u32)?;
//! let report = session.update();
//! for node in session.scene().nodes() {
//!     println!("{} {}", node.tag, node.color);
//! }
//! ```

pub mod assets;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod params;
pub mod placement;
pub mod scene;
pub mod session;

pub use assets::{AssetBundle, AssetKey, AssetLoader, AssetPart, InMemoryAssets};
pub use config::{FixtureSettings, PanelSettings, SkirtingSettings, WallConfig, WallSettings, WindowSettings};
pub use dispatch::{dispatch_click, dispatch_missed, drag_target, PointerHit, Propagation};
pub use error::{Error, Result};
pub use params::{ParamChange, ParamKey, ParamValue, ParameterStore, Scope, StoreState, SubscriptionId};
pub use placement::{
    DragSession, Fixture, FixtureId, FixtureKind, FixturePlacement, FixtureSlot,
    OrthographicViewport, PerspectiveViewport, Projection,
};
pub use scene::{AssemblerStats, NodeGeometry, NodeTag, Scene, SceneAssembler, SceneNode, UpdateReport};
pub use session::WallSession;
