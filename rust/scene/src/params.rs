// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parameter store.
//!
//! Holds every typed configuration value of a session. Each key belongs to
//! one or more invalidation scopes; a write ORs those scopes into the dirty
//! set, which the assembler drains to decide what to rebuild. Listeners
//! subscribe with a scope mask and see changes in the order they happen.

use crate::config::WallConfig;
use crate::error::{Error, Result};
use crate::placement::{FixtureKind, FixtureSlot};
use crate::scene::NodeTag;
use bitflags::bitflags;
use nalgebra::Point3;
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{new_key_type, SlotMap};
use std::fmt;
use wallcraft_geometry::{Color, RowLayout};

bitflags! {
    /// Branches of the scene a parameter change invalidates
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Scope: u8 {
        /// Panel grid and frames
        const LAYOUT = 1 << 0;
        /// Wall slab, its cutouts and the skirting
        const WALL = 1 << 1;
        /// Fixture visibility and placement
        const FIXTURES = 1 << 2;
        /// Colours only
        const APPEARANCE = 1 << 3;
        /// Dragging flag and selection
        const INTERACTION = 1 << 4;
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::empty()
    }
}

/// Every parameter the store knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKey {
    WallWidth,
    WallHeight,
    WallDepth,
    WallColor,
    SkirtingHeight,
    SkirtingDepth,
    SkirtingColor,
    ColumnCount,
    ColumnGap,
    Rows,
    WoodWidth,
    WoodDepth,
    PanelColor,
    WindowWidth,
    WindowHeight,
    FixtureCount(FixtureKind),
    FixtureColor(FixtureKind),
    Placement(FixtureSlot),
    Dragging,
    Selection,
}

impl ParamKey {
    /// Scopes invalidated when this key changes
    pub fn scope(self) -> Scope {
        use ParamKey::*;
        match self {
            WallWidth | WallHeight => Scope::WALL | Scope::LAYOUT | Scope::FIXTURES,
            WallDepth | SkirtingHeight | SkirtingDepth => Scope::WALL,
            ColumnCount | ColumnGap | Rows | WoodWidth | WoodDepth => Scope::LAYOUT,
            WallColor | SkirtingColor | PanelColor | FixtureColor(_) => Scope::APPEARANCE,
            WindowWidth | WindowHeight => Scope::WALL | Scope::FIXTURES,
            FixtureCount(kind) => kind_scope(kind),
            Placement(slot) => kind_scope(slot.kind),
            Dragging | Selection => Scope::INTERACTION,
        }
    }

    /// Colour parameter painted when `tag` is selected
    pub fn color_of(tag: NodeTag) -> ParamKey {
        match tag {
            NodeTag::Wall => ParamKey::WallColor,
            NodeTag::Panel => ParamKey::PanelColor,
            NodeTag::Skirting => ParamKey::SkirtingColor,
            NodeTag::Window => ParamKey::FixtureColor(FixtureKind::Window),
            NodeTag::Socket => ParamKey::FixtureColor(FixtureKind::Socket),
            NodeTag::Switch => ParamKey::FixtureColor(FixtureKind::Switch),
        }
    }
}

fn kind_scope(kind: FixtureKind) -> Scope {
    if kind.cuts_wall() {
        Scope::FIXTURES | Scope::WALL
    } else {
        Scope::FIXTURES
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ParamKey::*;
        match self {
            WallWidth => f.write_str("wall.width"),
            WallHeight => f.write_str("wall.height"),
            WallDepth => f.write_str("wall.depth"),
            WallColor => f.write_str("wall.color"),
            SkirtingHeight => f.write_str("skirting.height"),
            SkirtingDepth => f.write_str("skirting.depth"),
            SkirtingColor => f.write_str("skirting.color"),
            ColumnCount => f.write_str("panels.columns"),
            ColumnGap => f.write_str("panels.gap"),
            Rows => f.write_str("panels.rows"),
            WoodWidth => f.write_str("panels.wood_width"),
            WoodDepth => f.write_str("panels.wood_depth"),
            PanelColor => f.write_str("panels.color"),
            WindowWidth => f.write_str("windows.width"),
            WindowHeight => f.write_str("windows.height"),
            FixtureCount(kind) => write!(f, "{}.count", kind),
            FixtureColor(kind) => write!(f, "{}.color", kind),
            Placement(slot) => write!(f, "{}[{}].position", slot.kind, slot.index),
            Dragging => f.write_str("dragging"),
            Selection => f.write_str("selection"),
        }
    }
}

/// Typed parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Number(f64),
    Count(u32),
    Color(Color),
    Flag(bool),
    Rows(RowLayout),
    Point(Point3<f64>),
    Selection(Option<NodeTag>),
}

impl ParamValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Number(_) => "number",
            ParamValue::Count(_) => "count",
            ParamValue::Color(_) => "colour",
            ParamValue::Flag(_) => "flag",
            ParamValue::Rows(_) => "row layout",
            ParamValue::Point(_) => "point",
            ParamValue::Selection(_) => "selection",
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Count(value)
    }
}

impl From<Color> for ParamValue {
    fn from(value: Color) -> Self {
        ParamValue::Color(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Flag(value)
    }
}

impl From<RowLayout> for ParamValue {
    fn from(value: RowLayout) -> Self {
        ParamValue::Rows(value)
    }
}

impl From<Point3<f64>> for ParamValue {
    fn from(value: Point3<f64>) -> Self {
        ParamValue::Point(value)
    }
}

impl From<Option<NodeTag>> for ParamValue {
    fn from(value: Option<NodeTag>) -> Self {
        ParamValue::Selection(value)
    }
}

/// Notification delivered to subscribers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamChange {
    pub key: ParamKey,
    pub scope: Scope,
    /// Store revision after the change
    pub revision: u64,
}

new_key_type! {
    /// Handle returned by [`ParameterStore::subscribe`]
    pub struct SubscriptionId;
}

struct Listener {
    scopes: Scope,
    callback: Box<dyn FnMut(&ParamChange)>,
}

/// Whether the assembler has pending work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Idle,
    Dirty(Scope),
}

/// Single owner of all session parameters
pub struct ParameterStore {
    values: FxHashMap<ParamKey, ParamValue>,
    limits: FxHashMap<ParamKey, u32>,
    locks: FxHashSet<ParamKey>,
    listeners: SlotMap<SubscriptionId, Listener>,
    dirty: Scope,
    revision: u64,
    last_error: Option<Error>,
}

impl fmt::Debug for ParameterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterStore")
            .field("parameters", &self.values.len())
            .field("listeners", &self.listeners.len())
            .field("dirty", &self.dirty)
            .field("revision", &self.revision)
            .finish()
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new(&WallConfig::default())
    }
}

impl ParameterStore {
    /// Seed every parameter from `config`. The new store is dirty in every
    /// scope so the first update builds the whole scene.
    pub fn new(config: &WallConfig) -> Self {
        use ParamKey::*;

        let mut values: FxHashMap<ParamKey, ParamValue> = FxHashMap::default();
        let mut limits: FxHashMap<ParamKey, u32> = FxHashMap::default();

        values.insert(WallWidth, config.wall.width.into());
        values.insert(WallHeight, config.wall.height.into());
        values.insert(WallDepth, config.wall.depth.into());
        values.insert(WallColor, config.wall.color.into());
        values.insert(SkirtingHeight, config.skirting.height.into());
        values.insert(SkirtingDepth, config.skirting.depth.into());
        values.insert(SkirtingColor, config.skirting.color.into());
        values.insert(ColumnCount, config.panels.columns.into());
        values.insert(ColumnGap, config.panels.gap.into());
        values.insert(Rows, config.panels.rows.clone().into());
        values.insert(WoodWidth, config.panels.wood_width.into());
        values.insert(WoodDepth, config.panels.wood_depth.into());
        values.insert(PanelColor, config.panels.color.into());
        values.insert(WindowWidth, config.windows.width.into());
        values.insert(WindowHeight, config.windows.height.into());
        values.insert(Dragging, false.into());
        values.insert(Selection, ParamValue::Selection(None));
        limits.insert(ColumnCount, config.panels.max_columns);

        for kind in FixtureKind::ALL {
            let settings = config.fixtures(kind);
            values.insert(FixtureCount(kind), settings.count.into());
            values.insert(FixtureColor(kind), settings.color.into());
            limits.insert(FixtureCount(kind), settings.max_count);
            for index in 0..settings.max_count {
                let slot = FixtureSlot { kind, index };
                values.insert(Placement(slot), Point3::from(settings.placement(index)).into());
            }
        }

        // The dragging flag mirrors open drag sessions; only placement writes it
        let mut locks: FxHashSet<ParamKey> = FxHashSet::default();
        locks.insert(Dragging);

        Self {
            values,
            limits,
            locks,
            listeners: SlotMap::with_key(),
            dirty: Scope::all(),
            revision: 0,
            last_error: None,
        }
    }

    /// Current value of `key`
    pub fn get(&self, key: ParamKey) -> Result<&ParamValue> {
        self.values.get(&key).ok_or(Error::UnknownParameter(key))
    }

    /// Set a parameter from user input.
    ///
    /// Returns whether the value changed; an equal value is not a change and
    /// neither dirties the store nor notifies listeners.
    pub fn set(&mut self, key: ParamKey, value: impl Into<ParamValue>) -> Result<bool> {
        if self.locks.contains(&key) {
            return Err(Error::Locked(key));
        }
        let value = value.into();
        if let (Some(&limit), ParamValue::Count(requested)) = (self.limits.get(&key), &value) {
            if *requested > limit {
                return Err(Error::LimitExceeded {
                    key,
                    requested: *requested,
                    limit,
                });
            }
        }
        self.write(key, value)
    }

    /// Set a colour parameter from a picker string such as `#ff8800`
    pub fn set_color_str(&mut self, key: ParamKey, color: &str) -> Result<bool> {
        let color: Color = color.parse()?;
        self.set(key, color)
    }

    /// Write bypassing locks and limits, for the owner of a locked key
    pub(crate) fn write(&mut self, key: ParamKey, value: ParamValue) -> Result<bool> {
        let current = self.values.get_mut(&key).ok_or(Error::UnknownParameter(key))?;
        if current.type_name() != value.type_name() {
            return Err(Error::TypeMismatch {
                key,
                expected: current.type_name(),
                found: value.type_name(),
            });
        }
        if *current == value {
            return Ok(false);
        }
        *current = value;

        self.revision += 1;
        let scope = key.scope();
        self.dirty |= scope;
        tracing::trace!(%key, ?scope, revision = self.revision, "Parameter changed");

        let change = ParamChange {
            key,
            scope,
            revision: self.revision,
        };
        for listener in self.listeners.values_mut() {
            if listener.scopes.intersects(scope) {
                (listener.callback)(&change);
            }
        }
        Ok(true)
    }

    fn mismatch(key: ParamKey, expected: &'static str, found: &ParamValue) -> Error {
        Error::TypeMismatch {
            key,
            expected,
            found: found.type_name(),
        }
    }

    pub fn number(&self, key: ParamKey) -> Result<f64> {
        match self.get(key)? {
            ParamValue::Number(v) => Ok(*v),
            other => Err(Self::mismatch(key, "number", other)),
        }
    }

    pub fn count(&self, key: ParamKey) -> Result<u32> {
        match self.get(key)? {
            ParamValue::Count(v) => Ok(*v),
            other => Err(Self::mismatch(key, "count", other)),
        }
    }

    pub fn color(&self, key: ParamKey) -> Result<Color> {
        match self.get(key)? {
            ParamValue::Color(v) => Ok(*v),
            other => Err(Self::mismatch(key, "colour", other)),
        }
    }

    pub fn flag(&self, key: ParamKey) -> Result<bool> {
        match self.get(key)? {
            ParamValue::Flag(v) => Ok(*v),
            other => Err(Self::mismatch(key, "flag", other)),
        }
    }

    pub fn rows(&self, key: ParamKey) -> Result<&RowLayout> {
        match self.get(key)? {
            ParamValue::Rows(v) => Ok(v),
            other => Err(Self::mismatch(key, "row layout", other)),
        }
    }

    pub fn point(&self, key: ParamKey) -> Result<Point3<f64>> {
        match self.get(key)? {
            ParamValue::Point(v) => Ok(*v),
            other => Err(Self::mismatch(key, "point", other)),
        }
    }

    /// Upper bound of a count parameter, if it has one
    pub fn limit(&self, key: ParamKey) -> Option<u32> {
        self.limits.get(&key).copied()
    }

    /// True while any drag session is active
    pub fn is_dragging(&self) -> bool {
        matches!(self.get(ParamKey::Dragging), Ok(ParamValue::Flag(true)))
    }

    /// Register `callback` for changes intersecting `scopes`
    pub fn subscribe(
        &mut self,
        scopes: Scope,
        callback: impl FnMut(&ParamChange) + 'static,
    ) -> SubscriptionId {
        self.listeners.insert(Listener {
            scopes,
            callback: Box::new(callback),
        })
    }

    /// Returns false if the subscription was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(id).is_some()
    }

    pub fn state(&self) -> StoreState {
        if self.dirty.is_empty() {
            StoreState::Idle
        } else {
            StoreState::Dirty(self.dirty)
        }
    }

    pub fn dirty(&self) -> Scope {
        self.dirty
    }

    /// Drain the dirty set, returning the store to idle
    pub fn take_dirty(&mut self) -> Scope {
        std::mem::replace(&mut self.dirty, Scope::empty())
    }

    /// Number of changes applied so far
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn lock(&mut self, key: ParamKey) {
        self.locks.insert(key);
    }

    pub(crate) fn unlock(&mut self, key: ParamKey) {
        self.locks.remove(&key);
    }

    pub fn is_locked(&self, key: ParamKey) -> bool {
        self.locks.contains(&key)
    }

    /// Currently selected item, if any
    pub fn selection(&self) -> Option<NodeTag> {
        match self.get(ParamKey::Selection) {
            Ok(ParamValue::Selection(tag)) => *tag,
            _ => None,
        }
    }

    pub fn select(&mut self, tag: Option<NodeTag>) -> Result<bool> {
        self.set(ParamKey::Selection, tag)
    }

    /// Write `color` into the colour parameter of the selected item
    pub fn paint_selection(&mut self, color: Color) -> Result<bool> {
        let tag = self.selection().ok_or(Error::NothingSelected)?;
        self.set(ParamKey::color_of(tag), color)
    }

    /// Most recent recompute error not yet cleared by a successful rebuild
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    pub(crate) fn set_last_error(&mut self, error: Option<Error>) {
        self.last_error = error;
    }
}
