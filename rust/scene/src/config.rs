// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Initial parameter values and fixture limits.
//!
//! Every field has a default, so a partial JSON document only overrides what
//! it names. The defaults reproduce the stock configurator: a 2 x 2 orange
//! wall with four white panel columns.

use crate::error::{Error, Result};
use crate::placement::FixtureKind;
use serde::{Deserialize, Deserializer, Serialize};
use wallcraft_geometry::{Color, RowLayout, DEFAULT_WOOD_DEPTH, DEFAULT_WOOD_WIDTH};

/// Full initial configuration of a wall session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallConfig {
    pub wall: WallSettings,
    pub skirting: SkirtingSettings,
    pub panels: PanelSettings,
    pub windows: WindowSettings,
    #[serde(deserialize_with = "socket_settings")]
    pub sockets: FixtureSettings,
    #[serde(deserialize_with = "switch_settings")]
    pub switches: FixtureSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallSettings {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    pub color: Color,
}

impl Default for WallSettings {
    fn default() -> Self {
        Self {
            width: 2.0,
            height: 2.0,
            depth: 0.001,
            color: Color::ORANGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkirtingSettings {
    pub height: f64,
    pub depth: f64,
    pub color: Color,
}

impl Default for SkirtingSettings {
    fn default() -> Self {
        Self {
            height: 0.1,
            depth: 0.005,
            color: Color::WHITE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelSettings {
    pub columns: u32,
    pub max_columns: u32,
    pub gap: f64,
    pub wood_width: f64,
    pub wood_depth: f64,
    pub color: Color,
    pub rows: RowLayout,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            columns: 4,
            max_columns: 8,
            gap: 0.1,
            wood_width: DEFAULT_WOOD_WIDTH,
            wood_depth: DEFAULT_WOOD_DEPTH,
            color: Color::WHITE,
            rows: RowLayout::default(),
        }
    }
}

/// Visibility count, colour and slot placements of one fixture kind.
///
/// Deserialized through [`FixtureOverrides`], so missing fields take the
/// defaults of the kind being read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixtureSettings {
    /// Visible slots
    pub count: u32,
    /// Upper bound the count control allows
    pub max_count: u32,
    pub color: Color,
    /// Initial position of each slot; slots past the end reuse the last entry
    pub placements: Vec<[f64; 3]>,
}

impl FixtureSettings {
    pub fn defaults_for(kind: FixtureKind) -> Self {
        let placements = match kind {
            FixtureKind::Window => vec![[0.0, 0.35, 0.0], [-0.55, 0.35, 0.0], [0.55, 0.35, 0.0]],
            FixtureKind::Socket => vec![
                [-0.6, -0.8, 0.0025],
                [-0.3, -0.8, 0.0025],
                [0.3, -0.8, 0.0025],
                [0.6, -0.8, 0.0025],
            ],
            FixtureKind::Switch => vec![[0.8, -0.1, 0.0025], [0.8, -0.25, 0.0025]],
        };
        Self {
            count: 0,
            max_count: placements.len() as u32,
            color: Color::WHITE,
            placements,
        }
    }

    /// Initial position of slot `index`
    pub fn placement(&self, index: u32) -> [f64; 3] {
        self.placements
            .get(index as usize)
            .or_else(|| self.placements.last())
            .copied()
            .unwrap_or([0.0; 3])
    }
}

/// Fields a JSON document may set on a fixture section
#[derive(Debug, Deserialize)]
struct FixtureOverrides {
    count: Option<u32>,
    max_count: Option<u32>,
    color: Option<Color>,
    placements: Option<Vec<[f64; 3]>>,
}

impl FixtureOverrides {
    fn over(self, kind: FixtureKind) -> FixtureSettings {
        let mut settings = FixtureSettings::defaults_for(kind);
        if let Some(placements) = self.placements {
            settings.max_count = placements.len() as u32;
            settings.placements = placements;
        }
        if let Some(count) = self.count {
            settings.count = count;
        }
        if let Some(max_count) = self.max_count {
            settings.max_count = max_count;
        }
        if let Some(color) = self.color {
            settings.color = color;
        }
        settings
    }
}

fn socket_settings<'de, D>(deserializer: D) -> std::result::Result<FixtureSettings, D::Error>
where
    D: Deserializer<'de>,
{
    FixtureOverrides::deserialize(deserializer).map(|o| o.over(FixtureKind::Socket))
}

fn switch_settings<'de, D>(deserializer: D) -> std::result::Result<FixtureSettings, D::Error>
where
    D: Deserializer<'de>,
{
    FixtureOverrides::deserialize(deserializer).map(|o| o.over(FixtureKind::Switch))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WindowOverrides")]
pub struct WindowSettings {
    #[serde(flatten)]
    pub fixtures: FixtureSettings,
    /// Size of the cutout each window opens in the wall
    pub width: f64,
    pub height: f64,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            fixtures: FixtureSettings::defaults_for(FixtureKind::Window),
            width: 0.8,
            height: 1.0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WindowOverrides {
    #[serde(flatten)]
    fixtures: FixtureOverrides,
    width: Option<f64>,
    height: Option<f64>,
}

impl From<WindowOverrides> for WindowSettings {
    fn from(overrides: WindowOverrides) -> Self {
        let defaults = WindowSettings::default();
        Self {
            fixtures: overrides.fixtures.over(FixtureKind::Window),
            width: overrides.width.unwrap_or(defaults.width),
            height: overrides.height.unwrap_or(defaults.height),
        }
    }
}

impl Default for WallConfig {
    fn default() -> Self {
        Self {
            wall: WallSettings::default(),
            skirting: SkirtingSettings::default(),
            panels: PanelSettings::default(),
            windows: WindowSettings::default(),
            sockets: FixtureSettings::defaults_for(FixtureKind::Socket),
            switches: FixtureSettings::defaults_for(FixtureKind::Switch),
        }
    }
}

impl WallConfig {
    /// Parse a (possibly partial) JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: WallConfig =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn fixtures(&self, kind: FixtureKind) -> &FixtureSettings {
        match kind {
            FixtureKind::Window => &self.windows.fixtures,
            FixtureKind::Socket => &self.sockets,
            FixtureKind::Switch => &self.switches,
        }
    }

    pub fn fixtures_mut(&mut self, kind: FixtureKind) -> &mut FixtureSettings {
        match kind {
            FixtureKind::Window => &mut self.windows.fixtures,
            FixtureKind::Socket => &mut self.sockets,
            FixtureKind::Switch => &mut self.switches,
        }
    }

    /// Bounds the UI controls would enforce; geometry checks happen later
    pub fn validate(&self) -> Result<()> {
        if self.panels.columns > self.panels.max_columns {
            return Err(Error::Config(format!(
                "{} panel columns exceeds the maximum of {}",
                self.panels.columns, self.panels.max_columns
            )));
        }
        for kind in FixtureKind::ALL {
            let settings = self.fixtures(kind);
            if settings.count > settings.max_count {
                return Err(Error::Config(format!(
                    "{} {} fixtures exceeds the maximum of {}",
                    settings.count, kind, settings.max_count
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_wall() {
        let config = WallConfig::default();
        assert_eq!(config.wall.width, 2.0);
        assert_eq!(config.wall.color, Color::ORANGE);
        assert_eq!(config.panels.columns, 4);
        assert_eq!(config.panels.gap, 0.1);
        assert_eq!(config.panels.rows.ratios, vec![3.0, 0.4, 1.0]);
        assert_eq!(config.windows.width, 0.8);
        assert_eq!(config.windows.fixtures.placement(0), [0.0, 0.35, 0.0]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let config = WallConfig::from_json_str(
            r##"{ "wall": { "color": "#336699" }, "panels": { "columns": 6 }, "windows": { "count": 1 } }"##,
        )
        .unwrap();
        assert_eq!(config.wall.color, Color::rgb(0x33, 0x66, 0x99));
        assert_eq!(config.wall.width, 2.0);
        assert_eq!(config.panels.columns, 6);
        assert_eq!(config.panels.gap, 0.1);
        assert_eq!(config.windows.fixtures.count, 1);
        assert_eq!(config.windows.height, 1.0);
    }

    #[test]
    fn partial_fixture_sections_keep_their_own_defaults() {
        let config = WallConfig::from_json_str(
            r##"{ "windows": { "count": 1 }, "switches": { "count": 2, "color": "#000000" } }"##,
        )
        .unwrap();

        let windows = &config.windows.fixtures;
        assert_eq!(windows.placement(0), [0.0, 0.35, 0.0]);
        assert_eq!(windows.max_count, 3);
        assert_eq!(config.windows.width, 0.8);

        let switches = &config.switches;
        assert_eq!(switches.count, 2);
        assert_eq!(switches.color, Color::rgb(0, 0, 0));
        assert_eq!(switches.placements, vec![[0.8, -0.1, 0.0025], [0.8, -0.25, 0.0025]]);
        assert_eq!(switches.max_count, 2);

        assert_eq!(config.sockets, FixtureSettings::defaults_for(FixtureKind::Socket));
    }

    #[test]
    fn custom_placements_set_the_default_limit() {
        let config = WallConfig::from_json_str(
            r#"{ "windows": { "placements": [[0.1, 0.2, 0.0]], "height": 0.6 },
                 "sockets": { "placements": [[0.0, -0.9, 0.0]], "max_count": 3 } }"#,
        )
        .unwrap();
        assert_eq!(config.windows.fixtures.placement(0), [0.1, 0.2, 0.0]);
        assert_eq!(config.windows.fixtures.max_count, 1);
        assert_eq!(config.windows.height, 0.6);
        assert_eq!(config.sockets.max_count, 3);
        assert_eq!(config.sockets.placement(2), [0.0, -0.9, 0.0]);
    }

    #[test]
    fn rejects_counts_over_limit() {
        let err = WallConfig::from_json_str(r#"{ "sockets": { "count": 9 } }"#);
        assert!(matches!(err, Err(Error::Config(_))));
        let err = WallConfig::from_json_str(r#"{ "panels": { "columns": 12 } }"#);
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn rejects_bad_colour() {
        let err = WallConfig::from_json_str(r#"{ "wall": { "color": "not-a-colour" } }"#);
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn placement_falls_back_to_last_slot() {
        let sockets = FixtureSettings::defaults_for(FixtureKind::Socket);
        assert_eq!(sockets.placement(10), sockets.placement(3));
    }

    #[test]
    fn serializes_round_trip_as_json() {
        let config = WallConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"#ffa500\""));
        assert_eq!(WallConfig::from_json_str(&json).unwrap(), config);
    }
}
