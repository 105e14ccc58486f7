// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Export configuration loaded from environment variables.

use anyhow::{Context, Result};
use wallcraft_geometry::Color;
use wallcraft_scene::{FixtureKind, WallConfig};

/// Export run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Optional JSON file with a (partial) wall configuration.
    pub config_path: Option<String>,
    /// Write the summary here instead of stdout.
    pub output_path: Option<String>,
    /// Pretty-print the JSON summary.
    pub pretty: bool,
    /// Include every scene node, not just per-tag counts.
    pub include_nodes: bool,
    /// Emit logs as JSON lines.
    pub log_json: bool,
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "yes" | "on")
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(env_opt)
    }

    /// Load configuration from variables read through `var`.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |name: &str, default: bool| var(name).map(|v| is_truthy(&v)).unwrap_or(default);
        Self {
            config_path: var("WALLCRAFT_CONFIG"),
            output_path: var("WALLCRAFT_OUTPUT"),
            pretty: flag("WALLCRAFT_PRETTY", true),
            include_nodes: flag("WALLCRAFT_NODES", false),
            log_json: flag("WALLCRAFT_LOG_JSON", false),
        }
    }

    /// The wall to build: the JSON file if given, then per-field overrides.
    pub fn wall_config(&self) -> Result<WallConfig> {
        let mut config = match &self.config_path {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading wall configuration {}", path))?;
                WallConfig::from_json_str(&json)
                    .with_context(|| format!("parsing wall configuration {}", path))?
            }
            None => WallConfig::default(),
        };

        apply_overrides(&mut config, env_opt);
        config.validate().context("applying WALLCRAFT_* overrides")?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Apply `WALLCRAFT_*` overrides read through `var`. Unparseable values are
/// ignored, like the rest of the environment handling.
pub fn apply_overrides(config: &mut WallConfig, var: impl Fn(&str) -> Option<String>) {
    let parse = |name: &str| var(name).and_then(|v| v.trim().parse::<f64>().ok());
    let count = |name: &str| var(name).and_then(|v| v.trim().parse::<u32>().ok());
    let color = |name: &str| var(name).and_then(|v| v.trim().parse::<Color>().ok());

    if let Some(width) = parse("WALLCRAFT_WALL_WIDTH") {
        config.wall.width = width;
    }
    if let Some(height) = parse("WALLCRAFT_WALL_HEIGHT") {
        config.wall.height = height;
    }
    if let Some(wall_color) = color("WALLCRAFT_WALL_COLOR") {
        config.wall.color = wall_color;
    }
    if let Some(columns) = count("WALLCRAFT_COLUMNS") {
        config.panels.columns = columns;
    }
    if let Some(gap) = parse("WALLCRAFT_GAP") {
        config.panels.gap = gap;
    }
    if let Some(panel_color) = color("WALLCRAFT_PANEL_COLOR") {
        config.panels.color = panel_color;
    }
    if let Some(skirting_color) = color("WALLCRAFT_SKIRTING_COLOR") {
        config.skirting.color = skirting_color;
    }

    for (kind, name) in [
        (FixtureKind::Window, "WALLCRAFT_WINDOWS"),
        (FixtureKind::Socket, "WALLCRAFT_SOCKETS"),
        (FixtureKind::Switch, "WALLCRAFT_SWITCHES"),
    ] {
        if let Some(n) = count(name) {
            config.fixtures_mut(kind).count = n;
        }
    }
}
