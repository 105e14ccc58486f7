// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wallcraft Export - builds a configured wall and prints a scene summary.
//!
//! Configuration comes from the environment:
//!
//! - `WALLCRAFT_CONFIG` - JSON wall configuration file (partial is fine)
//! - `WALLCRAFT_COLUMNS`, `WALLCRAFT_GAP`, `WALLCRAFT_WINDOWS`, ... - field overrides
//! - `WALLCRAFT_OUTPUT` - write the summary to this file instead of stdout
//! - `WALLCRAFT_NODES` - include every scene node in the summary
//! - `WALLCRAFT_LOG_JSON` - emit logs as JSON lines
//! - `RUST_LOG` - log filter, default `info`

use anyhow::{Context, Result};
use wallcraft_scene::{InMemoryAssets, WallSession};

mod config;
mod summary;

use config::Config;
use summary::SceneSummary;

fn main() -> Result<()> {
    let config = Config::from_env();

    // Logs go to stderr so stdout stays valid JSON
    let logs = tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr);
    if config.log_json {
        logs.json().init();
    } else {
        logs.init();
    }

    let wall = config.wall_config()?;

    tracing::info!(
        config = config.config_path.as_deref().unwrap_or("<defaults>"),
        width = wall.wall.width,
        height = wall.wall.height,
        columns = wall.panels.columns,
        windows = wall.windows.fixtures.count,
        "Building wall"
    );

    let session = WallSession::new(&wall, InMemoryAssets::placeholders());
    let last_error = session.store().last_error().map(|e| e.to_string());
    if let Some(error) = &last_error {
        tracing::warn!(%error, "Scene built with errors");
    }

    let summary = SceneSummary::new(
        session.scene(),
        session.stats(),
        last_error,
        config.include_nodes,
    );
    let json = if config.pretty {
        serde_json::to_string_pretty(&summary)
    } else {
        serde_json::to_string(&summary)
    }
    .context("serializing scene summary")?;

    match &config.output_path {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing {}", path))?;
            tracing::info!(path = %path, nodes = summary.node_count, "Summary written");
        }
        None => println!("{}", json),
    }

    Ok(())
}
