// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Column layout of wall panels.
//!
//! Partitions the wall into `columns` equal-width columns separated (and
//! bordered) by `gap`, then splits every column into rows whose heights are
//! ratios of a base unit of `wall_height / 6`. The rows are stacked top to
//! bottom around an anchor row pinned at a vertical offset.

use crate::error::{Error, Result};
use nalgebra::Point3;

/// Wall height is divided by this to get the row base unit
pub const BASE_UNIT_DIVISOR: f64 = 6.0;

/// Vertical arrangement of panel rows within a column
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RowLayout {
    /// Row heights in base units, top row first
    pub ratios: Vec<f64>,
    /// Space between consecutive rows, in base units
    pub gap_ratio: f64,
    /// Index of the row whose centre sits at the vertical offset
    pub anchor: usize,
    /// Vertical offset of the anchor row as a fraction of wall height
    pub offset_ratio: f64,
}

impl Default for RowLayout {
    /// Tall upper panel, thin rail, lower panel
    fn default() -> Self {
        Self {
            ratios: vec![3.0, 0.4, 1.0],
            gap_ratio: 0.3,
            anchor: 1,
            offset_ratio: -0.15,
        }
    }
}

/// Inputs of the panel grid
#[derive(Debug, Clone, PartialEq)]
pub struct PanelGrid {
    pub wall_width: f64,
    pub wall_height: f64,
    pub columns: usize,
    pub gap: f64,
    pub rows: RowLayout,
}

/// One panel cell of the grid, centred in wall-local coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PanelRectangle {
    pub width: f64,
    pub height: f64,
    pub center: Point3<f64>,
    pub row: usize,
    pub column: usize,
}

/// Width of one column once the `columns + 1` gaps are removed
pub fn column_width(wall_width: f64, columns: usize, gap: f64) -> Result<f64> {
    if columns == 0 {
        return Err(Error::Configuration("column count must be at least 1".into()));
    }
    if !(gap >= 0.0) {
        return Err(Error::Configuration(format!("column gap {} is negative", gap)));
    }

    let width = (wall_width - gap * (columns as f64 + 1.0)) / columns as f64;
    if !(width > 0.0) {
        return Err(Error::Configuration(format!(
            "{} columns with gap {} leave no room on a {} wide wall",
            columns, gap, wall_width
        )));
    }
    Ok(width)
}

/// Centre x of column `index`
#[inline]
fn column_center_x(index: usize, column_width: f64, gap: f64, wall_width: f64) -> f64 {
    index as f64 * (column_width + gap) - (wall_width / 2.0 - column_width / 2.0 - gap)
}

/// Centre y of every row, top row first
fn row_centers(heights: &[f64], gap: f64, anchor: usize, offset: f64) -> Vec<f64> {
    let mut centers = vec![0.0; heights.len()];
    centers[anchor] = offset;

    for k in (0..anchor).rev() {
        centers[k] = centers[k + 1] + heights[k + 1] / 2.0 + gap + heights[k] / 2.0;
    }
    for k in anchor + 1..heights.len() {
        centers[k] = centers[k - 1] - heights[k - 1] / 2.0 - gap - heights[k] / 2.0;
    }
    centers
}

fn validate(grid: &PanelGrid) -> Result<()> {
    if !(grid.wall_width > 0.0 && grid.wall_height > 0.0) {
        return Err(Error::Configuration(format!(
            "wall must be positive, got {} x {}",
            grid.wall_width, grid.wall_height
        )));
    }

    let rows = &grid.rows;
    if rows.ratios.is_empty() {
        return Err(Error::Configuration("at least one panel row is required".into()));
    }
    if let Some(bad) = rows.ratios.iter().find(|r| !(**r > 0.0 && r.is_finite())) {
        return Err(Error::Configuration(format!("row height ratio {} is not positive", bad)));
    }
    if rows.anchor >= rows.ratios.len() {
        return Err(Error::Configuration(format!(
            "anchor row {} out of range for {} rows",
            rows.anchor,
            rows.ratios.len()
        )));
    }
    if !(rows.gap_ratio >= 0.0) {
        return Err(Error::Configuration(format!("row gap {} is negative", rows.gap_ratio)));
    }
    Ok(())
}

/// Lay out the full panel grid.
///
/// Rectangles come back row-major: every column of the top row from left to
/// right, then the next row down. Consumers key lists by this order.
pub fn layout_panels(grid: &PanelGrid) -> Result<Vec<PanelRectangle>> {
    validate(grid)?;
    let col_width = column_width(grid.wall_width, grid.columns, grid.gap)?;

    let unit = grid.wall_height / BASE_UNIT_DIVISOR;
    let heights: Vec<f64> = grid.rows.ratios.iter().map(|r| r * unit).collect();
    let centers_y = row_centers(
        &heights,
        grid.rows.gap_ratio * unit,
        grid.rows.anchor,
        grid.wall_height * grid.rows.offset_ratio,
    );

    let mut rects = Vec::with_capacity(heights.len() * grid.columns);
    for (row, (&height, &y)) in heights.iter().zip(&centers_y).enumerate() {
        for column in 0..grid.columns {
            rects.push(PanelRectangle {
                width: col_width,
                height,
                center: Point3::new(
                    column_center_x(column, col_width, grid.gap, grid.wall_width),
                    y,
                    0.0,
                ),
                row,
                column,
            });
        }
    }

    Ok(rects)
}
