// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during wall geometry synthesis
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Layout, frame or slab inputs that cannot produce valid geometry
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Boolean subtraction produced a degenerate or empty solid
    #[error("Degenerate geometry: {0}")]
    Geometry(String),

    #[error("Triangulation failed: {0}")]
    TriangulationError(String),

    #[error("Invalid colour: {0}")]
    InvalidColor(String),
}

impl Error {
    /// True for errors raised before any geometry was built
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_) | Error::InvalidColor(_))
    }
}
