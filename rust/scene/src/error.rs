// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::params::ParamKey;
use crate::placement::FixtureId;
use thiserror::Error;

/// Result type for scene operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the parameter store, fixture placement and assembler
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Geometry(#[from] wallcraft_geometry::Error),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(ParamKey),

    #[error("Parameter {key} holds {expected}, not {found}")]
    TypeMismatch {
        key: ParamKey,
        expected: &'static str,
        found: &'static str,
    },

    /// The parameter is owned by an active drag session
    #[error("Parameter {0} is locked by an active drag")]
    Locked(ParamKey),

    #[error("{key} of {requested} exceeds the limit of {limit}")]
    LimitExceeded {
        key: ParamKey,
        requested: u32,
        limit: u32,
    },

    #[error("Unknown fixture {0:?}")]
    UnknownFixture(FixtureId),

    #[error("Fixture {0:?} is hidden")]
    HiddenFixture(FixtureId),

    #[error("Fixture {0:?} is already being dragged")]
    AlreadyDragging(FixtureId),

    #[error("Nothing is selected")]
    NothingSelected,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// True if the error came from geometry inputs rather than API misuse
    pub fn is_geometry(&self) -> bool {
        matches!(self, Error::Geometry(_))
    }
}
