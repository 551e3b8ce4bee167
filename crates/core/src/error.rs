//! Error types shared by every lumatile crate.

use thiserror::Error;

/// Errors produced while building tilings, running optimizers or
/// assembling a bill of materials.
#[derive(Debug, Error)]
pub enum Error {
    /// An option is missing, out of range or conflicts with another one.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Unknown tile kind or variant, or invalid tile dimensions.
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// The set of grid cells does not describe a valid tiling.
    #[error("invalid tiling: {0}")]
    InvalidTiling(String),

    /// Not even a single tile fits on a sheet of the given material.
    #[error("no tile fits on a sheet of '{material}'")]
    SheetTooSmall {
        /// Name of the sheet material.
        material: String,
    },

    /// An assembly group cannot satisfy its demand.
    #[error("assembly group '{group}' cannot meet demand: {reason}")]
    InsufficientCatalog {
        /// Category of the failing group (e.g. `sheets-0`).
        group: String,
        /// What went wrong.
        reason: String,
    },
}

/// Result alias using the crate error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns true when the error only affects one assembly group.
    pub fn is_group_local(&self) -> bool {
        matches!(self, Error::InsufficientCatalog { .. })
    }
}
