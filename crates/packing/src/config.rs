//! Packing configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use lumatile_core::{Error, Result};

/// Layout strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PackingStrategy {
    /// Run every strategy and keep the best layout.
    #[default]
    Auto,
    /// Shelf packing of axis-aligned bounding boxes.
    Shelf,
    /// Reuse the tile family's own tessellation.
    Lattice,
}

/// Parameters of the sheet packer.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PackingConfig {
    pub strategy: PackingStrategy,

    /// Minimum gap between pieces (saw or laser kerf).
    pub spacing: f64,

    /// Unused border along every sheet edge.
    pub margin: f64,

    /// Allow pieces to be turned by 90 degrees.
    pub allow_rotation: bool,
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            strategy: PackingStrategy::Auto,
            spacing: 0.0,
            margin: 0.0,
            allow_rotation: true,
        }
    }
}

impl PackingConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(mut self, strategy: PackingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_rotation(mut self, allow: bool) -> Self {
        self.allow_rotation = allow;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.spacing.is_finite() && self.spacing >= 0.0) {
            return Err(Error::Configuration(format!(
                "packing 'spacing' must be non-negative, got {}",
                self.spacing
            )));
        }
        if !(self.margin.is_finite() && self.margin >= 0.0) {
            return Err(Error::Configuration(format!(
                "packing 'margin' must be non-negative, got {}",
                self.margin
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PackingConfig::default();
        assert_eq!(config.strategy, PackingStrategy::Auto);
        assert!(config.allow_rotation);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_spacing_rejected() {
        let config = PackingConfig::new().with_spacing(-1.0);
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }
}
