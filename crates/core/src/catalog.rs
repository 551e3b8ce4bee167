//! Purchasable materials and assembly groups.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sheet stock the tile faces are cut from.
///
/// A sheet without `height` is unbounded stock sold by length; its `cost` is
/// then a price per unit of length.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SheetMaterial {
    pub name: String,
    pub width: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub height: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cost: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub url: Option<String>,
}

impl SheetMaterial {
    /// Fixed-size sheet.
    pub fn new(name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            width,
            height: Some(height),
            cost: None,
            url: None,
        }
    }

    /// Roll or strip of the given width, sold by length.
    pub fn unbounded(name: impl Into<String>, width: f64) -> Self {
        Self {
            name: name.into(),
            width,
            height: None,
            cost: None,
            url: None,
        }
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn is_unbounded(&self) -> bool {
        self.height.is_none()
    }

    /// Price of one sheet, or of one unit of length for unbounded stock.
    pub fn unit_cost(&self) -> f64 {
        self.cost.unwrap_or(0.0)
    }

    /// Checks dimensions and cost.
    pub fn validate(&self) -> Result<()> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(Error::Configuration(format!(
                "sheet '{}' must have a positive width, got {}",
                self.name, self.width
            )));
        }
        if let Some(h) = self.height {
            if !(h.is_finite() && h > 0.0) {
                return Err(Error::Configuration(format!(
                    "sheet '{}' must have a positive height, got {}",
                    self.name, h
                )));
            }
        }
        check_cost("sheet", &self.name, self.cost)
    }
}

/// An LED strip sold as a fixed-length unit.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LedStripMaterial {
    pub name: String,
    pub number_of_leds: u32,
    pub leds_per_meter: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub watts: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cost: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub url: Option<String>,
}

impl LedStripMaterial {
    pub fn new(name: impl Into<String>, number_of_leds: u32, leds_per_meter: f64) -> Self {
        Self {
            name: name.into(),
            number_of_leds,
            leds_per_meter,
            watts: None,
            cost: None,
            url: None,
        }
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn with_watts(mut self, watts: f64) -> Self {
        self.watts = Some(watts);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Strip length in meters.
    pub fn length(&self) -> f64 {
        self.number_of_leds as f64 / self.leds_per_meter
    }

    pub fn unit_cost(&self) -> f64 {
        self.cost.unwrap_or(0.0)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.leds_per_meter.is_finite() && self.leds_per_meter > 0.0) {
            return Err(Error::Configuration(format!(
                "LED strip '{}' must have a positive density, got {}",
                self.name, self.leds_per_meter
            )));
        }
        if self.number_of_leds == 0 {
            return Err(Error::Configuration(format!(
                "LED strip '{}' has no LEDs",
                self.name
            )));
        }
        if let Some(w) = self.watts {
            if !(w.is_finite() && w >= 0.0) {
                return Err(Error::Configuration(format!(
                    "LED strip '{}' has invalid wattage {}",
                    self.name, w
                )));
            }
        }
        check_cost("LED strip", &self.name, self.cost)
    }
}

fn check_cost(kind: &str, name: &str, cost: Option<f64>) -> Result<()> {
    match cost {
        None => warn!("No cost specified for {} '{}'", kind, name),
        Some(c) if !c.is_finite() || c < 0.0 => {
            return Err(Error::Configuration(format!(
                "cost of {} '{}' is negative or not finite ({})",
                kind, name, c
            )))
        }
        Some(c) if c == 0.0 => warn!("Cost of {} '{}' is zero", kind, name),
        Some(_) => {}
    }
    Ok(())
}

/// Named sheet and LED strip materials.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MaterialCatalog {
    #[cfg_attr(feature = "serde", serde(default))]
    sheets: BTreeMap<String, SheetMaterial>,
    #[cfg_attr(feature = "serde", serde(default))]
    leds: BTreeMap<String, LedStripMaterial>,
}

impl MaterialCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a sheet material.
    pub fn add_sheet(&mut self, sheet: SheetMaterial) -> &mut Self {
        self.sheets.insert(sheet.name.clone(), sheet);
        self
    }

    /// Adds or replaces an LED strip material.
    pub fn add_led_strip(&mut self, strip: LedStripMaterial) -> &mut Self {
        self.leds.insert(strip.name.clone(), strip);
        self
    }

    pub fn with_sheet(mut self, sheet: SheetMaterial) -> Self {
        self.add_sheet(sheet);
        self
    }

    pub fn with_led_strip(mut self, strip: LedStripMaterial) -> Self {
        self.add_led_strip(strip);
        self
    }

    /// Looks up a sheet material by name.
    pub fn sheet(&self, name: &str) -> Result<&SheetMaterial> {
        self.sheets
            .get(name)
            .ok_or_else(|| Error::Configuration(format!("unknown sheet material '{}'", name)))
    }

    /// Looks up an LED strip by name.
    pub fn led_strip(&self, name: &str) -> Result<&LedStripMaterial> {
        self.leds
            .get(name)
            .ok_or_else(|| Error::Configuration(format!("unknown LED strip '{}'", name)))
    }

    /// Sheet materials, ordered by name.
    pub fn sheets(&self) -> impl Iterator<Item = &SheetMaterial> {
        self.sheets.values()
    }

    /// LED strips, ordered by name.
    pub fn led_strips(&self) -> impl Iterator<Item = &LedStripMaterial> {
        self.leds.values()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty() && self.leds.is_empty()
    }

    /// Adds every entry of `other`, replacing entries with the same name.
    pub fn merge(&mut self, other: MaterialCatalog) {
        for (name, sheet) in other.sheets {
            if self.sheets.insert(name.clone(), sheet).is_some() {
                debug!("Replaced sheet material '{}'", name);
            }
        }
        for (name, strip) in other.leds {
            if self.leds.insert(name.clone(), strip).is_some() {
                debug!("Replaced LED strip '{}'", name);
            }
        }
    }

    /// Validates every entry.
    pub fn validate(&self) -> Result<()> {
        self.sheets().try_for_each(SheetMaterial::validate)?;
        self.led_strips().try_for_each(LedStripMaterial::validate)
    }
}

/// Materials considered together for one purchasing decision.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AssemblyGroup {
    /// Category label, e.g. `sheets-0`.
    pub name: String,
    /// Catalog names, in preference order.
    pub materials: Vec<String>,
}

impl AssemblyGroup {
    pub fn new<S: Into<String>>(name: impl Into<String>, materials: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            materials: materials.into_iter().map(Into::into).collect(),
        }
    }

    /// Fails if the group lists no material.
    pub fn validate(&self) -> Result<()> {
        if self.materials.is_empty() {
            return Err(Error::Configuration(format!(
                "assembly group '{}' lists no materials",
                self.name
            )));
        }
        Ok(())
    }
}
