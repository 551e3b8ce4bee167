//! Bill of materials for a planned mosaic.
//!
//! [`BomBuilder`] runs the quantity optimizer once per assembly group and
//! turns each selection into purchasable lines. Groups are independent: a
//! group whose catalog cannot meet its demand is recorded as a
//! [`GroupFailure`] and the remaining groups are still processed.

use std::fmt::Write as _;

use log::{debug, info, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use lumatile_core::{AssemblyGroup, Error, MaterialCatalog, Result, Tiling};
use lumatile_packing::PackingResult;

use crate::leds::{group_strips, led_options, LedDemand};
use crate::quantity::{optimize, Amount, AssemblyOption, Selection};

/// Category of the printed frame parts.
pub const PRINTED_CATEGORY: &str = "3D printed";

/// Note attached to the estimated power supply.
pub const POWER_NOTE: &str = "The power has been estimated. You might need a lower wattage.";

/// Category of the `index`-th sheet group.
pub fn sheet_category(index: usize) -> String {
    format!("sheets-{}", index)
}

/// Category of the `index`-th LED group.
pub fn led_category(index: usize) -> String {
    format!("leds-{}", index)
}

/// How much of an item to buy.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BillQuantity {
    Count(usize),
    /// Length of stock sold by the meter.
    Length(f64),
}

impl BillQuantity {
    fn factor(&self) -> f64 {
        match *self {
            Self::Count(n) => n as f64,
            Self::Length(l) => l,
        }
    }
}

/// One line of the bill of materials.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BillItem {
    pub name: String,
    pub quantity: Option<BillQuantity>,
    pub unit_cost: Option<f64>,
    pub total_cost: f64,
    pub category: String,
    pub notes: Option<String>,
}

impl BillItem {
    /// Creates an item of `quantity` units at `unit_cost` each.
    pub fn new(name: impl Into<String>, category: impl Into<String>, quantity: BillQuantity, unit_cost: Option<f64>) -> Self {
        Self {
            name: name.into(),
            total_cost: unit_cost.unwrap_or(0.0) * quantity.factor(),
            quantity: Some(quantity),
            unit_cost,
            category: category.into(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// An assembly group that could not be covered.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GroupFailure {
    pub group: String,
    pub category: String,
    pub reason: String,
}

/// Purchasable items grouped by category.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BillOfMaterials {
    pub items: Vec<BillItem>,
    pub failures: Vec<GroupFailure>,
    pub total_cost: f64,
}

impl BillOfMaterials {
    /// Items of one category, in insertion order.
    pub fn items_in<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a BillItem> + 'a {
        self.items.iter().filter(move |i| i.category == category)
    }

    /// Returns true if every group was covered.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Renders the bill as a markdown table sorted by category.
    pub fn to_markdown(&self) -> String {
        let mut items: Vec<&BillItem> = self.items.iter().collect();
        items.sort_by(|a, b| a.category.cmp(&b.category));

        let mut out = String::from("| Name | Quantity | Price | Category | Notes |\n| --- | --- | --- | --- | --- |\n");
        for item in items {
            let quantity = match item.quantity {
                Some(BillQuantity::Count(n)) => n.to_string(),
                Some(BillQuantity::Length(l)) => format!("{:.3}", l),
                None => String::new(),
            };
            let price = item.unit_cost.map(|c| format!("{:.2}", c)).unwrap_or_default();
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} |",
                item.name,
                quantity,
                price,
                item.category,
                item.notes.as_deref().unwrap_or("")
            );
        }
        let _ = writeln!(out, "| Total |  | {:.2} |  |  |", self.total_cost);
        for failure in &self.failures {
            let _ = writeln!(out, "\n> {} ({}): {}", failure.category, failure.group, failure.reason);
        }
        out
    }
}

/// Collects the selections of every assembly group.
#[derive(Debug)]
pub struct BomBuilder<'c> {
    catalog: &'c MaterialCatalog,
    items: Vec<BillItem>,
    failures: Vec<GroupFailure>,
}

impl<'c> BomBuilder<'c> {
    pub fn new(catalog: &'c MaterialCatalog) -> Self {
        Self {
            catalog,
            items: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Chooses the sheets covering `tiles` tiles for one sheet group.
    ///
    /// `packings` holds the packer's result per sheet material; materials
    /// without one (no tile fits) are left out of the group. Bounded sheets
    /// hold `capacity_per_sheet` tiles each; unbounded stock is bought by
    /// length, at the packed length per tile.
    pub fn add_sheet_group(
        &mut self,
        index: usize,
        group: &AssemblyGroup,
        packings: &[PackingResult],
        tiles: usize,
    ) -> Result<Option<Selection>> {
        group.validate()?;
        let category = sheet_category(index);

        let mut options = Vec::with_capacity(group.materials.len());
        for name in &group.materials {
            let sheet = self.catalog.sheet(name)?;
            let Some(packing) = packings.iter().find(|p| &p.material == name) else {
                debug!("Sheet '{}' has no layout, leaving it out of '{}'", name, category);
                continue;
            };
            match packing.required_length {
                Some(length) if tiles > 0 => {
                    options.push(AssemblyOption::continuous(name.clone(), length / tiles as f64, sheet.unit_cost()));
                }
                Some(_) => {}
                None => options.push(AssemblyOption::discrete(
                    name.clone(),
                    packing.capacity_per_sheet as f64,
                    sheet.unit_cost(),
                )),
            }
        }

        let selection = match self.record(&category, optimize(&group.name, tiles as f64, &options)) {
            Some(selection) => selection?,
            None => return Ok(None),
        };

        for item in &selection.items {
            let sheet = self.catalog.sheet(&item.name)?;
            let quantity = match item.amount {
                Amount::Units(n) => BillQuantity::Count(n),
                Amount::Quantity(q) => BillQuantity::Length((q * 1000.0).round() / 1000.0),
            };
            let mut line = BillItem::new(item.name.clone(), category.clone(), quantity, sheet.cost);
            line.total_cost = item.cost;
            if let Some(url) = &sheet.url {
                line = line.with_notes(format!("[url link]({})", url));
            }
            debug!("Adding {:?} of '{}' to '{}'", quantity, item.name, category);
            self.items.push(line);
        }
        Ok(Some(selection))
    }

    /// Chooses the LED strips lining every tile of `tiling` for one LED
    /// group, and estimates its power supply.
    pub fn add_led_group(&mut self, index: usize, group: &AssemblyGroup, tiling: &Tiling) -> Result<Option<LedDemand>> {
        let category = led_category(index);
        let strips = group_strips(group, self.catalog)?;
        let demand = match self.record(&category, LedDemand::for_group(tiling, group, self.catalog)) {
            Some(demand) => demand?,
            None => return Ok(None),
        };
        let options = led_options(&strips);
        let selection = match self.record(&category, optimize(&group.name, demand.required_length, &options)) {
            Some(selection) => selection?,
            None => return Ok(None),
        };

        let mut watts = Some(0.0);
        let mut missing = Vec::new();
        for item in &selection.items {
            let strip = self.catalog.led_strip(&item.name)?;
            let count = match item.amount {
                Amount::Units(n) => n,
                Amount::Quantity(q) => q.ceil() as usize,
            };
            let mut notes = format!("Leds per tile: {}.", demand.leds_per_tile);
            if let Some(url) = &strip.url {
                let _ = write!(notes, " [url link]({})", url);
            }
            self.items.push(
                BillItem::new(item.name.clone(), category.clone(), BillQuantity::Count(count), strip.cost)
                    .with_notes(notes),
            );
            match strip.watts {
                Some(w) => watts = watts.map(|total| total + count as f64 * w),
                None => {
                    watts = None;
                    missing.push(strip.name.as_str());
                }
            }
        }

        match watts {
            Some(w) if !selection.is_empty() => {
                debug!("Estimated wattage of '{}': {}", category, w);
                self.items.push(BillItem {
                    name: format!("{}W power supply unit", w),
                    quantity: Some(BillQuantity::Count(1)),
                    unit_cost: None,
                    total_cost: 0.0,
                    category: category.clone(),
                    notes: Some(POWER_NOTE.to_string()),
                });
            }
            Some(_) => {}
            None => info!(
                "Cannot estimate the wattage of '{}': no 'watts' for {}",
                category,
                missing.join(", ")
            ),
        }
        Ok(Some(demand))
    }

    /// Adds the printed outer and inner walls framing `tiling`.
    pub fn add_walls(&mut self, tiling: &Tiling) {
        let walls = tiling.walls();
        let spec = tiling.spec();
        let notes = format!(
            "Side Length: {:.2}mm. Spacing: {:.2}mm. Junction Angle: {:.2}deg.",
            spec.side_length * 1000.0,
            spec.spacing * 1000.0,
            spec.junction_angle()
        );
        for (name, count) in [("outer wall", walls.outer), ("inner wall", walls.inner)] {
            self.items.push(
                BillItem::new(name, PRINTED_CATEGORY, BillQuantity::Count(count), None).with_notes(notes.clone()),
            );
        }
    }

    /// Adds a free-form item.
    pub fn add_item(&mut self, item: BillItem) {
        self.items.push(item);
    }

    pub fn build(self) -> BillOfMaterials {
        let total_cost = self.items.iter().map(|i| i.total_cost).sum();
        if !self.failures.is_empty() {
            warn!("{} assembly group(s) could not be covered", self.failures.len());
        }
        BillOfMaterials {
            items: self.items,
            failures: self.failures,
            total_cost,
        }
    }

    /// Records a group-local failure. Returns `None` when the group failed,
    /// otherwise the result to propagate.
    fn record<T>(&mut self, category: &str, result: Result<T>) -> Option<Result<T>> {
        match result {
            Err(Error::InsufficientCatalog { group, reason }) => {
                warn!("Skipping '{}' ({}): {}", category, group, reason);
                self.failures.push(GroupFailure {
                    group,
                    category: category.to_string(),
                    reason,
                });
                None
            }
            other => Some(other),
        }
    }
}
