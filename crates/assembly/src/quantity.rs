//! Minimum-cost covering of a demand with purchasable units.
//!
//! Every option is either a discrete unit (a sheet, a strip) with a fixed
//! capacity, or continuous stock bought in any quantity. The optimizer picks
//! non-negative unit counts whose capacity reaches the demand at minimum
//! cost. Continuous stock is the fallback: it covers whatever the discrete
//! units leave uncovered.
//!
//! # Algorithm
//!
//! Depth-first branch-and-bound over the discrete options. Option `i` is
//! tried with `0..=ceil(remaining / capacity_i)` units, where `remaining` is
//! the demand not yet covered by earlier options; more units could never
//! lower the cost. Branches whose partial cost already exceeds the best
//! complete selection are pruned. Catalog groups are tiny, so the search is
//! exhaustive and the result optimal.
//!
//! # Ties
//!
//! Among selections of equal cost: pure discrete coverage first, then fewer
//! units, then larger covered capacity.

use std::cmp::Ordering;

use log::{debug, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use lumatile_core::{Error, Result};

/// Relative tolerance on demand and cost comparisons.
const EPSILON: f64 = 1e-9;

/// A purchasable material as seen by the optimizer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "lowercase"))]
pub enum AssemblyOption {
    /// Sold by the unit; each unit covers `capacity` of the demand.
    Discrete {
        name: String,
        capacity: f64,
        cost: f64,
    },
    /// Sold by quantity; covering one unit of demand takes
    /// `quantity_per_demand` of it.
    Continuous {
        name: String,
        quantity_per_demand: f64,
        cost_per_quantity: f64,
    },
}

impl AssemblyOption {
    pub fn discrete(name: impl Into<String>, capacity: f64, cost: f64) -> Self {
        Self::Discrete {
            name: name.into(),
            capacity,
            cost,
        }
    }

    pub fn continuous(name: impl Into<String>, quantity_per_demand: f64, cost_per_quantity: f64) -> Self {
        Self::Continuous {
            name: name.into(),
            quantity_per_demand,
            cost_per_quantity,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Discrete { name, .. } | Self::Continuous { name, .. } => name,
        }
    }
}

/// How much of an option to buy.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Amount {
    Units(usize),
    Quantity(f64),
}

/// One line of a selection.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SelectedItem {
    pub name: String,
    pub amount: Amount,
    /// Demand covered by this line.
    pub covered: f64,
    pub cost: f64,
}

/// Cheapest way to cover a demand with the options of one group.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Selection {
    pub group: String,
    pub demand: f64,
    /// Selected options, in catalog order.
    pub items: Vec<SelectedItem>,
    pub total_cost: f64,
    /// Total demand covered, at least `demand`.
    pub capacity: f64,
    /// Discrete units bought, plus one for a continuous line.
    pub units: usize,
    /// Search nodes explored.
    pub nodes: u64,
}

impl Selection {
    /// Returns true if nothing needs to be bought.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true if continuous stock is part of the selection.
    pub fn uses_continuous(&self) -> bool {
        self.items
            .iter()
            .any(|i| matches!(i.amount, Amount::Quantity(_)))
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    counts: Vec<usize>,
    /// Demand left to the continuous fallback.
    remainder: f64,
    cost: f64,
    units: usize,
    capacity: f64,
}

impl Candidate {
    /// Ordering by cost, then pure discrete, then units, then capacity.
    fn compare(&self, other: &Candidate, tolerance: f64) -> Ordering {
        if self.cost < other.cost - tolerance {
            return Ordering::Less;
        }
        if self.cost > other.cost + tolerance {
            return Ordering::Greater;
        }
        let uses_fallback = |c: &Candidate| c.remainder > 0.0;
        uses_fallback(self)
            .cmp(&uses_fallback(other))
            .then(self.units.cmp(&other.units))
            .then(
                other
                    .capacity
                    .partial_cmp(&self.capacity)
                    .unwrap_or(Ordering::Equal),
            )
    }
}

struct Search<'a> {
    /// `(option index, capacity, cost)` of usable discrete options.
    discrete: Vec<(usize, f64, f64)>,
    /// `(option index, cost per unit of demand)` of the cheapest continuous
    /// option.
    fallback: Option<(usize, f64)>,
    options: &'a [AssemblyOption],
    demand: f64,
    tolerance: f64,
    counts: Vec<usize>,
    best: Option<Candidate>,
    nodes: u64,
}

impl Search<'_> {
    fn explore(&mut self, i: usize, covered: f64, cost: f64, units: usize) {
        self.nodes += 1;
        if let Some(best) = &self.best {
            if cost > best.cost + self.tolerance {
                return;
            }
        }

        if i == self.discrete.len() {
            self.complete(covered, cost, units);
            return;
        }

        let (_, capacity, unit_cost) = self.discrete[i];
        let remaining = (self.demand - covered).max(0.0);
        let max_count = ((remaining - self.tolerance) / capacity).ceil().max(0.0) as usize;
        for k in 0..=max_count {
            self.counts[i] = k;
            self.explore(
                i + 1,
                covered + k as f64 * capacity,
                cost + k as f64 * unit_cost,
                units + k,
            );
        }
        self.counts[i] = 0;
    }

    fn complete(&mut self, covered: f64, cost: f64, units: usize) {
        let candidate = if covered >= self.demand - self.tolerance {
            Candidate {
                counts: self.counts.clone(),
                remainder: 0.0,
                cost,
                units,
                capacity: covered,
            }
        } else if let Some((_, per_demand)) = self.fallback {
            let remainder = self.demand - covered;
            Candidate {
                counts: self.counts.clone(),
                remainder,
                cost: cost + remainder * per_demand,
                units: units + 1,
                capacity: self.demand,
            }
        } else {
            return;
        };

        let better = self
            .best
            .as_ref()
            .map_or(true, |b| candidate.compare(b, self.tolerance) == Ordering::Less);
        if better {
            trace!(
                "New best covering: counts {:?}, remainder {:.4}, cost {:.4}",
                candidate.counts,
                candidate.remainder,
                candidate.cost
            );
            self.best = Some(candidate);
        }
    }

    fn selection(self, group: &str) -> Option<Selection> {
        let best = self.best?;
        let mut items = Vec::new();
        for (slot, &(index, capacity, unit_cost)) in self.discrete.iter().enumerate() {
            let count = best.counts[slot];
            if count > 0 {
                items.push(SelectedItem {
                    name: self.options[index].name().to_string(),
                    amount: Amount::Units(count),
                    covered: count as f64 * capacity,
                    cost: count as f64 * unit_cost,
                });
            }
        }
        if best.remainder > 0.0 {
            if let Some((index, per_demand)) = self.fallback {
                if let AssemblyOption::Continuous {
                    name,
                    quantity_per_demand,
                    ..
                } = &self.options[index]
                {
                    items.push(SelectedItem {
                        name: name.clone(),
                        amount: Amount::Quantity(best.remainder * quantity_per_demand),
                        covered: best.remainder,
                        cost: best.remainder * per_demand,
                    });
                }
            }
        }

        Some(Selection {
            group: group.to_string(),
            demand: self.demand,
            items,
            total_cost: best.cost,
            capacity: best.capacity,
            units: best.units,
            nodes: self.nodes,
        })
    }
}

/// Finds the cheapest selection of `options` covering `demand`.
///
/// Fails with [`Error::InsufficientCatalog`] if no option can contribute to
/// the demand, and with [`Error::Configuration`] for a negative or
/// non-finite demand.
pub fn optimize(group: &str, demand: f64, options: &[AssemblyOption]) -> Result<Selection> {
    if !(demand.is_finite() && demand >= 0.0) {
        return Err(Error::Configuration(format!(
            "demand of group '{}' must be non-negative, got {}",
            group, demand
        )));
    }
    if options.is_empty() {
        return Err(Error::InsufficientCatalog {
            group: group.to_string(),
            reason: "the group lists no usable material".into(),
        });
    }

    let usable = |v: f64| v.is_finite() && v > 0.0;
    let mut discrete = Vec::new();
    let mut fallback: Option<(usize, f64)> = None;
    for (index, option) in options.iter().enumerate() {
        match option {
            AssemblyOption::Discrete { capacity, cost, .. } if usable(*capacity) => {
                discrete.push((index, *capacity, cost.max(0.0)));
            }
            AssemblyOption::Continuous {
                quantity_per_demand,
                cost_per_quantity,
                ..
            } if usable(*quantity_per_demand) => {
                let per_demand = quantity_per_demand * cost_per_quantity.max(0.0);
                if fallback.map_or(true, |(_, best)| per_demand < best) {
                    fallback = Some((index, per_demand));
                }
            }
            _ => debug!(
                "Ignoring '{}' in group '{}': it covers no demand",
                option.name(),
                group
            ),
        }
    }
    if discrete.is_empty() && fallback.is_none() {
        return Err(Error::InsufficientCatalog {
            group: group.to_string(),
            reason: "no material has a positive capacity".into(),
        });
    }

    let mut search = Search {
        counts: vec![0; discrete.len()],
        discrete,
        fallback,
        options,
        demand,
        tolerance: EPSILON * demand.max(1.0),
        best: None,
        nodes: 0,
    };
    search.explore(0, 0.0, 0.0, 0);
    let nodes = search.nodes;
    let selection = search.selection(group).ok_or_else(|| Error::InsufficientCatalog {
        group: group.to_string(),
        reason: format!("no combination reaches a demand of {}", demand),
    })?;

    debug!(
        "Group '{}': demand {:.4} covered at cost {:.2} with {} units ({} nodes)",
        group, demand, selection.total_cost, selection.units, nodes
    );
    Ok(selection)
}
