//! End-to-end planning of a project.

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use lumatile_assembly::{BillOfMaterials, BomBuilder};
use lumatile_core::{MaterialCatalog, Tiling};
use lumatile_packing::{PackingResult, SheetPacker};
use lumatile_routing::{LedAddressing, LedLayout, RoutingOptimizer, RoutingResult, RoutingState};

use crate::project::{ProjectConfig, ProjectError, Result};

pub const ROUTING_FILE: &str = "routing.json";
pub const PACKING_FILE: &str = "packing.json";
pub const BOM_FILE: &str = "bom.json";
pub const BOM_MARKDOWN_FILE: &str = "bom.md";
pub const LED_LAYOUT_FILE: &str = "led_layout.json";
pub const REPORT_FILE: &str = "report.json";

/// Everything produced by a planning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub tiles: usize,
    pub routing: RoutingResult,
    pub packings: Vec<PackingResult>,
    pub bom: BillOfMaterials,
    /// Detailed and centered layout of every LED group.
    pub led_layouts: Vec<LedLayout>,
    pub elapsed_ms: u64,
}

impl Report {
    /// Writes every output file into `dir`, creating it if needed.
    pub fn write_outputs(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        create_dir(dir)?;
        let written = vec![
            write_json(&dir.join(ROUTING_FILE), &self.routing)?,
            write_json(&dir.join(PACKING_FILE), &self.packings)?,
            write_json(&dir.join(BOM_FILE), &self.bom)?,
            write_text(&dir.join(BOM_MARKDOWN_FILE), &self.bom.to_markdown())?,
            write_json(&dir.join(LED_LAYOUT_FILE), &self.led_layouts)?,
            write_json(&dir.join(REPORT_FILE), self)?,
        ];
        Ok(written)
    }
}

/// Route stored by a previous run.
#[derive(Debug, Deserialize)]
struct CachedRoute {
    state: RoutingState,
}

/// Loads the route stored in `path` (the `routing.json` of a previous run).
///
/// A missing or unreadable cache is not an error: the search simply starts
/// from scratch.
pub fn load_cached_route(path: &Path) -> Option<RoutingState> {
    if !path.exists() {
        debug!("No routing cache at '{}'", path.display());
        return None;
    }
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|s| serde_json::from_str::<CachedRoute>(&s).map_err(|e| e.to_string()));
    match parsed {
        Ok(cached) => {
            info!("Loaded cached routing from '{}'", path.display());
            Some(cached.state)
        }
        Err(e) => {
            warn!("Ignoring routing cache '{}': {}", path.display(), e);
            None
        }
    }
}

/// Runs the routing search, the sheet packer and the assembly optimizer on
/// a project.
pub struct Planner {
    project: ProjectConfig,
    optimizer: RoutingOptimizer,
    warm_start: Option<RoutingState>,
}

impl Planner {
    pub fn new(project: ProjectConfig) -> Self {
        let optimizer = RoutingOptimizer::new(project.routing.clone());
        Self {
            project,
            optimizer,
            warm_start: None,
        }
    }

    /// Starts the routing search from a previous route.
    pub fn with_warm_start(mut self, state: RoutingState) -> Self {
        self.warm_start = Some(state);
        self
    }

    pub fn project(&self) -> &ProjectConfig {
        &self.project
    }

    /// Flag stopping the routing search early when set.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.optimizer.cancel_handle()
    }

    pub fn tiling(&self) -> Result<Tiling> {
        Ok(self.project.panels.tiling()?)
    }

    /// Routing search only.
    pub fn route(&self, tiling: &Tiling) -> Result<RoutingResult> {
        let result = self.optimizer.run_with_progress(tiling, self.warm_start.as_ref(), |p| {
            debug!(
                "Iteration {}: candidate {:.4}, best {:.4}{}",
                p.iteration,
                p.candidate_cost,
                p.best_cost,
                if p.random_start { " (random start)" } else { "" }
            );
        })?;
        info!(
            "Routing: wire length {:.4}, {} conflicts, {} iterations in {} ms{}",
            result.cost.wire_length,
            result.cost.conflicts,
            result.iterations,
            result.elapsed_ms,
            if result.cancelled { " (cancelled)" } else { "" }
        );
        Ok(result)
    }

    /// Layouts of the tiling on every sheet material that can hold a tile.
    pub fn pack(&self, tiling: &Tiling, catalog: &MaterialCatalog) -> Result<Vec<PackingResult>> {
        let packings = SheetPacker::new(self.project.packing.clone()).pack_catalog(tiling, catalog)?;
        for packing in &packings {
            info!(
                "Packing '{}': {} tiles per sheet, {:?}, utilization {}",
                packing.material,
                packing.capacity_per_sheet,
                packing.quantity,
                packing.utilization_percent()
            );
        }
        Ok(packings)
    }

    /// Runs the whole pipeline.
    pub fn run(&self) -> Result<Report> {
        let start = Instant::now();
        let catalog = self.project.validated_catalog()?;
        let tiling = self.tiling()?;
        info!("Planning {} {} tiles", tiling.len(), tiling.spec().shape);

        let routing = self.route(&tiling)?;
        let packings = self.pack(&tiling, &catalog)?;

        let mut builder = BomBuilder::new(&catalog);
        builder.add_walls(&tiling);
        for (index, group) in self.project.assembly.sheet_groups().iter().enumerate() {
            builder.add_sheet_group(index, group, &packings, tiling.len())?;
        }

        let name = self.project.layout_name();
        let size = self.project.layout.component_size;
        let mut led_layouts = Vec::new();
        for (index, group) in self.project.assembly.led_groups().iter().enumerate() {
            let Some(demand) = builder.add_led_group(index, group, &tiling)? else {
                continue;
            };
            let leds = LedAddressing::build(&tiling, &routing.state, demand.leds_per_tile)?;
            let layout_name = if index == 0 {
                name.clone()
            } else {
                format!("{} {}", name, group.name)
            };
            led_layouts.push(LedLayout::detailed(&layout_name, &tiling, &leds, size));
            led_layouts.push(LedLayout::centered(&layout_name, &tiling, &leds, size));
        }

        let bom = builder.build();
        info!(
            "Bill of materials: {} items, total cost {:.2}",
            bom.items.len(),
            bom.total_cost
        );
        Ok(Report {
            tiles: tiling.len(),
            routing,
            packings,
            bom,
            led_layouts,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }
}

fn create_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|source| ProjectError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

/// Writes `value` as pretty JSON.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(value).map_err(|e| ProjectError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    write_text(path, &json)
}

fn write_text(path: &Path, content: &str) -> Result<PathBuf> {
    std::fs::write(path, content).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Wrote '{}'", path.display());
    Ok(path.to_path_buf())
}
