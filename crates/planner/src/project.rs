//! Project files.
//!
//! A project describes the mosaic (`[panels]`), the search parameters
//! (`[routing]`, `[packing]`), the purchasable materials (`[materials]`),
//! the groups of materials compared against each other (`[assembly]`) and
//! the exported LED layout (`[layout]`). Projects are read from TOML or
//! JSON, chosen by file extension.
//!
//! ```toml
//! catalogs = ["shop.toml"]
//!
//! [panels]
//! shape = "hexagon"
//! side_length = 0.05
//! spacing = 0.004
//! rows = 3
//! cols = 6
//!
//! [routing]
//! max_iterations = 200
//! seed = 42
//!
//! [materials.sheets."plywood 30x40"]
//! width = 0.3
//! height = 0.4
//! cost = 10.0
//!
//! [materials.leds."ws2812 5m"]
//! number_of_leds = 150
//! leds_per_meter = 30.0
//! cost = 20.0
//!
//! [assembly]
//! sheets = [["plywood 30x40"]]
//! leds = [["ws2812 5m"]]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lumatile_core::{
    AssemblyGroup, GridCell, LedStripMaterial, MaterialCatalog, SheetMaterial, TileShape, TileSpec,
    Tiling,
};
use lumatile_packing::PackingConfig;
use lumatile_routing::{RoutingConfig, DEFAULT_COMPONENT_SIZE};

/// Errors raised while loading or running a project.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("cannot access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("unsupported project format '{}' (expected .toml or .json)", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error(transparent)]
    Core(#[from] lumatile_core::Error),
}

/// Result alias for project operations.
pub type Result<T> = std::result::Result<T, ProjectError>;

/// Reads `path` as TOML or JSON depending on its extension.
pub(crate) fn read_document<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("toml") => read_with(path, |s| toml::from_str(s).map_err(|e| e.to_string())),
        Some("json") => read_with(path, |s| serde_json::from_str(s).map_err(|e| e.to_string())),
        _ => Err(ProjectError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

fn read_with<T, F>(path: &Path, parse: F) -> Result<T>
where
    F: FnOnce(&str) -> std::result::Result<T, String>,
{
    let content = std::fs::read_to_string(path).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content).map_err(|message| ProjectError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// The mosaic: tile geometry and occupied lattice cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelsConfig {
    pub shape: TileShape,
    #[serde(default)]
    pub variant: usize,
    pub side_length: f64,
    #[serde(default)]
    pub spacing: f64,
    pub rows: usize,
    pub cols: usize,
    /// Occupied `[row, col]` cells; every cell when absent.
    #[serde(default)]
    pub cells: Option<Vec<[usize; 2]>>,
}

impl PanelsConfig {
    pub fn spec(&self) -> lumatile_core::Result<TileSpec> {
        TileSpec::new(self.shape, self.variant, self.side_length, self.spacing)
    }

    /// Builds the tiling described by this section.
    pub fn tiling(&self) -> lumatile_core::Result<Tiling> {
        let spec = self.spec()?;
        match &self.cells {
            Some(cells) => Tiling::new(
                spec,
                self.rows,
                self.cols,
                cells.iter().map(|&[row, col]| GridCell::new(row, col)),
            ),
            None => Tiling::full(spec, self.rows, self.cols),
        }
    }
}

/// Sheet stock entry, keyed by name in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetEntry {
    pub width: f64,
    /// Absent for stock sold by length.
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub url: Option<String>,
}

/// LED strip entry, keyed by name in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedEntry {
    pub number_of_leds: u32,
    pub leds_per_meter: f64,
    #[serde(default)]
    pub watts: Option<f64>,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Materials keyed by name, as written in project and catalog files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialsSection {
    #[serde(default)]
    pub sheets: BTreeMap<String, SheetEntry>,
    #[serde(default)]
    pub leds: BTreeMap<String, LedEntry>,
}

impl MaterialsSection {
    /// Reads a standalone catalog file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        read_document(path.as_ref())
    }

    pub fn to_catalog(&self) -> MaterialCatalog {
        let mut catalog = MaterialCatalog::new();
        for (name, entry) in &self.sheets {
            catalog.add_sheet(SheetMaterial {
                name: name.clone(),
                width: entry.width,
                height: entry.height,
                cost: entry.cost,
                url: entry.url.clone(),
            });
        }
        for (name, entry) in &self.leds {
            catalog.add_led_strip(LedStripMaterial {
                name: name.clone(),
                number_of_leds: entry.number_of_leds,
                leds_per_meter: entry.leds_per_meter,
                watts: entry.watts,
                cost: entry.cost,
                url: entry.url.clone(),
            });
        }
        catalog
    }
}

/// Lists of materials compared for each purchasing decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssemblySection {
    #[serde(default)]
    pub sheets: Vec<Vec<String>>,
    #[serde(default)]
    pub leds: Vec<Vec<String>>,
}

impl AssemblySection {
    pub fn sheet_groups(&self) -> Vec<AssemblyGroup> {
        groups("sheets", &self.sheets)
    }

    pub fn led_groups(&self) -> Vec<AssemblyGroup> {
        groups("leds", &self.leds)
    }
}

fn groups(prefix: &str, lists: &[Vec<String>]) -> Vec<AssemblyGroup> {
    lists
        .iter()
        .enumerate()
        .map(|(i, materials)| AssemblyGroup::new(format!("{}-{}", prefix, i), materials.iter().cloned()))
        .collect()
}

/// Exported device layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Product name of the layout; the project file name when absent.
    pub name_prefix: Option<String>,
    /// Size of the larger side of the layout.
    pub component_size: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            name_prefix: None,
            component_size: DEFAULT_COMPONENT_SIZE,
        }
    }
}

/// A complete project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Extra catalog files merged under the project's own materials.
    #[serde(default)]
    pub catalogs: Vec<PathBuf>,
    pub panels: PanelsConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub packing: PackingConfig,
    #[serde(default)]
    pub materials: MaterialsSection,
    #[serde(default)]
    pub assembly: AssemblySection,
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Directory the project was loaded from; relative catalog paths
    /// resolve against it.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl ProjectConfig {
    /// Loads a project from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let project: Self = read_with(path, |s| toml::from_str(s).map_err(|e| e.to_string()))?;
        Ok(project.located(path))
    }

    /// Loads a project from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let project: Self = read_with(path, |s| serde_json::from_str(s).map_err(|e| e.to_string()))?;
        Ok(project.located(path))
    }

    /// Loads a project, picking the format from the file extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let project: Self = read_document(path)?;
        Ok(project.located(path))
    }

    fn located(mut self, path: &Path) -> Self {
        self.base_dir = path.parent().map(Path::to_path_buf);
        if self.layout.name_prefix.is_none() {
            self.layout.name_prefix = path
                .file_stem()
                .map(|s| format!("Lumatile {}", s.to_string_lossy()));
        }
        self
    }

    /// Product name used for exported layouts.
    pub fn layout_name(&self) -> String {
        self.layout
            .name_prefix
            .clone()
            .unwrap_or_else(|| "Lumatile".to_string())
    }

    /// Material catalog: extra catalog files in order, then the project's
    /// own entries, later entries replacing earlier ones with the same name.
    pub fn catalog(&self) -> Result<MaterialCatalog> {
        let mut catalog = MaterialCatalog::new();
        for file in &self.catalogs {
            let path = match &self.base_dir {
                Some(dir) if file.is_relative() => dir.join(file),
                _ => file.clone(),
            };
            debug!("Merging catalog '{}'", path.display());
            catalog.merge(MaterialsSection::from_file(&path)?.to_catalog());
        }
        catalog.merge(self.materials.to_catalog());
        Ok(catalog)
    }

    /// Checks everything that can be checked before running the pipeline.
    pub fn validate(&self) -> Result<()> {
        self.validated_catalog().map(|_| ())
    }

    /// Validates the project and returns the merged catalog it checked.
    pub fn validated_catalog(&self) -> Result<MaterialCatalog> {
        self.panels.tiling()?;
        self.routing.validate()?;
        self.packing.validate()?;
        let catalog = self.catalog()?;
        catalog.validate()?;
        for group in self.assembly.sheet_groups() {
            group.validate()?;
            for name in &group.materials {
                catalog.sheet(name)?;
            }
        }
        for group in self.assembly.led_groups() {
            group.validate()?;
            for name in &group.materials {
                catalog.led_strip(name)?;
            }
        }
        if !(self.layout.component_size.is_finite() && self.layout.component_size > 0.0) {
            return Err(lumatile_core::Error::Configuration(format!(
                "layout component_size must be positive, got {}",
                self.layout.component_size
            ))
            .into());
        }
        Ok(catalog)
    }
}
