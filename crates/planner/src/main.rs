//! Lumatile command-line planner.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::{info, warn};
use signal_hook::consts::SIGINT;
use signal_hook::flag;

use lumatile_planner::pipeline::{write_json, PACKING_FILE, ROUTING_FILE};
use lumatile_planner::{load_cached_route, Planner, ProjectConfig};

#[derive(Parser)]
#[command(name = "lumatile")]
#[command(about = "Plans LED tile mosaics: cable routing, sheet layouts and bill of materials")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SearchArgs {
    /// Routing cache; defaults to routing.json in the output directory
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Random seed overriding the project's
    #[arg(long)]
    seed: Option<u64>,

    /// Routing time limit in milliseconds overriding the project's
    #[arg(long)]
    time_limit: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write every output
    Plan {
        /// Project file (.toml or .json)
        project: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Run the routing search only
    Route {
        /// Project file (.toml or .json)
        project: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Lay the tiles out on every sheet material
    Pack {
        /// Project file (.toml or .json)
        project: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },

    /// Load and validate a project
    Validate {
        /// Project file (.toml or .json)
        project: PathBuf,
    },
}

fn load(path: &Path) -> anyhow::Result<ProjectConfig> {
    ProjectConfig::from_file(path).with_context(|| format!("Failed to load project '{}'", path.display()))
}

fn planner(path: &Path, output: &Path, search: &SearchArgs) -> anyhow::Result<Planner> {
    let mut project = load(path)?;
    if let Some(seed) = search.seed {
        project.routing.seed = Some(seed);
    }
    if let Some(ms) = search.time_limit {
        project.routing.time_limit_ms = ms;
    }

    let cache = search
        .cache
        .clone()
        .unwrap_or_else(|| output.join(ROUTING_FILE));
    let planner = Planner::new(project);
    Ok(match load_cached_route(&cache) {
        Some(state) => planner.with_warm_start(state),
        None => planner,
    })
}

/// Ctrl-C stops the routing search and keeps its best route; a second
/// Ctrl-C before the search has stopped exits immediately.
fn stop_routing_on_interrupt(planner: &Planner) -> anyhow::Result<()> {
    let cancel = planner.cancel_handle();
    flag::register_conditional_shutdown(SIGINT, 130, cancel.clone())
        .context("Failed to install the interrupt handler")?;
    flag::register(SIGINT, cancel).context("Failed to install the interrupt handler")?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Plan {
            project,
            output,
            search,
        } => {
            let planner = planner(&project, &output, &search)?;
            stop_routing_on_interrupt(&planner)?;
            let report = planner.run().context("Planning failed")?;
            if report.routing.cancelled {
                warn!("Routing interrupted; keeping the best route found so far");
            }
            let written = report
                .write_outputs(&output)
                .with_context(|| format!("Failed to write outputs to '{}'", output.display()))?;
            if let Some(cache) = &search.cache {
                write_json(cache, &report.routing).context("Failed to update the routing cache")?;
            }

            println!("Tiles:        {}", report.tiles);
            println!(
                "Wire length:  {:.4} ({} conflicts)",
                report.routing.cost.wire_length, report.routing.cost.conflicts
            );
            println!("Total cost:   {:.2}", report.bom.total_cost);
            for failure in &report.bom.failures {
                println!("  {} not covered: {}", failure.category, failure.reason);
            }
            for path in written {
                println!("Saved: {}", path.display());
            }
        }

        Commands::Route {
            project,
            output,
            search,
        } => {
            let planner = planner(&project, &output, &search)?;
            stop_routing_on_interrupt(&planner)?;
            let tiling = planner.tiling()?;
            let result = planner.route(&tiling).context("Routing failed")?;
            if result.cancelled {
                warn!("Routing interrupted; keeping the best route found so far");
            }
            std::fs::create_dir_all(&output)?;
            let cache = search.cache.unwrap_or_else(|| output.join(ROUTING_FILE));
            write_json(&cache, &result)?;
            println!(
                "Wire length {:.4}, {} conflicts, {} iterations",
                result.cost.wire_length, result.cost.conflicts, result.iterations
            );
            println!("Saved: {}", cache.display());
        }

        Commands::Pack { project, output } => {
            let planner = Planner::new(load(&project)?);
            let tiling = planner.tiling()?;
            let catalog = planner.project().catalog()?;
            let packings = planner.pack(&tiling, &catalog).context("Packing failed")?;
            std::fs::create_dir_all(&output)?;
            let path = write_json(&output.join(PACKING_FILE), &packings)?;
            for packing in &packings {
                println!(
                    "  {:<24} {:>4} per sheet  {:?}",
                    packing.material, packing.capacity_per_sheet, packing.quantity
                );
            }
            println!("Saved: {}", path.display());
        }

        Commands::Validate { project } => {
            let config = load(&project)?;
            config
                .validate()
                .with_context(|| format!("Project '{}' is invalid", project.display()))?;
            info!("Project '{}' is valid", project.display());
            println!("OK");
        }
    }

    Ok(())
}
