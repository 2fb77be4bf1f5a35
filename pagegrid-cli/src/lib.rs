//! Command implementations behind the `pagegrid` binary.
//!
//! Every command returns its output as text so it can be printed by `main`
//! or inspected in tests.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pagegrid_host::{GridConfig, LegacyItem, LegacyMigrator, blueprint};
use pagegrid_model::{AssetResolver, ElementRegistry, NoAssets, PassthroughRenderer, StaticAssets};
use pagegrid_storage::GridStore;
use pagegrid_types::Projection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "pagegrid")]
#[command(about = "Inspect and migrate PageGrid databases")]
pub struct Cli {
    /// Path to the grid configuration file
    #[arg(short, long, default_value = "pagegrid.toml")]
    pub config: PathBuf,

    /// Database file, overriding the configured one
    #[arg(short, long)]
    pub database: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Move embedded legacy grids into the grid tables
    Migrate {
        /// JSON export of legacy entries
        #[arg(short, long)]
        source: PathBuf,

        /// Preview changes without saving
        #[arg(long)]
        dry_run: bool,

        /// Migrate even when an entry already has grid data
        #[arg(long)]
        force: bool,
    },

    /// Print the grid of one owner
    Show {
        /// Owner key of the grid
        #[arg(short, long)]
        owner: String,

        /// Output shape: edit or render
        #[arg(short, long, default_value = "edit")]
        mode: Projection,

        /// JSON map of asset references used when rendering images
        #[arg(short, long)]
        assets: Option<PathBuf>,
    },

    /// Print the table definitions
    Schema,

    /// Print the editor set configuration
    Blueprint,
}

/// Resolves the configuration file and applies command-line overrides.
pub fn load_config(cli: &Cli) -> GridConfig {
    let mut config = GridConfig::load_from(&cli.config);
    if let Some(database) = &cli.database {
        config.database_path = database.clone();
    }
    config
}

/// Registry with the built-in element types.
pub fn build_registry(assets: Arc<dyn AssetResolver>) -> Result<ElementRegistry> {
    ElementRegistry::with_builtin(Arc::new(PassthroughRenderer), assets).context("Failed to register element types")
}

/// Runs one command and returns what it prints.
pub fn execute(cli: &Cli) -> Result<String> {
    let config = load_config(cli);
    debug!(database = %config.database_path.display(), "Using grid database");

    match &cli.command {
        Command::Migrate {
            source,
            dry_run,
            force,
        } => migrate(&config, source, *dry_run, *force),
        Command::Show { owner, mode, assets } => show(&config, owner, *mode, assets.as_deref()),
        Command::Schema => schema(&config),
        Command::Blueprint => blueprint_json(&config),
    }
}

fn open_store(config: &GridConfig, assets: Arc<dyn AssetResolver>) -> Result<GridStore> {
    let registry = build_registry(assets)?;
    config
        .open_store(Arc::new(registry))
        .with_context(|| format!("Failed to open grid database {:?}", config.database_path))
}

pub fn migrate(config: &GridConfig, source: &Path, dry_run: bool, force: bool) -> Result<String> {
    let contents =
        std::fs::read_to_string(source).with_context(|| format!("Failed to read legacy export {:?}", source))?;
    let items = LegacyItem::parse_all(&contents, &config.field_handle)
        .with_context(|| format!("Failed to parse legacy export {:?}", source))?;
    info!(items = items.len(), "Loaded legacy entries");

    let store = open_store(config, Arc::new(NoAssets))?;
    let report = LegacyMigrator::new(&store)
        .dry_run(dry_run)
        .force(force)
        .run(&items)
        .context("Migration failed")?;

    let mut out = String::new();
    for preview in &report.previews {
        out.push_str(&format!(
            "{} ({}): {} sections, {} rows, {} elements\n",
            preview.owner_key,
            preview.title.as_deref().unwrap_or("untitled"),
            preview.stats.sections,
            preview.stats.rows,
            preview.stats.elements,
        ));
    }
    out.push_str(&report.to_string());
    Ok(out)
}

pub fn show(config: &GridConfig, owner: &str, mode: Projection, assets: Option<&Path>) -> Result<String> {
    let resolver: Arc<dyn AssetResolver> = match assets {
        Some(path) => {
            let json =
                std::fs::read_to_string(path).with_context(|| format!("Failed to read assets {:?}", path))?;
            Arc::new(StaticAssets::from_json(&json).with_context(|| format!("Failed to parse assets {:?}", path))?)
        }
        None => Arc::new(NoAssets),
    };
    let store = open_store(config, resolver)?;
    let tree = store
        .load_tree(owner, mode)
        .with_context(|| format!("Failed to load grid for '{owner}'"))?;
    Ok(serde_json::to_string_pretty(&tree)?)
}

pub fn schema(config: &GridConfig) -> Result<String> {
    let store = open_store(config, Arc::new(NoAssets))?;
    let statements: Vec<String> = store.schema().ddl().into_iter().map(|s| format!("{s};")).collect();
    Ok(statements.join("\n\n"))
}

pub fn blueprint_json(config: &GridConfig) -> Result<String> {
    let registry = build_registry(Arc::new(NoAssets))?;
    let options = config.store_options().context("Invalid level fields in configuration")?;
    let groups = blueprint(&registry, &options.sections, &options.rows);
    Ok(serde_json::to_string_pretty(&groups)?)
}
