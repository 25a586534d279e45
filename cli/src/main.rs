mod script;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use garden_canvas::assets::AssetCache;
use garden_canvas::catalog::{Catalog, resolve_tint};
use garden_canvas::config::{ConfigError, GardenConfig};
use garden_canvas::persist::{Operation, PersistError};
use garden_canvas::render::render_frame;
use garden_canvas::surface::{DisplayList, ImageRef};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::script::{Replay, Script};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid script: {0}")]
    Script(#[source] serde_json::Error),
    #[error("could not load garden: {0}")]
    Load(#[from] PersistError),
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "garden", about = "Replay and render the garden canvas engine headlessly")]
struct Cli {
    /// Engine configuration (JSON). Defaults apply when absent.
    #[arg(long, env = "GARDEN_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Item catalog (JSON). The bundled shop catalog applies when absent.
    #[arg(long, env = "GARDEN_CATALOG", global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a script and print the final garden state.
    Replay(ReplayArgs),
    /// Run a script and print one frame's display list.
    Render(RenderArgs),
    /// Validate and list the catalog.
    Catalog,
}

#[derive(Args, Debug)]
struct ScriptArgs {
    script: PathBuf,

    /// Persistence operations that always fail, e.g. `create_item,set_quantity`.
    #[arg(long, value_delimiter = ',')]
    fail: Vec<Operation>,

    #[arg(long, default_value_t = 1)]
    seed: u64,
}

#[derive(Args, Debug)]
struct ReplayArgs {
    #[command(flatten)]
    script: ScriptArgs,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    script: ScriptArgs,

    /// Frame timestamp.
    #[arg(long, default_value_t = 0.0)]
    at_ms: f64,

    /// Treat every catalog image as loaded instead of drawing fallbacks.
    #[arg(long, default_value_t = false)]
    images: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let catalog = load_catalog(cli.catalog.as_deref())?;

    match cli.command {
        Command::Replay(args) => run_replay(catalog, config, args).await,
        Command::Render(args) => run_render(catalog, config, args).await,
        Command::Catalog => run_catalog(&catalog, &config),
    }
}

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_owned(), source })
}

fn load_config(path: Option<&Path>) -> Result<GardenConfig, CliError> {
    match path {
        Some(path) => Ok(GardenConfig::from_json(&read(path)?)?),
        None => Ok(GardenConfig::default()),
    }
}

fn load_catalog(path: Option<&Path>) -> Result<Catalog, CliError> {
    match path {
        Some(path) => Ok(Catalog::from_json(&read(path)?)?),
        None => Ok(Catalog::bundled()?),
    }
}

async fn replay_script(catalog: Catalog, config: GardenConfig, args: &ScriptArgs) -> Result<Replay, CliError> {
    let script = Script::parse(&read(&args.script)?)?;
    let mut replay = Replay::start(&script, catalog, config, args.seed, &args.fail).await?;
    replay.run(&script.steps).await;
    tracing::info!(steps = script.steps.len(), notices = replay.notices().len(), "replay finished");
    Ok(replay)
}

async fn run_replay(catalog: Catalog, config: GardenConfig, args: ReplayArgs) -> Result<(), CliError> {
    let replay = replay_script(catalog, config, &args.script).await?;
    print_json(&replay.report())
}

async fn run_render(catalog: Catalog, config: GardenConfig, args: RenderArgs) -> Result<(), CliError> {
    let base = config.asset_base_url.clone();
    let replay = replay_script(catalog, config, &args.script).await?;
    let core = replay.core();

    let mut assets = AssetCache::new(base);
    if args.images {
        for kind in core.garden().catalog().iter() {
            if let Some(key) = &kind.asset_key {
                assets.finish(key, Ok(ImageRef(key.clone())));
            }
        }
    }

    let scene = core.scene(args.at_ms);
    let mut list = DisplayList::new();
    let Ok(()) = render_frame(&mut list, &scene, &assets);
    tracing::info!(ops = list.len(), at_ms = args.at_ms, "frame recorded");
    print_json(&list)
}

#[derive(Debug, Serialize)]
struct CatalogRow<'a> {
    name: &'a str,
    emoji: &'a str,
    price: u32,
    tint: &'a str,
    image: Option<String>,
}

fn run_catalog(catalog: &Catalog, config: &GardenConfig) -> Result<(), CliError> {
    let rows: Vec<CatalogRow<'_>> = catalog
        .iter()
        .map(|kind| CatalogRow {
            name: &kind.name,
            emoji: &kind.emoji_fallback,
            price: kind.price,
            tint: resolve_tint(&kind.tint),
            image: kind.asset_key.as_deref().map(|key| config.asset_url(key)),
        })
        .collect();
    tracing::info!(kinds = rows.len(), "catalog valid");
    print_json(&rows)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
