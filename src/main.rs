use std::{path::PathBuf, sync::Arc};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use effect_assets::{
    assets::{self, AssetKind, AssetRegistry},
    config::Config,
    keyframes::KeyframeModelList,
    params::ParamSchema,
};

#[derive(Parser)]
#[command(
    name = "effect-assets",
    version,
    about = "Inspect the effect catalogue and sample keyframed parameters",
    long_about = "Effect-Assets indexes engine services and XML effect definitions, and evaluates keyframe animations the way the editor's parameter controls do."
)]
struct Cli {
    /// Configuration file (optional)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List registered effects
    List {
        /// Only show one kind (video, audio, custom, hidden)
        #[arg(short, long)]
        kind: Option<String>,
    },

    /// Show one effect and its parameters
    Show {
        id: String,

        /// Print the definition XML
        #[arg(long)]
        xml: bool,
    },

    /// Re-read a single definition file
    Reload { file: PathBuf },

    /// Evaluate a parameter animation at given frames
    Sample {
        id: String,

        /// Parameter name
        #[arg(short, long)]
        param: String,

        /// Animation string, e.g. "0=0;25=1" (defaults to the definition's own)
        #[arg(short, long)]
        keys: Option<String>,

        /// Frames to evaluate
        #[arg(short, long, num_args = 1.., required = true)]
        at: Vec<i64>,

        /// Effect duration in frames
        #[arg(short, long, default_value_t = 250)]
        duration: i64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("Starting Effect-Assets v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };
    config.validate()?;

    let shared = assets::global::get_or_init(|| {
        AssetRegistry::new(Arc::new(config.catalog()), config.sources())
    });
    let mut registry = assets::global::lock(shared);

    let removed = registry.purge_invalid_favorites(&mut config);
    if !removed.is_empty() {
        if let Some(config_path) = &cli.config {
            config.save_to_file(config_path)?;
            info!("Updated favorites in {:?}", config_path);
        }
    }

    match cli.command {
        Command::List { kind } => {
            let kind = match kind {
                Some(k) => Some(
                    AssetKind::from_type_attr(&k)
                        .ok_or_else(|| anyhow::anyhow!("Unknown effect kind: {}", k))?,
                ),
                None => None,
            };

            for info in registry.list(kind) {
                let kind = info.kind.to_string();
                let favorite = if config.registry.favorites.contains(&info.id) { "*" } else { " " };
                println!(
                    "{} {:<28} {:<8} {:<10} {}",
                    favorite,
                    info.id,
                    kind,
                    info.origin.label(),
                    info.display_name
                );
            }
        }

        Command::Show { id, xml } => {
            let info = registry.get(&id).map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("{} ({})", info.display_name, info.id);
            println!("  service: {}", info.service);
            println!("  kind:    {}", info.kind);
            match info.origin.path() {
                Some(path) => println!("  origin:  {} ({})", info.origin.label(), path.display()),
                None => println!("  origin:  {}", info.origin.label()),
            }
            if let Some(description) = &info.description {
                println!("  {}", description);
            }

            let schema = ParamSchema::from_asset(info, &config.profile);
            for def in schema.iter() {
                println!(
                    "  - {:<16} {:?} default {}",
                    def.name,
                    def.kind,
                    def.format_value(&def.default)
                );
                if let Some(comment) = &def.comment {
                    println!("      {}", comment);
                }
            }

            if xml {
                println!("{}", info.xml.to_xml_string()?);
            }
        }

        Command::Reload { file } => match registry.reload_single(&file) {
            Some(asset) => println!("Reloaded {} ({})", asset.id, asset.service),
            None => warn!("Nothing loaded from {:?}", file),
        },

        Command::Sample { id, param, keys, at, duration } => {
            let info = registry.get(&id).map_err(|e| anyhow::anyhow!(e.user_message()))?;
            let schema = ParamSchema::from_asset(info, &config.profile);
            let index = schema
                .index_of(&param)
                .ok_or_else(|| anyhow::anyhow!("Effect {} has no parameter {}", id, param))?;

            let mut model = KeyframeModelList::new(schema, duration);
            if let Some(keys) = keys {
                model
                    .load_animation(index, &keys)
                    .with_context(|| format!("Invalid animation for {}", param))?;
            }

            let def = model
                .schema()
                .get(index)
                .ok_or_else(|| anyhow::anyhow!("Effect {} has no parameter {}", id, param))?;
            for frame in at {
                let value = model.interpolated_value(frame, index)?;
                println!(
                    "{} {:>6}  {}",
                    config.profile.timecode(frame),
                    frame,
                    def.format_value(&value)
                );
            }
        }
    }

    Ok(())
}
