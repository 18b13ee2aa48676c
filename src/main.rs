//! spritepack command line
//!
//! Usage:
//!   spritepack import hero.json           # Import an atlas into the library
//!   spritepack dest hero.json             # Print where the atlas artifact lives
//!   spritepack sample hero.png 3 -1 --wrap repeat

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::info;
use std::path::{Path, PathBuf};

use spritepack::assetdb::LibraryDb;
use spritepack::atlas_format;
use spritepack::config::{LibraryConfig, CONFIG_FILE};
use spritepack::meta::{AtlasMeta, MetaError};
use spritepack::texture::{Texture, WrapMode};

#[derive(Parser)]
#[command(name = "spritepack")]
#[command(about = "Import packed sprite atlases into an asset library")]
struct Cli {
    /// Library directory (overrides the config file)
    #[arg(long, global = true)]
    library: Option<PathBuf>,

    /// Config file
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import an atlas description and all of its sprites
    Import {
        /// Atlas description (TexturePacker JSON)
        atlas: PathBuf,
    },
    /// Print the library path of an atlas
    Dest {
        atlas: PathBuf,
    },
    /// Print the color of one pixel
    Sample {
        image: PathBuf,
        #[arg(allow_hyphen_values = true)]
        x: i64,
        #[arg(allow_hyphen_values = true)]
        y: i64,
        #[arg(long, value_enum, default_value_t = Wrap::Clamp)]
        wrap: Wrap,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Wrap {
    Clamp,
    Repeat,
}

impl From<Wrap> for WrapMode {
    fn from(w: Wrap) -> Self {
        match w {
            Wrap::Clamp => WrapMode::Clamp,
            Wrap::Repeat => WrapMode::Repeat,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = LibraryConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config {}", cli.config.display()))?;
    if let Some(library) = cli.library {
        config.library_dir = library;
    }

    match cli.command {
        Commands::Import { atlas } => import(&config, &atlas),
        Commands::Dest { atlas } => dest(&config, &atlas),
        Commands::Sample { image, x, y, wrap } => sample(&image, x, y, wrap.into()),
    }
}

/// Load the atlas meta next to `atlas`, or start a fresh one
fn load_meta(config: &LibraryConfig, db: &mut LibraryDb, atlas: &Path) -> Result<AtlasMeta> {
    let uuid = db
        .assign_uuid(atlas, &config.meta_extension)
        .with_context(|| format!("Failed to assign uuid to {}", atlas.display()))?;
    let meta_path = config.meta_path_for(atlas);
    let mut meta = AtlasMeta::load(&meta_path)
        .with_context(|| format!("Failed to read meta {}", meta_path.display()))?;
    meta.uuid = uuid;
    Ok(meta)
}

fn import(config: &LibraryConfig, atlas: &Path) -> Result<()> {
    if !atlas.is_file() {
        anyhow::bail!("Atlas {} not found", atlas.display());
    }
    let mut db = LibraryDb::from_config(config);

    // Register the packed image so sprite frames can reference it.
    // Parse errors are reported by the import itself.
    if let Ok(parsed) = atlas_format::parse(atlas) {
        if parsed.image.is_file() {
            db.assign_uuid(&parsed.image, &config.meta_extension)
                .with_context(|| format!("Failed to assign uuid to {}", parsed.image.display()))?;
        }
    }

    let mut meta = load_meta(config, &mut db, atlas)?;
    let result = meta.import(atlas, &db);

    // Sprites that imported still keep their uuids on a partial failure
    if matches!(result, Ok(_) | Err(MetaError::SubImports(_))) {
        let meta_path = config.meta_path_for(atlas);
        meta.save(&meta_path)
            .with_context(|| format!("Failed to write meta {}", meta_path.display()))?;
    }

    let imported = result.with_context(|| format!("Failed to import {}", atlas.display()))?;
    info!("Atlas copied to {}", imported.library_path.display());

    for path in meta.dest(&db) {
        println!("{}", path.display());
    }
    for (sprite, path) in imported.sprites.iter().zip(meta.sub_dests(&db)) {
        println!("  {} -> {}", sprite.name, path.display());
    }
    Ok(())
}

fn dest(config: &LibraryConfig, atlas: &Path) -> Result<()> {
    let meta_path = config.meta_path_for(atlas);
    if !meta_path.exists() {
        anyhow::bail!("{} has not been imported (no {})", atlas.display(), meta_path.display());
    }
    let mut db = LibraryDb::from_config(config);
    let meta = load_meta(config, &mut db, atlas)?;
    for path in meta.dest(&db) {
        println!("{}", path.display());
    }
    Ok(())
}

fn sample(image: &Path, x: i64, y: i64, wrap: WrapMode) -> Result<()> {
    let texture = Texture::load(image)
        .with_context(|| format!("Failed to load {}", image.display()))?
        .with_wrap_mode(wrap);
    let [r, g, b, a] = texture.get_pixel(x, y).to_rgba8();
    println!(
        "{}x{} {} ({}, {}) = #{:02x}{:02x}{:02x}{:02x}",
        texture.width,
        texture.height,
        wrap.label(),
        x,
        y,
        r,
        g,
        b,
        a
    );
    Ok(())
}
