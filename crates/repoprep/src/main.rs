//! Repoprep - Package Kodi-style add-ons and generate the repository manifest.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use repoprep_common::hash::md5_reader;
use repoprep_common::{REPOSITORY_CHECKSUM, REPOSITORY_MANIFEST};
use repoprep_packager::{CompressionSummary, Pipeline, RepoSettings, RunReport};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "repoprep")]
#[command(
    author,
    version,
    about = "Compress add-ons into release archives and generate addons.xml"
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (json, text)
    #[arg(long, global = true, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RepoArgs {
    /// Repository root (defaults to the current directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// YAML settings file (repo_root, compress_addons, denylist)
    #[arg(long)]
    settings: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress add-ons, then generate addons.xml and addons.xml.md5
    Prepare {
        #[command(flatten)]
        repo: RepoArgs,

        /// Skip building release archives
        #[arg(long)]
        no_compress: bool,
    },

    /// Build and curate release archives only
    Compress {
        #[command(flatten)]
        repo: RepoArgs,
    },

    /// Generate addons.xml and addons.xml.md5 only
    Generate {
        #[command(flatten)]
        repo: RepoArgs,
    },

    /// Check addons.xml.md5 against addons.xml
    Verify {
        /// Repository root (defaults to the current directory)
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let report = match cli.command {
        Commands::Prepare { repo, no_compress } => {
            let mut settings = resolve_settings(&repo)?;
            if no_compress {
                settings.compress_addons = false;
            }
            Pipeline::new(settings)?.run()?
        }

        Commands::Compress { repo } => {
            let mut settings = resolve_settings(&repo)?;
            settings.compress_addons = true;
            let pipeline = Pipeline::new(settings)?;
            RunReport {
                repo_root: pipeline.settings().repo_root.clone(),
                compression: Some(pipeline.compress()?),
                generation: None,
            }
        }

        Commands::Generate { repo } => {
            let pipeline = Pipeline::new(resolve_settings(&repo)?)?;
            RunReport {
                repo_root: pipeline.settings().repo_root.clone(),
                compression: None,
                generation: Some(pipeline.generate(&CompressionSummary::disabled())?),
            }
        }

        Commands::Verify { root } => {
            let root = match root {
                Some(root) => root,
                None => std::env::current_dir()?,
            };
            let checksum = verify_checksum(&root)?;
            println!("{} matches {} ({})", REPOSITORY_CHECKSUM, REPOSITORY_MANIFEST, checksum);
            return Ok(());
        }
    };

    if report.failures() > 0 {
        warn!("{} add-on(s) had errors, see log above", report.failures());
    }

    match cli.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print!("{}", report.render_text()),
    }

    Ok(())
}

/// Settings file first, then `--root` on top; default root is the cwd.
fn resolve_settings(repo: &RepoArgs) -> Result<RepoSettings> {
    let mut settings = match &repo.settings {
        Some(path) => {
            info!("Loading settings from {:?}", path);
            RepoSettings::from_file(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?
        }
        None => RepoSettings::new(std::env::current_dir()?),
    };

    if let Some(root) = &repo.root {
        settings.repo_root = root.clone();
    }

    Ok(settings)
}

/// Recompute the manifest digest and compare it with the checksum file.
fn verify_checksum(root: &Path) -> Result<String> {
    let manifest_path = root.join(REPOSITORY_MANIFEST);
    let checksum_path = root.join(REPOSITORY_CHECKSUM);

    let expected = std::fs::read_to_string(&checksum_path)
        .with_context(|| format!("Failed to read {}", checksum_path.display()))?;
    let file = File::open(&manifest_path)
        .with_context(|| format!("Failed to open {}", manifest_path.display()))?;
    let actual = md5_reader(file)?;

    if expected.trim() != actual {
        bail!(
            "Checksum mismatch for {}: expected {}, got {}",
            manifest_path.display(),
            expected.trim(),
            actual
        );
    }

    Ok(actual)
}
