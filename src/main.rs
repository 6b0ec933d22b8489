use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use medley::config::{AppConfig, CliConfig, FileConfig};
use medley::filesystem::{ArtworkStore, FilesystemSource, TagExtractor};
use medley::source::{SearchField, SortField, SortOrder, SourceType};
use medley::{LibraryManager, QueryOptions, SearchOptions};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

fn parse_dir(s: &str) -> Result<PathBuf, String> {
    let path = parse_path(s)?;
    if !path.exists() {
        return Err(format!("Directory does not exist: {}", s));
    }
    if !path.is_dir() {
        return Err(format!("Path is not a directory: {}", s));
    }
    Ok(path)
}

#[derive(Parser, Debug)]
#[clap(name = "medley", about = "Personal music library engine")]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI
    /// arguments.
    #[clap(long, value_parser = parse_path)]
    config: Option<PathBuf>,

    /// Scan a single directory without a configuration file.
    #[clap(long, value_parser = parse_dir)]
    root: Option<PathBuf>,

    /// Directory for the cover art cache.
    #[clap(long, value_parser = parse_path)]
    artwork_dir: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan sources and print per-source progress summaries.
    Scan {
        /// Scan only this source id instead of all sources.
        #[clap(long)]
        source: Option<String>,
    },
    /// Scan, then list all tracks as JSON.
    List {
        #[clap(long, default_value = "title")]
        sort: SortField,
        #[clap(long, default_value = "asc")]
        order: SortOrder,
        #[clap(long, default_value_t = 0)]
        limit: usize,
        #[clap(long, default_value_t = 0)]
        offset: usize,
    },
    /// Scan, then search tracks by substring.
    Search {
        query: String,
        /// Fields to match, comma separated (title,artist,album,genre).
        #[clap(long, value_delimiter = ',')]
        fields: Vec<SearchField>,
    },
    /// Scan, then list albums derived from the track set.
    Albums,
    /// Scan, then list artists derived from the track set.
    Artists,
    /// List the immediate children of a directory within a source.
    Browse {
        #[clap(long)]
        source: String,
        #[clap(default_value = "")]
        path: String,
    },
}

fn build_library(config: &AppConfig) -> Arc<LibraryManager> {
    let manager = Arc::new(LibraryManager::new());
    let artwork = ArtworkStore::new(&config.artwork_dir);

    for settings in config.enabled_sources() {
        match settings.source_type {
            SourceType::Filesystem => {
                let extractor = Arc::new(TagExtractor::new(Some(artwork.clone())));
                manager.register_source(Arc::new(FilesystemSource::new(
                    &settings.id,
                    &settings.root_path,
                    &settings.extensions,
                    extractor,
                )));
            }
            SourceType::ApiSelfHosted => {
                warn!(
                    "Source {}: api-selfhosted sources are not supported yet, skipping",
                    settings.id
                );
            }
        }
    }

    manager
}

/// Scan with Ctrl+C wired to cancellation.
async fn run_scan(
    manager: &LibraryManager,
    source: Option<&str>,
    cancel: CancellationToken,
) -> Result<()> {
    let scan = async {
        match source {
            Some(id) => manager.scan_source(id, cancel.clone()).await,
            None => manager.scan_all_sources(cancel.clone()).await,
        }
    };

    tokio::select! {
        result = scan => {
            result?;
            Ok(())
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, cancelling scan");
            cancel.cancel();
            // Give in-flight file operations a moment to notice.
            tokio::time::sleep(Duration::from_millis(100)).await;
            bail!("scan cancelled")
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };

    let cli_config = CliConfig {
        artwork_dir: cli_args.artwork_dir.clone(),
        root: cli_args.root.clone(),
    };
    let app_config = AppConfig::resolve(&cli_config, file_config)?;

    let manager = build_library(&app_config);
    let cancel = CancellationToken::new();

    match cli_args.command {
        Command::Scan { source } => {
            run_scan(&manager, source.as_deref(), cancel).await?;
            print_json(&manager.all_scan_progress())?;
        }
        Command::List {
            sort,
            order,
            limit,
            offset,
        } => {
            run_scan(&manager, None, cancel).await?;
            let opts = QueryOptions {
                sort_by: sort,
                sort_order: order,
                limit,
                offset,
            };
            print_json(&manager.get_all_tracks(&opts))?;
        }
        Command::Search { query, fields } => {
            run_scan(&manager, None, cancel).await?;
            let mut opts = SearchOptions::default();
            if !fields.is_empty() {
                opts.fields = fields;
            }
            print_json(&manager.search_tracks(&query, &opts))?;
        }
        Command::Albums => {
            run_scan(&manager, None, cancel).await?;
            print_json(&manager.get_albums())?;
        }
        Command::Artists => {
            run_scan(&manager, None, cancel).await?;
            print_json(&manager.get_artists())?;
        }
        Command::Browse { source, path } => {
            print_json(&manager.browse_source(&source, &path)?)?;
        }
    }

    manager.shutdown();
    Ok(())
}
