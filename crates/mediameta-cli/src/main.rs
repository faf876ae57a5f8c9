//! `mediameta` command line tool.
//!
//! - `extract FILE`: print the catalog item for one file as JSON
//! - `scan DIR`: extract a whole tree, print items and failures as JSON
//! - `art FILE`: write the album art registered for a file

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mediameta::{ExtractConfig, extract_file, parse_single_range, scan_library, serve_artwork};
use mediameta_types::MediaItem;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_SHA"),
    ", ",
    env!("BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "mediameta", version = VERSION)]
struct Args {
    /// Optional config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract metadata from a single file
    Extract { file: PathBuf },
    /// Extract metadata from every supported file under a directory
    Scan {
        dir: PathBuf,
        /// Worker threads
        #[arg(long, default_value_t = default_jobs())]
        jobs: usize,
    },
    /// Write the album art of a file to stdout or `--out`
    Art {
        file: PathBuf,
        /// HTTP style byte range, e.g. `bytes=0-1023`
        #[arg(long)]
        range: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct ScanOutput<'a> {
    items: &'a [MediaItem],
    failures: Vec<FailureOutput>,
}

#[derive(Serialize)]
struct FailureOutput {
    path: PathBuf,
    error: String,
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,mediameta=info")),
        )
        .init();

    let config = match args.config.as_ref() {
        Some(path) => ExtractConfig::load(path)?,
        None => ExtractConfig::default(),
    };

    match args.command {
        Command::Extract { file } => {
            let item =
                extract_file(&file, &config).with_context(|| format!("extract {:?}", file))?;
            print_json(&item)
        }
        Command::Scan { dir, jobs } => {
            let report = scan_library(&dir, &config, jobs)?;
            for failure in &report.failures {
                tracing::warn!(path = %failure.path.display(), error = %failure.error, "skipped");
            }
            let failures = report
                .failures
                .iter()
                .map(|failure| FailureOutput {
                    path: failure.path.clone(),
                    error: failure.error.to_string(),
                })
                .collect();
            print_json(&ScanOutput {
                items: &report.items,
                failures,
            })
        }
        Command::Art { file, range, out } => {
            write_art(&file, range.as_deref(), out.as_deref(), &config)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    serde_json::to_writer_pretty(&mut lock, value).context("write json")?;
    writeln!(lock)?;
    Ok(())
}

fn write_art(
    file: &Path,
    range: Option<&str>,
    out: Option<&Path>,
    config: &ExtractConfig,
) -> Result<()> {
    let item = extract_file(file, config).with_context(|| format!("extract {:?}", file))?;
    let (index, _) = item
        .album_art_resource()
        .ok_or_else(|| anyhow::anyhow!("no album art for {:?}", file))?;
    let mut content = serve_artwork(&item, index, config)?;
    let total = content.len();

    let bytes = match range {
        Some(header) => {
            let (start, end) = parse_single_range(header, total).ok_or_else(|| {
                anyhow::anyhow!("unsatisfiable range {header:?} for {total} bytes")
            })?;
            content.read_range(start, end)?
        }
        None => content.into_bytes(),
    };

    match out {
        Some(path) => {
            std::fs::write(path, &bytes).with_context(|| format!("write {:?}", path))?;
            tracing::info!(path = %path.display(), bytes = bytes.len(), total, "album art written");
        }
        None => std::io::stdout().lock().write_all(&bytes)?,
    }
    Ok(())
}
