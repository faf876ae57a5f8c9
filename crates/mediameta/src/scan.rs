//! Recursive library scan on a pool of worker threads.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mediameta_types::MediaItem;

use crate::config::ExtractConfig;
use crate::detect::detect_family;
use crate::error::ExtractError;
use crate::extract::extract_file;

#[derive(Debug)]
pub struct ScanFailure {
    pub path: PathBuf,
    pub error: ExtractError,
}

#[derive(Debug, Default)]
pub struct ScanReport {
    /// Extracted items, sorted by location.
    pub items: Vec<MediaItem>,
    pub failures: Vec<ScanFailure>,
}

/// Extract every supported file under `root` using `jobs` threads.
pub fn scan_library(root: &Path, config: &ExtractConfig, jobs: usize) -> Result<ScanReport> {
    let root = root
        .canonicalize()
        .with_context(|| format!("canonicalize root {:?}", root))?;
    if !root.is_dir() {
        return Err(anyhow::anyhow!("root is not a directory: {:?}", root));
    }

    let mut files = Vec::new();
    collect_files(&root, config.sniff_mimetype, &mut files)?;
    let jobs = jobs.clamp(1, files.len().max(1));
    tracing::info!(root = %root.display(), files = files.len(), jobs, "scanning library");

    let (path_tx, path_rx) = crossbeam_channel::unbounded::<PathBuf>();
    let (result_tx, result_rx) = crossbeam_channel::unbounded();
    for path in files {
        // Receiver is alive until the scope below ends.
        let _ = path_tx.send(path);
    }
    drop(path_tx);

    std::thread::scope(|scope| {
        for _ in 0..jobs {
            let path_rx = path_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                for path in path_rx.iter() {
                    let result = extract_file(&path, config);
                    if result_tx.send((path, result)).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(result_tx);

    let mut report = ScanReport::default();
    for (path, result) in result_rx.iter() {
        match result {
            Ok(item) => report.items.push(item),
            Err(error) => report.failures.push(ScanFailure { path, error }),
        }
    }
    report.items.sort_by(|a, b| a.location.cmp(&b.location));
    report.failures.sort_by(|a, b| a.path.cmp(&b.path));

    tracing::info!(
        root = %root.display(),
        items = report.items.len(),
        failures = report.failures.len(),
        "library scan complete"
    );
    Ok(report)
}

/// Files the detector accepts, by extension or, when `sniff` is set, by content.
fn collect_files(dir: &Path, sniff: bool, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("read_dir {:?}", dir))? {
        let entry = entry.context("read_dir entry")?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, sniff, out)?;
        } else if path.is_file() && detect_family(&path, sniff).is_some() {
            out.push(path);
        }
    }
    Ok(())
}
