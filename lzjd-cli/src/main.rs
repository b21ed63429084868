use std::fs;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::bail;
use clap::Parser;
use lzjd::{BatchConfig, BatchEngine, Hasher, HasherConfig};

#[derive(Parser, Debug)]
#[clap(
    name = "lzjd",
    about = "A program to digest files into LZJD sketches and find similar pairs of them."
)]
struct Args {
    /// Input files (or directories with --deep) to be digested.
    #[clap(required_unless_present = "compare")]
    inputs: Vec<PathBuf>,

    /// Only shows pairs whose similarity percentage is at least this value.
    #[clap(short = 't', long, default_value = "20")]
    threshold: u32,

    /// Digests every regular file found under input directories.
    #[clap(short = 'r', long)]
    deep: bool,

    /// Digests all inputs and compares all pairs of them.
    #[clap(short = 'g', long)]
    gen_compare: bool,

    /// Number of worker threads. If None, the number of logical cores is used.
    #[clap(short = 'p', long)]
    threads: Option<usize>,

    /// Digest file to compare. Given once, all pairs within the file are compared.
    /// Given twice, every digest of the first file is compared with every digest of the second.
    #[clap(short = 'c', long)]
    compare: Vec<PathBuf>,

    /// Maximum number of hashes kept in a sketch.
    #[clap(short = 'k', long, default_value = "1024")]
    sketch_size: usize,

    /// Seed value of the phrase hash.
    #[clap(short = 's', long, default_value = "0")]
    seed: u32,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.compare.len() > 2 {
        bail!(
            "Can only compare at most two digest files at a time, got {}.",
            args.compare.len()
        );
    }

    let hasher = Hasher::new(HasherConfig {
        seed: args.seed,
        k: args.sketch_size,
        ..HasherConfig::default()
    })?;
    let mut config = BatchConfig {
        threshold: args.threshold,
        ..BatchConfig::default()
    };
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    let engine = BatchEngine::new(hasher, config)?;
    let stdout = BufWriter::new(io::stdout());

    if !args.compare.is_empty() {
        engine.compare_digest_files(&args.compare, stdout)?;
        return Ok(());
    }

    let files = collect_files(&args.inputs, args.deep);
    log::info!("Collected {} files", files.len());
    if args.gen_compare {
        engine.gen_compare(&files, stdout)?;
    } else {
        engine.digest_files(&files, stdout)?;
    }
    Ok(())
}

fn collect_files(inputs: &[PathBuf], deep: bool) -> Vec<PathBuf> {
    let mut files = vec![];
    for input in inputs {
        if input.is_file() {
            files.push(input.clone());
        } else if input.is_dir() {
            if deep {
                walk_dir(input, &mut files);
            } else {
                log::warn!("Skipped directory {} (use --deep)", input.display());
            }
        } else {
            log::warn!("Skipped {}: not a regular file", input.display());
        }
    }
    files
}

/// Appends every regular file under `dir`. Unreadable entries are logged and skipped.
fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::error!("Failed to read directory {}: {e}", dir.display());
            return;
        }
    };
    let mut paths = vec![];
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::error!("Failed to read an entry of {}: {e}", dir.display());
                continue;
            }
        };
        match entry.file_type() {
            Ok(file_type) => paths.push((entry.path(), file_type)),
            Err(e) => log::error!("Failed to stat {}: {e}", entry.path().display()),
        }
    }
    paths.sort_by(|a, b| a.0.cmp(&b.0));
    for (path, file_type) in paths {
        if file_type.is_dir() {
            walk_dir(&path, files);
        } else if file_type.is_file() {
            files.push(path);
        }
    }
}
