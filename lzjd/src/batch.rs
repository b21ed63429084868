//! Parallel digesting and all-pairs comparison.
//!
//! Work is over-partitioned into `threads * groups_per_thread` striped task groups,
//! where group `g` handles the tasks `g, g + G, g + 2G, ...`, so inputs of uneven size
//! still balance across workers. Every worker owns one scratch and one output buffer,
//! created before the run and reused by all groups the worker executes.
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use rayon::prelude::*;

use crate::cache::{FileId, PathInterner, SketchCache};
use crate::codec::DigestRecord;
use crate::config::BatchConfig;
use crate::errors::{LzjdError, Result};
use crate::hasher::Hasher;
use crate::output::{LineBuffer, OutputSink};
use crate::sketch::{similarity, to_percent};

/// Engine running digest and comparison jobs on a fixed-width worker pool.
pub struct BatchEngine {
    hasher: Hasher,
    interner: PathInterner,
    config: BatchConfig,
    pool: rayon::ThreadPool,
}

impl BatchEngine {
    /// Creates an instance. A sketch cache is attached to `hasher` unless it has one.
    pub fn new(hasher: Hasher, config: BatchConfig) -> Result<Self> {
        let config = config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()
            .map_err(|e| LzjdError::ThreadPool(e.to_string()))?;
        let hasher = match hasher.cache() {
            Some(_) => hasher,
            None => hasher.with_cache(Arc::new(SketchCache::new())),
        };
        Ok(Self {
            hasher,
            interner: PathInterner::new(),
            config,
            pool,
        })
    }

    /// Gets the hasher.
    pub const fn hasher(&self) -> &Hasher {
        &self.hasher
    }

    /// Gets the configuration.
    pub const fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Writes one digest line per readable file into `writer`.
    /// Unreadable files are logged and skipped.
    pub fn digest_files<P, W>(&self, paths: &[P], writer: W) -> Result<W>
    where
        P: AsRef<Path> + Sync,
        W: Write + Send,
    {
        let start = Instant::now();
        let sink = OutputSink::new(writer, self.config.flush_threshold);
        let k = self.hasher.config().k;
        let failed = AtomicUsize::new(0);

        self.run_striped(
            paths.len(),
            || (self.hasher.scratch(), sink.register()),
            |(scratch, out), i| {
                let path = paths[i].as_ref();
                let line = self.hasher.digest_file(scratch, path).and_then(|sketch| {
                    DigestRecord::new(path.display().to_string(), sketch).to_line(k)
                });
                match line {
                    Ok(line) => emit(out, &line),
                    Err(e) => {
                        failed.fetch_add(1, Ordering::Relaxed);
                        log::error!("{e}");
                    }
                }
            },
        );
        sink.finish().map_err(LzjdError::Output)?;

        let failed = failed.into_inner();
        log::info!(
            "Digested {} files ({failed} skipped) in {} sec",
            paths.len() - failed,
            start.elapsed().as_secs_f64()
        );
        Ok(sink.into_inner())
    }

    /// Digests files in parallel, returning the records of the readable ones in input order.
    /// Sketches are kept in the cache, so a path digested before is not read again.
    pub fn digest_records<P>(&self, paths: &[P]) -> Vec<DigestRecord>
    where
        P: AsRef<Path> + Sync,
    {
        let start = Instant::now();
        let ids: Vec<FileId> = paths.iter().map(|p| self.interner.intern(p)).collect();

        self.run_striped(
            paths.len(),
            || self.hasher.scratch(),
            |scratch, i| {
                if let Err(e) = self
                    .hasher
                    .digest_file_cached(scratch, ids[i], paths[i].as_ref())
                {
                    log::error!("{e}");
                }
            },
        );

        let records: Vec<_> = match self.hasher.cache() {
            Some(cache) => paths
                .iter()
                .zip(ids)
                .filter_map(|(path, id)| {
                    let name = path.as_ref().display().to_string();
                    cache.get(id).map(|sketch| DigestRecord::new(name, sketch))
                })
                .collect(),
            None => vec![],
        };
        log::info!(
            "Produced {} sketches in {} sec",
            records.len(),
            start.elapsed().as_secs_f64()
        );
        records
    }

    /// Writes a comparison line for every pair `(i, j)` with `i < j` whose
    /// similarity percentage reaches the threshold.
    pub fn compare_within<W>(&self, records: &[DigestRecord], writer: W) -> Result<W>
    where
        W: Write + Send,
    {
        self.compare(records, records, true, writer)
    }

    /// Writes a comparison line for every pair of a record in `lhs` and a record
    /// in `rhs` whose similarity percentage reaches the threshold.
    pub fn compare_between<W>(
        &self,
        lhs: &[DigestRecord],
        rhs: &[DigestRecord],
        writer: W,
    ) -> Result<W>
    where
        W: Write + Send,
    {
        self.compare(lhs, rhs, false, writer)
    }

    /// Digests files and compares all pairs of them.
    pub fn gen_compare<P, W>(&self, paths: &[P], writer: W) -> Result<W>
    where
        P: AsRef<Path> + Sync,
        W: Write + Send,
    {
        let records = self.digest_records(paths);
        self.compare_within(&records, writer)
    }

    /// Reads one or two digest files and compares their records: all pairs within
    /// a single file, or every record of the first file against every record of the second.
    pub fn compare_digest_files<W>(&self, digest_paths: &[PathBuf], writer: W) -> Result<W>
    where
        W: Write + Send,
    {
        match digest_paths {
            [path] => {
                let records = crate::codec::read_digest_file(path)?;
                self.compare_within(&records, writer)
            }
            [lhs, rhs] => {
                let lhs = crate::codec::read_digest_file(lhs)?;
                let rhs = crate::codec::read_digest_file(rhs)?;
                self.compare_between(&lhs, &rhs, writer)
            }
            _ => Err(LzjdError::input(format!(
                "Can only compare one or two digest files at a time, got {}.",
                digest_paths.len()
            ))),
        }
    }

    fn compare<W>(
        &self,
        lhs: &[DigestRecord],
        rhs: &[DigestRecord],
        above_diagonal: bool,
        writer: W,
    ) -> Result<W>
    where
        W: Write + Send,
    {
        let start = Instant::now();
        let sink = OutputSink::new(writer, self.config.flush_threshold);
        let threshold = self.config.threshold;
        let matched = AtomicUsize::new(0);

        self.run_striped(lhs.len(), || sink.register(), |out, i| {
            let a = &lhs[i];
            let from = if above_diagonal { i + 1 } else { 0 };
            for b in &rhs[from.min(rhs.len())..] {
                let percent = to_percent(similarity(&a.sketch, &b.sketch));
                if percent >= threshold {
                    matched.fetch_add(1, Ordering::Relaxed);
                    emit(out, &format!("{}|{}|{percent:03}", a.name, b.name));
                }
            }
        });
        sink.finish().map_err(LzjdError::Output)?;

        log::info!(
            "Found {} pairs at threshold {threshold} in {} sec",
            matched.into_inner(),
            start.elapsed().as_secs_f64()
        );
        Ok(sink.into_inner())
    }

    /// Runs `op` on every task index with the state of the executing worker.
    /// `init` is called exactly once per worker.
    fn run_striped<T, INIT, OP>(&self, num_tasks: usize, init: INIT, op: OP)
    where
        T: Send,
        INIT: Fn() -> T,
        OP: Fn(&mut T, usize) + Sync + Send,
    {
        if num_tasks == 0 {
            return;
        }
        let num_groups = self.config.num_groups(num_tasks);
        log::debug!("Running {num_tasks} tasks in {num_groups} groups");
        let states: Vec<_> = (0..self.pool.current_num_threads())
            .map(|_| Mutex::new(init()))
            .collect();
        self.pool.install(|| {
            (0..num_groups).into_par_iter().for_each(|group| {
                // Each worker only locks its own slot, so the lock is never contended.
                let worker = rayon::current_thread_index().unwrap_or(0) % states.len();
                let mut state = states[worker].lock();
                (group..num_tasks)
                    .step_by(num_groups)
                    .for_each(|i| op(&mut *state, i));
            });
        });
    }
}

fn emit<W>(out: &mut LineBuffer<'_, W>, line: &str)
where
    W: Write,
{
    if let Err(e) = out.push_line(line) {
        log::error!("Failed to write a result line: {e}");
    }
}
