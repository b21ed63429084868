//! Configurations of hashing and batch execution.
use crate::errors::{LzjdError, Result};

/// Default number of hashes kept in a sketch.
pub const DEFAULT_SKETCH_SIZE: usize = 1024;

/// Configuration of the LZ hasher and sketch builder.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HasherConfig {
    /// Seed of Murmur3.
    pub seed: u32,
    /// Maximum number of hashes kept in a sketch.
    pub k: usize,
    /// Load factor of the phrase dictionary, in the range of (0,1).
    pub set_load_factor: f32,
    /// Size of the read buffer in bytes (must be more than 0).
    pub buffer_bytes: usize,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            k: DEFAULT_SKETCH_SIZE,
            set_load_factor: 0.65,
            buffer_bytes: 4096,
        }
    }
}

impl HasherConfig {
    /// Checks that every field is in range.
    pub fn validate(self) -> Result<Self> {
        if self.buffer_bytes == 0 {
            return Err(LzjdError::input("Buffer size must not be 0."));
        }
        if !(self.set_load_factor > 0. && self.set_load_factor < 1.) {
            return Err(LzjdError::input(format!(
                "Load factor must be in (0,1), got {}.",
                self.set_load_factor
            )));
        }
        Ok(self)
    }
}

/// Configuration of the parallel batch engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of worker threads (must be more than 0).
    pub threads: usize,
    /// Number of striped task groups per worker (must be more than 0).
    pub groups_per_thread: usize,
    /// Buffered bytes beyond which a worker blocks on the output lock.
    pub flush_threshold: usize,
    /// Minimum similarity percentage of a reported pair.
    pub threshold: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            groups_per_thread: 500,
            flush_threshold: 10 << 20,
            threshold: 20,
        }
    }
}

impl BatchConfig {
    /// Checks that every field is in range.
    pub fn validate(self) -> Result<Self> {
        if self.threads == 0 {
            return Err(LzjdError::input("Number of threads must not be 0."));
        }
        if self.groups_per_thread == 0 {
            return Err(LzjdError::input(
                "Number of groups per thread must not be 0.",
            ));
        }
        Ok(self)
    }

    /// Gets the number of striped task groups for `num_tasks` tasks.
    pub(crate) fn num_groups(&self, num_tasks: usize) -> usize {
        (self.threads * self.groups_per_thread).min(num_tasks).max(1)
    }
}
