//! Digesting byte streams into LZJD sketches.
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use crate::cache::{FileId, SketchCache};
use crate::config::HasherConfig;
use crate::errors::{LzjdError, Result};
use crate::lz::LzHasher;
use crate::sketch::Sketch;

/// Reusable per-worker state for digesting, obtained from [`Hasher::scratch`].
pub struct Scratch {
    config: HasherConfig,
    lz: LzHasher,
    hashes: Vec<i32>,
}

impl Scratch {
    /// `config` must be validated.
    pub(crate) fn new(config: &HasherConfig) -> Self {
        Self {
            config: *config,
            lz: LzHasher::from_valid_config(config),
            hashes: vec![],
        }
    }

    /// Rebuilds the LZ state when this scratch came from a hasher with another configuration.
    fn prepare(&mut self, config: &HasherConfig) {
        if self.config != *config {
            *self = Self::new(config);
        }
        self.hashes.clear();
    }
}

/// Digester of inputs into sketches, optionally backed by a [`SketchCache`].
///
/// # Examples
///
/// ```
/// use lzjd::{Hasher, HasherConfig};
///
/// let hasher = Hasher::new(HasherConfig::default()).unwrap();
/// let mut scratch = hasher.scratch();
/// let a = hasher.digest_bytes(&mut scratch, b"bitsandpieces");
/// let b = hasher.digest_bytes(&mut scratch, b"bitsandpieces");
/// assert_eq!(a.similarity(&b), 1.);
/// ```
#[derive(Clone)]
pub struct Hasher {
    config: HasherConfig,
    cache: Option<Arc<SketchCache>>,
}

impl Hasher {
    /// Creates an instance.
    pub fn new(config: HasherConfig) -> Result<Self> {
        Ok(Self {
            config: config.validate()?,
            cache: None,
        })
    }

    /// Shares `cache` for [`digest_file_cached`](Self::digest_file_cached).
    pub fn with_cache(mut self, cache: Arc<SketchCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Gets the configuration.
    pub const fn config(&self) -> &HasherConfig {
        &self.config
    }

    /// Gets the cache, if any.
    pub fn cache(&self) -> Option<&Arc<SketchCache>> {
        self.cache.as_ref()
    }

    /// Creates scratch matching the configuration.
    pub fn scratch(&self) -> Scratch {
        Scratch::new(&self.config)
    }

    /// Digests a byte slice.
    pub fn digest_bytes(&self, scratch: &mut Scratch, bytes: &[u8]) -> Sketch {
        scratch.prepare(&self.config);
        scratch.lz.hash_bytes(bytes, &mut scratch.hashes);
        Sketch::from_hashes(&mut scratch.hashes, self.config.k)
    }

    /// Digests everything read from `rdr`.
    pub fn digest_reader<R>(&self, scratch: &mut Scratch, rdr: R) -> io::Result<Sketch>
    where
        R: Read,
    {
        scratch.prepare(&self.config);
        scratch.lz.hash_reader(rdr, &mut scratch.hashes)?;
        Ok(Sketch::from_hashes(&mut scratch.hashes, self.config.k))
    }

    /// Digests the file at `path`.
    pub fn digest_file<P>(&self, scratch: &mut Scratch, path: P) -> Result<Sketch>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| LzjdError::io(path, e))?;
        self.digest_reader(scratch, file)
            .map_err(|e| LzjdError::io(path, e))
    }

    /// Gets the sketch of `id` from the cache, digesting `path` on a miss.
    /// When two workers race on the same id, the first stored sketch is returned to both.
    /// Without a cache this is [`digest_file`](Self::digest_file).
    pub fn digest_file_cached<P>(
        &self,
        scratch: &mut Scratch,
        id: FileId,
        path: P,
    ) -> Result<Sketch>
    where
        P: AsRef<Path>,
    {
        let cache = match &self.cache {
            Some(cache) => cache,
            None => return self.digest_file(scratch, path),
        };
        if let Some(sketch) = cache.get(id) {
            return Ok(sketch);
        }
        let sketch = self.digest_file(scratch, path)?;
        Ok(cache.put_if_absent(id, sketch))
    }
}
