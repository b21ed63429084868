//! Streaming Lempel-Ziv dictionary hasher.
//!
//! Bytes extend the current phrase one at a time. The running Murmur3 hash of the phrase
//! is looked up in the dictionary, and the first time a hash is seen it is emitted and
//! the phrase restarts empty. A trailing phrase that was already seen is dropped.
use std::io::{self, ErrorKind, Read};

use crate::config::HasherConfig;
use crate::errors::Result;
use crate::int_set::DictionarySet;
use crate::murmur::IncrementalMurmur;

const INITIAL_DICTIONARY_CAPACITY: usize = 1024;

/// Per-worker scratch that turns byte streams into LZ phrase hashes.
///
/// The dictionary and the read buffer are kept between streams, so a worker
/// reusing one instance stops allocating once it has seen its largest input.
pub struct LzHasher {
    dictionary: DictionarySet,
    murmur: IncrementalMurmur,
    buffer: Vec<u8>,
}

impl LzHasher {
    /// Creates an instance from the configuration.
    ///
    /// # Errors
    ///
    /// [`LzjdError`](crate::errors::LzjdError) will be returned when `config` is out of range.
    pub fn new(config: &HasherConfig) -> Result<Self> {
        Ok(Self::from_valid_config(&(*config).validate()?))
    }

    pub(crate) fn from_valid_config(config: &HasherConfig) -> Self {
        Self {
            dictionary: DictionarySet::with_capacity(
                INITIAL_DICTIONARY_CAPACITY,
                config.set_load_factor,
            ),
            murmur: IncrementalMurmur::new(config.seed),
            buffer: vec![0; config.buffer_bytes],
        }
    }

    /// Appends the hash of every novel phrase of `bytes` to `hashes`.
    pub fn hash_bytes(&mut self, bytes: &[u8], hashes: &mut Vec<i32>) {
        self.start();
        feed(&mut self.dictionary, &mut self.murmur, bytes, hashes);
    }

    /// Appends the hash of every novel phrase read from `rdr` to `hashes`,
    /// reading through the fixed-size internal buffer.
    pub fn hash_reader<R>(&mut self, mut rdr: R, hashes: &mut Vec<i32>) -> io::Result<()>
    where
        R: Read,
    {
        self.start();
        loop {
            let len = match rdr.read(&mut self.buffer) {
                Ok(0) => break,
                Ok(len) => len,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            feed(
                &mut self.dictionary,
                &mut self.murmur,
                &self.buffer[..len],
                hashes,
            );
        }
        Ok(())
    }

    /// Gets the number of phrases in the dictionary of the last stream.
    pub const fn num_phrases(&self) -> usize {
        self.dictionary.len()
    }

    fn start(&mut self) {
        self.dictionary.clear();
        self.murmur.reset();
    }
}

#[inline(always)]
fn feed(
    dictionary: &mut DictionarySet,
    murmur: &mut IncrementalMurmur,
    bytes: &[u8],
    hashes: &mut Vec<i32>,
) {
    for &b in bytes {
        let h = murmur.push_byte(b) as i32;
        if dictionary.add(h) {
            hashes.push(h);
            murmur.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use crate::murmur::murmurhash3_x86_32;

    fn hash_of(bytes: &[u8]) -> i32 {
        murmurhash3_x86_32(bytes, 0) as i32
    }

    fn phrases(bytes: &[u8]) -> Vec<i32> {
        let mut hasher = LzHasher::new(&HasherConfig::default()).unwrap();
        let mut hashes = vec![];
        hasher.hash_bytes(bytes, &mut hashes);
        hashes
    }

    #[test]
    fn test_empty() {
        assert!(phrases(b"").is_empty());
    }

    #[test]
    fn test_single_byte() {
        assert_eq!(phrases(b"x"), vec![hash_of(b"x")]);
    }

    #[test]
    fn test_distinct_bytes() {
        assert_eq!(
            phrases(b"abc"),
            vec![hash_of(b"a"), hash_of(b"b"), hash_of(b"c")]
        );
    }

    #[test]
    fn test_repeated_byte() {
        // a | aa | a (dropped, already seen)
        assert_eq!(phrases(b"aaaa"), vec![hash_of(b"a"), hash_of(b"aa")]);
    }

    #[test]
    fn test_lz_parse() {
        // a | b | ab | aba | b (dropped)
        assert_eq!(
            phrases(b"abababab"),
            vec![
                hash_of(b"a"),
                hash_of(b"b"),
                hash_of(b"ab"),
                hash_of(b"aba"),
            ]
        );
    }

    #[test]
    fn test_known_phrase_values() {
        assert_eq!(phrases(b"abc"), vec![1009084850, -1780580861, -516762017]);
    }

    #[test]
    fn test_scratch_reuse() {
        let mut hasher = LzHasher::new(&HasherConfig::default()).unwrap();
        let mut first = vec![];
        hasher.hash_bytes(b"the quick brown fox", &mut first);
        let mut other = vec![];
        hasher.hash_bytes(b"jumps over the lazy dog", &mut other);
        let mut again = vec![];
        hasher.hash_bytes(b"the quick brown fox", &mut again);
        assert_eq!(first, again);
        assert_eq!(hasher.num_phrases(), again.len());
    }

    #[test]
    fn test_buffer_boundaries() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i * i % 251) as u8).collect();
        let expected = phrases(&data);
        for buffer_bytes in [1, 3, 4, 7, 4096, 10_000, 10_001] {
            let config = HasherConfig {
                buffer_bytes,
                ..HasherConfig::default()
            };
            let mut hasher = LzHasher::new(&config).unwrap();
            for len in [buffer_bytes * 2, buffer_bytes * 2 + 1] {
                let len = len.min(data.len());
                let mut hashes = vec![];
                hasher
                    .hash_reader(Cursor::new(&data[..len]), &mut hashes)
                    .unwrap();
                let mut direct = vec![];
                hasher.hash_bytes(&data[..len], &mut direct);
                assert_eq!(hashes, direct, "buffer_bytes={buffer_bytes}, len={len}");
            }
            let mut hashes = vec![];
            hasher.hash_reader(Cursor::new(&data), &mut hashes).unwrap();
            assert_eq!(hashes, expected, "buffer_bytes={buffer_bytes}");
        }
    }

    #[test]
    fn test_invalid_config() {
        let config = HasherConfig::default();
        assert!(LzHasher::new(&HasherConfig {
            buffer_bytes: 0,
            ..config
        })
        .is_err());
        assert!(LzHasher::new(&HasherConfig {
            set_load_factor: 1.,
            ..config
        })
        .is_err());
        assert!(LzHasher::new(&HasherConfig {
            set_load_factor: -0.5,
            ..config
        })
        .is_err());
    }

    #[test]
    fn test_emitted_hashes_are_distinct() {
        let data: Vec<u8> = (0..50_000u32).map(|i| (i % 7 + i % 13) as u8).collect();
        let mut hashes = phrases(&data);
        let len = hashes.len();
        hashes.sort_unstable();
        hashes.dedup();
        assert_eq!(hashes.len(), len);
    }
}
