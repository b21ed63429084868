//! MurmurHash3 (x86, 32-bit), in one-shot and byte-at-a-time forms.

const C1: u32 = 0xcc9e_2d51;
const C2: u32 = 0x1b87_3593;

#[inline(always)]
const fn mix_k1(k1: u32) -> u32 {
    k1.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2)
}

#[inline(always)]
const fn mix_h1(h1: u32, k1: u32) -> u32 {
    (h1 ^ mix_k1(k1))
        .rotate_left(13)
        .wrapping_mul(5)
        .wrapping_add(0xe654_6b64)
}

#[inline(always)]
const fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

#[inline(always)]
fn tail_k1(tail: &[u8]) -> u32 {
    tail.iter()
        .enumerate()
        .fold(0, |k1, (i, &b)| k1 | (b as u32) << (8 * i))
}

/// Computes the canonical MurmurHash3_x86_32 of `bytes`.
///
/// # Examples
///
/// ```
/// use lzjd::murmur::murmurhash3_x86_32;
///
/// assert_eq!(murmurhash3_x86_32(b"hello", 0), 0x248b_fa47);
/// ```
pub fn murmurhash3_x86_32(bytes: &[u8], seed: u32) -> u32 {
    let mut chunks = bytes.chunks_exact(4);
    let mut h1 = seed;
    for chunk in &mut chunks {
        h1 = mix_h1(h1, u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    let tail = chunks.remainder();
    if !tail.is_empty() {
        h1 ^= mix_k1(tail_k1(tail));
    }
    // The length is mixed in modulo 2^32.
    fmix32(h1 ^ bytes.len() as u32)
}

/// Byte-at-a-time MurmurHash3_x86_32 over a growing prefix.
///
/// After pushing the bytes `b[0..n]`, the value returned by the last
/// [`push_byte`](Self::push_byte) equals `murmurhash3_x86_32(&b[..n], seed)`.
/// Finalization does not disturb the running state.
#[derive(Clone, Debug)]
pub struct IncrementalMurmur {
    seed: u32,
    h1: u32,
    len: u32,
    tail: [u8; 4],
    tail_len: usize,
}

impl IncrementalMurmur {
    /// Creates a state with the given seed.
    pub const fn new(seed: u32) -> Self {
        Self {
            seed,
            h1: seed,
            len: 0,
            tail: [0; 4],
            tail_len: 0,
        }
    }

    /// Gets the seed.
    pub const fn seed(&self) -> u32 {
        self.seed
    }

    /// Gets the number of bytes pushed since the last reset, modulo 2^32.
    pub const fn len(&self) -> u32 {
        self.len
    }

    /// Checks if no byte has been pushed since the last reset.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends `b` to the prefix and returns the hash of the whole prefix.
    #[inline(always)]
    pub fn push_byte(&mut self, b: u8) -> u32 {
        self.tail[self.tail_len] = b;
        self.tail_len += 1;
        self.len = self.len.wrapping_add(1);
        if self.tail_len == 4 {
            self.h1 = mix_h1(self.h1, u32::from_le_bytes(self.tail));
            self.tail_len = 0;
        }
        self.finish()
    }

    /// Computes the hash of the current prefix as if the stream ended now.
    #[inline(always)]
    pub fn finish(&self) -> u32 {
        let mut h1 = self.h1;
        if self.tail_len != 0 {
            h1 ^= mix_k1(tail_k1(&self.tail[..self.tail_len]));
        }
        fmix32(h1 ^ self.len)
    }

    /// Restores the seeded initial state.
    #[inline(always)]
    pub fn reset(&mut self) {
        self.h1 = self.seed;
        self.len = 0;
        self.tail_len = 0;
    }
}
