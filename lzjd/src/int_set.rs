//! Insertion-only set of `i32` keys for tracking novel LZ phrases.
//!
//! The table is open-addressed with double hashing (Knuth, TAOCP Vol. 3, Algorithm D).
//! Its capacity is always the larger member `p` of a twin-prime pair `(p - 2, p)`,
//! so the secondary step `1 + h mod (p - 2)` lies in `[1, p - 2]` and is coprime to `p`,
//! which makes every probe sequence visit the whole table.

const DEFAULT_CAPACITY: usize = 8;
const DEFAULT_LOAD_FACTOR: f32 = 0.75;

/// Twin primes `p` (with `p - 2` also prime), the smallest one above each power of two.
const TWIN_PRIMES: [usize; 30] = [
    5,
    13,
    19,
    43,
    73,
    139,
    271,
    523,
    1_033,
    2_083,
    4_129,
    8_221,
    16_453,
    32_803,
    65_539,
    131_113,
    262_153,
    524_353,
    1_048_891,
    2_097_259,
    4_194_583,
    8_388_619,
    16_777_291,
    33_554_503,
    67_109_323,
    134_217_781,
    268_435_579,
    536_871_019,
    1_073_741_833,
    2_147_483_869,
];

/// Gets the smallest tabled twin prime that is not less than `size`.
///
/// # Panics
///
/// Panics if `size` exceeds the largest tabled twin prime.
fn next_twin_prime(size: usize) -> usize {
    let pos = TWIN_PRIMES.partition_point(|&p| p < size);
    assert!(
        pos < TWIN_PRIMES.len(),
        "DictionarySet capacity overflow: {size} slots requested"
    );
    TWIN_PRIMES[pos]
}

/// Set of `i32` keys that supports insertion and membership but no removal.
#[derive(Clone, Debug)]
pub struct DictionarySet {
    keys: Vec<i32>,
    occupied: Vec<bool>,
    used: usize,
    load_factor: f32,
}

impl Default for DictionarySet {
    fn default() -> Self {
        Self::new()
    }
}

impl DictionarySet {
    /// Creates an empty set with the default capacity and load factor 0.75.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR)
    }

    /// Creates an empty set pre-allocated to store `capacity` keys
    /// while keeping the ratio of used to total slots below `load_factor`.
    ///
    /// # Panics
    ///
    /// Panics if `load_factor` is not in `(0, 1)`.
    pub fn with_capacity(capacity: usize, load_factor: f32) -> Self {
        assert!(load_factor > 0. && load_factor < 1.);
        let wanted = (capacity as f64 / load_factor as f64).max(4.) as usize;
        let size = next_twin_prime(wanted);
        Self {
            keys: vec![0; size],
            occupied: vec![false; size],
            used: 0,
            load_factor,
        }
    }

    /// Inserts `key`, returning `true` if it was not present before.
    #[inline]
    pub fn add(&mut self, key: i32) -> bool {
        let i = self.index_of(key);
        if self.occupied[i] {
            return false;
        }
        self.occupied[i] = true;
        self.keys[i] = key;
        self.used += 1;
        self.enlarge_if_needed();
        true
    }

    /// Checks if `key` is in the set.
    #[inline]
    pub fn contains(&self, key: i32) -> bool {
        self.occupied[self.index_of(key)]
    }

    /// Removes every key, keeping the allocated table.
    pub fn clear(&mut self) {
        self.used = 0;
        self.occupied.iter_mut().for_each(|o| *o = false);
    }

    /// Gets the number of keys.
    pub const fn len(&self) -> usize {
        self.used
    }

    /// Checks if the set is empty.
    pub const fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Gets the number of slots in the table.
    pub fn capacity(&self) -> usize {
        self.keys.len()
    }

    /// Iterates over the keys in table order.
    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.keys
            .iter()
            .zip(self.occupied.iter())
            .filter_map(|(&k, &o)| o.then(|| k))
    }

    /// Gets the slot that holds `key`, or the free slot where it would be inserted.
    #[inline(always)]
    fn index_of(&self, key: i32) -> usize {
        let cap = self.keys.len();
        let hash = (key & 0x7fff_ffff) as usize;
        let mut i = hash % cap;
        if !self.occupied[i] || self.keys[i] == key {
            return i;
        }
        let c = 1 + hash % (cap - 2);
        loop {
            i = if i >= c { i - c } else { i + cap - c };
            if !self.occupied[i] || self.keys[i] == key {
                return i;
            }
        }
    }

    fn enlarge_if_needed(&mut self) {
        if (self.used as f64) < self.keys.len() as f64 * self.load_factor as f64 {
            return;
        }
        // Twin primes are tabled near powers of two, so this ends up doubling.
        let new_size = next_twin_prime(self.keys.len() * 3 / 2);
        let old_keys = std::mem::replace(&mut self.keys, vec![0; new_size]);
        let old_occupied = std::mem::replace(&mut self.occupied, vec![false; new_size]);
        for (key, _) in old_keys
            .into_iter()
            .zip(old_occupied)
            .filter(|&(_, occupied)| occupied)
        {
            let i = self.index_of(key);
            debug_assert!(!self.occupied[i]);
            self.occupied[i] = true;
            self.keys[i] = key;
        }
    }
}
