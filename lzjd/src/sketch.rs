//! Min-hash sketches of LZ phrase hashes and their Jaccard similarity.
use std::ops::Deref;
use std::sync::Arc;

/// Sorted sample of the `k` smallest phrase hashes of one input.
///
/// A sketch is immutable once built and cheap to clone, so it can be shared
/// read-only among comparison tasks.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Sketch {
    hashes: Arc<[i32]>,
}

impl Default for Sketch {
    fn default() -> Self {
        Self {
            hashes: Vec::new().into(),
        }
    }
}

impl Sketch {
    /// Builds the sketch of the `k` smallest values in `hashes`.
    ///
    /// `hashes` must be free of duplicates, which holds for the output of
    /// [`LzHasher`](crate::lz::LzHasher). Its order is destroyed.
    pub fn from_hashes(hashes: &mut [i32], k: usize) -> Self {
        let n = k.min(hashes.len());
        if n == 0 {
            return Self::default();
        }
        if n < hashes.len() {
            hashes.select_nth_unstable(n - 1);
        }
        let selected = &mut hashes[..n];
        selected.sort_unstable();
        debug_assert!(selected.windows(2).all(|w| w[0] < w[1]));
        Self {
            hashes: Arc::from(&*selected),
        }
    }

    /// Builds a sketch from arbitrary values, sorting and deduplicating them.
    pub fn from_unsorted(mut hashes: Vec<i32>) -> Self {
        hashes.sort_unstable();
        hashes.dedup();
        Self {
            hashes: hashes.into(),
        }
    }

    /// Gets the hashes in ascending order.
    pub fn as_slice(&self) -> &[i32] {
        &self.hashes
    }

    /// Computes the Jaccard similarity to `other`.
    pub fn similarity(&self, other: &Self) -> f64 {
        similarity(self, other)
    }

    /// Computes the LZJD distance to `other`.
    pub fn distance(&self, other: &Self) -> f64 {
        distance(self, other)
    }
}

impl Deref for Sketch {
    type Target = [i32];

    fn deref(&self) -> &Self::Target {
        &self.hashes
    }
}

/// Computes `|A ∩ B| / |A ∪ B|` of two sketches by merging their sorted hashes.
/// Two empty sketches have similarity 0.
///
/// # Examples
///
/// ```
/// use lzjd::sketch::{similarity, Sketch};
///
/// let a = Sketch::from_unsorted(vec![1, 2, 3, 4]);
/// let b = Sketch::from_unsorted(vec![3, 4, 5, 6]);
/// assert_eq!(similarity(&a, &b), 2. / 6.);
/// ```
pub fn similarity(a: &Sketch, b: &Sketch) -> f64 {
    let (xs, ys) = (a.as_slice(), b.as_slice());
    let (mut i, mut j) = (0, 0);
    let mut same = 0;
    while i < xs.len() && j < ys.len() {
        let (x, y) = (xs[i], ys[j]);
        if x == y {
            same += 1;
            i += 1;
            j += 1;
        } else if x < y {
            i += 1;
        } else {
            j += 1;
        }
    }
    let union = xs.len() + ys.len() - same;
    if union == 0 {
        return 0.;
    }
    same as f64 / union as f64
}

/// Computes the LZJD distance, `1 - similarity(a, b)`.
pub fn distance(a: &Sketch, b: &Sketch) -> f64 {
    (1. - similarity(a, b)).clamp(0., 1.)
}

/// Rounds a similarity to the percentage printed in comparison results.
pub fn to_percent(similarity: f64) -> u32 {
    (100. * similarity).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_from_hashes() {
        let mut hashes = vec![9, -4, 7, 0, 3, -10, 5];
        let sketch = Sketch::from_hashes(&mut hashes, 4);
        assert_eq!(sketch.as_slice(), &[-10, -4, 0, 3]);
    }

    #[test]
    fn test_from_hashes_short_input() {
        let mut hashes = vec![9, -4, 7];
        let sketch = Sketch::from_hashes(&mut hashes, 1024);
        assert_eq!(sketch.as_slice(), &[-4, 7, 9]);
    }

    #[test]
    fn test_zero_k() {
        let mut hashes = vec![9, -4, 7];
        let sketch = Sketch::from_hashes(&mut hashes, 0);
        assert!(sketch.is_empty());
        assert_eq!(similarity(&sketch, &sketch), 0.);
    }

    #[test]
    fn test_empty() {
        let empty = Sketch::default();
        let other = Sketch::from_unsorted(vec![1, 2]);
        assert_eq!(similarity(&empty, &empty), 0.);
        assert_eq!(distance(&empty, &empty), 1.);
        assert_eq!(similarity(&empty, &other), 0.);
        assert_eq!(similarity(&other, &empty), 0.);
    }

    #[test]
    fn test_known_similarity() {
        let a = Sketch::from_unsorted(vec![1, 3, 5, 7, 9]);
        let b = Sketch::from_unsorted(vec![3, 4, 5, 6, 7]);
        assert_eq!(similarity(&a, &b), 3. / 7.);
        assert_eq!(a.distance(&b), 1. - 3. / 7.);
    }

    #[test]
    fn test_to_percent() {
        assert_eq!(to_percent(1.), 100);
        assert_eq!(to_percent(0.), 0);
        assert_eq!(to_percent(0.2451), 25);
        assert_eq!(to_percent(0.2449), 24);
        assert_eq!(to_percent(2. / 3.), 67);
    }

    proptest! {
        #[test]
        fn prop_from_hashes_keeps_smallest(
            hashes in prop::collection::hash_set(any::<i32>(), 0..3000),
            k in 0usize..2048,
        ) {
            let mut hashes: Vec<i32> = hashes.into_iter().collect();
            let mut expected = hashes.clone();
            expected.sort_unstable();
            expected.truncate(k);
            let sketch = Sketch::from_hashes(&mut hashes, k);
            prop_assert_eq!(sketch.as_slice(), &expected[..]);
        }

        #[test]
        fn prop_similarity_properties(
            a in prop::collection::vec(-50i32..50, 0..60),
            b in prop::collection::vec(-50i32..50, 0..60),
        ) {
            let a = Sketch::from_unsorted(a);
            let b = Sketch::from_unsorted(b);
            let s = similarity(&a, &b);
            prop_assert_eq!(s, similarity(&b, &a));
            prop_assert!((0. ..=1.).contains(&s));
            prop_assert!((0. ..=1.).contains(&distance(&a, &b)));
            if !a.is_empty() {
                prop_assert_eq!(similarity(&a, &a), 1.);
            }
        }
    }
}
