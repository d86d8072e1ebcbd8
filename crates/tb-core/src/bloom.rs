//! Bloom filter used as the negative pre-filter on the request path.
//!
//! Bits are only ever set, never cleared individually, since bits are shared
//! between values. A removed pattern leaves its bits behind until the whole
//! filter is cleared.

use crate::hash::{hash_key, Hash64};

/// Default size: 1 MiB of bits.
pub const DEFAULT_SIZE_BITS: usize = 8 * 1024 * 1024;

/// Default number of derived hash functions.
pub const DEFAULT_HASH_COUNT: u32 = 7;

/// Fixed-size bloom filter over `u64` words.
#[derive(Debug, Clone)]
pub struct BloomFilter {
    words: Vec<u64>,
    size_bits: usize,
    hash_count: u32,
}

impl BloomFilter {
    /// Create an empty filter. `size_bits` is rounded up to a multiple of 64.
    ///
    /// Both arguments are expected to be non-zero; `MatcherConfig::validate`
    /// enforces this before a matcher builds its filter.
    pub fn new(size_bits: usize, hash_count: u32) -> Self {
        let word_count = size_bits.max(1).div_ceil(64);
        Self {
            words: vec![0; word_count],
            size_bits: word_count * 64,
            hash_count: hash_count.max(1),
        }
    }

    /// Insert a string value.
    #[inline]
    pub fn insert(&mut self, value: &str) {
        self.insert_hash(hash_key(value));
    }

    /// Insert a value by its precomputed hash.
    pub fn insert_hash(&mut self, hash: Hash64) {
        for pos in hash.indices(self.hash_count, self.size_bits as u64) {
            self.words[pos >> 6] |= 1u64 << (pos & 63);
        }
    }

    /// Returns `false` only if `value` was definitely never inserted.
    #[inline]
    pub fn may_contain(&self, value: &str) -> bool {
        self.may_contain_hash(hash_key(value))
    }

    /// Hash-based variant of [`BloomFilter::may_contain`].
    #[inline]
    pub fn may_contain_hash(&self, hash: Hash64) -> bool {
        hash.indices(self.hash_count, self.size_bits as u64)
            .all(|pos| self.words[pos >> 6] & (1u64 << (pos & 63)) != 0)
    }

    /// Reset every bit to zero.
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Number of bits currently set (linear popcount).
    pub fn bits_set(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Fraction of bits set, in `[0, 1]`.
    pub fn fill_ratio(&self) -> f64 {
        self.bits_set() as f64 / self.size_bits as f64
    }

    /// Probability that a never-inserted value passes `may_contain`,
    /// estimated from the current fill: `fill^k`.
    pub fn estimated_false_positive_rate(&self) -> f64 {
        self.fill_ratio().powi(self.hash_count as i32)
    }

    /// Size of the bit array.
    pub fn size_bits(&self) -> usize {
        self.size_bits
    }

    /// Number of hash functions (k).
    pub fn hash_count(&self) -> u32 {
        self.hash_count
    }
}

impl Default for BloomFilter {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE_BITS, DEFAULT_HASH_COUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_values_are_always_found() {
        let mut bloom = BloomFilter::new(1 << 16, 7);
        let domains: Vec<String> = (0..2_000).map(|i| format!("tracker{i}.example.com")).collect();
        for d in &domains {
            bloom.insert(d);
        }
        for d in &domains {
            assert!(bloom.may_contain(d), "false negative for {d}");
        }
    }

    #[test]
    fn empty_filter_rejects_everything() {
        let bloom = BloomFilter::new(4096, 3);
        assert!(!bloom.may_contain("example.com"));
        assert_eq!(bloom.bits_set(), 0);
        assert_eq!(bloom.fill_ratio(), 0.0);
    }

    #[test]
    fn size_rounds_up_to_word() {
        let bloom = BloomFilter::new(100, 3);
        assert_eq!(bloom.size_bits(), 128);
    }

    #[test]
    fn insert_sets_at_most_k_bits() {
        let mut bloom = BloomFilter::new(1 << 20, 7);
        bloom.insert("doubleclick.net");
        let set = bloom.bits_set();
        assert!(set >= 1 && set <= 7);
    }

    #[test]
    fn false_positive_rate_stays_low_at_reference_sizing() {
        let mut bloom = BloomFilter::default();
        for i in 0..10_000 {
            bloom.insert(&format!("blocked{i}.net"));
        }
        let false_hits = (0..10_000)
            .filter(|i| bloom.may_contain(&format!("allowed{i}.org")))
            .count();
        assert!(false_hits < 10, "too many false positives: {false_hits}");
        assert!(bloom.estimated_false_positive_rate() < 1e-6);
    }

    #[test]
    fn clear_resets_fill() {
        let mut bloom = BloomFilter::new(1024, 4);
        bloom.insert("a.com");
        bloom.insert("b.com");
        assert!(bloom.fill_ratio() > 0.0);
        bloom.clear();
        assert_eq!(bloom.bits_set(), 0);
        assert!(!bloom.may_contain("a.com"));
    }

    #[test]
    fn hash_and_string_variants_agree() {
        let mut bloom = BloomFilter::new(4096, 5);
        bloom.insert_hash(hash_key("cdn.tracker.io"));
        assert!(bloom.may_contain("cdn.tracker.io"));
    }
}
