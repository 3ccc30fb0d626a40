//! Ordered Live Set - "first live position at or after k" in O(log n).
//!
//! List children mount out of logical order: each child may be waiting on its
//! own reactive cell, may render nothing, or may be temporarily detached while
//! it moves. To insert a child we need the host node of the nearest *later*
//! sibling that is currently realized. Rescanning the list for every insert is
//! O(n) per child; this structure answers the question in O(log n).
//!
//! # Layout
//!
//! ```text
//! bits:   [w0: 0000_0100] [w1: 0000_0000] [w2: 1000_0001] ...   (32 bits per word)
//! tree:   Fenwick tree over words, counting words that are non-zero
//! ```
//!
//! The tree only changes when a word flips between zero and non-zero, so most
//! `set`/`unset` calls touch a single word.

const WORD_BITS: usize = 32;

#[inline]
fn lowbit(x: usize) -> usize {
    x & x.wrapping_neg()
}

/// Bit vector of liveness flags with a Fenwick index over its words.
///
/// Bit `i` is set iff list child `i` currently has a realized host node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedLiveSet {
    len: usize,
    words: Vec<u32>,
    /// 1-based Fenwick tree; `tree[i]` counts non-zero words in `(i - lowbit(i), i]`.
    tree: Vec<u32>,
}

impl OrderedLiveSet {
    /// Create a set of `len` positions, all dead.
    pub fn new(len: usize) -> Self {
        let words = len.div_ceil(WORD_BITS);
        Self {
            len,
            words: vec![0; words],
            tree: vec![0; words + 1],
        }
    }

    /// Build a set from initial liveness flags in O(n).
    ///
    /// Flags past `len` are ignored; missing flags count as dead.
    pub fn from_flags<I>(len: usize, flags: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let mut set = Self::new(len);
        for (i, live) in flags.into_iter().take(len).enumerate() {
            if live {
                set.words[i / WORD_BITS] |= 1 << (i % WORD_BITS);
            }
        }

        // Linear Fenwick build: each node pushes its total to its parent once.
        let size = set.words.len();
        for i in 1..=size {
            if set.words[i - 1] != 0 {
                set.tree[i] += 1;
            }
            let parent = i + lowbit(i);
            if parent <= size {
                set.tree[parent] += set.tree[i];
            }
        }
        set
    }

    /// Number of positions tracked.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the set tracks no positions at all.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check whether position `i` is live.
    pub fn contains(&self, i: usize) -> bool {
        i < self.len && self.words[i / WORD_BITS] & (1 << (i % WORD_BITS)) != 0
    }

    /// Mark position `i` live. Out-of-range positions are ignored.
    pub fn set(&mut self, i: usize) {
        if i >= self.len {
            return;
        }
        let word = i / WORD_BITS;
        let was_empty = self.words[word] == 0;
        self.words[word] |= 1 << (i % WORD_BITS);
        if was_empty {
            self.bump(word, true);
        }
    }

    /// Mark position `i` dead. Out-of-range positions are ignored.
    pub fn unset(&mut self, i: usize) {
        if i >= self.len {
            return;
        }
        let word = i / WORD_BITS;
        let mask = 1 << (i % WORD_BITS);
        if self.words[word] & mask == 0 {
            return;
        }
        self.words[word] &= !mask;
        if self.words[word] == 0 {
            self.bump(word, false);
        }
    }

    /// First live position `>= start`, or `None` if there is none.
    pub fn query(&self, start: usize) -> Option<usize> {
        if start >= self.len {
            return None;
        }

        // Fast path: the rest of start's own word.
        let word = start / WORD_BITS;
        let rest = self.words[word] & (u32::MAX << (start % WORD_BITS));
        if rest != 0 {
            return Some(word * WORD_BITS + rest.trailing_zeros() as usize);
        }

        // Non-zero words strictly before the next word, then the next one after them.
        let before = self.prefix(word + 1);
        let total = self.prefix(self.words.len());
        if before == total {
            return None;
        }
        let found = self.nth_nonzero_word(before + 1);
        Some(found * WORD_BITS + self.words[found].trailing_zeros() as usize)
    }

    /// First live position overall.
    pub fn first(&self) -> Option<usize> {
        self.query(0)
    }

    // -------------------------------------------------------------------------
    // Fenwick helpers
    // -------------------------------------------------------------------------

    fn bump(&mut self, word: usize, increment: bool) {
        let mut i = word + 1;
        while i < self.tree.len() {
            if increment {
                self.tree[i] += 1;
            } else {
                self.tree[i] -= 1;
            }
            i += lowbit(i);
        }
    }

    /// Count of non-zero words in `[0, words)`.
    fn prefix(&self, words: usize) -> u32 {
        let mut i = words;
        let mut sum = 0;
        while i > 0 {
            sum += self.tree[i];
            i -= lowbit(i);
        }
        sum
    }

    /// Index of the `k`-th (1-based) non-zero word. Caller guarantees it exists.
    fn nth_nonzero_word(&self, mut k: u32) -> usize {
        let size = self.words.len();
        let mut pos = 0;
        let mut step = if size == 0 { 0 } else { 1 << size.ilog2() };
        while step > 0 {
            let next = pos + step;
            if next <= size && self.tree[next] < k {
                pos = next;
                k -= self.tree[next];
            }
            step >>= 1;
        }
        pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set_has_no_live_positions() {
        let set = OrderedLiveSet::new(100);
        assert_eq!(set.query(0), None);
        assert_eq!(set.query(99), None);
        assert!(!set.contains(5));
    }

    #[test]
    fn test_zero_length_set() {
        let mut set = OrderedLiveSet::new(0);
        set.set(0);
        assert!(set.is_empty());
        assert_eq!(set.query(0), None);
    }

    #[test]
    fn test_query_within_word() {
        let mut set = OrderedLiveSet::new(10);
        set.set(3);
        set.set(7);

        assert_eq!(set.query(0), Some(3));
        assert_eq!(set.query(3), Some(3));
        assert_eq!(set.query(4), Some(7));
        assert_eq!(set.query(8), None);
    }

    #[test]
    fn test_query_across_words() {
        let mut set = OrderedLiveSet::new(1000);
        set.set(5);
        set.set(700);
        set.set(999);

        assert_eq!(set.query(6), Some(700), "should skip the empty words between");
        assert_eq!(set.query(701), Some(999));
        assert_eq!(set.query(0), Some(5));
    }

    #[test]
    fn test_unset_only_clears_target_bit() {
        let mut set = OrderedLiveSet::new(64);
        set.set(1);
        set.set(2);
        set.unset(1);

        assert!(!set.contains(1));
        assert!(set.contains(2), "neighbouring bit in the same word must survive");
        assert_eq!(set.query(0), Some(2));

        // Unsetting a dead bit is a no-op
        set.unset(1);
        assert_eq!(set.query(0), Some(2));
    }

    #[test]
    fn test_word_becoming_empty_updates_index() {
        let mut set = OrderedLiveSet::new(200);
        set.set(40);
        set.set(150);
        assert_eq!(set.query(0), Some(40));

        set.unset(40);
        assert_eq!(set.query(0), Some(150), "emptied word must leave the index");

        set.unset(150);
        assert_eq!(set.query(0), None);
    }

    #[test]
    fn test_from_flags_matches_incremental() {
        let flags: Vec<bool> = (0..300).map(|i| i % 37 == 0 || i == 299).collect();
        let built = OrderedLiveSet::from_flags(flags.len(), flags.iter().copied());

        let mut incremental = OrderedLiveSet::new(flags.len());
        for (i, live) in flags.iter().enumerate() {
            if *live {
                incremental.set(i);
            }
        }

        assert_eq!(built, incremental, "linear build must equal repeated set()");
        for start in 0..flags.len() {
            assert_eq!(built.query(start), incremental.query(start));
        }
    }

    #[test]
    fn test_from_flags_short_input() {
        let set = OrderedLiveSet::from_flags(50, [false, true]);
        assert_eq!(set.len(), 50);
        assert_eq!(set.query(0), Some(1));
        assert_eq!(set.query(2), None);
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let mut set = OrderedLiveSet::new(10);
        set.set(10);
        set.set(31);
        assert_eq!(set.query(0), None, "bits past len must never become live");
        assert_eq!(set.query(50), None);
    }
}
