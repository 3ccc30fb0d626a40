//! Minimal Reorder - keyed list diff with the fewest physical moves.
//!
//! Given the old index of every identity that survives into the new sequence
//! (listed in new-sequence order), the entries that can stay where they are
//! form an increasing run of old indices. Keeping the *longest* such run in
//! place and relocating everything else gives the minimum number of moves.
//!
//! ```text
//! old:   [A, B, C, D]
//! new:   [B, D, A, C]
//! order: [1, 3, 0, 2]      (old index of each surviving identity, new order)
//! LIS:   [1, 3]            → keep B and D, move A and C
//! ```

/// Scratch buffers for the subsequence computation.
///
/// Owned by each list mount point and reused across updates. The buffers only
/// ever grow, so steady-state updates allocate nothing but the result.
#[derive(Debug, Default)]
pub struct LisScratch {
    tails: Vec<usize>,
    run_len: Vec<usize>,
}

impl LisScratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current buffer capacity (high-water mark of sequence lengths seen).
    pub fn capacity(&self) -> usize {
        self.run_len.capacity()
    }
}

/// Positions (into `seq`) of a longest strictly increasing subsequence.
///
/// Patience sorting with binary search, O(m log m). The sequence is scanned
/// right to left to learn, for every position, the longest increasing run that
/// starts there; a left-to-right greedy pass then picks the run that begins as
/// early as possible. Among equally long subsequences the result is therefore
/// the lexicographically smallest list of positions.
pub fn longest_increasing_subsequence(seq: &[usize], scratch: &mut LisScratch) -> Vec<usize> {
    let n = seq.len();
    if n == 0 {
        return Vec::new();
    }

    let LisScratch { tails, run_len } = scratch;
    tails.clear();
    run_len.clear();
    run_len.resize(n, 0);

    // Right to left: tails[k] holds the position whose value is the largest
    // possible start of an increasing run of length k + 1.
    for i in (0..n).rev() {
        let value = seq[i];
        let slot = tails.partition_point(|&t| seq[t] > value);
        run_len[i] = slot + 1;
        if slot == tails.len() {
            tails.push(i);
        } else {
            tails[slot] = i;
        }
    }

    let mut needed = tails.len();
    let mut picked = Vec::with_capacity(needed);
    let mut last: Option<usize> = None;
    for (i, &value) in seq.iter().enumerate() {
        if needed == 0 {
            break;
        }
        if run_len[i] == needed && last.is_none_or(|prev| value > prev) {
            picked.push(i);
            last = Some(value);
            needed -= 1;
        }
    }
    picked
}

/// Decide which old entries stay in place.
///
/// `order` lists old indices of surviving identities in new-sequence order;
/// `old_len` is the length of the previous sequence. The returned vector is
/// indexed by old index: `true` means the entry keeps its host nodes where
/// they are, `false` means it must move (or is gone).
pub fn keep_set(order: &[usize], old_len: usize, scratch: &mut LisScratch) -> Vec<bool> {
    let mut keep = vec![false; old_len];
    for position in longest_increasing_subsequence(order, scratch) {
        if let Some(slot) = keep.get_mut(order[position]) {
            *slot = true;
        }
    }
    keep
}
