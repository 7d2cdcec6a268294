//! # Pair Accumulator
//!
//! Scores one completed read against all later active reads. For each pair
//! from distinct cells with overlapping extents, the matching/mismatching
//! base counts (x_s, x_d) are translated into the two genotype-hypothesis
//! log-probabilities and staged as updates.
//!
//! Workers never touch the accumulator matrices: every update lands in the
//! caller-supplied staging buffer, and the driver drains the buffers between
//! parallel regions. That keeps the scoring region lock-free.

use std::collections::HashMap;
use std::collections::VecDeque;

use crate::data::pileup::{ActiveRead, ReadId};
use crate::model::kernel::ProbKernel;

/// One staged contribution to the accumulator matrices.
///
/// `(i, j)` are compact cell indices; the driver applies `log_same` to the
/// same-genotype matrix and `log_diff` to the different-genotype matrix,
/// mirroring each into `(j, i)`.
#[derive(Clone, Copy, Debug)]
pub struct PairUpdate {
    pub i: u32,
    pub j: u32,
    pub log_same: f64,
    pub log_diff: f64,
}

/// Count matching and mismatching bases over the common positions of two
/// reads. Both position sequences are strictly increasing, so a single
/// merge scan suffices.
pub fn overlap_counts(r1: &ActiveRead, r2: &ActiveRead) -> (u32, u32) {
    let mut x_s = 0;
    let mut x_d = 0;
    let (mut i1, mut i2) = (0, 0);
    while i1 < r1.positions.len() && i2 < r2.positions.len() {
        if r1.positions[i1] == r2.positions[i2] {
            if r1.bases[i1] == r2.bases[i2] {
                x_s += 1;
            } else {
                x_d += 1;
            }
            i1 += 1;
            i2 += 1;
        } else if r1.positions[i1] < r2.positions[i2] {
            i1 += 1;
        } else {
            i2 += 1;
        }
    }
    (x_s, x_d)
}

/// Scores read pairs against the probability kernel
pub struct PairScorer<'a> {
    kernel: &'a ProbKernel,
    /// Maps a raw cell_id to its compact index in the output matrix
    cell_index: &'a [u32],
    /// Legacy keep-first coalescing: insertion order then guarantees reads
    /// are sorted by first position (the default erase rule can remove a
    /// read's only recorded position and break that ordering)
    legacy_pair_overlap: bool,
}

impl<'a> PairScorer<'a> {
    pub fn new(kernel: &'a ProbKernel, cell_index: &'a [u32], legacy_pair_overlap: bool) -> Self {
        Self {
            kernel,
            cell_index,
            legacy_pair_overlap,
        }
    }

    #[inline]
    fn cell_index_of(&self, cell_id: u16) -> u32 {
        self.cell_index[cell_id as usize]
    }

    /// Compare the read at `start_idx` with every subsequent read in
    /// `order`, staging one update per scorable pair into `out`.
    ///
    /// All reads in `order` overlap the current window, so any pair from
    /// distinct cells with intersecting position ranges is a candidate.
    pub fn compare_with_later_reads(
        &self,
        active_reads: &HashMap<ReadId, ActiveRead>,
        order: &VecDeque<ReadId>,
        start_idx: usize,
        out: &mut Vec<PairUpdate>,
    ) {
        let read1 = &active_reads[&order[start_idx]];
        if read1.is_empty() {
            return;
        }

        for idx in (start_idx + 1)..order.len() {
            let read2 = &active_reads[&order[idx]];
            if read2.is_empty() {
                continue;
            }

            let index1 = self.cell_index_of(read1.cell_id);
            let index2 = self.cell_index_of(read2.cell_id);

            debug_assert!(
                !self.legacy_pair_overlap || read1.first_pos() <= read2.first_pos(),
                "active reads out of first-position order"
            );

            if index1 == index2 || read1.last_pos() < read2.first_pos() {
                continue; // same cell, or the extents do not intersect
            }

            let (mut x_s, mut x_d) = overlap_counts(read1, read2);
            if x_s == 0 && x_d == 0 {
                continue; // no common positions survived
            }

            // a read ingests observations until its batch is flushed, so it
            // can outgrow the window between aging and flush; cap the counts
            // to the kernel domain
            let cap = self.kernel.max_fragment_length();
            x_s = x_s.min(cap);
            x_d = x_d.min(cap - x_s);

            out.push(PairUpdate {
                i: index1,
                j: index2,
                log_same: self.kernel.log_prob_same(x_s, x_d),
                log_diff: self.kernel.log_prob_diff(x_s, x_d),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(cell_id: u16, entries: &[(u32, u8)]) -> ActiveRead {
        let mut it = entries.iter();
        let &(pos, base) = it.next().expect("at least one observation");
        let mut r = ActiveRead::open(cell_id, pos, base);
        for &(pos, base) in it {
            r.observe(pos, base, false);
        }
        r
    }

    #[test]
    fn test_overlap_counts_merge_scan() {
        let r1 = read(0, &[(10, 0), (12, 1), (15, 2), (20, 3)]);
        let r2 = read(1, &[(12, 1), (14, 0), (15, 3), (20, 3)]);

        // common positions 12 (match), 15 (mismatch), 20 (match)
        assert_eq!(overlap_counts(&r1, &r2), (2, 1));
    }

    #[test]
    fn test_overlap_counts_disjoint() {
        let r1 = read(0, &[(10, 0), (11, 1)]);
        let r2 = read(1, &[(20, 0), (21, 1)]);
        assert_eq!(overlap_counts(&r1, &r2), (0, 0));
    }

    fn scorer_fixture<'a>(
        kernel: &'a ProbKernel,
        cell_index: &'a [u32],
        reads: Vec<ActiveRead>,
    ) -> (HashMap<ReadId, ActiveRead>, VecDeque<ReadId>, PairScorer<'a>) {
        let mut active = HashMap::new();
        let mut order = VecDeque::new();
        for (i, r) in reads.into_iter().enumerate() {
            let id = ReadId::new(i as u32);
            active.insert(id, r);
            order.push_back(id);
        }
        (active, order, PairScorer::new(kernel, cell_index, false))
    }

    #[test]
    fn test_same_cell_pairs_skipped() {
        let kernel = ProbKernel::new(0.1, 0.05, 0.01, 16);
        let cell_index = [0u32, 1];
        let reads = vec![read(0, &[(10, 0), (11, 1)]), read(0, &[(10, 0), (11, 2)])];
        let (active, order, scorer) = scorer_fixture(&kernel, &cell_index, reads);

        let mut out = Vec::new();
        scorer.compare_with_later_reads(&active, &order, 0, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_disjoint_pairs_skipped() {
        let kernel = ProbKernel::new(0.1, 0.05, 0.01, 16);
        let cell_index = [0u32, 1];
        let reads = vec![read(0, &[(10, 0), (11, 1)]), read(1, &[(20, 0), (21, 2)])];
        let (active, order, scorer) = scorer_fixture(&kernel, &cell_index, reads);

        let mut out = Vec::new();
        scorer.compare_with_later_reads(&active, &order, 0, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_overlapping_pair_staged() {
        let kernel = ProbKernel::new(0.1, 0.05, 0.01, 16);
        let cell_index = [0u32, 1];
        let reads = vec![
            read(0, &[(10, 0), (11, 1)]),
            read(1, &[(10, 0), (11, 3)]),
        ];
        let (active, order, scorer) = scorer_fixture(&kernel, &cell_index, reads);

        let mut out = Vec::new();
        scorer.compare_with_later_reads(&active, &order, 0, &mut out);

        assert_eq!(out.len(), 1);
        let u = out[0];
        assert_eq!((u.i, u.j), (0, 1));
        assert_eq!(u.log_same, kernel.log_prob_same(1, 1));
        assert_eq!(u.log_diff, kernel.log_prob_diff(1, 1));
    }

    #[test]
    fn test_counts_capped_to_kernel_domain() {
        // five common positions, window of four: the staged counts must
        // stay inside the kernel domain
        let kernel = ProbKernel::new(0.1, 0.05, 0.01, 4);
        let cell_index = [0u32, 1];
        let entries: Vec<(u32, u8)> = (0..5).map(|i| (10 + i, 0)).collect();
        let reads = vec![read(0, &entries), read(1, &entries)];
        let (active, order, scorer) = scorer_fixture(&kernel, &cell_index, reads);

        let mut out = Vec::new();
        scorer.compare_with_later_reads(&active, &order, 0, &mut out);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].log_same, kernel.log_prob_same(4, 0));
    }

    #[test]
    fn test_emptied_reads_skipped() {
        let kernel = ProbKernel::new(0.1, 0.05, 0.01, 16);
        let cell_index = [0u32, 1];
        let mut erased = ActiveRead::open(0, 10, 0);
        erased.observe(10, 3, false); // pair overlap disagreement empties it
        let reads = vec![erased, read(1, &[(10, 0), (11, 3)])];
        let (active, order, scorer) = scorer_fixture(&kernel, &cell_index, reads);

        let mut out = Vec::new();
        scorer.compare_with_later_reads(&active, &order, 0, &mut out);
        assert!(out.is_empty());
    }
}
