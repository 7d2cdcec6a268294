//! # Probability Kernel
//!
//! Closed-form log-probabilities of observing `x_s` matching and `x_d`
//! mismatching bases in the overlap of two reads, under the "same genotype"
//! and "different genotype" hypotheses. The sums explode combinatorially,
//! so results are memoized by `(x_s, x_d)`.
//!
//! The memo tables are shared across scoring workers. A slot holds the f64
//! bit pattern in an `AtomicU64` with `f64::MAX` as the unfilled sentinel;
//! results are published with `Release` and read with `Acquire`, so a reader
//! never observes a torn value. Two workers may race on the first fill of a
//! slot, but both compute the identical value, so either write wins.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::model::cache::ProbCache;

/// Square memo table of log-probabilities keyed by (x_s, x_d)
struct MemoTable {
    dim: usize,
    slots: Vec<AtomicU64>,
}

/// Unfilled-slot sentinel: no valid log-probability equals f64::MAX
const UNFILLED: u64 = f64::MAX.to_bits();

impl MemoTable {
    fn new(dim: usize) -> Self {
        let slots = (0..dim * dim).map(|_| AtomicU64::new(UNFILLED)).collect();
        Self { dim, slots }
    }

    #[inline]
    fn get(&self, x_s: usize, x_d: usize) -> Option<f64> {
        let bits = self.slots[x_s * self.dim + x_d].load(Ordering::Acquire);
        (bits != UNFILLED).then(|| f64::from_bits(bits))
    }

    #[inline]
    fn set(&self, x_s: usize, x_d: usize, value: f64) {
        self.slots[x_s * self.dim + x_d].store(value.to_bits(), Ordering::Release);
    }
}

/// Memoized evaluator of the two genotype-hypothesis log-probabilities
pub struct ProbKernel {
    cache: ProbCache,
    max_fragment_length: u32,
    log_probs_same: MemoTable,
    log_probs_diff: MemoTable,
}

impl ProbKernel {
    /// Build the kernel, its cache, and empty memo tables
    pub fn new(
        mutation_rate: f64,
        het_rate: f64,
        seq_error_rate: f64,
        max_fragment_length: u32,
    ) -> Self {
        // a read spanning the full window can contribute exactly
        // max_fragment_length comparisons, so the tables include that row
        let dim = max_fragment_length as usize + 1;
        Self {
            cache: ProbCache::new(mutation_rate, het_rate, seq_error_rate, max_fragment_length),
            max_fragment_length,
            log_probs_same: MemoTable::new(dim),
            log_probs_diff: MemoTable::new(dim),
        }
    }

    /// The inclusive cap on `x_s + x_d`
    pub fn max_fragment_length(&self) -> u32 {
        self.max_fragment_length
    }

    #[inline]
    fn check_domain(&self, x_s: u32, x_d: u32) {
        let l = self.max_fragment_length;
        assert!(
            x_s + x_d <= l,
            "match/mismatch counts (x_s={x_s}, x_d={x_d}) exceed the \
             max fragment length {l}; upstream read tracking violated its contract"
        );
    }

    /// Log-probability of (x_s, x_d) matches/mismatches given the two cells
    /// have the *same* genotype. Memoized; first call for a slot computes
    /// the full double sum.
    pub fn log_prob_same(&self, x_s: u32, x_d: u32) -> f64 {
        self.check_domain(x_s, x_d);
        let (xs, xd) = (x_s as usize, x_d as usize);
        if let Some(v) = self.log_probs_same.get(xs, xd) {
            return v;
        }

        let c = &self.cache;
        let mut p = 0.0;
        for k in 0..=xs {
            for l in 0..=xd {
                p += c.comb[xs][k]
                    * c.comb[xd][l]
                    * c.pow_one_minus_half_eps_h[k + l]
                    * 0.5
                    * (c.pow_p_same_same[k] * c.pow_p_same_diff[l]
                        + c.pow_p_diff_same[k] * c.pow_p_diff_diff[l])
                    * c.pow_h_half_eps[xs + xd - k - l]
                    * c.pow_p_same_same[xs - k]
                    * c.pow_p_same_diff[xd - l];
            }
        }
        p *= c.comb[xs + xd][xs];

        let v = p.ln();
        self.log_probs_same.set(xs, xd, v);
        v
    }

    /// Log-probability of (x_s, x_d) matches/mismatches given the two cells
    /// have *different* genotypes. Memoized; first call for a slot computes
    /// the full quadruple sum.
    pub fn log_prob_diff(&self, x_s: u32, x_d: u32) -> f64 {
        self.check_domain(x_s, x_d);
        let (xs, xd) = (x_s as usize, x_d as usize);
        if let Some(v) = self.log_probs_diff.get(xs, xd) {
            return v;
        }

        let c = &self.cache;
        let mut prob = 0.0;
        for k in 0..=xs {
            for l in 0..=xd {
                for p in 0..=(xs - k) {
                    for q in 0..=(xd - l) {
                        prob += c.comb[xs][k]
                            * c.comb[xd][l]
                            * c.comb[xs - k][p]
                            * c.comb[xd - l][q]
                            * c.pow_one_minus_eps_h[k + l]
                            * 0.5
                            * (c.pow_p_same_same[k] * c.pow_p_same_diff[l]
                                + c.pow_p_diff_same[k] * c.pow_p_diff_diff[l])
                            * c.pow_eps[xs + xd - k - l - p - q]
                            * c.pow_half[xs + xd - k - l - p - q]
                            * c.pow_pss_pds[xs - k - p]
                            * c.pow_psd_pdd[xd - l - q]
                            * c.pow_h[p + q]
                            * c.pow_p_same_same[p]
                            * c.pow_p_same_diff[q];
                    }
                }
            }
        }
        prob *= c.comb[xs + xd][xs];

        let v = prob.ln();
        self.log_probs_diff.set(xs, xd, v);
        v
    }
}
