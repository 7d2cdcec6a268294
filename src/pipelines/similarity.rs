//! # Similarity Pipeline
//!
//! Orchestrates the cell-pair similarity computation:
//! 1. Stream position records chromosome by chromosome, in genomic order
//! 2. Maintain the set of active reads inside the sliding window
//! 3. Batch reads that aged out of the window and score each against all
//!    later active reads in parallel
//! 4. Drain per-worker staging buffers into the two accumulator matrices
//! 5. At each chromosome boundary, score the remaining reads, then clear
//!    (reads never cross chromosomes)
//! 6. Combine into the log-ratio matrix and normalize
//!
//! The main loop is single-threaded; parallelism is confined to the scoring
//! regions. Workers see an immutable snapshot of the active set and write
//! only their own staging buffer, so the region needs no locks. Bit-exact
//! reproducibility across thread counts is not guaranteed (summation order
//! varies), but a single-threaded run is the canonical reference and
//! multi-threaded results agree to summation-order rounding.

use rayon::prelude::*;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info};

use crate::config::Normalization;
use crate::data::matrix::SimMatrix;
use crate::data::pileup::{ActiveRead, PosData, ReadId};
use crate::error::{CellsimError, Result};
use crate::model::kernel::ProbKernel;
use crate::model::pairs::{PairScorer, PairUpdate};
use crate::utils::progress::Progress;
use crate::utils::threading::build_thread_pool;

/// Completed reads are scored once at least this many per worker thread
/// have accumulated.
const BATCH_SIZE: usize = 4;

/// Engine configuration, independent of any CLI concern
#[derive(Clone, Debug)]
pub struct SimilarityOptions {
    /// Estimated mutation rate (epsilon)
    pub mutation_rate: f64,
    /// Estimated heterozygous-site rate (h)
    pub het_rate: f64,
    /// Estimated sequencing error rate (theta)
    pub seq_error_rate: f64,
    /// Number of scoring worker threads; 1 gives the canonical result
    pub num_threads: usize,
    /// How the combined matrix is normalized
    pub normalization: Normalization,
    /// Keep the first of two overlapping paired-end observations even on
    /// disagreement (reproduces earlier pipeline versions)
    pub legacy_pair_overlap: bool,
}

impl SimilarityOptions {
    fn validate(&self) -> Result<()> {
        for (name, rate) in [
            ("mutation_rate", self.mutation_rate),
            ("het_rate", self.het_rate),
            ("seq_error_rate", self.seq_error_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) || !rate.is_finite() {
                return Err(CellsimError::config(format!(
                    "{name} must be a probability in [0, 1], got {rate}"
                )));
            }
        }
        if self.num_threads == 0 {
            return Err(CellsimError::config("num_threads must be at least 1"));
        }
        Ok(())
    }
}

/// Cell-pair similarity engine
pub struct SimilarityPipeline {
    opts: SimilarityOptions,
}

impl SimilarityPipeline {
    /// Validate the options and build the pipeline
    pub fn new(opts: SimilarityOptions) -> Result<Self> {
        opts.validate()?;
        Ok(Self { opts })
    }

    /// Compute the normalized similarity matrix.
    ///
    /// # Arguments
    /// * `pos_data` - one sorted stream of position records per chromosome
    /// * `num_cells` - number of compact cell indices the matrix addresses
    /// * `max_fragment_length` - upper bound on any read's span
    /// * `cell_index` - total map from raw cell_id to compact index `0..num_cells`
    ///
    /// The returned matrix is symmetric with a zero diagonal.
    pub fn run(
        &self,
        pos_data: &[Vec<PosData>],
        num_cells: usize,
        max_fragment_length: u32,
        cell_index: &[u32],
    ) -> Result<SimMatrix> {
        let total_positions: u64 = pos_data.iter().map(|c| c.len() as u64).sum();
        if total_positions == 0 {
            // zero position records is valid; every normalization of an
            // empty accumulation is the zero matrix
            return Ok(SimMatrix::zeros(num_cells));
        }

        let fragment_len = max_fragment_length.max(1);
        let legacy = self.opts.legacy_pair_overlap;

        let kernel = ProbKernel::new(
            self.opts.mutation_rate,
            self.opts.het_rate,
            self.opts.seq_error_rate,
            fragment_len,
        );
        let scorer = PairScorer::new(&kernel, cell_index, legacy);
        let pool = build_thread_pool(self.opts.num_threads)?;

        let mut mat_same = SimMatrix::zeros(num_cells);
        let mut mat_diff = SimMatrix::zeros(num_cells);

        info!(
            num_cells,
            total_positions, fragment_len, "computing similarity matrix"
        );
        let progress = Progress::new(total_positions);

        // read_id -> in-flight read, plus insertion order for stable
        // iteration inside the parallel scoring regions
        let mut active_reads: HashMap<ReadId, ActiveRead> = HashMap::new();
        let mut order: VecDeque<ReadId> = VecDeque::new();

        for chromosome in pos_data {
            // prefix of `order` whose reads aged out of the window
            let mut completed = 0usize;

            for pd in chromosome {
                while completed < order.len() {
                    let read = &active_reads[&order[completed]];
                    if read.start as u64 + fragment_len as u64 <= pd.position as u64 {
                        completed += 1;
                    } else {
                        break;
                    }
                }

                if completed >= BATCH_SIZE * self.opts.num_threads {
                    debug!(completed, active = order.len(), "flushing completed batch");
                    score_batch(
                        &pool,
                        &scorer,
                        &active_reads,
                        &order,
                        completed,
                        &mut mat_same,
                        &mut mat_diff,
                    );
                    for _ in 0..completed {
                        let id = order.pop_front().expect("completed is a prefix of order");
                        active_reads.remove(&id);
                    }
                    completed = 0;
                }

                for obs in &pd.observations {
                    match active_reads.entry(obs.read_id) {
                        Entry::Vacant(slot) => {
                            slot.insert(ActiveRead::open(obs.cell_id, pd.position, obs.base));
                            order.push_back(obs.read_id);
                        }
                        Entry::Occupied(mut slot) => {
                            slot.get_mut().observe(pd.position, obs.base, legacy);
                        }
                    }
                }

                progress.inc(1);
            }

            // Residual pass: score every read still in flight before the
            // chromosome boundary discards them.
            score_batch(
                &pool,
                &scorer,
                &active_reads,
                &order,
                order.len(),
                &mut mat_same,
                &mut mat_diff,
            );
            active_reads.clear();
            order.clear();
        }

        // log P(diff) - log P(same), entrywise
        let mut result = mat_diff;
        result.sub_assign(&mat_same);
        normalize(&mut result, self.opts.normalization);
        Ok(result)
    }
}

/// Score reads `0..limit` of `order` against all later reads, in parallel,
/// then drain every staging buffer into the accumulator matrices.
///
/// `fold` hands each rayon worker chunk its own staging buffer; the buffers
/// are applied serially here, so the matrices are only ever written by the
/// driver thread.
fn score_batch(
    pool: &rayon::ThreadPool,
    scorer: &PairScorer<'_>,
    active_reads: &HashMap<ReadId, ActiveRead>,
    order: &VecDeque<ReadId>,
    limit: usize,
    mat_same: &mut SimMatrix,
    mat_diff: &mut SimMatrix,
) {
    if limit == 0 {
        return;
    }

    let staged: Vec<Vec<PairUpdate>> = pool.install(|| {
        (0..limit)
            .into_par_iter()
            .fold(Vec::new, |mut buffer, i| {
                scorer.compare_with_later_reads(active_reads, order, i, &mut buffer);
                buffer
            })
            .collect()
    });

    for buffer in staged {
        for update in buffer {
            mat_same.add_pair(update.i as usize, update.j as usize, update.log_same);
            mat_diff.add_pair(update.i as usize, update.j as usize, update.log_diff);
        }
    }
}

/// Normalize the combined log-ratio matrix in place.
///
/// The diagonal of the returned matrix is always zero. An all-zero matrix
/// stays all-zero under every mode (`ScaleMax1` would otherwise divide by
/// zero on empty input).
pub fn normalize(mat: &mut SimMatrix, mode: Normalization) {
    match mode {
        Normalization::AddMin => {
            mat.scale(-1.0);
            let shift = mat.min().abs();
            mat.add_scalar(shift);
        }
        Normalization::Exponentiate => {
            mat.map_in_place(|x| 1.0 / (1.0 + x.exp()));
        }
        Normalization::ScaleMax1 => {
            mat.fill_diagonal(0.0);
            let max = mat.max();
            if max != 0.0 {
                mat.scale(1.0 / max);
            }
        }
    }
    mat.fill_diagonal(0.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_validation() {
        let mut opts = SimilarityOptions {
            mutation_rate: 0.1,
            het_rate: 0.05,
            seq_error_rate: 0.01,
            num_threads: 2,
            normalization: Normalization::AddMin,
            legacy_pair_overlap: false,
        };
        assert!(SimilarityPipeline::new(opts.clone()).is_ok());

        opts.seq_error_rate = 1.2;
        assert!(SimilarityPipeline::new(opts.clone()).is_err());

        opts.seq_error_rate = 0.01;
        opts.num_threads = 0;
        assert!(SimilarityPipeline::new(opts).is_err());
    }

    #[test]
    fn test_normalize_add_min() {
        let mut m = SimMatrix::zeros(2);
        m.add_pair(0, 1, -3.0);
        normalize(&mut m, Normalization::AddMin);

        // negated to 3.0, min is 0 on the diagonal, so no shift
        assert_eq!(m.get(0, 1), 3.0);
        assert_eq!(m.get(1, 0), 3.0);
        assert_eq!(m.get(0, 0), 0.0);
        assert!(m.iter().all(|x| x >= 0.0));
    }

    #[test]
    fn test_normalize_exponentiate() {
        let mut m = SimMatrix::zeros(2);
        m.add_pair(0, 1, 2.0);
        normalize(&mut m, Normalization::Exponentiate);

        assert!((m.get(0, 1) - 1.0 / (1.0 + 2.0f64.exp())).abs() < 1e-15);
        assert_eq!(m.get(0, 0), 0.0);
    }

    #[test]
    fn test_normalize_scale_max() {
        let mut m = SimMatrix::zeros(3);
        m.add_pair(0, 1, 2.0);
        m.add_pair(1, 2, 4.0);
        normalize(&mut m, Normalization::ScaleMax1);

        assert_eq!(m.get(1, 2), 1.0);
        assert_eq!(m.get(0, 1), 0.5);
        assert_eq!(m.get(0, 0), 0.0);
    }

    #[test]
    fn test_normalize_scale_max_zero_matrix() {
        let mut m = SimMatrix::zeros(3);
        normalize(&mut m, Normalization::ScaleMax1);
        assert!(m.iter().all(|x| x == 0.0));
    }
}
