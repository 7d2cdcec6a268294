//! # Model Module
//!
//! The statistical core: given two overlapping reads from different cells,
//! how strongly does their base agreement support a shared genotype?
//!
//! ## Components
//! - `cache`: Precomputed powers and binomial coefficients
//! - `kernel`: Memoized log-probabilities under the same/different hypotheses
//! - `pairs`: Overlap counting and staged per-pair updates

pub mod cache;
pub mod kernel;
pub mod pairs;

pub use cache::ProbCache;
pub use kernel::ProbKernel;
pub use pairs::{overlap_counts, PairScorer, PairUpdate};
