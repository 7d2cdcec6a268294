//! # Cellsim Library
//!
//! Cell-pair genotype similarity for single-cell DNA variant calling.
//! Given pre-processed pileup data, produces the N x N symmetric matrix
//! whose entry (i, j) quantifies the evidence that cells i and j share the
//! same genotype, ready for a downstream spectral-clustering stage.
//!
//! ## Modules
//! - `config`: CLI argument parsing and validation
//! - `data`: Pileup records, active reads, and the similarity matrix
//! - `error`: Error types and result aliases
//! - `io`: Pileup reading and matrix writing
//! - `model`: Probability cache, memoized kernel, pair accumulator
//! - `pipelines`: The sliding-window similarity driver
//! - `utils`: Shared utilities (thread pool, progress)

pub mod config;
pub mod data;
pub mod error;
pub mod io;
pub mod model;
pub mod pipelines;
pub mod utils;

// Re-export commonly used types
pub use config::{Config, Normalization};
pub use data::{PosData, ReadId, ReadObs, SimMatrix};
pub use error::{CellsimError, Result};
pub use model::{ProbCache, ProbKernel};
pub use pipelines::{SimilarityOptions, SimilarityPipeline};
