//! # Threading Configuration
//!
//! Rayon thread-pool construction for the scoring regions.

use crate::error::{CellsimError, Result};

/// Create a configured thread pool.
pub fn build_thread_pool(n_threads: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .thread_name(|i| format!("cellsim-worker-{i}"))
        .build()
        .map_err(|e| CellsimError::config(format!("failed to create thread pool: {e}")))
}
