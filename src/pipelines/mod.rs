//! # Pipelines Module (Orchestration)
//!
//! ## Role
//! High-level workflow coordination. Connects the pileup data model, the
//! probability kernel, and the parallel scoring regions.
//!
//! ## Design Philosophy
//! - The pipeline **owns** the execution flow: the active-read lifecycle,
//!   the batch/residual scoring regions, and the accumulator matrices.
//! - Parallelization (via rayon) is coordinated here; workers only ever see
//!   immutable snapshots and their own staging buffers.
//! - Progress reporting and logging happen here.

pub mod similarity;

pub use similarity::{normalize, SimilarityOptions, SimilarityPipeline};
