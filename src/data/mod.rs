//! # Data Module
//!
//! ## Role
//! In-memory representations of pileup data and the matrices the engine
//! accumulates into. This is the core "Model" layer.
//!
//! ## Design Philosophy
//! - **Structure of Arrays (SoA):** an active read stores its positions and
//!   bases as parallel vectors, matching the merge-scan access pattern.
//! - **Zero-cost newtypes:** `ReadId` prevents read/cell index mix-ups at
//!   compile time with no runtime overhead.
//!
//! ## Sub-modules
//! - `pileup`: Position records, base encoding, active reads
//! - `matrix`: Dense symmetric f64 matrix

pub mod matrix;
pub mod pileup;

pub use matrix::SimMatrix;
pub use pileup::{ActiveRead, PosData, ReadId, ReadObs};
