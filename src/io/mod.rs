//! # I/O Module
//!
//! File reading/writing for the collaborator surface: the textual pileup
//! input and the CSV matrix output. The similarity engine itself performs
//! no I/O.

pub mod matrix;
pub mod pileup;

pub use matrix::write_matrix_csv;
pub use pileup::{find_pileup_files, parse_pileup, read_pileup, Pileup};
