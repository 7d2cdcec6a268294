//! # Configuration Logic
//!
//! CLI argument parsing and validation using clap derive.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::error::{CellsimError, Result};

/// How the combined log-ratio matrix is normalized before it is returned.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Normalization {
    /// Negate, then shift so the minimum entry is zero
    AddMin,
    /// Elementwise 1 / (1 + exp(x))
    Exponentiate,
    /// Scale so the maximum off-diagonal entry is one
    ScaleMax1,
}

/// cellsim: cell-pair genotype similarity for single-cell DNA variant calling
#[derive(Parser, Debug, Clone)]
#[command(name = "cellsim")]
#[command(version = "0.1.0")]
#[command(about = "Compute the cell-pair genotype similarity matrix from pre-processed pileups", long_about = None)]
pub struct Config {
    /// Input pileup file, or a directory containing .pileup files (one per chromosome)
    #[arg(long, short = 'i', value_name = "PATH")]
    pub input: PathBuf,

    /// Directory where the similarity matrix will be written
    #[arg(long, short = 'o', value_name = "DIR", default_value = "./")]
    pub output_dir: PathBuf,

    /// Sequencing error rate, denoted by theta
    #[arg(long, default_value = "0.001")]
    pub seq_error_rate: f64,

    /// Epsilon, estimated frequency of mutated loci in the pre-processed data set
    #[arg(long, default_value = "0")]
    pub mutation_rate: f64,

    /// Probability that a locus is heterozygous but survived the pre-filtering
    #[arg(long, default_value = "0")]
    pub hzygous_prob: f64,

    /// Number of worker threads
    #[arg(long, default_value = "8")]
    pub num_threads: usize,

    /// How to normalize the similarity matrix
    #[arg(long, value_enum, default_value = "add-min")]
    pub normalization: Normalization,

    /// Keep the first observation of an overlapping read pair even when the
    /// bases disagree. Reproduces the numeric output of earlier pipeline
    /// versions; the default erases the ambiguous base instead.
    #[arg(long, default_value = "false")]
    pub legacy_pair_overlap: bool,

    /// Upper bound on any read's span in bases. Inferred from the input when
    /// not given.
    #[arg(long, value_name = "LEN")]
    pub max_fragment_length: Option<u32>,

    /// The log verbosity: trace, debug, info, warn, error
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Parse command line arguments and validate
    pub fn parse_and_validate() -> Result<Self> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !self.input.exists() {
            return Err(CellsimError::FileNotFound {
                path: self.input.clone(),
            });
        }

        for (name, rate) in [
            ("seq-error-rate", self.seq_error_rate),
            ("mutation-rate", self.mutation_rate),
            ("hzygous-prob", self.hzygous_prob),
        ] {
            if !(0.0..=1.0).contains(&rate) || !rate.is_finite() {
                return Err(CellsimError::config(format!(
                    "'{name}' must be a probability in [0, 1], got {rate}"
                )));
            }
        }

        if self.num_threads == 0 {
            return Err(CellsimError::config("'num-threads' must be at least 1"));
        }

        if let Some(len) = self.max_fragment_length {
            if len == 0 {
                return Err(CellsimError::config(
                    "'max-fragment-length' must be at least 1",
                ));
            }
        }

        Ok(())
    }
}
