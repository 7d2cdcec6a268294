//! # Application Entry Point
//!
//! The reference collaborator driver around the similarity engine: parses
//! the CLI, reads pileup files, builds the cell index map, runs the
//! pipeline, and writes the matrix.

use rayon::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cellsim::config::Config;
use cellsim::data::pileup::PosData;
use cellsim::error::{CellsimError, Result};
use cellsim::io::pileup::{find_pileup_files, read_pileup, Pileup};
use cellsim::io::write_matrix_csv;
use cellsim::pipelines::{SimilarityOptions, SimilarityPipeline};
use cellsim::utils::build_thread_pool;

fn main() {
    if let Err(err) = run() {
        eprintln!("cellsim: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = Config::parse_and_validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_level)
                .map_err(|e| CellsimError::config(format!("bad log level: {e}")))?,
        )
        .init();

    let files = find_pileup_files(&config.input)?;
    info!(files = files.len(), "reading pileup data");

    let pool = build_thread_pool(config.num_threads)?;
    let pileups: Vec<Pileup> = pool.install(|| {
        files
            .par_iter()
            .map(|path| read_pileup(path))
            .collect::<Result<Vec<_>>>()
    })?;

    let num_cells = pileups
        .iter()
        .flat_map(|p| p.cell_ids.iter().copied())
        .max()
        .map(|max_id| max_id as usize + 1)
        .unwrap_or(0);

    let max_fragment_length = config.max_fragment_length.unwrap_or_else(|| {
        pileups
            .iter()
            .map(|p| p.max_fragment_length)
            .max()
            .unwrap_or(0)
    });

    let pos_data: Vec<Vec<PosData>> = pileups.into_iter().flat_map(|p| p.streams).collect();

    // the full cell_id space maps onto itself
    let cell_index: Vec<u32> = (0..num_cells as u32).collect();

    let pipeline = SimilarityPipeline::new(SimilarityOptions {
        mutation_rate: config.mutation_rate,
        het_rate: config.hzygous_prob,
        seq_error_rate: config.seq_error_rate,
        num_threads: config.num_threads,
        normalization: config.normalization,
        legacy_pair_overlap: config.legacy_pair_overlap,
    })?;

    let matrix = pipeline.run(&pos_data, num_cells, max_fragment_length, &cell_index)?;

    std::fs::create_dir_all(&config.output_dir)?;
    let out_path = config.output_dir.join("similarity_matrix.csv");
    write_matrix_csv(&out_path, &matrix)?;

    info!("done");
    Ok(())
}
