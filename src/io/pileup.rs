//! # Pileup Reader
//!
//! Reads the pre-processed textual pileup produced by the upstream
//! filtering step. Each line describes one variant-informative position:
//!
//! ```text
//! chromosome  position  coverage  bases  cells  read_ids
//! 22          10719571  3         TAG    0,0,3  r1,r2,r3
//! ```
//!
//! `bases` is a string over ACGT (case-insensitive); `cells` and `read_ids`
//! are comma-separated lists parallel to it. Read identifiers are interned
//! to dense `u32`s. The coverage column is parsed but not cross-checked:
//! upstream tools disagree on whether it counts observations before or
//! after pair collapsing.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::data::pileup::{encode_base, PosData, ReadId, ReadObs};
use crate::error::{CellsimError, Result};

/// Parsed contents of one pileup file
#[derive(Debug, Default)]
pub struct Pileup {
    /// One position stream per chromosome, in file order; positions are
    /// strictly increasing within each stream
    pub streams: Vec<Vec<PosData>>,
    /// Every cell_id observed in the file
    pub cell_ids: HashSet<u16>,
    /// Maximum observed read span (last - first + 1), 0 if no reads
    pub max_fragment_length: u32,
}

/// Read and parse a pileup file
pub fn read_pileup(path: &Path) -> Result<Pileup> {
    let file = File::open(path).map_err(|_| CellsimError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    let pileup = parse_pileup(BufReader::new(file))?;
    info!(
        path = %path.display(),
        streams = pileup.streams.len(),
        positions = pileup.streams.iter().map(Vec::len).sum::<usize>(),
        cells = pileup.cell_ids.len(),
        "read pileup"
    );
    Ok(pileup)
}

/// Parse pileup lines from any buffered reader
pub fn parse_pileup<R: BufRead>(reader: R) -> Result<Pileup> {
    let mut pileup = Pileup::default();
    let mut current_chrom: Option<String> = None;
    let mut current_stream: Vec<PosData> = Vec::new();

    // read-id strings -> dense u32, and per-read extent for span inference
    let mut read_ids: HashMap<String, ReadId> = HashMap::new();
    let mut extents: HashMap<ReadId, (u32, u32)> = HashMap::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(CellsimError::parse(
                line_no,
                format!("expected 6 fields, found {}", fields.len()),
            ));
        }

        let chromosome = fields[0];
        let position: u32 = fields[1]
            .parse()
            .map_err(|_| CellsimError::parse(line_no, format!("bad position '{}'", fields[1])))?;
        let _coverage: u32 = fields[2]
            .parse()
            .map_err(|_| CellsimError::parse(line_no, format!("bad coverage '{}'", fields[2])))?;
        let bases = fields[3].as_bytes();
        let cells: Vec<&str> = fields[4].split(',').collect();
        let ids: Vec<&str> = fields[5].split(',').collect();

        if cells.len() != bases.len() || ids.len() != bases.len() {
            return Err(CellsimError::parse(
                line_no,
                format!(
                    "bases/cells/read_ids lengths disagree ({}/{}/{})",
                    bases.len(),
                    cells.len(),
                    ids.len()
                ),
            ));
        }

        if current_chrom.as_deref() != Some(chromosome) {
            if !current_stream.is_empty() {
                pileup.streams.push(std::mem::take(&mut current_stream));
            }
            current_chrom = Some(chromosome.to_string());
        } else if let Some(last) = current_stream.last() {
            if position <= last.position {
                return Err(CellsimError::parse(
                    line_no,
                    format!(
                        "positions must be strictly increasing ({} after {})",
                        position, last.position
                    ),
                ));
            }
        }

        let mut observations = Vec::with_capacity(bases.len());
        for i in 0..bases.len() {
            let base = encode_base(bases[i]).ok_or_else(|| {
                CellsimError::parse(line_no, format!("bad base '{}'", bases[i] as char))
            })?;
            let cell_id: u16 = cells[i]
                .parse()
                .map_err(|_| CellsimError::parse(line_no, format!("bad cell id '{}'", cells[i])))?;

            let next_id = ReadId::new(read_ids.len() as u32);
            let read_id = *read_ids.entry(ids[i].to_string()).or_insert(next_id);
            // a read id reused across chromosomes would otherwise record a
            // reversed extent
            let extent = extents.entry(read_id).or_insert((position, position));
            extent.0 = extent.0.min(position);
            extent.1 = extent.1.max(position);

            pileup.cell_ids.insert(cell_id);
            observations.push(ReadObs {
                read_id,
                cell_id,
                base,
            });
        }

        current_stream.push(PosData::new(position, observations));
    }

    if !current_stream.is_empty() {
        pileup.streams.push(current_stream);
    }

    pileup.max_fragment_length = extents
        .values()
        .map(|&(first, last)| last - first + 1)
        .max()
        .unwrap_or(0);

    Ok(pileup)
}

/// Collect the pileup files under `input`: the file itself, or every
/// `.pileup` in the directory, sorted by name for a stable chromosome order.
pub fn find_pileup_files(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        return Err(CellsimError::FileNotFound {
            path: input.to_path_buf(),
        });
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(input)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "pileup"))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(CellsimError::invalid_data(format!(
            "no .pileup files found in '{}'",
            input.display()
        )));
    }
    Ok(files)
}
