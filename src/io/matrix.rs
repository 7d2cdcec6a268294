//! # Matrix Writer
//!
//! CSV output for the normalized similarity matrix. The engine itself never
//! persists anything; writing is a collaborator concern that lives here.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::data::matrix::SimMatrix;
use crate::error::Result;

/// Write the matrix as comma-separated rows
pub fn write_matrix_csv(path: &Path, matrix: &SimMatrix) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    let n = matrix.n();
    for i in 0..n {
        for j in 0..n {
            if j > 0 {
                write!(writer, ",")?;
            }
            write!(writer, "{}", matrix.get(i, j))?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    info!(path = %path.display(), n, "wrote similarity matrix");
    Ok(())
}
