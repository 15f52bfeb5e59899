//! Merge `compile_commands.json` fragments from sub-projects
//!
//! Sub-projects that never produced a database leave a missing or empty
//! file behind; those are skipped so the build graph need not special-case
//! them.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::AppError;

fn read_fragment(path: &Path) -> Result<Option<Vec<Value>>, AppError> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => {}
        _ => {
            tracing::debug!("Skipping missing or empty {}", path.display());
            return Ok(None);
        }
    }

    let file = File::open(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| AppError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    match value {
        Value::Array(records) => Ok(Some(records)),
        _ => Err(AppError::NotAnArray {
            path: path.to_path_buf(),
        }),
    }
}

/// Concatenate the records of every input into `output`. Returns the number
/// of records written.
pub(crate) fn merge(output: &Path, inputs: &[PathBuf]) -> Result<usize, AppError> {
    let mut records = Vec::new();
    for input in inputs {
        if let Some(fragment) = read_fragment(input)? {
            records.extend(fragment);
        }
    }

    let io_error = |source| AppError::Io {
        path: output.to_path_buf(),
        source,
    };
    let file = File::create(output).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &records).map_err(|source| AppError::Json {
        path: output.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(io_error)?;

    tracing::debug!(
        "Merged {} compile commands from {} inputs into {}",
        records.len(),
        inputs.len(),
        output.display()
    );
    Ok(records.len())
}
