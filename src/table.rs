//! Delimited-file input and output.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use flate2::read::GzDecoder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

/// Open a CSV file, transparently decompressing `.gz`
fn open_reader(path: &Path) -> Result<csv::Reader<Box<dyn Read>>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    Ok(ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .from_reader(reader))
}

/// Read every row of a CSV file with a header line.
pub fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = open_reader(path)?;

    let rows = reader
        .deserialize()
        .enumerate()
        .map(|(idx, row)| {
            // +2: header line and 1-based numbering
            row.with_context(|| format!("Malformed line {} in {}", idx + 2, path.display()))
        })
        .collect::<Result<Vec<T>>>()?;

    info!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Write rows with a header derived from the field names.
pub fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = WriterBuilder::new().from_writer(BufWriter::new(file));

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Write one value per line.
pub fn write_lines<S: AsRef<str>>(path: &Path, lines: &[S]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    for line in lines {
        writeln!(writer, "{}", line.as_ref())?;
    }
    writer.flush()?;
    Ok(())
}
