use crate::error::AnalysisResult;
use crate::numeric;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

// MARK: Summary Rows
/// One aggregated run: the sweep value from the file name, the usable sample
/// count, and the windowed statistics. `std`/`stderr` are NaN for single-sample
/// runs and for rows read back from legacy tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRow {
    pub sweep_value: f64,
    pub sample_count: usize,
    pub mean: f64,
    pub std: f64,
    pub stderr: f64,
}

/// Write the current 5-column schema: `nu;N;mean;std;stderr`, truncating any
/// existing file. The field names are schema labels, not sweep-axis names, so
/// density sweeps use the same header.
///
/// Single-writer assumption: running two aggregations against the same output
/// path concurrently is undefined and not defended against.
pub fn write_table(path: &Path, rows: &[SummaryRow]) -> AnalysisResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "nu;N;mean;std;stderr")?;
    for row in rows {
        writeln!(
            writer,
            "{};{};{};{};{}",
            row.sweep_value, row.sample_count, row.mean, row.std, row.stderr
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a summary table in either on-disk schema.
///
/// The current schema is 5 columns with a header; the legacy schema is a
/// headerless 2-column `sweep;mean` table. Detection is heuristic: a first
/// line containing `mean` or `std` is the current header, and each data line
/// is read by its field count. Legacy rows surface a zero sample count and NaN
/// `std`/`stderr`. Lines matching neither shape are dropped.
pub fn read_table(path: &Path) -> AnalysisResult<Vec<SummaryRow>> {
    let reader = BufReader::new(File::open(path)?);
    let mut rows = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        // Only the current schema carries a header
        if index == 0 && (trimmed.contains("mean") || trimmed.contains("std")) {
            continue;
        }

        let fields: Vec<&str> = trimmed.split(';').map(str::trim).collect();
        match fields.len() {
            5 => rows.push(SummaryRow {
                sweep_value: parse_stat(fields[0]),
                sample_count: fields[1].parse().unwrap_or(0),
                mean: parse_stat(fields[2]),
                std: parse_stat(fields[3]),
                stderr: parse_stat(fields[4]),
            }),
            2 => rows.push(SummaryRow {
                sweep_value: parse_stat(fields[0]),
                sample_count: 0,
                mean: parse_stat(fields[1]),
                std: f64::NAN,
                stderr: f64::NAN,
            }),
            _ => {}
        }
    }

    Ok(rows)
}

/// Statistic fields may legitimately hold NaN (single-sample runs, legacy
/// rows), so unparsable tokens map to NaN instead of failing the read.
fn parse_stat(token: &str) -> f64 {
    numeric::parse_float(token).unwrap_or(f64::NAN)
}

/// Pretty-printed JSON snapshot of the rows, for consumers that prefer
/// structured input over the semicolon table. Non-finite values serialize as
/// null.
pub fn write_json(path: &Path, rows: &[SummaryRow]) -> AnalysisResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, rows)?;
    Ok(())
}
