use crate::error::{AnalysisError, AnalysisResult};
use crate::numeric;
use crate::summary::SummaryRow;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

// MARK: Series Statistics
/// Windowed statistics of one scalar time series.
#[derive(Debug, Clone)]
pub struct SeriesStats {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub stderr: f64,
}

/// Mean, sample standard deviation and standard error of one series file after
/// discarding the first `skip` samples (the burn-in window: transient dynamics
/// before the system reaches steady state).
///
/// Unlike frame parsing, corruption here is all-or-nothing: any unparsable
/// line invalidates the whole file, because a partially-read run would
/// contribute a biased average to the sweep.
pub fn series_stats(path: &Path, skip: usize) -> AnalysisResult<SeriesStats> {
    let samples = read_series(path)?;
    let start = skip.min(samples.len());
    let window = &samples[start..];

    if window.is_empty() {
        return Err(AnalysisError::EmptySeries {
            path: path.to_path_buf(),
        });
    }

    Ok(stats_of(window))
}

fn stats_of(samples: &[f64]) -> SeriesStats {
    let n = samples.len();
    let mean = samples.iter().sum::<f64>() / n as f64;

    // Bessel's correction (ddof = 1); undefined for a single sample
    let std = if n > 1 {
        let sum_sq: f64 = samples.iter().map(|v| (v - mean).powi(2)).sum();
        (sum_sq / (n - 1) as f64).sqrt()
    } else {
        f64::NAN
    };

    SeriesStats {
        count: n,
        mean,
        std,
        stderr: std / (n as f64).sqrt(),
    }
}

/// Read a whole scalar series, one float per line. Blank lines are tolerated;
/// any other unparsable line fails the read.
fn read_series(path: &Path) -> AnalysisResult<Vec<f64>> {
    let reader = BufReader::new(File::open(path)?);
    let mut values = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let token = line.trim();
        if token.is_empty() {
            continue;
        }
        values.push(numeric::parse_float(token)?);
    }

    Ok(values)
}

/// Sweep value encoded in a series file name: the third `_`-separated token of
/// the base name (extension stripped), falling back to the whole base name.
/// NaN when neither parses; the caller still emits the row and downstream
/// plotting excludes non-numeric sweep axes itself.
pub fn sweep_value_from_name(path: &Path) -> f64 {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");

    if let Some(token) = stem.split('_').nth(2) {
        if let Ok(value) = numeric::parse_float(token) {
            return value;
        }
    }

    numeric::parse_float(stem).unwrap_or(f64::NAN)
}

// MARK: Batch Aggregation
/// Aggregate every series file in a directory into one summary row per run,
/// sorted ascending by sweep value (NaN sweep values sort last).
///
/// Files are processed sequentially in sorted-name order. A file that is
/// unreadable, corrupt, or empty after the burn-in window is reported on
/// stderr and its row omitted; the batch continues with the remaining files.
pub fn aggregate_dir(dir: &Path, skip: usize) -> AnalysisResult<Vec<SummaryRow>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    let progress_bar = ProgressBar::new(paths.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}")
            .unwrap()
            .progress_chars("#>-")
    );

    let mut rows = Vec::new();
    for path in &paths {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            progress_bar.set_message(name.to_string());
        }

        match series_stats(path, skip) {
            Ok(stats) => rows.push(SummaryRow {
                sweep_value: sweep_value_from_name(path),
                sample_count: stats.count,
                mean: stats.mean,
                std: stats.std,
                stderr: stats.stderr,
            }),
            Err(e) => eprintln!("Skipping {}: {}", path.display(), e),
        }

        progress_bar.inc(1);
    }
    progress_bar.finish_with_message(format!("{} runs aggregated", rows.len()));

    rows.sort_by(|a, b| a.sweep_value.total_cmp(&b.sweep_value));
    Ok(rows)
}
