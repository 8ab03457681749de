// End-to-end: trajectory logs → polarization series → summary table → read-back.

use flock_analysis::polarization::{default_series_name, export_series};
use flock_analysis::statistics::{aggregate_dir, sweep_value_from_name};
use flock_analysis::summary::{read_table, write_table};
use std::fs;
use std::path::Path;

/// A small log in the given boundary/delimiter convention: `frames` steps of
/// two particles whose headings differ by `spread` radians.
fn write_log(path: &Path, nu: f64, sep: &str, delim: &str, frames: usize, spread: f64) {
    let mut content = format!("N : 2\nL : 10\nnu : {}\nvelocity : 0.03\n", nu);
    for step in 0..frames {
        content.push_str(&format!("t {} {}\n", sep, step));
        content.push_str(&format!("0{d}0.5{d}0.5{d}0.0\n", d = delim));
        content.push_str(&format!("1{d}1.5{d}1.5{d}{}\n", spread, d = delim));
    }
    fs::write(path, content).unwrap();
}

#[test]
fn logs_across_conventions_aggregate_into_one_sorted_table() {
    let dir = tempfile::tempdir().unwrap();
    let logs = dir.path().join("logs");
    let series = dir.path().join("series");
    fs::create_dir_all(&logs).unwrap();
    fs::create_dir_all(&series).unwrap();

    // Each run uses a different log generation: boundary style and delimiter
    // vary per file, never within one
    write_log(&logs.join("run_a.txt"), 0.1, "-", ";", 5, 0.0);
    write_log(&logs.join("run_b.txt"), 0.5, ":", ";", 5, std::f64::consts::FRAC_PI_2);
    write_log(&logs.join("run_c.txt"), 0.9, "=", " ", 5, std::f64::consts::PI);

    for (name, nu) in [("run_a.txt", 0.1), ("run_b.txt", 0.5), ("run_c.txt", 0.9)] {
        let log = logs.join(name);
        let out = series.join(format!("output_nu_{}.txt", nu));
        let outcome = export_series(&log, Some(&out), None, None, None).unwrap();
        assert_eq!(outcome.frames, 5);
        assert_eq!(outcome.params.sweep_value, Some(nu));
    }

    let rows = aggregate_dir(&series, 1).unwrap();
    assert_eq!(rows.len(), 3);

    // Sorted ascending by the sweep value recovered from the file names
    assert!((rows[0].sweep_value - 0.1).abs() < 1e-12);
    assert!((rows[1].sweep_value - 0.5).abs() < 1e-12);
    assert!((rows[2].sweep_value - 0.9).abs() < 1e-12);

    // Aligned run ≈ 1, orthogonal ≈ 1/√2, opposing ≈ 0
    assert!((rows[0].mean - 1.0).abs() < 1e-9);
    assert!((rows[1].mean - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    assert!(rows[2].mean.abs() < 1e-6);

    // 5 frames minus 1 burn-in sample each
    for row in &rows {
        assert_eq!(row.sample_count, 4);
    }

    let table = dir.path().join("avg-polarization.txt");
    write_table(&table, &rows).unwrap();
    let back = read_table(&table).unwrap();
    assert_eq!(back.len(), 3);
    for (a, b) in rows.iter().zip(&back) {
        assert!((a.sweep_value - b.sweep_value).abs() < 1e-12);
        assert_eq!(a.sample_count, b.sample_count);
        assert!((a.mean - b.mean).abs() < 1e-9);
    }
}

#[test]
fn default_series_name_feeds_the_sweep_extractor() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("run.txt");
    write_log(&log, 0.45, ":", ";", 3, 0.0);

    // The default name puts the sweep value exactly where the aggregator's
    // file-name extraction looks for it
    let out = dir.path().join("series.txt");
    let outcome = export_series(&log, Some(&out), None, None, None).unwrap();
    let name = default_series_name(&outcome.params);
    assert_eq!(name, Path::new("output_nu_0.45.txt"));
    assert!((sweep_value_from_name(&name) - 0.45).abs() < 1e-12);
}

#[test]
fn corrupt_series_never_reaches_the_summary_table() {
    let dir = tempfile::tempdir().unwrap();
    let series = dir.path().join("series");
    fs::create_dir_all(&series).unwrap();

    fs::write(series.join("output_nu_0.2.txt"), "0.9\n0.9\n0.9\n").unwrap();
    // A truncated sensor write mid-series poisons the whole run
    fs::write(series.join("output_nu_0.4.txt"), "0.8\n0.8#\n0.8\n").unwrap();

    let rows = aggregate_dir(&series, 0).unwrap();
    assert_eq!(rows.len(), 1);
    assert!((rows[0].sweep_value - 0.2).abs() < 1e-12);
}

#[test]
fn mixed_schema_summaries_read_back_together() {
    let dir = tempfile::tempdir().unwrap();

    // A summary written by this tool and one left over from an older run
    let current = dir.path().join("current.txt");
    write_table(
        &current,
        &[flock_analysis::summary::SummaryRow {
            sweep_value: 0.1,
            sample_count: 9,
            mean: 0.92,
            std: 0.015,
            stderr: 0.005,
        }],
    )
    .unwrap();
    let legacy = dir.path().join("legacy.txt");
    fs::write(&legacy, "0.8;0.64\n1.6;0.31\n").unwrap();

    let current_rows = read_table(&current).unwrap();
    assert_eq!(current_rows.len(), 1);
    assert_eq!(current_rows[0].sample_count, 9);

    let legacy_rows = read_table(&legacy).unwrap();
    assert_eq!(legacy_rows.len(), 2);
    assert!(legacy_rows[0].std.is_nan());
    assert!((legacy_rows[1].mean - 0.31).abs() < 1e-12);
}
