use crate::error::AnalysisResult;
use crate::trajectory::{BoundaryStyle, Delimiter, Frame, FrameReader, RunParams, DEFAULT_SPEED};
use nalgebra::Vector2;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// MARK: Order Parameter
/// Normalized magnitude of the mean heading vector of a frame:
/// |Σ v·(cos θ_i, sin θ_i)| / (N·v), in [0, 1] up to rounding.
/// 1 = fully aligned, 0 = uncorrelated or cancelling headings.
///
/// Returns exactly 0.0 for an empty frame or zero speed. The guard replaces a
/// division by zero with a plottable value; degenerate frames are expected in
/// real logs and must not abort a series.
pub fn polarization(frame: &Frame, speed: f64) -> f64 {
    if frame.particles.is_empty() || speed == 0.0 {
        return 0.0;
    }

    let mut heading_sum = Vector2::zeros();
    for particle in &frame.particles {
        heading_sum += Vector2::new(particle.theta.cos(), particle.theta.sin()) * speed;
    }

    heading_sum.norm() / (frame.particles.len() as f64 * speed)
}

/// Speed in effect for a run: a declared `velocity` wins, including a declared
/// zero; the default applies only when the log omits the key entirely.
pub fn resolved_speed(params: &RunParams, default_speed: f64) -> f64 {
    params.speed.unwrap_or(default_speed)
}

/// Default name for a run's polarization series: `output_<axis>_<value>.txt`.
/// The sweep value lands in the third `_`-separated token, which is where the
/// batch aggregator looks for it.
pub fn default_series_name(params: &RunParams) -> PathBuf {
    let axis = params.sweep_axis.map_or("nu", |axis| axis.label());
    let tag = match params.sweep_value {
        Some(value) => format!("{}", value),
        None => "unknown".to_string(),
    };
    PathBuf::from(format!("output_{}_{}.txt", axis, tag))
}

/// What a series export produced.
#[derive(Debug)]
pub struct ExportOutcome {
    pub path: PathBuf,
    pub frames: usize,
    pub params: RunParams,
}

/// MARK: Series Export
/// Stream a trajectory log and write one polarization value per frame, one per
/// line, to the output file. When no output path is given the name is derived
/// from the run's sweep metadata via `default_series_name`.
pub fn export_series(
    log_path: &Path,
    output: Option<&Path>,
    speed_override: Option<f64>,
    boundary: Option<BoundaryStyle>,
    delimiter: Option<Delimiter>,
) -> AnalysisResult<ExportOutcome> {
    let mut reader = FrameReader::with_format(log_path, boundary, delimiter, DEFAULT_SPEED)?;

    // One scalar per frame; the frames themselves are not retained
    let mut values = Vec::new();
    while let Some(frame) = reader.next_frame()? {
        let speed = speed_override
            .unwrap_or_else(|| resolved_speed(reader.params(), DEFAULT_SPEED));
        values.push(polarization(&frame, speed));
    }

    let params = reader.params().clone();
    let path = match output {
        Some(path) => path.to_path_buf(),
        None => default_series_name(&params),
    };

    let mut writer = BufWriter::new(File::create(&path)?);
    for value in &values {
        writeln!(writer, "{}", value)?;
    }
    writer.flush()?;

    Ok(ExportOutcome {
        path,
        frames: values.len(),
        params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trajectory::Particle;
    use std::f64::consts::{FRAC_PI_2, PI};
    use std::fs;

    fn frame_with_headings(headings: &[f64]) -> Frame {
        Frame {
            time: 0.0,
            particles: headings
                .iter()
                .enumerate()
                .map(|(i, &theta)| Particle {
                    id: i as u32,
                    x: 0.0,
                    y: 0.0,
                    theta,
                    speed: DEFAULT_SPEED,
                })
                .collect(),
        }
    }

    #[test]
    fn identical_headings_give_full_alignment() {
        let frame = frame_with_headings(&[0.7, 0.7, 0.7, 0.7]);
        assert!((polarization(&frame, 0.03) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn uniformly_spaced_headings_cancel() {
        let frame = frame_with_headings(&[0.0, FRAC_PI_2, PI, 3.0 * FRAC_PI_2]);
        assert!(polarization(&frame, 0.03).abs() < 1e-12);
    }

    #[test]
    fn empty_frame_and_zero_speed_are_exactly_zero() {
        let empty = frame_with_headings(&[]);
        assert_eq!(polarization(&empty, 0.03), 0.0);

        let frame = frame_with_headings(&[0.5, 1.5]);
        assert_eq!(polarization(&frame, 0.0), 0.0);
    }

    #[test]
    fn two_orthogonal_headings_give_inverse_sqrt_two() {
        // |(cos 0 + cos π/2, sin 0 + sin π/2)| / 2 = √2 / 2
        let frame = frame_with_headings(&[0.0, FRAC_PI_2]);
        let value = polarization(&frame, 0.03);
        assert!((value - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-9);
    }

    #[test]
    fn result_stays_in_unit_interval() {
        let frame = frame_with_headings(&[0.1, 2.3, 4.5, 5.9, 1.7]);
        let value = polarization(&frame, 0.03);
        assert!((0.0..=1.0 + 1e-12).contains(&value));
    }

    #[test]
    fn default_name_encodes_the_sweep_value_in_the_third_token() {
        let mut params = RunParams::default();
        params.record("nu", "0.45");
        let name = default_series_name(&params);
        assert_eq!(name, PathBuf::from("output_nu_0.45.txt"));

        let mut density = RunParams::default();
        density.record("density", "1.2");
        assert_eq!(default_series_name(&density), PathBuf::from("output_density_1.2.txt"));

        assert_eq!(
            default_series_name(&RunParams::default()),
            PathBuf::from("output_nu_unknown.txt")
        );
    }

    #[test]
    fn export_writes_one_value_per_frame() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("run.txt");
        fs::write(
            &log,
            "nu : 0.45\nt : 0\n1;0.0;0.0;0.0\n2;1.0;1.0;0.0\nt : 1\n1;0.0;0.0;0.0\n2;1.0;1.0;3.14159265\n",
        )
        .unwrap();

        let out = dir.path().join("series.txt");
        let outcome = export_series(&log, Some(&out), None, None, None).unwrap();
        assert_eq!(outcome.frames, 2);
        assert_eq!(outcome.params.sweep_value, Some(0.45));

        let content = fs::read_to_string(&out).unwrap();
        let values: Vec<f64> = content
            .lines()
            .map(|line| line.parse().unwrap())
            .collect();
        assert_eq!(values.len(), 2);
        assert!((values[0] - 1.0).abs() < 1e-12); // both headed the same way
        assert!(values[1].abs() < 1e-8); // opposing headings cancel
    }

    #[test]
    fn declared_zero_velocity_exports_an_all_zero_series() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("run.txt");
        fs::write(&log, "velocity : 0\nt : 0\n1;0.0;0.0;0.7\n2;1.0;1.0;0.7\n").unwrap();

        let out = dir.path().join("series.txt");
        export_series(&log, Some(&out), None, None, None).unwrap();

        let content = fs::read_to_string(&out).unwrap();
        for line in content.lines() {
            assert_eq!(line.parse::<f64>().unwrap(), 0.0);
        }
    }

    #[test]
    fn spec_example_polarization() {
        // "t : 0\n1;0.0;0.0;0.0\n2;1.0;1.0;1.5707963\n" with speed 0.03:
        // |(cos 0 + cos π/2, sin 0 + sin π/2)| / 2 ≈ 0.7071
        let frame = frame_with_headings(&[0.0, 1.5707963]);
        let value = polarization(&frame, 0.03);
        assert!((value - 0.7071).abs() < 1e-4);
    }
}
