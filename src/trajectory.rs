use crate::error::AnalysisResult;
use crate::numeric;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// Particle speed assumed when a log never declares a `velocity` metadata line,
/// in box units per step. Matches the constant hardcoded in the upstream
/// simulation. A declared `velocity: 0` is honored as-is, not replaced.
pub const DEFAULT_SPEED: f64 = 0.03;

// MARK: Data Structures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub theta: f64,
    pub speed: f64,
}

/// Complete particle-state snapshot for one simulation time step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub time: f64,
    pub particles: Vec<Particle>,
}

/// Which control parameter the run sweeps over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepAxis {
    Nu,
    Density,
}

impl SweepAxis {
    pub fn label(self) -> &'static str {
        match self {
            SweepAxis::Nu => "nu",
            SweepAxis::Density => "density",
        }
    }
}

/// Global run parameters, accumulated opportunistically from metadata lines
/// anywhere in the log. Order is not guaranteed, and every field may stay
/// absent; consumers decide whether they can proceed without it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunParams {
    pub box_size: Option<f64>,
    pub particle_count: Option<usize>,
    pub sweep_value: Option<f64>,
    pub sweep_axis: Option<SweepAxis>,
    pub speed: Option<f64>,
}

impl RunParams {
    /// Fold one metadata line into the accumulated parameters. Keys that do not
    /// carry run parameters (per-step `polarization` lines and the like) and
    /// unparsable values are ignored.
    pub fn record(&mut self, key: &str, value: &str) {
        match key {
            "N" => {
                if let Ok(count) = numeric::parse_int(value) {
                    self.particle_count = Some(count as usize);
                }
            }
            "L" => {
                if let Ok(size) = numeric::parse_float(value) {
                    self.box_size = Some(size);
                }
            }
            "nu" => {
                if let Ok(nu) = numeric::parse_float(value) {
                    self.sweep_value = Some(nu);
                    self.sweep_axis = Some(SweepAxis::Nu);
                }
            }
            "density" => {
                // nu is the canonical sweep axis; density fills in only when
                // the log never declared one
                if self.sweep_axis != Some(SweepAxis::Nu) {
                    if let Ok(density) = numeric::parse_float(value) {
                        self.sweep_value = Some(density);
                        self.sweep_axis = Some(SweepAxis::Density);
                    }
                }
            }
            "velocity" => {
                // speed is never negative
                if let Ok(speed) = numeric::parse_float(value) {
                    if speed >= 0.0 {
                        self.speed = Some(speed);
                    }
                }
            }
            _ => {}
        }
    }
}

// MARK: Line Classification

/// The step-boundary syntaxes observed across log generations. A single file
/// uses exactly one; the classifier locks onto the first style it sees unless
/// the caller configured one up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryStyle {
    /// `t - <step>`
    Dash,
    /// `t : <step>`
    Colon,
    /// `t = <step>`
    Equals,
}

impl BoundaryStyle {
    pub const ALL: [BoundaryStyle; 3] = [BoundaryStyle::Dash, BoundaryStyle::Colon, BoundaryStyle::Equals];

    fn separator(self) -> char {
        match self {
            BoundaryStyle::Dash => '-',
            BoundaryStyle::Colon => ':',
            BoundaryStyle::Equals => '=',
        }
    }
}

/// Field delimiter of particle records. File-specific and fixed for the whole
/// file; probed from the first record line when not configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Semicolon,
    Whitespace,
}

/// Classification of one stripped, non-empty log line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineClass<'a> {
    StepBoundary(f64),
    Metadata(&'a str, &'a str),
    ParticleRecord(Vec<&'a str>),
    Unrecognized,
}

/// Recognizes the step-boundary, metadata and particle-record shapes, locking
/// onto the boundary style and field delimiter of the file as it goes.
#[derive(Debug, Default)]
pub struct LineClassifier {
    boundary: Option<BoundaryStyle>,
    delimiter: Option<Delimiter>,
}

impl LineClassifier {
    pub fn new() -> Self {
        LineClassifier::default()
    }

    /// Pin the boundary style and/or delimiter instead of probing for them.
    pub fn with_format(boundary: Option<BoundaryStyle>, delimiter: Option<Delimiter>) -> Self {
        LineClassifier { boundary, delimiter }
    }

    /// Classify one stripped, non-empty line. Priority order: step boundary,
    /// then metadata, then particle record. Anything else is `Unrecognized`
    /// and callers drop it silently (accepted lossy behavior).
    pub fn classify<'a>(&mut self, line: &'a str) -> LineClass<'a> {
        if let Some((style, time)) = self.match_boundary(line) {
            self.boundary.get_or_insert(style);
            return LineClass::StepBoundary(time);
        }

        if let Some((key, value)) = match_metadata(line) {
            return LineClass::Metadata(key, value);
        }

        if let Some((delimiter, fields)) = self.match_record(line) {
            self.delimiter.get_or_insert(delimiter);
            return LineClass::ParticleRecord(fields);
        }

        LineClass::Unrecognized
    }

    /// Match `t <sep> <int>` in the locked style, or in any style while still
    /// probing. The step index becomes the frame's time stamp.
    fn match_boundary(&self, line: &str) -> Option<(BoundaryStyle, f64)> {
        let rest = line.strip_prefix('t')?.trim_start();

        for style in BoundaryStyle::ALL {
            if self.boundary.is_some_and(|locked| locked != style) {
                continue;
            }
            if let Some(after) = rest.strip_prefix(style.separator()) {
                let token = after.trim();
                if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()) {
                    if let Ok(step) = token.parse::<u64>() {
                        return Some((style, step as f64));
                    }
                }
            }
        }

        None
    }

    /// Match a particle record: at least 4 fields after splitting on the
    /// file's delimiter. While probing, `;` takes priority over whitespace.
    fn match_record<'a>(&self, line: &'a str) -> Option<(Delimiter, Vec<&'a str>)> {
        for delimiter in [Delimiter::Semicolon, Delimiter::Whitespace] {
            if self.delimiter.is_some_and(|locked| locked != delimiter) {
                continue;
            }
            let fields: Vec<&str> = match delimiter {
                Delimiter::Semicolon => line.split(';').map(str::trim).collect(),
                Delimiter::Whitespace => line.split_whitespace().collect(),
            };
            if fields.len() >= 4 {
                return Some((delimiter, fields));
            }
        }

        None
    }
}

/// Match `<key> : <value>` where the key is a bare word with no leading digit.
fn match_metadata(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    let first = key.chars().next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some((key, value.trim()))
}

// MARK: Frame Streaming

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    Scanning,
    BufferingFrame,
    Done,
}

/// Lazy, forward-only, single-pass frame sequence over one trajectory log.
///
/// The reader owns the open file handle for its lifetime; dropping it before
/// exhaustion releases the handle. Re-iterating requires reopening the source.
/// Production suspends between `next_frame` calls and resumes exactly where it
/// left off; no background threads are involved.
pub struct FrameReader {
    lines: Lines<BufReader<File>>,
    classifier: LineClassifier,
    state: ReaderState,
    pending_time: f64,
    buffer: Vec<Particle>,
    params: RunParams,
    default_speed: f64,
}

impl FrameReader {
    /// Open a log, probing the boundary style and delimiter from its content.
    pub fn open(path: &Path) -> AnalysisResult<Self> {
        FrameReader::with_format(path, None, None, DEFAULT_SPEED)
    }

    /// Open a log with a pinned format. `None` fields are probed from the
    /// first matching line and locked for the remainder of the stream.
    pub fn with_format(
        path: &Path,
        boundary: Option<BoundaryStyle>,
        delimiter: Option<Delimiter>,
        default_speed: f64,
    ) -> AnalysisResult<Self> {
        let file = File::open(path)?;
        Ok(FrameReader {
            lines: BufReader::new(file).lines(),
            classifier: LineClassifier::with_format(boundary, delimiter),
            state: ReaderState::Scanning,
            // Records before the first boundary form an implicit frame at t=0
            pending_time: 0.0,
            buffer: Vec::new(),
            params: RunParams::default(),
            default_speed,
        })
    }

    /// Run parameters accumulated from the metadata lines seen so far.
    pub fn params(&self) -> &RunParams {
        &self.params
    }

    /// Advance to the next completed frame.
    ///
    /// A step boundary flushes the current non-empty buffer as a frame (an
    /// empty pending frame carries no information and is never emitted) and
    /// re-stamps the pending time; at end of input a non-empty buffer becomes
    /// the final frame. Malformed particle lines are skipped one record at a
    /// time and never abort the frame or the stream; only I/O failures do.
    pub fn next_frame(&mut self) -> AnalysisResult<Option<Frame>> {
        if self.state == ReaderState::Done {
            return Ok(None);
        }

        loop {
            let Some(line) = self.lines.next() else {
                self.state = ReaderState::Done;
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(Frame {
                    time: self.pending_time,
                    particles: std::mem::take(&mut self.buffer),
                }));
            };

            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    self.state = ReaderState::Done;
                    return Err(e.into());
                }
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match self.classifier.classify(trimmed) {
                LineClass::StepBoundary(time) => {
                    if self.buffer.is_empty() {
                        self.pending_time = time;
                        continue;
                    }
                    let frame = Frame {
                        time: self.pending_time,
                        particles: std::mem::take(&mut self.buffer),
                    };
                    self.pending_time = time;
                    self.state = ReaderState::Scanning;
                    return Ok(Some(frame));
                }
                LineClass::Metadata(key, value) => self.params.record(key, value),
                LineClass::ParticleRecord(fields) => {
                    // Occasionally truncated records are dropped one at a time
                    if let Some(particle) = self.parse_particle(&fields) {
                        self.buffer.push(particle);
                        self.state = ReaderState::BufferingFrame;
                    }
                }
                LineClass::Unrecognized => {}
            }
        }
    }

    fn parse_particle(&self, fields: &[&str]) -> Option<Particle> {
        let id = numeric::parse_int(fields[0]).ok()?;
        let x = numeric::parse_float(fields[1]).ok()?;
        let y = numeric::parse_float(fields[2]).ok()?;
        let theta = numeric::parse_float(fields[3]).ok()?;
        Some(Particle {
            id,
            x,
            y,
            theta,
            speed: self.params.speed.unwrap_or(self.default_speed),
        })
    }
}

impl Iterator for FrameReader {
    type Item = AnalysisResult<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}

/// Scan a log only as far as needed to learn the box size and particle count,
/// without materializing any frames. Used by renderers to size their viewport
/// before streaming.
pub fn read_run_params(path: &Path) -> AnalysisResult<RunParams> {
    let file = File::open(path)?;
    let mut classifier = LineClassifier::new();
    let mut params = RunParams::default();

    for line in BufReader::new(file).lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let LineClass::Metadata(key, value) = classifier.classify(trimmed) {
            params.record(key, value);
        }
        if params.box_size.is_some() && params.particle_count.is_some() {
            break;
        }
    }

    Ok(params)
}
