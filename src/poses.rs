use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::structure::{Coordinate, Pose, PoseSet};

/// Substring that opens a new pose block in an AutoDock log
pub const DEFAULT_MODEL_MARKER: &str = "DOCKED: MODEL";

/// Substring that marks an atom coordinate record
pub const DEFAULT_ATOM_MARKER: &str = "DOCKED: ATOM";

/// Three whitespace-separated signed decimals, each with a fractional part
static COORDINATE_TRIPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(-?\d+\.\d+)\s+(-?\d+\.\d+)\s+(-?\d+\.\d+)")
        .expect("coordinate pattern is valid")
});

/// Line markers recognized by the extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMarkers {
    pub model: String,
    pub atom: String,
}

impl Default for LogMarkers {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL_MARKER.to_string(),
            atom: DEFAULT_ATOM_MARKER.to_string(),
        }
    }
}

#[derive(Debug)]
enum State {
    /// No atoms seen since the last completed pose
    Flushed,
    /// Collecting atoms of the current pose
    Accumulating(Pose),
}

/// Line-driven pose reader.
///
/// Feed every line of a log in order, then call [`PoseExtractor::finish`].
/// A model marker closes the pose being accumulated (markers seen before
/// any atom are ignored); an atom marker contributes the first coordinate
/// triple found on its line. Atom lines without a triple are skipped.
#[derive(Debug)]
pub struct PoseExtractor {
    markers: LogMarkers,
    max_poses: Option<usize>,
    state: State,
    poses: PoseSet,
    line_number: usize,
}

impl PoseExtractor {
    pub fn new(markers: LogMarkers) -> Self {
        Self {
            markers,
            max_poses: None,
            state: State::Flushed,
            poses: PoseSet::new(),
            line_number: 0,
        }
    }

    /// Stop collecting once `max_poses` poses have been completed
    pub fn with_max_poses(mut self, max_poses: Option<usize>) -> Self {
        self.max_poses = max_poses;
        self
    }

    /// True once the pose limit has been reached; further lines are ignored
    pub fn is_saturated(&self) -> bool {
        self.max_poses
            .map(|max| self.poses.len() >= max)
            .unwrap_or(false)
    }

    /// Number of poses completed so far
    pub fn completed(&self) -> usize {
        self.poses.len()
    }

    pub fn feed(&mut self, line: &str) -> Result<()> {
        self.line_number += 1;
        if self.is_saturated() {
            return Ok(());
        }

        if line.contains(self.markers.model.as_str()) {
            self.flush();
            if self.is_saturated() {
                return Ok(());
            }
        }

        if line.contains(self.markers.atom.as_str()) {
            if let Some(coordinate) = parse_coordinate(line, self.line_number)? {
                match &mut self.state {
                    State::Accumulating(pose) => pose.push(coordinate),
                    State::Flushed => self.state = State::Accumulating(vec![coordinate]),
                }
            }
        }

        Ok(())
    }

    /// Close the trailing pose (if any) and return every pose in file order
    pub fn finish(mut self) -> PoseSet {
        if !self.is_saturated() {
            self.flush();
        }
        self.poses
    }

    fn flush(&mut self) {
        if let State::Accumulating(pose) = std::mem::replace(&mut self.state, State::Flushed) {
            self.poses.push(pose);
        }
    }
}

/// Extract the first coordinate triple on an atom line.
///
/// Returns `Ok(None)` when the line carries no triple.
fn parse_coordinate(line: &str, line_number: usize) -> Result<Option<Coordinate>> {
    let Some(captures) = COORDINATE_TRIPLE.captures(line) else {
        return Ok(None);
    };

    let mut values = [0.0_f64; 3];
    for (slot, value) in values.iter_mut().enumerate() {
        let text = &captures[slot + 1];
        *value = text.parse::<f64>().map_err(|source| AnalysisError::Parse {
            line_number,
            line: line.to_string(),
            source,
        })?;
    }

    Ok(Some(Coordinate::new(values[0], values[1], values[2])))
}

/// Extract poses from log lines using the default AutoDock markers
pub fn extract_poses<I, S>(lines: I) -> Result<PoseSet>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    extract_poses_with(lines, &LogMarkers::default(), None)
}

/// Extract poses from log lines with explicit markers and an optional pose limit
pub fn extract_poses_with<I, S>(
    lines: I,
    markers: &LogMarkers,
    max_poses: Option<usize>,
) -> Result<PoseSet>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut extractor = PoseExtractor::new(markers.clone()).with_max_poses(max_poses);
    for line in lines {
        extractor.feed(line.as_ref())?;
        if extractor.is_saturated() {
            break;
        }
    }
    Ok(extractor.finish())
}

/// Read a log from disk line by line and extract its poses.
///
/// Reading stops as soon as `max_poses` poses are complete.
pub fn read_poses_from_file(
    path: &Path,
    markers: &LogMarkers,
    max_poses: Option<usize>,
) -> Result<PoseSet> {
    let file = File::open(path).map_err(|e| AnalysisError::io(path, e))?;
    let reader = BufReader::new(file);

    let mut extractor = PoseExtractor::new(markers.clone()).with_max_poses(max_poses);
    for line_result in reader.lines() {
        let line = line_result.map_err(|e| AnalysisError::io(path, e))?;
        extractor.feed(&line)?;
        if extractor.is_saturated() {
            debug!("Pose limit reached in {}", path.display());
            break;
        }
    }

    Ok(extractor.finish())
}
