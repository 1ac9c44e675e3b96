use std::num::ParseFloatError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error on '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse coordinate on line {line_number} ('{line}'): {source}")]
    Parse {
        line_number: usize,
        line: String,
        #[source]
        source: ParseFloatError,
    },

    #[error(
        "Pose shape mismatch: pose {first} has {first_len} atoms but pose {second} has {second_len}"
    )]
    ShapeMismatch {
        first: usize,
        second: usize,
        first_len: usize,
        second_len: usize,
    },

    #[error("Invalid histogram bin width: {0}")]
    InvalidBinWidth(f64),

    #[error("RMSD values up to {max} need too many bins of width {bin_width}")]
    TooManyBins { max: f64, bin_width: f64 },

    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),

    #[error("Plotting error: {0}")]
    Plot(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

impl AnalysisError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_mismatch_message_names_both_poses() {
        let err = AnalysisError::ShapeMismatch {
            first: 0,
            second: 3,
            first_len: 2,
            second_len: 5,
        };
        let message = err.to_string();
        assert!(message.contains("pose 0 has 2 atoms"));
        assert!(message.contains("pose 3 has 5"));
    }

    #[test]
    fn io_error_keeps_path_and_source() {
        let err = AnalysisError::io(
            "/tmp/missing.dlg",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("/tmp/missing.dlg"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn worker_pool_error_does_not_blame_a_path() {
        let err = AnalysisError::WorkerPool("could not spawn threads".to_string());
        assert_eq!(
            err.to_string(),
            "Failed to build worker pool: could not spawn threads"
        );
    }

    #[test]
    fn too_many_bins_reports_range() {
        let err = AnalysisError::TooManyBins {
            max: 1.0e9,
            bin_width: 0.5,
        };
        assert!(err.to_string().contains("1000000000"));
        assert!(err.to_string().contains("0.5"));
    }
}
