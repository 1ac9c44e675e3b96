pub mod batch;
pub mod error;
pub mod histogram;
pub mod logging;
pub mod plot;
pub mod poses;
pub mod rmsd;
pub mod structure;

#[cfg(feature = "python")]
pub mod python_bindings;

// Re-export commonly used types and traits
pub use batch::{
    list_log_files, process_folder, AnalysisOptions, BatchReport, DlgFile, DockingLog,
    FileFailure, FileReport, FileWarning,
};
pub use error::{AnalysisError, Result};
pub use histogram::{Histogram, DEFAULT_BIN_WIDTH, MAX_BINS};
pub use plot::{HistogramSink, SvgHistogramPlotter};
pub use poses::{
    extract_poses, extract_poses_with, read_poses_from_file, LogMarkers, PoseExtractor,
};
pub use rmsd::{compute_rmsd_matrix, pose_rmsd, save_matrix_to_csv, RmsdMatrix, RmsdSummary};
pub use structure::{Coordinate, Pose, PoseSet};
