use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::{AnalysisError, Result};
use crate::histogram::{Histogram, DEFAULT_BIN_WIDTH};
use crate::plot::HistogramSink;
use crate::poses::{read_poses_from_file, LogMarkers};
use crate::rmsd::{compute_rmsd_matrix, save_matrix_to_csv, RmsdSummary};
use crate::structure::PoseSet;

/// Extension of AutoDock docking logs
pub const DEFAULT_EXTENSION: &str = "dlg";

/// Suffix appended to the input file name for the histogram artifact
pub const DISTRIBUTION_SUFFIX: &str = "_rmsd_distribution";

/// Suffix appended to the input file name for the matrix CSV
pub const MATRIX_SUFFIX: &str = "_rmsd_matrix.csv";

/// Settings for one batch run over a folder of docking logs
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub folder: PathBuf,
    pub extension: String,
    pub bin_width: f64,
    pub markers: LogMarkers,
    pub max_poses: Option<usize>,
    /// Where artifacts go; defaults to the input folder
    pub output_dir: Option<PathBuf>,
    pub write_matrix_csv: bool,
    pub summary_csv: Option<PathBuf>,
    /// Worker threads for file-level parallelism; `None` or 1 runs sequentially
    pub jobs: Option<usize>,
    pub show_progress: bool,
}

impl AnalysisOptions {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            extension: DEFAULT_EXTENSION.to_string(),
            bin_width: DEFAULT_BIN_WIDTH,
            markers: LogMarkers::default(),
            max_poses: None,
            output_dir: None,
            write_matrix_csv: false,
            summary_csv: None,
            jobs: None,
            show_progress: false,
        }
    }

    fn output_dir(&self) -> &Path {
        self.output_dir.as_deref().unwrap_or(&self.folder)
    }
}

/// Non-fatal conditions noticed while analyzing a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileWarning {
    /// No poses were found; the histogram is empty
    EmptyPoseSet,
    /// Exactly one pose; there are no pairs to compare
    NoPosePairs,
}

/// Outcome of a successfully analyzed docking log
#[derive(Debug, Clone)]
pub struct FileReport {
    pub file_name: String,
    pub poses: usize,
    pub atoms_per_pose: usize,
    pub summary: Option<RmsdSummary>,
    pub histogram: Histogram,
    pub output: PathBuf,
    pub warnings: Vec<FileWarning>,
}

/// A docking log that could not be analyzed
#[derive(Debug)]
pub struct FileFailure {
    pub file_name: String,
    pub error: AnalysisError,
}

/// Per-file results of a batch run, in file-name order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: Vec<FileReport>,
    pub failures: Vec<FileFailure>,
}

impl BatchReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn total(&self) -> usize {
        self.processed.len() + self.failures.len()
    }
}

/// Trait for reading and analyzing a single docking log
pub trait DockingLog {
    /// Read the log and extract its poses
    fn read_poses(&self, markers: &LogMarkers, max_poses: Option<usize>) -> Result<PoseSet>;

    /// Extract poses, compute the RMSD matrix and render its distribution.
    ///
    /// The histogram is written to `<output_dir>/<file name>_rmsd_distribution.<ext>`.
    fn analyze(&self, options: &AnalysisOptions, sink: &dyn HistogramSink) -> Result<FileReport>;
}

/// Docking log backed by a file on disk
pub struct DlgFile {
    file_path: PathBuf,
}

impl DlgFile {
    pub fn new(file_path: impl AsRef<Path>) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn file_name(&self) -> String {
        self.file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_path.to_string_lossy().into_owned())
    }
}

impl DockingLog for DlgFile {
    fn read_poses(&self, markers: &LogMarkers, max_poses: Option<usize>) -> Result<PoseSet> {
        read_poses_from_file(&self.file_path, markers, max_poses)
    }

    fn analyze(&self, options: &AnalysisOptions, sink: &dyn HistogramSink) -> Result<FileReport> {
        let file_name = self.file_name();
        let poses = self.read_poses(&options.markers, options.max_poses)?;
        debug!("Extracted {} poses from {}", poses.len(), file_name);

        let matrix = compute_rmsd_matrix(&poses)?;
        let values = matrix.upper_triangle();
        let histogram = Histogram::from_values(&values, options.bin_width)?;

        let mut warnings = Vec::new();
        match poses.len() {
            0 => {
                warn!("No poses found in {}; histogram will be empty", file_name);
                warnings.push(FileWarning::EmptyPoseSet);
            }
            1 => {
                warn!("Only one pose in {}; no RMSD pairs", file_name);
                warnings.push(FileWarning::NoPosePairs);
            }
            _ => {}
        }

        let output_dir = options.output_dir();
        if options.write_matrix_csv {
            let matrix_path = output_dir.join(format!("{}{}", file_name, MATRIX_SUFFIX));
            save_matrix_to_csv(&matrix, &matrix_path)?;
            debug!("Matrix saved to {}", matrix_path.display());
        }

        let output = output_dir.join(format!(
            "{}{}.{}",
            file_name,
            DISTRIBUTION_SUFFIX,
            sink.extension()
        ));
        let title = format!("Distribution of RMSD Values for {}", file_name);
        sink.render(&title, &histogram, &output)?;

        Ok(FileReport {
            file_name,
            poses: poses.len(),
            atoms_per_pose: poses.first().map(Vec::len).unwrap_or(0),
            summary: matrix.summary(),
            histogram,
            output,
            warnings,
        })
    }
}

/// List regular files in `folder` whose name ends with `.<extension>`, sorted by name
pub fn list_log_files(folder: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(AnalysisError::NotADirectory(folder.to_path_buf()));
    }

    let suffix = format!(".{}", extension.trim_start_matches('.'));
    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder).map_err(|e| AnalysisError::io(folder, e))? {
        let entry = entry.map_err(|e| AnalysisError::io(folder, e))?;
        let path = entry.path();
        let matches = entry
            .file_name()
            .to_str()
            .map(|name| name.ends_with(&suffix))
            .unwrap_or(false);
        if matches && path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Analyze every docking log in the configured folder.
///
/// Failures are collected per file; one bad file never stops the batch.
/// Only an unreadable folder (or an unwritable summary CSV) fails the call.
pub fn process_folder(options: &AnalysisOptions, sink: &dyn HistogramSink) -> Result<BatchReport> {
    let files = list_log_files(&options.folder, &options.extension)?;
    info!(
        "Found {} .{} files in {}",
        files.len(),
        options.extension,
        options.folder.display()
    );

    if let Some(dir) = &options.output_dir {
        std::fs::create_dir_all(dir).map_err(|e| AnalysisError::io(dir, e))?;
    }

    let pb = if options.show_progress {
        ProgressBar::new(files.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} files ({percent}%) | ETA: {eta}",
    ) {
        pb.set_style(style.progress_chars("#>-"));
    }

    let analyze_one = |path: &PathBuf| {
        let log = DlgFile::new(path);
        let outcome = log.analyze(options, sink);
        pb.inc(1);
        (log.file_name(), outcome)
    };

    let outcomes: Vec<(String, Result<FileReport>)> = match options.jobs {
        Some(jobs) if jobs > 1 => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()
                .map_err(|e| AnalysisError::WorkerPool(e.to_string()))?;
            pool.install(|| files.par_iter().map(analyze_one).collect())
        }
        _ => files.iter().map(analyze_one).collect(),
    };

    pb.finish_with_message("Processing complete");

    let mut report = BatchReport::default();
    for (file_name, outcome) in outcomes {
        match outcome {
            Ok(file_report) => report.processed.push(file_report),
            Err(error) => {
                error!("Failed to process {}: {}", file_name, error);
                report.failures.push(FileFailure { file_name, error });
            }
        }
    }

    if let Some(summary_path) = &options.summary_csv {
        save_summary_to_csv(&report.processed, summary_path)?;
        info!("Batch summary saved to {}", summary_path.display());
    }

    Ok(report)
}

#[derive(Serialize)]
struct SummaryRow<'a> {
    file: &'a str,
    poses: usize,
    atoms: usize,
    pairs: usize,
    min: Option<f64>,
    max: Option<f64>,
    mean: Option<f64>,
    median: Option<f64>,
    output: String,
}

/// Save one row per analyzed file
fn save_summary_to_csv(reports: &[FileReport], output_path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(output_path)?;

    for report in reports {
        let summary = report.summary.as_ref();
        writer.serialize(SummaryRow {
            file: &report.file_name,
            poses: report.poses,
            atoms: report.atoms_per_pose,
            pairs: summary.map(|s| s.pairs).unwrap_or(0),
            min: summary.map(|s| s.min),
            max: summary.map(|s| s.max),
            mean: summary.map(|s| s.mean),
            median: summary.map(|s| s.median),
            output: report.output.display().to_string(),
        })?;
    }

    writer
        .flush()
        .map_err(|e| AnalysisError::io(output_path, e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::SvgHistogramPlotter;
    use std::sync::Mutex;

    const TWO_POSES: &str = "\
AutoDock-GPU version: v1.5.3
Run:   1 / 2
DOCKED: MODEL        1
DOCKED: USER    Estimated Free Energy of Binding    =   -7.12 kcal/mol
DOCKED: ATOM      1  C1  UNL     1       0.000   0.000   0.000 -0.21 +0.12    0.021 C
DOCKED: ATOM      2  C2  UNL     1       1.000   0.000   0.000 -0.18 +0.03    0.011 C
DOCKED: ENDMDL
DOCKED: MODEL        2
DOCKED: ATOM      1  C1  UNL     1       0.000   0.000   1.000 -0.21 +0.12    0.021 C
DOCKED: ATOM      2  C2  UNL     1       1.000   0.000   1.000 -0.18 +0.03    0.011 C
DOCKED: ENDMDL
";

    const MISMATCHED: &str = "\
DOCKED: MODEL        1
DOCKED: ATOM      1  C1  UNL     1       0.000   0.000   0.000
DOCKED: ATOM      2  C2  UNL     1       1.000   0.000   0.000
DOCKED: MODEL        2
DOCKED: ATOM      1  C1  UNL     1       0.000   0.000   0.000
DOCKED: ATOM      2  C2  UNL     1       1.000   0.000   0.000
DOCKED: ATOM      3  C3  UNL     1       2.000   0.000   0.000
";

    const FAR_APART: &str = "\
DOCKED: MODEL        1
DOCKED: ATOM      1  C1  UNL     1       0.000   0.000   0.000
DOCKED: MODEL        2
DOCKED: ATOM      1  C1  UNL     1       111111111111111111111.000   0.000   0.000
";

    /// Records render calls instead of drawing
    #[derive(Default)]
    struct RecordingSink {
        calls: Mutex<Vec<(String, usize, PathBuf)>>,
    }

    impl HistogramSink for RecordingSink {
        fn render(&self, title: &str, histogram: &Histogram, path: &Path) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((title.to_string(), histogram.total(), path.to_path_buf()));
            Ok(())
        }

        fn extension(&self) -> &str {
            "png"
        }
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_list_log_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.dlg", "");
        write(dir.path(), "a.dlg", "");
        write(dir.path(), "notes.txt", "");
        write(dir.path(), "a.dlg.bak", "");
        std::fs::create_dir(dir.path().join("nested.dlg")).unwrap();

        let files = list_log_files(dir.path(), "dlg").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.dlg", "b.dlg"]);
    }

    #[test]
    fn test_list_log_files_rejects_missing_folder() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            list_log_files(&missing, "dlg"),
            Err(AnalysisError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_dlg_file_reads_poses() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "ligand.dlg", TWO_POSES);
        let poses = DlgFile::new(&path)
            .read_poses(&LogMarkers::default(), None)
            .unwrap();
        assert_eq!(poses.len(), 2);
        assert_eq!(poses[0].len(), 2);
        assert_eq!(poses[1][0].z, 1.0);
    }

    #[test]
    fn test_analyze_renders_named_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "ligand.dlg", TWO_POSES);
        let options = AnalysisOptions::new(dir.path());
        let sink = RecordingSink::default();

        let report = DlgFile::new(&path).analyze(&options, &sink).unwrap();
        assert_eq!(report.poses, 2);
        assert_eq!(report.atoms_per_pose, 2);
        assert_eq!(report.summary.unwrap().max, 1.0);
        assert!(report.warnings.is_empty());
        assert_eq!(
            report.output,
            dir.path().join("ligand.dlg_rmsd_distribution.png")
        );

        let calls = sink.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "Distribution of RMSD Values for ligand.dlg");
        assert_eq!(calls[0].1, 1);
    }

    #[test]
    fn test_batch_continues_after_failures() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a_good.dlg", TWO_POSES);
        write(dir.path(), "b_mismatch.dlg", MISMATCHED);
        write(dir.path(), "c_empty.dlg", "no docking output here\n");
        std::fs::write(dir.path().join("d_binary.dlg"), [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let options = AnalysisOptions::new(dir.path());
        let sink = RecordingSink::default();
        let report = process_folder(&options, &sink).unwrap();

        assert_eq!(report.total(), 4);
        assert!(report.has_failures());

        let processed: Vec<_> = report.processed.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(processed, vec!["a_good.dlg", "c_empty.dlg"]);
        assert_eq!(report.processed[1].warnings, vec![FileWarning::EmptyPoseSet]);
        assert!(report.processed[1].histogram.is_empty());

        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].file_name, "b_mismatch.dlg");
        assert!(matches!(
            report.failures[0].error,
            AnalysisError::ShapeMismatch {
                first: 0,
                second: 1,
                ..
            }
        ));
        assert_eq!(report.failures[1].file_name, "d_binary.dlg");
        assert!(matches!(report.failures[1].error, AnalysisError::Io { .. }));
    }

    #[test]
    fn test_single_pose_warns_no_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let single = "DOCKED: MODEL 1\nDOCKED: ATOM  1  1.000  2.000  3.000\n";
        let path = write(dir.path(), "single.dlg", single);
        let report = DlgFile::new(&path)
            .analyze(&AnalysisOptions::new(dir.path()), &RecordingSink::default())
            .unwrap();
        assert_eq!(report.warnings, vec![FileWarning::NoPosePairs]);
        assert!(report.summary.is_none());
    }

    #[test]
    fn test_parallel_batch_matches_sequential() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["one.dlg", "two.dlg", "three.dlg", "four.dlg"] {
            write(dir.path(), name, TWO_POSES);
        }

        let sequential = process_folder(&AnalysisOptions::new(dir.path()), &RecordingSink::default())
            .unwrap();
        let mut options = AnalysisOptions::new(dir.path());
        options.jobs = Some(3);
        let parallel = process_folder(&options, &RecordingSink::default()).unwrap();

        let names = |report: &BatchReport| {
            report
                .processed
                .iter()
                .map(|r| (r.file_name.clone(), r.summary))
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&sequential), names(&parallel));
    }

    #[test]
    fn test_batch_writes_svg_matrix_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        write(dir.path(), "ligand.dlg", TWO_POSES);

        let mut options = AnalysisOptions::new(dir.path());
        options.output_dir = Some(out.clone());
        options.write_matrix_csv = true;
        options.summary_csv = Some(out.join("summary.csv"));

        let report = process_folder(&options, &SvgHistogramPlotter::default()).unwrap();
        assert!(!report.has_failures());
        assert!(out.join("ligand.dlg_rmsd_distribution.svg").is_file());

        let matrix = std::fs::read_to_string(out.join("ligand.dlg_rmsd_matrix.csv")).unwrap();
        assert_eq!(matrix.lines().next(), Some("pose,1,2"));

        let summary = std::fs::read_to_string(out.join("summary.csv")).unwrap();
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines[0], "file,poses,atoms,pairs,min,max,mean,median,output");
        assert!(lines[1].starts_with("ligand.dlg,2,2,1,1.0,1.0,1.0,1.0,"));
    }

    #[test]
    fn test_unbinnable_rmsd_fails_only_that_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a_far.dlg", FAR_APART);
        write(dir.path(), "b_good.dlg", TWO_POSES);

        let sink = RecordingSink::default();
        let report = process_folder(&AnalysisOptions::new(dir.path()), &sink).unwrap();

        assert_eq!(report.processed.len(), 1);
        assert_eq!(report.processed[0].file_name, "b_good.dlg");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].file_name, "a_far.dlg");
        assert!(matches!(
            report.failures[0].error,
            AnalysisError::TooManyBins { .. }
        ));
        assert_eq!(sink.calls.lock().unwrap().len(), 1);
    }
}
