use clap::{Parser, Subcommand};
use dlg_rmsd_rs::logging::setup_logging;
use dlg_rmsd_rs::poses::{DEFAULT_ATOM_MARKER, DEFAULT_MODEL_MARKER};
use dlg_rmsd_rs::{
    compute_rmsd_matrix, process_folder, AnalysisOptions, DlgFile, DockingLog, LogMarkers,
    SvgHistogramPlotter,
};
use std::path::PathBuf;
use tracing::{debug, info};

/// Command-line tool for comparing docked poses in AutoDock log files
#[derive(Parser, Debug)]
#[command(name = "dlg-rmsd")]
#[command(about = "Pairwise RMSD distributions of docked poses in .dlg files", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress logging and progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render an RMSD distribution for every docking log in a folder
    Analyze {
        /// Folder containing the docking logs
        #[arg(env = "DLG_RMSD_FOLDER")]
        folder: PathBuf,

        /// File extension of docking logs (default: dlg)
        #[arg(short, long, default_value = "dlg")]
        extension: String,

        /// Histogram bin width in Ångström (default: 0.5)
        #[arg(short, long, default_value_t = 0.5)]
        bin_width: f64,

        /// Directory for output artifacts (default: the input folder)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Also save each full RMSD matrix as CSV
        #[arg(long)]
        matrix_csv: bool,

        /// Save a per-file summary CSV to this path
        #[arg(long)]
        summary_csv: Option<PathBuf>,

        /// Number of files processed concurrently (default: 1)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Maximum number of poses read per file (default: all poses)
        #[arg(long)]
        max_poses: Option<usize>,

        /// Substring marking the start of a pose
        #[arg(long, default_value = DEFAULT_MODEL_MARKER)]
        model_marker: String,

        /// Substring marking an atom coordinate record
        #[arg(long, default_value = DEFAULT_ATOM_MARKER)]
        atom_marker: String,
    },

    /// Print the poses and RMSD matrix of a single docking log
    Inspect {
        /// Path to the docking log
        file: PathBuf,

        /// Maximum number of poses to read (default: all poses)
        #[arg(long)]
        max_poses: Option<usize>,

        /// Substring marking the start of a pose
        #[arg(long, default_value = DEFAULT_MODEL_MARKER)]
        model_marker: String,

        /// Substring marking an atom coordinate record
        #[arg(long, default_value = DEFAULT_ATOM_MARKER)]
        atom_marker: String,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        eprintln!("❌ Error setting up logging: {}", e);
        std::process::exit(1);
    }
    debug!("Parsed arguments: {:?}", cli);

    match cli.command {
        Commands::Analyze {
            folder,
            extension,
            bin_width,
            output_dir,
            matrix_csv,
            summary_csv,
            jobs,
            max_poses,
            model_marker,
            atom_marker,
        } => {
            println!("Analyzing docking logs in: {:?}", folder);
            println!("Bin width: {}", bin_width);

            let options = AnalysisOptions {
                folder,
                extension,
                bin_width,
                markers: LogMarkers {
                    model: model_marker,
                    atom: atom_marker,
                },
                max_poses,
                output_dir,
                write_matrix_csv: matrix_csv,
                summary_csv,
                jobs,
                show_progress: !cli.quiet,
            };

            let report = match process_folder(&options, &SvgHistogramPlotter::default()) {
                Ok(report) => report,
                Err(e) => {
                    eprintln!("❌ Error processing folder: {}", e);
                    std::process::exit(1);
                }
            };

            for file in &report.processed {
                match &file.summary {
                    Some(summary) => println!(
                        "✅ {}: {} poses, {} pairs, RMSD mean {:.3} / max {:.3}",
                        file.file_name, file.poses, summary.pairs, summary.mean, summary.max
                    ),
                    None => println!(
                        "⚠️  {}: {} poses, no RMSD pairs ({:?})",
                        file.file_name, file.poses, file.warnings
                    ),
                }
                println!("📄 Histogram saved to: {:?}", file.output);
            }

            for failure in &report.failures {
                eprintln!("❌ {}: {}", failure.file_name, failure.error);
            }

            info!(
                "{} of {} files processed",
                report.processed.len(),
                report.total()
            );
            if report.has_failures() {
                std::process::exit(1);
            }
        }

        Commands::Inspect {
            file,
            max_poses,
            model_marker,
            atom_marker,
        } => {
            println!("Reading docking log: {:?}", file);

            let log = DlgFile::new(&file);
            let markers = LogMarkers {
                model: model_marker,
                atom: atom_marker,
            };
            let poses = match log.read_poses(&markers, max_poses) {
                Ok(poses) => poses,
                Err(e) => {
                    eprintln!("❌ Error reading docking log: {}", e);
                    std::process::exit(1);
                }
            };
            println!(
                "✅ Extracted {} poses ({} atoms in the first pose)",
                poses.len(),
                poses.first().map(Vec::len).unwrap_or(0)
            );

            let matrix = match compute_rmsd_matrix(&poses) {
                Ok(matrix) => matrix,
                Err(e) => {
                    eprintln!("❌ Error computing RMSD matrix: {}", e);
                    std::process::exit(1);
                }
            };

            for i in 0..matrix.len() {
                let row = matrix
                    .row(i)
                    .iter()
                    .map(|value| format!("{:7.3}", value))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("{:>4} {}", i + 1, row);
            }

            if let Some(summary) = matrix.summary() {
                println!(
                    "RMSD over {} pairs: min {:.3}, median {:.3}, mean {:.3}, max {:.3}",
                    summary.pairs, summary.min, summary.median, summary.mean, summary.max
                );
            }
        }
    }
}
