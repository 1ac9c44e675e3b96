use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList, PyTuple};

use crate::batch::{process_folder as run_folder, AnalysisOptions, DlgFile, DockingLog};
use crate::plot::SvgHistogramPlotter;
use crate::poses::LogMarkers;
use crate::rmsd::compute_rmsd_matrix;
use crate::structure::PoseSet;

fn read_file_poses(log_file: &str) -> PyResult<PoseSet> {
    DlgFile::new(log_file)
        .read_poses(&LogMarkers::default(), None)
        .map_err(|e| PyErr::new::<pyo3::exceptions::PyIOError, _>(format!("Failed to read poses: {}", e)))
}

/// Python binding returning the poses of a docking log as lists of (x, y, z) tuples
#[pyfunction]
fn extract_poses(py: Python<'_>, log_file: &str) -> PyResult<PyObject> {
    let poses = read_file_poses(log_file)?;

    let py_poses = PyList::empty_bound(py);
    for pose in &poses {
        let py_pose = PyList::empty_bound(py);
        for atom in pose {
            let py_atom = PyTuple::new_bound(py, &[atom.x, atom.y, atom.z]);
            py_pose.append(py_atom)?;
        }
        py_poses.append(py_pose)?;
    }

    Ok(py_poses.into())
}

/// Python binding returning the pairwise RMSD matrix of a docking log as a list of rows
#[pyfunction]
fn rmsd_matrix(py: Python<'_>, log_file: &str) -> PyResult<PyObject> {
    let poses = read_file_poses(log_file)?;
    let matrix = compute_rmsd_matrix(&poses)
        .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("Failed to compute RMSD: {}", e)))?;

    let py_rows = PyList::empty_bound(py);
    for i in 0..matrix.len() {
        py_rows.append(PyList::new_bound(py, matrix.row(i)))?;
    }

    Ok(py_rows.into())
}

/// Python binding for the folder batch: renders histograms and returns per-file results
#[pyfunction]
#[pyo3(signature = (folder, bin_width=0.5, extension="dlg"))]
fn process_folder(
    py: Python<'_>,
    folder: &str,
    bin_width: f64,
    extension: &str,
) -> PyResult<PyObject> {
    let mut options = AnalysisOptions::new(folder);
    options.bin_width = bin_width;
    options.extension = extension.to_string();

    let report = run_folder(&options, &SvgHistogramPlotter::default())
        .map_err(|e| PyErr::new::<pyo3::exceptions::PyIOError, _>(format!("Failed to process folder: {}", e)))?;

    let py_processed = PyList::empty_bound(py);
    for file in &report.processed {
        let py_dict = PyDict::new_bound(py);
        py_dict.set_item("file", &file.file_name)?;
        py_dict.set_item("poses", file.poses)?;
        py_dict.set_item("atoms", file.atoms_per_pose)?;
        py_dict.set_item("output", file.output.to_string_lossy().to_string())?;
        if let Some(summary) = &file.summary {
            py_dict.set_item("pairs", summary.pairs)?;
            py_dict.set_item("min", summary.min)?;
            py_dict.set_item("max", summary.max)?;
            py_dict.set_item("mean", summary.mean)?;
            py_dict.set_item("median", summary.median)?;
        }
        py_processed.append(py_dict)?;
    }

    let py_failures = PyDict::new_bound(py);
    for failure in &report.failures {
        py_failures.set_item(&failure.file_name, failure.error.to_string())?;
    }

    let py_result = PyDict::new_bound(py);
    py_result.set_item("processed", py_processed)?;
    py_result.set_item("failures", py_failures)?;

    Ok(py_result.into())
}

/// Python module definition
#[pymodule]
fn dlg_rmsd_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(extract_poses, m)?)?;
    m.add_function(wrap_pyfunction!(rmsd_matrix, m)?)?;
    m.add_function(wrap_pyfunction!(process_folder, m)?)?;
    m.add("__doc__", "Docking pose RMSD library with Python bindings")?;
    Ok(())
}
