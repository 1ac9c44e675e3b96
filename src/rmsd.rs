use std::ops::Index;
use std::path::Path;

use serde::Serialize;

use crate::error::{AnalysisError, Result};
use crate::structure::Coordinate;

/// Symmetric pairwise RMSD matrix with a zero diagonal
#[derive(Debug, Clone, PartialEq)]
pub struct RmsdMatrix {
    size: usize,
    values: Vec<f64>,
}

/// Distribution statistics over the upper triangle of an [`RmsdMatrix`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RmsdSummary {
    pub pairs: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

impl RmsdMatrix {
    fn zeros(size: usize) -> Self {
        Self {
            size,
            values: vec![0.0; size * size],
        }
    }

    /// Number of poses (rows and columns)
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i < self.size && j < self.size {
            Some(self.values[i * self.size + j])
        } else {
            None
        }
    }

    fn set_pair(&mut self, i: usize, j: usize, value: f64) {
        self.values[i * self.size + j] = value;
        self.values[j * self.size + i] = value;
    }

    /// Row `i` of the matrix
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.size..(i + 1) * self.size]
    }

    /// Entries with `i < j`, row by row
    pub fn upper_triangle(&self) -> Vec<f64> {
        let mut values = Vec::with_capacity(self.size * self.size.saturating_sub(1) / 2);
        for i in 0..self.size {
            values.extend_from_slice(&self.row(i)[i + 1..]);
        }
        values
    }

    /// Statistics of the upper triangle, or `None` when there are no pairs
    pub fn summary(&self) -> Option<RmsdSummary> {
        let mut values = self.upper_triangle();
        if values.is_empty() {
            return None;
        }

        values.sort_by(|a, b| a.total_cmp(b));
        let pairs = values.len();
        let mean = values.iter().sum::<f64>() / pairs as f64;
        let median = if pairs % 2 == 0 {
            (values[pairs / 2 - 1] + values[pairs / 2]) / 2.0
        } else {
            values[pairs / 2]
        };

        Some(RmsdSummary {
            pairs,
            min: values[0],
            max: values[pairs - 1],
            mean,
            median,
        })
    }
}

impl Index<(usize, usize)> for RmsdMatrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        assert!(
            i < self.size && j < self.size,
            "index ({}, {}) out of bounds for {}x{} RMSD matrix",
            i,
            j,
            self.size,
            self.size
        );
        &self.values[i * self.size + j]
    }
}

/// RMSD between two poses compared atom by atom in file order.
///
/// No superposition is applied. Poses without atoms have an RMSD of 0.
pub fn pose_rmsd(a: &[Coordinate], b: &[Coordinate]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(AnalysisError::ShapeMismatch {
            first: 0,
            second: 1,
            first_len: a.len(),
            second_len: b.len(),
        });
    }
    Ok(rmsd_unchecked(a, b))
}

fn rmsd_unchecked(a: &[Coordinate], b: &[Coordinate]) -> f64 {
    if a.is_empty() {
        return 0.0;
    }
    let sum_of_squares: f64 = a
        .iter()
        .zip(b)
        .map(|(p, q)| p.squared_distance_to(q))
        .sum();
    (sum_of_squares / a.len() as f64).sqrt()
}

/// Compute the full pairwise RMSD matrix of a pose set.
///
/// Every pose must have the same number of atoms as the first one;
/// the first pose that differs is reported as a shape mismatch.
pub fn compute_rmsd_matrix<P: AsRef<[Coordinate]>>(poses: &[P]) -> Result<RmsdMatrix> {
    if let Some(first) = poses.first() {
        let expected = first.as_ref().len();
        if let Some((index, pose)) = poses
            .iter()
            .enumerate()
            .find(|(_, pose)| pose.as_ref().len() != expected)
        {
            return Err(AnalysisError::ShapeMismatch {
                first: 0,
                second: index,
                first_len: expected,
                second_len: pose.as_ref().len(),
            });
        }
    }

    let mut matrix = RmsdMatrix::zeros(poses.len());
    for i in 0..poses.len() {
        for j in (i + 1)..poses.len() {
            let rmsd = rmsd_unchecked(poses[i].as_ref(), poses[j].as_ref());
            matrix.set_pair(i, j, rmsd);
        }
    }

    Ok(matrix)
}

/// Save the full matrix to a CSV file, one row per pose (1-based labels)
pub fn save_matrix_to_csv(matrix: &RmsdMatrix, output_path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(output_path)?;

    let mut header = vec!["pose".to_string()];
    header.extend((1..=matrix.len()).map(|n| n.to_string()));
    writer.write_record(&header)?;

    for i in 0..matrix.len() {
        let mut row = vec![(i + 1).to_string()];
        row.extend(matrix.row(i).iter().map(|value| value.to_string()));
        writer.write_record(&row)?;
    }

    writer
        .flush()
        .map_err(|e| AnalysisError::io(output_path, e))?;

    Ok(())
}
