use crate::error::{AnalysisError, Result};

/// Default bin width for RMSD distributions, in Ångström
pub const DEFAULT_BIN_WIDTH: f64 = 0.5;

/// Upper bound on the number of bins in one histogram
pub const MAX_BINS: usize = 10_000;

/// Fixed-width histogram anchored at zero.
///
/// Bins are `[edges[k], edges[k + 1])`, except the last one which also
/// includes its right edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub bin_width: f64,
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bin non-negative samples starting at 0.
    ///
    /// Edges run `0, w, 2w, ...` while below `max + w`, so the largest
    /// sample always falls inside the last bin.
    pub fn from_values(values: &[f64], bin_width: f64) -> Result<Self> {
        if !bin_width.is_finite() || bin_width <= 0.0 {
            return Err(AnalysisError::InvalidBinWidth(bin_width));
        }

        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if max == f64::INFINITY {
            return Err(AnalysisError::TooManyBins { max, bin_width });
        }
        if values.is_empty() || !max.is_finite() {
            return Ok(Self {
                bin_width,
                edges: Vec::new(),
                counts: Vec::new(),
            });
        }

        let raw_edges = ((max + bin_width) / bin_width).ceil();
        if !raw_edges.is_finite() || raw_edges > (MAX_BINS + 1) as f64 {
            return Err(AnalysisError::TooManyBins { max, bin_width });
        }
        // At least one bin, even when every sample is zero
        let edge_count = (raw_edges as usize).max(2);
        let edges: Vec<f64> = (0..edge_count).map(|k| k as f64 * bin_width).collect();
        let bin_count = edge_count - 1;

        let mut counts = vec![0usize; bin_count];
        for &value in values {
            if value < 0.0 || !value.is_finite() {
                continue;
            }
            let bin = ((value / bin_width).floor() as usize).min(bin_count - 1);
            counts[bin] += 1;
        }

        Ok(Self {
            bin_width,
            edges,
            counts,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total number of binned samples
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Highest bin count, 0 for an empty histogram
    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Iterate over `(lower edge, upper edge, count)` per bin
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, usize)> + '_ {
        self.edges
            .windows(2)
            .zip(&self.counts)
            .map(|(edge, &count)| (edge[0], edge[1], count))
    }
}
