//! Histogram rendering using plotters (SVG output)
//!
//! SVG keeps rendering free of system font dependencies.

use std::path::Path;

use plotters::prelude::*;

use crate::error::{AnalysisError, Result};
use crate::histogram::Histogram;

/// Destination for a rendered RMSD distribution
pub trait HistogramSink: Sync {
    /// Render `histogram` with the given title into `path`
    fn render(&self, title: &str, histogram: &Histogram, path: &Path) -> Result<()>;

    /// File extension of the artifacts this sink writes
    fn extension(&self) -> &str;
}

/// Writes histograms as SVG bar charts
#[derive(Debug, Clone)]
pub struct SvgHistogramPlotter {
    pub width: u32,
    pub height: u32,
}

impl Default for SvgHistogramPlotter {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

fn plot_error<E: std::fmt::Display>(error: E) -> AnalysisError {
    AnalysisError::Plot(error.to_string())
}

impl HistogramSink for SvgHistogramPlotter {
    fn render(&self, title: &str, histogram: &Histogram, path: &Path) -> Result<()> {
        let root = SVGBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(plot_error)?;

        if histogram.is_empty() {
            root.draw(&Text::new(
                "No RMSD values",
                (self.width as i32 / 2 - 60, self.height as i32 / 2),
                ("sans-serif", 20).into_font().color(&BLACK),
            ))
            .map_err(plot_error)?;
            root.present().map_err(plot_error)?;
            return Ok(());
        }

        let x_max = histogram.edges.last().copied().unwrap_or(histogram.bin_width);
        let y_max = (histogram.max_count() as f64 * 1.1).max(1.0);

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 20))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0.0..x_max, 0.0..y_max)
            .map_err(plot_error)?;

        chart
            .configure_mesh()
            .x_desc("RMSD (Å)")
            .y_desc("Frequency")
            .draw()
            .map_err(plot_error)?;

        for (lower, upper, count) in histogram.bins() {
            let corners = [(lower, 0.0), (upper, count as f64)];
            chart
                .draw_series(std::iter::once(Rectangle::new(corners, BLUE.filled())))
                .map_err(plot_error)?;
            chart
                .draw_series(std::iter::once(Rectangle::new(corners, BLACK.stroke_width(1))))
                .map_err(plot_error)?;
        }

        root.present().map_err(plot_error)?;
        Ok(())
    }

    fn extension(&self) -> &str {
        "svg"
    }
}
