use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::config::SessionConfig;
use crate::types::{CombinedSeries, EpgError, Result};

pub const TIME_AXIS_LABEL: &str = "Time (s)";
pub const SIGNAL_AXIS_LABEL: &str = "Signal";

/// How samples are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotMode {
    /// Consecutive samples joined by a polyline
    #[default]
    Line,
    /// One marker per sample
    Scatter,
}

impl FromStr for PlotMode {
    type Err = EpgError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "line" => Ok(PlotMode::Line),
            "scatter" => Ok(PlotMode::Scatter),
            other => Err(EpgError::InvalidConfig(format!(
                "unsupported plot mode '{other}', expected 'line' or 'scatter'"
            ))),
        }
    }
}

impl fmt::Display for PlotMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PlotMode::Line => write!(f, "line"),
            PlotMode::Scatter => write!(f, "scatter"),
        }
    }
}

/// A ready-to-draw description of a time/signal plot.
///
/// Building a `Plot` never writes anything; call [`save_json`](Plot::save_json)
/// to persist it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plot {
    pub title: String,
    pub mode: PlotMode,
    pub x_label: String,
    pub y_label: String,
    /// `[time, amplitude]` pairs in time order
    pub points: Vec<[f64; 2]>,
}

impl Plot {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Smallest and largest `(time, amplitude)` over all points, or `None`
    /// for an empty plot.
    pub fn bounds(&self) -> Option<([f64; 2], [f64; 2])> {
        let first = *self.points.first()?;
        let (min, max) = self.points.iter().fold((first, first), |(lo, hi), p| {
            (
                [lo[0].min(p[0]), lo[1].min(p[1])],
                [hi[0].max(p[0]), hi[1].max(p[1])],
            )
        });
        Some((min, max))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Writes the plot description to `path` as JSON.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let text = self.to_json()?;
        fs::write(path, text).map_err(|e| EpgError::io(path, e))
    }
}

/// Pairs of `series` with `start <= t < start + duration`.
pub fn slice(series: &CombinedSeries, start: f64, duration: f64) -> Result<CombinedSeries> {
    series.slice(start, duration)
}

/// Builds a plot of the whole series with the "Time (s)" / "Signal" axes.
pub fn render(series: &CombinedSeries, mode: PlotMode, title: &str) -> Plot {
    Plot {
        title: title.to_string(),
        mode,
        x_label: TIME_AXIS_LABEL.to_string(),
        y_label: SIGNAL_AXIS_LABEL.to_string(),
        points: series.iter().map(|(t, v)| [t, v as f64]).collect(),
    }
}

/// Slices the configured window out of `series` and renders it in the
/// configured mode.
pub fn render_window(series: &CombinedSeries, config: &SessionConfig, title: &str) -> Result<Plot> {
    config.validate()?;
    let window = series.slice(config.window_start, config.window_duration)?;
    log::debug!(
        "Rendering {} of {} samples ({:.2} s from {:.2} s) as {}",
        window.len(),
        series.len(),
        config.window_duration,
        config.window_start,
        config.plot_mode
    );
    Ok(render(&window, config.plot_mode, title))
}
