use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::plot::PlotMode;
use crate::reader::DEFAULT_SAMPLE_RATE;
use crate::types::{validate_sample_rate, EpgError, Result, SegmentOrder};

const DEFAULT_WINDOW_START: f64 = 0.0;
const DEFAULT_WINDOW_DURATION: f64 = 10.0;

/// Settings for one analysis session: how to load a recording and which part
/// of it to plot.
///
/// Missing keys take their defaults, so `{}` is a valid configuration:
///
/// ```
/// use epg_importer::{PlotMode, SessionConfig};
///
/// let config = SessionConfig::from_json_str(r#"{"plot_mode": "scatter"}"#).unwrap();
/// assert_eq!(config.sample_rate, 100.0);
/// assert_eq!(config.plot_mode, PlotMode::Scatter);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionConfig {
    /// Samples per second, shared by every segment
    pub sample_rate: f64,
    pub plot_mode: PlotMode,
    /// First second of the plotted window
    pub window_start: f64,
    /// Length of the plotted window in seconds
    pub window_duration: f64,
    pub segment_order: SegmentOrder,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            plot_mode: PlotMode::Line,
            window_start: DEFAULT_WINDOW_START,
            window_duration: DEFAULT_WINDOW_DURATION,
            segment_order: SegmentOrder::default(),
        }
    }
}

// Plot mode stays a string here so an unknown mode reports as a configuration
// error rather than a JSON error.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawSessionConfig {
    #[serde(alias = "sampling_rate")]
    sample_rate: Option<f64>,
    plot_mode: Option<String>,
    window_start: Option<f64>,
    window_duration: Option<f64>,
    segment_order: Option<SegmentOrder>,
}

impl SessionConfig {
    /// Parses a JSON object, filling absent keys with defaults, then validates.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let raw: RawSessionConfig = serde_json::from_str(text)?;
        let defaults = Self::default();

        let config = Self {
            sample_rate: raw.sample_rate.unwrap_or(defaults.sample_rate),
            plot_mode: match raw.plot_mode {
                Some(mode) => mode.parse()?,
                None => defaults.plot_mode,
            },
            window_start: raw.window_start.unwrap_or(defaults.window_start),
            window_duration: raw.window_duration.unwrap_or(defaults.window_duration),
            segment_order: raw.segment_order.unwrap_or(defaults.segment_order),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| EpgError::io(path, e))?;
        Self::from_json_str(&text)
    }

    /// Checks the rate and the plot window.
    pub fn validate(&self) -> Result<()> {
        validate_sample_rate(self.sample_rate)?;
        if !self.window_start.is_finite() {
            return Err(EpgError::InvalidConfig(format!(
                "window_start must be finite, got {}",
                self.window_start
            )));
        }
        if !self.window_duration.is_finite() || self.window_duration < 0.0 {
            return Err(EpgError::InvalidConfig(format!(
                "window_duration must be a non-negative number of seconds, got {}",
                self.window_duration
            )));
        }
        Ok(())
    }
}
