mod config;
pub mod plot;
mod reader;
pub mod types;

use std::path::Path;

// Re-export types
pub use config::SessionConfig;
pub use plot::{render, render_window, slice, Plot, PlotMode};
pub use reader::{base_identifier, segment_index, SegmentLoader, DEFAULT_SAMPLE_RATE};
pub use types::*;

/// Loads every segment of the recording `seed` belongs to, assuming the
/// default sampling rate of 100 Hz.
///
/// # Examples
///
/// ```no_run
/// use epg_importer::load;
///
/// let result = load("path/to/recording-ch4.D01");
/// match result {
///     Ok(series) => println!("Duration: {:.1} s", series.duration()),
///     Err(e) => println!("Error loading recording: {}", e),
/// }
/// ```
pub fn load<P: AsRef<Path>>(seed: P) -> Result<CombinedSeries> {
    load_with_rate(seed, DEFAULT_SAMPLE_RATE)
}

/// Like [`load`], with an explicit sampling rate in samples per second.
pub fn load_with_rate<P: AsRef<Path>>(seed: P, sample_rate: f64) -> Result<CombinedSeries> {
    SegmentLoader::default().build_combined_series(seed, sample_rate)
}

/// Loads a recording with the rate and segment order from `config`.
pub fn load_with_config<P: AsRef<Path>>(seed: P, config: &SessionConfig) -> Result<CombinedSeries> {
    config.validate()?;
    SegmentLoader::new(config.segment_order).build_combined_series(seed, config.sample_rate)
}
