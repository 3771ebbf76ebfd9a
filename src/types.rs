use ndarray::Array1;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One physical segment file of a recording.
///
/// Segments only live long enough to be appended into a [`CombinedSeries`].
#[derive(Debug, Clone)]
pub struct Segment {
    /// Absolute path of the file
    pub path: PathBuf,
    /// Ordinal index parsed from the `.D<digits>` suffix
    pub index: u64,
    /// Decoded samples, in file order
    pub samples: Vec<f32>,
}

impl Segment {
    /// Number of decoded samples in this segment.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

/// How discovered segment files are ordered before concatenation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentOrder {
    /// Plain file-name sort. Correct only for zero-padded suffixes:
    /// `D1, D2, D10` sorts as `D1, D10, D2`.
    #[default]
    Lexicographic,
    /// Sort by the numeric value of the suffix, so `D2` precedes `D10`.
    Numeric,
}

/// One row of the two-column time/signal table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Seconds since the start of the first segment
    pub time: f64,
    /// Raw amplitude as stored in the segment file
    pub signal: f32,
}

/// The continuous recording reconstructed from all segments.
///
/// Timestamps and amplitudes are held as two equally long columns. The series
/// cannot be mutated once built; windowing produces a new series.
///
/// # Examples
///
/// ```no_run
/// use epg_importer::load;
///
/// let series = load("recordings/plant3-ch4.D01").unwrap();
/// println!("{} samples, {:.1} s", series.len(), series.duration());
/// for (t, v) in series.iter().take(3) {
///     println!("{t:.2} s: {v}");
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedSeries {
    timestamps: Array1<f64>,
    amplitudes: Array1<f32>,
    sample_rate: f64,
    source_files: Vec<PathBuf>,
    segment_sample_counts: Vec<usize>,
}

impl CombinedSeries {
    pub(crate) fn from_parts(
        timestamps: Vec<f64>,
        amplitudes: Vec<f32>,
        sample_rate: f64,
        source_files: Vec<PathBuf>,
        segment_sample_counts: Vec<usize>,
    ) -> Self {
        debug_assert_eq!(timestamps.len(), amplitudes.len());
        CombinedSeries {
            timestamps: Array1::from(timestamps),
            amplitudes: Array1::from(amplitudes),
            sample_rate,
            source_files,
            segment_sample_counts,
        }
    }

    /// Builds a series from a time column and a signal column.
    ///
    /// Fails with [`EpgError::Schema`] when the columns differ in length or the
    /// time column is not finite and strictly increasing, and with
    /// [`EpgError::InvalidConfig`] when the rate is not a positive number.
    /// Tabular input carries no segment provenance.
    pub fn from_columns(timestamps: Vec<f64>, amplitudes: Vec<f32>, sample_rate: f64) -> Result<Self> {
        validate_sample_rate(sample_rate)?;
        if timestamps.len() != amplitudes.len() {
            return Err(EpgError::Schema(format!(
                "time column has {} rows but signal column has {}",
                timestamps.len(),
                amplitudes.len()
            )));
        }
        if let Some(row) = timestamps.iter().position(|t| !t.is_finite()) {
            return Err(EpgError::Schema(format!(
                "row {row}: time {} is not a finite number",
                timestamps[row]
            )));
        }
        if let Some(row) = timestamps.windows(2).position(|w| w[1] <= w[0]) {
            return Err(EpgError::Schema(format!(
                "row {}: time {} does not follow {}; the time column must be strictly increasing",
                row + 1,
                timestamps[row + 1],
                timestamps[row]
            )));
        }
        Ok(Self::from_parts(timestamps, amplitudes, sample_rate, Vec::new(), Vec::new()))
    }

    /// Parses a JSON array of `{"time": .., "signal": ..}` records.
    ///
    /// Every record must carry both numeric fields; anything else is a
    /// [`EpgError::Schema`] error naming the offending row.
    pub fn from_json_records(text: &str, sample_rate: f64) -> Result<Self> {
        let root: Value = serde_json::from_str(text)?;
        let rows = root
            .as_array()
            .ok_or_else(|| EpgError::Schema("expected a top-level array of records".to_string()))?;

        let mut timestamps = Vec::with_capacity(rows.len());
        let mut amplitudes = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let obj = row
                .as_object()
                .ok_or_else(|| EpgError::Schema(format!("record {i} is not an object")))?;
            timestamps.push(required_number(obj.get("time"), i, "time")?);
            amplitudes.push(required_number(obj.get("signal"), i, "signal")? as f32);
        }

        Self::from_columns(timestamps, amplitudes, sample_rate)
    }

    /// Serializes the series as a JSON array of `{"time", "signal"}` records.
    pub fn to_json_records(&self) -> Result<String> {
        let records: Vec<SampleRecord> = self
            .iter()
            .map(|(time, signal)| SampleRecord { time, signal })
            .collect();
        Ok(serde_json::to_string(&records)?)
    }

    /// Number of (timestamp, amplitude) pairs.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether the series holds no samples.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Recording length in seconds, `len / sample_rate`.
    pub fn duration(&self) -> f64 {
        self.len() as f64 / self.sample_rate
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn timestamps(&self) -> &Array1<f64> {
        &self.timestamps
    }

    pub fn amplitudes(&self) -> &Array1<f32> {
        &self.amplitudes
    }

    /// The pair at position `i`, if any.
    pub fn get(&self, i: usize) -> Option<(f64, f32)> {
        Some((*self.timestamps.get(i)?, *self.amplitudes.get(i)?))
    }

    /// Iterates over `(timestamp, amplitude)` pairs in time order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f32)> + '_ {
        self.timestamps
            .iter()
            .copied()
            .zip(self.amplitudes.iter().copied())
    }

    /// Segment files the series was stitched from, in concatenation order.
    /// Same length as [`segment_sample_counts`](Self::segment_sample_counts);
    /// both are empty for tabular input.
    pub fn source_files(&self) -> &[PathBuf] {
        &self.source_files
    }

    /// Sample count contributed by each source segment.
    pub fn segment_sample_counts(&self) -> &[usize] {
        &self.segment_sample_counts
    }

    /// Sub-series with every pair where `start <= t < start + duration`.
    pub fn slice(&self, start: f64, duration: f64) -> Result<CombinedSeries> {
        if !start.is_finite() {
            return Err(EpgError::InvalidConfig(format!(
                "window start must be finite, got {start}"
            )));
        }
        if !duration.is_finite() || duration < 0.0 {
            return Err(EpgError::InvalidConfig(format!(
                "window duration must be a non-negative number of seconds, got {duration}"
            )));
        }
        let end = start + duration;

        // Timestamps are sorted, so the window is one contiguous run.
        let ts = self.timestamps.as_slice().unwrap_or(&[]);
        let lo = ts.partition_point(|&t| t < start);
        let hi = ts.partition_point(|&t| t < end).max(lo);

        // Keep only the segments the window overlaps, with their share of samples.
        let mut source_files = Vec::new();
        let mut segment_sample_counts = Vec::new();
        let mut seg_start = 0;
        for (path, &count) in self.source_files.iter().zip(&self.segment_sample_counts) {
            let seg_end = seg_start + count;
            let overlap = seg_end.min(hi).saturating_sub(seg_start.max(lo));
            if overlap > 0 {
                source_files.push(path.clone());
                segment_sample_counts.push(overlap);
            }
            seg_start = seg_end;
        }

        Ok(CombinedSeries {
            timestamps: self.timestamps.slice(ndarray::s![lo..hi]).to_owned(),
            amplitudes: self.amplitudes.slice(ndarray::s![lo..hi]).to_owned(),
            sample_rate: self.sample_rate,
            source_files,
            segment_sample_counts,
        })
    }
}

fn required_number(value: Option<&Value>, row: usize, field: &str) -> Result<f64> {
    match value {
        None => Err(EpgError::Schema(format!(
            "record {row} is missing required field '{field}'"
        ))),
        Some(v) => v.as_f64().ok_or_else(|| {
            EpgError::Schema(format!("record {row}: field '{field}' is not a number"))
        }),
    }
}

pub(crate) fn validate_sample_rate(sample_rate: f64) -> Result<()> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(())
    } else {
        Err(EpgError::InvalidConfig(format!(
            "sampling rate must be a positive number of samples per second, got {sample_rate}"
        )))
    }
}

/// Errors produced while loading, windowing or plotting a recording.
///
/// Every error aborts the operation that raised it; nothing is retried and no
/// partial series is returned.
#[derive(Debug, Error)]
pub enum EpgError {
    /// The seed file does not exist
    #[error("segment file not found: {}", path.display())]
    NotFound { path: PathBuf },
    /// No file in the directory carries the seed's base name and a `.D<digits>` suffix
    #[error("no segment files named '{base}.D<digits>' in {}", dir.display())]
    NoMatch { dir: PathBuf, base: String },
    /// The file does not have the header/payload layout of a segment
    #[error("corrupt segment {}: {reason}", path.display())]
    CorruptSegment { path: PathBuf, reason: String },
    /// A sampling rate, plot mode or window parameter is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Tabular input lacks the `time`/`signal` columns
    #[error("schema error: {0}")]
    Schema(String),
    /// An I/O error occurred while reading the given path
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EpgError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        EpgError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EpgError>;
