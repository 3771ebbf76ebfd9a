use byteorder::{ByteOrder, LittleEndian};
use log::{debug, info, warn};
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Instant;

use crate::types::*;

// Constants describing the segment file layout
const HEADER_LINES: usize = 3;
const BYTES_PER_SAMPLE: usize = 4;
const READ_BUFFER_SIZE: usize = 65536;

/// Sampling rate assumed when the caller does not supply one (samples per second).
pub const DEFAULT_SAMPLE_RATE: f64 = 100.0;

/// Matches the `.D<digits>` suffix that numbers the segments of one recording.
fn segment_suffix() -> &'static Regex {
    static SUFFIX: OnceLock<Regex> = OnceLock::new();
    SUFFIX.get_or_init(|| Regex::new(r"\.D(\d+)$").expect("segment suffix pattern is valid"))
}

/// Strips the trailing `.D<digits>` suffix from a file name.
///
/// A name without the suffix is returned unchanged.
pub fn base_identifier(file_name: &str) -> &str {
    match segment_suffix().find(file_name) {
        Some(m) => &file_name[..m.start()],
        None => file_name,
    }
}

/// Parses the ordinal index out of a `.D<digits>` suffix.
pub fn segment_index(file_name: &str) -> Option<u64> {
    segment_suffix()
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().parse().ok())
}

fn suffix_width(file_name: &str) -> Option<usize> {
    segment_suffix()
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .map(|digits| digits.as_str().len())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Discovers, decodes and stitches the segment files of one recording.
///
/// The loader holds no state besides the ordering policy, so one value can be
/// reused for any number of recordings.
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentLoader {
    order: SegmentOrder,
}

impl SegmentLoader {
    pub fn new(order: SegmentOrder) -> Self {
        SegmentLoader { order }
    }

    pub fn order(&self) -> SegmentOrder {
        self.order
    }

    /// Finds every segment file that belongs to the same recording as `seed`.
    ///
    /// The seed's directory is scanned (non-recursively) for regular files named
    /// `<base>.D<digits>`, where `<base>` is the seed's name without its own
    /// suffix. Returned paths are absolute and ordered according to the loader's
    /// [`SegmentOrder`].
    ///
    /// # Errors
    ///
    /// * [`EpgError::NotFound`] if `seed` does not exist
    /// * [`EpgError::NoMatch`] if no file in the directory matches
    pub fn discover_segments<P: AsRef<Path>>(&self, seed: P) -> Result<Vec<PathBuf>> {
        let seed = seed.as_ref();
        if !seed.exists() {
            return Err(EpgError::NotFound {
                path: seed.to_path_buf(),
            });
        }

        // The seed itself may be a link into another recording, so only its
        // directory is resolved; the name is taken as given.
        let absolute = std::path::absolute(seed).map_err(|e| EpgError::io(seed, e))?;
        let parent = absolute.parent().unwrap_or_else(|| Path::new("/"));
        let dir = fs::canonicalize(parent).map_err(|e| EpgError::io(parent, e))?;
        let seed_name = file_name_of(&absolute);
        let base = base_identifier(&seed_name).to_string();
        debug!("Scanning {} for segments of '{}'", dir.display(), base);

        let mut matches = BTreeSet::new();
        for entry in fs::read_dir(&dir).map_err(|e| EpgError::io(&dir, e))? {
            let entry = entry.map_err(|e| EpgError::io(&dir, e))?;
            let path = entry.path();
            let name = file_name_of(&path);

            if !segment_suffix().is_match(&name) || base_identifier(&name) != base {
                continue;
            }
            if !path.is_file() {
                debug!("Skipping non-file entry {}", path.display());
                continue;
            }
            matches.insert(path);
        }

        if matches.is_empty() {
            return Err(EpgError::NoMatch { dir, base });
        }

        let mut segments: Vec<PathBuf> = matches.into_iter().collect();
        match self.order {
            SegmentOrder::Lexicographic => {
                let widths: HashSet<usize> = segments
                    .iter()
                    .filter_map(|p| suffix_width(&file_name_of(p)))
                    .collect();
                if widths.len() > 1 {
                    warn!(
                        "Segment suffixes of '{}' are not zero-padded to one width; \
                         lexicographic order may not match recording order",
                        base
                    );
                }
            }
            SegmentOrder::Numeric => {
                // Stable sort keeps the lexicographic order among equal indices.
                segments.sort_by_key(|p| segment_index(&file_name_of(p)).unwrap_or(u64::MAX));
            }
        }

        debug!("Found {} segment(s) for '{}'", segments.len(), base);
        Ok(segments)
    }

    /// Decodes the samples of one segment file.
    ///
    /// The first three newline-terminated lines are a text header and are
    /// skipped unread. Every remaining byte belongs to a packed array of
    /// little-endian `f32` samples.
    ///
    /// # Errors
    ///
    /// * [`EpgError::CorruptSegment`] if the header is cut short or the payload
    ///   length is not a multiple of four bytes
    /// * [`EpgError::Io`] on any read failure
    pub fn decode_segment<P: AsRef<Path>>(&self, path: P) -> Result<Vec<f32>> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| EpgError::io(path, e))?;
        let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);

        skip_header(&mut reader, path)?;

        let mut payload = Vec::new();
        reader
            .read_to_end(&mut payload)
            .map_err(|e| EpgError::io(path, e))?;

        if payload.len() % BYTES_PER_SAMPLE != 0 {
            return Err(EpgError::CorruptSegment {
                path: path.to_path_buf(),
                reason: format!(
                    "payload of {} bytes is not a whole number of 4-byte samples",
                    payload.len()
                ),
            });
        }

        let mut samples = vec![0.0f32; payload.len() / BYTES_PER_SAMPLE];
        LittleEndian::read_f32_into(&payload, &mut samples);
        Ok(samples)
    }

    /// Reads one segment file into a [`Segment`].
    pub fn read_segment<P: AsRef<Path>>(&self, path: P) -> Result<Segment> {
        let path = path.as_ref();
        let samples = self.decode_segment(path)?;
        let index = segment_index(&file_name_of(path)).unwrap_or_default();
        Ok(Segment {
            path: path.to_path_buf(),
            index,
            samples,
        })
    }

    /// Loads every segment of the recording `seed` belongs to and stitches them
    /// into one continuous series.
    ///
    /// Sample `i` of the concatenation is stamped `i / sample_rate` seconds, so
    /// each segment starts exactly where the previous one ended. Segments are
    /// read one at a time in discovery order; the first failure aborts the load.
    ///
    /// # Errors
    ///
    /// * [`EpgError::InvalidConfig`] if `sample_rate` is not a positive number
    /// * any error of [`discover_segments`](Self::discover_segments) or
    ///   [`decode_segment`](Self::decode_segment)
    pub fn build_combined_series<P: AsRef<Path>>(
        &self,
        seed: P,
        sample_rate: f64,
    ) -> Result<CombinedSeries> {
        validate_sample_rate(sample_rate)?;
        let tic = Instant::now();

        let paths = self.discover_segments(seed)?;
        let num_segments = paths.len();

        let mut timestamps = Vec::new();
        let mut amplitudes = Vec::new();
        let mut counts = Vec::with_capacity(num_segments);
        let mut offset: usize = 0;

        for (k, path) in paths.iter().enumerate() {
            let segment = self.read_segment(path)?;
            let n = segment.sample_count();
            let start_time = offset as f64 / sample_rate;

            info!(
                "Segment {}/{} (D{}): {} - {} samples starting at {:.3} s",
                k + 1,
                num_segments,
                segment.index,
                path.display(),
                n,
                start_time
            );

            // Stamp from the absolute sample number so no error accumulates.
            timestamps.extend((offset..offset + n).map(|i| i as f64 / sample_rate));
            amplitudes.extend_from_slice(&segment.samples);
            counts.push(n);
            offset += n;
        }

        let series = CombinedSeries::from_parts(timestamps, amplitudes, sample_rate, paths, counts);
        info!(
            "Combined {} segment(s): {} samples, {:.2} seconds (loaded in {:.1} s)",
            num_segments,
            series.len(),
            series.duration(),
            tic.elapsed().as_secs_f64()
        );
        Ok(series)
    }
}

/// Consumes the fixed text header, failing if the file ends inside it.
fn skip_header<R: BufRead>(reader: &mut R, path: &Path) -> Result<()> {
    let mut line = Vec::new();
    for line_no in 1..=HEADER_LINES {
        line.clear();
        reader
            .read_until(b'\n', &mut line)
            .map_err(|e| EpgError::io(path, e))?;
        if line.last() != Some(&b'\n') {
            return Err(EpgError::CorruptSegment {
                path: path.to_path_buf(),
                reason: format!(
                    "truncated header: file ends in header line {line_no} of {HEADER_LINES}"
                ),
            });
        }
    }
    Ok(())
}
