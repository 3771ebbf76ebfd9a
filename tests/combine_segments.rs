use epg_importer::{
    load, load_with_config, load_with_rate, render, slice, EpgError, PlotMode, SegmentLoader,
    SegmentOrder, SessionConfig,
};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_segment(dir: &Path, name: &str, samples: &[f32]) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();
    file.write_all(b"Stylet+ export\nrec channel 1\n2024-06-01 09:00:00\n")
        .unwrap();
    for s in samples {
        file.write_all(&s.to_le_bytes()).unwrap();
    }
    path
}

/// Writes `sizes.len()` zero-padded segments of a recording named `rec`.
fn write_recording(dir: &Path, sizes: &[usize]) -> PathBuf {
    let mut value = 0.0f32;
    for (k, &n) in sizes.iter().enumerate() {
        let samples: Vec<f32> = (0..n)
            .map(|_| {
                value += 1.0;
                value
            })
            .collect();
        write_segment(dir, &format!("rec.D{:02}", k + 1), &samples);
    }
    dir.join("rec.D01")
}

#[test]
fn two_segments_at_two_hertz() {
    let dir = TempDir::new().unwrap();
    write_segment(dir.path(), "rec.D01", &[1.0, 2.0, 3.0, 4.0]);
    write_segment(dir.path(), "rec.D02", &[5.0, 6.0]);

    let series = load_with_rate(dir.path().join("rec.D02"), 2.0).unwrap();
    let pairs: Vec<(f64, f32)> = series.iter().collect();
    assert_eq!(
        pairs,
        vec![(0.0, 1.0), (0.5, 2.0), (1.0, 3.0), (1.5, 4.0), (2.0, 5.0), (2.5, 6.0)]
    );
    assert_eq!(series.segment_sample_counts(), &[4, 2]);
    assert_eq!(series.source_files().len(), 2);
    assert_eq!(series.duration(), 3.0);

    let window = slice(&series, 1.0, 1.0).unwrap();
    let pairs: Vec<(f64, f32)> = window.iter().collect();
    assert_eq!(pairs, vec![(1.0, 3.0), (1.5, 4.0)]);
}

#[test]
fn spacing_is_constant_across_segment_boundaries() {
    for (sizes, rate) in [
        (vec![7usize, 3, 12], 4.0),
        (vec![1, 1, 1, 1], 100.0),
        (vec![250, 99, 1000, 3], 30.0),
    ] {
        let dir = TempDir::new().unwrap();
        let seed = write_recording(dir.path(), &sizes);
        let series = load_with_rate(&seed, rate).unwrap();

        assert_eq!(series.len(), sizes.iter().sum::<usize>());
        let ts = series.timestamps();
        assert_eq!(ts[0], 0.0);
        for w in ts.windows(2) {
            let step = w[1] - w[0];
            assert!(step > 0.0);
            assert!((step - 1.0 / rate).abs() < 1e-9, "step {step} at rate {rate}");
        }

        // Each segment starts at (samples before it) / rate
        let mut offset = 0;
        for &n in &sizes {
            assert!((ts[offset] - offset as f64 / rate).abs() < 1e-12);
            offset += n;
        }
    }
}

#[test]
fn empty_segment_keeps_timeline_continuous() {
    let dir = TempDir::new().unwrap();
    write_segment(dir.path(), "rec.D01", &[1.0, 2.0]);
    write_segment(dir.path(), "rec.D02", &[]);
    write_segment(dir.path(), "rec.D03", &[3.0]);

    let series = load_with_rate(dir.path().join("rec.D01"), 2.0).unwrap();
    let pairs: Vec<(f64, f32)> = series.iter().collect();
    assert_eq!(pairs, vec![(0.0, 1.0), (0.5, 2.0), (1.0, 3.0)]);
    assert_eq!(series.segment_sample_counts(), &[2, 0, 1]);
}

#[test]
fn default_rate_is_one_hundred_hertz() {
    let dir = TempDir::new().unwrap();
    let seed = write_recording(dir.path(), &[3]);
    let series = load(seed).unwrap();
    assert_eq!(series.sample_rate(), 100.0);
    assert_eq!(series.get(2), Some((0.02, 3.0)));
}

#[test]
fn numeric_order_from_config() {
    let dir = TempDir::new().unwrap();
    write_segment(dir.path(), "rec.D1", &[1.0]);
    write_segment(dir.path(), "rec.D2", &[2.0]);
    write_segment(dir.path(), "rec.D10", &[10.0]);
    let seed = dir.path().join("rec.D1");

    let lexical = load_with_rate(&seed, 1.0).unwrap();
    assert_eq!(lexical.amplitudes().to_vec(), vec![1.0, 10.0, 2.0]);

    let config = SessionConfig {
        sample_rate: 1.0,
        segment_order: SegmentOrder::Numeric,
        ..SessionConfig::default()
    };
    let numeric = load_with_config(&seed, &config).unwrap();
    assert_eq!(numeric.amplitudes().to_vec(), vec![1.0, 2.0, 10.0]);
}

#[test]
fn corrupt_segment_aborts_whole_load() {
    let dir = TempDir::new().unwrap();
    write_segment(dir.path(), "rec.D01", &[1.0, 2.0]);
    let bad = write_segment(dir.path(), "rec.D02", &[3.0]);
    let mut file = fs::OpenOptions::new().append(true).open(&bad).unwrap();
    file.write_all(&[1, 2, 3]).unwrap();
    drop(file);

    let err = load(dir.path().join("rec.D01")).unwrap_err();
    match err {
        EpgError::CorruptSegment { path, .. } => assert!(path.ends_with("rec.D02")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_seed_and_no_siblings() {
    let dir = TempDir::new().unwrap();
    let err = load(dir.path().join("rec.D01")).unwrap_err();
    assert!(matches!(err, EpgError::NotFound { .. }));

    let lonely = write_segment(dir.path(), "rec.bin", &[1.0]);
    let err = load(lonely).unwrap_err();
    assert!(matches!(err, EpgError::NoMatch { .. }));
}

#[test]
fn seed_need_not_be_first_segment() {
    let dir = TempDir::new().unwrap();
    write_recording(dir.path(), &[2, 2, 2]);
    let from_last = SegmentLoader::default()
        .build_combined_series(dir.path().join("rec.D03"), 1.0)
        .unwrap();
    let from_first = load_with_rate(dir.path().join("rec.D01"), 1.0).unwrap();
    assert_eq!(from_last, from_first);
}

#[test]
fn rendered_plot_covers_the_series() {
    let dir = TempDir::new().unwrap();
    let seed = write_recording(dir.path(), &[4, 4]);
    let series = load_with_rate(seed, 4.0).unwrap();

    let plot = render(&series, PlotMode::Line, "rec");
    assert_eq!(plot.len(), 8);
    assert_eq!(plot.points[4], [1.0, 5.0]);
    assert_eq!(plot.x_label, "Time (s)");
    assert_eq!(plot.y_label, "Signal");
}
