// demos/test_loader.rs
use epg_importer::{load_with_rate, DEFAULT_SAMPLE_RATE};
use std::env;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <path_to_any_segment> [sample_rate_hz]", args[0]);
        std::process::exit(1);
    }

    let path = &args[1];
    let rate = match args.get(2).map(|r| r.parse::<f64>()) {
        Some(Ok(rate)) => rate,
        Some(Err(e)) => {
            eprintln!("Invalid sample rate '{}': {}", args[2], e);
            std::process::exit(1);
        }
        None => DEFAULT_SAMPLE_RATE,
    };
    println!("Loading from: {}", path);

    match load_with_rate(path, rate) {
        Ok(series) => {
            println!("\n✓ Successfully loaded!");
            println!("  Sample rate: {} Hz", series.sample_rate());
            println!("  Samples: {}", series.len());
            println!("  Duration: {:.2} seconds", series.duration());

            println!("  Source files: {}", series.source_files().len());
            for (i, (source, count)) in series
                .source_files()
                .iter()
                .zip(series.segment_sample_counts())
                .enumerate()
            {
                println!("    {}: {} ({} samples)", i + 1, source.display(), count);
            }

            if !series.is_empty() {
                let ts = series.timestamps();
                let n = ts.len();
                println!("\n  Checking timestamps:");
                println!("    First: {:?}", ts.iter().take(5).collect::<Vec<_>>());
                println!("    Last: {:?}", ts.iter().skip(n.saturating_sub(5)).collect::<Vec<_>>());
            }
        }
        Err(e) => {
            eprintln!("\n✗ Error loading recording: {}", e);
            std::process::exit(1);
        }
    }
}
