use epg_importer::{load_with_config, render_window, SessionConfig};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Optional session config next to the data, defaults otherwise
    let config = if std::path::Path::new("data/session.json").exists() {
        SessionConfig::from_file("data/session.json")?
    } else {
        SessionConfig::default()
    };

    // Any one segment is enough; its siblings are found automatically
    let series = load_with_config("data/plant3-ch4.D01", &config)?;

    println!("Sample rate: {} Hz", series.sample_rate());
    println!("Segments: {}", series.source_files().len());
    println!("Number of samples: {}", series.len());
    println!("Duration: {:.3} seconds", series.duration());

    // Show the first few samples
    if !series.is_empty() {
        println!("\nFirst samples:");
        for (t, v) in series.iter().take(5) {
            println!("  {:.3} s: {}", t, v);
        }
    }

    // Plot the configured window
    let plot = render_window(&series, &config, "plant3 channel 4")?;
    println!(
        "\nPlot '{}' ({} mode): {} points, x = {}, y = {}",
        plot.title,
        plot.mode,
        plot.len(),
        plot.x_label,
        plot.y_label
    );
    if let Some((min, max)) = plot.bounds() {
        println!(
            "  Time range: {:.3} to {:.3} s, signal range: {:.3} to {:.3}",
            min[0], max[0], min[1], max[1]
        );
    }
    plot.save_json("data/plant3-ch4.plot.json")?;

    Ok(())
}
