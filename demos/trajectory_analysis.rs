use dumpframes::{FrameLoader, FramePattern};
use std::error::Error;
use std::path::Path;
use std::time::Instant;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args()
        .nth(1)
        .expect("Usage: cargo run --example trajectory_analysis <one dump file of the series>");
    let path = Path::new(&path);
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    let pattern = FramePattern::from_path(path).ok_or("file name has no frame number")?;
    let files = pattern.find_matching_files(dir);
    println!("Series {}: {} files", pattern.glob(), files.len());

    let start = Instant::now();
    let mut loader = FrameLoader::new();
    let mut total_particles = 0;

    for (i, (number, file)) in files.iter().enumerate() {
        let frame = match loader.load_frame(file) {
            Ok(frame) => frame,
            Err(e) => {
                // keep going; a bad frame should not end the scan
                eprintln!("skipping {}: {}", file.display(), e);
                continue;
            }
        };
        total_particles += frame.len();

        if i == 0 {
            loader.set_reference_from_frame(&frame, *number as i32)?;
            continue;
        }

        let displacements = loader.references().displacements(&frame.ids, &frame.positions);
        let max = displacements.iter().map(|d| d.length()).fold(0.0f32, f32::max);
        println!("file {}: max displacement {:.4}", number, max);
    }

    // Scrub back over the series; these should be served from the cache
    for (_, file) in files.iter().rev().take(3) {
        let _ = loader.load_frame(file);
    }

    let elapsed = start.elapsed();
    let stats = loader.cache_stats();
    println!(
        "Read {} frames ({} particles) in {:.2?}, cache hit rate {:.0}%",
        files.len(),
        total_particles,
        elapsed,
        stats.hit_rate * 100.0
    );

    Ok(())
}
