use dumpframes::FrameLoader;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args()
        .nth(1)
        .expect("Usage: cargo run --example basic_usage <dump file>");
    let mut loader = FrameLoader::new();

    let frame = loader.load_frame(&path)?;
    println!(
        "{} particles, forces: {}",
        frame.len(),
        if frame.has_forces() { "yes" } else { "no" }
    );

    // Count particles in the top half of the z-dimension
    let top_half = frame.positions.iter().filter(|pos| pos.z > 0.0).count();
    println!("Particles with z > 0: {}", top_half);

    if let Some(max_radius) = frame.radii.iter().copied().reduce(f32::max) {
        println!("Largest radius: {:.4}", max_radius);
    }

    Ok(())
}
