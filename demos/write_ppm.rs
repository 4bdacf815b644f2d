//! `write_ppm` — generates a fractal noise map and saves it as a greyscale PPM.
//!
//! Run with:
//!   cargo run --example write_ppm -- [output.ppm] [seed]

use symbios_perlin::{
    image::{self, Color},
    map::{NoiseMap, NoiseMapConfig},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "noise.ppm".to_string());
    let seed = match args.next() {
        Some(s) => s.parse()?,
        None => 42,
    };

    let config = NoiseMapConfig {
        width: 800,
        height: 600,
        frequency: 6.5,
        octaves: 3,
        persistence: 0.75,
        seed,
    };
    let map = NoiseMap::with_config(&config);

    image::write_pixel_grid(&path, map.width(), map.height(), |x, y| {
        Color::grey(image::greyscale(map.get(x, y)))
    })?;

    println!("wrote {}×{} noise map (seed {seed}) to {path}", map.width(), map.height());
    Ok(())
}
