//! `symbios_perlin` — deterministic Perlin gradient noise and fractal noise maps.
//!
//! # Architecture
//! A [`PermutationTable`] (Ken Perlin's reference table, or a seeded shuffle)
//! drives a [`GradientNoise`] generator, which samples a continuous scalar
//! field in `[-1, 1]` over 3-D space. [`NoiseMap`] sums several octaves of
//! that field into a clamped 2-D grid.
//!
//! Grids are persisted as binary PPM through the [`image`](crate::image)
//! module after mapping each value to a colour, e.g. with
//! [`greyscale`](crate::image::greyscale).
//!
//! With the `bevy` feature, maps can be uploaded as Bevy images and generated
//! off the main thread via [`SymbiosPerlinPlugin`].

#[cfg(feature = "bevy")]
pub mod async_gen;
pub mod image;
pub mod map;
pub mod math;
pub mod noise;
pub mod permutation;
#[cfg(feature = "bevy")]
pub mod render;

pub use crate::image::{Color, ImageError, PixelImage};
pub use crate::map::{NoiseMap, NoiseMapConfig};
pub use crate::noise::GradientNoise;
pub use crate::permutation::PermutationTable;

#[cfg(feature = "bevy")]
pub use crate::render::noise_map_to_image;

#[cfg(feature = "bevy")]
use bevy::prelude::*;

/// Bevy plugin — registers the async noise-map polling system.
#[cfg(feature = "bevy")]
pub struct SymbiosPerlinPlugin;

#[cfg(feature = "bevy")]
impl Plugin for SymbiosPerlinPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, async_gen::poll_noise_map_tasks);
    }
}
