//! Fractal (multi-octave) noise maps.
//!
//! Each cell sums `octaves` samples of one seeded [`GradientNoise`]. Octave
//! `i` doubles the frequency of octave `i - 1`, scales its amplitude by
//! `persistence`, and samples the integer layer `z = i` so the octaves are
//! not scaled copies of one another. The sum is clamped to `[-1, 1]`.

use crate::{image::Color, noise::GradientNoise};

/// Parameters for [`NoiseMap::generate_with`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NoiseMapConfig {
    /// Number of columns.
    pub width: u16,
    /// Number of rows.
    pub height: u16,
    /// Lattice cells spanned by the map along each axis in the first octave.
    pub frequency: f64,
    /// Number of layers summed; zero leaves the map zero-filled.
    pub octaves: u32,
    /// Amplitude multiplier applied between successive octaves.
    pub persistence: f64,
    /// Seed for the permutation table.
    pub seed: u32,
}

impl Default for NoiseMapConfig {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            frequency: 4.0,
            octaves: 4,
            persistence: 0.5,
            seed: 0,
        }
    }
}

/// A dense, row-major grid of noise values in `[-1, 1]`.
///
/// Starts out `0 × 0`. Every call to [`generate`](Self::generate) throws the
/// old contents away and fills a freshly sized grid; the map keeps no
/// reference to the generator afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NoiseMap {
    values: Vec<f64>,
    width: u16,
    height: u16,
}

impl NoiseMap {
    /// An empty `0 × 0` map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and fill a map in one step.
    pub fn with_config(config: &NoiseMapConfig) -> Self {
        let mut map = Self::new();
        map.generate_with(config);
        map
    }

    /// [`generate`](Self::generate) with its arguments taken from `config`.
    pub fn generate_with(&mut self, config: &NoiseMapConfig) {
        self.generate(
            config.width,
            config.height,
            config.frequency,
            config.octaves,
            config.persistence,
            config.seed,
        );
    }

    /// Resize the map to `width × height` and fill it with fractal noise.
    ///
    /// Cell `(x, y)` receives
    /// `Σ persistenceⁱ · noise(x·f·2ⁱ/width, y·f·2ⁱ/height, i)` for
    /// `i in 0..octaves`, clamped to `[-1, 1]`. With `octaves == 0` (or an
    /// empty dimension) the map is resized and left at zero.
    ///
    /// Summation stops once the amplitude reaches zero or overflows, or the
    /// scaled coordinates overflow; those octaves would only add zero or NaN.
    /// Any octave count therefore yields finite cells.
    pub fn generate(
        &mut self,
        width: u16,
        height: u16,
        frequency: f64,
        octaves: u32,
        persistence: f64,
        seed: u32,
    ) {
        self.resize(width, height);

        if octaves == 0 || self.values.is_empty() {
            return;
        }

        tracing::debug!(
            width,
            height,
            frequency,
            octaves,
            persistence,
            seed,
            "generating noise map"
        );

        let noise = GradientNoise::new(seed);
        let w = f64::from(width);
        let h = f64::from(height);

        for (y, row) in self.values.chunks_exact_mut(usize::from(width)).enumerate() {
            let y = y as f64;
            for (x, cell) in row.iter_mut().enumerate() {
                let x = x as f64;
                let mut value = 0.0;
                let mut amplitude: f64 = 1.0;
                let mut scale = frequency;
                for layer in 0..octaves {
                    let (sx, sy) = (x * scale / w, y * scale / h);
                    // Nothing after this point can contribute a finite, non-zero term.
                    if amplitude == 0.0
                        || !amplitude.is_finite()
                        || !sx.is_finite()
                        || !sy.is_finite()
                    {
                        break;
                    }
                    value += amplitude * noise.get(sx, sy, f64::from(layer));
                    if !value.is_finite() {
                        break;
                    }
                    amplitude *= persistence;
                    scale *= 2.0;
                }
                *cell = value.clamp(-1.0, 1.0);
            }
        }
    }

    /// Value at `(x, y)`, or `0.0` outside the map.
    ///
    /// A computed zero and an out-of-range lookup are indistinguishable here;
    /// use [`try_get`](Self::try_get) when the difference matters.
    #[inline]
    pub fn get(&self, x: u16, y: u16) -> f64 {
        self.try_get(x, y).unwrap_or(0.0)
    }

    /// Value at `(x, y)`, or `None` outside the map.
    #[inline]
    pub fn try_get(&self, x: u16, y: u16) -> Option<f64> {
        self.index(x, y).map(|i| self.values[i])
    }

    /// Number of columns.
    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Number of rows.
    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Row-major cell values; length is always `width * height`.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Map every cell through `color`, row-major, for handing to a pixel sink.
    pub fn to_pixels<F>(&self, color: F) -> Vec<Color>
    where
        F: Fn(f64) -> Color,
    {
        self.values.iter().map(|&v| color(v)).collect()
    }

    fn index(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| usize::from(y) * usize::from(self.width) + usize::from(x))
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.values.clear();
        self.values
            .resize(usize::from(width) * usize::from(height), 0.0);
    }
}
