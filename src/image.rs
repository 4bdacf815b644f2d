//! Binary PPM (`P6`) pixel grids.
//!
//! This is the pixel sink a [`NoiseMap`](crate::map::NoiseMap) is persisted
//! through: the noise side converts scalars to [`Color`]s, this side stores
//! them in an [`RgbImage`] and encodes or decodes `P6` with the `image`
//! crate's PNM codec.

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write},
    path::Path,
};

use image::{
    ExtendedColorType, ImageEncoder, ImageFormat, ImageReader, Limits, Rgb, RgbImage,
    codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding},
};

/// Upper bound on the pixel buffer a decoded header may ask for.
const MAX_DECODE_ALLOC: u64 = 512 * 1024 * 1024;

/// Error returned when reading or writing a pixel grid fails.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// The underlying file or stream failed.
    #[error("image I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The stream does not start with the `P6` magic token.
    #[error("not a binary PPM (expected magic `P6`, got `{0}`)")]
    BadMagic(String),
    /// The PNM codec rejected the header or pixel data, or the header asked
    /// for more than the decode limits allow.
    #[error("PPM codec failed: {0}")]
    Codec(#[from] image::ImageError),
}

/// A 24-bit RGB colour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// A grey with all three channels set to `v`.
    pub const fn grey(v: u8) -> Self {
        Self::new(v, v, v)
    }
}

impl From<Color> for Rgb<u8> {
    fn from(c: Color) -> Self {
        Rgb([c.r, c.g, c.b])
    }
}

impl From<Rgb<u8>> for Color {
    fn from(Rgb([r, g, b]): Rgb<u8>) -> Self {
        Self::new(r, g, b)
    }
}

/// Map a noise sample from `[-1, 1]` to a byte via `round((v + 1) / 2 * 255)`.
///
/// Inputs outside `[-1, 1]` saturate.
#[inline]
pub fn greyscale(v: f64) -> u8 {
    (((v + 1.0) * 0.5).clamp(0.0, 1.0) * 255.0).round() as u8
}

/// An in-memory RGB image that can be loaded from and saved to PPM.
///
/// Both dimensions always fit in a `u16`: constructors take `u16` sizes and
/// decoding caps each axis at `u16::MAX`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelImage {
    buffer: RgbImage,
}

impl Default for PixelImage {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl PixelImage {
    /// A black image of the given size.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            buffer: RgbImage::new(u32::from(width), u32::from(height)),
        }
    }

    /// Build an image by asking `pixel` for the colour of every `(x, y)`,
    /// row by row.
    pub fn from_fn<F>(width: u16, height: u16, mut pixel: F) -> Self
    where
        F: FnMut(u16, u16) -> Color,
    {
        let mut image = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                image.set(x, y, pixel(x, y));
            }
        }
        image
    }

    pub fn width(&self) -> u16 {
        self.buffer.width() as u16
    }

    pub fn height(&self) -> u16 {
        self.buffer.height() as u16
    }

    /// Row-major pixels.
    pub fn pixels(&self) -> impl Iterator<Item = Color> + '_ {
        self.buffer.pixels().map(|&p| Color::from(p))
    }

    /// Colour at `(x, y)`, black outside the image.
    pub fn get(&self, x: u16, y: u16) -> Color {
        if self.contains(x, y) {
            Color::from(*self.buffer.get_pixel(u32::from(x), u32::from(y)))
        } else {
            Color::BLACK
        }
    }

    /// Set `(x, y)` to `color`; writes outside the image are ignored.
    pub fn set(&mut self, x: u16, y: u16, color: Color) {
        if self.contains(x, y) {
            self.buffer
                .put_pixel(u32::from(x), u32::from(y), color.into());
        }
    }

    /// Resize to `width × height`. Existing pixels are discarded.
    pub fn resize(&mut self, width: u16, height: u16) {
        *self = Self::new(width, height);
    }

    /// Size of the raw pixel payload in bytes.
    pub fn filesize(&self) -> usize {
        self.buffer.as_raw().len()
    }

    /// Load a PPM file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file)).inspect_err(|e| {
            tracing::warn!(path = %path.display(), "failed to read PPM: {e}");
        })
    }

    /// Save as a PPM file, replacing any existing file.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), ImageError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Decode a `P6` stream.
    ///
    /// Headers wider or taller than `u16::MAX`, or whose pixel payload exceeds
    /// the decode allocation cap, are rejected before a pixel buffer is
    /// reserved.
    pub fn read_from<R: BufRead + Seek>(mut reader: R) -> Result<Self, ImageError> {
        let start = reader.stream_position()?;
        let mut magic = Vec::with_capacity(2);
        (&mut reader).take(2).read_to_end(&mut magic)?;
        if magic != b"P6" {
            return Err(ImageError::BadMagic(
                String::from_utf8_lossy(&magic).into_owned(),
            ));
        }
        reader.seek(SeekFrom::Start(start))?;

        let mut decoder = ImageReader::with_format(reader, ImageFormat::Pnm);
        decoder.limits(decode_limits());
        let buffer = decoder.decode()?.into_rgb8();
        Ok(Self { buffer })
    }

    /// Encode as a `P6` stream.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), ImageError> {
        PnmEncoder::new(writer)
            .with_subtype(PnmSubtype::Pixmap(SampleEncoding::Binary))
            .write_image(
                self.buffer.as_raw(),
                self.buffer.width(),
                self.buffer.height(),
                ExtendedColorType::Rgb8,
            )?;
        Ok(())
    }

    fn contains(&self, x: u16, y: u16) -> bool {
        x < self.width() && y < self.height()
    }
}

fn decode_limits() -> Limits {
    let mut limits = Limits::default();
    limits.max_image_width = Some(u32::from(u16::MAX));
    limits.max_image_height = Some(u32::from(u16::MAX));
    limits.max_alloc = Some(MAX_DECODE_ALLOC);
    limits
}

/// Write a `width × height` grid to `path`, asking `pixel` for each colour.
pub fn write_pixel_grid<F>(
    path: impl AsRef<Path>,
    width: u16,
    height: u16,
    pixel: F,
) -> Result<(), ImageError>
where
    F: FnMut(u16, u16) -> Color,
{
    PixelImage::from_fn(width, height, pixel).write(path)
}

/// Read a grid from `path`, returning `(width, height, pixels)`.
pub fn read_pixel_grid(path: impl AsRef<Path>) -> Result<(u16, u16, Vec<Color>), ImageError> {
    let image = PixelImage::read(path)?;
    Ok((image.width(), image.height(), image.pixels().collect()))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn checkerboard() -> PixelImage {
        PixelImage::from_fn(3, 2, |x, y| {
            if (x + y) % 2 == 0 {
                Color::new(255, 0, 255)
            } else {
                Color::new(x as u8, y as u8, 7)
            }
        })
    }

    #[test]
    fn greyscale_endpoints() {
        assert_eq!(greyscale(-1.0), 0);
        assert_eq!(greyscale(0.0), 128);
        assert_eq!(greyscale(1.0), 255);
        assert_eq!(greyscale(-3.0), 0);
        assert_eq!(greyscale(3.0), 255);
    }

    #[test]
    fn writes_binary_pixmap() {
        let mut out = Vec::new();
        checkerboard().write_to(&mut out).unwrap();
        assert!(out.starts_with(b"P6"));
        // Header, then raw row-major triplets to the end of the stream.
        assert!(out.len() > 18);
        let payload = &out[out.len() - 18..];
        assert_eq!(&payload[..6], &[255, 0, 255, 1, 0, 7]);
        assert_eq!(&payload[15..], &[255, 0, 255]);
    }

    #[test]
    fn reads_back_what_it_wrote() {
        let image = checkerboard();
        let mut out = Vec::new();
        image.write_to(&mut out).unwrap();
        let parsed = PixelImage::read_from(Cursor::new(out)).unwrap();
        assert_eq!(parsed, image);
        assert_eq!(parsed.filesize(), 18);
        assert_eq!(parsed.get(1, 0), Color::new(1, 0, 7));
    }

    #[test]
    fn header_comments_are_skipped() {
        let mut data = b"P6\n# made by hand\n2 1\n255\n".to_vec();
        data.extend_from_slice(&[1, 2, 3, 4, 5, 6]);
        let image = PixelImage::read_from(Cursor::new(data)).unwrap();
        assert_eq!((image.width(), image.height()), (2, 1));
        assert_eq!(image.get(1, 0), Color::new(4, 5, 6));
    }

    #[test]
    fn pixel_bytes_that_look_like_whitespace_survive() {
        let mut data = b"P6\n2 1\n255\n".to_vec();
        data.extend_from_slice(b"\n \t#\r\n");
        let image = PixelImage::read_from(Cursor::new(data)).unwrap();
        assert_eq!(image.get(0, 0), Color::new(b'\n', b' ', b'\t'));
        assert_eq!(image.get(1, 0), Color::new(b'#', b'\r', b'\n'));
    }

    #[test]
    fn rejects_bad_input() {
        let err = PixelImage::read_from(Cursor::new(b"P3\n1 1\n255\n".to_vec())).unwrap_err();
        assert!(matches!(err, ImageError::BadMagic(ref m) if m == "P3"));

        let err = PixelImage::read_from(Cursor::new(Vec::new())).unwrap_err();
        assert!(matches!(err, ImageError::BadMagic(ref m) if m.is_empty()));

        let err = PixelImage::read_from(Cursor::new(b"P6\nwide 1\n255\n".to_vec())).unwrap_err();
        assert!(matches!(err, ImageError::Codec(_)));

        let err = PixelImage::read_from(Cursor::new(b"P6\n2 2\n255\n\x01\x02".to_vec())).unwrap_err();
        assert!(matches!(err, ImageError::Codec(_)));
    }

    #[test]
    fn oversized_headers_fail_without_allocating() {
        // 65535 × 65535 × 3 bytes is ~12.9 GB, followed by only two bytes.
        let data = b"P6\n65535 65535\n255\n\x01\x02".to_vec();
        let err = PixelImage::read_from(Cursor::new(data)).unwrap_err();
        assert!(matches!(err, ImageError::Codec(_)), "{err}");

        let data = b"P6\n70000 1\n255\n\x01\x02".to_vec();
        let err = PixelImage::read_from(Cursor::new(data)).unwrap_err();
        assert!(matches!(err, ImageError::Codec(_)), "{err}");
    }

    #[test]
    fn out_of_bounds_access_is_harmless() {
        let mut image = PixelImage::new(2, 2);
        image.set(5, 0, Color::grey(9));
        image.set(1, 1, Color::grey(9));
        assert_eq!(image.get(5, 0), Color::BLACK);
        assert_eq!(image.get(1, 1), Color::grey(9));
        assert_eq!(image.pixels().filter(|&c| c != Color::BLACK).count(), 1);

        image.resize(3, 1);
        assert_eq!(image.pixels().count(), 3);
        assert!(image.pixels().all(|c| c == Color::BLACK));
    }

    #[test]
    fn pixel_grid_round_trips_through_a_file() {
        let path = std::env::temp_dir().join(format!(
            "symbios_perlin_grid_{}.ppm",
            std::process::id()
        ));
        write_pixel_grid(&path, 4, 3, |x, y| Color::new(x as u8 * 10, y as u8 * 20, 1)).unwrap();
        let (width, height, pixels) = read_pixel_grid(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!((width, height), (4, 3));
        assert_eq!(pixels.len(), 12);
        assert_eq!(pixels[4 * 2 + 3], Color::new(30, 40, 1));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_pixel_grid("/nonexistent/dir/noise.ppm").unwrap_err();
        assert!(matches!(err, ImageError::Io(_)));
    }
}
