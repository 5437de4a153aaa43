//! Image input domain — turns an upload into an RGBA pixel buffer.
//!
//! Accepts file paths, raw encoded bytes, browser-style data URLs, or an
//! already-decoded buffer. Format and size validation of uploads happens
//! before anything reaches this module.

use crate::error::DecodeError;
use base64::Engine as _;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader, RgbaImage};
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::path::PathBuf;

/// A decoded image: row-major RGBA samples, origin top-left.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    image: RgbaImage,
}

impl PixelBuffer {
    /// Wrap raw RGBA samples. `samples.len()` must equal `width * height * 4`.
    pub fn from_raw(width: u32, height: u32, samples: Vec<u8>) -> Result<Self, DecodeError> {
        let expected = width as usize * height as usize * 4;
        let actual = samples.len();
        if actual != expected {
            return Err(DecodeError::BufferSize {
                width,
                height,
                expected,
                actual,
            });
        }
        RgbaImage::from_raw(width, height, samples)
            .map(Self::from_image)
            .ok_or(DecodeError::BufferSize {
                width,
                height,
                expected,
                actual,
            })
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// True when the buffer holds no pixels (zero width or height).
    pub fn is_empty(&self) -> bool {
        self.pixel_count() == 0
    }

    /// Flat RGBA samples, four bytes per pixel.
    pub fn samples(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Iterate over the pixels of each row, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        let stride = (self.width() as usize * 4).max(1);
        self.samples().chunks_exact(stride)
    }

    /// Encode as PNG in memory, for engines that read from disk.
    pub fn encode_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut png_bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)?;
        Ok(png_bytes)
    }

    /// SHA-256 of the decoded samples, hex encoded.
    pub fn digest(&self) -> String {
        let hash = Sha256::digest(self.samples());
        hash.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Where an image to analyse comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Path(PathBuf),
    /// Encoded bytes in any format the `image` crate can sniff.
    Bytes(Vec<u8>),
    /// `data:image/<fmt>[;param=value]*;base64,<payload>`, as produced by a
    /// browser file reader.
    DataUrl(String),
    Pixels(PixelBuffer),
}

impl ImageSource {
    pub fn decode(self) -> Result<PixelBuffer, DecodeError> {
        match self {
            ImageSource::Path(path) => {
                let bytes = std::fs::read(&path)?;
                decode_bytes(&bytes)
            }
            ImageSource::Bytes(bytes) => decode_bytes(&bytes),
            ImageSource::DataUrl(url) => {
                let bytes = decode_data_url(&url)?;
                decode_bytes(&bytes)
            }
            ImageSource::Pixels(buffer) => Ok(buffer),
        }
    }
}

impl From<PixelBuffer> for ImageSource {
    fn from(buffer: PixelBuffer) -> Self {
        ImageSource::Pixels(buffer)
    }
}

/// Decode and turn upright: phone cameras store the sensor orientation and
/// record the real one in EXIF.
fn decode_bytes(bytes: &[u8]) -> Result<PixelBuffer, DecodeError> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut decoded = DynamicImage::from_decoder(decoder)?;
    decoded.apply_orientation(orientation);
    Ok(PixelBuffer::from_image(decoded.to_rgba8()))
}

/// Extract the binary payload of a base64 image data URL.
fn decode_data_url(url: &str) -> Result<Vec<u8>, DecodeError> {
    let rest = url
        .trim()
        .strip_prefix("data:")
        .ok_or(DecodeError::InvalidDataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(DecodeError::InvalidDataUrl)?;
    // `<mime>[;param=value]*;base64`
    let (params, encoding) = header.rsplit_once(';').ok_or(DecodeError::InvalidDataUrl)?;
    let mime = params.split(';').next().unwrap_or("");
    if !mime.starts_with("image/") || !encoding.eq_ignore_ascii_case("base64") {
        return Err(DecodeError::InvalidDataUrl);
    }
    Ok(base64::engine::general_purpose::STANDARD.decode(payload.trim())?)
}
