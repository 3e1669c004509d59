//! Turns uploaded bytes into RGBA pixels.
//!
//! The declared media type decides what happens to a file: GIFs are refused, anything that is not
//! `image/*` is skipped, everything else goes through the `image` crate at its native size.

use std::io::Cursor;

use bytes::Bytes;
use common::{GIF_MIME, IMAGE_MIME_PREFIX, RGBA_BYTES_PER_PIXEL};
use image::{ImageFormat, ImageReader, Limits};

use crate::config::Config;
use crate::error::FileError;

/// A file as handed over by whoever picked it.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub name: String,
    pub bytes: Bytes,
    pub mime: String,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>, mime: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            mime: mime.into(),
        }
    }
}

/// RGBA8 pixels in row-major order. `pixels.len() == 4 * width * height` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl DecodedImage {
    /// Returns `None` for an empty image or when the buffer does not match the dimensions.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(RGBA_BYTES_PER_PIXEL)?;
        if expected == 0 || pixels.len() != expected {
            return None;
        }
        Some(Self { width, height, pixels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.len() / RGBA_BYTES_PER_PIXEL
    }
}

/// Decodes one file, refusing animations and non-images by their declared type.
pub fn decode(file: &ImageFile, config: &Config) -> Result<DecodedImage, FileError> {
    let mime = file.mime.trim().to_ascii_lowercase();
    if mime == GIF_MIME {
        return Err(FileError::UnsupportedAnimation);
    }
    if !mime.starts_with(IMAGE_MIME_PREFIX) {
        return Err(FileError::NotAnImage { mime: file.mime.clone() });
    }

    // Only the header is read here, oversized images are refused before any pixel is allocated.
    let (width, height) = reader(file, &mime, config)?.into_dimensions()?;
    if u64::from(width) * u64::from(height) > config.max_pixels {
        return Err(FileError::Decode(image::ImageError::Limits(
            image::error::LimitError::from_kind(image::error::LimitErrorKind::DimensionError),
        )));
    }

    let decoded = reader(file, &mime, config)?.decode()?;
    log::debug!("Decoded {} as {width}x{height}.", file.name);
    let (width, height) = (decoded.width(), decoded.height());
    let pixels = decoded.into_rgba8().into_raw();
    DecodedImage::from_rgba(width, height, pixels).ok_or(FileError::Empty)
}

fn reader<'a>(
    file: &'a ImageFile,
    mime: &str,
    config: &Config,
) -> Result<ImageReader<Cursor<&'a [u8]>>, FileError> {
    let mut reader = ImageReader::new(Cursor::new(&file.bytes[..]));
    // The declared type is only a fallback, the content wins if it can be sniffed.
    if let Some(format) = ImageFormat::from_mime_type(mime) {
        reader.set_format(format);
    }
    let mut reader = reader.with_guessed_format()?;
    reader.limits(limits(config));
    Ok(reader)
}

fn limits(config: &Config) -> Limits {
    let mut limits = Limits::default();
    limits.max_alloc = Some(config.max_decode_bytes);
    limits
}
