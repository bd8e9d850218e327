//! # Image Decoding
//!
//! Turns background image bytes into something the PDF writer can embed.
//! JPEG passes through untouched (DCTDecode); PNG is decoded to RGB with an
//! optional alpha plane for the SMask. Anything that does not start with a
//! JPEG or PNG signature is rejected before decoding.
//!
//! Also resolves local sources (data URIs, file paths, raw base64), which
//! font entries share with backgrounds.

use std::io::Cursor;

use thiserror::Error;

use crate::surface::ImageId;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("invalid data URI: missing ',' separator")]
    MalformedDataUri,
    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported image format (expected a JPEG or PNG signature)")]
    UnknownSignature,
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

/// Identify the format from the leading signature bytes.
pub fn sniff_format(data: &[u8]) -> Option<ImageFormat> {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(ImageFormat::Jpeg)
    } else if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some(ImageFormat::Png)
    } else {
        None
    }
}

/// An image ready for embedding.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub pixels: PixelData,
    pub width_px: u32,
    pub height_px: u32,
}

#[derive(Debug, Clone)]
pub enum PixelData {
    /// Original JPEG stream, embedded as-is.
    Jpeg { data: Vec<u8>, gray: bool },
    /// `width * height * 3` RGB bytes plus an alpha plane when any pixel is
    /// not fully opaque.
    Rgb { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

/// Resolve a local source to raw bytes.
///
/// Accepts `data:<mime>;base64,<payload>`, paths starting with `/`, `./` or
/// `../`, and bare base64. Other strings containing `/` are treated as
/// base64, since base64 payloads contain slashes too.
pub fn read_source_bytes(src: &str) -> Result<Vec<u8>, ImageError> {
    if let Some(rest) = src.strip_prefix("data:") {
        let (_, payload) = rest.split_once(',').ok_or(ImageError::MalformedDataUri)?;
        return decode_base64(payload);
    }
    if src.starts_with('/') || src.starts_with("./") || src.starts_with("../") {
        return std::fs::read(src).map_err(|source| ImageError::Io {
            path: src.to_string(),
            source,
        });
    }
    decode_base64(src)
}

fn decode_base64(input: &str) -> Result<Vec<u8>, ImageError> {
    use base64::Engine;
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(base64::engine::general_purpose::STANDARD.decode(cleaned)?)
}

/// Decode image bytes after checking their signature.
pub fn decode_image(data: Vec<u8>) -> Result<LoadedImage, ImageError> {
    match sniff_format(&data).ok_or(ImageError::UnknownSignature)? {
        ImageFormat::Jpeg => {
            let (width_px, height_px) = image::io::Reader::with_format(
                Cursor::new(&data),
                image::ImageFormat::Jpeg,
            )
            .into_dimensions()?;
            let gray = jpeg_component_count(&data) == Some(1);
            Ok(LoadedImage {
                pixels: PixelData::Jpeg { data, gray },
                width_px,
                height_px,
            })
        }
        ImageFormat::Png => {
            let decoded =
                image::io::Reader::with_format(Cursor::new(&data), image::ImageFormat::Png)
                    .decode()?
                    .to_rgba8();
            let (width_px, height_px) = decoded.dimensions();
            let mut rgb = Vec::with_capacity(decoded.len() / 4 * 3);
            let mut alpha = Vec::with_capacity(decoded.len() / 4);
            for px in decoded.pixels() {
                rgb.extend_from_slice(&px.0[..3]);
                alpha.push(px.0[3]);
            }
            let alpha = alpha.iter().any(|&a| a != 255).then_some(alpha);
            Ok(LoadedImage {
                pixels: PixelData::Rgb { rgb, alpha },
                width_px,
                height_px,
            })
        }
    }
}

/// Number of colour components declared by the first SOF segment.
fn jpeg_component_count(data: &[u8]) -> Option<u8> {
    let mut i = 2;
    while i + 3 < data.len() && data[i] == 0xFF {
        let marker = data[i + 1];
        if matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF) {
            return data.get(i + 9).copied();
        }
        let len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        i += 2 + len;
    }
    None
}

/// Images used by one document, each stored once.
///
/// Pages refer to entries by [`ImageId`]; the writer emits one XObject per
/// entry no matter how many pages draw it.
#[derive(Debug, Clone, Default)]
pub struct ImageTable {
    entries: Vec<(String, LoadedImage)>,
}

impl ImageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an image under `key`, or return the id it already has.
    pub fn insert(&mut self, key: &str, image: LoadedImage) -> ImageId {
        if let Some(pos) = self.entries.iter().position(|(k, _)| k == key) {
            return ImageId(pos);
        }
        self.entries.push((key.to_string(), image));
        ImageId(self.entries.len() - 1)
    }

    pub fn get(&self, id: ImageId) -> Option<&LoadedImage> {
        self.entries.get(id.0).map(|(_, img)| img)
    }
}
