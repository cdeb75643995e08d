// Uploaded image: decoded RGBA pixels plus a content identity.
// Immutable once built; a new upload replaces it wholesale.

use std::io::Cursor;
use std::path::Path;

use image::{ImageReader, RgbaImage};

use crate::error::{Error, Result};

/// CRC32 of the source bytes combined with the natural size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageId {
    pub crc: u32,
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08x}-{}x{}", self.crc, self.width, self.height)
    }
}

#[derive(Debug)]
pub struct SourceImage {
    pixels: RgbaImage,
    id: ImageId,
}

impl SourceImage {
    /// Decode an uploaded file's bytes. Anything unreadable, empty or larger
    /// than `max_pixels` is an `ImageDecode` error.
    pub fn decode(bytes: &[u8], max_pixels: u64) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::ImageDecode("empty file".into()));
        }
        // The header alone gives the size; refuse oversized uploads before allocating.
        let (w, h) = reader(bytes)?
            .into_dimensions()
            .map_err(|e| Error::ImageDecode(e.to_string()))?;
        check_size(w, h, max_pixels)?;
        let decoded = reader(bytes)?
            .decode()
            .map_err(|e| Error::ImageDecode(e.to_string()))?;
        let (w, h) = (decoded.width(), decoded.height());
        let id = ImageId { crc: crc32fast::hash(bytes), width: w, height: h };
        log::debug!("decoded {id}");
        Ok(Self { pixels: decoded.to_rgba8(), id })
    }

    pub fn open(path: &Path, max_pixels: u64) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| Error::ImageDecode(format!("{}: {e}", path.display())))?;
        Self::decode(&bytes, max_pixels)
    }

    /// Wrap already-decoded pixels (identity hashed over the raw RGBA).
    pub fn from_rgba(pixels: RgbaImage) -> Result<Self> {
        let (w, h) = pixels.dimensions();
        check_size(w, h, u64::MAX)?;
        let id = ImageId { crc: crc32fast::hash(pixels.as_raw()), width: w, height: h };
        Ok(Self { pixels, id })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// RGB of the pixel at natural coordinates, packed 0x00RRGGBB.
    #[inline]
    pub fn rgb_u32(&self, x: u32, y: u32) -> u32 {
        let p = self.pixels.get_pixel(x, y);
        ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32
    }
}

fn reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| Error::ImageDecode(e.to_string()))
}

fn check_size(w: u32, h: u32, max_pixels: u64) -> Result<()> {
    if w == 0 || h == 0 {
        return Err(Error::ImageDecode(format!("image has no pixels ({w}x{h})")));
    }
    if (w as u64) * (h as u64) > max_pixels {
        return Err(Error::ImageDecode(format!(
            "image too large: {w}x{h} exceeds {max_pixels} pixels"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn decodes_png() {
        let bytes = png_bytes(7, 5);
        let src = SourceImage::decode(&bytes, 1_000).unwrap();
        assert_eq!((src.width(), src.height()), (7, 5));
        assert_eq!(src.rgb_u32(3, 3), 0x000A141E);
        assert_eq!(src.id().crc, crc32fast::hash(&bytes));
    }

    #[test]
    fn identical_bytes_share_identity() {
        let bytes = png_bytes(4, 4);
        let a = SourceImage::decode(&bytes, 1_000).unwrap();
        let b = SourceImage::decode(&bytes, 1_000).unwrap();
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn garbage_is_decode_error() {
        let err = SourceImage::decode(b"definitely not an image", 1_000).unwrap_err();
        assert!(matches!(err, Error::ImageDecode(_)));
        assert!(matches!(SourceImage::decode(&[], 1_000), Err(Error::ImageDecode(_))));
    }

    #[test]
    fn too_large_is_rejected() {
        let bytes = png_bytes(20, 20);
        assert!(matches!(SourceImage::decode(&bytes, 399), Err(Error::ImageDecode(_))));
    }

    #[test]
    fn size_is_checked_from_the_header() {
        // Rewrite IHDR to claim 100000x20; the pixel data no longer matches,
        // so only a header check can produce the size error.
        let mut bytes = png_bytes(20, 20);
        bytes[16..20].copy_from_slice(&100_000u32.to_be_bytes());
        let crc = crc32fast::hash(&bytes[12..29]);
        bytes[29..33].copy_from_slice(&crc.to_be_bytes());

        match SourceImage::decode(&bytes, 1_000) {
            Err(Error::ImageDecode(msg)) => assert!(msg.contains("100000x20"), "{msg}"),
            other => panic!("expected size error, got {other:?}"),
        }
    }
}
