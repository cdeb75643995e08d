// Writing the exported cut-out. The extension picks the format; formats
// without alpha get flattened onto the configured background.

use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::compositor::flatten_onto;
use crate::error::{Error, Result};
use crate::gamma::GammaLut;

pub fn supports_alpha(format: ImageFormat) -> bool {
    matches!(
        format,
        ImageFormat::Png | ImageFormat::WebP | ImageFormat::Tiff | ImageFormat::Tga | ImageFormat::Ico
    )
}

/// Encode `image` to `path`. Returns the format that was written.
pub fn write_result(image: &RgbaImage, path: &Path, background: [u8; 3], lut: &GammaLut) -> Result<ImageFormat> {
    let format = ImageFormat::from_path(path)
        .map_err(|e| Error::Encode(format!("{}: {e}", path.display())))?;

    let encoded = if supports_alpha(format) {
        DynamicImage::ImageRgba8(image.clone())
    } else {
        log::info!("{format:?} has no alpha, flattening onto {background:?}");
        DynamicImage::ImageRgb8(flatten_onto(image, background, lut))
    };
    encoded
        .save_with_format(path, format)
        .map_err(|e| Error::Encode(format!("{}: {e}", path.display())))?;
    log::info!("wrote {} ({}x{})", path.display(), image.width(), image.height());
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn temp(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("photo-mask-{}-{name}", std::process::id()))
    }

    fn cutout() -> RgbaImage {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([0, 255, 0, 255]));
        img.put_pixel(0, 0, Rgba([0, 255, 0, 0]));
        img
    }

    #[test]
    fn png_keeps_alpha() {
        let path = temp("keep.png");
        let format = write_result(&cutout(), &path, [255, 255, 255], &GammaLut::new()).unwrap();
        assert_eq!(format, ImageFormat::Png);
        let back = image::open(&path).unwrap().to_rgba8();
        assert_eq!(back.get_pixel(0, 0)[3], 0);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn bmp_is_flattened() {
        let path = temp("flat.bmp");
        write_result(&cutout(), &path, [255, 0, 0], &GammaLut::new()).unwrap();
        let back = image::open(&path).unwrap().to_rgb8();
        assert_eq!(back.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(back.get_pixel(1, 1).0, [0, 255, 0]);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn unknown_extension_is_encode_error() {
        let err = write_result(&cutout(), Path::new("out.nothing"), [0; 3], &GammaLut::new()).unwrap_err();
        assert!(matches!(err, Error::Encode(_)));
    }
}
