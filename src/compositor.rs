// Preview and export.
// The preview is built at viewport resolution every frame: source pixel under
// each screen pixel, checkerboard showing through where erased, brush ring on
// top. Export works at natural resolution so UI scaling never degrades it.

use image::{RgbImage, RgbaImage};
use rayon::prelude::*;

use crate::config::EditorConfig;
use crate::draw::{self, RingStyle};
use crate::error::{Error, Result};
use crate::gamma::GammaLut;
use crate::mapping::CoordinateMapper;
use crate::mask::{MaskBuffer, MaskSnapshot, KEPT};
use crate::source::SourceImage;
use crate::types::{BrushSize, CursorState, FrameBuffer, ToolMode, Viewport};

#[derive(Clone, Debug, PartialEq)]
pub struct PreviewStyle {
    pub checker_size: usize,
    pub checker_light: u32,
    pub checker_dark: u32,
    pub ring: RingStyle,
    /// Fills the box while no image is loaded.
    pub placeholder: u32,
    /// Behind letterboxed images.
    pub page_background: u32,
}

impl PreviewStyle {
    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            checker_size: config.checker_size.max(1),
            checker_light: config.checker_light,
            checker_dark: config.checker_dark,
            ring: RingStyle {
                fill: config.ring_fill,
                fill_opacity: config.ring_fill_opacity,
                outline: config.ring_outline,
            },
            placeholder: config.placeholder,
            page_background: config.page_background,
        }
    }

    #[inline]
    fn checker(&self, x: usize, y: usize) -> u32 {
        if (x / self.checker_size + y / self.checker_size) % 2 == 0 {
            self.checker_light
        } else {
            self.checker_dark
        }
    }
}

impl Default for PreviewStyle {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

/// Everything one preview frame depends on.
#[derive(Clone, Copy)]
pub struct PreviewInput<'a> {
    pub source: Option<&'a SourceImage>,
    pub mask: Option<&'a MaskBuffer>,
    pub cursor: Option<CursorState>,
    pub tool: ToolMode,
    pub brush_size: BrushSize,
    pub viewport: Viewport,
}

pub struct Compositor {
    style: PreviewStyle,
    frame: FrameBuffer,
}

impl Compositor {
    pub fn new(style: PreviewStyle) -> Self {
        Self { style, frame: FrameBuffer::new(0, 0, 0) }
    }

    pub fn style(&self) -> &PreviewStyle {
        &self.style
    }

    /// Build the frame for the current state. The returned buffer is reused
    /// between calls; the mask is only read.
    /// Visual: a gray box until a photo loads, then the photo with erased
    /// areas showing the checkerboard, and the brush ring under the pointer.
    pub fn render_preview(&mut self, input: &PreviewInput<'_>) -> &FrameBuffer {
        let w = input.viewport.width.max(0.0).ceil() as usize;
        let h = input.viewport.height.max(0.0).ceil() as usize;
        self.frame.resize(w, h);

        match input.source {
            None => self.frame.fill(self.style.placeholder),
            Some(source) => self.draw_image(source, input.mask, &input.viewport),
        }

        if let Some(cursor) = input.cursor {
            if input.tool != ToolMode::None {
                draw::draw_brush_ring(
                    &mut self.frame,
                    cursor.screen_x,
                    cursor.screen_y,
                    input.brush_size.get() as f32,
                    &self.style.ring,
                );
            }
        }
        &self.frame
    }

    /// Visual: letterbox bands (contain/none) take the page color.
    fn draw_image(&mut self, source: &SourceImage, mask: Option<&MaskBuffer>, viewport: &Viewport) {
        let mapper = CoordinateMapper::new(viewport.geometry(source.width(), source.height()));
        // Mask must match the image; anything else is shown unmasked.
        let mask = mask.filter(|m| {
            m.may_have_erased() && m.width() == source.width() as usize && m.height() == source.height() as usize
        });
        let (fw, fh) = (self.frame.width, self.frame.height);

        for y in 0..fh {
            for x in 0..fw {
                let idx = y * fw + x;
                let Some(p) = mapper.to_mask_space(x as f32 + 0.5, y as f32 + 0.5) else {
                    self.frame.pixels[idx] = self.style.page_background;
                    continue;
                };
                let (sx, sy) = (p.x as u32, p.y as u32);
                let color = source.rgb_u32(sx, sy);
                self.frame.pixels[idx] = match mask.and_then(|m| m.get(sx as usize, sy as usize)) {
                    None | Some(KEPT) => color,
                    Some(m) => draw::mix(self.style.checker(x, y), color, m as f32 / 255.0),
                };
            }
        }
    }
}

/// Full-resolution cut-out: source RGBA with alpha scaled by the mask.
/// Visual: erased areas become transparent in the saved PNG.
pub fn export_result(source: &SourceImage, mask: &MaskSnapshot) -> Result<RgbaImage> {
    let (w, h) = (source.width() as usize, source.height() as usize);
    if mask.width != w || mask.height != h {
        return Err(Error::Export(format!(
            "mask is {}x{} but image is {w}x{h}",
            mask.width, mask.height
        )));
    }

    let mut out = source.pixels().clone();
    out.par_chunks_mut(w * 4)
        .zip(mask.data().par_chunks(w))
        .for_each(|(row, alpha)| {
            for (px, &m) in row.chunks_exact_mut(4).zip(alpha) {
                px[3] = ((px[3] as u16 * m as u16 + 127) / 255) as u8;
            }
        });
    Ok(out)
}

/// For targets without alpha: blend the cut-out onto a solid background.
pub fn flatten_onto(image: &RgbaImage, background: [u8; 3], lut: &GammaLut) -> RgbImage {
    let (w, h) = image.dimensions();
    let mut out = RgbImage::new(w, h);
    let row_in = w as usize * 4;
    let row_out = w as usize * 3;
    if row_in == 0 {
        return out;
    }

    out.par_chunks_mut(row_out)
        .zip(image.as_raw().par_chunks(row_in))
        .for_each(|(dst, src)| {
            for (d, s) in dst.chunks_exact_mut(3).zip(src.chunks_exact(4)) {
                for c in 0..3 {
                    d[c] = lut.blend(s[c], background[c], s[3]);
                }
            }
        });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FitMode, PaintMode};
    use image::Rgba;

    fn source(w: u32, h: u32) -> SourceImage {
        SourceImage::from_rgba(RgbaImage::from_pixel(w, h, Rgba([255, 0, 0, 255]))).unwrap()
    }

    fn input<'a>(src: Option<&'a SourceImage>, mask: Option<&'a MaskBuffer>) -> PreviewInput<'a> {
        PreviewInput {
            source: src,
            mask,
            cursor: None,
            tool: ToolMode::None,
            brush_size: BrushSize::new(20),
            viewport: Viewport::new(50.0, 50.0, FitMode::Contain),
        }
    }

    #[test]
    fn placeholder_without_image() {
        let mut c = Compositor::new(PreviewStyle::default());
        let frame = c.render_preview(&input(None, None));
        assert_eq!((frame.width, frame.height), (50, 50));
        assert!(frame.pixels.iter().all(|&p| p == 0xE5E7EB));
    }

    #[test]
    fn erased_pixels_show_checkerboard() {
        let src = source(50, 50);
        let mut mask = MaskBuffer::new(50, 50);
        mask.stamp(10.0, 10.0, 3.0, PaintMode::Erase);
        let mut c = Compositor::new(PreviewStyle::default());
        let frame = c.render_preview(&input(Some(&src), Some(&mask)));
        assert_eq!(frame.get(40, 40), Some(0xFF0000));
        // (10,10) is in checker cell (1,1): light.
        assert_eq!(frame.get(10, 10), Some(0xFFFFFF));
    }

    #[test]
    fn letterbox_uses_page_background() {
        let src = source(100, 50);
        let mut c = Compositor::new(PreviewStyle::default());
        let frame = c.render_preview(&input(Some(&src), None));
        // 100x50 contained in 50x50 -> 50x25 band at y 12.5..37.5
        assert_eq!(frame.get(25, 2), Some(0xFFFFFF));
        assert_eq!(frame.get(25, 25), Some(0xFF0000));
    }

    #[test]
    fn ring_only_with_active_tool() {
        let src = source(50, 50);
        let mut c = Compositor::new(PreviewStyle::default());
        let mut i = input(Some(&src), None);
        i.cursor = Some(CursorState { screen_x: 25.0, screen_y: 25.0 });
        assert_eq!(c.render_preview(&i).get(25, 25), Some(0xFF0000));
        i.tool = ToolMode::Paint(PaintMode::Erase);
        assert_ne!(c.render_preview(&i).get(25, 25), Some(0xFF0000));
        // outline at the left edge of a 20 px ring
        assert_eq!(c.render_preview(&i).get(15, 25), Some(0x4B5563));
    }

    #[test]
    fn export_alpha_follows_mask() {
        let src = source(20, 10);
        let mut mask = MaskBuffer::new(20, 10);
        mask.stamp(5.0, 5.0, 2.0, PaintMode::Erase);
        let out = export_result(&src, &mask.snapshot()).unwrap();
        assert_eq!(out.dimensions(), (20, 10));
        assert_eq!(out.get_pixel(5, 5)[3], 0);
        assert_eq!(out.get_pixel(15, 5), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn export_rejects_mismatched_mask() {
        let src = source(20, 10);
        let mask = MaskBuffer::new(10, 10);
        assert!(matches!(export_result(&src, &mask.snapshot()), Err(Error::Export(_))));
    }

    #[test]
    fn flatten_replaces_erased_with_background() {
        let src = source(4, 4);
        let mut mask = MaskBuffer::new(4, 4);
        mask.stamp(0.0, 0.0, 0.5, PaintMode::Erase);
        let cut = export_result(&src, &mask.snapshot()).unwrap();
        let flat = flatten_onto(&cut, [0, 0, 255], &GammaLut::new());
        assert_eq!(flat.get_pixel(0, 0).0, [0, 0, 255]);
        assert_eq!(flat.get_pixel(3, 3).0, [255, 0, 0]);
    }
}
