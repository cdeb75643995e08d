// Screen <-> mask coordinate mapping.
// The mask always lives at the image's natural resolution, so every pointer
// position has to be pushed through the same object-fit math the display uses.

use crate::types::{DisplayGeometry, FitMode, MaskPoint};

/// Where the whole (uncropped) image lands on screen, in viewport pixels.
/// With `Cover` this is larger than the viewport and starts at negative offsets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderedRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl RenderedRect {
    #[inline]
    fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && y >= self.top && x < self.left + self.width && y < self.top + self.height
    }
}

/// Built from a fresh `DisplayGeometry` for every event; never cached across frames.
#[derive(Clone, Copy, Debug)]
pub struct CoordinateMapper {
    geometry: DisplayGeometry,
    rect: Option<RenderedRect>,
}

impl CoordinateMapper {
    pub fn new(geometry: DisplayGeometry) -> Self {
        Self { geometry, rect: rendered_rect(&geometry) }
    }

    pub fn geometry(&self) -> &DisplayGeometry {
        &self.geometry
    }

    /// `None` for degenerate layouts (empty image or zero-sized viewport).
    pub fn rendered_rect(&self) -> Option<RenderedRect> {
        self.rect
    }

    /// Map a viewport-relative pointer position into mask pixels.
    /// `None` means the pointer is outside the drawn image: skip stamping.
    pub fn to_mask_space(&self, screen_x: f32, screen_y: f32) -> Option<MaskPoint> {
        let rect = self.rect?;
        let g = &self.geometry;
        if !screen_x.is_finite() || !screen_y.is_finite() {
            return None;
        }
        // Outside the display box: cropped-away parts of a `Cover` image are not hit-testable.
        if screen_x < 0.0 || screen_y < 0.0 || screen_x >= g.display_width || screen_y >= g.display_height {
            return None;
        }
        // Letterbox bars of `Contain` / `None`.
        if !rect.contains(screen_x, screen_y) {
            return None;
        }

        let x = (screen_x - rect.left) * g.natural_width as f32 / rect.width;
        let y = (screen_y - rect.top) * g.natural_height as f32 / rect.height;
        if x >= g.natural_width as f32 || y >= g.natural_height as f32 {
            return None;
        }
        Some(MaskPoint::new(x, y))
    }

    /// Mask pixels per screen pixel along x and y.
    pub fn mask_per_screen(&self) -> Option<(f32, f32)> {
        let rect = self.rect?;
        let g = &self.geometry;
        Some((g.natural_width as f32 / rect.width, g.natural_height as f32 / rect.height))
    }

    /// Convert a screen-space brush radius into mask pixels. Non-uniform `Fill`
    /// layouts use the mean of both axes so the stamp stays circular in the mask.
    pub fn mask_radius(&self, screen_radius: f32) -> Option<f32> {
        let (sx, sy) = self.mask_per_screen()?;
        Some(screen_radius * (sx + sy) * 0.5)
    }
}

fn rendered_rect(g: &DisplayGeometry) -> Option<RenderedRect> {
    let (nw, nh) = (g.natural_width as f32, g.natural_height as f32);
    let (dw, dh) = (g.display_width, g.display_height);
    if g.natural_width == 0 || g.natural_height == 0 || !(dw > 0.0) || !(dh > 0.0) {
        return None;
    }

    let (width, height) = match g.fit {
        FitMode::Cover => {
            let s = (dw / nw).max(dh / nh);
            (nw * s, nh * s)
        }
        FitMode::Contain => {
            let s = (dw / nw).min(dh / nh);
            (nw * s, nh * s)
        }
        FitMode::Fill => (dw, dh),
        FitMode::None => (nw, nh),
    };

    Some(RenderedRect {
        left: (dw - width) / 2.0,
        top: (dh - height) / 2.0,
        width,
        height,
    })
}
