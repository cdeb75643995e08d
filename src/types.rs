// Plain data shared by the mapper, mask, brush, controller and compositor.

use serde::{Deserialize, Serialize};

/// A displayable frame; what the window shows.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameBuffer {
    pub width: usize,     // frame width in screen pixels
    pub height: usize,    // frame height in screen pixels
    pub pixels: Vec<u32>, // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize, fill: u32) -> Self {
        Self { width, height, pixels: vec![fill; width * height] }
    }

    pub fn fill(&mut self, color: u32) {
        for p in &mut self.pixels { *p = color; }
    }

    /// Reallocate only when the size changed.
    pub fn resize(&mut self, width: usize, height: usize) {
        if self.width != width || self.height != height {
            *self = Self::new(width, height, 0);
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height { return None; }
        Some(self.pixels[y * self.width + x])
    }
}

/// How the natural image is scaled into the display box (CSS `object-fit`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitMode {
    /// Uniform scale to fill the box, center-cropped.
    #[default]
    Cover,
    /// Uniform scale to fit inside the box, letterboxed.
    Contain,
    /// Non-uniform stretch to the box.
    Fill,
    /// Natural size, centered.
    None,
}

impl std::str::FromStr for FitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cover" => Ok(FitMode::Cover),
            "contain" => Ok(FitMode::Contain),
            "fill" => Ok(FitMode::Fill),
            "none" => Ok(FitMode::None),
            other => Err(format!("unknown fit mode '{other}' (expected cover, contain, fill or none)")),
        }
    }
}

/// The on-screen box the image is laid out in. Supplied fresh with every event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub fit: FitMode,
}

impl Viewport {
    pub fn new(width: f32, height: f32, fit: FitMode) -> Self {
        Self { width, height, fit }
    }

    /// Combine with the natural size of the current image.
    pub fn geometry(&self, natural_width: u32, natural_height: u32) -> DisplayGeometry {
        DisplayGeometry {
            display_width: self.width,
            display_height: self.height,
            natural_width,
            natural_height,
            fit: self.fit,
        }
    }
}

/// Per-frame layout; never persisted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayGeometry {
    pub display_width: f32,
    pub display_height: f32,
    pub natural_width: u32,
    pub natural_height: u32,
    pub fit: FitMode,
}

/// The two values a stamp can write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PaintMode {
    Erase,
    Restore,
}

impl PaintMode {
    /// Mask value written by this mode: 0 = erased, 255 = kept.
    #[inline]
    pub fn value(self) -> u8 {
        match self {
            PaintMode::Erase => 0,
            PaintMode::Restore => 255,
        }
    }
}

/// Tool selection inside an edit session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ToolMode {
    #[default]
    None,
    Paint(PaintMode),
}

impl ToolMode {
    pub fn paint_mode(self) -> Option<PaintMode> {
        match self {
            ToolMode::None => None,
            ToolMode::Paint(mode) => Some(mode),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ToolMode::None => "NONE",
            ToolMode::Paint(PaintMode::Erase) => "ERASE",
            ToolMode::Paint(PaintMode::Restore) => "RESTORE",
        }
    }
}

/// Brush diameter in screen pixels, always within [MIN, MAX].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BrushSize(u32);

impl BrushSize {
    pub const MIN: u32 = 5;
    pub const MAX: u32 = 80;

    /// Out-of-range input is clamped, never rejected.
    pub fn new(size: i64) -> Self {
        Self(size.clamp(Self::MIN as i64, Self::MAX as i64) as u32)
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    /// Screen-space radius of the ring.
    #[inline]
    pub fn radius(self) -> f32 {
        self.0 as f32 / 2.0
    }

    pub fn step(self, delta: i64) -> Self {
        Self::new(self.0 as i64 + delta)
    }
}

impl Default for BrushSize {
    fn default() -> Self {
        Self(20)
    }
}

/// A single circular write in mask-pixel space. Applied, never stored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrushStamp {
    pub center_x: f32,
    pub center_y: f32,
    pub radius: f32,
    pub mode: PaintMode,
}

/// A position in mask (natural image) pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaskPoint {
    pub x: f32,
    pub y: f32,
}

impl MaskPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: MaskPoint) -> f32 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

/// Last known pointer position relative to the viewport. Preview only.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CursorState {
    pub screen_x: f32,
    pub screen_y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
}

/// Normalized pointer input, viewport-relative.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub screen_x: f32,
    pub screen_y: f32,
    /// Milliseconds since the host started.
    pub timestamp: u64,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, screen_x: f32, screen_y: f32, timestamp: u64) -> Self {
        Self { kind, screen_x, screen_y, timestamp }
    }

    pub fn down(x: f32, y: f32) -> Self { Self::new(PointerKind::Down, x, y, 0) }
    pub fn moved(x: f32, y: f32) -> Self { Self::new(PointerKind::Move, x, y, 0) }
    pub fn up(x: f32, y: f32) -> Self { Self::new(PointerKind::Up, x, y, 0) }
}
