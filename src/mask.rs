// Single-channel keep/erase mask at the source image's natural resolution.
// 255 = kept, 0 = erased. Two buffers: the working mask of the open edit
// session and the baseline left behind by the last Done.
//
// Both are `Arc<Vec<u8>>`: snapshots and commits share storage, and the first
// stamp after sharing copies the buffer once (`Arc::make_mut`). A snapshot held
// by the export worker therefore never changes under it.

use std::sync::Arc;

use crate::types::{BrushStamp, PaintMode};

pub const KEPT: u8 = 255;
pub const ERASED: u8 = 0;

/// Read-only, owned view of a mask at one point in time.
#[derive(Clone, Debug)]
pub struct MaskSnapshot {
    pub width: usize,
    pub height: usize,
    data: Arc<Vec<u8>>,
}

impl MaskSnapshot {
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }
}

#[derive(Clone, Debug)]
pub struct MaskBuffer {
    width: usize,
    height: usize,
    working: Arc<Vec<u8>>,
    baseline: Option<Arc<Vec<u8>>>,
    // Cleared by reset/discard; set once an erase stamp lands. Lets the preview
    // skip per-pixel blending for an untouched mask.
    may_have_erased: bool,
}

impl MaskBuffer {
    /// All-kept mask, no baseline.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            working: Arc::new(vec![KEPT; width * height]),
            baseline: None,
            may_have_erased: false,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.working
    }

    /// Value at (x, y); `None` outside the buffer.
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height { return None; }
        Some(self.working[y * self.width + x])
    }

    pub fn has_baseline(&self) -> bool {
        self.baseline.is_some()
    }

    pub fn may_have_erased(&self) -> bool {
        self.may_have_erased
    }

    pub fn apply(&mut self, stamp: &BrushStamp) -> usize {
        self.stamp(stamp.center_x, stamp.center_y, stamp.radius, stamp.mode)
    }

    /// Write `mode`'s value into every pixel within `radius` of (cx, cy),
    /// boundary inclusive. Clipped to the buffer; returns how many pixels changed.
    /// Cost is O(radius²), never O(area).
    pub fn stamp(&mut self, cx: f32, cy: f32, radius: f32, mode: PaintMode) -> usize {
        if !(radius > 0.0) || !cx.is_finite() || !cy.is_finite() || self.width == 0 || self.height == 0 {
            return 0;
        }

        // Bounding box of the disc, clipped.
        let min_x = (cx - radius).ceil().max(0.0);
        let min_y = (cy - radius).ceil().max(0.0);
        let max_x = (cx + radius).floor().min((self.width - 1) as f32);
        let max_y = (cy + radius).floor().min((self.height - 1) as f32);
        if min_x > max_x || min_y > max_y {
            return 0; // entirely outside
        }

        let value = mode.value();
        let r2 = radius * radius;
        let width = self.width;
        let (x0, x1, y0, y1) = (min_x as usize, max_x as usize, min_y as usize, max_y as usize);

        // Scan first so a no-op stamp does not force a copy of a shared buffer.
        let hits = |x: usize, y: usize| {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            dx * dx + dy * dy <= r2
        };
        let needs_write = (y0..=y1).any(|y| {
            (x0..=x1).any(|x| hits(x, y) && self.working[y * width + x] != value)
        });
        if !needs_write {
            return 0;
        }

        let pixels = Arc::make_mut(&mut self.working);
        let mut changed = 0;
        for y in y0..=y1 {
            let row = y * width;
            for x in x0..=x1 {
                if !hits(x, y) { continue; }
                let px = &mut pixels[row + x];
                if *px != value {
                    *px = value;
                    changed += 1;
                }
            }
        }
        if mode == PaintMode::Erase {
            self.may_have_erased = true;
        }
        changed
    }

    /// Every pixel back to kept. Baseline untouched.
    pub fn reset(&mut self) {
        match Arc::get_mut(&mut self.working) {
            Some(pixels) => pixels.fill(KEPT),
            None => self.working = Arc::new(vec![KEPT; self.width * self.height]),
        }
        self.may_have_erased = false;
    }

    /// O(1): shares the working buffer.
    pub fn snapshot(&self) -> MaskSnapshot {
        MaskSnapshot { width: self.width, height: self.height, data: Arc::clone(&self.working) }
    }

    /// Start an edit session from the baseline (or a fresh mask if nothing was committed).
    pub fn begin_session(&mut self) {
        self.discard();
    }

    /// Promote the working buffer to the baseline.
    pub fn commit(&mut self) {
        self.baseline = Some(Arc::clone(&self.working));
    }

    /// Throw away working edits: back to the baseline, or all-kept without one.
    pub fn discard(&mut self) {
        match &self.baseline {
            Some(base) => {
                self.working = Arc::clone(base);
                self.may_have_erased = base.iter().any(|&v| v != KEPT);
            }
            None => self.reset(),
        }
    }
}
