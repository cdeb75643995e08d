// Turns a pointer drag into brush stamps on the mask.
// Pointer events arrive far apart when the hand moves fast, so every segment
// between two consecutive samples is filled with stamps no further apart than
// half the stamp radius.

use crate::mask::MaskBuffer;
use crate::types::{BrushStamp, MaskPoint, PaintMode};

/// Stamp spacing as a fraction of the mask-space radius.
const SPACING: f32 = 0.5;

#[derive(Clone, Copy, Debug, Default)]
enum Stroke {
    #[default]
    Up,
    /// Pointer held down. `last` is the previous in-bounds sample, if any.
    Down { last: Option<MaskPoint> },
}

#[derive(Debug, Default)]
pub struct BrushEngine {
    stroke: Stroke,
}

impl BrushEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.stroke, Stroke::Down { .. })
    }

    /// Pointer down: stamp once at the press position (when it maps into the mask).
    pub fn begin(&mut self, at: Option<MaskPoint>, radius: f32, mode: PaintMode, mask: &mut MaskBuffer) -> usize {
        self.stroke = Stroke::Down { last: at };
        match at {
            Some(p) => mask.stamp(p.x, p.y, radius, mode),
            None => 0,
        }
    }

    /// Pointer moved while down. Returns the number of stamps issued.
    /// A sample outside the image breaks the stroke; the next in-bounds sample starts a new one.
    pub fn drag_to(&mut self, at: Option<MaskPoint>, radius: f32, mode: PaintMode, mask: &mut MaskBuffer) -> usize {
        let Stroke::Down { last } = self.stroke else {
            return 0;
        };
        self.stroke = Stroke::Down { last: at };

        let Some(to) = at else {
            return 0;
        };
        let mut stamps = 0;
        match last {
            Some(from) => {
                for p in segment_points(from, to, radius) {
                    mask.apply(&BrushStamp { center_x: p.x, center_y: p.y, radius, mode });
                    stamps += 1;
                }
            }
            None => {
                mask.stamp(to.x, to.y, radius, mode);
                stamps += 1;
            }
        }
        stamps
    }

    /// Pointer left the viewport while held. Still down, but the next sample
    /// will not be joined to the last one.
    pub fn break_stroke(&mut self) {
        if let Stroke::Down { .. } = self.stroke {
            self.stroke = Stroke::Down { last: None };
        }
    }

    /// Pointer up, tool cleared, or session left: stop stamping immediately.
    pub fn end(&mut self) {
        self.stroke = Stroke::Up;
    }
}

/// Stamp centers along `from -> to`, excluding `from` (already stamped) and
/// including `to`. Consecutive centers are at most `radius * SPACING` apart.
pub fn segment_points(from: MaskPoint, to: MaskPoint, radius: f32) -> impl Iterator<Item = MaskPoint> {
    let distance = from.distance(to);
    let spacing = (radius * SPACING).max(0.5);
    let steps = if distance.is_finite() { (distance / spacing).ceil().max(1.0) as usize } else { 1 };
    let (dx, dy) = (to.x - from.x, to.y - from.y);

    (1..=steps).map(move |i| {
        let t = i as f32 / steps as f32;
        MaskPoint::new(from.x + dx * t, from.y + dy * t)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::{ERASED, KEPT};

    #[test]
    fn segment_spacing_never_exceeds_half_radius() {
        let from = MaskPoint::new(0.0, 0.0);
        let to = MaskPoint::new(100.0, 0.0);
        let pts: Vec<_> = segment_points(from, to, 10.0).collect();
        assert_eq!(pts.len(), 20);
        assert_eq!(*pts.last().unwrap(), to);
        let mut prev = from;
        for p in pts {
            assert!(prev.distance(p) <= 5.0 + 1e-4);
            prev = p;
        }
    }

    #[test]
    fn zero_length_segment_stamps_endpoint_once() {
        let p = MaskPoint::new(3.0, 4.0);
        let pts: Vec<_> = segment_points(p, p, 10.0).collect();
        assert_eq!(pts, vec![p]);
    }

    #[test]
    fn fast_drag_leaves_no_gap() {
        let mut mask = MaskBuffer::new(400, 400);
        let mut brush = BrushEngine::new();
        brush.begin(Some(MaskPoint::new(100.0, 200.0)), 10.0, PaintMode::Erase, &mut mask);
        brush.drag_to(Some(MaskPoint::new(300.0, 200.0)), 10.0, PaintMode::Erase, &mut mask);
        for x in 100..=300 {
            assert_eq!(mask.get(x, 200), Some(ERASED), "gap at x={x}");
            assert_eq!(mask.get(x, 209), Some(ERASED), "thin stroke at x={x}");
        }
        assert_eq!(mask.get(50, 200), Some(KEPT));
    }

    #[test]
    fn no_stamps_when_up() {
        let mut mask = MaskBuffer::new(50, 50);
        let mut brush = BrushEngine::new();
        let n = brush.drag_to(Some(MaskPoint::new(25.0, 25.0)), 5.0, PaintMode::Erase, &mut mask);
        assert_eq!(n, 0);
        assert!(mask.data().iter().all(|&v| v == KEPT));

        brush.begin(Some(MaskPoint::new(10.0, 10.0)), 5.0, PaintMode::Erase, &mut mask);
        brush.end();
        assert_eq!(brush.drag_to(Some(MaskPoint::new(40.0, 40.0)), 5.0, PaintMode::Erase, &mut mask), 0);
        assert_eq!(mask.get(40, 40), Some(KEPT));
    }

    #[test]
    fn leaving_the_image_breaks_the_stroke() {
        let mut mask = MaskBuffer::new(100, 100);
        let mut brush = BrushEngine::new();
        brush.begin(Some(MaskPoint::new(10.0, 50.0)), 3.0, PaintMode::Erase, &mut mask);
        brush.drag_to(None, 3.0, PaintMode::Erase, &mut mask);
        brush.drag_to(Some(MaskPoint::new(90.0, 50.0)), 3.0, PaintMode::Erase, &mut mask);
        assert_eq!(mask.get(50, 50), Some(KEPT));
        assert_eq!(mask.get(90, 50), Some(ERASED));
    }

    #[test]
    fn break_stroke_keeps_drawing_without_joining() {
        let mut mask = MaskBuffer::new(100, 100);
        let mut brush = BrushEngine::new();
        brush.begin(Some(MaskPoint::new(10.0, 50.0)), 3.0, PaintMode::Erase, &mut mask);
        brush.break_stroke();
        assert!(brush.is_drawing());
        assert_eq!(brush.drag_to(Some(MaskPoint::new(90.0, 50.0)), 3.0, PaintMode::Erase, &mut mask), 1);
        assert_eq!(mask.get(50, 50), Some(KEPT));

        brush.end();
        brush.break_stroke();
        assert!(!brush.is_drawing());
    }
}
