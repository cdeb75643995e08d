// Edit-session state machine.
// The tool mode lives inside the `Editing` phase, so "erase while idle" cannot
// be represented. `next_phase` is the whole transition table; `ToolController`
// runs it and carries out the mask side effects.

use std::sync::Arc;

use crate::brush::BrushEngine;
use crate::mapping::CoordinateMapper;
use crate::mask::MaskBuffer;
use crate::source::SourceImage;
use crate::types::{BrushSize, CursorState, PaintMode, PointerEvent, PointerKind, ToolMode, Viewport};
use crate::worker::ExportJob;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionPhase {
    /// No image, or an image that has never been committed and is not being edited.
    #[default]
    Idle,
    /// Edit panel open.
    Editing(ToolMode),
    /// Last session ended with Done; the baseline holds its edits.
    Done,
}

impl SessionPhase {
    pub fn tool(self) -> ToolMode {
        match self {
            SessionPhase::Editing(tool) => tool,
            _ => ToolMode::None,
        }
    }

    pub fn is_editing(self) -> bool {
        matches!(self, SessionPhase::Editing(_))
    }

    pub fn label(self) -> &'static str {
        match self {
            SessionPhase::Idle => "IDLE",
            SessionPhase::Editing(_) => "EDIT",
            SessionPhase::Done => "DONE",
        }
    }
}

/// UI actions other than upload and pointer input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    OpenEdit,
    SelectTool(PaintMode),
    ClearTool,
    SetBrushSize(i64),
    Reset,
    Close,
    Done,
}

/// Transition table. `None` means the action is not available in `phase`.
pub fn next_phase(phase: SessionPhase, action: Action, has_image: bool, has_baseline: bool) -> Option<SessionPhase> {
    use SessionPhase::*;
    match (phase, action) {
        (Idle, Action::OpenEdit) if has_image => Some(Editing(ToolMode::None)),
        (Done, Action::OpenEdit) => Some(Editing(ToolMode::None)),
        (Editing(_), Action::SelectTool(mode)) => Some(Editing(ToolMode::Paint(mode))),
        (Editing(_), Action::ClearTool) => Some(Editing(ToolMode::None)),
        (Editing(tool), Action::SetBrushSize(_)) => Some(Editing(tool)),
        (Editing(tool), Action::Reset) => Some(Editing(tool)),
        (Editing(_), Action::Close) => Some(if has_baseline { Done } else { Idle }),
        (Editing(_), Action::Done) => Some(Done),
        _ => None,
    }
}

/// What a handled event did, so the host knows whether to redraw or export.
#[derive(Debug)]
pub enum Effect {
    Ignored,
    Updated,
    MaskChanged,
    Committed(ExportJob),
}

impl Effect {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Effect::Ignored)
    }
}

#[derive(Debug, Default)]
pub struct ToolController {
    phase: SessionPhase,
    brush_size: BrushSize,
    source: Option<Arc<SourceImage>>,
    mask: Option<MaskBuffer>,
    brush: BrushEngine,
    cursor: Option<CursorState>,
}

impl ToolController {
    pub fn new(brush_size: BrushSize) -> Self {
        Self { brush_size, ..Self::default() }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn tool(&self) -> ToolMode {
        self.phase.tool()
    }

    pub fn brush_size(&self) -> BrushSize {
        self.brush_size
    }

    pub fn source(&self) -> Option<&Arc<SourceImage>> {
        self.source.as_ref()
    }

    pub fn mask(&self) -> Option<&MaskBuffer> {
        self.mask.as_ref()
    }

    pub fn cursor(&self) -> Option<CursorState> {
        self.cursor
    }

    pub fn is_drawing(&self) -> bool {
        self.brush.is_drawing()
    }

    /// Upload: replaces the image, drops any mask and baseline, back to idle.
    pub fn load_image(&mut self, image: SourceImage) -> Effect {
        let (w, h) = (image.width() as usize, image.height() as usize);
        log::info!("loaded image {} ({w}x{h})", image.id());
        self.source = Some(Arc::new(image));
        self.mask = Some(MaskBuffer::new(w, h));
        self.phase = SessionPhase::Idle;
        self.brush.end();
        self.cursor = None;
        Effect::MaskChanged
    }

    pub fn apply(&mut self, action: Action) -> Effect {
        let has_baseline = self.mask.as_ref().is_some_and(MaskBuffer::has_baseline);
        let Some(next) = next_phase(self.phase, action, self.source.is_some(), has_baseline) else {
            log::debug!("{action:?} ignored in {:?}", self.phase);
            return Effect::Ignored;
        };
        log::debug!("{:?} --{action:?}--> {next:?}", self.phase);
        self.phase = next;

        match action {
            Action::OpenEdit => {
                if let Some(mask) = self.mask.as_mut() {
                    mask.begin_session();
                }
                Effect::MaskChanged
            }
            Action::SelectTool(_) | Action::ClearTool => {
                self.brush.end();
                Effect::Updated
            }
            Action::SetBrushSize(size) => {
                self.brush_size = BrushSize::new(size);
                Effect::Updated
            }
            Action::Reset => {
                self.brush.end();
                if let Some(mask) = self.mask.as_mut() {
                    mask.reset();
                }
                Effect::MaskChanged
            }
            Action::Close => {
                self.leave_session();
                if let Some(mask) = self.mask.as_mut() {
                    mask.discard();
                }
                Effect::MaskChanged
            }
            Action::Done => {
                self.leave_session();
                match self.mask.as_mut() {
                    Some(mask) => {
                        mask.commit();
                        log::info!("committed mask");
                        self.export_job().map_or(Effect::Updated, Effect::Committed)
                    }
                    None => Effect::Updated,
                }
            }
        }
    }

    /// Job for the export worker from the current mask; used on Done and for retries.
    pub fn export_job(&self) -> Option<ExportJob> {
        let source = self.source.as_ref()?;
        let mask = self.mask.as_ref()?;
        Some(ExportJob { source: Arc::clone(source), mask: mask.snapshot() })
    }

    /// Handle one pointer event. Geometry is rebuilt from `viewport` every time.
    pub fn pointer(&mut self, event: PointerEvent, viewport: &Viewport) -> Effect {
        let SessionPhase::Editing(tool) = self.phase else {
            return Effect::Ignored;
        };
        let (Some(source), Some(mask)) = (self.source.as_ref(), self.mask.as_mut()) else {
            return Effect::Ignored;
        };

        let mapper = CoordinateMapper::new(viewport.geometry(source.width(), source.height()));
        let at = mapper.to_mask_space(event.screen_x, event.screen_y);
        self.cursor = at.map(|_| CursorState { screen_x: event.screen_x, screen_y: event.screen_y });

        if event.kind == PointerKind::Up {
            self.brush.end();
            return Effect::Updated;
        }
        let Some(mode) = tool.paint_mode() else {
            return Effect::Updated;
        };
        let Some(radius) = mapper.mask_radius(self.brush_size.radius()) else {
            return Effect::Updated;
        };

        let stamps = match event.kind {
            PointerKind::Down => {
                self.brush.begin(at, radius, mode, mask);
                usize::from(at.is_some())
            }
            PointerKind::Move => self.brush.drag_to(at, radius, mode, mask),
            PointerKind::Up => 0,
        };
        if stamps > 0 { Effect::MaskChanged } else { Effect::Updated }
    }

    /// Pointer left the viewport: hide the ring. A held drag that comes back
    /// starts a new stroke instead of joining across the outside.
    pub fn pointer_leave(&mut self) {
        self.cursor = None;
        self.brush.break_stroke();
    }

    fn leave_session(&mut self) {
        self.brush.end();
        self.cursor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::{ERASED, KEPT};
    use crate::types::FitMode;
    use image::{Rgba, RgbaImage};

    fn image(w: u32, h: u32) -> SourceImage {
        SourceImage::from_rgba(RgbaImage::from_pixel(w, h, Rgba([200, 100, 50, 255]))).unwrap()
    }

    fn viewport() -> Viewport {
        Viewport::new(100.0, 100.0, FitMode::Cover)
    }

    #[test]
    fn table_rejects_editing_actions_outside_editing() {
        for phase in [SessionPhase::Idle, SessionPhase::Done] {
            assert_eq!(next_phase(phase, Action::SelectTool(PaintMode::Erase), true, true), None);
            assert_eq!(next_phase(phase, Action::Reset, true, true), None);
            assert_eq!(next_phase(phase, Action::Done, true, true), None);
            assert_eq!(next_phase(phase, Action::Close, true, true), None);
        }
        assert_eq!(next_phase(SessionPhase::Idle, Action::OpenEdit, false, false), None);
        assert_eq!(
            next_phase(SessionPhase::Editing(ToolMode::None), Action::OpenEdit, true, false),
            None
        );
    }

    #[test]
    fn close_returns_to_done_once_committed() {
        let editing = SessionPhase::Editing(ToolMode::Paint(PaintMode::Erase));
        assert_eq!(next_phase(editing, Action::Close, true, false), Some(SessionPhase::Idle));
        assert_eq!(next_phase(editing, Action::Close, true, true), Some(SessionPhase::Done));
    }

    #[test]
    fn open_edit_without_image_is_ignored() {
        let mut c = ToolController::default();
        assert!(c.apply(Action::OpenEdit).is_ignored());
        assert_eq!(c.phase(), SessionPhase::Idle);
    }

    #[test]
    fn brush_size_is_clamped_and_tool_kept() {
        let mut c = ToolController::default();
        c.load_image(image(10, 10));
        c.apply(Action::OpenEdit);
        c.apply(Action::SelectTool(PaintMode::Restore));
        c.apply(Action::SetBrushSize(1000));
        assert_eq!(c.brush_size().get(), 80);
        c.apply(Action::SetBrushSize(1));
        assert_eq!(c.brush_size().get(), 5);
        assert_eq!(c.tool(), ToolMode::Paint(PaintMode::Restore));
    }

    #[test]
    fn no_stamps_with_tool_none() {
        let mut c = ToolController::default();
        c.load_image(image(100, 100));
        c.apply(Action::OpenEdit);
        c.pointer(PointerEvent::down(50.0, 50.0), &viewport());
        c.pointer(PointerEvent::moved(60.0, 50.0), &viewport());
        assert!(c.mask().unwrap().data().iter().all(|&v| v == KEPT));
        assert!(c.cursor().is_some());
    }

    #[test]
    fn pointer_ignored_when_not_editing() {
        let mut c = ToolController::default();
        c.load_image(image(100, 100));
        assert!(c.pointer(PointerEvent::down(50.0, 50.0), &viewport()).is_ignored());
        assert!(c.cursor().is_none());
    }

    #[test]
    fn reset_keeps_tool_and_size() {
        let mut c = ToolController::default();
        c.load_image(image(100, 100));
        c.apply(Action::OpenEdit);
        c.apply(Action::SelectTool(PaintMode::Erase));
        c.apply(Action::SetBrushSize(30));
        c.pointer(PointerEvent::down(50.0, 50.0), &viewport());
        assert_eq!(c.mask().unwrap().get(50, 50), Some(ERASED));
        c.apply(Action::Reset);
        assert!(c.mask().unwrap().data().iter().all(|&v| v == KEPT));
        assert_eq!(c.tool(), ToolMode::Paint(PaintMode::Erase));
        assert_eq!(c.brush_size().get(), 30);
    }

    #[test]
    fn switching_tool_ends_the_stroke() {
        let mut c = ToolController::default();
        c.load_image(image(100, 100));
        c.apply(Action::OpenEdit);
        c.apply(Action::SelectTool(PaintMode::Erase));
        c.pointer(PointerEvent::down(10.0, 10.0), &viewport());
        assert!(c.is_drawing());
        c.apply(Action::SelectTool(PaintMode::Restore));
        assert!(!c.is_drawing());
    }

    #[test]
    fn leaving_hides_cursor() {
        let mut c = ToolController::default();
        c.load_image(image(100, 100));
        c.apply(Action::OpenEdit);
        c.pointer(PointerEvent::moved(10.0, 10.0), &viewport());
        assert!(c.cursor().is_some());
        c.pointer_leave();
        assert!(c.cursor().is_none());
        c.pointer(PointerEvent::moved(150.0, 10.0), &viewport());
        assert!(c.cursor().is_none());
    }

    #[test]
    fn upload_clears_baseline() {
        let mut c = ToolController::default();
        c.load_image(image(100, 100));
        c.apply(Action::OpenEdit);
        c.apply(Action::SelectTool(PaintMode::Erase));
        c.pointer(PointerEvent::down(50.0, 50.0), &viewport());
        assert!(matches!(c.apply(Action::Done), Effect::Committed(_)));
        assert_eq!(c.phase(), SessionPhase::Done);

        c.load_image(image(100, 100));
        assert_eq!(c.phase(), SessionPhase::Idle);
        assert!(!c.mask().unwrap().has_baseline());
        assert!(c.mask().unwrap().data().iter().all(|&v| v == KEPT));
    }
}
