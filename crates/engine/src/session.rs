//! One editing session: frame the photo, commit, then mask until export.
//!
//! Dropping an `Editor` cancels the session; nothing it holds outlives it.

use core_types::{PixelBuffer, Rgb, ToolAvailability};
use kurbo::Point;
use tracing::{debug, warn};

use crate::export;
use crate::history::HistoryStack;
use crate::mask::{self, ActiveStroke, MAX_BRUSH_SIZE, MIN_BRUSH_SIZE};
use crate::transform::{self, TransformState};
use crate::{EditorOptions, EngineError, Result};

/// Masking state, alive once the frame is committed.
#[derive(Debug, Clone)]
pub struct RetouchStage {
    history: HistoryStack,
    target: Rgb,
    stroke: Option<ActiveStroke>,
}

impl RetouchStage {
    fn new(baseline: PixelBuffer, target: Rgb) -> Self {
        Self {
            history: HistoryStack::new(baseline),
            target,
            stroke: None,
        }
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn target(&self) -> Rgb {
        self.target
    }

    pub fn is_stroking(&self) -> bool {
        self.stroke.is_some()
    }

    /// What the user currently sees: the in-progress stroke if any, else the
    /// history top.
    pub fn current(&self) -> &PixelBuffer {
        match &self.stroke {
            Some(stroke) => stroke.buffer(),
            None => self.history.top(),
        }
    }

    fn settle_stroke(&mut self) -> bool {
        match self.stroke.take() {
            Some(stroke) => {
                debug!("stroke finished with {} samples", stroke.points().len());
                self.history.push(stroke.finish());
                true
            }
            None => false,
        }
    }

    fn apply_wand(&mut self, tolerance: u8) {
        let next = mask::apply_magic_wand(self.history.top(), self.target, tolerance);
        self.history.push(next);
    }
}

#[derive(Debug, Clone)]
enum Stage {
    Framing,
    Retouch(RetouchStage),
}

pub struct Editor {
    source: PixelBuffer,
    options: EditorOptions,
    transform: TransformState,
    brush_size: u32,
    stage: Stage,
}

impl Editor {
    pub fn open(bytes: &[u8], options: EditorOptions) -> Result<Self> {
        let source = export::decode_source(bytes)?;
        Ok(Self::from_buffer(source, options))
    }

    pub fn from_buffer(source: PixelBuffer, options: EditorOptions) -> Self {
        debug!(
            "editor session opened: source {}x{}, canvas {}x{}",
            source.width(),
            source.height(),
            options.canvas.width,
            options.canvas.height
        );
        Self {
            source,
            brush_size: options.brush_size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE),
            options,
            transform: TransformState::default(),
            stage: Stage::Framing,
        }
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn source(&self) -> &PixelBuffer {
        &self.source
    }

    pub fn is_committed(&self) -> bool {
        matches!(self.stage, Stage::Retouch(_))
    }

    // ---- framing -------------------------------------------------------

    pub fn transform(&self) -> &TransformState {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> Result<&mut TransformState> {
        match self.stage {
            Stage::Framing => Ok(&mut self.transform),
            Stage::Retouch(_) => Err(EngineError::AlreadyCommitted),
        }
    }

    /// Fresh framing preview for the current transform.
    pub fn preview(&self) -> Result<PixelBuffer> {
        match self.stage {
            Stage::Framing => Ok(transform::render(
                &self.source,
                &self.transform,
                self.options.canvas,
                &self.options.checkerboard,
            )),
            Stage::Retouch(_) => Err(EngineError::AlreadyCommitted),
        }
    }

    /// Freeze the frame into the history baseline and switch to masking.
    pub fn commit(&mut self) -> Result<&PixelBuffer> {
        if self.is_committed() {
            return Err(EngineError::AlreadyCommitted);
        }
        let baseline = transform::commit(
            &self.source,
            &self.transform,
            self.options.canvas,
            &self.options.checkerboard,
        );
        self.stage = Stage::Retouch(RetouchStage::new(baseline, self.options.initial_target));
        let retouch = self.retouch()?;
        Ok(retouch.history.baseline())
    }

    // ---- masking -------------------------------------------------------

    pub fn retouch(&self) -> Result<&RetouchStage> {
        match &self.stage {
            Stage::Retouch(stage) => Ok(stage),
            Stage::Framing => Err(EngineError::NotCommitted),
        }
    }

    fn retouch_mut(&mut self) -> Result<&mut RetouchStage> {
        match &mut self.stage {
            Stage::Retouch(stage) => Ok(stage),
            Stage::Framing => Err(EngineError::NotCommitted),
        }
    }

    pub fn current(&self) -> Result<&PixelBuffer> {
        Ok(self.retouch()?.current())
    }

    pub fn history_len(&self) -> usize {
        self.retouch().map(|r| r.history.len()).unwrap_or(0)
    }

    pub fn brush_size(&self) -> u32 {
        self.brush_size
    }

    pub fn set_brush_size(&mut self, size: u32) {
        self.brush_size = size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE);
    }

    /// Sample the colour under `point` and remove everything close to it.
    /// Picking a transparent (or off-canvas) pixel does nothing and returns
    /// false.
    pub fn pick_magic_wand(&mut self, point: Point, tolerance: u8) -> Result<bool> {
        let retouch = self.retouch_mut()?;
        retouch.settle_stroke();
        let Some(target) = mask::sample_target(retouch.history.top(), point) else {
            debug!("wand pick at ({}, {}) hit a transparent pixel", point.x, point.y);
            return Ok(false);
        };
        retouch.target = target;
        retouch.apply_wand(tolerance);
        Ok(true)
    }

    /// Re-run the wand with the last picked target, e.g. on slider release.
    pub fn reapply_magic_wand(&mut self, tolerance: u8) -> Result<()> {
        let retouch = self.retouch_mut()?;
        retouch.settle_stroke();
        retouch.apply_wand(tolerance);
        Ok(())
    }

    /// What the wand would produce at `tolerance`, without touching history.
    pub fn preview_magic_wand(&self, tolerance: u8) -> Result<PixelBuffer> {
        let retouch = self.retouch()?;
        Ok(mask::apply_magic_wand(
            retouch.current(),
            retouch.target,
            tolerance,
        ))
    }

    pub fn begin_stroke(&mut self, point: Point) -> Result<()> {
        let radius = mask::brush_radius(self.brush_size);
        let retouch = self.retouch_mut()?;
        if retouch.settle_stroke() {
            warn!("begin_stroke while a stroke was active; previous stroke committed");
        }
        retouch.stroke = Some(ActiveStroke::begin(retouch.history.top(), point, radius));
        Ok(())
    }

    /// Adds a pointer sample to the active stroke. Returns false if no stroke
    /// is in progress.
    pub fn stroke_to(&mut self, point: Point) -> Result<bool> {
        let retouch = self.retouch_mut()?;
        match retouch.stroke.as_mut() {
            Some(stroke) => {
                stroke.extend(point);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Pointer release: the whole drag becomes one history entry.
    pub fn end_stroke(&mut self) -> Result<bool> {
        Ok(self.retouch_mut()?.settle_stroke())
    }

    /// Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool> {
        let retouch = self.retouch_mut()?;
        retouch.settle_stroke();
        Ok(retouch.history.undo())
    }

    pub fn reset(&mut self) -> Result<()> {
        let retouch = self.retouch_mut()?;
        retouch.stroke = None;
        retouch.history.reset();
        Ok(())
    }

    pub fn availability(&self) -> ToolAvailability {
        match &self.stage {
            Stage::Framing => ToolAvailability::CAN_FRAME,
            Stage::Retouch(retouch) => {
                let mut flags = ToolAvailability::CAN_MASK | ToolAvailability::CAN_EXPORT;
                if retouch.history.can_undo() || retouch.is_stroking() {
                    flags |= ToolAvailability::CAN_UNDO | ToolAvailability::CAN_RESET;
                }
                flags
            }
        }
    }

    /// Final raster as PNG. A stroke still in progress is committed first.
    pub fn export_png(&mut self) -> Result<Vec<u8>> {
        let retouch = match &mut self.stage {
            Stage::Retouch(stage) => stage,
            Stage::Framing => return Err(EngineError::NothingToExport),
        };
        retouch.settle_stroke();
        let top = retouch.history.top();
        debug!(
            "exporting {}x{} after {} history entries",
            top.width(),
            top.height(),
            retouch.history.len()
        );
        export::encode_png(top)
    }
}
