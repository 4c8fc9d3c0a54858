use core_types::PixelBuffer;
use tracing::debug;

/// Linear undo log of full buffer snapshots. The baseline (the committed
/// frame) is held apart from the edits so the stack can never be empty.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    baseline: PixelBuffer,
    edits: Vec<PixelBuffer>,
}

#[allow(clippy::len_without_is_empty)]
impl HistoryStack {
    pub fn new(baseline: PixelBuffer) -> Self {
        Self {
            baseline,
            edits: Vec::new(),
        }
    }

    pub fn push(&mut self, buffer: PixelBuffer) {
        debug_assert_eq!(
            buffer.dimensions(),
            self.baseline.dimensions(),
            "history entries must match the committed canvas"
        );
        self.edits.push(buffer);
        debug!("history push, depth={}", self.len());
    }

    /// Drops the newest entry. Returns false, and does nothing, when only the
    /// baseline is left.
    pub fn undo(&mut self) -> bool {
        let undone = self.edits.pop().is_some();
        debug!("history undo: undone={undone}, depth={}", self.len());
        undone
    }

    /// Back to `[baseline]`.
    pub fn reset(&mut self) {
        self.edits.clear();
        debug!("history reset");
    }

    pub fn top(&self) -> &PixelBuffer {
        self.edits.last().unwrap_or(&self.baseline)
    }

    pub fn baseline(&self) -> &PixelBuffer {
        &self.baseline
    }

    pub fn len(&self) -> usize {
        self.edits.len() + 1
    }

    pub fn can_undo(&self) -> bool {
        !self.edits.is_empty()
    }
}
