pub mod export;
pub mod history;
pub mod mask;
pub mod pin;
pub mod session;
pub mod transform;

use core_types::{CanvasSize, Checkerboard, PixelBuffer, Rgb};

pub use history::HistoryStack;
pub use mask::{ActiveStroke, MaskOperation};
pub use pin::{PinBoard, PinMarker};
pub use session::Editor;
pub use transform::{PanDrag, TransformState};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Source image could not be decoded: {0}")]
    SourceImageInvalid(String),

    #[error("Nothing to export: the framing step has not been committed")]
    NothingToExport,

    #[error("Masking requires a committed frame")]
    NotCommitted,

    #[error("The frame has already been committed")]
    AlreadyCommitted,

    #[error("Encode error: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Knobs the surrounding application can tune per editing session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorOptions {
    pub canvas: CanvasSize,
    pub checkerboard: Checkerboard,
    /// Wand tolerance, 0..=100.
    pub default_tolerance: u8,
    /// Brush diameter in canvas pixels.
    pub brush_size: u32,
    pub initial_target: Rgb,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            canvas: CanvasSize::default(),
            checkerboard: Checkerboard::default(),
            default_tolerance: mask::DEFAULT_TOLERANCE,
            brush_size: mask::DEFAULT_BRUSH_SIZE,
            initial_target: Rgb::WHITE,
        }
    }
}

pub struct ImageEngine {
    options: EditorOptions,
}

impl ImageEngine {
    pub fn new() -> Self {
        Self::with_options(EditorOptions::default())
    }

    pub fn with_options(options: EditorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// Decode an encoded photo (any format `image` understands) into RGBA8.
    pub fn decode_source(&self, bytes: &[u8]) -> Result<PixelBuffer> {
        export::decode_source(bytes)
    }

    /// Start a new editing session on an encoded photo.
    pub fn open_session(&self, bytes: &[u8]) -> Result<Editor> {
        Editor::open(bytes, self.options)
    }
}

impl Default for ImageEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_session_rejects_garbage() {
        let engine = ImageEngine::new();
        let err = engine.open_session(b"definitely not an image").err();
        assert!(matches!(err, Some(EngineError::SourceImageInvalid(_))));
    }

    #[test]
    fn open_session_uses_engine_options() {
        let options = EditorOptions {
            canvas: CanvasSize::new(32, 24),
            ..EditorOptions::default()
        };
        let engine = ImageEngine::with_options(options);
        let png = export::encode_png(&PixelBuffer::filled(4, 4, [9, 9, 9, 255])).unwrap();
        let editor = engine.open_session(&png).unwrap();
        assert_eq!(editor.options().canvas, CanvasSize::new(32, 24));
        assert_eq!(editor.source().dimensions(), (4, 4));
    }
}
