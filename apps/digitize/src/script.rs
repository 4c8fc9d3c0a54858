//! JSON edit scripts: a replayable record of one framing + retouch session.

use anyhow::{Context, Result};
use core_types::PinPosition;
use engine::pin::pointer_to_canvas;
use engine::{Editor, PinBoard};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditScript {
    #[serde(default)]
    pub transform: Option<FrameRequest>,
    /// `[x0, y0, x1, y1]` of the retouch view on screen. When set, step
    /// coordinates are pointer positions over that view; otherwise they are
    /// canvas pixels.
    #[serde(default)]
    pub view: Option<[f64; 4]>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub pin: Option<PinRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRequest {
    #[serde(default = "unit_scale")]
    pub scale: f64,
    /// Degrees, clockwise.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub pan: [f64; 2],
}

fn unit_scale() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    MagicWand {
        x: f64,
        y: f64,
        #[serde(default)]
        tolerance: Option<u8>,
    },
    Reapply {
        tolerance: u8,
    },
    Stroke {
        points: Vec<[f64; 2]>,
        #[serde(default)]
        size: Option<u32>,
    },
    Undo,
    Reset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinRequest {
    pub pointer: [f64; 2],
    /// `[x0, y0, x1, y1]` of the displayed image.
    pub bounds: [f64; 4],
}

impl EditScript {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid edit script")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub pin: Option<PinPosition>,
    pub history_len: usize,
}

/// Frames, commits and retouches `editor` as the script describes.
pub fn replay(editor: &mut Editor, script: &EditScript) -> Result<Outcome> {
    if let Some(frame) = &script.transform {
        let state = editor.transform_mut()?;
        state.set_scale(frame.scale);
        state.rotate_by(frame.rotation);
        state.translation = Vec2::new(frame.pan[0], frame.pan[1]);
    }
    editor.commit()?;

    let canvas = editor.options().canvas;
    let view = script.view.map(|[x0, y0, x1, y1]| Rect::new(x0, y0, x1, y1));
    let to_canvas = |x: f64, y: f64| -> Result<Point> {
        let pointer = Point::new(x, y);
        match view {
            Some(view) => pointer_to_canvas(pointer, view, canvas)
                .with_context(|| format!("script view {view:?} has no area")),
            None => Ok(pointer),
        }
    };

    let default_tolerance = editor.options().default_tolerance;
    for (index, step) in script.steps.iter().enumerate() {
        debug!("step {index}: {step:?}");
        match step {
            Step::MagicWand { x, y, tolerance } => {
                let tolerance = tolerance.unwrap_or(default_tolerance);
                if !editor.pick_magic_wand(to_canvas(*x, *y)?, tolerance)? {
                    warn!("step {index}: magic wand picked a transparent pixel");
                }
            }
            Step::Reapply { tolerance } => editor.reapply_magic_wand(*tolerance)?,
            Step::Stroke { points, size } => {
                if let Some(size) = size {
                    editor.set_brush_size(*size);
                }
                let points = points
                    .iter()
                    .map(|[x, y]| to_canvas(*x, *y))
                    .collect::<Result<Vec<_>>>()?;
                let mut points = points.into_iter();
                let Some(first) = points.next() else {
                    warn!("step {index}: empty stroke skipped");
                    continue;
                };
                editor.begin_stroke(first)?;
                for point in points {
                    editor.stroke_to(point)?;
                }
                editor.end_stroke()?;
            }
            Step::Undo => {
                editor.undo()?;
            }
            Step::Reset => editor.reset()?,
        }
    }

    let pin = script.pin.as_ref().and_then(|request| {
        let [x0, y0, x1, y1] = request.bounds;
        let bounds = Rect::new(x0, y0, x1, y1);
        let pin = PinBoard::default().click(Point::new(request.pointer[0], request.pointer[1]), bounds);
        if pin.is_none() {
            warn!("pin bounds {bounds:?} are empty, pin skipped");
        }
        pin
    });

    Ok(Outcome {
        pin,
        history_len: editor.history_len(),
    })
}
