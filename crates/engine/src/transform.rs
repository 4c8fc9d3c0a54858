//! Framing: composites the source photo onto the working canvas under
//! pan / zoom / rotation.
//!
//! The pivot for rotation and zoom is the canvas centre shifted by the pan
//! offset, so dragging first and rotating afterwards turns the image in
//! place. Nothing is clamped: the photo may leave the canvas entirely, in
//! which case only the checkerboard remains.

use core_types::{CanvasSize, Checkerboard, PixelBuffer};
use kurbo::{Affine, Point, Vec2};
use tracing::debug;

/// Zoom slider range.
pub const MIN_SCALE: f64 = 0.5;
pub const MAX_SCALE: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformState {
    pub scale: f64,
    pub rotation_degrees: f64,
    /// Pan offset in canvas pixels.
    pub translation: Vec2,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotation_degrees: 0.0,
            translation: Vec2::ZERO,
        }
    }
}

impl TransformState {
    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
    }

    pub fn rotate_by(&mut self, degrees: f64) {
        self.rotation_degrees += degrees;
    }

    pub fn normalized_rotation(&self) -> f64 {
        self.rotation_degrees.rem_euclid(360.0)
    }

    /// Source pixel space -> canvas pixel space.
    pub fn to_affine(&self, source: (u32, u32), canvas: CanvasSize) -> Affine {
        let (w, h) = (source.0 as f64, source.1 as f64);
        Affine::translate(canvas.center())
            * Affine::translate(self.translation)
            * Affine::rotate(self.normalized_rotation().to_radians())
            * Affine::scale(self.scale)
            * Affine::translate((-w / 2.0, -h / 2.0))
    }
}

/// Pointer drag that pans the photo.
#[derive(Debug, Clone, Copy)]
pub struct PanDrag {
    anchor: Vec2,
}

impl PanDrag {
    pub fn begin(pointer: Point, state: &TransformState) -> Self {
        Self {
            anchor: pointer.to_vec2() - state.translation,
        }
    }

    pub fn update(&self, pointer: Point, state: &mut TransformState) {
        state.translation = pointer.to_vec2() - self.anchor;
    }
}

/// Composite `source` onto a checkerboard canvas. Pure; call as often as the
/// preview needs refreshing.
pub fn render(
    source: &PixelBuffer,
    state: &TransformState,
    canvas: CanvasSize,
    backdrop: &Checkerboard,
) -> PixelBuffer {
    let mut out = backdrop.render(canvas);

    let forward = state.to_affine(source.dimensions(), canvas);
    let det = forward.determinant();
    if !det.is_finite() || det.abs() < f64::EPSILON {
        return out;
    }
    let inverse = forward.inverse();

    let (sw, sh) = (source.width() as f64, source.height() as f64);
    let width = canvas.width as usize;
    for (idx, px) in out.pixels_mut().enumerate() {
        let (x, y) = (idx % width, idx / width);
        let p = inverse * Point::new(x as f64 + 0.5, y as f64 + 0.5);
        if p.x < 0.0 || p.y < 0.0 || p.x >= sw || p.y >= sh {
            continue;
        }
        let src = sample_bilinear(source, p.x - 0.5, p.y - 0.5);
        composite_over(px, src);
    }
    out
}

/// Produce the baseline buffer that seeds history. Same pixels as `render`.
pub fn commit(
    source: &PixelBuffer,
    state: &TransformState,
    canvas: CanvasSize,
    backdrop: &Checkerboard,
) -> PixelBuffer {
    debug!(
        "committing frame: scale={} rotation={} pan=({}, {}) canvas={}x{}",
        state.scale,
        state.normalized_rotation(),
        state.translation.x,
        state.translation.y,
        canvas.width,
        canvas.height
    );
    render(source, state, canvas, backdrop)
}

/// Edge-clamped bilinear sample at pixel-index coordinates. Returns
/// premultiplied RGB in 0..=255 and alpha in 0..=1.
fn sample_bilinear(source: &PixelBuffer, fx: f64, fy: f64) -> [f64; 4] {
    let max_x = (source.width() - 1) as f64;
    let max_y = (source.height() - 1) as f64;
    let fx = fx.clamp(0.0, max_x);
    let fy = fy.clamp(0.0, max_y);

    let x0 = fx.floor();
    let y0 = fy.floor();
    let tx = fx - x0;
    let ty = fy - y0;
    let x1 = (x0 + 1.0).min(max_x);
    let y1 = (y0 + 1.0).min(max_y);

    let taps = [
        (x0, y0, (1.0 - tx) * (1.0 - ty)),
        (x1, y0, tx * (1.0 - ty)),
        (x0, y1, (1.0 - tx) * ty),
        (x1, y1, tx * ty),
    ];

    let mut acc = [0.0f64; 4];
    for (x, y, weight) in taps {
        if weight == 0.0 {
            continue;
        }
        let Some(px) = source.pixel(x as u32, y as u32) else {
            continue;
        };
        let a = px[3] as f64 / 255.0;
        acc[0] += px[0] as f64 * a * weight;
        acc[1] += px[1] as f64 * a * weight;
        acc[2] += px[2] as f64 * a * weight;
        acc[3] += a * weight;
    }
    acc
}

/// Source-over onto an opaque destination pixel.
fn composite_over(dst: &mut [u8], src: [f64; 4]) {
    let inv = 1.0 - src[3];
    for c in 0..3 {
        let v = src[c] + dst[c] as f64 * inv;
        dst[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = 255;
}
