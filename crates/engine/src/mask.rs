//! Destructive masking: colour-distance background removal and brush erase.
//! Every function here leaves its input untouched or works on a buffer the
//! caller exclusively owns.

use core_types::{PixelBuffer, Rgb};
use kurbo::{Point, Rect};

/// Converts the 0..=100 tolerance slider into an RGB distance threshold.
pub const TOLERANCE_SCALE: f64 = 2.5;
pub const MAX_TOLERANCE: u8 = 100;
pub const DEFAULT_TOLERANCE: u8 = 20;

/// Brush sizes are diameters in canvas pixels.
pub const MIN_BRUSH_SIZE: u32 = 5;
pub const MAX_BRUSH_SIZE: u32 = 80;
pub const DEFAULT_BRUSH_SIZE: u32 = 20;

pub fn wand_threshold(tolerance: u8) -> f64 {
    tolerance.min(MAX_TOLERANCE) as f64 * TOLERANCE_SCALE
}

pub fn brush_radius(size: u32) -> f64 {
    size as f64 / 2.0
}

/// Colour under `point`, or `None` if the point is off-canvas or the pixel is
/// fully transparent (nothing meaningful to pick).
pub fn sample_target(buffer: &PixelBuffer, point: Point) -> Option<Rgb> {
    if !(point.x >= 0.0 && point.y >= 0.0) {
        return None;
    }
    let px = buffer.pixel(point.x.floor() as u32, point.y.floor() as u32)?;
    if px[3] == 0 {
        return None;
    }
    Some(Rgb::from_rgba(px))
}

/// Returns a copy of `buffer` where every visible pixel closer than
/// `tolerance * 2.5` to `target` has its alpha cleared.
pub fn apply_magic_wand(buffer: &PixelBuffer, target: Rgb, tolerance: u8) -> PixelBuffer {
    let mut out = buffer.clone();
    clear_matching(&mut out, target, tolerance);
    out
}

/// In-place variant; returns how many pixels became transparent.
pub fn clear_matching(buffer: &mut PixelBuffer, target: Rgb, tolerance: u8) -> usize {
    let threshold = wand_threshold(tolerance);
    let limit = threshold * threshold;
    let mut cleared = 0;
    for px in buffer.pixels_mut() {
        if px[3] == 0 {
            continue;
        }
        let dist_sq = Rgb::new(px[0], px[1], px[2]).distance_sq(target);
        if (dist_sq as f64) < limit {
            px[3] = 0;
            cleared += 1;
        }
    }
    cleared
}

/// Clear alpha of every pixel whose centre lies inside the disc of `radius`
/// around `center`. Returns the clipped pixel bounds that were visited,
/// `None` if the disc misses the buffer entirely.
pub fn erase_disc(buffer: &mut PixelBuffer, center: Point, radius: f64) -> Option<Rect> {
    if buffer.width() == 0 || buffer.height() == 0 || radius.is_nan() || radius < 0.0 {
        return None;
    }
    // Pixel (x, y) has its centre at (x + 0.5, y + 0.5), as in `transform::render`.
    let max_x = buffer.width() as i64 - 1;
    let max_y = buffer.height() as i64 - 1;
    let x0 = ((center.x - radius - 0.5).ceil() as i64).max(0);
    let y0 = ((center.y - radius - 0.5).ceil() as i64).max(0);
    let x1 = ((center.x + radius - 0.5).floor() as i64).min(max_x);
    let y1 = ((center.y + radius - 0.5).floor() as i64).min(max_y);
    if x0 > x1 || y0 > y1 {
        return None;
    }

    let r2 = radius * radius;
    for y in y0..=y1 {
        let dy = y as f64 + 0.5 - center.y;
        for x in x0..=x1 {
            let dx = x as f64 + 0.5 - center.x;
            if dx * dx + dy * dy <= r2 {
                buffer.set_alpha(x as u32, y as u32, 0);
            }
        }
    }
    Some(Rect::new(
        x0 as f64,
        y0 as f64,
        (x1 + 1) as f64,
        (y1 + 1) as f64,
    ))
}

/// A brush drag in progress. Dabs accumulate on a private copy of the
/// history top; the finished buffer becomes one history entry.
#[derive(Debug, Clone)]
pub struct ActiveStroke {
    buffer: PixelBuffer,
    radius: f64,
    points: Vec<Point>,
}

impl ActiveStroke {
    pub fn begin(base: &PixelBuffer, start: Point, radius: f64) -> Self {
        let mut stroke = Self {
            buffer: base.clone(),
            radius,
            points: Vec::new(),
        };
        stroke.extend(start);
        stroke
    }

    pub fn extend(&mut self, point: Point) -> Option<Rect> {
        self.points.push(point);
        erase_disc(&mut self.buffer, point, self.radius)
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn to_operation(&self) -> MaskOperation {
        MaskOperation::BrushStroke {
            points: self.points.clone(),
            radius: self.radius,
        }
    }

    pub fn finish(self) -> PixelBuffer {
        self.buffer
    }
}

/// One committed masking step, replayable against any buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum MaskOperation {
    MagicWand { target: Rgb, tolerance: u8 },
    BrushStroke { points: Vec<Point>, radius: f64 },
}

impl MaskOperation {
    pub fn apply(&self, buffer: &PixelBuffer) -> PixelBuffer {
        match self {
            MaskOperation::MagicWand { target, tolerance } => {
                apply_magic_wand(buffer, *target, *tolerance)
            }
            MaskOperation::BrushStroke { points, radius } => {
                let mut out = buffer.clone();
                for p in points {
                    erase_disc(&mut out, *p, *radius);
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_pixel(rgb: [u8; 3]) -> PixelBuffer {
        PixelBuffer::filled(1, 1, [rgb[0], rgb[1], rgb[2], 255])
    }

    fn removed(px: [u8; 3], target: Rgb, tolerance: u8) -> bool {
        apply_magic_wand(&one_pixel(px), target, tolerance).alpha(0, 0) == Some(0)
    }

    #[test]
    fn wand_threshold_boundaries() {
        let black = Rgb::new(0, 0, 0);
        // tolerance 0: nothing is strictly closer than 0, not even the target.
        assert!(!removed([0, 0, 0], black, 0));

        // tolerance 50 -> threshold 125
        assert!(removed([124, 0, 0], black, 50));
        assert!(!removed([125, 0, 0], black, 50));
        assert!(!removed([126, 0, 0], black, 50));

        // tolerance 100 -> threshold 250
        assert!(removed([249, 0, 0], black, 100));
        assert!(!removed([250, 0, 0], black, 100));
    }

    #[test]
    fn wand_uses_euclidean_distance() {
        // 3-4-5 triangle scaled: distance exactly 50 from black.
        let black = Rgb::new(0, 0, 0);
        assert!(!removed([30, 40, 0], black, 20));
        assert!(removed([30, 39, 0], black, 20));
    }

    #[test]
    fn wand_tolerance_is_clamped() {
        assert_eq!(wand_threshold(255), wand_threshold(100));
    }

    #[test]
    fn wand_leaves_colour_channels_and_transparent_pixels() {
        let mut buf = PixelBuffer::filled(2, 1, [250, 250, 250, 255]);
        buf.set_pixel(1, 0, [255, 255, 255, 0]);
        let out = apply_magic_wand(&buf, Rgb::WHITE, 20);
        assert_eq!(out.pixel(0, 0), Some([250, 250, 250, 0]));
        assert_eq!(out.pixel(1, 0), Some([255, 255, 255, 0]));
        // input untouched
        assert_eq!(buf.pixel(0, 0), Some([250, 250, 250, 255]));
    }

    #[test]
    fn wand_removal_grows_with_tolerance() {
        let mut buf = PixelBuffer::new(16, 16);
        for (i, px) in buf.pixels_mut().enumerate() {
            let v = (i as u32 * 37 % 256) as u8;
            px.copy_from_slice(&[v, v.wrapping_mul(3), 255 - v, 255]);
        }
        let target = Rgb::new(120, 60, 200);
        let mut previous: Option<PixelBuffer> = None;
        for tolerance in (0..=100).step_by(5) {
            let out = apply_magic_wand(&buf, target, tolerance);
            if let Some(prev) = &previous {
                for (before, after) in prev.pixels().zip(out.pixels()) {
                    if before[3] == 0 {
                        assert_eq!(after[3], 0, "tolerance {tolerance} restored a pixel");
                    }
                }
                assert!(out.transparent_count() >= prev.transparent_count());
            }
            previous = Some(out);
        }
    }

    #[test]
    fn sample_target_ignores_transparent_and_offcanvas() {
        let mut buf = PixelBuffer::filled(2, 2, [1, 2, 3, 255]);
        buf.set_alpha(1, 1, 0);
        assert_eq!(sample_target(&buf, Point::new(0.7, 0.2)), Some(Rgb::new(1, 2, 3)));
        assert_eq!(sample_target(&buf, Point::new(1.0, 1.0)), None);
        assert_eq!(sample_target(&buf, Point::new(-1.0, 0.0)), None);
        assert_eq!(sample_target(&buf, Point::new(2.0, 0.0)), None);
    }

    #[test]
    fn brush_clears_inside_and_keeps_outside() {
        let mut buf = PixelBuffer::filled(40, 40, [9, 9, 9, 200]);
        let center = Point::new(20.0, 17.0);
        let radius = 6.5;
        erase_disc(&mut buf, center, radius);
        for y in 0..40u32 {
            for x in 0..40u32 {
                let d = ((x as f64 + 0.5 - center.x).powi(2) + (y as f64 + 0.5 - center.y).powi(2))
                    .sqrt();
                let alpha = buf.alpha(x, y).unwrap();
                if d < radius {
                    assert_eq!(alpha, 0, "({x},{y}) inside");
                } else if d > radius + 1.0 {
                    assert_eq!(alpha, 200, "({x},{y}) outside");
                }
            }
        }
        assert_eq!(buf.pixel(20, 17), Some([9, 9, 9, 0]));
    }

    #[test]
    fn brush_clips_at_edges() {
        let mut buf = PixelBuffer::filled(10, 10, [0, 0, 0, 255]);
        let touched = erase_disc(&mut buf, Point::new(0.0, 0.0), 3.0).unwrap();
        assert_eq!(touched, Rect::new(0.0, 0.0, 3.0, 3.0));
        assert_eq!(buf.alpha(0, 0), Some(0));
        assert_eq!(buf.alpha(2, 0), Some(0));
        assert_eq!(buf.alpha(3, 0), Some(255));
        assert_eq!(buf.alpha(2, 2), Some(255));

        assert!(erase_disc(&mut buf, Point::new(-50.0, 5.0), 3.0).is_none());
    }

    #[test]
    fn dab_width_matches_brush_size() {
        for size in [10u32, 20, 80] {
            let mut buf = PixelBuffer::filled(120, 120, [0, 0, 0, 255]);
            erase_disc(&mut buf, Point::new(60.0, 60.0), brush_radius(size));
            let cleared: Vec<u32> = (0..120).filter(|&x| buf.alpha(x, 60) == Some(0)).collect();
            let half = size / 2;
            assert_eq!(cleared.len() as u32, size, "size {size}");
            assert_eq!(cleared.first(), Some(&(60 - half)));
            assert_eq!(cleared.last(), Some(&(60 + half - 1)));
            // Symmetric about the centre line x = 60.
            for x in 0..half + 2 {
                assert_eq!(buf.alpha(60 + x, 60), buf.alpha(59 - x, 60), "size {size}, x {x}");
                assert_eq!(buf.alpha(60, 60 + x), buf.alpha(60, 59 - x), "size {size}, y {x}");
            }
        }
    }

    #[test]
    fn stroke_accumulates_without_touching_base() {
        let base = PixelBuffer::filled(30, 10, [5, 5, 5, 255]);
        let mut stroke = ActiveStroke::begin(&base, Point::new(3.0, 5.0), 2.0);
        stroke.extend(Point::new(15.0, 5.0));
        stroke.extend(Point::new(27.0, 5.0));
        assert_eq!(stroke.points().len(), 3);
        assert_eq!(base.transparent_count(), 0);

        let replayed = stroke.to_operation().apply(&base);
        let finished = stroke.finish();
        assert_eq!(finished, replayed);
        assert_eq!(finished.alpha(3, 5), Some(0));
        assert_eq!(finished.alpha(15, 5), Some(0));
        assert_eq!(finished.alpha(27, 5), Some(0));
        assert_eq!(finished.alpha(9, 5), Some(255));
    }
}
