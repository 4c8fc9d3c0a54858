use serde::{Deserialize, Serialize};

pub mod pixel;

pub use pixel::PixelBuffer;

bitflags::bitflags! {
    /// Which editor controls currently make sense. The UI layer greys out
    /// anything not present.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ToolAvailability: u8 {
        const CAN_FRAME   = 0b0000_0001;
        const CAN_MASK    = 0b0000_0010;
        const CAN_UNDO    = 0b0000_0100;
        const CAN_RESET   = 0b0000_1000;
        const CAN_EXPORT  = 0b0001_0000;
    }
}

/// Size of the fixed working canvas the source photo is framed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    /// Largest working-canvas edge accepted from configuration.
    pub const MAX_EDGE: u32 = 4096;

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both edges pulled into `1..=MAX_EDGE`.
    pub fn clamped(self) -> Self {
        Self::new(
            self.width.clamp(1, Self::MAX_EDGE),
            self.height.clamp(1, Self::MAX_EDGE),
        )
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width as f64 / 2.0, self.height as f64 / 2.0)
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::new(600, 600)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn from_rgba(px: [u8; 4]) -> Self {
        Self::new(px[0], px[1], px[2])
    }

    /// Squared Euclidean distance in RGB space. Exact, so threshold checks
    /// can be done without a square root.
    pub fn distance_sq(&self, other: Rgb) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Pin location as percentages of the displayed image's bounding box.
/// Either both coordinates exist or the pin is absent (`Option<PinPosition>`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PinPosition {
    pub x: f64,
    pub y: f64,
}

impl PinPosition {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Two-tone backdrop painted behind the framed photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkerboard {
    pub cell: u32,
    pub light: [u8; 3],
    pub dark: [u8; 3],
}

impl Checkerboard {
    /// Opaque backdrop colour at canvas pixel `(x, y)`.
    pub fn color_at(&self, x: u32, y: u32) -> [u8; 4] {
        let cell = self.cell.max(1);
        let [r, g, b] = if (x / cell + y / cell) % 2 == 0 {
            self.dark
        } else {
            self.light
        };
        [r, g, b, 255]
    }

    pub fn render(&self, size: CanvasSize) -> PixelBuffer {
        let mut buf = PixelBuffer::new(size.width, size.height);
        let width = size.width;
        for (idx, px) in buf.pixels_mut().enumerate() {
            let idx = idx as u32;
            px.copy_from_slice(&self.color_at(idx % width, idx / width));
        }
        buf
    }
}

impl Default for Checkerboard {
    fn default() -> Self {
        Self {
            cell: 10,
            light: [0xf3, 0xf4, 0xf6],
            dark: [0xe5, 0xe7, 0xeb],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkerboard_alternates_per_cell() {
        let board = Checkerboard::default();
        assert_eq!(board.color_at(0, 0), [0xe5, 0xe7, 0xeb, 255]);
        assert_eq!(board.color_at(9, 9), [0xe5, 0xe7, 0xeb, 255]);
        assert_eq!(board.color_at(10, 0), [0xf3, 0xf4, 0xf6, 255]);
        assert_eq!(board.color_at(10, 10), [0xe5, 0xe7, 0xeb, 255]);
    }

    #[test]
    fn checkerboard_render_matches_color_at() {
        let board = Checkerboard::default();
        let buf = board.render(CanvasSize::new(25, 13));
        assert_eq!(buf.pixel(24, 12), Some(board.color_at(24, 12)));
        assert_eq!(buf.pixel(11, 3), Some(board.color_at(11, 3)));
        assert_eq!(buf.transparent_count(), 0);
    }

    #[test]
    fn canvas_clamp_bounds_both_edges() {
        assert_eq!(CanvasSize::new(0, 100_000).clamped(), CanvasSize::new(1, 4096));
        assert_eq!(CanvasSize::new(600, 400).clamped(), CanvasSize::new(600, 400));
    }

    #[test]
    fn rgb_distance_is_exact() {
        assert_eq!(Rgb::WHITE.distance_sq(Rgb::WHITE), 0);
        assert_eq!(Rgb::new(0, 0, 0).distance_sq(Rgb::new(3, 4, 0)), 25);
    }

    #[test]
    fn pin_position_serializes_as_plain_object() {
        let json = serde_json::to_string(&PinPosition::new(12.5, 80.0)).unwrap();
        assert_eq!(json, r#"{"x":12.5,"y":80.0}"#);
    }
}
