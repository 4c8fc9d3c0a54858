use serde::{Deserialize, Serialize};

/// RGBA8 raster, row-major, straight (non-premultiplied) alpha.
///
/// The engine is the only producer of these buffers, so a length that does
/// not match `width * height * 4` is a bug and panics on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Self {
        assert_eq!(
            data.len(),
            width as usize * height as usize * 4,
            "pixel data does not match {width}x{height} RGBA8"
        );
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let i = self.offset(x, y)?;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Returns false when `(x, y)` is outside the buffer.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) -> bool {
        match self.offset(x, y) {
            Some(i) => {
                self.data[i..i + 4].copy_from_slice(&rgba);
                true
            }
            None => false,
        }
    }

    pub fn alpha(&self, x: u32, y: u32) -> Option<u8> {
        self.offset(x, y).map(|i| self.data[i + 3])
    }

    pub fn set_alpha(&mut self, x: u32, y: u32, alpha: u8) -> bool {
        match self.offset(x, y) {
            Some(i) => {
                self.data[i + 3] = alpha;
                true
            }
            None => false,
        }
    }

    pub fn pixels(&self) -> std::slice::ChunksExact<'_, u8> {
        self.data.chunks_exact(4)
    }

    pub fn pixels_mut(&mut self) -> std::slice::ChunksExactMut<'_, u8> {
        self.data.chunks_exact_mut(4)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    pub fn transparent_count(&self) -> usize {
        self.pixels().filter(|px| px[3] == 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filled_buffer_has_expected_layout() {
        let buf = PixelBuffer::filled(3, 2, [1, 2, 3, 4]);
        assert_eq!(buf.as_bytes().len(), 24);
        assert_eq!(buf.pixel(2, 1), Some([1, 2, 3, 4]));
        assert_eq!(buf.pixel(3, 0), None);
    }

    #[test]
    fn set_alpha_only_touches_alpha_channel() {
        let mut buf = PixelBuffer::filled(2, 2, [10, 20, 30, 255]);
        assert!(buf.set_alpha(1, 0, 0));
        assert_eq!(buf.pixel(1, 0), Some([10, 20, 30, 0]));
        assert_eq!(buf.transparent_count(), 1);
        assert!(!buf.set_alpha(5, 5, 0));
    }

    #[test]
    #[should_panic(expected = "does not match")]
    fn from_raw_rejects_mismatched_length() {
        let _ = PixelBuffer::from_raw(2, 2, vec![0; 15]);
    }
}
