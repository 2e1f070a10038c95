use std::time::Instant;

#[derive(Clone, Debug)]
pub struct Frame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub index: u64,
    pub timestamp: Instant,
}

impl Frame {
    pub fn new(rgba: Vec<u8>, width: u32, height: u32, index: u64) -> Self {
        Self {
            rgba,
            width,
            height,
            index,
            timestamp: Instant::now(),
        }
    }

    /// A frame with dimensions but no pixels, used when only landmarks were recorded.
    pub fn blank(width: u32, height: u32, index: u64) -> Self {
        Self::new(Vec::new(), width, height, index)
    }

    pub fn has_pixels(&self) -> bool {
        let expected_len = (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4);
        expected_len > 0 && self.rgba.len() == expected_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_frames_have_no_pixels() {
        let frame = Frame::blank(640, 480, 3);
        assert!(!frame.has_pixels());
        assert_eq!(frame.index, 3);
    }

    #[test]
    fn full_buffer_counts_as_pixels() {
        let frame = Frame::new(vec![0; 2 * 2 * 4], 2, 2, 0);
        assert!(frame.has_pixels());
        let short = Frame::new(vec![0; 7], 2, 2, 0);
        assert!(!short.has_pixels());
    }
}
