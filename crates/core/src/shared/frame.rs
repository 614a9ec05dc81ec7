use ndarray::ArrayView3;

use crate::shared::region::Region;

/// A single video frame: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at the capture boundary only; everything
/// downstream treats pixel data as opaque except for cropping.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (
                self.height as usize,
                self.width as usize,
                self.channels as usize,
            ),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    /// Extracts `region` (clamped to the frame) and resizes it to a
    /// `size` x `size` square with nearest-neighbor sampling.
    ///
    /// The result keeps this frame's index so a recognition verdict can
    /// be traced back to the frame it was sampled from.
    pub fn crop_resized(&self, region: &Region, size: u32) -> Frame {
        let clamped = region.clamped(self.width, self.height);
        // A region collapsed onto the far edge has x == width (or
        // y == height); sample the last row/column instead of reading
        // past the buffer.
        let src_x = (clamped.x as usize).min(self.width as usize - 1);
        let src_y = (clamped.y as usize).min(self.height as usize - 1);
        let src_w = (clamped.width.max(1)) as usize;
        let src_h = (clamped.height.max(1)) as usize;
        let ch = self.channels as usize;
        let stride = self.width as usize * ch;

        let out = size as usize;
        let mut data = vec![0u8; out * out * ch];
        for y in 0..out {
            let sy = src_y + (((y as f64 + 0.5) * src_h as f64 / out as f64) as usize).min(src_h - 1);
            for x in 0..out {
                let sx =
                    src_x + (((x as f64 + 0.5) * src_w as f64 / out as f64) as usize).min(src_w - 1);
                let src_off = sy * stride + sx * ch;
                let dst_off = (y * out + x) * ch;
                data[dst_off..dst_off + ch].copy_from_slice(&self.data[src_off..src_off + ch]);
            }
        }

        Frame::new(data, size, size, self.channels, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        let data = vec![0u8; 10]; // wrong size for 2x2x3
        Frame::new(data, 2, 2, 3, 0);
    }

    #[test]
    fn test_as_ndarray_shape() {
        let data = vec![0u8; 24]; // 2x4x3
        let frame = Frame::new(data, 4, 2, 3, 0);
        assert_eq!(frame.as_ndarray().shape(), &[2, 4, 3]);
    }

    fn solid_frame(w: u32, h: u32, value: u8) -> Frame {
        Frame::new(vec![value; (w * h * 3) as usize], w, h, 3, 7)
    }

    #[test]
    fn test_crop_resized_dimensions_and_index() {
        let frame = solid_frame(100, 80, 50);
        let region = Region::new(10, 10, 40, 40);
        let crop = frame.crop_resized(&region, 16);
        assert_eq!(crop.width(), 16);
        assert_eq!(crop.height(), 16);
        assert_eq!(crop.channels(), 3);
        assert_eq!(crop.index(), 7);
    }

    #[test]
    fn test_crop_resized_samples_region_pixels() {
        // Left half black, right half white; crop the right half.
        let w = 20usize;
        let h = 10usize;
        let mut data = vec![0u8; w * h * 3];
        for y in 0..h {
            for x in w / 2..w {
                let off = (y * w + x) * 3;
                data[off..off + 3].copy_from_slice(&[255, 255, 255]);
            }
        }
        let frame = Frame::new(data, w as u32, h as u32, 3, 0);
        let crop = frame.crop_resized(&Region::new(10, 0, 10, 10), 4);
        assert!(crop.data().iter().all(|&b| b == 255));
    }

    #[test]
    fn test_crop_resized_region_collapsed_to_far_edge() {
        // A box entirely past the frame clamps to an empty region at
        // (width, height); cropping it must not read out of bounds.
        let frame = solid_frame(100, 100, 3);
        let region = Region::new(200, 200, 30, 30).clamped(100, 100);
        let crop = frame.crop_resized(&region, 16);
        assert_eq!(crop.width(), 16);
        assert!(crop.data().iter().all(|&b| b == 3));
    }

    #[test]
    fn test_crop_resized_clamps_out_of_bounds_region() {
        let frame = solid_frame(30, 30, 9);
        // Region hangs off the right/bottom edges.
        let crop = frame.crop_resized(&Region::new(20, 20, 50, 50), 8);
        assert_eq!(crop.width(), 8);
        assert!(crop.data().iter().all(|&b| b == 9));
    }
}
