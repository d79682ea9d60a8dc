use image::{imageops::FilterType, DynamicImage};

pub const FRAME_SIZE: usize = 224;

/// Normalized pixel grid the signal analyzers operate on: a fixed
/// 224x224 RGB frame with channel values scaled to [0,1]. Built once per
/// request; every derived buffer (grayscale, channel splits) is a fresh
/// allocation owned by the computation that asked for it.
pub struct PixelFrame {
    // Row-major, interleaved RGB.
    pixels: Vec<f32>,
}

impl PixelFrame {
    pub fn from_image(img: &DynamicImage) -> Self {
        let resized = img
            .resize_exact(FRAME_SIZE as u32, FRAME_SIZE as u32, FilterType::Triangle)
            .to_rgb8();
        let pixels = resized
            .into_raw()
            .into_iter()
            .map(|v| v as f32 / 255.0)
            .collect();
        PixelFrame { pixels }
    }

    /// Test constructor: a frame filled with one RGB color.
    pub fn constant(r: f32, g: f32, b: f32) -> Self {
        let mut pixels = Vec::with_capacity(FRAME_SIZE * FRAME_SIZE * 3);
        for _ in 0..FRAME_SIZE * FRAME_SIZE {
            pixels.extend_from_slice(&[r, g, b]);
        }
        PixelFrame { pixels }
    }

    /// Single-channel view: the mean of the three color channels per pixel.
    pub fn grayscale(&self) -> Vec<f32> {
        self.pixels
            .chunks_exact(3)
            .map(|px| (px[0] + px[1] + px[2]) / 3.0)
            .collect()
    }

    /// The three color planes, split.
    pub fn channels(&self) -> [Vec<f32>; 3] {
        let count = FRAME_SIZE * FRAME_SIZE;
        let mut r = Vec::with_capacity(count);
        let mut g = Vec::with_capacity(count);
        let mut b = Vec::with_capacity(count);
        for px in self.pixels.chunks_exact(3) {
            r.push(px[0]);
            g.push(px[1]);
            b.push(px[2]);
        }
        [r, g, b]
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn frame_is_resized_and_normalized() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(640, 480, image::Rgb([255, 0, 127])));
        let frame = PixelFrame::from_image(&img);
        assert_eq!(frame.len(), FRAME_SIZE * FRAME_SIZE * 3);
        let [r, g, b] = frame.channels();
        assert!((r[0] - 1.0).abs() < 1e-6);
        assert!(g[0].abs() < 1e-6);
        assert!((b[0] - 127.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn grayscale_averages_the_channels() {
        let frame = PixelFrame::constant(0.3, 0.6, 0.9);
        let gray = frame.grayscale();
        assert_eq!(gray.len(), FRAME_SIZE * FRAME_SIZE);
        assert!((gray[0] - 0.6).abs() < 1e-6);
    }
}
