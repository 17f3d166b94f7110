// ============================================================
// Layer 4 — Image Preprocessor
// ============================================================
// Turns a COCO JPEG into the fixed-size, normalised pixels the
// models expect.
//
// Steps:
//   1. Decode the file and convert to 8-bit RGB
//   2. Resize to image_size × image_size (aspect ratio is not kept)
//   3. Scale to [0, 1] and normalise each channel with the
//      ImageNet mean / std
//   4. Lay the pixels out channel-first (CHW), the order Burn's
//      Conv2d expects
//
// The resized 8-bit image is kept as well so the trainer can log
// the un-normalised picture next to the predicted answer.

use anyhow::{Context, Result};
use image::{imageops::FilterType, RgbImage};
use std::path::Path;

/// Per-channel mean of ImageNet, RGB order
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// Per-channel standard deviation of ImageNet, RGB order
pub const IMAGENET_STD:  [f32; 3] = [0.229, 0.224, 0.225];

#[derive(Debug, Clone, Copy)]
pub struct ImagePreprocessor {
    /// Output side length in pixels
    size: u32,
}

impl ImagePreprocessor {
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Decode and resize one image file.
    pub fn load(&self, path: &Path) -> Result<RgbImage> {
        let img = image::open(path)
            .with_context(|| format!("Cannot decode image '{}'", path.display()))?
            .to_rgb8();
        Ok(self.resize(&img))
    }

    /// Like `load`, but an unreadable file becomes a black image.
    /// One broken JPEG must not end an epoch early.
    pub fn load_or_blank(&self, path: &Path) -> RgbImage {
        match self.load(path) {
            Ok(img) => img,
            Err(e) => {
                tracing::warn!("Using blank image: {:#}", e);
                self.blank()
            }
        }
    }

    pub fn blank(&self) -> RgbImage {
        RgbImage::new(self.size, self.size)
    }

    pub fn resize(&self, img: &RgbImage) -> RgbImage {
        if img.width() == self.size && img.height() == self.size {
            return img.clone();
        }
        image::imageops::resize(img, self.size, self.size, FilterType::Triangle)
    }

    /// Normalised CHW pixels: 3 * size * size floats.
    pub fn to_chw(&self, img: &RgbImage) -> Vec<f32> {
        let plane = (img.width() * img.height()) as usize;
        let mut out = vec![0.0f32; 3 * plane];

        for (i, pixel) in img.pixels().enumerate() {
            for c in 0..3 {
                let v = pixel[c] as f32 / 255.0;
                out[c * plane + i] = (v - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
            }
        }
        out
    }
}
