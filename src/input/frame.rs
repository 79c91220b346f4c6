/// 帧数据结构与通道顺序归一化
/// Frame buffers and channel-order normalization
use std::time::Instant;

use anyhow::{bail, Result};
use image::RgbImage;

/// 采集帧的像素排列
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    Rgb,
    Bgr,
    Rgba,
    Bgra,
}

impl PixelLayout {
    pub fn channels(&self) -> usize {
        match self {
            PixelLayout::Rgb | PixelLayout::Bgr => 3,
            PixelLayout::Rgba | PixelLayout::Bgra => 4,
        }
    }

    fn is_bgr_order(&self) -> bool {
        matches!(self, PixelLayout::Bgr | PixelLayout::Bgra)
    }
}

/// 原始采集帧 (采集后端 → 采集线程)
#[derive(Clone, Debug)]
pub struct RawFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
}

/// 归一化后的帧: 不可变 RGB 图像 + 采集时间
#[derive(Clone, Debug)]
pub struct Frame {
    pub image: RgbImage,
    pub captured_at: Instant,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self {
            image,
            captured_at: Instant::now(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

impl RawFrame {
    pub fn from_rgb(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            data: image.into_raw(),
            width,
            height,
            layout: PixelLayout::Rgb,
        }
    }

    /// 归一化: 任意通道顺序 → RGB (丢弃 Alpha)
    pub fn normalize(self) -> Result<Frame> {
        let channels = self.layout.channels();
        let expected = self.width as usize * self.height as usize * channels;
        if self.data.len() != expected {
            bail!(
                "frame buffer has {} bytes, expected {} for {}x{} {:?}",
                self.data.len(),
                expected,
                self.width,
                self.height,
                self.layout
            );
        }

        let rgb_data = if self.layout == PixelLayout::Rgb {
            self.data
        } else {
            let bgr = self.layout.is_bgr_order();
            let mut rgb = Vec::with_capacity(self.width as usize * self.height as usize * 3);
            for chunk in self.data.chunks_exact(channels) {
                if bgr {
                    rgb.extend_from_slice(&[chunk[2], chunk[1], chunk[0]]);
                } else {
                    rgb.extend_from_slice(&chunk[..3]);
                }
            }
            rgb
        };

        match RgbImage::from_raw(self.width, self.height, rgb_data) {
            Some(image) => Ok(Frame::new(image)),
            None => bail!("RGB图像转换失败 ({}x{})", self.width, self.height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bgra_to_rgb() {
        let raw = RawFrame {
            data: vec![1, 2, 3, 255, 4, 5, 6, 255],
            width: 2,
            height: 1,
            layout: PixelLayout::Bgra,
        };
        let frame = raw.normalize().unwrap();
        assert_eq!(frame.image.as_raw(), &vec![3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn test_rgba_drops_alpha() {
        let raw = RawFrame {
            data: vec![1, 2, 3, 9],
            width: 1,
            height: 1,
            layout: PixelLayout::Rgba,
        };
        assert_eq!(raw.normalize().unwrap().image.as_raw(), &vec![1, 2, 3]);
    }

    #[test]
    fn test_rejects_short_buffer() {
        let raw = RawFrame {
            data: vec![0; 5],
            width: 2,
            height: 1,
            layout: PixelLayout::Bgr,
        };
        assert!(raw.normalize().is_err());
    }
}
