//! 帧来源 (frame sources)
//!
//! The capture loop only depends on [`FrameSource`]; concrete backends are
//! picked at startup.

use std::path::Path;

use anyhow::{Context, Result};
use image::{imageops, Rgb, RgbImage};
use rand::Rng;

use super::frame::{PixelLayout, RawFrame};
use crate::monitor::Monitor;

/// 采集接口 (外部协作者)
pub trait FrameSource: Send {
    fn grab(&mut self, monitor: &Monitor) -> Result<RawFrame>;
}

/// 静态图片来源: 每次采集返回同一张图片 (缩放到采集区域尺寸)
pub struct ImageFileSource {
    image: RgbImage,
    cached: Option<RgbImage>,
}

impl ImageFileSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)
            .with_context(|| format!("open image {}", path.display()))?
            .to_rgb8();
        log::info!(
            "🖼️ 图片来源: {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(Self {
            image,
            cached: None,
        })
    }
}

impl FrameSource for ImageFileSource {
    fn grab(&mut self, monitor: &Monitor) -> Result<RawFrame> {
        let (w, h) = monitor.size;
        let stale = self
            .cached
            .as_ref()
            .map_or(true, |img| img.dimensions() != (w, h));
        if stale {
            self.cached = Some(if self.image.dimensions() == (w, h) {
                self.image.clone()
            } else {
                imageops::resize(&self.image, w, h, imageops::FilterType::Triangle)
            });
        }
        let image = self.cached.clone().context("image cache empty")?;
        Ok(RawFrame::from_rgb(image))
    }
}

/// 模拟来源: 生成带噪点的 BGRA 帧 (模拟屏幕截图的通道顺序)
pub struct SyntheticSource {
    tick: u64,
}

impl SyntheticSource {
    pub fn new() -> Self {
        Self { tick: 0 }
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for SyntheticSource {
    fn grab(&mut self, monitor: &Monitor) -> Result<RawFrame> {
        self.tick += 1;
        let (w, h) = monitor.size;
        let mut rng = rand::thread_rng();
        let shade = (self.tick % 64) as u8;

        let mut data = Vec::with_capacity(w as usize * h as usize * 4);
        for y in 0..h {
            let row = (y * 96 / h.max(1)) as u8;
            for _ in 0..w {
                let noise: u8 = rng.gen_range(0..8);
                // B, G, R, A
                data.extend_from_slice(&[
                    row.saturating_add(noise),
                    48 + shade / 2,
                    32u8.saturating_add(noise),
                    255,
                ]);
            }
        }

        Ok(RawFrame {
            data,
            width: w,
            height: h,
            layout: PixelLayout::Bgra,
        })
    }
}

/// Solid-color frame, mostly useful in tests.
pub fn solid_frame(w: u32, h: u32, color: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(w, h, Rgb(color))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_matches_monitor_size() {
        let monitor = Monitor::new(0, 0, 32, 16);
        let raw = SyntheticSource::new().grab(&monitor).unwrap();
        assert_eq!(raw.layout, PixelLayout::Bgra);
        let frame = raw.normalize().unwrap();
        assert_eq!(frame.image.dimensions(), (32, 16));
    }

    #[test]
    fn test_image_source_resizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("still.png");
        solid_frame(8, 8, [10, 20, 30]).save(&path).unwrap();

        let mut source = ImageFileSource::open(&path).unwrap();
        let frame = source
            .grab(&Monitor::new(0, 0, 4, 2))
            .unwrap()
            .normalize()
            .unwrap();
        assert_eq!(frame.image.dimensions(), (4, 2));
        assert_eq!(frame.image.get_pixel(0, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_missing_image_is_an_error() {
        assert!(ImageFileSource::open("/definitely/not/here.png").is_err());
    }
}
