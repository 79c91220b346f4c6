//! 渲染输出后端

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::RgbImage;

use super::RenderSink;
use crate::gen_time_string;

/// 只计数, 不输出
#[derive(Debug, Default)]
pub struct HeadlessSink {
    count: u64,
}

impl HeadlessSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

impl RenderSink for HeadlessSink {
    fn present(&mut self, image: &RgbImage) -> Result<()> {
        self.count += 1;
        if self.count % 300 == 0 {
            log::debug!("🖼️ headless: {} 帧 ({}x{})", self.count, image.width(), image.height());
        }
        Ok(())
    }

    fn release(&mut self) {
        log::info!("🖼️ headless 渲染结束, 共 {} 帧", self.count);
    }
}

/// 每帧覆盖写 `<dir>/latest.png`
#[derive(Debug)]
pub struct SnapshotSink {
    path: PathBuf,
}

impl SnapshotSink {
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        Ok(Self {
            path: dir.join("latest.png"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RenderSink for SnapshotSink {
    fn present(&mut self, image: &RgbImage) -> Result<()> {
        image
            .save(&self.path)
            .with_context(|| format!("write {}", self.path.display()))
    }

    fn release(&mut self) {
        log::info!("💾 最后一帧: {}", self.path().display());
    }
}

/// 按时间戳保存每一帧
#[derive(Debug)]
pub struct SequenceSink {
    dir: PathBuf,
    count: u64,
}

impl SequenceSink {
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            count: 0,
        })
    }
}

impl RenderSink for SequenceSink {
    fn present(&mut self, image: &RgbImage) -> Result<()> {
        self.count += 1;
        let path = self
            .dir
            .join(format!("{}_{:06}.png", gen_time_string("-"), self.count));
        image
            .save(&path)
            .with_context(|| format!("write {}", path.display()))
    }

    fn release(&mut self) {
        log::info!("💾 已保存 {} 帧到 {}", self.count, self.dir.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = SnapshotSink::new(&dir.path().join("out")).unwrap();
        sink.present(&RgbImage::new(4, 4)).unwrap();
        sink.present(&RgbImage::new(8, 6)).unwrap();
        sink.release();

        let saved = image::open(sink.path()).unwrap();
        assert_eq!((saved.width(), saved.height()), (8, 6));
        assert_eq!(fs::read_dir(dir.path().join("out")).unwrap().count(), 1);
    }

    #[test]
    fn test_sequence_keeps_every_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = SequenceSink::new(dir.path()).unwrap();
        for _ in 0..3 {
            sink.present(&RgbImage::new(2, 2)).unwrap();
        }
        sink.release();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 3);
    }

    #[test]
    fn test_headless_counts() {
        let mut sink = HeadlessSink::new();
        sink.present(&RgbImage::new(1, 1)).unwrap();
        assert_eq!(sink.count(), 1);
    }
}
