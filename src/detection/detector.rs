//! 检测器 (Detector)
//! 职责: Frame → 模型推理 → 置信度过滤 → 跟踪 → Detection 列表
//!
//! The model itself sits behind [`Detect`]; everything wired into the capture
//! loop goes through [`DetectAndTrack`], which never fails.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use image::{imageops, RgbImage};
use rand::Rng;

use super::tracker::Tracker;
use super::types::{BBox, Detection, HEAD_CLASS};
use crate::input::Frame;

/// 模型推理接口 (外部协作者)
pub trait Detect: Send {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>>;
}

impl<F> Detect for F
where
    F: FnMut(&RgbImage) -> Result<Vec<Detection>> + Send,
{
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>> {
        self(image)
    }
}

/// 检测+跟踪接口, 供采集线程调用
pub trait DetectAndTrack: Send {
    /// May return an empty set; never raises on a valid frame.
    fn detect_and_track(&mut self, frame: &Frame) -> Vec<Detection>;

    /// 会话结束时清除跟踪状态
    fn reset(&mut self) {}
}

/// 检测器 + 跟踪器组合
pub struct TrackingDetector<D> {
    detector: D,
    tracker: Option<Box<dyn Tracker>>,
    conf_threshold: f32,
    /// 推理输入尺寸 (w, h); frames of another size are resized first
    inf_size: (u32, u32),
    count: u64,
}

impl<D: Detect> TrackingDetector<D> {
    pub fn new(detector: D, conf_threshold: f32, inf_size: (u32, u32)) -> Self {
        Self {
            detector,
            tracker: None,
            conf_threshold,
            inf_size,
            count: 0,
        }
    }

    pub fn with_tracker(mut self, tracker: impl Tracker + 'static) -> Self {
        self.tracker = Some(Box::new(tracker));
        self
    }

    fn run_model(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let (inf_w, inf_h) = self.inf_size;
        if frame.width() == inf_w && frame.height() == inf_h {
            return self.detector.detect(&frame.image);
        }

        // Resize: 动态分辨率 → 推理尺寸, 然后把检测框缩放回原始分辨率
        let resized = imageops::resize(&frame.image, inf_w, inf_h, imageops::FilterType::Triangle);
        let scale_x = frame.width() as f32 / inf_w as f32;
        let scale_y = frame.height() as f32 / inf_h as f32;

        Ok(self
            .detector
            .detect(&resized)?
            .into_iter()
            .map(|det| Detection {
                bbox: det.bbox.scaled(scale_x, scale_y),
                ..det
            })
            .collect())
    }
}

impl<D: Detect> DetectAndTrack for TrackingDetector<D> {
    fn detect_and_track(&mut self, frame: &Frame) -> Vec<Detection> {
        self.count += 1;

        let raw = match self.run_model(frame) {
            Ok(dets) => dets,
            Err(e) => {
                log::warn!("⚠️ detector failed on frame #{}: {:#}", self.count, e);
                Vec::new()
            }
        };

        let detections: Vec<Detection> = raw
            .into_iter()
            .filter(|det| det.confidence >= self.conf_threshold)
            .collect();

        let result = match self.tracker.as_mut() {
            Some(tracker) => tracker.update(&detections),
            None => detections,
        };

        if self.count % 300 == 0 {
            let tracks = self.tracker.as_ref().map(|t| t.track_count()).unwrap_or(0);
            log::debug!(
                "🎯 frame #{}: {} detections | {} tracks",
                self.count,
                result.len(),
                tracks
            );
        }

        result
    }

    fn reset(&mut self) {
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.reset();
        }
    }
}

// ========== 回放检测器 ==========

/// 回放检测器: 从JSON文件读取每帧的检测结果, 循环播放
///
/// File format: a JSON array of frames, each frame an array of detections.
pub struct ReplayDetector {
    frames: Vec<Vec<Detection>>,
    cursor: usize,
}

impl ReplayDetector {
    pub fn new(frames: Vec<Vec<Detection>>) -> Self {
        Self { frames, cursor: 0 }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("read replay file {}", path.display()))?;
        let frames: Vec<Vec<Detection>> = serde_json::from_str(&json)
            .with_context(|| format!("parse replay file {}", path.display()))?;
        log::info!("✅ 回放脚本已加载: {} 帧 ({})", frames.len(), path.display());
        Ok(Self::new(frames))
    }
}

impl Detect for ReplayDetector {
    fn detect(&mut self, _image: &RgbImage) -> Result<Vec<Detection>> {
        if self.frames.is_empty() {
            return Ok(Vec::new());
        }
        let dets = self.frames[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.frames.len();
        Ok(dets)
    }
}

// ========== 模拟检测器 ==========

struct Walker {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    class_id: u32,
}

/// 模拟检测器: 若干随机游走的目标 (body box + head box), 用于演示
pub struct SyntheticDetector {
    walkers: Vec<Walker>,
}

impl SyntheticDetector {
    pub fn new(count: usize) -> Self {
        let mut rng = rand::thread_rng();
        let walkers = (0..count)
            .map(|i| Walker {
                x: rng.gen_range(0.2..0.8),
                y: rng.gen_range(0.3..0.7),
                vx: rng.gen_range(-0.01..0.01),
                vy: rng.gen_range(-0.005..0.005),
                class_id: (i % 2) as u32,
            })
            .collect();
        Self { walkers }
    }
}

impl Detect for SyntheticDetector {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>> {
        let (w, h) = (image.width() as f32, image.height() as f32);
        let mut rng = rand::thread_rng();
        let mut dets = Vec::with_capacity(self.walkers.len() * 2);

        for walker in &mut self.walkers {
            walker.x += walker.vx;
            walker.y += walker.vy;
            if !(0.1..=0.9).contains(&walker.x) {
                walker.vx = -walker.vx;
            }
            if !(0.2..=0.8).contains(&walker.y) {
                walker.vy = -walker.vy;
            }

            let (cx, cy) = (walker.x * w, walker.y * h);
            let (bw, bh) = (0.06 * w, 0.3 * h);
            let conf = rng.gen_range(0.5..0.95);
            dets.push(Detection::new(
                BBox::from_center(cx, cy, bw, bh),
                walker.class_id,
                conf,
            ));
            // 头部框 (身体框上方)
            dets.push(Detection::new(
                BBox::from_center(cx, cy - 0.4 * bh, 0.4 * bw, 0.15 * bh),
                HEAD_CLASS,
                conf * 0.9,
            ));
        }

        Ok(dets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::ByteTracker;

    fn frame(w: u32, h: u32) -> Frame {
        Frame::new(RgbImage::new(w, h))
    }

    #[test]
    fn test_scales_boxes_back_to_frame_size() {
        let detector = |image: &RgbImage| -> Result<Vec<Detection>> {
            assert_eq!(image.dimensions(), (320, 180));
            Ok(vec![Detection::new(BBox::new(10.0, 10.0, 20.0, 30.0), 0, 0.9)])
        };
        let mut td = TrackingDetector::new(detector, 0.2, (320, 180));
        let dets = td.detect_and_track(&frame(640, 360));
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].bbox, BBox::new(20.0, 20.0, 40.0, 60.0));
    }

    #[test]
    fn test_confidence_filter_and_errors() {
        let mut calls = 0;
        let detector = move |_: &RgbImage| -> Result<Vec<Detection>> {
            calls += 1;
            if calls == 2 {
                anyhow::bail!("model exploded");
            }
            Ok(vec![
                Detection::new(BBox::new(0.0, 0.0, 5.0, 5.0), 0, 0.1),
                Detection::new(BBox::new(0.0, 0.0, 5.0, 5.0), 1, 0.5),
            ])
        };
        let mut td = TrackingDetector::new(detector, 0.2, (8, 8));
        let dets = td.detect_and_track(&frame(8, 8));
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class_id, 1);

        assert!(td.detect_and_track(&frame(8, 8)).is_empty());
    }

    #[test]
    fn test_tracker_assigns_ids() {
        let detector = |_: &RgbImage| -> Result<Vec<Detection>> {
            Ok(vec![Detection::new(BBox::new(10.0, 10.0, 50.0, 90.0), 0, 0.9)])
        };
        let mut td =
            TrackingDetector::new(detector, 0.2, (100, 100)).with_tracker(ByteTracker::default());
        let first = td.detect_and_track(&frame(100, 100));
        let second = td.detect_and_track(&frame(100, 100));
        assert!(first[0].track_id.is_some());
        assert_eq!(first[0].track_id, second[0].track_id);
    }

    #[test]
    fn test_tracker_keeps_detections_above_conf_threshold() {
        let detector = |_: &RgbImage| -> Result<Vec<Detection>> {
            Ok(vec![Detection::new(BBox::new(10.0, 10.0, 50.0, 90.0), 0, 0.3)])
        };
        let mut td =
            TrackingDetector::new(detector, 0.2, (100, 100)).with_tracker(ByteTracker::default());
        for _ in 0..5 {
            let dets = td.detect_and_track(&frame(100, 100));
            assert_eq!(dets.len(), 1);
            assert_eq!(dets[0].bbox, BBox::new(10.0, 10.0, 50.0, 90.0));
        }
    }

    #[test]
    fn test_reset_starts_fresh_tracks() {
        let detector = |_: &RgbImage| -> Result<Vec<Detection>> {
            Ok(vec![Detection::new(BBox::new(10.0, 10.0, 50.0, 90.0), 0, 0.9)])
        };
        let mut td =
            TrackingDetector::new(detector, 0.2, (100, 100)).with_tracker(ByteTracker::default());
        let before = td.detect_and_track(&frame(100, 100));
        td.reset();
        let after = td.detect_and_track(&frame(100, 100));
        assert!(before[0].track_id.is_some());
        assert_ne!(before[0].track_id, after[0].track_id);
    }

    #[test]
    fn test_replay_cycles() {
        let a = vec![Detection::new(BBox::new(0.0, 0.0, 1.0, 1.0), 0, 1.0)];
        let mut replay = ReplayDetector::new(vec![a.clone(), Vec::new()]);
        let img = RgbImage::new(1, 1);
        assert_eq!(replay.detect(&img).unwrap(), a);
        assert!(replay.detect(&img).unwrap().is_empty());
        assert_eq!(replay.detect(&img).unwrap(), a);
    }

    #[test]
    fn test_synthetic_emits_body_and_head() {
        let mut synth = SyntheticDetector::new(3);
        let dets = synth.detect(&RgbImage::new(640, 360)).unwrap();
        assert_eq!(dets.len(), 6);
        assert_eq!(dets.iter().filter(|d| d.class_id == HEAD_CLASS).count(), 3);
    }
}
