//! ByteTrack 算法实现
//! ByteTrack: Simple and effective multi-object tracking
//!
//! 核心思想:
//! 1. 高低分检测框分开处理
//! 2. 高分框优先匹配 (IOU)
//! 3. 低分框救援丢失的轨迹
//! 4. 纯运动模型,无需外观特征
//!
//! Tracks only match detections of the same class, so a head box never
//! inherits the id of a body box. The Kalman filter is only used to predict
//! where a track will be for matching; emitted boxes are the detector's own.
//! Detections that neither match a track nor start one are passed through
//! without a `track_id`.

use serde::{Deserialize, Serialize};

use super::tracker::{compute_iou, KalmanBoxFilter, Tracker};
use super::types::{BBox, Detection};

/// ByteTrack 参数
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ByteTrackConfig {
    pub max_lost_frames: u32,
    pub high_score_threshold: f32,
    pub low_score_threshold: f32,
    pub high_iou_threshold: f32,
    pub low_iou_threshold: f32,
    pub kalman_process_noise: f32,
    pub kalman_obs_noise: f32,
}

impl Default for ByteTrackConfig {
    fn default() -> Self {
        Self {
            max_lost_frames: 30,
            high_score_threshold: 0.4,
            low_score_threshold: 0.1,
            high_iou_threshold: 0.4,
            low_iou_threshold: 0.3,
            kalman_process_noise: 0.1,
            kalman_obs_noise: 0.5,
        }
    }
}

/// ByteTrack 跟踪对象
#[derive(Clone, Debug)]
struct ByteTrack {
    id: u32,
    class_id: u32,
    bbox: BBox,
    kalman: KalmanBoxFilter,
    frames_lost: u32,
    score: f32,
}

impl ByteTrack {
    fn new(id: u32, det: &Detection, config: &ByteTrackConfig) -> Self {
        let kalman = KalmanBoxFilter::new(
            &det.bbox,
            config.kalman_process_noise,
            config.kalman_obs_noise,
        );
        Self {
            id,
            class_id: det.class_id,
            bbox: det.bbox,
            kalman,
            frames_lost: 0,
            score: det.confidence,
        }
    }

    fn predict(&mut self) {
        self.kalman.predict();
    }

    fn update(&mut self, det: &Detection) {
        self.kalman.update(&det.bbox);
        self.bbox = det.bbox;
        self.frames_lost = 0;
        self.score = det.confidence;
    }

    fn mark_lost(&mut self) {
        self.frames_lost += 1;
    }

    fn as_detection(&self) -> Detection {
        Detection {
            bbox: self.bbox,
            class_id: self.class_id,
            confidence: self.score,
            track_id: Some(self.id),
        }
    }
}

/// ByteTrack 追踪器
pub struct ByteTracker {
    tracks: Vec<ByteTrack>,
    next_id: u32,
    config: ByteTrackConfig,
}

impl ByteTracker {
    pub fn new(config: ByteTrackConfig) -> Self {
        Self {
            tracks: Vec::new(),
            next_id: 1,
            config,
        }
    }

    /// IOU 贪心匹配, returns `(detection index, track index)` pairs
    fn match_detections_to_tracks(
        &self,
        detections: &[Detection],
        det_indices: &[usize],
        track_indices: &[usize],
        iou_threshold: f32,
    ) -> Vec<(usize, usize)> {
        if det_indices.is_empty() || track_indices.is_empty() {
            return Vec::new();
        }

        let mut candidates = Vec::new();
        for &det_idx in det_indices {
            let det = &detections[det_idx];
            for &track_idx in track_indices {
                let track = &self.tracks[track_idx];
                if track.class_id != det.class_id {
                    continue;
                }
                let iou = compute_iou(&det.bbox, &track.kalman.predicted_bbox());
                if iou >= iou_threshold {
                    candidates.push((1.0 - iou, det_idx, track_idx));
                }
            }
        }

        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut assignments = Vec::new();
        let mut used_det = vec![false; detections.len()];
        let mut used_track = vec![false; self.tracks.len()];

        for (_, det_idx, track_idx) in candidates {
            if !used_det[det_idx] && !used_track[track_idx] {
                assignments.push((det_idx, track_idx));
                used_det[det_idx] = true;
                used_track[track_idx] = true;
            }
        }

        assignments
    }
}

impl Default for ByteTracker {
    fn default() -> Self {
        Self::new(ByteTrackConfig::default())
    }
}

impl Tracker for ByteTracker {
    /// ByteTrack 三步匹配
    fn update(&mut self, detections: &[Detection]) -> Vec<Detection> {
        // 1. 所有轨迹先预测
        for track in &mut self.tracks {
            track.predict();
        }

        // 2. 分离高低分检测框
        let (high, low): (Vec<usize>, Vec<usize>) = (0..detections.len())
            .filter(|&i| detections[i].confidence >= self.config.low_score_threshold)
            .partition(|&i| detections[i].confidence >= self.config.high_score_threshold);

        let mut matched_det = vec![false; detections.len()];
        let mut matched_track = vec![false; self.tracks.len()];

        // 3. 第一轮匹配: 高分检测 + 所有轨迹
        let all_tracks: Vec<usize> = (0..self.tracks.len()).collect();
        for (det_idx, track_idx) in self.match_detections_to_tracks(
            detections,
            &high,
            &all_tracks,
            self.config.high_iou_threshold,
        ) {
            matched_det[det_idx] = true;
            matched_track[track_idx] = true;
            self.tracks[track_idx].update(&detections[det_idx]);
        }

        // 4. 第二轮匹配: 低分检测 + 未匹配的轨迹 (救援)
        let unmatched_tracks: Vec<usize> = (0..self.tracks.len())
            .filter(|&idx| !matched_track[idx])
            .collect();
        for (det_idx, track_idx) in self.match_detections_to_tracks(
            detections,
            &low,
            &unmatched_tracks,
            self.config.low_iou_threshold,
        ) {
            matched_det[det_idx] = true;
            matched_track[track_idx] = true;
            self.tracks[track_idx].update(&detections[det_idx]);
        }

        // 5. 未匹配的轨迹 → 标记丢失
        for (track_idx, &matched) in matched_track.iter().enumerate() {
            if !matched {
                self.tracks[track_idx].mark_lost();
            }
        }

        // 6. 未匹配的高分检测 → 新建轨迹
        for &det_idx in &high {
            if !matched_det[det_idx] {
                let track = ByteTrack::new(self.next_id, &detections[det_idx], &self.config);
                self.tracks.push(track);
                self.next_id += 1;
            }
        }

        // 7. 删除丢失太久的轨迹
        let max_lost = self.config.max_lost_frames;
        self.tracks.retain(|t| t.frames_lost <= max_lost);

        // 8. 输出: 本帧匹配/新建的轨迹 + 未进入跟踪的检测 (无 track_id)
        let passthrough = (0..detections.len())
            .filter(|&i| !matched_det[i] && !high.contains(&i))
            .map(|i| detections[i].clone());

        self.tracks
            .iter()
            .filter(|t| t.frames_lost == 0)
            .map(ByteTrack::as_detection)
            .chain(passthrough)
            .collect()
    }

    fn reset(&mut self) {
        self.tracks.clear();
    }

    fn track_count(&self) -> usize {
        self.tracks.len()
    }
}
