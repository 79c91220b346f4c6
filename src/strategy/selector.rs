//! 目标选择 (target selection)
//!
//! 检测集合 → 单个观测: 优先选择精确类别 (头部), 否则选择离准心最近的目标.

use crate::detection::{Detection, HEAD_CLASS};
use crate::monitor::Point;
use crate::pipeline::Observation;

#[derive(Clone, Debug, PartialEq)]
pub struct TargetSelector {
    /// 允许的类别
    pub allowed_classes: Vec<u32>,
    /// 精确类别 (距离无关, 优先)
    pub precision_class: u32,
    /// 非精确类别的瞄准点上移比例 (× 框高)
    pub body_offset_fraction: f32,
}

impl Default for TargetSelector {
    fn default() -> Self {
        Self {
            allowed_classes: vec![0, 1, HEAD_CLASS],
            precision_class: HEAD_CLASS,
            body_offset_fraction: 0.1,
        }
    }
}

/// 中心点 + 尺寸形式的候选目标
struct Candidate {
    center: Point,
    height: f32,
    class_id: u32,
}

impl TargetSelector {
    /// `center` is the monitor center, in the same space as the detections.
    pub fn select(&self, detections: &[Detection], center: Point) -> Observation {
        let candidates: Vec<Candidate> = detections
            .iter()
            .filter(|det| self.allowed_classes.contains(&det.class_id))
            .map(|det| {
                let (cx, cy) = det.bbox.center();
                Candidate {
                    center: Point::new(cx, cy),
                    height: det.bbox.height(),
                    class_id: det.class_id,
                }
            })
            .collect();

        let has_precision = candidates
            .iter()
            .any(|c| c.class_id == self.precision_class);

        let best = candidates
            .iter()
            .filter(|c| !has_precision || c.class_id == self.precision_class)
            .fold(None::<(&Candidate, f32)>, |best, c| {
                let d = c.center.distance_sq(&center);
                match best {
                    // 距离相同时保留先出现的目标
                    Some((_, best_d)) if best_d <= d => best,
                    _ => Some((c, d)),
                }
            });

        match best {
            Some((c, _)) => {
                let mut point = c.center;
                if c.class_id != self.precision_class {
                    point.y -= self.body_offset_fraction * c.height;
                }
                Observation::Target {
                    point,
                    class_id: c.class_id,
                }
            }
            None => Observation::None,
        }
    }
}
