/// 检测系统 (Detection System)
///
/// 采集线程内调用, 负责智能分析
/// - Detector: 目标检测 (模型为外部协作者)
/// - Tracker:  目标追踪 (ByteTrack)
pub mod bytetrack;
pub mod detector;
pub mod tracker;
pub mod types;

pub use bytetrack::{ByteTrackConfig, ByteTracker};
pub use detector::{Detect, DetectAndTrack, ReplayDetector, SyntheticDetector, TrackingDetector};
pub use tracker::Tracker;
pub use types::{class_name, BBox, Detection, HEAD_CLASS};
