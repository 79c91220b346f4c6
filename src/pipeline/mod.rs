/// 闭环流水线 (Closed-loop Pipeline)
///
/// 三线程架构, 各自按固定节拍运行:
/// - Capture:   采集 + 检测 + 目标选择 (Pacer 节拍)
/// - Operator:  决策 + 指针位移 (阻塞在 Mailbox 上)
/// - Visualizer: 标注渲染 (Pacer 节拍)
///
/// Capture → Operator 通过单槽 [`Mailbox`] 传递最新观测;
/// Capture/Operator → Visualizer 通过 [`VisualHandle`] (有损, 尽力而为).
pub mod capture;
pub mod mailbox;
pub mod operator;
pub mod pacer;
pub mod shutdown;
pub mod visualizer;

use std::sync::Arc;

use crate::detection::Detection;
use crate::input::Frame;
use crate::monitor::Point;
use crate::strategy::Motion;

pub use capture::CaptureLoop;
pub use mailbox::Mailbox;
pub use operator::Operator;
pub use pacer::{Pace, Pacer};
pub use shutdown::Shutdown;
pub use visualizer::{VisualHandle, Visualizer};

// ========== 线程间消息类型定义 ==========

/// 目标选择结果 (每帧一个)
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Observation {
    Target { point: Point, class_id: u32 },
    /// 本帧没有符合条件的目标
    None,
}

/// 观测邮箱中的消息 (采集线程 → 决策线程)
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Step {
    Observe(Observation),
    /// 会话中止 / 帧采集失败; 决策线程据此重置状态
    Abort,
}

/// 决策结果 (决策线程 → 渲染线程)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActionRecord {
    /// 屏幕坐标
    pub point: Point,
    pub motion: Motion,
}

/// 渲染源 (采集线程 → 渲染线程)
#[derive(Clone, Debug)]
pub struct VisualSource {
    pub frame: Arc<Frame>,
    /// 帧坐标系下的检测框
    pub detections: Vec<Detection>,
    /// 采集区域左上角 (屏幕坐标), 用于把 ActionRecord 映射回帧坐标
    pub origin: (i32, i32),
}
