/// 决策系统 (Strategy)
///
/// - TargetSelector: 检测集合 → 观测 (采集线程调用)
/// - MotionModel:    观测 → 相对指针位移 (决策线程调用)
pub mod movement;
pub mod selector;

pub use movement::{Motion, MotionModel};
pub use selector::TargetSelector;
