// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
pub mod config; // 运行配置 (命令行 + JSON)
pub mod detection; // 检测 + 跟踪
pub mod error; // 会话错误
pub mod input; // 采集输入
pub mod monitor; // 采集区域几何信息
pub mod pipeline; // 三线程闭环
pub mod pointer; // 指针位移输出
pub mod renderer; // 标注渲染
pub mod strategy; // 目标选择 + 位移计算

pub use crate::config::{AimConfig, Args};
pub use crate::error::SessionError;
pub use crate::monitor::{Monitor, MonitorState, Point, SessionMonitor};
pub use crate::pipeline::{ActionRecord, Observation, Step, VisualSource};

/// 本地时间字符串, 用于输出文件名
pub fn gen_time_string(delimiter: &str) -> String {
    let fmt = format!(
        "%Y{}%m{}%d{}%H{}%M{}%S{}%f",
        delimiter, delimiter, delimiter, delimiter, delimiter, delimiter
    );
    chrono::Local::now().format(&fmt).to_string()
}
