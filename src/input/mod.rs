/// 视频输入系统 (Capture Input System)
///
/// 采集线程使用的外部协作者:
/// - GeometryLookup: 采集区域发现 (固定区域 / wmctrl 窗口查找)
/// - FrameSource:   帧采集 (静态图片 / 模拟帧)
/// - RawFrame:      原始帧 + 通道顺序归一化
pub mod frame;
pub mod geometry;
pub mod source;

pub use frame::{Frame, PixelLayout, RawFrame};
pub use geometry::{find_window, parse_geometry, parse_size, FixedGeometry, GeometryLookup, WmctrlLookup};
pub use source::{solid_frame, FrameSource, ImageFileSource, SyntheticSource};
