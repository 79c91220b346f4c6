//! 采集区域发现 (capture geometry discovery)
//!
//! - `FixedGeometry`:  命令行给定的固定区域
//! - `WmctrlLookup`: 通过 `wmctrl -lG` 查找标题包含关键字的窗口 (例如 scrcpy 投屏窗口)

use std::process::Command;

use crate::monitor::Monitor;

/// 采集几何信息接口 (外部协作者)
pub trait GeometryLookup: Send {
    fn capture_geometry(&self) -> Option<Monitor>;

    /// 用于错误信息
    fn describe(&self) -> String {
        "geometry lookup".to_string()
    }
}

/// 固定区域
#[derive(Clone, Debug)]
pub struct FixedGeometry(pub Monitor);

impl GeometryLookup for FixedGeometry {
    fn capture_geometry(&self) -> Option<Monitor> {
        Some(self.0)
    }
}

/// Parse a geometry string `WxH+X+Y` (X11 style) or `WxH` (origin at 0,0).
pub fn parse_geometry(spec: &str) -> Option<Monitor> {
    let mut parts = spec.trim().split('+');
    let (w, h) = parse_size(parts.next()?)?;
    let x = match parts.next() {
        Some(v) => v.parse().ok()?,
        None => 0,
    };
    let y = match parts.next() {
        Some(v) => v.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() {
        return None;
    }
    Some(Monitor::new(x, y, w, h))
}

/// Parse `WxH`.
pub fn parse_size(spec: &str) -> Option<(u32, u32)> {
    let (w, h) = spec.trim().split_once(['x', 'X'])?;
    let (w, h) = (w.parse().ok()?, h.parse().ok()?);
    if w == 0 || h == 0 {
        return None;
    }
    Some((w, h))
}

/// `wmctrl -lG` 窗口查找
#[derive(Clone, Debug)]
pub struct WmctrlLookup {
    pub keyword: String,
}

impl WmctrlLookup {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
        }
    }
}

impl GeometryLookup for WmctrlLookup {
    fn capture_geometry(&self) -> Option<Monitor> {
        let output = match Command::new("wmctrl").arg("-lG").output() {
            Ok(output) if output.status.success() => output,
            Ok(output) => {
                log::warn!("⚠️ wmctrl exited with {}", output.status);
                return None;
            }
            Err(e) => {
                log::warn!("⚠️ failed to run wmctrl: {}", e);
                return None;
            }
        };
        let listing = String::from_utf8_lossy(&output.stdout);
        find_window(&listing, &self.keyword)
    }

    fn describe(&self) -> String {
        format!("no window matching {:?}", self.keyword)
    }
}

/// 解析 `wmctrl -lG` 输出, 返回第一个包含关键字的窗口
///
/// Line layout: `<id> <desktop> <x> <y> <w> <h> <host> <title...>`
pub fn find_window(listing: &str, keyword: &str) -> Option<Monitor> {
    listing
        .lines()
        .filter(|line| line.contains(keyword))
        .find_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 6 {
                return None;
            }
            let x = parts[2].parse().ok()?;
            let y = parts[3].parse().ok()?;
            let (w, h) = parse_size(&format!("{}x{}", parts[4], parts[5]))?;
            Some(Monitor::new(x, y, w, h))
        })
}
