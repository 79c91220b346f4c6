//! 采集区域几何信息 (capture region geometry)
//!
//! A [`SessionMonitor`] is created once by the binary and cloned into every
//! loop that needs geometry. Only the capture loop writes it: it activates the
//! monitor when a session starts and the returned [`MonitorLease`] clears it
//! again when dropped, so the geometry can never outlive its session.

use std::sync::{Arc, PoisonError, RwLock};

use crate::error::SessionError;

/// 屏幕坐标点
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// 平方欧氏距离
    pub fn distance_sq(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Capture region: origin and center in screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Monitor {
    pub origin: (i32, i32),
    pub size: (u32, u32),
    pub center: Point,
}

impl Monitor {
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            origin: (left, top),
            size: (width, height),
            center: Point::new(
                left as f32 + width as f32 / 2.0,
                top as f32 + height as f32 / 2.0,
            ),
        }
    }

    pub fn width(&self) -> u32 {
        self.size.0
    }

    pub fn height(&self) -> u32 {
        self.size.1
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum MonitorState {
    #[default]
    Inactive,
    Active(Monitor),
}

/// Shared handle to the session geometry.
#[derive(Clone, Debug, Default)]
pub struct SessionMonitor {
    state: Arc<RwLock<MonitorState>>,
}

impl SessionMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the geometry for a new session. Fails if one is already active.
    pub fn activate(&self, monitor: Monitor) -> Result<MonitorLease, SessionError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let MonitorState::Active(_) = *state {
            return Err(SessionError::MonitorAlreadyActive);
        }
        *state = MonitorState::Active(monitor);
        Ok(MonitorLease {
            owner: self.clone(),
        })
    }

    /// 读取当前几何信息; 会话未激活时报错, 绝不返回过期数据
    pub fn get(&self) -> Result<Monitor, SessionError> {
        match self.state() {
            MonitorState::Active(monitor) => Ok(monitor),
            MonitorState::Inactive => Err(SessionError::MonitorInactive),
        }
    }

    pub fn state(&self) -> MonitorState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state(), MonitorState::Active(_))
    }

    fn clear(&self) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = MonitorState::Inactive;
    }
}

/// Clears the session geometry on drop.
#[derive(Debug)]
pub struct MonitorLease {
    owner: SessionMonitor,
}

impl Drop for MonitorLease {
    fn drop(&mut self) {
        self.owner.clear();
        log::debug!("monitor geometry cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_is_in_screen_space() {
        let m = Monitor::new(100, 50, 640, 360);
        assert_eq!(m.center, Point::new(420.0, 230.0));
    }

    #[test]
    fn test_lifecycle() {
        let shared = SessionMonitor::new();
        assert!(matches!(shared.get(), Err(SessionError::MonitorInactive)));

        let lease = shared.activate(Monitor::new(0, 0, 640, 360)).unwrap();
        let reader = shared.clone();
        assert_eq!(reader.get().unwrap().size, (640, 360));
        assert!(matches!(
            shared.activate(Monitor::new(0, 0, 1, 1)),
            Err(SessionError::MonitorAlreadyActive)
        ));

        drop(lease);
        assert!(!reader.is_active());
        assert!(reader.get().is_err());
    }

    #[test]
    fn test_distance_sq() {
        assert_eq!(Point::new(3.0, 4.0).distance_sq(&Point::default()), 25.0);
    }
}
