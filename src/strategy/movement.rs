//! 相对指针位移计算 (angular FOV model)
//!
//! ```text
//! offset          = target - monitor.center
//! degrees_per_px  = (fov_x / width, fov_y / height)
//! angular_offset  = offset * degrees_per_px
//! motion          = angular_offset / 360 * (dpi / sensitivity) * speed_multiplier
//! ```

use crate::monitor::{Monitor, Point};

/// 指针位移
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Motion {
    pub dx: f32,
    pub dy: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MotionModel {
    pub fov_x: f32,
    pub fov_y: f32,
    pub dpi: f32,
    pub sensitivity: f32,
    pub speed_multiplier: f32,
}

impl Default for MotionModel {
    fn default() -> Self {
        Self {
            fov_x: 40.0,
            fov_y: 40.0,
            dpi: 1100.0,
            sensitivity: 3.0,
            speed_multiplier: 1.0,
        }
    }
}

impl MotionModel {
    pub fn motion(&self, target: Point, monitor: &Monitor) -> Motion {
        let (width, height) = (monitor.width() as f32, monitor.height() as f32);

        let offset_x = target.x - monitor.center.x;
        let offset_y = target.y - monitor.center.y;

        let degrees_x = offset_x * (self.fov_x / width);
        let degrees_y = offset_y * (self.fov_y / height);

        let counts_per_turn = self.dpi / self.sensitivity;
        Motion {
            dx: degrees_x / 360.0 * counts_per_turn * self.speed_multiplier,
            dy: degrees_y / 360.0 * counts_per_turn * self.speed_multiplier,
        }
    }
}
