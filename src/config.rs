//! 运行配置
//!
//! - [`Args`]: 命令行参数 (线程节拍, 输入源, 渲染后端 ...)
//! - [`AimConfig`]: 瞄准参数, 通过JSON文件调整

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::detection::{ByteTrackConfig, HEAD_CLASS};
use crate::error::SessionError;
use crate::input::parse_size;
use crate::renderer::RenderBackend;
use crate::strategy::{MotionModel, TargetSelector};

/// 三线程闭环: 采集 → 决策 → 渲染
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "siri - 采集/决策/渲染三线程闭环", long_about = None)]
pub struct Args {
    /// 每个循环的节拍 (秒)
    #[arg(long, default_value_t = 0.028)]
    pub tick: f64,

    /// 检测置信度阈值
    #[arg(long, default_value_t = 0.2)]
    pub conf: f32,

    /// 推理设备
    #[arg(long, default_value = "cuda:0")]
    pub device: String,

    /// 推理输入尺寸 WxH
    #[arg(long, default_value = "640x360")]
    pub frame_size: String,

    /// 帧来源: synthetic 或图片路径
    #[arg(short, long, default_value = "synthetic")]
    pub source: String,

    /// 固定采集区域 WxH+X+Y; 不指定时通过 wmctrl 查找窗口
    #[arg(short, long)]
    pub geometry: Option<String>,

    /// 窗口标题关键字
    #[arg(short, long, default_value = "Phone")]
    pub window: String,

    /// 检测回放脚本 (JSON); 不指定时使用模拟检测器
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// 渲染后端
    #[arg(long, value_enum, default_value_t = RenderBackend::Snapshot)]
    pub render: RenderBackend,

    /// 渲染输出目录
    #[arg(long, default_value = "frames")]
    pub out_dir: PathBuf,

    /// 标签字体 (TTF/OTF); 不指定时不绘制文字
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// 瞄准参数文件
    #[arg(long, default_value = "aim_config.json")]
    pub aim_config: PathBuf,

    /// 输出调试日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn tick(&self) -> Result<Duration, SessionError> {
        if !self.tick.is_finite() || self.tick <= 0.0 {
            return Err(SessionError::Config(format!(
                "tick must be positive, got {}",
                self.tick
            )));
        }
        Ok(Duration::from_secs_f64(self.tick))
    }

    pub fn frame_size(&self) -> Result<(u32, u32), SessionError> {
        parse_size(&self.frame_size).ok_or_else(|| {
            SessionError::Config(format!("invalid frame size {:?}", self.frame_size))
        })
    }
}

/// 瞄准参数配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AimConfig {
    // === 目标选择 ===
    pub body_offset_fraction: f32, // 身体框瞄准点上移比例
    pub allowed_classes: Vec<u32>, // 允许的类别
    pub precision_class: u32,      // 优先类别 (头部)

    // === 指针位移 ===
    pub fov_x: f32,            // 水平视场角 (度)
    pub fov_y: f32,            // 垂直视场角 (度)
    pub dpi: f32,              // 鼠标DPI
    pub sensitivity: f32,      // 游戏内灵敏度
    pub speed_multiplier: f32, // 速度倍率

    // === ByteTrack参数 ===
    pub bytetrack: ByteTrackConfig,
}

impl Default for AimConfig {
    fn default() -> Self {
        Self {
            body_offset_fraction: 0.1,
            allowed_classes: vec![0, 1, HEAD_CLASS],
            precision_class: HEAD_CLASS,

            fov_x: 40.0,
            fov_y: 40.0,
            dpi: 1100.0,
            sensitivity: 3.0,
            speed_multiplier: 1.0,

            bytetrack: ByteTrackConfig::default(),
        }
    }
}

impl AimConfig {
    /// 从JSON文件加载配置; 文件不存在时写入默认配置, 解析失败时使用默认值
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(config) => {
                    log::info!("✅ 配置已从 {} 加载", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("⚠️ 配置文件解析失败: {}, 使用默认值", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("📝 配置文件不存在, 创建默认配置...");
                let config = Self::default();
                config.save(path);
                config
            }
        }
    }

    /// 保存配置到JSON文件
    pub fn save(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(path, json) {
                    log::error!("❌ 保存配置失败: {}", e);
                } else {
                    log::info!("💾 配置已保存到 {}", path.display());
                }
            }
            Err(e) => log::error!("❌ 序列化配置失败: {}", e),
        }
    }

    pub fn selector(&self) -> TargetSelector {
        TargetSelector {
            allowed_classes: self.allowed_classes.clone(),
            precision_class: self.precision_class,
            body_offset_fraction: self.body_offset_fraction,
        }
    }

    pub fn motion_model(&self) -> MotionModel {
        MotionModel {
            fov_x: self.fov_x,
            fov_y: self.fov_y,
            dpi: self.dpi,
            sensitivity: self.sensitivity,
            speed_multiplier: self.speed_multiplier,
        }
    }

    /// 打印当前配置
    pub fn print_summary(&self) {
        log::info!("🎛️ 当前瞄准配置:");
        log::info!("  允许类别: {:?} | 优先类别: {}", self.allowed_classes, self.precision_class);
        log::info!("  身体偏移: {:.2}", self.body_offset_fraction);
        log::info!(
            "  视场角: {:.1}/{:.1} | DPI: {:.0} | 灵敏度: {:.2} | 倍率: {:.2}",
            self.fov_x,
            self.fov_y,
            self.dpi,
            self.sensitivity,
            self.speed_multiplier
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = Args::parse_from(["siri"]);
        assert_eq!(args.tick().unwrap(), Duration::from_secs_f64(0.028));
        assert_eq!(args.conf, 0.2);
        assert_eq!(args.device, "cuda:0");
        assert_eq!(args.frame_size().unwrap(), (640, 360));
        assert_eq!(args.render, RenderBackend::Snapshot);
        assert_eq!(args.window, "Phone");
        assert!(args.geometry.is_none());
    }

    #[test]
    fn test_invalid_args_are_config_errors() {
        let args = Args::parse_from(["siri", "--tick", "0", "--frame-size", "640"]);
        assert!(matches!(args.tick(), Err(SessionError::Config(_))));
        assert!(matches!(args.frame_size(), Err(SessionError::Config(_))));
    }

    #[test]
    fn test_render_backend_values() {
        let args = Args::parse_from(["siri", "--render", "off"]);
        assert_eq!(args.render, RenderBackend::Off);
    }

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aim.json");

        let config = AimConfig::load(&path);
        assert_eq!(config, AimConfig::default());
        assert!(path.exists());
        assert_eq!(AimConfig::load(&path), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aim.json");
        fs::write(&path, r#"{ "dpi": 800.0, "allowed_classes": [7] }"#).unwrap();

        let config = AimConfig::load(&path);
        assert_eq!(config.dpi, 800.0);
        assert_eq!(config.allowed_classes, vec![7]);
        assert_eq!(config.sensitivity, 3.0);
        assert_eq!(config.motion_model().dpi, 800.0);
        assert_eq!(config.selector().allowed_classes, vec![7]);
    }

    #[test]
    fn test_malformed_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aim.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(AimConfig::load(&path), AimConfig::default());
    }
}
