/// 渲染系统 (Rendering)
///
/// - annotate:   检测框 + 标签 + 目标标记
/// - RenderSink: 输出后端 (headless / snapshot / sequence)
pub mod sinks;

use std::fs;
use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use clap::ValueEnum;
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut,
};
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

use crate::detection::tracker::id_to_color;
use crate::detection::Detection;
use crate::monitor::Point;

pub use sinks::{HeadlessSink, SequenceSink, SnapshotSink};

const LABEL_SCALE: f32 = 16.0;
const TARGET_RADIUS: i32 = 4;
const TARGET_ARM: f32 = 12.0;
const TARGET_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// 渲染后端
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderBackend {
    /// 不启动渲染线程
    Off,
    /// 标注后丢弃
    Headless,
    /// 覆盖写 latest.png
    #[default]
    Snapshot,
    /// 按时间戳保存每一帧
    Sequence,
}

/// 渲染输出接口 (外部协作者)
pub trait RenderSink: Send {
    fn present(&mut self, image: &RgbImage) -> Result<()>;

    /// 释放资源, 渲染线程退出前调用一次
    fn release(&mut self);
}

/// Build the sink for `backend`; `None` for [`RenderBackend::Off`].
pub fn build_sink(backend: RenderBackend, out_dir: &Path) -> Result<Option<Box<dyn RenderSink>>> {
    let sink: Box<dyn RenderSink> = match backend {
        RenderBackend::Off => return Ok(None),
        RenderBackend::Headless => Box::new(HeadlessSink::new()),
        RenderBackend::Snapshot => Box::new(SnapshotSink::new(out_dir)?),
        RenderBackend::Sequence => Box::new(SequenceSink::new(out_dir)?),
    };
    Ok(Some(sink))
}

/// 加载标签字体
pub fn load_font(path: &Path) -> Result<FontVec> {
    let data = fs::read(path).with_context(|| format!("read font {}", path.display()))?;
    let font = FontVec::try_from_vec(data)
        .with_context(|| format!("parse font {}", path.display()))?;
    log::info!("✅ 字体加载成功: {}", path.display());
    Ok(font)
}

/// 在帧副本上绘制检测框、标签和目标标记 (均为帧坐标)
pub fn annotate(
    image: &RgbImage,
    detections: &[Detection],
    target: Option<Point>,
    font: Option<&FontVec>,
) -> RgbImage {
    let mut canvas = image.clone();

    for det in detections {
        let (r, g, b) = id_to_color(det.track_id.unwrap_or(det.class_id));
        let color = Rgb([r, g, b]);

        let x = det.bbox.x1.round() as i32;
        let y = det.bbox.y1.round() as i32;
        let w = det.bbox.width().round().max(1.0) as u32;
        let h = det.bbox.height().round().max(1.0) as u32;
        draw_hollow_rect_mut(&mut canvas, Rect::at(x, y).of_size(w, h), color);

        if let Some(font) = font {
            let label_y = (y - LABEL_SCALE as i32).max(0);
            draw_text_mut(
                &mut canvas,
                color,
                x.max(0),
                label_y,
                PxScale::from(LABEL_SCALE),
                font,
                &det.label(),
            );
        }
    }

    if let Some(p) = target {
        draw_filled_circle_mut(
            &mut canvas,
            (p.x.round() as i32, p.y.round() as i32),
            TARGET_RADIUS,
            TARGET_COLOR,
        );
        draw_line_segment_mut(
            &mut canvas,
            (p.x - TARGET_ARM, p.y),
            (p.x + TARGET_ARM, p.y),
            TARGET_COLOR,
        );
        draw_line_segment_mut(
            &mut canvas,
            (p.x, p.y - TARGET_ARM),
            (p.x, p.y + TARGET_ARM),
            TARGET_COLOR,
        );
    }

    canvas
}
