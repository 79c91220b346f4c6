/// 检测数据结构定义
/// Data structures for the detection stage
use serde::{Deserialize, Serialize};

// ========== 类别表 ==========

/// 游戏模型的类别名称 (按 class_id 索引)
pub const CLASS_NAMES: [&str; 11] = [
    "player",
    "bot",
    "weapon",
    "outline",
    "dead_body",
    "hideout_target_human",
    "hideout_target_balls",
    "head",
    "smoke",
    "fire",
    "third_person",
];

/// Class id of the head class, the default precision class.
pub const HEAD_CLASS: u32 = 7;

/// Human readable label for a class id, falls back to `class_<id>`.
pub fn class_name(class_id: u32) -> String {
    CLASS_NAMES
        .get(class_id as usize)
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("class_{}", class_id))
}

// ========== 数据结构 ==========

/// 检测框 (Detection bounding box, corner form)
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Box of size `w`x`h` centred on `(cx, cy)`.
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
        }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    pub fn scaled(&self, sx: f32, sy: f32) -> Self {
        Self {
            x1: self.x1 * sx,
            y1: self.y1 * sy,
            x2: self.x2 * sx,
            y2: self.y2 * sy,
        }
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self {
            x1: self.x1 + dx,
            y1: self.y1 + dy,
            x2: self.x2 + dx,
            y2: self.y2 + dy,
        }
    }
}

/// 单帧检测结果 (one object found by the detector)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BBox,
    pub class_id: u32,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
    /// 跟踪ID, 仅在跟踪器处理后存在
    #[serde(default)]
    pub track_id: Option<u32>,
}

fn default_confidence() -> f32 {
    1.0
}

impl Detection {
    pub fn new(bbox: BBox, class_id: u32, confidence: f32) -> Self {
        Self {
            bbox,
            class_id,
            confidence,
            track_id: None,
        }
    }

    /// Same detection shifted by `(dx, dy)`, e.g. frame space → screen space.
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self {
            bbox: self.bbox.translated(dx, dy),
            ..self.clone()
        }
    }

    /// 渲染标签: `#id name conf`
    pub fn label(&self) -> String {
        match self.track_id {
            Some(id) => format!("#{} {} {:.2}", id, class_name(self.class_id), self.confidence),
            None => format!("{} {:.2}", class_name(self.class_id), self.confidence),
        }
    }
}
