//! 指针位移输出 (pointer motion sink)

/// 相对指针位移接口 (外部协作者)
pub trait PointerSink: Send {
    fn emit(&mut self, dx: f32, dy: f32);
}

/// 只记录日志, 不注入任何输入事件
#[derive(Debug, Default)]
pub struct LogPointer {
    count: u64,
    total: (f64, f64),
}

impl LogPointer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// 累计位移
    pub fn total(&self) -> (f64, f64) {
        self.total
    }
}

impl PointerSink for LogPointer {
    fn emit(&mut self, dx: f32, dy: f32) {
        self.count += 1;
        self.total.0 += dx as f64;
        self.total.1 += dy as f64;
        log::debug!("🖱️ move #{} ({:+.2}, {:+.2})", self.count, dx, dy);
    }
}
