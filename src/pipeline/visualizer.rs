//! 渲染线程 (Visualizer)
//! 职责: 取最早的 VisualSource → 标注检测框 + 目标标记 → RenderSink
//!
//! 采集线程推送帧, 决策线程推送 ActionRecord; 两者都不等待渲染线程.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use ab_glyph::FontVec;

use super::{ActionRecord, Pace, Pacer, Shutdown, VisualSource};
use crate::monitor::Point;
use crate::renderer::{annotate, RenderSink};

#[derive(Default)]
struct VisualQueue {
    sources: Mutex<Vec<VisualSource>>,
    action: Mutex<Option<ActionRecord>>,
}

/// 渲染队列句柄 (可克隆, 跨线程共享)
#[derive(Clone, Default)]
pub struct VisualHandle {
    inner: Arc<VisualQueue>,
}

impl VisualHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_source(&self, source: VisualSource) {
        self.inner
            .sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(source);
    }

    /// Latest wins.
    pub fn push_action(&self, action: ActionRecord) {
        *self
            .inner
            .action
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(action);
    }

    pub fn clear_action(&self) {
        self.inner
            .action
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Take the oldest queued source and discard the rest.
    pub fn take_oldest(&self) -> Option<VisualSource> {
        let mut sources = self
            .inner
            .sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if sources.is_empty() {
            return None;
        }
        let oldest = sources.swap_remove(0);
        sources.clear();
        Some(oldest)
    }

    pub fn take_action(&self) -> Option<ActionRecord> {
        self.inner
            .action
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn pending_sources(&self) -> usize {
        self.inner
            .sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn has_action(&self) -> bool {
        self.inner
            .action
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn clear(&self) {
        self.inner
            .sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.clear_action();
    }
}

pub struct Visualizer {
    handle: VisualHandle,
    sink: Box<dyn RenderSink>,
    font: Option<FontVec>,
    tick: Duration,
    shutdown: Shutdown,

    // 统计
    count: u64,
    last: Instant,
}

impl Visualizer {
    pub fn new(
        handle: VisualHandle,
        sink: Box<dyn RenderSink>,
        tick: Duration,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            handle,
            sink,
            font: None,
            tick,
            shutdown,
            count: 0,
            last: Instant::now(),
        }
    }

    pub fn with_font(mut self, font: Option<FontVec>) -> Self {
        self.font = font;
        self
    }

    /// 渲染一次; 队列为空时返回 false
    fn render_once(&mut self) -> bool {
        let Some(source) = self.handle.take_oldest() else {
            return false;
        };

        // 屏幕坐标 → 帧坐标
        let target = self.handle.take_action().map(|action| {
            Point::new(
                action.point.x - source.origin.0 as f32,
                action.point.y - source.origin.1 as f32,
            )
        });

        let annotated = annotate(
            &source.frame.image,
            &source.detections,
            target,
            self.font.as_ref(),
        );
        if let Err(e) = self.sink.present(&annotated) {
            log::warn!("⚠️ 渲染失败: {:#}", e);
        }
        self.count += 1;
        true
    }

    pub fn run(&mut self) {
        log::info!("🖼️ 渲染模块启动");

        loop {
            let pacer = Pacer::new(self.tick, "visualizer");
            if self.shutdown.is_triggered() {
                break;
            }

            self.render_once();

            if self.last.elapsed() >= Duration::from_secs(5) {
                log::debug!("🖼️ 已渲染 {} 帧", self.count);
                self.last = Instant::now();
            }

            if let Pace::Cancelled = pacer.wait_or_cancel(&self.shutdown) {
                break;
            }
        }

        self.handle.clear();
        self.sink.release();
        log::info!("✅ 渲染模块退出 (共 {} 帧)", self.count);
    }

    pub fn rendered(&self) -> u64 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Frame;
    use crate::strategy::Motion;
    use anyhow::Result;
    use crossbeam_channel::Sender;
    use image::RgbImage;
    use std::thread;

    struct RecordingSink {
        presented: Sender<(u32, u32)>,
        released: Arc<Mutex<bool>>,
    }

    impl RenderSink for RecordingSink {
        fn present(&mut self, image: &RgbImage) -> Result<()> {
            let _ = self.presented.send(image.dimensions());
            Ok(())
        }

        fn release(&mut self) {
            *self.released.lock().unwrap() = true;
        }
    }

    fn source(w: u32, h: u32) -> VisualSource {
        VisualSource {
            frame: Arc::new(Frame::new(RgbImage::new(w, h))),
            detections: Vec::new(),
            origin: (0, 0),
        }
    }

    #[test]
    fn test_take_oldest_discards_rest() {
        let handle = VisualHandle::new();
        handle.push_source(source(10, 10));
        handle.push_source(source(20, 20));
        handle.push_source(source(30, 30));

        let taken = handle.take_oldest().unwrap();
        assert_eq!(taken.frame.width(), 10);
        assert_eq!(handle.pending_sources(), 0);
        assert!(handle.take_oldest().is_none());
    }

    #[test]
    fn test_action_slot_latest_wins() {
        let handle = VisualHandle::new();
        let record = |x: f32| ActionRecord {
            point: Point::new(x, 0.0),
            motion: Motion::default(),
        };
        handle.push_action(record(1.0));
        handle.push_action(record(2.0));
        assert_eq!(handle.take_action().unwrap().point.x, 2.0);
        assert!(handle.take_action().is_none());

        handle.push_action(record(3.0));
        handle.clear_action();
        assert!(!handle.has_action());
    }

    #[test]
    fn test_renders_oldest_once_then_shuts_down() {
        let handle = VisualHandle::new();
        handle.push_source(source(10, 10));
        handle.push_source(source(20, 20));
        handle.push_source(source(30, 30));

        let (tx, rx) = crossbeam_channel::unbounded();
        let released = Arc::new(Mutex::new(false));
        let sink = RecordingSink {
            presented: tx,
            released: Arc::clone(&released),
        };
        let shutdown = Shutdown::new();
        let mut visualizer = Visualizer::new(
            handle.clone(),
            Box::new(sink),
            Duration::from_millis(10),
            shutdown.clone(),
        );

        let worker = thread::spawn(move || {
            visualizer.run();
            visualizer.rendered()
        });

        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), (10, 10));
        thread::sleep(Duration::from_millis(50));
        shutdown.trigger();

        assert_eq!(worker.join().unwrap(), 1);
        assert!(rx.try_recv().is_err());
        assert!(*released.lock().unwrap());
    }

    #[test]
    fn test_shutdown_clears_queue_and_action() {
        let handle = VisualHandle::new();
        let (tx, _rx) = crossbeam_channel::unbounded();
        let sink = RecordingSink {
            presented: tx,
            released: Arc::new(Mutex::new(false)),
        };
        let shutdown = Shutdown::new();
        shutdown.trigger();

        handle.push_source(source(4, 4));
        handle.push_action(ActionRecord {
            point: Point::default(),
            motion: Motion::default(),
        });

        let mut visualizer =
            Visualizer::new(handle.clone(), Box::new(sink), Duration::from_millis(5), shutdown);
        visualizer.run();

        assert_eq!(visualizer.rendered(), 0);
        assert_eq!(handle.pending_sources(), 0);
        assert!(!handle.has_action());
    }
}
