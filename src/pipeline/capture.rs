//! 采集线程 (Capture)
//! 职责: 采集区域 → 抓帧 → 通道归一化 → 检测+跟踪 → 目标选择 → 发布 Step
//!
//! The loop owns the session: it activates the shared monitor geometry on
//! start and the lease clears it on exit. Every exit path ends with a
//! `Step::Abort` publish so the operator never stays parked on the mailbox.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{Mailbox, Pace, Pacer, Shutdown, Step, VisualHandle, VisualSource};
use crate::detection::{DetectAndTrack, Detection};
use crate::error::SessionError;
use crate::input::{FrameSource, GeometryLookup, RawFrame};
use crate::monitor::{Monitor, SessionMonitor};
use crate::strategy::TargetSelector;

pub struct CaptureLoop {
    lookup: Box<dyn GeometryLookup>,
    source: Box<dyn FrameSource>,
    detector: Box<dyn DetectAndTrack>,
    selector: TargetSelector,
    monitor: SessionMonitor,
    mailbox: Arc<Mailbox<Step>>,
    visual: Option<VisualHandle>,
    tick: Duration,
    shutdown: Shutdown,

    // 统计
    count: u64,
    grab_failures: u64,
    targets: u64,
    last: Instant,
}

impl CaptureLoop {
    pub fn new(
        lookup: Box<dyn GeometryLookup>,
        source: Box<dyn FrameSource>,
        detector: Box<dyn DetectAndTrack>,
        monitor: SessionMonitor,
        mailbox: Arc<Mailbox<Step>>,
        tick: Duration,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            lookup,
            source,
            detector,
            selector: TargetSelector::default(),
            monitor,
            mailbox,
            visual: None,
            tick,
            shutdown,
            count: 0,
            grab_failures: 0,
            targets: 0,
            last: Instant::now(),
        }
    }

    pub fn with_selector(mut self, selector: TargetSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_visualizer(mut self, visual: VisualHandle) -> Self {
        self.visual = Some(visual);
        self
    }

    pub fn run(&mut self) -> Result<(), SessionError> {
        log::info!("📷 采集模块启动");

        let Some(geometry) = self.lookup.capture_geometry() else {
            let reason = self.lookup.describe();
            log::error!("❌ 未找到采集区域: {}", reason);
            self.mailbox.publish(Step::Abort);
            return Err(SessionError::GeometryNotFound(reason));
        };

        let lease = match self.monitor.activate(geometry) {
            Ok(lease) => lease,
            Err(e) => {
                log::error!("❌ 采集会话启动失败: {}", e);
                self.mailbox.publish(Step::Abort);
                return Err(e);
            }
        };
        log::info!(
            "✅ 采集区域: {}x{}+{}+{}",
            geometry.width(),
            geometry.height(),
            geometry.origin.0,
            geometry.origin.1
        );

        loop {
            let pacer = Pacer::new(self.tick, "capture");
            if self.shutdown.is_triggered() {
                break;
            }

            self.step(&geometry);

            if self.last.elapsed() >= Duration::from_secs(5) {
                log::debug!(
                    "📷 {} 帧 | {} 次锁定目标 | {} 次抓帧失败",
                    self.count,
                    self.targets,
                    self.grab_failures
                );
                self.last = Instant::now();
            }

            if let Pace::Cancelled = pacer.wait_or_cancel(&self.shutdown) {
                break;
            }
        }

        drop(lease);
        self.detector.reset();
        // 唤醒阻塞在邮箱上的决策线程
        self.mailbox.publish(Step::Abort);
        log::info!("✅ 采集模块退出 (共 {} 帧)", self.count);
        Ok(())
    }

    /// One capture cycle against `monitor`. Returns the step that was published.
    pub fn step(&mut self, monitor: &Monitor) -> Step {
        self.count += 1;

        let frame = match self.source.grab(monitor).and_then(RawFrame::normalize) {
            Ok(frame) => frame,
            Err(e) => {
                self.grab_failures += 1;
                log::warn!("⚠️ 抓帧失败 (#{}): {:#}", self.count, e);
                self.mailbox.publish(Step::Abort);
                return Step::Abort;
            }
        };

        let detections = self.detector.detect_and_track(&frame);

        // 帧坐标 → 屏幕坐标 (monitor.center 是屏幕坐标)
        let (ox, oy) = (monitor.origin.0 as f32, monitor.origin.1 as f32);
        let on_screen: Vec<Detection> = detections.iter().map(|d| d.translated(ox, oy)).collect();

        let observation = self.selector.select(&on_screen, monitor.center);
        if let super::Observation::Target { .. } = observation {
            self.targets += 1;
        }

        let step = Step::Observe(observation);
        self.mailbox.publish(step);

        if let Some(visual) = &self.visual {
            visual.push_source(VisualSource {
                frame: Arc::new(frame),
                detections,
                origin: monitor.origin,
            });
        }

        step
    }
}
