//! 决策线程 (Operator)
//! 职责: 阻塞等待 Step → 观测转换为相对指针位移 → PointerSink + ActionRecord
//!
//! `take_blocking` is the only suspension point. The shutdown flag is checked
//! right after every take, so once the capture loop publishes its final
//! `Abort` the operator exits without touching the pointer sink again.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{ActionRecord, Mailbox, Observation, Shutdown, Step, VisualHandle};
use crate::monitor::{Point, SessionMonitor};
use crate::pointer::PointerSink;
use crate::strategy::{Motion, MotionModel};

pub struct Operator {
    mailbox: Arc<Mailbox<Step>>,
    monitor: SessionMonitor,
    model: MotionModel,
    pointer: Box<dyn PointerSink>,
    visual: Option<VisualHandle>,
    shutdown: Shutdown,
    /// 上一次观测是否锁定了目标; Abort 时重置
    engaged: bool,

    // 统计
    count: u64,
    moves: u64,
    last: Instant,
}

impl Operator {
    pub fn new(
        mailbox: Arc<Mailbox<Step>>,
        monitor: SessionMonitor,
        pointer: Box<dyn PointerSink>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            mailbox,
            monitor,
            model: MotionModel::default(),
            pointer,
            visual: None,
            shutdown,
            engaged: false,
            count: 0,
            moves: 0,
            last: Instant::now(),
        }
    }

    pub fn with_model(mut self, model: MotionModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_visualizer(mut self, visual: VisualHandle) -> Self {
        self.visual = Some(visual);
        self
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    pub fn run(&mut self) {
        log::info!("🧠 决策模块启动");

        loop {
            let step = self.mailbox.take_blocking();
            if self.shutdown.is_triggered() {
                break;
            }

            self.handle(step);

            if self.last.elapsed() >= Duration::from_secs(5) {
                log::debug!("🧠 {} 步 | {} 次移动", self.count, self.moves);
                self.last = Instant::now();
            }
        }

        self.mailbox.clear();
        log::info!("✅ 决策模块退出 (共 {} 次移动)", self.moves);
    }

    /// Process one mailbox message. Returns the emitted motion, if any.
    pub fn handle(&mut self, step: Step) -> Option<Motion> {
        self.count += 1;
        match step {
            Step::Abort => {
                if self.engaged {
                    log::debug!("🎯 目标丢失, 状态已重置");
                }
                self.engaged = false;
                if let Some(visual) = &self.visual {
                    visual.clear_action();
                }
                None
            }
            Step::Observe(Observation::None) => None,
            Step::Observe(Observation::Target { point, .. }) => self.act(point),
        }
    }

    fn act(&mut self, target: Point) -> Option<Motion> {
        let monitor = match self.monitor.get() {
            Ok(monitor) => monitor,
            Err(e) => {
                log::error!("❌ {}", e);
                return None;
            }
        };

        let motion = self.model.motion(target, &monitor);
        self.pointer.emit(motion.dx, motion.dy);
        self.moves += 1;
        self.engaged = true;

        if let Some(visual) = &self.visual {
            visual.push_action(ActionRecord {
                point: target,
                motion,
            });
        }
        Some(motion)
    }
}
