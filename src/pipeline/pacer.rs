//! 固定节拍 (tick pacing)
//!
//! One [`Pacer`] is created at the top of every loop iteration. Waiting sleeps
//! out whatever is left of the tick; an iteration that already used the whole
//! tick is reported as an overrun and not corrected.

use std::thread;
use std::time::{Duration, Instant};

use super::Shutdown;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Pace {
    Slept(Duration),
    /// 剩余时间 (秒, ≤ 0)
    Overrun(f64),
    Cancelled,
}

#[derive(Debug)]
pub struct Pacer {
    tick: Duration,
    caller: &'static str,
    start: Instant,
}

impl Pacer {
    pub fn new(tick: Duration, caller: &'static str) -> Self {
        Self {
            tick,
            caller,
            start: Instant::now(),
        }
    }

    /// tick − elapsed, in seconds (negative on overrun)
    pub fn remaining(&self) -> f64 {
        self.tick.as_secs_f64() - self.start.elapsed().as_secs_f64()
    }

    pub fn wait(self) -> Pace {
        let remaining = self.remaining();
        if remaining > 0.0 {
            let nap = Duration::from_secs_f64(remaining);
            thread::sleep(nap);
            Pace::Slept(nap)
        } else {
            self.overrun(remaining)
        }
    }

    /// Like [`Pacer::wait`], but returns [`Pace::Cancelled`] as soon as the
    /// shutdown signal fires.
    pub fn wait_or_cancel(self, shutdown: &Shutdown) -> Pace {
        if shutdown.is_triggered() {
            return Pace::Cancelled;
        }
        let remaining = self.remaining();
        if remaining > 0.0 {
            let nap = Duration::from_secs_f64(remaining);
            if shutdown.sleep(nap) {
                Pace::Cancelled
            } else {
                Pace::Slept(nap)
            }
        } else {
            self.overrun(remaining)
        }
    }

    fn overrun(&self, remaining: f64) -> Pace {
        log::warn!("⚠️ [{}] 超出节拍 {:.4}s", self.caller, remaining);
        Pace::Overrun(remaining)
    }
}
