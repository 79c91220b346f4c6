//! 单槽邮箱 (single-slot, overwrite, edge-triggered)
//!
//! `publish` never blocks and overwrites whatever is pending. The readiness
//! signal is raised only on the empty → full edge, so any number of publishes
//! between two takes produce exactly one wakeup and the consumer always gets
//! the newest value. Single consumer only.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};

pub struct Mailbox<T> {
    slot: Mutex<Option<T>>,
    ready: Condvar,
    signals: AtomicU64,
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            ready: Condvar::new(),
            signals: AtomicU64::new(0),
        }
    }

    /// Replace the pending value. Returns `true` if this publish raised the
    /// readiness signal, `false` if it overwrote an unconsumed value.
    pub fn publish(&self, value: T) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        let was_empty = slot.replace(value).is_none();
        if was_empty {
            self.signals.fetch_add(1, Ordering::Relaxed);
            self.ready.notify_one();
        }
        was_empty
    }

    /// Block until a value is pending, then take it. No timeout.
    pub fn take_blocking(&self) -> T {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(value) = slot.take() {
                return value;
            }
            slot = self
                .ready
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// 丢弃未消费的值 (不触发信号)
    pub fn clear(&self) -> Option<T> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Number of readiness signals raised so far.
    pub fn signals(&self) -> u64 {
        self.signals.load(Ordering::Relaxed)
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_latest_value_single_wakeup() {
        for n in 1..=5u32 {
            let mailbox = Mailbox::new();
            let raised: Vec<bool> = (1..=n).map(|i| mailbox.publish(i)).collect();
            assert_eq!(raised.iter().filter(|&&r| r).count(), 1);
            assert!(raised[0]);
            assert_eq!(mailbox.take_blocking(), n);
            assert_eq!(mailbox.signals(), 1);
            assert!(mailbox.clear().is_none());
        }
    }

    #[test]
    fn test_signal_rearms_after_take() {
        let mailbox = Mailbox::new();
        assert!(mailbox.publish("a"));
        assert_eq!(mailbox.take_blocking(), "a");
        assert!(mailbox.publish("b"));
        assert!(!mailbox.publish("c"));
        assert_eq!(mailbox.take_blocking(), "c");
        assert_eq!(mailbox.signals(), 2);
    }

    #[test]
    fn test_take_blocks_until_first_publish() {
        let mailbox = Arc::new(Mailbox::new());
        let (tx, rx) = crossbeam_channel::bounded(1);

        let consumer = {
            let mailbox = Arc::clone(&mailbox);
            thread::spawn(move || {
                let value = mailbox.take_blocking();
                tx.send(value).unwrap();
            })
        };

        // 消费者仍在阻塞
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

        mailbox.publish(7u32);
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), 7);
        consumer.join().unwrap();
    }

    #[test]
    fn test_producer_never_blocks_on_slow_consumer() {
        let mailbox = Arc::new(Mailbox::new());
        let producer = {
            let mailbox = Arc::clone(&mailbox);
            thread::spawn(move || {
                for i in 0..10_000u32 {
                    mailbox.publish(i);
                }
            })
        };
        producer.join().unwrap();
        assert_eq!(mailbox.take_blocking(), 9_999);
        assert_eq!(mailbox.signals(), 1);
    }

    #[test]
    fn test_clear_discards_pending() {
        let mailbox = Mailbox::new();
        mailbox.publish(1);
        assert_eq!(mailbox.clear(), Some(1));
        assert!(mailbox.publish(2));
        assert_eq!(mailbox.signals(), 2);
    }
}
