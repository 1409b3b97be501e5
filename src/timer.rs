// timer.rs — 可取消的周期定时器槽位（同一时刻最多一个定时器）

use std::time::{Duration, Instant};

/// Identifies one arming of a [`TimerSlot`]. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy)]
struct Armed {
    handle: TimerHandle,
    period: Duration,
    next_due: Instant,
}

/// Source of "now" for arming timers.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Holds at most one repeating timer. Arming always invalidates the previous one.
#[derive(Debug, Default)]
pub struct TimerSlot {
    generation: u64,
    armed: Option<Armed>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, now: Instant, period: Duration) -> TimerHandle {
        self.cancel();
        self.generation += 1;
        let handle = TimerHandle(self.generation);
        self.armed = Some(Armed {
            handle,
            period,
            next_due: now + period,
        });
        handle
    }

    pub fn cancel(&mut self) -> Option<TimerHandle> {
        self.armed.take().map(|a| a.handle)
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn is_live(&self, handle: TimerHandle) -> bool {
        matches!(self.armed, Some(a) if a.handle == handle)
    }

    pub fn handle(&self) -> Option<TimerHandle> {
        self.armed.map(|a| a.handle)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.armed.map(|a| a.next_due)
    }

    /// 若已到期，返回句柄并把下次到期时间推后一个周期
    pub fn take_due(&mut self, now: Instant) -> Option<TimerHandle> {
        let armed = self.armed.as_mut()?;
        if armed.next_due > now {
            return None;
        }
        armed.next_due += armed.period;
        Some(armed.handle)
    }
}
