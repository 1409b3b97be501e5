// inertia.rs — 松手后的惯性衰减
//
// 第 0 次 tick 只选取强度系数；第 1..=150 次按 1/n 调和衰减输出位移；
// 超过 150 次后自行停止。

use crate::config::InertiaConfig;
use crate::error::ViewerError;
use crate::timer::{TimerHandle, TimerSlot};
use glam::Vec2;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Last tick index that still produces motion.
pub const INERTIA_TICK_LIMIT: u32 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InertiaMode {
    #[default]
    None,
    Short,
    Long,
}

impl InertiaMode {
    pub const ALL: [InertiaMode; 3] = [InertiaMode::None, InertiaMode::Short, InertiaMode::Long];
}

impl FromStr for InertiaMode {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(InertiaMode::None),
            "short" => Ok(InertiaMode::Short),
            "long" => Ok(InertiaMode::Long),
            other => Err(ViewerError::Config(format!("unknown inertia mode {other:?}"))),
        }
    }
}

impl fmt::Display for InertiaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InertiaMode::None => "none",
            InertiaMode::Short => "short",
            InertiaMode::Long => "long",
        })
    }
}

/// Result of delivering one timer tick to the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Handle no longer armed (cancelled or replaced); nothing happened.
    Stale,
    /// Tick 0: strength ratio selected, no motion.
    Primed,
    /// Forwarded delta for the translator, horizontal already negated.
    Moved(Vec2),
    /// Tick bound exceeded; the timer is disarmed.
    Expired,
}

#[derive(Debug)]
pub struct InertiaEngine {
    weak_ratio: f32,
    strong_ratio: f32,
    period: Duration,
    timer: TimerSlot,
    mode: InertiaMode,
    release_delta: Option<Vec2>,
    tick_index: u32,
    strength_ratio: Option<f32>,
}

impl InertiaEngine {
    pub fn new(config: &InertiaConfig) -> Self {
        Self {
            weak_ratio: config.weak_ratio,
            strong_ratio: config.strong_ratio,
            period: config.tick_interval(),
            timer: TimerSlot::new(),
            mode: InertiaMode::None,
            release_delta: None,
            tick_index: 0,
            strength_ratio: None,
        }
    }

    pub fn ratio_for(&self, mode: InertiaMode) -> Option<f32> {
        match mode {
            InertiaMode::None => None,
            InertiaMode::Short => Some(self.weak_ratio),
            InertiaMode::Long => Some(self.strong_ratio),
        }
    }

    /// Arms a new sequence for the raw delta captured at release.
    ///
    /// Any running sequence is cancelled first, even when nothing new is armed.
    pub fn start(&mut self, mode: InertiaMode, release_delta: Option<Vec2>, now: Instant) -> Option<TimerHandle> {
        self.cancel();
        if mode == InertiaMode::None {
            return None;
        }
        // 从未移动过：视为未启动
        let delta = release_delta?;
        self.mode = mode;
        self.release_delta = Some(delta);
        let handle = self.timer.arm(now, self.period);
        log::debug!("inertia armed: mode={} delta=({}, {})", mode, delta.x, delta.y);
        Some(handle)
    }

    /// Disarms the timer and resets the tick counter. Returns whether a sequence was running.
    pub fn cancel(&mut self) -> bool {
        let was_running = self.timer.cancel().is_some();
        self.tick_index = 0;
        self.strength_ratio = None;
        self.release_delta = None;
        if was_running {
            log::debug!("inertia cancelled");
        }
        was_running
    }

    /// Next due handle, if the armed timer has elapsed by `now`.
    pub fn due(&mut self, now: Instant) -> Option<TimerHandle> {
        self.timer.take_due(now)
    }

    pub fn tick(&mut self, handle: TimerHandle) -> TickOutcome {
        if !self.timer.is_live(handle) {
            return TickOutcome::Stale;
        }
        let Some(delta) = self.release_delta else {
            self.cancel();
            return TickOutcome::Stale;
        };

        match self.tick_index {
            0 => {
                self.strength_ratio = self.ratio_for(self.mode);
                self.tick_index = 1;
                TickOutcome::Primed
            }
            index if index <= INERTIA_TICK_LIMIT => {
                let Some(ratio) = self.strength_ratio else {
                    self.cancel();
                    return TickOutcome::Stale;
                };
                let magnitude = delta * (1.0 / index as f32) * ratio;
                self.tick_index += 1;
                TickOutcome::Moved(Vec2::new(-magnitude.x, magnitude.y))
            }
            _ => {
                self.cancel();
                log::debug!("inertia expired");
                TickOutcome::Expired
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_armed()
    }

    pub fn tick_index(&self) -> u32 {
        self.tick_index
    }

    pub fn strength_ratio(&self) -> Option<f32> {
        self.strength_ratio
    }

    pub fn handle(&self) -> Option<TimerHandle> {
        self.timer.handle()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.next_deadline()
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}
