// session.rs — 拖动会话状态机与捏合缩放会话

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanState {
    Idle,
    Active,
}

/// Idle → Active → Idle. Keeps the last frame-to-frame delta for inertia.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanSession {
    active: bool,
    last_point: Option<Vec2>,
    last_delta: Option<Vec2>,
}

impl PanSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one pan sample and returns the raw delta since the previous sample.
    ///
    /// The first sample of a session only establishes the reference point.
    pub fn sample(&mut self, point: Vec2) -> Option<Vec2> {
        match (self.active, self.last_point) {
            (true, Some(last)) => {
                let delta = point - last;
                self.last_delta = Some(delta);
                self.last_point = Some(point);
                Some(delta)
            }
            _ => {
                self.active = true;
                self.last_point = Some(point);
                self.last_delta = None;
                None
            }
        }
    }

    /// Active → Idle. Returns `None` when no pan was active, otherwise the cached
    /// delta (which stays available for inertia).
    pub fn finish(&mut self) -> Option<Option<Vec2>> {
        if !self.active {
            return None;
        }
        self.active = false;
        self.last_point = None;
        Some(self.last_delta)
    }

    /// 强制回到 Idle 并丢弃缓存的增量
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn state(&self) -> PanState {
        if self.active {
            PanState::Active
        } else {
            PanState::Idle
        }
    }

    pub fn last_point(&self) -> Option<Vec2> {
        self.last_point
    }

    pub fn last_delta(&self) -> Option<Vec2> {
        self.last_delta
    }
}

/// Previous pinch scale, used only to tell zoom-in from zoom-out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleSession {
    previous_scale: f32,
}

impl Default for ScaleSession {
    fn default() -> Self {
        Self { previous_scale: 1.0 }
    }
}

impl ScaleSession {
    pub fn begin(&mut self) {
        self.previous_scale = 1.0;
    }

    /// Stores `scale` and returns the value it replaces.
    pub fn advance(&mut self, scale: f32) -> f32 {
        std::mem::replace(&mut self.previous_scale, scale)
    }

    pub fn previous_scale(&self) -> f32 {
        self.previous_scale
    }
}
