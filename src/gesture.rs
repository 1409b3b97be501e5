// gesture.rs — 手势回调接口

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Began,
    Changed,
    Ended,
    /// 被系统或另一手势打断：不触发惯性
    Cancelled,
}

/// Receives recognized pan/pinch updates.
pub trait GestureSink {
    /// `translation` is cumulative since the pan began, in pixels.
    fn pan_updated(&mut self, phase: GesturePhase, translation: Vec2);

    /// `scale` is the finger-distance ratio relative to the pinch start.
    fn pinch_updated(&mut self, phase: GesturePhase, scale: f32);
}

/// Receives raw touch-sequence boundaries, independent of gesture recognition.
pub trait TouchLifecycleSink {
    fn touch_sequence_began(&mut self);
}
