// touch.rs — 原始触摸点 → 拖动/捏合手势
//
// 单指移动 = 拖动；第二根手指按下时取消拖动并开始捏合；
// 鼠标左键按作一根手指处理，滚轮按作一次捏合。

use crate::gesture::{GesturePhase, GestureSink, TouchLifecycleSink};
use glam::Vec2;

/// Touch id used for the emulated left-mouse finger.
pub const MOUSE_TOUCH_ID: u64 = u64::MAX;

const WHEEL_PINCH_STEP: f32 = 0.1;
const MIN_PINCH_DISTANCE: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawPhase {
    Down,
    Move,
    Up,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawTouch {
    pub id: u64,
    pub phase: RawPhase,
    pub position: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Recognized {
    Nothing,
    Pan { origin: Vec2, last: Option<Vec2> },
    Pinch { initial_distance: f32, last_scale: f32 },
    // 本次触摸序列内不再识别任何手势
    Blocked,
}

#[derive(Debug)]
pub struct TouchTracker {
    touches: Vec<(u64, Vec2)>,
    recognized: Recognized,
}

impl Default for TouchTracker {
    fn default() -> Self {
        Self {
            touches: Vec::new(),
            recognized: Recognized::Nothing,
        }
    }
}

impl TouchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_touches(&self) -> usize {
        self.touches.len()
    }

    pub fn handle<S>(&mut self, touch: RawTouch, sink: &mut S)
    where
        S: GestureSink + TouchLifecycleSink,
    {
        match touch.phase {
            RawPhase::Down => self.touch_down(touch.id, touch.position, sink),
            RawPhase::Move => self.touch_moved(touch.id, touch.position, sink),
            RawPhase::Up => self.touch_lifted(touch.id, GesturePhase::Ended, sink),
            RawPhase::Cancel => self.touch_lifted(touch.id, GesturePhase::Cancelled, sink),
        }
    }

    /// One wheel notch becomes a single pinch step: positive `lines` zooms in.
    ///
    /// Only `Began` is sent, since every pinch callback applies a zoom step.
    pub fn wheel<S: GestureSink>(&mut self, lines: f32, sink: &mut S) {
        if lines == 0.0 || !self.touches.is_empty() {
            return;
        }
        let scale = (1.0 + lines * WHEEL_PINCH_STEP).max(0.1);
        sink.pinch_updated(GesturePhase::Began, scale);
    }

    fn touch_down<S>(&mut self, id: u64, position: Vec2, sink: &mut S)
    where
        S: GestureSink + TouchLifecycleSink,
    {
        if let Some(entry) = self.touches.iter_mut().find(|(tid, _)| *tid == id) {
            entry.1 = position;
            return;
        }
        self.touches.push((id, position));

        match self.touches.len() {
            1 => {
                sink.touch_sequence_began();
                self.recognized = Recognized::Pan {
                    origin: position,
                    last: None,
                };
            }
            2 => {
                if let Recognized::Pan { last: Some(last), .. } = self.recognized {
                    sink.pan_updated(GesturePhase::Cancelled, last);
                }
                let distance = self.touches[0].1.distance(self.touches[1].1);
                if distance >= MIN_PINCH_DISTANCE {
                    self.recognized = Recognized::Pinch {
                        initial_distance: distance,
                        last_scale: 1.0,
                    };
                    sink.pinch_updated(GesturePhase::Began, 1.0);
                } else {
                    self.recognized = Recognized::Blocked;
                }
            }
            _ => {
                if let Recognized::Pinch { last_scale, .. } = self.recognized {
                    sink.pinch_updated(GesturePhase::Cancelled, last_scale);
                }
                self.recognized = Recognized::Blocked;
            }
        }
    }

    fn touch_moved<S: GestureSink>(&mut self, id: u64, position: Vec2, sink: &mut S) {
        let Some(entry) = self.touches.iter_mut().find(|(tid, _)| *tid == id) else {
            return;
        };
        entry.1 = position;

        match &mut self.recognized {
            Recognized::Pan { origin, last } if self.touches.len() == 1 => {
                let translation = position - *origin;
                let phase = if last.is_some() {
                    GesturePhase::Changed
                } else {
                    GesturePhase::Began
                };
                *last = Some(translation);
                sink.pan_updated(phase, translation);
            }
            Recognized::Pinch {
                initial_distance,
                last_scale,
            } if self.touches.len() == 2 => {
                let scale = self.touches[0].1.distance(self.touches[1].1) / *initial_distance;
                *last_scale = scale;
                sink.pinch_updated(GesturePhase::Changed, scale);
            }
            _ => {}
        }
    }

    fn touch_lifted<S: GestureSink>(&mut self, id: u64, phase: GesturePhase, sink: &mut S) {
        let Some(index) = self.touches.iter().position(|(tid, _)| *tid == id) else {
            return;
        };
        self.touches.remove(index);

        match self.recognized {
            Recognized::Pan { last: Some(last), .. } => {
                sink.pan_updated(phase, last);
                self.recognized = Recognized::Blocked;
            }
            Recognized::Pinch { last_scale, .. } => {
                sink.pinch_updated(phase, last_scale);
                self.recognized = Recognized::Blocked;
            }
            _ => {}
        }

        if self.touches.is_empty() {
            self.recognized = Recognized::Nothing;
        }
    }
}
