// translator.rs — 手势增量 → 角度/视场角

use crate::config::{PanConfig, ZoomConfig};
use crate::panorama::OrientationStore;
use glam::Vec2;

#[derive(Debug, Clone, PartialEq)]
pub struct GestureTranslator {
    divide_rotate_x: f32,
    divide_rotate_y: f32,
    expansion_ratio: f32,
    reduction_ratio: f32,
}

impl GestureTranslator {
    pub fn new(pan: &PanConfig, zoom: &ZoomConfig) -> Self {
        Self {
            divide_rotate_x: pan.divide_rotate_x,
            divide_rotate_y: pan.divide_rotate_y,
            expansion_ratio: zoom.expansion_ratio,
            reduction_ratio: zoom.reduction_ratio,
        }
    }

    /// Adds a forwarded pixel delta to the orientation.
    ///
    /// Callers negate the horizontal component before forwarding, so a drag to the
    /// right turns `angle_xz` negative ("drag the world").
    pub fn apply_pan<S: OrientationStore + ?Sized>(&self, store: &mut S, delta: Vec2) {
        let cur = store.orientation();
        store.set_orientation(
            cur.angle_xz + delta.x / self.divide_rotate_x,
            cur.angle_y + delta.y / self.divide_rotate_y,
        );
    }

    /// One zoom step. A shrinking pinch widens the FOV; anything else narrows it,
    /// including a repeated identical scale.
    pub fn apply_zoom<S: OrientationStore + ?Sized>(&self, store: &mut S, scale: f32, previous_scale: f32) {
        let ratio = if scale < previous_scale {
            self.expansion_ratio
        } else {
            self.reduction_ratio
        };
        let fov = store.field_of_view();
        store.set_field_of_view(fov * ratio);
    }
}
