// controller.rs — 手势 → 相机控制核心
//
// 拖动/捏合/触摸序列回调、惯性定时器与视图生命周期都在这里汇合。
// 所有回调都在同一个事件循环线程上调用，不需要锁。

use crate::config::ViewerConfig;
use crate::error::{Result, ViewerError};
use crate::gesture::{GesturePhase, GestureSink, TouchLifecycleSink};
use crate::inertia::{InertiaEngine, InertiaMode, TickOutcome};
use crate::panorama::{CameraOrientation, PanoramaImage, SceneRenderer};
use crate::session::{PanSession, ScaleSession};
use crate::timer::{Clock, SystemClock, TimerHandle};
use crate::translator::GestureTranslator;
use glam::Vec2;
use std::path::PathBuf;
use std::time::Instant;

/// Where the startup placeholder panorama comes from.
#[derive(Debug, Clone)]
pub enum PlaceholderSource {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

impl PlaceholderSource {
    pub fn load(&self) -> Result<PanoramaImage> {
        let bytes = match self {
            PlaceholderSource::Bytes(b) => std::borrow::Cow::Borrowed(b.as_slice()),
            PlaceholderSource::Path(p) => {
                let data = std::fs::read(p).map_err(|source| ViewerError::PlaceholderMissing {
                    path: p.clone(),
                    source,
                })?;
                std::borrow::Cow::Owned(data)
            }
        };
        PanoramaImage::decode(&bytes).map_err(|e| match e {
            ViewerError::Decode(err) => ViewerError::PlaceholderInvalid(err),
            ViewerError::Io(err) => ViewerError::PlaceholderInvalid(image::ImageError::IoError(err)),
            other => other,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPhase {
    Created,
    Visible,
    Hidden,
}

pub struct PanoramaController<R, C = SystemClock> {
    scene: R,
    clock: C,
    translator: GestureTranslator,
    pan: PanSession,
    scale: ScaleSession,
    inertia: InertiaEngine,
    inertia_mode: InertiaMode,
    image: PanoramaImage,
    phase: ViewPhase,
    resources_unloaded: bool,
}

impl<R: SceneRenderer, C: Clock> PanoramaController<R, C> {
    /// Fails when the placeholder cannot be read or decoded: the viewer needs some image.
    pub fn new(mut scene: R, config: &ViewerConfig, placeholder: PlaceholderSource, clock: C) -> Result<Self> {
        config.validate()?;
        let image = placeholder.load()?;

        scene.set_orientation(config.camera.angle_xz, config.camera.angle_y);
        scene.set_field_of_view(config.camera.field_of_view);
        scene.set_image(image.clone());

        log::info!("controller ready, inertia mode {}", config.inertia.mode);
        Ok(Self {
            scene,
            clock,
            translator: GestureTranslator::new(&config.pan, &config.zoom),
            pan: PanSession::new(),
            scale: ScaleSession::default(),
            inertia: InertiaEngine::new(&config.inertia),
            inertia_mode: config.inertia.mode,
            image,
            phase: ViewPhase::Created,
            resources_unloaded: false,
        })
    }

    pub fn scene(&self) -> &R {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut R {
        &mut self.scene
    }

    pub fn orientation(&self) -> CameraOrientation {
        self.scene.orientation()
    }

    pub fn inertia_mode(&self) -> InertiaMode {
        self.inertia_mode
    }

    /// Every assignment cancels a running inertia sequence, even for the same mode.
    pub fn set_inertia_mode(&mut self, mode: InertiaMode) {
        self.inertia.cancel();
        self.inertia_mode = mode;
        log::debug!("inertia mode set to {}", mode);
    }

    pub fn pan_session(&self) -> &PanSession {
        &self.pan
    }

    pub fn inertia(&self) -> &InertiaEngine {
        &self.inertia
    }

    pub fn current_image(&self) -> &PanoramaImage {
        &self.image
    }

    pub fn set_image(&mut self, image: PanoramaImage) {
        self.image = image;
        // 隐藏期间只记下来，appear 时再上传
        if self.phase != ViewPhase::Hidden {
            self.scene.set_image(self.image.clone());
        }
    }

    pub fn set_image_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let image = PanoramaImage::decode(bytes)?;
        self.set_image(image);
        Ok(())
    }

    pub fn phase(&self) -> ViewPhase {
        self.phase
    }

    pub fn appear(&mut self) {
        if self.resources_unloaded {
            self.scene.set_image(self.image.clone());
            self.resources_unloaded = false;
        }
        self.phase = ViewPhase::Visible;
        log::debug!("view appeared");
    }

    pub fn disappear(&mut self) {
        self.inertia.cancel();
        self.pan.reset();
        if !self.resources_unloaded {
            self.scene.unload_resources();
            self.resources_unloaded = true;
        }
        self.phase = ViewPhase::Hidden;
        log::debug!("view disappeared");
    }

    /// Delivers every inertia tick due by `now`. Returns how many were delivered.
    pub fn advance_timers(&mut self, now: Instant) -> usize {
        let mut delivered = 0;
        while let Some(handle) = self.inertia.due(now) {
            self.inertia_tick(handle);
            delivered += 1;
        }
        delivered
    }

    pub fn next_timer_deadline(&self) -> Option<Instant> {
        self.inertia.next_deadline()
    }

    /// Applies one tick. Ticks for a cancelled or replaced timer are ignored.
    pub fn inertia_tick(&mut self, handle: TimerHandle) -> TickOutcome {
        let outcome = self.inertia.tick(handle);
        match outcome {
            TickOutcome::Moved(delta) => self.translator.apply_pan(&mut self.scene, delta),
            TickOutcome::Expired => self.pan.reset(),
            TickOutcome::Stale | TickOutcome::Primed => {}
        }
        outcome
    }
}

impl<R: SceneRenderer, C: Clock> GestureSink for PanoramaController<R, C> {
    fn pan_updated(&mut self, phase: GesturePhase, translation: Vec2) {
        match phase {
            GesturePhase::Began | GesturePhase::Changed => {
                if let Some(delta) = self.pan.sample(translation) {
                    self.translator
                        .apply_pan(&mut self.scene, Vec2::new(-delta.x, delta.y));
                }
            }
            GesturePhase::Ended => {
                if let Some(release_delta) = self.pan.finish() {
                    self.inertia
                        .start(self.inertia_mode, release_delta, self.clock.now());
                }
            }
            GesturePhase::Cancelled => {
                self.pan.finish();
            }
        }
    }

    fn pinch_updated(&mut self, phase: GesturePhase, scale: f32) {
        // 每次回调都缩放一步，只有 Began 重置上一次的比例
        if phase == GesturePhase::Began {
            self.scale.begin();
        }
        let previous = self.scale.advance(scale);
        self.translator.apply_zoom(&mut self.scene, scale, previous);
    }
}

impl<R: SceneRenderer, C: Clock> TouchLifecycleSink for PanoramaController<R, C> {
    fn touch_sequence_began(&mut self) {
        self.inertia.cancel();
        self.pan.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inertia::INERTIA_TICK_LIMIT;
    use crate::panorama::tests::png_bytes;
    use crate::panorama::OrientationStore;
    use crate::session::PanState;
    use crate::timer::tests::ManualClock;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingScene {
        camera: CameraOrientation,
        images: Vec<PanoramaImage>,
        unloads: usize,
    }

    impl OrientationStore for RecordingScene {
        fn orientation(&self) -> CameraOrientation {
            self.camera
        }

        fn set_orientation(&mut self, angle_xz: f32, angle_y: f32) {
            self.camera.set_orientation(angle_xz, angle_y);
        }

        fn field_of_view(&self) -> f32 {
            self.camera.field_of_view
        }

        fn set_field_of_view(&mut self, degrees: f32) {
            self.camera.field_of_view = degrees;
        }
    }

    impl SceneRenderer for RecordingScene {
        fn unload_resources(&mut self) {
            self.unloads += 1;
        }

        fn set_image(&mut self, image: PanoramaImage) {
            self.images.push(image);
        }
    }

    const TICK: Duration = Duration::from_millis(10);

    fn config(mode: InertiaMode) -> ViewerConfig {
        let mut c = ViewerConfig::default();
        c.pan.divide_rotate_x = 500.0;
        c.pan.divide_rotate_y = 400.0;
        c.inertia.mode = mode;
        c.inertia.weak_ratio = 1.0;
        c.inertia.strong_ratio = 2.0;
        c.inertia.tick_interval_ms = 10;
        c
    }

    fn controller(mode: InertiaMode) -> (PanoramaController<RecordingScene, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let c = PanoramaController::new(
            RecordingScene::default(),
            &config(mode),
            PlaceholderSource::Bytes(png_bytes(4, 2)),
            clock.clone(),
        )
        .unwrap();
        (c, clock)
    }

    fn step(c: &mut PanoramaController<RecordingScene, ManualClock>, clock: &ManualClock) -> usize {
        let now = clock.advance(TICK);
        c.advance_timers(now)
    }

    /// 拖动 (0,0) → (10,0)，松手
    fn flick(c: &mut PanoramaController<RecordingScene, ManualClock>) {
        c.touch_sequence_began();
        c.pan_updated(GesturePhase::Began, Vec2::ZERO);
        c.pan_updated(GesturePhase::Changed, Vec2::new(10.0, 0.0));
        c.pan_updated(GesturePhase::Ended, Vec2::new(10.0, 0.0));
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn construction_applies_defaults_and_placeholder() {
        let (c, _) = controller(InertiaMode::None);
        let cam = c.orientation();
        assert_eq!(cam.angle_xz, 0.0);
        assert_eq!(cam.angle_y, 0.0);
        assert_eq!(cam.field_of_view, 60.0);
        assert_eq!(c.scene().images.len(), 1);
        assert_eq!(c.scene().images[0].dimensions(), (4, 2));
        assert_eq!(c.phase(), ViewPhase::Created);
    }

    #[test]
    fn missing_placeholder_fails_loudly() {
        let err = PanoramaController::new(
            RecordingScene::default(),
            &ViewerConfig::default(),
            PlaceholderSource::Path(PathBuf::from("/nonexistent/placeholder.png")),
            ManualClock::new(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ViewerError::PlaceholderMissing { .. }));

        let err = PanoramaController::new(
            RecordingScene::default(),
            &ViewerConfig::default(),
            PlaceholderSource::Bytes(b"not a png".to_vec()),
            ManualClock::new(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ViewerError::PlaceholderInvalid(_)));
    }

    #[test]
    fn pan_two_samples_scenario() {
        let (mut c, _) = controller(InertiaMode::None);
        c.touch_sequence_began();
        c.pan_updated(GesturePhase::Began, Vec2::ZERO);
        c.pan_updated(GesturePhase::Changed, Vec2::new(50.0, 0.0));
        c.pan_updated(GesturePhase::Changed, Vec2::new(100.0, 0.0));

        let cam = c.orientation();
        assert!(close(cam.angle_xz, -0.2));
        assert_eq!(cam.angle_y, 0.0);
    }

    #[test]
    fn pan_accumulates_per_sample() {
        let (mut c, _) = controller(InertiaMode::None);
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(12.0, -4.0),
            Vec2::new(5.0, 30.0),
            Vec2::new(-40.0, 22.0),
        ];
        c.touch_sequence_began();
        c.pan_updated(GesturePhase::Began, points[0]);
        for p in &points[1..] {
            c.pan_updated(GesturePhase::Changed, *p);
        }

        let mut expected = Vec2::ZERO;
        for w in points.windows(2) {
            let d = w[1] - w[0];
            expected += Vec2::new(-d.x / 500.0, d.y / 400.0);
        }
        let cam = c.orientation();
        assert!(close(cam.angle_xz, expected.x));
        assert!(close(cam.angle_y, expected.y));
    }

    #[test]
    fn pinch_scenario() {
        let (mut c, _) = controller(InertiaMode::None);
        c.pinch_updated(GesturePhase::Began, 1.0);
        // 1.0 与初始 1.0 相等 → 缩小分支
        assert!((c.orientation().field_of_view - 57.0).abs() < 1e-4);

        let (mut c, _) = controller(InertiaMode::None);
        c.pinch_updated(GesturePhase::Began, 0.8);
        assert!((c.orientation().field_of_view - 63.0).abs() < 1e-4);
        c.pinch_updated(GesturePhase::Changed, 0.9);
        assert!((c.orientation().field_of_view - 59.85).abs() < 1e-4);

        // 结束回调的比例没有变化 → 再缩小一次
        c.pinch_updated(GesturePhase::Ended, 0.9);
        assert!((c.orientation().field_of_view - 59.85 * 0.95).abs() < 1e-4);
    }

    #[test]
    fn pinch_end_applies_a_zoom_step() {
        let (mut c, _) = controller(InertiaMode::None);
        c.pinch_updated(GesturePhase::Began, 0.8);
        c.pinch_updated(GesturePhase::Ended, 0.8);
        assert!((c.orientation().field_of_view - 60.0 * 1.05 * 0.95).abs() < 1e-4);

        let (mut c, _) = controller(InertiaMode::None);
        c.pinch_updated(GesturePhase::Began, 1.2);
        c.pinch_updated(GesturePhase::Cancelled, 1.1);
        assert!((c.orientation().field_of_view - 60.0 * 0.95 * 1.05).abs() < 1e-4);
    }

    #[test]
    fn pinch_begin_resets_previous_scale() {
        let (mut c, _) = controller(InertiaMode::None);
        c.pinch_updated(GesturePhase::Began, 1.5);
        c.pinch_updated(GesturePhase::Changed, 2.0);
        // 新的捏合从 1.0 重新比较：0.9 < 1.0 → 放大视场角
        let before = c.orientation().field_of_view;
        c.pinch_updated(GesturePhase::Began, 0.9);
        assert!((c.orientation().field_of_view - before * 1.05).abs() < 1e-4);
    }

    #[test]
    fn pinch_does_not_touch_pan_state() {
        let (mut c, _) = controller(InertiaMode::Short);
        c.pinch_updated(GesturePhase::Began, 0.5);
        c.pinch_updated(GesturePhase::Ended, 0.5);
        assert_eq!(c.pan_session().state(), PanState::Idle);
        assert!(!c.inertia().is_running());
        assert_eq!(c.orientation().angle_xz, 0.0);
    }

    #[test]
    fn inertia_short_scenario() {
        let (mut c, clock) = controller(InertiaMode::Short);
        flick(&mut c);
        let after_pan = c.orientation().angle_xz;
        assert!(close(after_pan, -10.0 / 500.0));
        assert!(c.inertia().is_running());

        // tick 0: 只做准备
        assert_eq!(step(&mut c, &clock), 1);
        assert_eq!(c.orientation().angle_xz, after_pan);

        step(&mut c, &clock);
        assert!(close(c.orientation().angle_xz, after_pan - 10.0 / 500.0));

        step(&mut c, &clock);
        assert!(close(c.orientation().angle_xz, after_pan - 15.0 / 500.0));
    }

    #[test]
    fn inertia_total_is_harmonic_and_bounded() {
        let (mut c, clock) = controller(InertiaMode::Short);
        flick(&mut c);
        let start = c.orientation().angle_xz;

        let mut ticks = 0;
        while c.inertia().is_running() {
            ticks += step(&mut c, &clock);
        }
        assert_eq!(ticks as u32, INERTIA_TICK_LIMIT + 2);

        let h150: f32 = (1..=INERTIA_TICK_LIMIT).map(|k| 1.0 / k as f32).sum();
        let moved = c.orientation().angle_xz - start;
        assert!((moved - (-10.0 * 1.0 * h150 / 500.0)).abs() < 1e-4);

        // 自然结束后会话被清空，后续不再有 tick
        assert_eq!(c.pan_session().last_delta(), None);
        assert_eq!(c.inertia().tick_index(), 0);
        let end = c.orientation().angle_xz;
        for _ in 0..5 {
            assert_eq!(step(&mut c, &clock), 0);
        }
        assert_eq!(c.orientation().angle_xz, end);
    }

    #[test]
    fn long_mode_scales_inertia() {
        let (mut c, clock) = controller(InertiaMode::Long);
        flick(&mut c);
        let after_pan = c.orientation().angle_xz;
        step(&mut c, &clock);
        step(&mut c, &clock);
        assert!(close(c.orientation().angle_xz, after_pan - 20.0 / 500.0));
    }

    #[test]
    fn touch_down_cancels_inertia_mid_sequence() {
        let (mut c, clock) = controller(InertiaMode::Short);
        flick(&mut c);
        for _ in 0..6 {
            step(&mut c, &clock);
        }
        assert_eq!(c.inertia().tick_index(), 6);

        c.touch_sequence_began();
        assert_eq!(c.inertia().tick_index(), 0);
        assert_eq!(c.pan_session().state(), PanState::Idle);
        assert_eq!(c.pan_session().last_delta(), None);

        let frozen = c.orientation();
        for _ in 0..20 {
            assert_eq!(step(&mut c, &clock), 0);
        }
        assert_eq!(c.orientation(), frozen);
    }

    #[test]
    fn stale_tick_after_cancel_is_ignored() {
        let (mut c, _) = controller(InertiaMode::Short);
        flick(&mut c);
        let handle = c.inertia().handle().unwrap();
        c.touch_sequence_began();
        let frozen = c.orientation();
        assert_eq!(c.inertia_tick(handle), TickOutcome::Stale);
        assert_eq!(c.orientation(), frozen);
    }

    #[test]
    fn mode_switch_cancels_without_blending() {
        let (mut c, clock) = controller(InertiaMode::Short);
        flick(&mut c);
        step(&mut c, &clock);
        step(&mut c, &clock);
        assert_eq!(c.inertia().strength_ratio(), Some(1.0));

        c.set_inertia_mode(InertiaMode::Long);
        assert!(!c.inertia().is_running());
        assert_eq!(c.inertia().tick_index(), 0);
        assert_eq!(c.inertia().strength_ratio(), None);

        let frozen = c.orientation();
        for _ in 0..10 {
            step(&mut c, &clock);
        }
        assert_eq!(c.orientation(), frozen);
    }

    #[test]
    fn second_release_replaces_running_sequence() {
        let (mut c, clock) = controller(InertiaMode::Short);
        flick(&mut c);
        let first = c.inertia().handle().unwrap();
        step(&mut c, &clock);
        step(&mut c, &clock);

        // 没有触摸按下事件，直接开始并结束另一次拖动
        c.pan_updated(GesturePhase::Began, Vec2::ZERO);
        c.pan_updated(GesturePhase::Changed, Vec2::new(0.0, 8.0));
        c.pan_updated(GesturePhase::Ended, Vec2::new(0.0, 8.0));

        let second = c.inertia().handle().unwrap();
        assert_ne!(first, second);
        assert_eq!(c.inertia().tick_index(), 0);
        assert_eq!(c.inertia_tick(first), TickOutcome::Stale);
    }

    #[test]
    fn release_without_movement_does_not_start_inertia() {
        let (mut c, _) = controller(InertiaMode::Long);
        c.touch_sequence_began();
        c.pan_updated(GesturePhase::Began, Vec2::new(3.0, 3.0));
        c.pan_updated(GesturePhase::Ended, Vec2::new(3.0, 3.0));
        assert!(!c.inertia().is_running());
    }

    #[test]
    fn end_without_begin_is_noop() {
        let (mut c, _) = controller(InertiaMode::Short);
        c.pan_updated(GesturePhase::Ended, Vec2::new(30.0, 0.0));
        assert!(!c.inertia().is_running());
        assert_eq!(c.orientation().angle_xz, 0.0);
    }

    #[test]
    fn cancelled_pan_has_no_inertia() {
        let (mut c, _) = controller(InertiaMode::Short);
        c.touch_sequence_began();
        c.pan_updated(GesturePhase::Began, Vec2::ZERO);
        c.pan_updated(GesturePhase::Changed, Vec2::new(25.0, 0.0));
        c.pan_updated(GesturePhase::Cancelled, Vec2::new(25.0, 0.0));
        assert_eq!(c.pan_session().state(), PanState::Idle);
        assert!(!c.inertia().is_running());
    }

    #[test]
    fn mode_none_has_no_inertia() {
        let (mut c, clock) = controller(InertiaMode::None);
        flick(&mut c);
        assert!(!c.inertia().is_running());
        assert_eq!(step(&mut c, &clock), 0);
    }

    #[test]
    fn next_deadline_tracks_timer() {
        let (mut c, clock) = controller(InertiaMode::Short);
        assert_eq!(c.next_timer_deadline(), None);
        let released_at = clock.now();
        flick(&mut c);
        assert_eq!(c.next_timer_deadline(), Some(released_at + TICK));
    }

    #[test]
    fn lifecycle_unloads_and_restores_image() {
        let (mut c, _) = controller(InertiaMode::Short);
        c.appear();
        assert_eq!(c.phase(), ViewPhase::Visible);
        assert_eq!(c.scene().images.len(), 1);

        flick(&mut c);
        c.disappear();
        assert_eq!(c.phase(), ViewPhase::Hidden);
        assert_eq!(c.scene().unloads, 1);
        assert!(!c.inertia().is_running());

        // 隐藏期间换图只记录，不上传
        c.set_image_bytes(&png_bytes(8, 4)).unwrap();
        assert_eq!(c.scene().images.len(), 1);

        c.appear();
        assert_eq!(c.scene().images.len(), 2);
        assert!(c.scene().images[1].same_pixels(c.current_image()));
        assert_eq!(c.current_image().dimensions(), (8, 4));
    }

    #[test]
    fn set_image_while_visible_uploads_immediately() {
        let (mut c, _) = controller(InertiaMode::None);
        c.appear();
        c.set_image(PanoramaImage::from_rgba(image::RgbaImage::new(2, 1)));
        assert_eq!(c.scene().images.len(), 2);
        assert!(c.set_image_bytes(b"garbage").is_err());
        assert_eq!(c.scene().images.len(), 2);
    }
}
