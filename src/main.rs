// main.rs — 窗口、事件循环与状态栏；触摸/鼠标输入交给控制核心

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // Release 模式下隐藏控制台窗口

use anyhow::Context;
use glam::Vec2;
use panorama_touch::config::LaunchOptions;
use panorama_touch::renderer::Renderer;
use panorama_touch::timer::SystemClock;
use panorama_touch::touch::{RawPhase, RawTouch, TouchTracker, MOUSE_TOUCH_ID};
use panorama_touch::{CameraOrientation, InertiaMode, PanoramaController, PanoramaImage, PlaceholderSource};

// 后台加载结果：失败也要回传，好让主线程清掉加载状态
type LoadResult = panorama_touch::Result<PanoramaImage>;

use winit::{
    dpi::LogicalSize,
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{Fullscreen, WindowBuilder},
};

use std::path::PathBuf;
use std::sync::mpsc::{channel, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

static BUILTIN_PLACEHOLDER: &[u8] = include_bytes!("../assets/placeholder.png");

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let opts = LaunchOptions::parse(std::env::args().skip(1))?.with_env_fallback()?;
    let config = opts.resolve_config().context("failed to load viewer config")?;

    let placeholder = match &config.placeholder {
        Some(path) => PlaceholderSource::Path(path.clone()),
        None => PlaceholderSource::Bytes(BUILTIN_PLACEHOLDER.to_vec()),
    };

    let event_loop = EventLoop::new();
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Panorama Viewer")
            .with_inner_size(LogicalSize::new(1280, 720))
            .build(&event_loop)
            .context("failed to create window")?,
    );

    let renderer = pollster::block_on(Renderer::new(window.clone(), &config.camera))
        .context("failed to initialise renderer")?;
    let mut controller = PanoramaController::new(renderer, &config, placeholder, SystemClock)
        .context("failed to load placeholder panorama")?;
    controller.appear();

    let mut tracker = TouchTracker::new();
    let mut mouse_down = false;
    let mut cursor = Vec2::ZERO;
    let mut is_fullscreen = false;

    // FPS 计算
    let mut last_fps_time = Instant::now();
    let mut frame_count = 0u32;
    let mut fps = 0.0f32;

    // 异步加载通道
    let (tx, rx) = channel::<LoadResult>();
    let mut is_loading = false;
    let mut load_error: Option<String> = None;
    if let Some(path) = opts.image.clone() {
        is_loading = true;
        start_load_image(path, tx.clone());
    }

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        if let Ok(loaded) = rx.try_recv() {
            is_loading = false;
            match loaded {
                Ok(image) => {
                    controller.set_image(image);
                    load_error = None;
                }
                Err(e) => load_error = Some(e.to_string()),
            }
        }

        match event {
            Event::WindowEvent { event, .. } => {
                if controller.scene_mut().on_window_event(&event) {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        controller.disappear();
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => {
                        controller.scene_mut().resize(new_size);
                    }

                    WindowEvent::Occluded(hidden) => {
                        if hidden {
                            controller.disappear();
                        } else {
                            controller.appear();
                        }
                    }

                    WindowEvent::KeyboardInput { input, .. } if input.state == ElementState::Pressed => {
                        match input.virtual_keycode {
                            Some(VirtualKeyCode::O) => {
                                if let Some(path) = pick_image_file() {
                                    is_loading = true;
                                    start_load_image(path, tx.clone());
                                }
                            }
                            Some(VirtualKeyCode::F11) => {
                                is_fullscreen = !is_fullscreen;
                                window.set_fullscreen(is_fullscreen.then(|| Fullscreen::Borderless(None)));
                            }
                            _ => {}
                        }
                    }

                    // 触摸
                    WindowEvent::Touch(touch) => {
                        let phase = match touch.phase {
                            TouchPhase::Started => RawPhase::Down,
                            TouchPhase::Moved => RawPhase::Move,
                            TouchPhase::Ended => RawPhase::Up,
                            TouchPhase::Cancelled => RawPhase::Cancel,
                        };
                        let raw = RawTouch {
                            id: touch.id,
                            phase,
                            position: Vec2::new(touch.location.x as f32, touch.location.y as f32),
                        };
                        tracker.handle(raw, &mut controller);
                    }

                    // 鼠标左键模拟单指
                    WindowEvent::MouseInput {
                        state,
                        button: MouseButton::Left,
                        ..
                    } => {
                        let pressed = state == ElementState::Pressed;
                        if pressed != mouse_down {
                            mouse_down = pressed;
                            let phase = if pressed { RawPhase::Down } else { RawPhase::Up };
                            tracker.handle(
                                RawTouch {
                                    id: MOUSE_TOUCH_ID,
                                    phase,
                                    position: cursor,
                                },
                                &mut controller,
                            );
                        }
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        cursor = Vec2::new(position.x as f32, position.y as f32);
                        if mouse_down {
                            tracker.handle(
                                RawTouch {
                                    id: MOUSE_TOUCH_ID,
                                    phase: RawPhase::Move,
                                    position: cursor,
                                },
                                &mut controller,
                            );
                        }
                    }

                    WindowEvent::MouseWheel { delta, .. } => {
                        let lines = match delta {
                            MouseScrollDelta::LineDelta(_, y) => y,
                            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 20.0,
                        };
                        tracker.wheel(lines, &mut controller);
                    }

                    WindowEvent::DroppedFile(path) => {
                        is_loading = true;
                        start_load_image(path, tx.clone());
                    }

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                frame_count += 1;
                let now = Instant::now();
                let elapsed = now.duration_since(last_fps_time).as_secs_f32();
                if elapsed >= 1.0 {
                    fps = frame_count as f32 / elapsed;
                    frame_count = 0;
                    last_fps_time = now;
                }

                let orientation = controller.orientation();
                let mut mode = controller.inertia_mode();
                let mut open_requested = false;

                let result = controller.scene_mut().render_with_ui(&window, |ctx| {
                    draw_status_bar(
                        ctx,
                        &orientation,
                        &mut mode,
                        &mut open_requested,
                        is_loading,
                        load_error.as_deref(),
                        fps,
                    );
                });

                if mode != controller.inertia_mode() {
                    controller.set_inertia_mode(mode);
                }
                if open_requested {
                    if let Some(path) = pick_image_file() {
                        is_loading = true;
                        start_load_image(path, tx.clone());
                    }
                }

                match result {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        let size = controller.scene().size;
                        controller.scene_mut().resize(size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("gpu out of memory, exiting");
                        *control_flow = ControlFlow::Exit;
                    }
                    Err(e) => log::warn!("render error: {:?}", e),
                }
            }

            Event::MainEventsCleared => {
                // 惯性 tick 与手势回调在同一线程上依次处理
                controller.advance_timers(Instant::now());
                window.request_redraw();
            }

            _ => {}
        }
    });
}

fn pick_image_file() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter("Images", IMAGE_EXTENSIONS)
        .pick_file()
}

fn start_load_image(path: PathBuf, tx: Sender<LoadResult>) {
    thread::spawn(move || {
        log::info!("loading {:?} in background", path);

        let loaded = PanoramaImage::open(&path);
        if let Err(e) = &loaded {
            log::error!("failed to load {:?}: {}", path, e);
        }
        if tx.send(loaded).is_err() {
            log::error!("event loop is gone, dropping {:?}", path);
        }
    });
}

fn draw_status_bar(
    ctx: &egui::Context,
    orientation: &CameraOrientation,
    mode: &mut InertiaMode,
    open_requested: &mut bool,
    is_loading: bool,
    load_error: Option<&str>,
    fps: f32,
) {
    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if ui.button("Open…").clicked() {
                *open_requested = true;
            }
            ui.label("|");

            if is_loading {
                ui.label(egui::RichText::new("Loading image…").color(egui::Color32::YELLOW));
                ui.label("|");
            } else if let Some(err) = load_error {
                ui.label(egui::RichText::new(format!("Load failed: {err}")).color(egui::Color32::RED));
                ui.label("|");
            }

            ui.label("Inertia:");
            for candidate in InertiaMode::ALL {
                ui.radio_value(&mut *mode, candidate, candidate.to_string());
            }
            ui.label("|");

            ui.label(format!("FOV: {:.1}°", orientation.field_of_view));
            ui.label("|");
            ui.label(format!("Yaw: {:.1}°", orientation.angle_xz.to_degrees()));
            ui.label("|");
            ui.label(format!("Pitch: {:.1}°", orientation.angle_y.to_degrees()));
            ui.label("|");
            ui.label(egui::RichText::new(format!("FPS: {:.1}", fps)).color(egui::Color32::GREEN));
        });
    });
}
