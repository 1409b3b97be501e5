// renderer.rs — 核心渲染器 (Ray Casting / Fullscreen Triangle) + egui 状态栏

use crate::config::CameraConfig;
use crate::error::{Result, ViewerError};
use crate::panorama::{CameraOrientation, OrientationStore, PanoramaImage, SceneRenderer};
use image::{Rgba, RgbaImage};
use std::borrow::Cow;
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::event::WindowEvent;
use winit::window::Window;

// 俯仰角到达 ±90° 时视线与 Y 轴重合，偏航失去意义
const MAX_PITCH_DEG: f32 = 89.9;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraUniform {
    aspect: f32,
    fov_rad: f32,
    yaw: f32,
    pitch: f32,
}

impl CameraUniform {
    fn from_camera(camera: &CameraOrientation, aspect: f32) -> Self {
        Self {
            aspect,
            fov_rad: camera.field_of_view.to_radians(),
            yaw: camera.angle_xz,
            pitch: camera.angle_y,
        }
    }
}

/// Scales an image down to the GPU texture limit and pads it to 2:1.
///
/// Images shorter than 2:1 get black rows on top, so the lower part of the
/// sphere holds the picture.
pub fn fit_to_equirect(img: &RgbaImage, max_dimension: u32) -> Cow<'_, RgbaImage> {
    let (src_w, src_h) = img.dimensions();

    let mut fitted = Cow::Borrowed(img);
    if src_w > max_dimension || src_h > max_dimension {
        let scale = (max_dimension as f32 / src_w.max(src_h) as f32).min(1.0);
        let new_w = ((src_w as f32 * scale) as u32).max(1);
        let new_h = ((src_h as f32 * scale) as u32).max(1);
        log::warn!(
            "panorama {}x{} exceeds gpu limit {}, scaling to {}x{}",
            src_w,
            src_h,
            max_dimension,
            new_w,
            new_h
        );
        fitted = Cow::Owned(image::imageops::resize(
            img,
            new_w,
            new_h,
            image::imageops::FilterType::Lanczos3,
        ));
    }

    let (w, h) = fitted.dimensions();
    let target_h = w / 2;
    if target_h > 0 && h < target_h {
        let mut canvas = RgbaImage::from_pixel(w, target_h, Rgba([0, 0, 0, 255]));
        // 原样覆盖（不做 alpha 混合），超出部分由 replace 裁掉
        image::imageops::replace(&mut canvas, &*fitted, 0, i64::from(target_h - h));
        fitted = Cow::Owned(canvas);
    }
    fitted
}

pub struct Renderer {
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,
    pipeline: wgpu::RenderPipeline,

    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    panorama_texture: wgpu::Texture,
    sampler: wgpu::Sampler,
    camera_buffer: wgpu::Buffer,

    camera: CameraOrientation,
    min_fov: f32,
    max_fov: f32,
    texture_loaded: bool,

    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, camera_config: &CameraConfig) -> Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // window 由 Arc 持有，生命周期长于 surface
        let surface = unsafe { instance.create_surface(window.as_ref()) }
            .map_err(|e| ViewerError::Gpu(e.to_string()))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| ViewerError::Gpu("no compatible adapter".into()))?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    features: wgpu::Features::empty(),
                    limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    label: None,
                },
                None,
            )
            .await
            .map_err(|e| ViewerError::Gpu(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| ViewerError::Gpu("surface reports no formats".into()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let camera = CameraOrientation {
            angle_xz: camera_config.angle_xz,
            angle_y: camera_config.angle_y,
            field_of_view: camera_config.field_of_view,
        };
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera_buffer"),
            contents: bytemuck::cast_slice(&[CameraUniform::from_camera(&camera, aspect_of(size))]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::Repeat, // 水平方向首尾相接
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("panorama_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let blank = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]));
        let panorama_texture = upload_texture(&device, &queue, &blank);
        let bind_group =
            create_bind_group(&device, &bind_group_layout, &camera_buffer, &panorama_texture, &sampler);

        let shader = device.create_shader_module(wgpu::include_wgsl!("shader_equirect.wgsl"));
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("panorama_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("panorama_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[], // 顶点由 shader 自生成
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let egui_ctx = egui::Context::default();
        let mut egui_state = egui_winit::State::new(window.as_ref());
        // 高 DPI 显示器
        egui_state.set_pixels_per_point(window.scale_factor() as f32);
        let egui_renderer = egui_wgpu::Renderer::new(&device, config.format, None, 1);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            pipeline,
            bind_group_layout,
            bind_group,
            panorama_texture,
            sampler,
            camera_buffer,
            camera,
            min_fov: camera_config.min_fov,
            max_fov: camera_config.max_fov,
            texture_loaded: false,
            egui_ctx,
            egui_state,
            egui_renderer,
        })
    }

    /// Forwards a window event to egui. Returns true when egui consumed it.
    pub fn on_window_event(&mut self, event: &WindowEvent) -> bool {
        self.egui_state.on_event(&self.egui_ctx, event).consumed
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    fn install_texture(&mut self, img: &RgbaImage) {
        self.panorama_texture = upload_texture(&self.device, &self.queue, img);
        self.bind_group = create_bind_group(
            &self.device,
            &self.bind_group_layout,
            &self.camera_buffer,
            &self.panorama_texture,
            &self.sampler,
        );
    }

    fn write_camera(&self) {
        let uniform = CameraUniform::from_camera(&self.camera, aspect_of(self.size));
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    pub fn render_with_ui(
        &mut self,
        window: &Window,
        run_ui: impl FnOnce(&egui::Context),
    ) -> std::result::Result<(), wgpu::SurfaceError> {
        // 每帧读取一次相机参数
        self.write_camera();

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("panorama_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        let raw_input = self.egui_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, run_ui);
        self.egui_state
            .handle_platform_output(window, &self.egui_ctx, full_output.platform_output);
        let primitives = self.egui_ctx.tessellate(full_output.shapes);
        let screen = egui_wgpu::renderer::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        for (id, delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, delta);
        }
        self.egui_renderer
            .update_buffers(&self.device, &self.queue, &mut encoder, &primitives, &screen);
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });
            self.egui_renderer.render(&mut pass, &primitives, &screen);
        }
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

impl OrientationStore for Renderer {
    fn orientation(&self) -> CameraOrientation {
        self.camera
    }

    fn set_orientation(&mut self, angle_xz: f32, angle_y: f32) {
        let max_pitch = MAX_PITCH_DEG.to_radians();
        self.camera.angle_xz = angle_xz;
        self.camera.angle_y = angle_y.clamp(-max_pitch, max_pitch);
    }

    fn field_of_view(&self) -> f32 {
        self.camera.field_of_view
    }

    fn set_field_of_view(&mut self, degrees: f32) {
        self.camera.field_of_view = degrees.clamp(self.min_fov, self.max_fov);
    }
}

impl SceneRenderer for Renderer {
    fn unload_resources(&mut self) {
        if self.texture_loaded {
            let blank = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]));
            self.install_texture(&blank);
            self.texture_loaded = false;
            log::info!("panorama texture released");
        }
    }

    fn set_image(&mut self, image: PanoramaImage) {
        let max_dimension = self.device.limits().max_texture_dimension_2d;
        let fitted = fit_to_equirect(image.rgba(), max_dimension);
        let (w, h) = fitted.dimensions();
        self.install_texture(&fitted);
        self.texture_loaded = true;
        log::info!("panorama texture uploaded ({}x{})", w, h);
    }
}

fn aspect_of(size: winit::dpi::PhysicalSize<u32>) -> f32 {
    if size.height == 0 {
        1.0
    } else {
        size.width as f32 / size.height as f32
    }
}

fn upload_texture(device: &wgpu::Device, queue: &wgpu::Queue, img: &RgbaImage) -> wgpu::Texture {
    let (width, height) = img.dimensions();
    let extent = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("panorama_texture"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        img.as_raw(),
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        extent,
    );
    texture
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    camera_buffer: &wgpu::Buffer,
    texture: &wgpu::Texture,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("panorama_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}
