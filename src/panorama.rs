// panorama.rs — 视角参数、全景图与渲染协作者接口

use crate::error::Result;
use image::{GenericImageView, RgbaImage};
use std::path::Path;
use std::sync::Arc;

/// Camera orientation read by the renderer once per frame.
///
/// Angles are radians, `field_of_view` is degrees (vertical).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraOrientation {
    pub angle_xz: f32,
    pub angle_y: f32,
    pub field_of_view: f32,
}

impl Default for CameraOrientation {
    fn default() -> Self {
        Self {
            angle_xz: 0.0,
            angle_y: 0.0,
            field_of_view: 60.0,
        }
    }
}

/// Angle/FOV store. Implementors apply whatever clamping their projection needs.
pub trait OrientationStore {
    fn orientation(&self) -> CameraOrientation;
    fn set_orientation(&mut self, angle_xz: f32, angle_y: f32);
    fn field_of_view(&self) -> f32;
    fn set_field_of_view(&mut self, degrees: f32);
}

// 不做夹取的纯数值存储
impl OrientationStore for CameraOrientation {
    fn orientation(&self) -> CameraOrientation {
        *self
    }

    fn set_orientation(&mut self, angle_xz: f32, angle_y: f32) {
        self.angle_xz = angle_xz;
        self.angle_y = angle_y;
    }

    fn field_of_view(&self) -> f32 {
        self.field_of_view
    }

    fn set_field_of_view(&mut self, degrees: f32) {
        self.field_of_view = degrees;
    }
}

/// The rendering side the controller drives: orientation plus texture lifetime.
pub trait SceneRenderer: OrientationStore {
    /// Release GPU textures; called when the view disappears.
    fn unload_resources(&mut self);

    fn set_image(&mut self, image: PanoramaImage);
}

/// Decoded equirectangular image. Cloning shares the pixel buffer.
#[derive(Debug, Clone)]
pub struct PanoramaImage {
    pixels: Arc<RgbaImage>,
}

impl PanoramaImage {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = image::io::Reader::new(std::io::Cursor::new(bytes)).with_guessed_format()?;
        // 全景图经常超过默认的解码尺寸限制
        reader.no_limits();
        let img = reader.decode()?;
        let (w, h) = img.dimensions();
        log::info!("decoded panorama {}x{}", w, h);
        Ok(Self::from_rgba(img.to_rgba8()))
    }

    /// Reads and decodes a panorama file.
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::decode(&bytes)
    }

    pub fn from_rgba(rgba: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(rgba),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn rgba(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn same_pixels(&self, other: &PanoramaImage) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}
