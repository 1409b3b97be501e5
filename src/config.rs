// config.rs — 运行时配置
//
// 配置来源（按优先级）：
// - CLI: --config <path> / --inertia <none|short|long>
// - Env: PANORAMA_CONFIG / PANORAMA_INERTIA
// - 默认值

use crate::error::{Result, ViewerError};
use crate::inertia::InertiaMode;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PanConfig {
    /// Pixels of horizontal drag per radian of `angle_xz`.
    pub divide_rotate_x: f32,
    /// Pixels of vertical drag per radian of `angle_y`.
    pub divide_rotate_y: f32,
}

impl Default for PanConfig {
    fn default() -> Self {
        Self {
            divide_rotate_x: 500.0,
            divide_rotate_y: 500.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub expansion_ratio: f32,
    pub reduction_ratio: f32,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            expansion_ratio: 1.05,
            reduction_ratio: 0.95,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InertiaConfig {
    pub mode: InertiaMode,
    pub weak_ratio: f32,
    pub strong_ratio: f32,
    pub tick_interval_ms: u64,
}

impl Default for InertiaConfig {
    fn default() -> Self {
        Self {
            mode: InertiaMode::None,
            weak_ratio: 1.0,
            strong_ratio: 2.0,
            tick_interval_ms: 10,
        }
    }
}

impl InertiaConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub angle_xz: f32,
    pub angle_y: f32,
    pub field_of_view: f32,
    pub min_fov: f32,
    pub max_fov: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            angle_xz: 0.0,
            angle_y: 0.0,
            field_of_view: 60.0,
            min_fov: 5.0,
            max_fov: 120.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub pan: PanConfig,
    pub zoom: ZoomConfig,
    pub inertia: InertiaConfig,
    pub camera: CameraConfig,
    /// 占位图路径；为空时使用内置图片
    pub placeholder: Option<PathBuf>,
}

impl ViewerConfig {
    pub fn from_json(text: &str, origin: &Path) -> Result<Self> {
        let config: ViewerConfig =
            serde_json::from_str(text).map_err(|source| ViewerError::ConfigParse {
                path: origin.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text, path)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pan.divide_rotate_x <= 0.0 || self.pan.divide_rotate_y <= 0.0 {
            return Err(ViewerError::Config("pan divisors must be positive".into()));
        }
        if self.zoom.expansion_ratio <= 1.0 {
            return Err(ViewerError::Config("zoom.expansion_ratio must be > 1".into()));
        }
        if !(self.zoom.reduction_ratio > 0.0 && self.zoom.reduction_ratio < 1.0) {
            return Err(ViewerError::Config("zoom.reduction_ratio must be in (0, 1)".into()));
        }
        if self.inertia.tick_interval_ms == 0 {
            return Err(ViewerError::Config("inertia.tick_interval_ms must be > 0".into()));
        }
        if self.camera.min_fov <= 0.0 || self.camera.min_fov > self.camera.max_fov {
            return Err(ViewerError::Config(format!(
                "invalid fov range {}..{}",
                self.camera.min_fov, self.camera.max_fov
            )));
        }
        Ok(())
    }
}

/// Command line options understood by the viewer binary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaunchOptions {
    pub config_path: Option<PathBuf>,
    pub inertia: Option<InertiaMode>,
    pub image: Option<PathBuf>,
}

impl LaunchOptions {
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut opts = LaunchOptions::default();
        let mut it = args.into_iter();
        while let Some(a) = it.next() {
            match a.as_str() {
                "--config" => {
                    let v = it
                        .next()
                        .ok_or_else(|| ViewerError::Config("--config needs a path".into()))?;
                    opts.config_path = Some(PathBuf::from(v));
                }
                "--inertia" => {
                    let v = it
                        .next()
                        .ok_or_else(|| ViewerError::Config("--inertia needs a mode".into()))?;
                    opts.inertia = Some(v.parse()?);
                }
                _ if a.starts_with("--") => {
                    log::warn!("ignoring unknown option {}", a);
                }
                _ => opts.image = Some(PathBuf::from(a)),
            }
        }
        Ok(opts)
    }

    /// CLI 优先，其次环境变量
    pub fn with_env_fallback(mut self) -> Result<Self> {
        if self.config_path.is_none() {
            if let Ok(v) = std::env::var("PANORAMA_CONFIG") {
                if !v.trim().is_empty() {
                    self.config_path = Some(PathBuf::from(v));
                }
            }
        }
        if self.inertia.is_none() {
            if let Ok(v) = std::env::var("PANORAMA_INERTIA") {
                if !v.trim().is_empty() {
                    self.inertia = Some(v.trim().parse()?);
                }
            }
        }
        Ok(self)
    }

    pub fn resolve_config(&self) -> Result<ViewerConfig> {
        let mut config = match &self.config_path {
            Some(p) => {
                log::info!("loading config from {:?}", p);
                ViewerConfig::load(p)?
            }
            None => ViewerConfig::default(),
        };
        if let Some(mode) = self.inertia {
            config.inertia.mode = mode;
        }
        Ok(config)
    }
}
