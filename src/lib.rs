// lib.rs — 全景查看器的触摸相机控制核心

pub mod config;
pub mod controller;
pub mod error;
pub mod gesture;
pub mod inertia;
pub mod panorama;
pub mod renderer;
pub mod session;
pub mod timer;
pub mod touch;
pub mod translator;

pub use controller::{PanoramaController, PlaceholderSource, ViewPhase};
pub use error::{Result, ViewerError};
pub use inertia::InertiaMode;
pub use panorama::{CameraOrientation, OrientationStore, PanoramaImage, SceneRenderer};
