// error.rs — 统一错误类型

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// 内置占位图缺失或损坏：启动期致命错误
    #[error("placeholder image {path:?} could not be read: {source}")]
    PlaceholderMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("placeholder image is not a valid panorama: {0}")]
    PlaceholderInvalid(#[source] image::ImageError),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("failed to parse config {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("gpu setup failed: {0}")]
    Gpu(String),
}

pub type Result<T> = std::result::Result<T, ViewerError>;
