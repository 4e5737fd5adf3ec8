use std::path::PathBuf;

use thiserror::Error;
use winit::dpi::PhysicalSize;

#[derive(Error, Debug)]
pub enum Error {
    #[error("renderer has no buffers yet, call resize with a non-zero size first")]
    NotSized,

    #[error("camera viewport {camera:?} does not match renderer size {renderer:?}")]
    ViewportMismatch {
        renderer: PhysicalSize<u32>,
        camera: PhysicalSize<u32>,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image export failed: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
