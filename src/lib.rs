use std::path::PathBuf;

use log::{debug, info};
use nalgebra::Vector4;

pub use crate::app::Application;
pub use crate::camera::{Camera, CameraSettings};
pub use crate::config::Config;
pub use crate::error::{Error, Result};
pub use crate::input::InputState;
pub use crate::lamplight::scene::{Material, Scene, Sphere};
pub use crate::lamplight::{Background, Image, Renderer, Settings};

pub mod app;
pub mod camera;
pub mod config;
pub mod error;
pub mod input;
pub mod lamplight;
mod util;

/// [0, 1] 밖은 잘라내고 8비트 RGBA로 바꿈
pub fn vec4_to_rgba(color: &Vector4<f32>) -> [u8; 4] {
    let quantized = color.map(|c| (c.clamp(0.0, 1.0) * 255.0) as u8);
    [quantized.x, quantized.y, quantized.z, quantized.w]
}

pub struct RunOptions {
    pub config: Config,
    pub frames: u32,
    pub output: PathBuf,
}

// 창 없이 누적 렌더링만 돌리고 결과를 PNG로 저장
pub fn run(options: RunOptions) -> Result<()> {
    let RunOptions {
        config,
        frames,
        output,
    } = options;

    info!(
        "{}x{}, {} spheres, {} materials, {} frames",
        config.width,
        config.height,
        config.scene.spheres.len(),
        config.scene.materials.len(),
        frames
    );

    let mut app = Application::new(config);
    let mut total = 0.0;

    for frame in 0..frames {
        app.update(0.0);
        app.render()?;

        let last_render = app.last_render_time().as_secs_f64() * 1000.0;
        total += last_render;
        debug!("frame {}: last render {:.3}ms", frame + 1, last_render);
    }

    if frames > 0 {
        info!(
            "average {:.3}ms per frame, {} samples per pixel",
            total / frames as f64,
            app.renderer.frame_index() - 1
        );
    }

    match app.final_image() {
        Some(image) => {
            image.save_png(&output)?;
            info!("saved {}", output.display());
        }
        None => info!("nothing rendered, {} not written", output.display()),
    }

    Ok(())
}
