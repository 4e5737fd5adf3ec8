use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use winit::dpi::PhysicalSize;

use crate::camera::CameraSettings;
use crate::error::{Error, Result};
use crate::lamplight::scene::Scene;
use crate::lamplight::Settings;

/// JSON 설정 파일 하나로 렌더러, 카메라, 장면을 한꺼번에 정함. 빠진 항목은 기본값
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub width: u32,
    pub height: u32,
    pub renderer: Settings,
    pub camera: CameraSettings,
    pub scene: Scene,
}

impl Config {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref()).map_err(|source| Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn viewport_size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.width, self.height)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            renderer: Settings::default(),
            camera: CameraSettings::default(),
            scene: Scene::demo(),
        }
    }
}
