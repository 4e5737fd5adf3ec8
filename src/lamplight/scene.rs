use std::fs;
use std::path::Path;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub spheres: Vec<Sphere>,
    pub materials: Vec<Material>,
}

impl Scene {
    /// 구가 가리키는 재질. 인덱스가 범위를 벗어나면 회색 기본 재질로 대체함
    pub fn material(&self, index: usize) -> &Material {
        self.materials.get(index).unwrap_or(&Material::FALLBACK)
    }

    /// 존재하지 않는 재질을 가리키는 구들의 인덱스
    pub fn dangling_spheres(&self) -> impl Iterator<Item = usize> + '_ {
        self.spheres
            .iter()
            .enumerate()
            .filter(|(_, sphere)| sphere.material_index >= self.materials.len())
            .map(|(index, _)| index)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref()).map_err(|source| Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    // 분홍 구 하나와 바닥 역할을 하는 커다란 파란 구
    pub fn demo() -> Self {
        let materials = vec![
            Material {
                albedo: Vector3::new(1.0, 0.0, 1.0),
                roughness: 0.0,
                ..Default::default()
            },
            Material {
                albedo: Vector3::new(0.2, 0.3, 1.0),
                roughness: 0.1,
                ..Default::default()
            },
        ];

        let spheres = vec![
            Sphere {
                position: Point3::origin(),
                radius: 1.0,
                material_index: 0,
            },
            Sphere {
                position: Point3::new(0.0, -101.0, 0.0),
                radius: 100.0,
                material_index: 1,
            },
        ];

        Self { spheres, materials }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sphere {
    pub position: Point3<f32>,
    pub radius: f32,
    pub material_index: usize,
}

impl Sphere {
    // 반지름이 0 이하이거나 NaN이면 없는 구 취급
    pub fn is_degenerate(&self) -> bool {
        !(self.radius > 0.0 && self.radius.is_finite())
    }
}

impl Default for Sphere {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            radius: 1.0,
            material_index: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub albedo: Vector3<f32>,
    pub roughness: f32,
    pub metallic: f32,
    pub emission_color: Vector3<f32>,
    pub emission_power: f32,
}

impl Material {
    pub const FALLBACK: Material = Material {
        albedo: Vector3::new(0.5, 0.5, 0.5),
        roughness: 1.0,
        metallic: 0.0,
        emission_color: Vector3::new(0.0, 0.0, 0.0),
        emission_power: 0.0,
    };

    pub fn emission(&self) -> Vector3<f32> {
        self.emission_color * self.emission_power
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo: Vector3::new(1.0, 1.0, 1.0),
            roughness: 1.0,
            metallic: 0.0,
            emission_color: Vector3::zeros(),
            emission_power: 0.0,
        }
    }
}
