use std::time::Instant;

use log::{debug, trace, warn};
use nalgebra::{Point3, Unit, Vector3, Vector4};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use winit::dpi::PhysicalSize;

use crate::camera::Camera;
use crate::error::{Error, Result};
use crate::lamplight::scene::{Scene, Sphere};
use crate::util::{cosine_hemisphere, lerp, reflect};
use crate::vec4_to_rgba;

pub use self::image::Image;
pub use self::random::PixelRng;
pub use self::ray::Ray;

mod image;
mod random;
mod ray;
pub mod scene;

// 반사된 레이가 방금 맞은 표면에 다시 맞지 않도록 띄우는 거리
pub const HIT_EPSILON: f32 = 0.0001;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Background {
    Flat(Vector3<f32>),
    Gradient {
        horizon: Vector3<f32>,
        zenith: Vector3<f32>,
    },
}

impl Background {
    pub fn sample(&self, direction: &Unit<Vector3<f32>>) -> Vector3<f32> {
        match self {
            Background::Flat(color) => *color,
            Background::Gradient { horizon, zenith } => {
                let t = 0.5 * (direction.y + 1.0);
                lerp(horizon, zenith, t)
            }
        }
    }
}

impl Default for Background {
    fn default() -> Self {
        Background::Flat(Vector3::new(0.6, 0.7, 0.9))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub accumulate: bool,
    pub bounce_limit: u32,
    pub background: Background,
    pub gamma_correction: bool,
    /// 픽셀 난수 생성기에 섞이는 값. 누적 중에는 (픽셀, frame_index, seed)로,
    /// 누적을 끄면 frame_index 대신 지금까지 그린 프레임 수로 키를 만들어서
    /// 매 프레임 새 샘플이 나옴
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            accumulate: true,
            bounce_limit: 5,
            background: Background::default(),
            gamma_correction: false,
            seed: 0,
        }
    }
}

/// 누적 버퍼에 프레임마다 샘플을 하나씩 더해 가며 이미지를 점점 깨끗하게 만드는 CPU 패스 트레이서.
///
/// 상태는 세 가지뿐임:
/// - 아직 `resize` 전: 버퍼 없음, `render`는 [`Error::NotSized`]
/// - `frame_index == 1`: 누적된 샘플 없음
/// - `frame_index == n`: `n - 1`개의 샘플이 누적됨
///
/// 크기 변경, [`Renderer::reset_frame_index`], 누적 끄기는 모두 1로 되돌림.
/// 장면이 바뀐 건 알아챌 방법이 없으니 호출하는 쪽에서 리셋해야 함.
#[derive(Debug)]
pub struct Renderer {
    final_image: Option<Image>,
    // f32 샘플을 f64로 더하면 2^29 프레임까지 반올림 없이 정확히 더해짐
    accumulation: Vec<Vector4<f64>>,
    frame_index: u32,
    frames_rendered: u32,
    settings: Settings,
}

impl Renderer {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            final_image: None,
            accumulation: vec![],
            frame_index: 1,
            frames_rendered: 0,
            settings,
        }
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        if self.size() == Some(new_size) {
            return;
        }

        debug!("renderer buffers {}x{}", new_size.width, new_size.height);
        self.final_image = Some(Image::new(new_size.width, new_size.height));
        self.accumulation =
            vec![Vector4::zeros(); new_size.width as usize * new_size.height as usize];
        self.reset_frame_index();
    }

    pub fn reset_frame_index(&mut self) {
        self.frame_index = 1;
        self.accumulation.fill(Vector4::zeros());
    }

    pub fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<()> {
        let Some(size) = self.size() else {
            return Err(Error::NotSized);
        };
        if camera.viewport() != size {
            warn!(
                "skipping frame, camera is {:?} but renderer is {:?}",
                camera.viewport(),
                size
            );
            return Err(Error::ViewportMismatch {
                renderer: size,
                camera: camera.viewport(),
            });
        }

        for index in scene.dangling_spheres() {
            trace!(
                "sphere {} references missing material {}",
                index,
                scene.spheres[index].material_index
            );
        }

        let timer = Instant::now();
        let width = size.width as usize;

        // 누적을 끄면 매 프레임 덮어쓰고 frame_index는 1에 고정
        let overwrite = self.frame_index == 1 || !self.settings.accumulate;
        let (frame_index, sample_key) = if self.settings.accumulate {
            (self.frame_index, self.frame_index)
        } else {
            (1, self.frames_rendered.wrapping_add(1))
        };

        let Self {
            final_image,
            accumulation,
            settings,
            ..
        } = self;
        let Some(image) = final_image.as_mut() else {
            return Err(Error::NotSized);
        };
        let settings = &*settings;

        // 픽셀끼리 공유하는 상태가 없으니 줄 단위로 나눠서 그냥 병렬로 돌림
        accumulation
            .par_chunks_mut(width)
            .zip(image.pixels_mut().par_chunks_mut(width))
            .enumerate()
            .for_each(|(y, (acc_row, image_row))| {
                for (x, (acc, pixel)) in acc_row.iter_mut().zip(image_row.iter_mut()).enumerate()
                {
                    let color =
                        sample_pixel(settings, scene, camera, x as u32, y as u32, sample_key)
                            .map(f64::from);

                    if overwrite {
                        *acc = color;
                    } else {
                        *acc += color;
                    }

                    let mean = acc.map(|c| (c / frame_index as f64) as f32);
                    *pixel = resolve(&mean, settings.gamma_correction);
                }
            });

        if self.settings.accumulate {
            self.frame_index += 1;
        } else {
            self.frame_index = 1;
        }
        self.frames_rendered = self.frames_rendered.wrapping_add(1);

        trace!(
            "frame {} took {:.3}ms",
            frame_index,
            timer.elapsed().as_secs_f64() * 1000.0
        );

        Ok(())
    }

    /// 가장 최근에 완성된 이미지. 다음 `render` 호출 전까지 유효함
    pub fn final_image(&self) -> Option<&Image> {
        self.final_image.as_ref()
    }

    pub fn accumulation(&self) -> &[Vector4<f64>] {
        &self.accumulation
    }

    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    pub fn size(&self) -> Option<PhysicalSize<u32>> {
        self.final_image.as_ref().map(Image::size)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    // DirectX의 RayGen 쉐이더와 같음
    pub fn per_pixel(
        &self,
        scene: &Scene,
        camera: &Camera,
        x: u32,
        y: u32,
        frame_index: u32,
    ) -> Vector4<f32> {
        sample_pixel(&self.settings, scene, camera, x, y, frame_index)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve(color: &Vector4<f32>, gamma_correction: bool) -> [u8; 4] {
    if gamma_correction {
        let gamma = color.map(|c| c.max(0.0).sqrt());
        vec4_to_rgba(&Vector4::new(gamma.x, gamma.y, gamma.z, color.w))
    } else {
        vec4_to_rgba(color)
    }
}

fn sample_pixel(
    settings: &Settings,
    scene: &Scene,
    camera: &Camera,
    x: u32,
    y: u32,
    frame_index: u32,
) -> Vector4<f32> {
    let index = y as usize * camera.viewport().width as usize + x as usize;
    // 키로만 쓰니 잘려도 상관없음
    let mut rng = PixelRng::new(index as u32, frame_index, settings.seed);

    let mut ray = Ray {
        origin: camera.position(),
        direction: camera.ray_direction(x, y),
    };

    let mut light: Vector3<f32> = Vector3::zeros();
    let mut throughput: Vector3<f32> = Vector3::new(1.0, 1.0, 1.0);

    for _ in 0..settings.bounce_limit {
        let Some(HitPayload {
            position, normal, sphere, ..
        }) = trace_ray(&ray, scene)
        else {
            light += settings.background.sample(&ray.direction).component_mul(&throughput);
            break;
        };

        let material = scene.material(sphere.material_index);
        let roughness = material.roughness.clamp(0.0, 1.0);

        light += material.emission().component_mul(&throughput);
        throughput.component_mul_assign(&material.albedo);

        // 금속은 정반사 성분까지 albedo 색으로 물듦. 완전히 거칠면 정반사가 없으니 영향 없음
        let specular_tint = lerp(
            &Vector3::new(1.0, 1.0, 1.0),
            &material.albedo,
            material.metallic.clamp(0.0, 1.0) * (1.0 - roughness),
        );
        throughput.component_mul_assign(&specular_tint);

        // 표면 위에서 바로 출발하면 자기 자신과 또 만나니까 normal 방향으로 살짝 띄움
        ray.origin = position + normal.into_inner() * HIT_EPSILON;

        let mirror = reflect(&ray.direction, &normal);
        let diffuse = cosine_hemisphere(&mut rng, &normal);

        // roughness 0이면 거울, 1이면 완전 난반사
        ray.direction = Unit::try_new(lerp(&mirror, diffuse.as_ref(), roughness), 1e-6)
            .unwrap_or(diffuse);
    }

    Vector4::new(light.x, light.y, light.z, 1.0)
}

// Cherno씨와 같은 디자인 선택, HitPayload는 빛의 경로에 대한 정보만 담고
// 이를 이용해 색상을 알아내는건 나중에 함
#[derive(Debug, Clone, Copy)]
pub struct HitPayload<'a> {
    pub distance: f32,
    pub position: Point3<f32>,
    pub normal: Unit<Vector3<f32>>,
    pub sphere: &'a Sphere,
}

pub fn trace_ray<'a>(ray: &Ray, scene: &'a Scene) -> Option<HitPayload<'a>> {
    let mut closest: Option<(&Sphere, f32)> = None;

    for sphere in &scene.spheres {
        if sphere.is_degenerate() {
            continue;
        }

        // 구를 원점으로 옮기고 |o + t*d|^2 = r^2 를 t에 대해 풂
        // a*t^2 + 2*h*t + c = 0, h = o·d
        let origin = ray.origin - sphere.position;

        let a = ray.direction.magnitude_squared();
        let half_b = origin.dot(&ray.direction.into_inner());
        let c = origin.magnitude_squared() - sphere.radius.powi(2);

        // 판별식
        let discriminant = half_b.powi(2) - a * c;
        if discriminant < 0.0 {
            continue;
        }

        let root = discriminant.sqrt();
        let near = (-half_b - root) / a;
        let far = (-half_b + root) / a;

        // 가까운 근이 뒤에 있으면 레이가 구 안에서 출발한 것
        let distance = if near > HIT_EPSILON {
            near
        } else if far > HIT_EPSILON {
            far
        } else {
            continue;
        };

        match closest {
            Some((_, previous)) if previous <= distance => {}
            _ => closest = Some((sphere, distance)),
        }
    }

    closest.map(|(sphere, distance)| closest_hit(ray, distance, sphere))
}

pub fn closest_hit<'a>(ray: &Ray, distance: f32, sphere: &'a Sphere) -> HitPayload<'a> {
    let position = ray.at(distance);
    let normal = Unit::new_normalize((position - sphere.position) / sphere.radius);

    HitPayload {
        distance,
        position,
        normal,
        sphere,
    }
}
