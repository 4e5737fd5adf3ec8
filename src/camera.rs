use log::{debug, warn};
use nalgebra::{Isometry3, Perspective3, Point3, Unit, UnitQuaternion, Vector2, Vector3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use winit::dpi::PhysicalSize;

use crate::input::InputState;

// 마우스 픽셀 이동량을 라디안 비슷한 크기로 줄이는 값
const MOUSE_SENSITIVITY: f32 = 0.002;

// |forward · y|가 이보다 크면 월드 y축을 up으로 쓸 수 없음 (약 2.5도)
const VERTICAL_LIMIT: f32 = 0.999;

/// 화면 위쪽 기준 축. 거의 수직으로 보고 있으면 y 대신 z를 씀
fn up_hint(forward: &Unit<Vector3<f32>>) -> Unit<Vector3<f32>> {
    if forward.y.abs() > VERTICAL_LIMIT {
        // 아래를 보면 -z가 화면 위, 위를 보면 +z가 화면 위
        Unit::new_unchecked(Vector3::new(0.0, 0.0, forward.y.signum()))
    } else {
        Vector3::y_axis()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// 도(degree) 단위
    pub vertical_fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: Point3<f32>,
    pub forward: Vector3<f32>,
    pub movement_speed: f32,
    pub rotation_speed: f32,
    pub boost_multiplier: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            vertical_fov: 45.0,
            near: 0.1,
            far: 100.0,
            position: Point3::new(0.0, 0.0, 6.0),
            forward: Vector3::new(0.0, 0.0, -1.0),
            movement_speed: 5.0,
            rotation_speed: 0.3,
            boost_multiplier: 2.0,
        }
    }
}

pub struct Camera {
    projection: Perspective3<f32>,
    view: Isometry3<f32>,

    vertical_fov: f32,
    near: f32,
    far: f32,
    movement_speed: f32,
    rotation_speed: f32,
    boost_multiplier: f32,

    position: Point3<f32>,
    forward: Unit<Vector3<f32>>,

    ray_directions: Vec<Unit<Vector3<f32>>>,
    viewport_size: PhysicalSize<u32>,
}

impl Camera {
    pub fn new(vertical_fov: f32, near: f32, far: f32) -> Self {
        Self::with_settings(CameraSettings {
            vertical_fov,
            near,
            far,
            ..Default::default()
        })
    }

    pub fn with_settings(settings: CameraSettings) -> Self {
        let defaults = CameraSettings::default();

        // Perspective3::new는 near == far이거나 fov가 0이면 panic
        let (near, far) = if settings.near > 0.0 && settings.far > settings.near {
            (settings.near, settings.far)
        } else {
            warn!(
                "invalid clip range {}..{}, using {}..{}",
                settings.near, settings.far, defaults.near, defaults.far
            );
            (defaults.near, defaults.far)
        };
        let vertical_fov = if settings.vertical_fov > 0.0 && settings.vertical_fov < 180.0 {
            settings.vertical_fov
        } else {
            warn!(
                "invalid vertical fov {}, using {}",
                settings.vertical_fov, defaults.vertical_fov
            );
            defaults.vertical_fov
        };
        let forward = Unit::try_new(settings.forward, 1e-6)
            .unwrap_or_else(|| Unit::new_unchecked(Vector3::new(0.0, 0.0, -1.0)));

        let mut camera = Self {
            // 크기를 아직 모르니 aspect는 일단 1
            projection: Perspective3::new(1.0, vertical_fov.to_radians(), near, far),
            view: Isometry3::identity(),
            vertical_fov,
            near,
            far,
            movement_speed: settings.movement_speed,
            rotation_speed: settings.rotation_speed,
            boost_multiplier: settings.boost_multiplier,
            position: settings.position,
            forward,
            ray_directions: vec![],
            viewport_size: PhysicalSize::new(0, 0),
        };
        camera.reevaluate_view();

        camera
    }

    /// 이번 프레임 입력을 반영함. 위치나 방향이 실제로 바뀌었을 때만 `true`.
    pub fn update(&mut self, time_step: f32, input: &InputState) -> bool {
        let up: Unit<Vector3<f32>> = Vector3::y_axis();
        let right = self.right_direction();

        let mut moved = false;

        let mut translation: Vector3<f32> = Vector3::zeros();
        if input.forward {
            translation += self.forward.into_inner();
        }
        if input.backward {
            translation -= self.forward.into_inner();
        }
        if input.right {
            translation += right.into_inner();
        }
        if input.left {
            translation -= right.into_inner();
        }
        if input.up {
            translation += up.into_inner();
        }
        if input.down {
            translation -= up.into_inner();
        }

        let mut speed = self.movement_speed;
        if input.boost {
            speed *= self.boost_multiplier;
        }

        // W + S 처럼 서로 상쇄되면 움직이지 않은 것
        if time_step > 0.0 && translation.magnitude_squared() > 0.0 {
            let step = translation * speed * time_step;
            if step.iter().all(|c| c.is_finite()) && step.magnitude_squared() > 0.0 {
                self.position += step;
                moved = true;
            }
        }

        if input.look && input.mouse_delta != Vector2::zeros() {
            let delta = input.mouse_delta * MOUSE_SENSITIVITY;

            let pitch_delta = delta.y * self.rotation_speed; // positive when down
            let yaw_delta = delta.x * self.rotation_speed; // positive when right

            let yaw = UnitQuaternion::from_axis_angle(&up, -yaw_delta);
            let pitch = UnitQuaternion::from_axis_angle(&right, -pitch_delta);

            let mut forward = (pitch * yaw) * self.forward;
            // 마우스로는 수직 근처까지 넘어가지 못하게 yaw만 적용. 이미 수직이면 빠져나오는 건 허용
            if forward.y.abs() > VERTICAL_LIMIT && forward.y.abs() > self.forward.y.abs() {
                forward = yaw * self.forward;
            }
            forward.renormalize_fast();

            if forward != self.forward {
                self.forward = forward;
                moved = true;
            }
        }

        if moved {
            self.reevaluate_view();
            self.reevaluate_rays();
        }

        moved
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size == self.viewport_size || new_size.width == 0 || new_size.height == 0 {
            return;
        }

        debug!("camera viewport {}x{}", new_size.width, new_size.height);
        self.viewport_size = new_size;

        self.reevaluate_projection();
        self.reevaluate_rays();
    }

    pub fn look_at(&mut self, position: Point3<f32>, target: Point3<f32>) {
        self.position = position;
        if let Some(forward) = Unit::try_new(target - position, 1e-6) {
            self.forward = forward;
        }

        self.reevaluate_view();
        self.reevaluate_rays();
    }

    pub fn ray_direction(&self, x: u32, y: u32) -> Unit<Vector3<f32>> {
        self.ray_directions[y as usize * self.viewport_size.width as usize + x as usize]
    }

    pub fn ray_directions(&self) -> &[Unit<Vector3<f32>>] {
        &self.ray_directions
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn forward_direction(&self) -> Unit<Vector3<f32>> {
        self.forward
    }

    pub fn right_direction(&self) -> Unit<Vector3<f32>> {
        let up = up_hint(&self.forward).into_inner();
        Unit::new_normalize(self.forward.cross(&up))
    }

    pub fn viewport(&self) -> PhysicalSize<u32> {
        self.viewport_size
    }

    pub fn vertical_fov(&self) -> f32 {
        self.vertical_fov
    }

    pub fn clip_range(&self) -> (f32, f32) {
        (self.near, self.far)
    }

    pub fn rotation_speed(&self) -> f32 {
        self.rotation_speed
    }

    pub fn movement_speed(&self) -> f32 {
        self.movement_speed
    }

    fn reevaluate_projection(&mut self) {
        let aspect = self.viewport_size.width as f32 / self.viewport_size.height as f32;
        self.projection =
            Perspective3::new(aspect, self.vertical_fov.to_radians(), self.near, self.far);
    }

    fn reevaluate_view(&mut self) {
        let target = self.position + self.forward.into_inner();
        self.view = Isometry3::look_at_rh(&self.position, &target, &up_hint(&self.forward));
    }

    fn reevaluate_rays(&mut self) {
        let PhysicalSize { width, height } = self.viewport_size;
        if width == 0 || height == 0 {
            self.ray_directions.clear();
            return;
        }

        let (width, height) = (width as usize, height as usize);
        let projection = &self.projection;
        let view = &self.view;
        let position = self.position;

        self.ray_directions = (0..width * height)
            .into_par_iter()
            .map(|index| {
                let y = index / width;
                let x = index % width;

                let coord = Vector2::new(x as f32 / width as f32, y as f32 / height as f32) * 2.0
                    - Vector2::new(1.0, 1.0);

                // 0번째 줄이 화면 위쪽이 되도록 y를 뒤집음. z = 1은 far 평면
                let target = projection.unproject_point(&Point3::new(coord.x, -coord.y, 1.0));
                let world = view.inverse_transform_point(&target);

                Unit::new_normalize(world - position)
            })
            .collect();
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::with_settings(CameraSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized(width: u32, height: u32) -> Camera {
        let mut camera = Camera::default();
        camera.resize(PhysicalSize::new(width, height));
        camera
    }

    #[test]
    fn center_ray_points_forward() {
        let camera = sized(400, 300);
        let center = camera.ray_direction(200, 150);

        assert!((center.dot(&camera.forward_direction().into_inner()) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn row_zero_is_the_top_of_the_image() {
        let camera = sized(64, 48);

        assert!(camera.ray_direction(32, 0).y > 0.0);
        assert!(camera.ray_direction(32, 47).y < 0.0);
        assert!(camera.ray_direction(0, 24).x < 0.0);
        assert!(camera.ray_direction(63, 24).x > 0.0);
    }

    #[test]
    fn edge_rays_match_field_of_view() {
        let camera = sized(100, 100);
        let top = camera.ray_direction(50, 0);
        let angle = top.dot(&camera.forward_direction().into_inner()).acos().to_degrees();

        assert!((angle - 22.5).abs() < 0.1, "angle = {angle}");
    }

    #[test]
    fn resize_rebuilds_ray_cache() {
        let mut camera = sized(8, 4);
        assert_eq!(camera.ray_directions().len(), 32);

        camera.resize(PhysicalSize::new(3, 5));
        assert_eq!(camera.ray_directions().len(), 15);
        assert_eq!(camera.viewport(), PhysicalSize::new(3, 5));

        // 0이 들어오면 무시
        camera.resize(PhysicalSize::new(0, 5));
        assert_eq!(camera.ray_directions().len(), 15);
        assert_eq!(camera.viewport(), PhysicalSize::new(3, 5));
    }

    #[test]
    fn idle_update_changes_nothing() {
        let mut camera = sized(16, 16);
        let before = camera.ray_directions().to_vec();

        assert!(!camera.update(0.016, &InputState::default()));

        // 버튼을 안 누르고 있으면 마우스 이동은 무시
        let drift = InputState {
            mouse_delta: Vector2::new(10.0, 5.0),
            ..Default::default()
        };
        assert!(!camera.update(0.016, &drift));

        // 서로 반대 방향 키는 상쇄
        let cancelled = InputState {
            forward: true,
            backward: true,
            ..Default::default()
        };
        assert!(!camera.update(0.016, &cancelled));

        assert_eq!(camera.position(), Point3::new(0.0, 0.0, 6.0));
        assert_eq!(camera.ray_directions(), &before[..]);
    }

    #[test]
    fn moving_forward_and_boosting() {
        let mut camera = sized(16, 16);
        let input = InputState {
            forward: true,
            ..Default::default()
        };

        assert!(camera.update(0.5, &input));
        assert!((camera.position().z - 3.5).abs() < 1e-5);

        let boosted = InputState {
            boost: true,
            ..input
        };
        assert!(camera.update(0.1, &boosted));
        assert!((camera.position().z - 2.5).abs() < 1e-5);
    }

    #[test]
    fn mouse_look_turns_right_and_down() {
        let mut camera = sized(16, 16);
        let before = camera.ray_direction(8, 8);
        let input = InputState {
            look: true,
            mouse_delta: Vector2::new(100.0, 100.0),
            ..Default::default()
        };

        assert!(camera.update(0.016, &input));

        let forward = camera.forward_direction();
        assert!(forward.x > 0.0);
        assert!(forward.y < 0.0);
        assert!((forward.magnitude() - 1.0).abs() < 1e-4);
        assert_ne!(camera.ray_direction(8, 8), before);
    }

    #[test]
    fn pitch_stops_short_of_vertical() {
        let mut camera = sized(4, 4);
        let input = InputState {
            look: true,
            mouse_delta: Vector2::new(0.0, -100_000.0),
            ..Default::default()
        };

        camera.update(0.016, &input);
        assert!(camera.forward_direction().y.abs() <= 0.999 + 1e-4);
    }

    #[test]
    fn look_at_points_at_target() {
        let mut camera = sized(40, 30);
        camera.look_at(Point3::new(3.0, 2.0, 1.0), Point3::origin());

        let expected = Vector3::new(-3.0, -2.0, -1.0).normalize();
        assert!((camera.ray_direction(20, 15).dot(&expected) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn look_at_from_directly_above() {
        let mut camera = sized(8, 8);
        camera.look_at(Point3::new(0.0, 5.0, 0.0), Point3::origin());

        assert!(camera
            .ray_directions()
            .iter()
            .all(|d| d.iter().all(|c| c.is_finite())));
        assert!((camera.ray_direction(4, 4).y + 1.0).abs() < 1e-4);

        // 화면 위쪽은 -z, 오른쪽은 +x
        let right = camera.right_direction();
        assert!((right.x - 1.0).abs() < 1e-4, "right = {right:?}");
        assert!(camera.ray_direction(4, 0).z < 0.0);
    }

    #[test]
    fn vertical_forward_in_settings_is_usable() {
        let mut camera = Camera::with_settings(CameraSettings {
            forward: Vector3::new(0.0, 1.0, 0.0),
            ..Default::default()
        });
        camera.resize(PhysicalSize::new(6, 4));

        assert!(camera.right_direction().iter().all(|c| c.is_finite()));
        assert!(camera
            .ray_directions()
            .iter()
            .all(|d| d.iter().all(|c| c.is_finite())));
        assert!(camera.ray_direction(3, 0).z > 0.0);
    }

    #[test]
    fn mouse_look_can_leave_vertical() {
        let mut camera = sized(8, 8);
        camera.look_at(Point3::new(0.0, 5.0, 0.0), Point3::origin());
        let input = InputState {
            look: true,
            mouse_delta: Vector2::new(0.0, 500.0),
            ..Default::default()
        };

        assert!(camera.update(0.016, &input));
        assert!(camera.forward_direction().y.abs() < 0.999);
        assert!(camera
            .ray_directions()
            .iter()
            .all(|d| d.iter().all(|c| c.is_finite())));
    }

    #[test]
    fn bad_clip_range_falls_back() {
        let camera = Camera::new(45.0, 10.0, 1.0);
        assert_eq!(camera.clip_range(), (0.1, 100.0));
    }
}
