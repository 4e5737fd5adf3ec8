use std::time::{Duration, Instant};

use log::debug;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;

use crate::camera::Camera;
use crate::config::Config;
use crate::error::Result;
use crate::input::InputState;
use crate::lamplight::scene::Scene;
use crate::lamplight::{Image, Renderer};

/// 창이나 UI 쪽에서 매 프레임 부르는 접착층.
///
/// 순서는 언제나 `update`(카메라 이동 → 필요하면 리셋) 다음 `render`(크기 맞추기 → 렌더링).
pub struct Application {
    scene: Scene,
    pub camera: Camera,
    pub renderer: Renderer,
    pub input: InputState,
    viewport_size: PhysicalSize<u32>,
    last_render_time: Duration,
}

impl Application {
    pub fn new(config: Config) -> Self {
        Self {
            scene: config.scene,
            camera: Camera::with_settings(config.camera),
            renderer: Renderer::with_settings(config.renderer),
            input: InputState::default(),
            viewport_size: PhysicalSize::new(config.width, config.height),
            last_render_time: Duration::ZERO,
        }
    }

    // 실제 버퍼 크기 변경은 다음 render에서 함
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.viewport_size = new_size;
    }

    pub fn update(&mut self, time_step: f32) -> bool {
        let moved = self.camera.update(time_step, &self.input);
        if moved {
            self.renderer.reset_frame_index();
        }
        self.input.end_frame();

        moved
    }

    pub fn render(&mut self) -> Result<()> {
        let timer = Instant::now();

        self.renderer.resize(self.viewport_size);
        self.camera.resize(self.viewport_size);
        self.renderer.render(&self.scene, &self.camera)?;

        self.last_render_time = timer.elapsed();
        Ok(())
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// 장면을 고치고 누적된 샘플을 버림. 렌더러는 장면이 바뀐 걸 스스로 알 수 없음
    pub fn edit_scene<F: FnOnce(&mut Scene)>(&mut self, edit: F) {
        edit(&mut self.scene);
        self.renderer.reset_frame_index();
    }

    pub fn set_accumulate(&mut self, accumulate: bool) {
        let settings = self.renderer.settings_mut();
        if settings.accumulate == accumulate {
            return;
        }

        debug!("accumulation {}", if accumulate { "on" } else { "off" });
        settings.accumulate = accumulate;
        self.renderer.reset_frame_index();
    }

    pub fn final_image(&self) -> Option<&Image> {
        self.renderer.final_image()
    }

    pub fn last_render_time(&self) -> Duration {
        self.last_render_time
    }

    // true: 여기서 처리했으니 따로 관리할 필요 없음
    pub fn input(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::Resized(new_size) => {
                self.resize(*new_size);
                true
            }
            _ => self.input.handle_window_event(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Vector2, Vector3};

    fn small() -> Application {
        Application::new(Config {
            width: 16,
            height: 12,
            ..Default::default()
        })
    }

    #[test]
    fn first_render_sizes_everything() {
        let mut app = small();
        assert!(app.final_image().is_none());

        app.render().unwrap();

        assert_eq!(app.final_image().unwrap().size(), PhysicalSize::new(16, 12));
        assert_eq!(app.camera.viewport(), PhysicalSize::new(16, 12));
        assert_eq!(app.renderer.frame_index(), 2);
    }

    #[test]
    fn camera_movement_restarts_accumulation() {
        let mut app = small();
        app.render().unwrap();
        app.render().unwrap();

        assert!(!app.update(0.016));
        assert_eq!(app.renderer.frame_index(), 3);

        app.input.look = true;
        app.input.mouse_delta = Vector2::new(4.0, 0.0);
        assert!(app.update(0.016));
        assert_eq!(app.renderer.frame_index(), 1);
        assert_eq!(app.input.mouse_delta, Vector2::zeros());
    }

    #[test]
    fn scene_edits_and_toggles_reset() {
        let mut app = small();
        app.render().unwrap();
        app.render().unwrap();

        app.edit_scene(|scene| scene.materials[0].albedo = Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(app.renderer.frame_index(), 1);
        assert_eq!(app.scene().materials[0].albedo, Vector3::new(0.0, 1.0, 0.0));

        app.render().unwrap();
        app.set_accumulate(false);
        assert_eq!(app.renderer.frame_index(), 1);
        app.render().unwrap();
        assert_eq!(app.renderer.frame_index(), 1);

        app.set_accumulate(true);
        app.render().unwrap();
        assert_eq!(app.renderer.frame_index(), 2);
    }

    #[test]
    fn window_resize_applies_on_next_render() {
        let mut app = small();
        app.render().unwrap();
        app.render().unwrap();

        assert!(app.input(&WindowEvent::Resized(PhysicalSize::new(8, 8))));
        assert_eq!(app.renderer.frame_index(), 3);

        app.render().unwrap();
        assert_eq!(app.final_image().unwrap().size(), PhysicalSize::new(8, 8));
        assert_eq!(app.renderer.frame_index(), 2);
    }
}
