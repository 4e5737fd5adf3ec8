use nalgebra::Vector2;
use winit::event::{
    DeviceEvent, ElementState, KeyboardInput, MouseButton, VirtualKeyCode, WindowEvent,
};

/// `Camera::update`에 넘기는 한 프레임치 입력.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub boost: bool,
    // 마우스 오른쪽 버튼을 누르고 있을 때만 시점 회전
    pub look: bool,
    pub mouse_delta: Vector2<f32>,
}

impl InputState {
    pub fn is_moving(&self) -> bool {
        self.forward || self.backward || self.left || self.right || self.up || self.down
    }

    // 프레임이 끝나면 마우스 이동량만 비움. 키 상태는 뗄 때까지 유지
    pub fn end_frame(&mut self) {
        self.mouse_delta = Vector2::zeros();
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                input:
                    KeyboardInput {
                        state,
                        virtual_keycode: Some(key),
                        ..
                    },
                ..
            } => {
                let is_press = matches!(state, ElementState::Pressed);
                match key {
                    VirtualKeyCode::W => self.forward = is_press,
                    VirtualKeyCode::S => self.backward = is_press,
                    VirtualKeyCode::A => self.left = is_press,
                    VirtualKeyCode::D => self.right = is_press,
                    VirtualKeyCode::Space | VirtualKeyCode::E => self.up = is_press,
                    VirtualKeyCode::LControl | VirtualKeyCode::Q => self.down = is_press,
                    VirtualKeyCode::LShift => self.boost = is_press,
                    _ => return false,
                };

                true
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Right,
                ..
            } => {
                self.look = matches!(state, ElementState::Pressed);
                if !self.look {
                    self.mouse_delta = Vector2::zeros();
                }
                true
            }
            WindowEvent::Focused(false) => {
                // 포커스를 잃으면 뗀 키 이벤트가 안 들어옴
                *self = Self::default();
                true
            }
            _ => false,
        }
    }

    // 커서 위치 대신 raw 마우스 이동량 사용. 커서가 창 끝에 닿아도 계속 회전 가능
    pub fn handle_device_event(&mut self, event: &DeviceEvent) -> bool {
        match event {
            DeviceEvent::MouseMotion { delta: (x, y) } if self.look => {
                self.mouse_delta += Vector2::new(*x as f32, *y as f32);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motion_is_ignored_unless_looking() {
        let mut input = InputState::default();
        let motion = DeviceEvent::MouseMotion { delta: (3.0, -2.0) };

        assert!(!input.handle_device_event(&motion));
        assert_eq!(input.mouse_delta, Vector2::zeros());

        input.look = true;
        assert!(input.handle_device_event(&motion));
        assert!(input.handle_device_event(&motion));
        assert_eq!(input.mouse_delta, Vector2::new(6.0, -4.0));

        input.end_frame();
        assert_eq!(input.mouse_delta, Vector2::zeros());
        assert!(input.look);
    }

    #[test]
    fn losing_focus_releases_everything() {
        let mut input = InputState {
            forward: true,
            boost: true,
            look: true,
            ..Default::default()
        };

        assert!(input.handle_window_event(&WindowEvent::Focused(false)));
        assert_eq!(input, InputState::default());
        assert!(!input.is_moving());
    }
}
