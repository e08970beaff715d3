extern crate nalgebra as na;

use crate::cameras::Camera;
use std::f32::consts::{FRAC_PI_2, PI};
use winit::event::{ElementState, Event, MouseButton, VirtualKeyCode};

const MIN_DISTANCE: f32 = 2.5;
const MAX_DISTANCE: f32 = 20.0;
const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.05;

/// Perspective camera circling the origin.
pub struct OrbitCamera {
    aspect: f32,
    fovy: f32,
    znear: f32,
    zfar: f32,

    yaw: f32,
    pitch: f32,
    distance: f32,

    orbit_speed: f32,
    zoom_speed: f32,
    rotation_speed: f32,

    dragging: bool,
    flip_y: bool,

    view: na::Matrix4<f32>,
    proj: na::Matrix4<f32>,
}

impl OrbitCamera {
    pub fn new(aspect: f32) -> Self {
        let mut camera = Self {
            aspect,
            fovy: PI / 4.0,
            znear: 0.1,
            zfar: 1000.0,
            yaw: PI / 6.0,
            pitch: PI / 6.0,
            distance: 6.0,
            orbit_speed: 0.08,
            zoom_speed: 0.4,
            rotation_speed: 0.3,
            dragging: false,
            flip_y: true,
            view: na::Matrix4::identity(),
            proj: na::Matrix4::identity(),
        };
        camera.update_projection();
        camera.update_view();
        log::debug!("projection: {:?}", camera.proj);
        camera
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
        self.update_projection();
    }

    fn update_projection(&mut self) {
        let mut proj = na::Perspective3::new(self.aspect, self.fovy, self.znear, self.zfar).to_homogeneous();
        // Vulkan clip space points y down
        if self.flip_y {
            proj[(1, 1)] *= -1.0;
        }
        self.proj = proj;
    }

    fn orbit(&mut self, yaw: f32, pitch: f32) {
        self.yaw = (self.yaw + yaw) % (2.0 * PI);
        self.pitch = (self.pitch + pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    fn zoom(&mut self, amount: f32) {
        self.distance = (self.distance + amount).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }
}

impl super::Camera for OrbitCamera {
    fn transform(&self) -> na::Matrix4<f32> {
        self.proj * self.view
    }

    fn eye(&self) -> na::Point3<f32> {
        na::Point3::new(
            self.distance * self.pitch.cos() * self.yaw.sin(),
            self.distance * self.pitch.sin(),
            self.distance * self.pitch.cos() * self.yaw.cos(),
        )
    }

    fn update_view(&mut self) {
        self.view = na::Isometry3::look_at_rh(
            &self.eye(),
            &na::Point3::origin(),
            &na::Vector3::y(),
        )
        .to_homogeneous();
    }

    fn handle_event<T>(&mut self, event: &Event<T>) {
        match event {
            winit::event::Event::WindowEvent { event: window_event, .. } => match window_event {
                winit::event::WindowEvent::KeyboardInput {
                    input:
                        winit::event::KeyboardInput {
                            state: ElementState::Pressed,
                            virtual_keycode: Some(vkey),
                            ..
                        },
                    ..
                } => match vkey {
                    VirtualKeyCode::Left => self.orbit(-self.orbit_speed, 0.0),
                    VirtualKeyCode::Right => self.orbit(self.orbit_speed, 0.0),
                    VirtualKeyCode::Up => self.orbit(0.0, self.orbit_speed),
                    VirtualKeyCode::Down => self.orbit(0.0, -self.orbit_speed),
                    VirtualKeyCode::PageUp => self.zoom(-self.zoom_speed),
                    VirtualKeyCode::PageDown => self.zoom(self.zoom_speed),
                    _ => (),
                },

                winit::event::WindowEvent::MouseInput {
                    state,
                    button: MouseButton::Left,
                    ..
                } => self.dragging = *state == ElementState::Pressed,

                winit::event::WindowEvent::Resized(size) => self.set_aspect(size.width, size.height),

                _ => (),
            },

            winit::event::Event::DeviceEvent { event: device_event, .. } => {
                if let winit::event::DeviceEvent::MouseMotion { delta } = device_event {
                    if self.dragging {
                        let x = (delta.0 as f32) * self.rotation_speed / 180.0 * PI;
                        let y = (delta.1 as f32) * self.rotation_speed / 180.0 * PI;
                        self.orbit(-x, y);
                    }
                }
            }
            _ => (),
        }

        self.update_view();
    }
}
