mod camera_orbit;
pub use camera_orbit::OrbitCamera;

extern crate nalgebra as na;
pub trait Camera {
    fn transform(&self) -> na::Matrix4<f32>;
    fn eye(&self) -> na::Point3<f32>;
    fn update_view(&mut self);
    fn handle_event<T>(&mut self, event: &winit::event::Event<T>);
}
