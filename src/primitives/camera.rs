use std::f32::consts::FRAC_PI_4;

use cgmath::{prelude::*, Deg, Matrix4, Point3, Rad, Vector3};
use wgpu::util::DeviceExt;

use crate::primitives::input::InputSnapshot;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

pub fn perspective(fovy: Deg<f32>, aspect: f32, near: f32, far: f32) -> Matrix4<f32> {
    OPENGL_TO_WGPU_MATRIX * cgmath::perspective(fovy, aspect, near, far)
}

pub fn orthographic(half_size: f32, near: f32, far: f32) -> Matrix4<f32> {
    OPENGL_TO_WGPU_MATRIX * cgmath::ortho(-half_size, half_size, -half_size, half_size, near, far)
}

pub struct Camera {
    pub position: Point3<f32>,
    pub pitch: f32,
    pub yaw: f32,
    pub projection: Matrix4<f32>,
    pub speed: f32,
    pub sensitivity: f32,
}

impl Camera {
    pub fn new(position: Point3<f32>, projection: Matrix4<f32>, speed: f32, sensitivity: f32) -> Self {
        Self {
            position,
            pitch: 0.0,
            yaw: 0.0,
            projection,
            speed,
            sensitivity,
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_angle_x(Rad(-self.pitch))
            * Matrix4::from_angle_y(Rad(-self.yaw))
            * Matrix4::from_translation(-self.position.to_vec())
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection * self.view_matrix()
    }

    /// World-space orientation, the inverse of the view rotation.
    pub fn rotation(&self) -> Matrix4<f32> {
        Matrix4::from_angle_y(Rad(self.yaw)) * Matrix4::from_angle_x(Rad(self.pitch))
    }

    pub fn forward(&self) -> Vector3<f32> {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vector3::new(-sin_yaw * cos_pitch, sin_pitch, -cos_yaw * cos_pitch)
    }

    pub fn update(&mut self, dt: f32, input: &InputSnapshot) {
        let forward = Vector3::new(self.yaw.sin(), 0.0, self.yaw.cos());
        let right = Vector3::unit_y().cross(forward);
        let step = self.speed * dt;

        if input.up {
            self.position -= forward * step;
        }
        if input.down {
            self.position += forward * step;
        }
        if input.left {
            self.position -= right * step;
        }
        if input.right {
            self.position += right * step;
        }

        self.yaw -= input.mouse_delta.x * self.sensitivity;
        self.pitch -= input.mouse_delta.y * self.sensitivity;
        self.pitch = self.pitch.clamp(-FRAC_PI_4, FRAC_PI_4);
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub sun_view_proj: [[f32; 4]; 4],
    pub sun_direction: [f32; 4],
    pub shadows: f32,
    _padding: [f32; 3],
}

impl CameraUniform {
    pub fn new() -> Self {
        let identity: [[f32; 4]; 4] = Matrix4::identity().into();
        Self {
            view: identity,
            projection: identity,
            sun_view_proj: identity,
            sun_direction: [0.0, -1.0, 0.0, 0.0],
            shadows: 0.0,
            _padding: [0.0; 3],
        }
    }

    pub fn from(camera: &Camera) -> Self {
        Self {
            view: camera.view_matrix().into(),
            projection: camera.projection.into(),
            ..Self::new()
        }
    }

    pub fn with_sun(mut self, sun: &Camera, shadows: bool) -> Self {
        self.sun_view_proj = sun.view_projection().into();
        self.sun_direction = sun.forward().extend(0.0).into();
        self.shadows = if shadows { 1.0 } else { 0.0 };
        self
    }

    pub fn to_buffer(&self, device: &wgpu::Device, label: &str) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(self),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    }

    pub fn update_buffer(&self, buffer: &wgpu::Buffer, queue: &wgpu::Queue) {
        queue.write_buffer(buffer, 0, bytemuck::bytes_of(self));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Vector2, Vector4};

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    fn camera() -> Camera {
        Camera::new(
            Point3::new(0.0, 1.0, 10.0),
            perspective(Deg(45.0), 1.5, 0.01, 1000.0),
            10.0,
            0.01,
        )
    }

    #[test]
    fn forward_key_moves_towards_negative_z() {
        let mut cam = camera();
        let input = InputSnapshot {
            up: true,
            ..Default::default()
        };
        cam.update(0.5, &input);
        assert!(close(cam.position.z, 5.0));
        assert!(close(cam.position.x, 0.0));
    }

    #[test]
    fn strafing_follows_yaw() {
        let mut cam = camera();
        cam.yaw = std::f32::consts::FRAC_PI_2;
        let input = InputSnapshot {
            right: true,
            ..Default::default()
        };
        cam.update(0.1, &input);
        // facing -x, right is -z
        assert!(close(cam.position.z, 9.0));
        assert!(close(cam.position.x, 0.0));
    }

    #[test]
    fn mouse_turns_and_pitch_is_clamped() {
        let mut cam = camera();
        let input = InputSnapshot {
            mouse_delta: Vector2::new(10.0, -500.0),
            ..Default::default()
        };
        cam.update(0.016, &input);
        assert!(close(cam.yaw, -0.1));
        assert!(close(cam.pitch, FRAC_PI_4));

        let input = InputSnapshot {
            mouse_delta: Vector2::new(0.0, 1000.0),
            ..Default::default()
        };
        cam.update(0.016, &input);
        assert!(close(cam.pitch, -FRAC_PI_4));
    }

    #[test]
    fn forward_point_lands_on_view_axis() {
        let mut cam = camera();
        cam.yaw = 0.7;
        cam.pitch = -0.3;
        let ahead = cam.position + cam.forward() * 4.0;
        let p = cam.view_matrix().transform_point(ahead);
        assert!(close(p.x, 0.0));
        assert!(close(p.y, 0.0));
        assert!(close(p.z, -4.0));
    }

    #[test]
    fn sun_looking_down_diagonal() {
        let mut sun = camera();
        sun.yaw = FRAC_PI_4;
        sun.pitch = -FRAC_PI_4;
        let dir = sun.forward();
        assert!(dir.x < 0.0 && dir.y < 0.0 && dir.z < 0.0);
        assert!(close(dir.magnitude(), 1.0));
    }

    #[test]
    fn rotation_is_inverse_of_view_rotation() {
        let mut cam = camera();
        cam.position = Point3::new(0.0, 0.0, 0.0);
        cam.yaw = 1.1;
        cam.pitch = 0.4;
        let product = cam.view_matrix() * cam.rotation();
        let identity = Matrix4::<f32>::identity();
        for c in 0..4 {
            for r in 0..4 {
                assert!(close(product[c][r], identity[c][r]));
            }
        }
    }

    #[test]
    fn orthographic_maps_depth_to_unit_range() {
        let proj = orthographic(8.0, 0.0, 1000.0);
        let mid = proj * Vector4::new(8.0, -8.0, -500.0, 1.0);
        assert!(close(mid.x, 1.0));
        assert!(close(mid.y, -1.0));
        assert!(close(mid.z, 0.5));
        let far = proj * Vector4::new(0.0, 0.0, -1000.0, 1.0);
        assert!(close(far.z, 1.0));
    }

    #[test]
    fn uniform_layout_is_sixteen_byte_aligned() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 224);
        let uniform = CameraUniform::from(&camera()).with_sun(&camera(), true);
        assert_eq!(uniform.shadows, 1.0);
    }
}
