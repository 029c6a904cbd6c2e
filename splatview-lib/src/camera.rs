use crate::common::{FOV_MAX_DEG, FOV_MIN_DEG, PITCH_LIMIT_DEG};
use glam::{Quat, Vec3};

const DRAG_SENSITIVITY: f32 = 0.2;
const MOVE_SPEED: f32 = 0.05;
const BOOST_FACTOR: f32 = 4.0;

/// FPS-style camera. Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Kept for the UI; orientation comes from yaw and pitch alone.
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            position: Vec3::new(0.0, 0.0, -5.0),
            target: Vec3::ZERO,
            yaw: -90.0,
            pitch: 0.0,
            fov: 45.0,
        }
    }
}

/// Input gathered for one frame.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct CameraInput {
    /// Mouse delta while the look button is held, in pixels.
    pub drag: Option<(f32, f32)>,
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub down: bool,
    pub up: bool,
    pub boost: bool,
}

impl Camera {
    /// Camera-to-world rotation, `Ry(yaw) * Rx(pitch)` expanded in closed form.
    pub fn orientation(&self) -> Quat {
        let (sy, cy) = (self.yaw.to_radians() * 0.5).sin_cos();
        let (sp, cp) = (self.pitch.to_radians() * 0.5).sin_cos();
        Quat::from_xyzw(cy * sp, sy * cp, -sy * sp, cy * cp)
    }

    /// Viewing direction in world space (camera +Z).
    pub fn forward(&self) -> Vec3 {
        self.orientation() * Vec3::Z
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * DRAG_SENSITIVITY;
        self.pitch = (self.pitch + dy * DRAG_SENSITIVITY).clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG);
    }

    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov.clamp(FOV_MIN_DEG, FOV_MAX_DEG);
    }

    /// Horizontal forward and right axes for walking.
    fn planar_axes(&self) -> (Vec3, Vec3) {
        let (s, c) = self.yaw.to_radians().sin_cos();
        (Vec3::new(s, 0.0, c), Vec3::new(c, 0.0, -s))
    }

    pub fn apply_input(&mut self, input: &CameraInput) {
        if let Some((dx, dy)) = input.drag {
            self.rotate(dx, dy);
        }

        let speed = if input.boost {
            MOVE_SPEED * BOOST_FACTOR
        } else {
            MOVE_SPEED
        };
        let (forward, right) = self.planar_axes();
        let axis = |pos: bool, neg: bool| (pos as i32 - neg as i32) as f32;

        self.position += forward * axis(input.forward, input.back) * speed;
        self.position += right * axis(input.right, input.left) * speed;
        self.position.y += axis(input.up, input.down) * speed;
    }
}
