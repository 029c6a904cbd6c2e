use crate::common::SH_COEFFS_PER_CHANNEL;
use glam::{Quat, Vec3};
use zerocopy::{Immutable, IntoBytes};

/// Decoded splats as one array per attribute. Index `i` of every array is splat `i`;
/// the `sh_*` arrays hold `SH_COEFFS_PER_CHANNEL` values per splat, row-major.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SceneColumns {
    pub num_splats: usize,
    pub xyz_x: Vec<f32>,
    pub xyz_y: Vec<f32>,
    pub xyz_z: Vec<f32>,
    pub opacity: Vec<f32>,
    pub scale_x: Vec<f32>,
    pub scale_y: Vec<f32>,
    pub scale_z: Vec<f32>,
    pub rot_w: Vec<f32>,
    pub rot_x: Vec<f32>,
    pub rot_y: Vec<f32>,
    pub rot_z: Vec<f32>,
    pub color_r: Vec<f32>,
    pub color_g: Vec<f32>,
    pub color_b: Vec<f32>,
    pub sh_r: Vec<f32>,
    pub sh_g: Vec<f32>,
    pub sh_b: Vec<f32>,
}

impl SceneColumns {
    pub fn is_empty(&self) -> bool {
        self.num_splats == 0
    }

    pub fn position(&self, i: usize) -> Vec3 {
        Vec3::new(self.xyz_x[i], self.xyz_y[i], self.xyz_z[i])
    }

    /// Harmonic coefficients of splat `i` for the red, green and blue channels.
    pub fn sh_rows(&self, i: usize) -> [&[f32]; 3] {
        let range = i * SH_COEFFS_PER_CHANNEL..(i + 1) * SH_COEFFS_PER_CHANNEL;
        [
            &self.sh_r[range.clone()],
            &self.sh_g[range.clone()],
            &self.sh_b[range],
        ]
    }
}

/// Everything the backend's render entry point needs besides the scene itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransform {
    pub width: u32,
    pub height: u32,
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
    /// World-to-camera rotation.
    pub view_rotation: Quat,
    /// World-to-camera translation.
    pub view_translation: Vec3,
}

impl FrameTransform {
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Components in the `(w, x, y, z)` order the backend expects.
    pub fn view_rotation_wxyz(&self) -> [f32; 4] {
        let q = self.view_rotation;
        [q.w, q.x, q.y, q.z]
    }
}

/// Per-channel float planes, `width * height` values each, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutput {
    pub width: u32,
    pub height: u32,
    pub r: Vec<f32>,
    pub g: Vec<f32>,
    pub b: Vec<f32>,
}

impl RenderOutput {
    pub fn filled(width: u32, height: u32, value: f32) -> Self {
        let n = width as usize * height as usize;
        RenderOutput {
            width,
            height,
            r: vec![value; n],
            g: vec![value; n],
            b: vec![value; n],
        }
    }
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, IntoBytes, Immutable)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}
