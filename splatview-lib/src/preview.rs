//! CPU stand-in for the GPU rasterizer.
//!
//! Each splat is drawn as an isotropic Gaussian around its projected centre,
//! coloured by its DC term and weighted by its sigmoid opacity, composited
//! back to front. Rotation, anisotropic scale and higher-order harmonics are
//! ignored, so this is a preview of the scene rather than a faithful render.

use crate::backend::ComputeBackend;
use crate::common::{sh_dc_to_color, sigmoid};
use crate::error::SplatError;
use crate::structures::{FrameTransform, RenderOutput, SceneColumns};
use crate::transform::rotate_vec;
use glam::Vec3;
use rayon::prelude::*;

const NEAR_PLANE: f32 = 0.01;
const MIN_SIGMA_PX: f32 = 0.5;
const MAX_SIGMA_PX: f32 = 256.0;
const MIN_ALPHA: f32 = 1.0 / 255.0;

#[derive(Debug, Clone, Copy)]
struct PreviewSplat {
    position: Vec3,
    color: [f32; 3],
    alpha: f32,
    radius: f32,
}

#[derive(Debug, Clone)]
pub struct PreviewScene {
    splats: Vec<PreviewSplat>,
}

impl PreviewScene {
    pub fn len(&self) -> usize {
        self.splats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splats.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct Projected {
    depth: f32,
    u: f32,
    v: f32,
    sigma: f32,
    index: usize,
}

#[derive(Debug, Default, Clone)]
pub struct PreviewBackend {
    background: [f32; 3],
}

impl PreviewBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_background(background: [f32; 3]) -> Self {
        PreviewBackend { background }
    }
}

impl ComputeBackend for PreviewBackend {
    type Scene = PreviewScene;

    fn upload(&mut self, columns: &SceneColumns) -> Result<PreviewScene, SplatError> {
        let splats = (0..columns.num_splats)
            .into_par_iter()
            .map(|i| {
                let scale = columns.scale_x[i].max(columns.scale_y[i]).max(columns.scale_z[i]);
                PreviewSplat {
                    position: columns.position(i),
                    color: [
                        sh_dc_to_color(columns.color_r[i]),
                        sh_dc_to_color(columns.color_g[i]),
                        sh_dc_to_color(columns.color_b[i]),
                    ],
                    alpha: sigmoid(columns.opacity[i]),
                    radius: scale.exp(),
                }
            })
            .collect();
        Ok(PreviewScene { splats })
    }

    fn render(
        &mut self,
        scene: &PreviewScene,
        t: &FrameTransform,
    ) -> Result<RenderOutput, SplatError> {
        let (w, h) = (t.width as usize, t.height as usize);

        let mut visible: Vec<Projected> = scene
            .splats
            .par_iter()
            .enumerate()
            .filter_map(|(index, s)| {
                if s.alpha < MIN_ALPHA {
                    return None;
                }
                let p = rotate_vec(t.view_rotation, s.position) + t.view_translation;
                if p.z <= NEAR_PLANE {
                    return None;
                }
                let sigma = (t.fx * s.radius / p.z).clamp(MIN_SIGMA_PX, MAX_SIGMA_PX);
                let u = t.fx * p.x / p.z + t.cx;
                let v = t.fy * p.y / p.z + t.cy;
                let reach = 3.0 * sigma;
                if u + reach < 0.0 || v + reach < 0.0 || u - reach > w as f32 || v - reach > h as f32 {
                    return None;
                }
                Some(Projected {
                    depth: p.z,
                    u,
                    v,
                    sigma,
                    index,
                })
            })
            .collect();
        visible.par_sort_unstable_by(|a, b| b.depth.total_cmp(&a.depth));

        let mut out = RenderOutput {
            width: t.width,
            height: t.height,
            r: vec![self.background[0]; w * h],
            g: vec![self.background[1]; w * h],
            b: vec![self.background[2]; w * h],
        };

        for p in &visible {
            let splat = &scene.splats[p.index];
            let reach = 3.0 * p.sigma;
            let x0 = (p.u - reach).floor().max(0.0) as usize;
            let y0 = (p.v - reach).floor().max(0.0) as usize;
            let x1 = ((p.u + reach).ceil() as usize).min(w);
            let y1 = ((p.v + reach).ceil() as usize).min(h);
            let inv_two_sigma2 = 0.5 / (p.sigma * p.sigma);

            for y in y0..y1 {
                let dy = y as f32 + 0.5 - p.v;
                for x in x0..x1 {
                    let dx = x as f32 + 0.5 - p.u;
                    let a = splat.alpha * (-(dx * dx + dy * dy) * inv_two_sigma2).exp();
                    if a < MIN_ALPHA {
                        continue;
                    }
                    let i = y * w + x;
                    out.r[i] += (splat.color[0] - out.r[i]) * a;
                    out.g[i] += (splat.color[1] - out.g[i]) * a;
                    out.b[i] += (splat.color[2] - out.b[i]) * a;
                }
            }
        }

        Ok(out)
    }

    fn release(&mut self, scene: PreviewScene) {
        drop(scene);
    }
}
