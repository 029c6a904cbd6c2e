use crate::camera::Camera;
use crate::structures::FrameTransform;
use glam::{Quat, Vec3};

/// Rotates `v` by unit quaternion `q`:
/// `t = 2 * cross(q.xyz, v); v' = v + q.w * t + cross(q.xyz, t)`.
#[inline]
pub fn rotate_vec(q: Quat, v: Vec3) -> Vec3 {
    let u = Vec3::new(q.x, q.y, q.z);
    let t = 2.0 * u.cross(v);
    v + q.w * t + u.cross(t)
}

/// Builds the backend arguments for a `width` x `height` frame seen through `camera`.
/// Both dimensions are raised to at least 1.
pub fn frame_transform(width: u32, height: u32, camera: &Camera) -> FrameTransform {
    let width = width.max(1);
    let height = height.max(1);

    let tan_half_fov = (camera.fov.to_radians() * 0.5).tan();
    let fx = width as f32 / (2.0 * tan_half_fov);
    let fy = height as f32 / (2.0 * tan_half_fov);

    let view_rotation = camera.orientation().conjugate();
    let view_translation = rotate_vec(view_rotation, -camera.position);

    FrameTransform {
        width,
        height,
        fx,
        fy,
        cx: width as f32 / 2.0,
        cy: height as f32 / 2.0,
        view_rotation,
        view_translation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn test_intrinsics() {
        let cam = Camera {
            fov: 90.0,
            ..Camera::default()
        };
        let t = frame_transform(640, 480, &cam);
        assert!((t.fx - 320.0).abs() < EPS);
        assert!((t.fy - 240.0).abs() < EPS);
        assert_eq!(t.cx, 320.0);
        assert_eq!(t.cy, 240.0);
        assert_eq!((t.width, t.height), (640, 480));
    }

    #[test]
    fn test_zero_viewport_clamped() {
        let t = frame_transform(0, 0, &Camera::default());
        assert_eq!((t.width, t.height), (1, 1));
        assert_eq!(t.pixel_count(), 1);
        assert!(t.fx.is_finite() && t.fx > 0.0);
        assert_eq!(t.cx, 0.5);
    }

    #[test]
    fn test_view_rotation_inverts_orientation() {
        for &(yaw, pitch) in &[(-90.0, 0.0), (0.0, 0.0), (37.0, -12.0), (210.0, 88.0)] {
            let cam = Camera {
                yaw,
                pitch,
                ..Camera::default()
            };
            let t = frame_transform(100, 100, &cam);
            let q = cam.orientation();
            assert!((t.view_rotation * q).abs_diff_eq(Quat::IDENTITY, EPS));
            let [w, x, y, z] = t.view_rotation_wxyz();
            assert_eq!((w, x, y, z), (q.w, -q.x, -q.y, -q.z));
        }
    }

    #[test]
    fn test_rotate_vec_matches_quat_mul() {
        let q = Quat::from_euler(glam::EulerRot::YXZ, 0.7, -0.3, 1.1);
        for v in [Vec3::X, Vec3::new(1.0, -2.0, 3.5), Vec3::new(-4.0, 0.25, 0.0)] {
            assert!(rotate_vec(q, v).abs_diff_eq(q * v, EPS));
        }
    }

    #[test]
    fn test_camera_position_maps_to_origin() {
        let cam = Camera {
            position: Vec3::new(1.0, 2.0, -3.0),
            yaw: 25.0,
            pitch: -40.0,
            ..Camera::default()
        };
        let t = frame_transform(64, 64, &cam);
        let to_cam = |p: Vec3| rotate_vec(t.view_rotation, p) + t.view_translation;

        assert!(to_cam(cam.position).abs_diff_eq(Vec3::ZERO, EPS));
        // A point straight ahead lands on the optical axis at its distance.
        let ahead = to_cam(cam.position + cam.forward() * 2.0);
        assert!(ahead.abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), EPS));
    }

    #[test]
    fn test_default_camera_translation() {
        // Facing -X from (0, 0, -5): the world origin sits 5 units along camera +X.
        let t = frame_transform(10, 10, &Camera::default());
        assert!(t.view_translation.abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), EPS));
    }
}
