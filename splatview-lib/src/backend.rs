use crate::camera::Camera;
use crate::error::SplatError;
use crate::postprocess::to_rgb8;
use crate::structures::{FrameTransform, RenderOutput, SceneColumns};
use crate::transform::frame_transform;
use tracing::{debug, info};

/// A rasterizer that keeps scene arrays on its own side. `render` must not
/// return until the output planes are in host memory.
pub trait ComputeBackend {
    /// Backend-side handles for one uploaded scene.
    type Scene;

    fn upload(&mut self, columns: &SceneColumns) -> Result<Self::Scene, SplatError>;

    fn render(
        &mut self,
        scene: &Self::Scene,
        transform: &FrameTransform,
    ) -> Result<RenderOutput, SplatError>;

    fn release(&mut self, scene: Self::Scene);
}

struct UploadedScene<S> {
    handles: S,
    num_splats: usize,
}

/// Owns the backend and at most one uploaded scene.
pub struct SplatRenderer<B: ComputeBackend> {
    backend: B,
    scene: Option<UploadedScene<B::Scene>>,
}

impl<B: ComputeBackend> SplatRenderer<B> {
    pub fn new(backend: B) -> Self {
        SplatRenderer {
            backend,
            scene: None,
        }
    }

    pub fn num_splats(&self) -> usize {
        self.scene.as_ref().map_or(0, |s| s.num_splats)
    }

    /// Replaces the current scene. The old handles are released before the new
    /// upload starts; if the upload fails the renderer is left without a scene.
    pub fn install(&mut self, columns: &SceneColumns) -> Result<(), SplatError> {
        if let Some(old) = self.scene.take() {
            debug!("Releasing {} splats", old.num_splats);
            self.backend.release(old.handles);
        }
        if columns.is_empty() {
            return Ok(());
        }

        let handles = self.backend.upload(columns)?;
        self.scene = Some(UploadedScene {
            handles,
            num_splats: columns.num_splats,
        });
        info!("Scene uploaded: {} splats", columns.num_splats);
        Ok(())
    }

    /// Renders one frame into `pixels` (RGB8, row-major). Returns `Ok(false)` without
    /// touching `pixels` when no scene is loaded. On error `pixels` is left as it was.
    pub fn render(
        &mut self,
        width: u32,
        height: u32,
        camera: &Camera,
        pixels: &mut Vec<u8>,
    ) -> Result<bool, SplatError> {
        let Some(scene) = &self.scene else {
            return Ok(false);
        };

        let transform = frame_transform(width, height, camera);
        let output = self.backend.render(&scene.handles, &transform)?;
        if (output.width, output.height) != (transform.width, transform.height) {
            return Err(SplatError::Backend(format!(
                "Backend returned a {}x{} frame for a {}x{} request",
                output.width, output.height, transform.width, transform.height
            )));
        }
        to_rgb8(&output, pixels)?;
        Ok(true)
    }
}

impl<B: ComputeBackend> Drop for SplatRenderer<B> {
    fn drop(&mut self) {
        if let Some(scene) = self.scene.take() {
            self.backend.release(scene.handles);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Journal {
        events: Vec<String>,
        fail_render: bool,
        fail_upload: bool,
        next_id: usize,
    }

    struct MockBackend(Rc<RefCell<Journal>>);

    impl ComputeBackend for MockBackend {
        type Scene = usize;

        fn upload(&mut self, columns: &SceneColumns) -> Result<usize, SplatError> {
            let mut j = self.0.borrow_mut();
            if j.fail_upload {
                return Err(SplatError::Backend("out of device memory".to_string()));
            }
            j.next_id += 1;
            let id = j.next_id;
            j.events.push(format!("upload {} ({})", id, columns.num_splats));
            Ok(id)
        }

        fn render(
            &mut self,
            scene: &usize,
            transform: &FrameTransform,
        ) -> Result<RenderOutput, SplatError> {
            let mut j = self.0.borrow_mut();
            j.events.push(format!("render {}", scene));
            if j.fail_render {
                return Err(SplatError::Backend("device lost".to_string()));
            }
            Ok(RenderOutput::filled(transform.width, transform.height, 0.5))
        }

        fn release(&mut self, scene: usize) {
            self.0.borrow_mut().events.push(format!("release {}", scene));
        }
    }

    fn columns(n: usize) -> SceneColumns {
        SceneColumns {
            num_splats: n,
            ..SceneColumns::default()
        }
    }

    fn renderer() -> (SplatRenderer<MockBackend>, Rc<RefCell<Journal>>) {
        let journal = Rc::new(RefCell::new(Journal::default()));
        (SplatRenderer::new(MockBackend(journal.clone())), journal)
    }

    #[test]
    fn test_no_scene_skips_render() {
        let (mut r, journal) = renderer();
        let mut pixels = vec![7u8; 3];
        assert!(!r.render(4, 4, &Camera::default(), &mut pixels).unwrap());
        assert_eq!(pixels, [7, 7, 7]);

        r.install(&columns(0)).unwrap();
        assert!(!r.render(4, 4, &Camera::default(), &mut pixels).unwrap());
        assert!(journal.borrow().events.is_empty());
    }

    #[test]
    fn test_reload_releases_before_upload() {
        let (mut r, journal) = renderer();
        r.install(&columns(3)).unwrap();
        r.install(&columns(5)).unwrap();
        assert_eq!(r.num_splats(), 5);
        drop(r);
        assert_eq!(
            journal.borrow().events,
            ["upload 1 (3)", "release 1", "upload 2 (5)", "release 2"]
        );
    }

    #[test]
    fn test_failed_upload_leaves_no_scene() {
        let (mut r, journal) = renderer();
        r.install(&columns(3)).unwrap();
        journal.borrow_mut().fail_upload = true;
        assert!(matches!(r.install(&columns(4)), Err(SplatError::Backend(_))));
        assert_eq!(r.num_splats(), 0);
        let mut pixels = Vec::new();
        assert!(!r.render(2, 2, &Camera::default(), &mut pixels).unwrap());
        drop(r);
        assert_eq!(journal.borrow().events, ["upload 1 (3)", "release 1"]);
    }

    #[test]
    fn test_render_failure_keeps_previous_frame() {
        let (mut r, journal) = renderer();
        r.install(&columns(1)).unwrap();

        let mut pixels = Vec::new();
        assert!(r.render(2, 1, &Camera::default(), &mut pixels).unwrap());
        assert_eq!(pixels, [127; 6]);

        journal.borrow_mut().fail_render = true;
        let err = r.render(2, 1, &Camera::default(), &mut pixels).unwrap_err();
        assert_eq!(err.to_string(), "Compute backend error: device lost");
        assert_eq!(pixels, [127; 6]);

        journal.borrow_mut().fail_render = false;
        assert!(r.render(3, 1, &Camera::default(), &mut pixels).unwrap());
        assert_eq!(pixels.len(), 9);
    }

    #[test]
    fn test_viewport_clamped_to_one_pixel() {
        let (mut r, _journal) = renderer();
        r.install(&columns(1)).unwrap();
        let mut pixels = Vec::new();
        assert!(r.render(0, 0, &Camera::default(), &mut pixels).unwrap());
        assert_eq!(pixels.len(), 3);
    }
}
