use image::RgbImage;
use std::path::Path;
use tracing::{debug, warn};

/// Stands in for the window: owns the last presented frame and the viewport
/// size the next frame should be rendered at.
pub struct DisplayContext {
    viewport: (u32, u32),
    texture: Option<RgbImage>,
    frames_presented: u64,
}

impl DisplayContext {
    pub fn new(width: u32, height: u32) -> Self {
        let mut display = DisplayContext {
            viewport: (1, 1),
            texture: None,
            frames_presented: 0,
        };
        display.set_viewport(width, height);
        display
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width.max(1), height.max(1));
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Replaces the displayed texture. A buffer that doesn't match the given size
    /// is dropped and the previous frame stays up.
    pub fn present(&mut self, width: u32, height: u32, pixels: &[u8]) {
        match RgbImage::from_raw(width, height, pixels.to_vec()) {
            Some(frame) => {
                self.texture = Some(frame);
                self.frames_presented += 1;
            }
            None => warn!(
                "Dropping frame: {} bytes for a {}x{} texture",
                pixels.len(),
                width,
                height
            ),
        }
    }

    pub fn texture(&self) -> Option<&RgbImage> {
        self.texture.as_ref()
    }

    /// Writes the current texture as PNG. Returns `Ok(false)` when nothing was presented yet.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<bool, image::ImageError> {
        let Some(frame) = &self.texture else {
            return Ok(false);
        };
        frame.save_with_format(path, image::ImageFormat::Png)?;
        Ok(true)
    }
}

impl Drop for DisplayContext {
    fn drop(&mut self) {
        debug!("Display closed after {} frames", self.frames_presented);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_at_least_one_pixel() {
        let mut display = DisplayContext::new(0, 0);
        assert_eq!(display.viewport(), (1, 1));
        display.set_viewport(320, 0);
        assert_eq!(display.viewport(), (320, 1));
    }

    #[test]
    fn test_mismatched_frame_keeps_previous() {
        let mut display = DisplayContext::new(2, 1);
        display.present(2, 1, &[1, 2, 3, 4, 5, 6]);
        display.present(2, 1, &[9, 9, 9]);
        assert_eq!(display.frames_presented(), 1);
        assert_eq!(display.texture().unwrap().as_raw(), &vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_save_png() {
        let mut display = DisplayContext::new(2, 2);
        let path = std::env::temp_dir().join(format!("splatview-display-{}.png", std::process::id()));
        assert!(!display.save_png(&path).unwrap());

        display.present(2, 2, &[255, 0, 0, 0, 255, 0, 0, 0, 255, 127, 127, 127]);
        assert!(display.save_png(&path).unwrap());
        let reloaded = image::open(&path).unwrap().to_rgb8();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(reloaded.dimensions(), (2, 2));
        assert_eq!(reloaded.get_pixel(1, 1).0, [127, 127, 127]);
        assert_eq!(reloaded.get_pixel(1, 0).0, [0, 255, 0]);
    }
}
