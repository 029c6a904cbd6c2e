use crate::common::unit_to_u8;
use crate::error::SplatError;
use crate::structures::{RenderOutput, Rgb8};
use rayon::prelude::*;
use zerocopy::IntoBytes;

/// Quantizes the backend's float planes into interleaved RGB bytes.
/// `pixels` is resized to `width * height * 3`.
pub fn to_rgb8(output: &RenderOutput, pixels: &mut Vec<u8>) -> Result<(), SplatError> {
    let n = output.width as usize * output.height as usize;
    for plane in [&output.r, &output.g, &output.b] {
        if plane.len() != n {
            return Err(SplatError::RenderOutputShape {
                expected: n,
                found: plane.len(),
            });
        }
    }

    let mut rgb = vec![Rgb8::default(); n];
    rgb.par_iter_mut()
        .zip(output.r.par_iter())
        .zip(output.g.par_iter())
        .zip(output.b.par_iter())
        .for_each(|(((px, &r), &g), &b)| {
            *px = Rgb8 {
                r: unit_to_u8(r),
                g: unit_to_u8(g),
                b: unit_to_u8(b),
            };
        });

    pixels.clear();
    pixels.extend_from_slice(rgb.as_bytes());
    Ok(())
}
