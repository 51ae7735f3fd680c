//! Separable gaussian blur over premultiplied RGBA8 buffers.
//!
//! Used for the blurred-artwork background layer. Weights are fixed-point
//! Q16 so results are deterministic across platforms; rows are processed in
//! parallel.

use rayon::prelude::*;

use crate::foundation::error::{PosterError, PosterResult};

fn gaussian_kernel_q16(radius: u32, sigma: f64) -> PosterResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(PosterError::validation("blur sigma must be finite and > 0"));
    }

    let r = radius as i32;
    let denom = 2.0 * sigma * sigma;
    let mut weights = Vec::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    for i in -r..=r {
        let x = f64::from(i);
        let w = (-x * x / denom).exp();
        weights.push(w);
        sum += w;
    }

    let mut q16 = Vec::with_capacity(weights.len());
    let mut acc = 0u32;
    for w in &weights {
        let q = ((w / sum) * f64::from(1u32 << 16)).round() as u32;
        q16.push(q);
        acc += q;
    }
    // Nudge the center tap so the weights sum exactly to 1.0 in Q16.
    let center = q16.len() / 2;
    let target = 1u32 << 16;
    if acc > target {
        q16[center] = q16[center].saturating_sub(acc - target);
    } else {
        q16[center] += target - acc;
    }
    Ok(q16)
}

fn blur_pass_horizontal(src: &[u8], dst: &mut [u8], width: usize, kernel: &[u32]) {
    let r = (kernel.len() / 2) as i64;
    dst.par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            let src_row = &src[y * width * 4..(y + 1) * width * 4];
            for x in 0..width {
                let mut acc = [0u64; 4];
                for (k, &w) in kernel.iter().enumerate() {
                    let sx = (x as i64 + k as i64 - r).clamp(0, width as i64 - 1) as usize;
                    let px = &src_row[sx * 4..sx * 4 + 4];
                    for c in 0..4 {
                        acc[c] += u64::from(w) * u64::from(px[c]);
                    }
                }
                for c in 0..4 {
                    row[x * 4 + c] = ((acc[c] + (1 << 15)) >> 16) as u8;
                }
            }
        });
}

fn blur_pass_vertical(src: &[u8], dst: &mut [u8], width: usize, height: usize, kernel: &[u32]) {
    let r = (kernel.len() / 2) as i64;
    dst.par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width {
                let mut acc = [0u64; 4];
                for (k, &w) in kernel.iter().enumerate() {
                    let sy = (y as i64 + k as i64 - r).clamp(0, height as i64 - 1) as usize;
                    let px = &src[(sy * width + x) * 4..(sy * width + x) * 4 + 4];
                    for c in 0..4 {
                        acc[c] += u64::from(w) * u64::from(px[c]);
                    }
                }
                for c in 0..4 {
                    row[x * 4 + c] = ((acc[c] + (1 << 15)) >> 16) as u8;
                }
            }
        });
}

/// Gaussian-blur a premultiplied RGBA8 buffer in place.
///
/// `radius` is in pixels; sigma is derived as `radius / 2`.
pub fn gaussian_blur_rgba8_premul(
    pixels: &mut Vec<u8>,
    width: u32,
    height: u32,
    radius: u32,
) -> PosterResult<()> {
    let (w, h) = (width as usize, height as usize);
    if pixels.len() != w * h * 4 {
        return Err(PosterError::render("blur buffer size mismatch"));
    }
    if radius == 0 || w == 0 || h == 0 {
        return Ok(());
    }

    let kernel = gaussian_kernel_q16(radius, f64::from(radius) / 2.0)?;
    let mut tmp = vec![0u8; pixels.len()];
    blur_pass_horizontal(pixels, &mut tmp, w, &kernel);
    blur_pass_vertical(&tmp, pixels, w, h, &kernel);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_weights_sum_to_one() {
        for radius in [1u32, 4, 16, 44] {
            let k = gaussian_kernel_q16(radius, f64::from(radius) / 2.0).unwrap();
            assert_eq!(k.len(), (2 * radius + 1) as usize);
            assert_eq!(k.iter().sum::<u32>(), 1 << 16);
        }
    }

    #[test]
    fn uniform_buffer_is_unchanged() {
        let mut pixels = vec![120u8; 16 * 16 * 4];
        gaussian_blur_rgba8_premul(&mut pixels, 16, 16, 5).unwrap();
        for &b in &pixels {
            assert!((119..=121).contains(&b));
        }
    }

    #[test]
    fn hard_edge_is_softened() {
        // Left half black, right half white, opaque.
        let (w, h) = (32u32, 8u32);
        let mut pixels = Vec::new();
        for _y in 0..h {
            for x in 0..w {
                let v = if x < w / 2 { 0u8 } else { 255 };
                pixels.extend_from_slice(&[v, v, v, 255]);
            }
        }
        gaussian_blur_rgba8_premul(&mut pixels, w, h, 4).unwrap();
        // The pixel at the seam is now a mid-tone.
        let seam = ((w / 2) as usize) * 4;
        let v = pixels[seam];
        assert!(v > 40 && v < 215, "seam value {v} not blended");
    }

    #[test]
    fn zero_radius_is_a_no_op() {
        let mut pixels = vec![7u8; 4 * 4 * 4];
        let before = pixels.clone();
        gaussian_blur_rgba8_premul(&mut pixels, 4, 4, 0).unwrap();
        assert_eq!(pixels, before);
    }

    #[test]
    fn size_mismatch_is_rejected() {
        let mut pixels = vec![0u8; 10];
        assert!(gaussian_blur_rgba8_premul(&mut pixels, 4, 4, 2).is_err());
    }
}
