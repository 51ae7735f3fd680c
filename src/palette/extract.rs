//! Median-cut palette extraction.
//!
//! Pixels are sampled sparsely, near-white and transparent samples are
//! discarded, and the remainder is quantized by recursive median cut. The
//! resulting swatches are ordered by cluster population, so the first entry
//! is the image's dominant tone.

use anyhow::Context as _;

use crate::foundation::error::{PosterError, PosterResult};
use crate::style::color::Rgba;

/// Number of swatches the poster uses.
pub const PALETTE_SIZE: usize = 5;

/// Palette used whenever extraction fails: five warm neutral tones.
pub const FALLBACK_PALETTE: [Rgba; PALETTE_SIZE] = [
    Rgba::rgb(0xd9, 0xcf, 0xc2),
    Rgba::rgb(0xb8, 0xa9, 0x9a),
    Rgba::rgb(0x8f, 0x7f, 0x70),
    Rgba::rgb(0x66, 0x5a, 0x4f),
    Rgba::rgb(0x3f, 0x36, 0x2f),
];

/// Every Nth pixel is considered.
const SAMPLE_STEP: usize = 10;
/// Samples more transparent than this are ignored.
const MIN_ALPHA: u8 = 125;
/// Channel floor above which a sample counts as near-white and is ignored.
const WHITE_CUTOFF: u8 = 250;

/// Decode image bytes and extract up to `count` representative colors.
///
/// Fails only on undecodable input or when no usable pixels remain; use
/// [`extract_from_url`] for the never-failing variant.
pub fn extract_from_bytes(bytes: &[u8], count: usize) -> PosterResult<Vec<Rgba>> {
    let image = image::load_from_memory(bytes).context("decode artwork for palette")?;
    let rgba = image.to_rgba8();

    let mut samples = Vec::with_capacity(rgba.pixels().len() / SAMPLE_STEP + 1);
    for px in rgba.pixels().step_by(SAMPLE_STEP) {
        let [r, g, b, a] = px.0;
        if a < MIN_ALPHA {
            continue;
        }
        if r > WHITE_CUTOFF && g > WHITE_CUTOFF && b > WHITE_CUTOFF {
            continue;
        }
        samples.push([r, g, b]);
    }

    if samples.is_empty() {
        return Err(PosterError::validation(
            "no usable pixels for palette extraction",
        ));
    }

    Ok(median_cut(samples, count))
}

/// Fetch an artwork location and extract a palette, degrading to
/// [`FALLBACK_PALETTE`] on any failure so rendering never blocks on palette
/// availability.
pub async fn extract_from_url(http: &reqwest::Client, url: &str, count: usize) -> Vec<Rgba> {
    match crate::catalog::client::fetch_artwork_bytes(http, url).await {
        Ok(bytes) => match extract_from_bytes(&bytes, count) {
            Ok(palette) => palette,
            Err(err) => {
                tracing::warn!(%url, %err, "palette extraction failed, using fallback");
                FALLBACK_PALETTE[..count.min(PALETTE_SIZE)].to_vec()
            }
        },
        Err(err) => {
            tracing::warn!(%url, %err, "artwork fetch failed, using fallback palette");
            FALLBACK_PALETTE[..count.min(PALETTE_SIZE)].to_vec()
        }
    }
}

struct ColorBox {
    samples: Vec<[u8; 3]>,
}

impl ColorBox {
    /// Index and width of the channel with the widest spread.
    fn widest_channel(&self) -> (usize, u8) {
        let mut min = [u8::MAX; 3];
        let mut max = [u8::MIN; 3];
        for s in &self.samples {
            for c in 0..3 {
                min[c] = min[c].min(s[c]);
                max[c] = max[c].max(s[c]);
            }
        }
        (0..3)
            .map(|c| (c, max[c] - min[c]))
            .max_by_key(|&(_, range)| range)
            .unwrap_or((0, 0))
    }

    fn split(mut self) -> (ColorBox, ColorBox) {
        let (channel, _) = self.widest_channel();
        self.samples.sort_unstable_by_key(|s| s[channel]);
        let mid = self.samples.len() / 2;
        let right = self.samples.split_off(mid);
        (ColorBox { samples: self.samples }, ColorBox { samples: right })
    }

    fn average(&self) -> Rgba {
        let n = self.samples.len().max(1) as u64;
        let mut sum = [0u64; 3];
        for s in &self.samples {
            for c in 0..3 {
                sum[c] += u64::from(s[c]);
            }
        }
        Rgba::rgb(
            (sum[0] / n) as u8,
            (sum[1] / n) as u8,
            (sum[2] / n) as u8,
        )
    }
}

fn median_cut(samples: Vec<[u8; 3]>, count: usize) -> Vec<Rgba> {
    let count = count.max(1);
    let mut boxes = vec![ColorBox { samples }];

    while boxes.len() < count {
        // Split the most populous box that still has spread.
        let candidate = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.samples.len() > 1 && b.widest_channel().1 > 0)
            .max_by_key(|(_, b)| b.samples.len())
            .map(|(i, _)| i);
        let Some(idx) = candidate else {
            break;
        };
        let (a, b) = boxes.swap_remove(idx).split();
        boxes.push(a);
        boxes.push(b);
    }

    boxes.sort_by_key(|b| std::cmp::Reverse(b.samples.len()));
    boxes.truncate(count);
    boxes.iter().map(ColorBox::average).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_png(pixels: &[[u8; 4]], width: u32, height: u32) -> Vec<u8> {
        let mut raw = Vec::with_capacity(pixels.len() * 4);
        for p in pixels {
            raw.extend_from_slice(p);
        }
        let img = image::RgbaImage::from_raw(width, height, raw).unwrap();
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn dominant_color_comes_first() {
        // 3/4 red, 1/4 blue.
        let mut pixels = vec![[200u8, 30, 30, 255]; 1200];
        pixels.extend(vec![[30u8, 30, 200, 255]; 400]);
        let png = encode_png(&pixels, 40, 40);

        let palette = extract_from_bytes(&png, 4).unwrap();
        assert!(palette.len() >= 2);
        assert!(palette[0].r > palette[0].b, "dominant swatch should be red");
        assert!(
            palette.iter().any(|c| c.b > 150 && c.r < 100),
            "a blue swatch should survive"
        );
    }

    #[test]
    fn white_and_transparent_pixels_are_ignored() {
        let mut pixels = vec![[255u8, 255, 255, 255]; 1500];
        pixels.extend(vec![[10u8, 200, 10, 50]; 50]);
        pixels.extend(vec![[60u8, 90, 160, 255]; 50]);
        let png = encode_png(&pixels, 40, 40);

        let palette = extract_from_bytes(&png, 3).unwrap();
        // Only the opaque blue-ish samples survive the filters.
        for c in &palette {
            assert!(c.b > c.r);
        }
    }

    #[test]
    fn undecodable_bytes_error() {
        assert!(extract_from_bytes(b"not an image", PALETTE_SIZE).is_err());
    }

    #[test]
    fn fully_white_image_errors_instead_of_inventing_colors() {
        let pixels = vec![[255u8, 255, 255, 255]; 1600];
        let png = encode_png(&pixels, 40, 40);
        assert!(extract_from_bytes(&png, PALETTE_SIZE).is_err());
    }

    #[tokio::test]
    async fn unreachable_url_resolves_to_fallback() {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(300))
            .build()
            .unwrap();
        let palette =
            extract_from_url(&http, "http://127.0.0.1:1/poster.jpg", PALETTE_SIZE).await;
        assert_eq!(palette, FALLBACK_PALETTE.to_vec());
    }
}
