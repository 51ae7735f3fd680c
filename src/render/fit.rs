//! Closed-form image fitting.
//!
//! The export path never relies on a sampler's implicit fitting: rendered
//! image dimensions are always computed explicitly from the natural size and
//! the destination box, so the geometry is identical at every output
//! resolution.

use kurbo::Rect;

use crate::compose::model::ImageFit;

/// Rendered width/height for an image of natural size `(nat_w, nat_h)` in a
/// box of `(box_w, box_h)`.
///
/// `contain` uses scale `min(box_w/nat_w, box_h/nat_h)`, `cover` uses the
/// `max`. Results are rounded to whole units. Degenerate inputs fall back to
/// the box itself.
pub fn size_for_fit(fit: ImageFit, nat_w: f64, nat_h: f64, box_w: f64, box_h: f64) -> (f64, f64) {
    if nat_w <= 0.0 || nat_h <= 0.0 || box_w <= 0.0 || box_h <= 0.0 {
        return (box_w, box_h);
    }
    let scale = match fit {
        ImageFit::Contain => (box_w / nat_w).min(box_h / nat_h),
        ImageFit::Cover => (box_w / nat_w).max(box_h / nat_h),
    };
    ((nat_w * scale).round(), (nat_h * scale).round())
}

/// The centered rectangle an image occupies inside `dst` under `fit`.
pub fn fitted_rect(fit: ImageFit, nat_w: f64, nat_h: f64, dst: Rect) -> Rect {
    let (w, h) = size_for_fit(fit, nat_w, nat_h, dst.width(), dst.height());
    let x = dst.x0 + (dst.width() - w) / 2.0;
    let y = dst.y0 + (dst.height() - h) / 2.0;
    Rect::new(x, y, x + w, y + h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contain_letterboxes_the_wide_image() {
        let (w, h) = size_for_fit(ImageFit::Contain, 1000.0, 500.0, 200.0, 200.0);
        assert_eq!((w, h), (200.0, 100.0));

        let r = fitted_rect(ImageFit::Contain, 1000.0, 500.0, Rect::new(0.0, 0.0, 200.0, 200.0));
        assert_eq!(r, Rect::new(0.0, 50.0, 200.0, 150.0));
    }

    #[test]
    fn cover_crops_the_wide_image() {
        let (w, h) = size_for_fit(ImageFit::Cover, 1000.0, 500.0, 200.0, 200.0);
        assert_eq!((w, h), (400.0, 200.0));

        let r = fitted_rect(ImageFit::Cover, 1000.0, 500.0, Rect::new(0.0, 0.0, 200.0, 200.0));
        assert_eq!(r.x0, -100.0);
        assert_eq!(r.width(), 400.0);
    }

    #[test]
    fn exact_fit_is_identity() {
        for fit in [ImageFit::Contain, ImageFit::Cover] {
            let (w, h) = size_for_fit(fit, 300.0, 450.0, 300.0, 450.0);
            assert_eq!((w, h), (300.0, 450.0));
        }
    }

    #[test]
    fn degenerate_inputs_fall_back_to_the_box() {
        let (w, h) = size_for_fit(ImageFit::Cover, 0.0, 0.0, 120.0, 80.0);
        assert_eq!((w, h), (120.0, 80.0));
    }
}
