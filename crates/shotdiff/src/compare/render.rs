use image::{Rgba, RgbaImage};

use super::yiq::{self, MAX_DELTA};
use super::{ColorScheme, DiffMask};

/// Content present in the baseline is gone.
pub const REMOVED: Rgba<u8> = Rgba([0, 255, 0, 255]);
/// Content appeared in the current capture.
pub const ADDED: Rgba<u8> = Rgba([255, 0, 0, 255]);
/// Flagged, but probably imperceptible.
pub const NOISE: Rgba<u8> = Rgba([255, 255, 0, 255]);

/// Below this summed RGB distance, measured after compositing over white,
/// a flagged pixel is drawn as noise.
const NOISE_CHANNEL_SUM: f64 = 30.0;

/// Colour every flagged pixel of `mask`. Unflagged pixels stay transparent.
///
/// The directional scheme treats the darker side as content. On dark-mode
/// pages that reads backwards.
pub fn render(
    baseline: &RgbaImage,
    current: &RgbaImage,
    mut mask: DiffMask,
    scheme: ColorScheme,
) -> DiffMask {
    let (width, height) = mask.dimensions();
    for y in 0..height {
        for x in 0..width {
            if !mask.is_marked(x, y) {
                continue;
            }
            let b = baseline.get_pixel(x, y);
            let c = current.get_pixel(x, y);
            let color = match scheme {
                ColorScheme::SingleToneRed => ADDED,
                ColorScheme::TwoToneDirectional => directional(b, c),
                ColorScheme::Heatmap => heat(b, c),
            };
            mask.paint(x, y, color);
        }
    }
    mask
}

fn directional(b: &Rgba<u8>, c: &Rgba<u8>) -> Rgba<u8> {
    let (br, bg, bb) = yiq::blended(b);
    let (cr, cg, cb) = yiq::blended(c);
    let channel_sum = (br - cr).abs() + (bg - cg).abs() + (bb - cb).abs();
    if channel_sum < NOISE_CHANNEL_SUM {
        return NOISE;
    }
    if yiq::brightness(b) < yiq::brightness(c) {
        REMOVED
    } else {
        ADDED
    }
}

fn heat(b: &Rgba<u8>, c: &Rgba<u8>) -> Rgba<u8> {
    let t = (yiq::delta(b, c).abs() / MAX_DELTA).sqrt().clamp(0.0, 1.0);
    let g = (255.0 * (1.0 - t)).round() as u8;
    Rgba([255, g, 0, 255])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{CompareOptions, classify};

    const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

    fn single(b: Rgba<u8>, c: Rgba<u8>, scheme: ColorScheme) -> Rgba<u8> {
        let baseline = RgbaImage::from_pixel(1, 1, b);
        let current = RgbaImage::from_pixel(1, 1, c);
        let mut mask = DiffMask::empty(1, 1);
        mask.mark(0, 0);
        *render(&baseline, &current, mask, scheme)
            .as_image()
            .get_pixel(0, 0)
    }

    #[test]
    fn darker_baseline_renders_removed() {
        let c = single(
            Rgba([10, 10, 10, 255]),
            Rgba([250, 250, 250, 255]),
            ColorScheme::TwoToneDirectional,
        );
        assert_eq!(c, REMOVED);
    }

    #[test]
    fn darker_current_renders_added() {
        let c = single(
            Rgba([250, 250, 250, 255]),
            Rgba([10, 10, 10, 255]),
            ColorScheme::TwoToneDirectional,
        );
        assert_eq!(c, ADDED);
    }

    #[test]
    fn subtle_difference_renders_noise() {
        let c = single(
            Rgba([100, 100, 100, 255]),
            Rgba([110, 110, 109, 255]),
            ColorScheme::TwoToneDirectional,
        );
        assert_eq!(c, NOISE);
    }

    #[test]
    fn vanished_opaque_pixel_renders_removed() {
        let c = single(
            Rgba([0, 0, 0, 255]),
            Rgba([0, 0, 0, 0]),
            ColorScheme::TwoToneDirectional,
        );
        assert_eq!(c, REMOVED);
    }

    #[test]
    fn alpha_only_change_is_classified_and_coloured_consistently() {
        let baseline = RgbaImage::from_pixel(3, 3, Rgba([0, 0, 0, 255]));
        let mut current = baseline.clone();
        current.put_pixel(1, 1, Rgba([0, 0, 0, 0]));
        let (n, mask) = classify(&baseline, &current, &CompareOptions::default()).unwrap();
        assert_eq!(n, 1);
        let out = render(&baseline, &current, mask, ColorScheme::TwoToneDirectional);
        assert_eq!(out.as_image().get_pixel(1, 1), &REMOVED);
    }

    #[test]
    fn faint_translucent_change_renders_noise() {
        let c = single(
            Rgba([0, 0, 0, 10]),
            Rgba([0, 0, 0, 14]),
            ColorScheme::TwoToneDirectional,
        );
        assert_eq!(c, NOISE);
    }

    #[test]
    fn single_tone_is_always_red() {
        let c = single(
            Rgba([10, 10, 10, 255]),
            Rgba([250, 250, 250, 255]),
            ColorScheme::SingleToneRed,
        );
        assert_eq!(c, ADDED);
    }

    #[test]
    fn heatmap_runs_yellow_to_red() {
        let faint = single(
            Rgba([120, 120, 120, 255]),
            Rgba([140, 140, 140, 255]),
            ColorScheme::Heatmap,
        );
        let strong = single(
            Rgba([0, 0, 0, 255]),
            Rgba([255, 255, 255, 255]),
            ColorScheme::Heatmap,
        );
        assert_eq!(faint[0], 255);
        assert_eq!(strong[0], 255);
        assert!(faint[1] > strong[1], "{faint:?} vs {strong:?}");
        assert!(strong[1] < 20);
    }

    #[test]
    fn unmarked_pixels_stay_transparent() {
        let baseline = RgbaImage::from_pixel(3, 1, Rgba([0, 0, 0, 255]));
        let current = RgbaImage::from_pixel(3, 1, Rgba([255, 255, 255, 255]));
        let mut mask = DiffMask::empty(3, 1);
        mask.mark(1, 0);
        let out = render(&baseline, &current, mask, ColorScheme::TwoToneDirectional);
        assert_eq!(out.as_image().get_pixel(0, 0), &TRANSPARENT);
        assert_eq!(out.as_image().get_pixel(1, 0), &REMOVED);
        assert_eq!(out.as_image().get_pixel(2, 0), &TRANSPARENT);
        assert_eq!(out.marked_count(), 1);
    }
}
