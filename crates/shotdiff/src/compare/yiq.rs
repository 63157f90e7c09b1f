//! Perceptual colour distance in YIQ space (Kotsarenko & Ramos, "Measuring
//! perceived color difference using YIQ NTSC transmission color space in
//! mobile applications").

use image::Rgba;

/// Largest value [`delta`] can return for opaque 8-bit colours.
pub(crate) const MAX_DELTA: f64 = 35215.0;

/// Squared perceptual distance between two pixels.
///
/// The sign encodes direction: negative when `b` is darker than `a`.
pub(crate) fn delta(a: &Rgba<u8>, b: &Rgba<u8>) -> f64 {
    if a == b {
        return 0.0;
    }
    let (r1, g1, b1) = blended(a);
    let (r2, g2, b2) = blended(b);

    let y1 = rgb2y(r1, g1, b1);
    let y2 = rgb2y(r2, g2, b2);
    let y = y1 - y2;
    let i = rgb2i(r1, g1, b1) - rgb2i(r2, g2, b2);
    let q = rgb2q(r1, g1, b1) - rgb2q(r2, g2, b2);

    let d = 0.5053 * y * y + 0.299 * i * i + 0.1957 * q * q;
    if y1 > y2 { -d } else { d }
}

/// Brightness difference only (`a` minus `b`).
pub(crate) fn brightness_delta(a: &Rgba<u8>, b: &Rgba<u8>) -> f64 {
    if a == b {
        return 0.0;
    }
    brightness(a) - brightness(b)
}

/// Luma of a pixel composited over white.
pub(crate) fn brightness(p: &Rgba<u8>) -> f64 {
    let (r, g, b) = blended(p);
    rgb2y(r, g, b)
}

/// RGB of a pixel composited over white.
pub(crate) fn blended(p: &Rgba<u8>) -> (f64, f64, f64) {
    let [r, g, b, a] = p.0;
    let (r, g, b) = (f64::from(r), f64::from(g), f64::from(b));
    if a == 255 {
        return (r, g, b);
    }
    let a = f64::from(a) / 255.0;
    (blend(r, a), blend(g, a), blend(b, a))
}

fn blend(c: f64, a: f64) -> f64 {
    255.0 + (c - 255.0) * a
}

fn rgb2y(r: f64, g: f64, b: f64) -> f64 {
    r * 0.29889531 + g * 0.58662247 + b * 0.11448223
}

fn rgb2i(r: f64, g: f64, b: f64) -> f64 {
    r * 0.59597799 - g * 0.27417610 - b * 0.32180189
}

fn rgb2q(r: f64, g: f64, b: f64) -> f64 {
    r * 0.21147017 - g * 0.52261711 + b * 0.31114694
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn black_to_white_is_close_to_max() {
        let d = delta(&Rgba([0, 0, 0, 255]), &Rgba([255, 255, 255, 255]));
        assert!(d > 0.0, "white is brighter, sign should be positive");
        assert!(d <= MAX_DELTA);
        assert!(d > MAX_DELTA * 0.9);
    }

    #[test]
    fn sign_flips_with_argument_order() {
        let a = Rgba([20, 40, 60, 255]);
        let b = Rgba([200, 180, 160, 255]);
        assert_eq!(delta(&a, &b), -delta(&b, &a));
    }

    #[test]
    fn translucent_black_blends_toward_white() {
        let (r, g, b) = blended(&Rgba([0, 0, 0, 51]));
        for channel in [r, g, b] {
            assert!((channel - 204.0).abs() < 1e-9, "{channel}");
        }
    }

    #[test]
    fn transparent_pixel_reads_as_white() {
        assert_eq!(brightness(&Rgba([0, 0, 0, 0])), brightness(&Rgba([255, 255, 255, 255])));
    }
}
