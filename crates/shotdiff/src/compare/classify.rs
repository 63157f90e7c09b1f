use image::{Rgba, RgbaImage};
use tracing::trace;

use super::yiq::{self, MAX_DELTA};
use super::{CompareError, CompareOptions, DiffMask, check_dimensions};

/// Walk every pixel and flag the ones that differ beyond tolerance.
///
/// Returns the mismatch count and a mask whose alpha is set on each flagged
/// pixel. Fails with [`CompareError::DimensionMismatch`] before touching any
/// pixel when the sizes differ.
pub fn classify(
    baseline: &RgbaImage,
    current: &RgbaImage,
    options: &CompareOptions,
) -> Result<(u64, DiffMask), CompareError> {
    check_dimensions(baseline, current)?;
    options.validate()?;

    let (width, height) = baseline.dimensions();
    let mut mask = DiffMask::empty(width, height);
    if baseline.as_raw() == current.as_raw() {
        return Ok((0, mask));
    }

    let max_delta = MAX_DELTA * options.threshold * options.threshold;
    let alpha_tolerance = options.alpha * 255.0;
    let mut mismatched = 0u64;
    let mut aa_skipped = 0u64;

    for (x, y, b) in baseline.enumerate_pixels() {
        let c = current.get_pixel(x, y);
        if b == c || alpha_only_within(b, c, alpha_tolerance) {
            continue;
        }
        if yiq::delta(b, c).abs() <= max_delta {
            continue;
        }
        if !options.include_aa
            && (antialiased(baseline, x, y, current) || antialiased(current, x, y, baseline))
        {
            aa_skipped += 1;
            continue;
        }
        mask.mark(x, y);
        mismatched += 1;
    }

    trace!(mismatched, aa_skipped, "classified pixels");
    Ok((mismatched, mask))
}

fn alpha_only_within(a: &Rgba<u8>, b: &Rgba<u8>, tolerance: f64) -> bool {
    a.0[..3] == b.0[..3] && f64::from(a[3].abs_diff(b[3])) <= tolerance
}

/// Inclusive 3x3 neighbourhood bounds around `(x, y)`, clamped to the image.
fn neighbourhood(x: u32, y: u32, width: u32, height: u32) -> (u32, u32, u32, u32) {
    (
        x.saturating_sub(1),
        y.saturating_sub(1),
        (x + 1).min(width - 1),
        (y + 1).min(height - 1),
    )
}

fn on_border(x: u32, y: u32, width: u32, height: u32) -> bool {
    x == 0 || y == 0 || x == width - 1 || y == height - 1
}

/// Whether the pixel at `(x, y)` of `img` looks like anti-aliasing, using
/// `other` to confirm the neighbouring edge exists in both images.
///
/// Anti-aliased pixel and intensity slope detector (V. Vysniauskas, 2009):
/// an AA pixel sits between a darker and a brighter neighbour, and at least
/// one of those extremes is part of a flat region in both images.
fn antialiased(img: &RgbaImage, x: u32, y: u32, other: &RgbaImage) -> bool {
    let (width, height) = img.dimensions();
    let (x0, y0, x1, y1) = neighbourhood(x, y, width, height);
    let center = img.get_pixel(x, y);

    let mut zeroes: u8 = u8::from(on_border(x, y, width, height));
    let (mut min, mut max) = (0.0, 0.0);
    let (mut min_at, mut max_at) = ((0, 0), (0, 0));

    for nx in x0..=x1 {
        for ny in y0..=y1 {
            if nx == x && ny == y {
                continue;
            }
            let d = yiq::brightness_delta(center, img.get_pixel(nx, ny));
            if d == 0.0 {
                zeroes += 1;
                // More than two identical neighbours: flat area, not an edge.
                if zeroes > 2 {
                    return false;
                }
            } else if d < min {
                min = d;
                min_at = (nx, ny);
            } else if d > max {
                max = d;
                max_at = (nx, ny);
            }
        }
    }

    if min == 0.0 || max == 0.0 {
        return false;
    }

    (has_many_siblings(img, min_at) && has_many_siblings(other, min_at))
        || (has_many_siblings(img, max_at) && has_many_siblings(other, max_at))
}

/// Whether the pixel has three or more identical neighbours.
fn has_many_siblings(img: &RgbaImage, (x, y): (u32, u32)) -> bool {
    let (width, height) = img.dimensions();
    let (x0, y0, x1, y1) = neighbourhood(x, y, width, height);
    let center = img.get_pixel(x, y);

    let mut zeroes: u8 = u8::from(on_border(x, y, width, height));
    for nx in x0..=x1 {
        for ny in y0..=y1 {
            if nx == x && ny == y {
                continue;
            }
            if img.get_pixel(nx, ny) == center {
                zeroes += 1;
            }
            if zeroes > 2 {
                return true;
            }
        }
    }
    false
}
