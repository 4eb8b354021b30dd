//! Per-pixel conversion and comparison tables.
//!
//! Both tables are plain `fn` pointers selected by a `match` on the format
//! pair, so they are stateless and can be shared freely across threads.

use crate::pixel::PixelFormat;

/// Converts one source pixel into one destination pixel.
pub type Converter = fn(&[u8], &mut [u8]);

/// Returns the signed per-channel difference of largest magnitude between
/// two pixels of the same format.
pub type Comparator = fn(&[u8], &[u8]) -> i32;

fn copy1(from: &[u8], to: &mut [u8]) {
    to[0] = from[0];
}

fn copy3(from: &[u8], to: &mut [u8]) {
    to[..3].copy_from_slice(&from[..3]);
}

fn copy4(from: &[u8], to: &mut [u8]) {
    to[..4].copy_from_slice(&from[..4]);
}

/// Same channel order, opaque alpha appended.
fn expand3(from: &[u8], to: &mut [u8]) {
    to[..3].copy_from_slice(&from[..3]);
    to[3] = 255;
}

/// BGR <-> RGB, alpha dropped if present.
fn swap3(from: &[u8], to: &mut [u8]) {
    to[0] = from[2];
    to[1] = from[1];
    to[2] = from[0];
}

fn swap3_expand(from: &[u8], to: &mut [u8]) {
    swap3(from, to);
    to[3] = 255;
}

fn swap4(from: &[u8], to: &mut [u8]) {
    swap3(from, to);
    to[3] = from[3];
}

fn gray_to3(from: &[u8], to: &mut [u8]) {
    to[..3].fill(from[0]);
}

fn gray_to4(from: &[u8], to: &mut [u8]) {
    to[..3].fill(from[0]);
    to[3] = 255;
}

/// Plain channel average; channel order does not matter.
fn to_gray(from: &[u8], to: &mut [u8]) {
    let sum = u16::from(from[0]) + u16::from(from[1]) + u16::from(from[2]);
    to[0] = (sum / 3) as u8;
}

/// Look up the converter for a `(from, to)` pair.
///
/// # Panics
///
/// Panics if either format is [`PixelFormat::Auto`].
pub fn converter(from: PixelFormat, to: PixelFormat) -> Converter {
    use PixelFormat::*;
    match (from, to) {
        (Auto, _) | (_, Auto) => {
            panic!("no pixel converter for {from:?} -> {to:?}: Auto is not a concrete format")
        }
        (Gray8, Gray8) => copy1,
        (Gray8, Bgr8 | Rgb8) => gray_to3,
        (Gray8, Bgra8 | Rgba8) => gray_to4,

        (Bgr8 | Bgra8 | Rgb8 | Rgba8, Gray8) => to_gray,

        (Bgr8, Bgr8) | (Rgb8, Rgb8) => copy3,
        (Bgra8, Bgr8) | (Rgba8, Rgb8) => copy3,
        (Bgra8, Bgra8) | (Rgba8, Rgba8) => copy4,
        (Bgr8, Bgra8) | (Rgb8, Rgba8) => expand3,

        (Bgr8 | Bgra8, Rgb8) | (Rgb8 | Rgba8, Bgr8) => swap3,
        (Bgr8, Rgba8) | (Rgb8, Bgra8) => swap3_expand,
        (Bgra8, Rgba8) | (Rgba8, Bgra8) => swap4,
    }
}

fn max_delta<const N: usize>(a: &[u8], b: &[u8]) -> i32 {
    let mut cmp = 0i32;
    for (&x, &y) in a[..N].iter().zip(&b[..N]) {
        let c = i32::from(x) - i32::from(y);
        if c.abs() > cmp.abs() {
            cmp = c;
        }
    }
    cmp
}

/// Look up the comparator for pixels stored in `format`.
///
/// # Panics
///
/// Panics if `format` is [`PixelFormat::Auto`].
pub fn comparator(format: PixelFormat) -> Comparator {
    match format {
        PixelFormat::Auto => panic!("no pixel comparator for Auto"),
        PixelFormat::Gray8 => max_delta::<1>,
        PixelFormat::Bgr8 | PixelFormat::Rgb8 => max_delta::<3>,
        PixelFormat::Bgra8 | PixelFormat::Rgba8 => max_delta::<4>,
    }
}

/// Convert a run of packed pixels from `from` to `to`.
///
/// Converts `min(src.len() / from_bpp, dst.len() / to_bpp)` pixels.
pub fn convert_row(src: &[u8], from: PixelFormat, dst: &mut [u8], to: PixelFormat) {
    if from == to {
        let n = src.len().min(dst.len());
        dst[..n].copy_from_slice(&src[..n]);
        return;
    }
    let cvt = converter(from, to);
    for (s, d) in src
        .chunks_exact(from.bytes_per_pixel())
        .zip(dst.chunks_exact_mut(to.bytes_per_pixel()))
    {
        cvt(s, d);
    }
}
