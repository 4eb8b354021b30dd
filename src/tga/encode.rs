//! TGA encoder: true-color (data types 2/10) and grayscale (3/11).

use std::io::Write;

use enough::Stop;

use super::{TgaHeader, rle};
use crate::buffer::Image;
use crate::convert::convert_row;
use crate::error::ImageError;
use crate::pixel::PixelFormat;

/// The stored layout for a requested pixel format.
pub(crate) fn stored_format(requested: PixelFormat) -> PixelFormat {
    match requested {
        PixelFormat::Gray8 => PixelFormat::Gray8,
        f if f.has_alpha() => PixelFormat::Bgra8,
        _ => PixelFormat::Bgr8,
    }
}

pub(crate) fn encode_tga<W: Write + ?Sized>(
    image: &Image,
    requested: PixelFormat,
    rle_tolerance: Option<u8>,
    out: &mut W,
    stop: &dyn Stop,
) -> Result<(), ImageError> {
    let target = stored_format(requested.or(image.format()));
    let (width, height) = (image.width(), image.height());
    let too_large = || ImageError::DimensionsTooLarge { width, height };
    let w16 = u16::try_from(width).map_err(|_| too_large())?;
    let h16 = u16::try_from(height).map_err(|_| too_large())?;

    let gray = target == PixelFormat::Gray8;
    let header = TgaHeader {
        data_type: match (gray, rle_tolerance.is_some()) {
            (true, false) => 3,
            (true, true) => 11,
            (false, false) => 2,
            (false, true) => 10,
        },
        width: w16,
        height: h16,
        bpp: target.bits_per_pixel() as u8,
        // alpha bits per pixel; origin bottom-left
        attributes: if target.has_alpha() { 8 } else { 0 },
        ..TgaHeader::default()
    };
    stop.check()?;
    out.write_all(&header.to_bytes())?;

    match rle_tolerance {
        Some(tolerance) => rle::encode_packets(image, target, tolerance, out, stop),
        None => {
            let mut row = vec![0u8; width as usize * target.bytes_per_pixel()];
            for y in (0..height).rev() {
                if y % 16 == 0 {
                    stop.check()?;
                }
                convert_row(image.line(y), image.format(), &mut row, target);
                out.write_all(&row)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enough::Unstoppable;

    #[test]
    fn stored_formats() {
        assert_eq!(stored_format(PixelFormat::Gray8), PixelFormat::Gray8);
        assert_eq!(stored_format(PixelFormat::Rgb8), PixelFormat::Bgr8);
        assert_eq!(stored_format(PixelFormat::Bgr8), PixelFormat::Bgr8);
        assert_eq!(stored_format(PixelFormat::Rgba8), PixelFormat::Bgra8);
        assert_eq!(stored_format(PixelFormat::Bgra8), PixelFormat::Bgra8);
    }

    #[test]
    fn raw_header_and_rows() {
        let image = Image::from_raw(2, 2, PixelFormat::Gray8, vec![1, 2, 3, 4]).unwrap();
        let mut out = Vec::new();
        encode_tga(&image, PixelFormat::Auto, None, &mut out, &Unstoppable).unwrap();
        assert_eq!(out.len(), 18 + 4);
        assert_eq!(out[2], 3);
        assert_eq!(out[16], 8);
        assert_eq!(out[17], 0);
        assert_eq!(&out[18..], &[3, 4, 1, 2]);
    }

    #[test]
    fn rle_alpha_header() {
        let image = Image::with_format(3, 1, PixelFormat::Rgba8);
        let mut out = Vec::new();
        encode_tga(&image, PixelFormat::Auto, Some(0), &mut out, &Unstoppable).unwrap();
        assert_eq!(out[2], 10);
        assert_eq!(out[16], 32);
        assert_eq!(out[17], 8);
        assert_eq!(&out[18..], &[0x82, 0, 0, 0, 0]);
    }

    #[test]
    fn rejects_oversized() {
        let image = Image::with_format(70_000, 1, PixelFormat::Gray8);
        let mut out = Vec::new();
        assert!(matches!(
            encode_tga(&image, PixelFormat::Auto, None, &mut out, &Unstoppable),
            Err(ImageError::DimensionsTooLarge { .. })
        ));
    }
}
