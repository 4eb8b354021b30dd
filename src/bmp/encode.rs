//! BMP encoder: uncompressed 24-bit and 32-bit BMP.

use std::io::Write;

use enough::Stop;

use super::decode::{FILE_HEADER_LEN, INFO_HEADER_LEN};
use crate::buffer::Image;
use crate::convert::convert_row;
use crate::error::ImageError;
use crate::pixel::PixelFormat;

/// The stored layout for a requested pixel format: BGRA when it carries
/// alpha, BGR otherwise.
pub(crate) fn stored_format(requested: PixelFormat) -> PixelFormat {
    if requested.has_alpha() {
        PixelFormat::Bgra8
    } else {
        PixelFormat::Bgr8
    }
}

/// Encode `image` as a bottom-up BMP.
pub(crate) fn encode_bmp<W: Write + ?Sized>(
    image: &Image,
    requested: PixelFormat,
    out: &mut W,
    stop: &dyn Stop,
) -> Result<(), ImageError> {
    let target = stored_format(requested.or(image.format()));
    let (width, height) = (image.width(), image.height());
    let too_large = ImageError::DimensionsTooLarge { width, height };

    if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
        return Err(too_large);
    }
    let row_bytes = (width as usize)
        .checked_mul(target.bytes_per_pixel())
        .ok_or(ImageError::DimensionsTooLarge { width, height })?;
    let row_stride = row_bytes
        .checked_add(3)
        .map(|r| r & !3)
        .ok_or(ImageError::DimensionsTooLarge { width, height })?;
    let pixel_data_size = row_stride
        .checked_mul(height as usize)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or(ImageError::DimensionsTooLarge { width, height })?;
    let file_size = pixel_data_size
        .checked_add(FILE_HEADER_LEN + INFO_HEADER_LEN)
        .ok_or(too_large)?;

    stop.check()?;
    out.write_all(&bmp_header(
        file_size,
        pixel_data_size,
        width,
        height,
        target.bits_per_pixel() as u16,
    ))?;

    // Padding bytes past `row_bytes` stay zero.
    let mut row = vec![0u8; row_stride];
    for y in (0..height).rev() {
        if y % 16 == 0 {
            stop.check()?;
        }
        convert_row(image.line(y), image.format(), &mut row[..row_bytes], target);
        out.write_all(&row)?;
    }
    Ok(())
}

fn bmp_header(
    file_size: u32,
    pixel_data_size: u32,
    width: u32,
    height: u32,
    bpp: u16,
) -> [u8; 54] {
    let mut out = [0u8; 54];

    // File header (14 bytes)
    out[0..2].copy_from_slice(b"BM");
    out[2..6].copy_from_slice(&file_size.to_le_bytes());
    // 6..10 reserved
    out[10..14].copy_from_slice(&(FILE_HEADER_LEN + INFO_HEADER_LEN).to_le_bytes());

    // DIB header (BITMAPINFOHEADER, 40 bytes)
    out[14..18].copy_from_slice(&INFO_HEADER_LEN.to_le_bytes());
    out[18..22].copy_from_slice(&(width as i32).to_le_bytes());
    out[22..26].copy_from_slice(&(height as i32).to_le_bytes()); // positive = bottom-up
    out[26..28].copy_from_slice(&1u16.to_le_bytes()); // planes
    out[28..30].copy_from_slice(&bpp.to_le_bytes());
    // 30..34 compression = BI_RGB
    out[34..38].copy_from_slice(&pixel_data_size.to_le_bytes());
    out[38..42].copy_from_slice(&2835u32.to_le_bytes()); // h resolution (72 DPI)
    out[42..46].copy_from_slice(&2835u32.to_le_bytes()); // v resolution
    // 46..54 colors used, important colors
    out
}
