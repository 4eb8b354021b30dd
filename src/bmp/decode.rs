//! BMP decoder: uncompressed (`BI_RGB`) 24-bit and 32-bit bitmaps.

use std::io::{Read, Seek};

use enough::Stop;

use crate::buffer::Image;
use crate::convert::convert_row;
use crate::error::ImageError;
use crate::limits::{Limits, check_limits};
use crate::pixel::PixelFormat;
use crate::stream::{Rewind, le_i32, le_u16, le_u32};

pub(crate) const FILE_HEADER_LEN: u32 = 14;
pub(crate) const INFO_HEADER_LEN: u32 = 40;
const BI_RGB: u32 = 0;

// ── Header ──────────────────────────────────────────────────────────

/// The fields of BITMAPFILEHEADER + BITMAPINFOHEADER the decoder needs.
#[derive(Clone, Debug)]
pub(crate) struct BmpHeader {
    pub data_offset: u32,
    pub info_size: u32,
    pub width: u32,
    pub height: u32,
    /// Negative height on disk: first stored row is the top row.
    pub top_down: bool,
    pub bit_count: u16,
    pub colors_used: u32,
}

impl BmpHeader {
    pub(crate) fn native_format(&self) -> PixelFormat {
        if self.bit_count == 32 {
            PixelFormat::Bgra8
        } else {
            PixelFormat::Bgr8
        }
    }

    /// Pixel bytes per row, without padding.
    fn row_bytes(&self) -> usize {
        self.width as usize * self.native_format().bytes_per_pixel()
    }

    /// Stored bytes per row, padded to a multiple of 4.
    fn row_stride(&self) -> usize {
        (self.row_bytes() + 3) & !3
    }
}

/// Parse and validate the headers at the current stream position.
pub(crate) fn read_header<R: Read + Seek + ?Sized>(
    rd: &mut Rewind<'_, R>,
) -> Result<BmpHeader, ImageError> {
    let magic = rd.read_magic::<2>()?;
    if &magic != b"BM" {
        return Err(ImageError::UnrecognizedFormat);
    }

    // bfSize(4) bfReserved(4) bfOffBits(4)
    let file = rd.read_array::<12>()?;
    let data_offset = le_u32(&file, 8);

    let info = rd.read_array::<{ INFO_HEADER_LEN as usize }>()?;
    let info_size = le_u32(&info, 0);
    if info_size < INFO_HEADER_LEN {
        return Err(ImageError::UnsupportedVariant(format!(
            "BMP info header of {info_size} bytes"
        )));
    }

    let width = le_i32(&info, 4);
    let height = le_i32(&info, 8);
    let bit_count = le_u16(&info, 14);
    let compression = le_u32(&info, 16);
    let colors_used = le_u32(&info, 32);

    match bit_count {
        24 | 32 => {}
        1 | 4 | 8 | 16 => {
            return Err(ImageError::UnsupportedVariant(format!(
                "{bit_count}-bit BMP"
            )));
        }
        other => {
            return Err(ImageError::InvalidHeader(format!(
                "invalid BMP bit count {other}"
            )));
        }
    }

    if width <= 0 || height == 0 || height == i32::MIN {
        return Err(ImageError::InvalidHeader(format!(
            "invalid BMP dimensions {width}x{height}"
        )));
    }

    if compression != BI_RGB {
        return Err(ImageError::UnsupportedVariant(format!(
            "BMP compression {compression}"
        )));
    }

    Ok(BmpHeader {
        data_offset,
        info_size,
        width: width as u32,
        height: height.unsigned_abs(),
        top_down: height < 0,
        bit_count,
        colors_used,
    })
}

// ── Pixels ──────────────────────────────────────────────────────────

/// Decode the bitmap the guard is positioned on into a fresh image.
pub(crate) fn decode_bmp<R: Read + Seek + ?Sized>(
    rd: &mut Rewind<'_, R>,
    requested: PixelFormat,
    limits: Option<&Limits>,
    stop: &dyn Stop,
) -> Result<Image, ImageError> {
    let header = read_header(rd)?;
    let native = header.native_format();
    let format = requested.or(native);
    check_limits(limits, header.width, header.height, format.bytes_per_pixel())?;
    stop.check()?;

    // The palette after the info header carries no pixels at 24/32 bpp,
    // but a declared one must still be present.
    rd.seek_from_start(u64::from(FILE_HEADER_LEN) + u64::from(header.info_size))?;
    rd.skip(u64::from(header.colors_used) * 4)?;
    let headers_end = rd.consumed()?;
    if u64::from(header.data_offset) < headers_end {
        return Err(ImageError::InvalidData(format!(
            "BMP pixel data offset {} overlaps the {headers_end}-byte headers",
            header.data_offset
        )));
    }

    let row_bytes = header.row_bytes();
    let row_stride = header.row_stride();
    let h = header.height;

    // The last row may omit its padding.
    let needed = (row_stride as u64)
        .checked_mul(u64::from(h - 1))
        .and_then(|n| n.checked_add(row_bytes as u64))
        .ok_or(ImageError::DimensionsTooLarge {
            width: header.width,
            height: h,
        })?;
    rd.seek_from_start(u64::from(header.data_offset))?;
    if rd.remaining()? < needed {
        return Err(ImageError::UnexpectedEof);
    }

    let mut image = Image::with_format(header.width, h, format);
    let mut row = vec![0u8; row_stride];
    for i in 0..h {
        if i % 16 == 0 {
            stop.check()?;
        }
        let stored = if i + 1 == h { &mut row[..row_bytes] } else { &mut row[..] };
        rd.read_full(stored)?;
        let y = if header.top_down { i } else { h - 1 - i };
        convert_row(&row[..row_bytes], native, image.line_mut(y), format);
    }
    Ok(image)
}
