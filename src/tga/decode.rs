//! TGA pixel decoding: raw and RLE data over one linear pixel cursor.

use std::io::{Read, Seek};

use enough::Stop;

use super::{TgaHeader, read_header, rle};
use crate::buffer::Image;
use crate::convert::{Converter, converter};
use crate::error::ImageError;
use crate::limits::{Limits, check_limits};
use crate::pixel::PixelFormat;
use crate::stream::Rewind;

/// Unpack a 16-bit (5-5-5-1) pixel to BGRA. Components are shifted up by 3
/// bits; the attribute bit becomes alpha 0 or 128.
pub(crate) fn unpack_16(px: [u8; 2]) -> [u8; 4] {
    let b = px[0] & 0b1111_1000;
    let g = (px[0] & 0b0000_0111) << 5 | (px[1] & 0b1100_0000) >> 3;
    let r = (px[1] & 0b0011_1110) << 2;
    let a = (px[1] & 0b0000_0001) << 7;
    [b, g, r, a]
}

/// Writes stored pixels in file order: left to right, rows from the bottom
/// unless the origin is at the top. Packets may span rows.
pub(crate) struct LinearWriter<'a> {
    image: &'a mut Image,
    cvt: Converter,
    unpack16: bool,
    top_origin: bool,
    width: usize,
    index: usize,
    total: usize,
}

impl<'a> LinearWriter<'a> {
    fn new(image: &'a mut Image, header: &TgaHeader) -> Self {
        let width = image.width() as usize;
        let total = width * image.height() as usize;
        let cvt = converter(header.native_format(), image.format());
        Self {
            image,
            cvt,
            unpack16: header.bpp == 16,
            top_origin: header.origin_top(),
            width,
            index: 0,
            total,
        }
    }

    /// Pixels still to be written.
    pub(crate) fn remaining(&self) -> usize {
        self.total - self.index
    }

    pub(crate) fn is_full(&self) -> bool {
        self.index == self.total
    }

    /// Store one pixel in TGA byte layout at the cursor and advance it.
    pub(crate) fn put(&mut self, stored: &[u8]) {
        let unpacked;
        let src = if self.unpack16 {
            unpacked = unpack_16([stored[0], stored[1]]);
            &unpacked[..]
        } else {
            stored
        };

        let line = self.index / self.width;
        let x = (self.index % self.width) as u32;
        let y = if self.top_origin {
            line as u32
        } else {
            self.image.height() - 1 - line as u32
        };
        (self.cvt)(src, self.image.pixel_mut(x, y));
        self.index += 1;
    }
}

pub(crate) fn decode_tga<R: Read + Seek + ?Sized>(
    rd: &mut Rewind<'_, R>,
    requested: PixelFormat,
    limits: Option<&Limits>,
    stop: &dyn Stop,
) -> Result<Image, ImageError> {
    let header = read_header(rd)?;
    let format = requested.or(header.native_format());
    let (width, height) = (u32::from(header.width), u32::from(header.height));
    check_limits(limits, width, height, format.bytes_per_pixel())?;
    rd.skip(u64::from(header.id_length))?;

    tracing::debug!(
        width,
        height,
        bpp = header.bpp,
        rle = header.is_rle(),
        "TGA header recognized"
    );

    // Raw data must hold every pixel. RLE data needs at least one packet
    // header and one pixel per 128 pixels.
    let pixels = u64::from(width) * u64::from(height);
    let px_size = header.pixel_size() as u64;
    let min_bytes = if header.is_rle() {
        pixels.div_ceil(128) * (1 + px_size)
    } else {
        pixels * px_size
    };
    if rd.remaining()? < min_bytes {
        return Err(ImageError::UnexpectedEof);
    }
    stop.check()?;

    let mut image = Image::with_format(width, height, format);
    {
        let mut out = LinearWriter::new(&mut image, &header);
        if header.is_rle() {
            rle::decode_packets(rd, &mut out, header.pixel_size(), stop)?;
        } else {
            read_raw(rd, &mut out, header.pixel_size(), stop)?;
        }
    }

    if header.origin_right() {
        image.horizontal_flip();
    }
    Ok(image)
}

fn read_raw<R: Read + Seek + ?Sized>(
    rd: &mut Rewind<'_, R>,
    out: &mut LinearWriter<'_>,
    px_size: usize,
    stop: &dyn Stop,
) -> Result<(), ImageError> {
    let mut row = vec![0u8; out.width * px_size];
    let mut y = 0usize;
    while !out.is_full() {
        if y % 16 == 0 {
            stop.check()?;
        }
        rd.read_full(&mut row)?;
        for px in row.chunks_exact(px_size) {
            out.put(px);
        }
        y += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpack_16_bit_fields() {
        // b=0b11111, g=0b00000, r=0b00000, a=0
        assert_eq!(unpack_16([0b1111_1000, 0b0000_0000]), [0xF8, 0, 0, 0]);
        // g spans both bytes: low 3 bits of byte0, high 2 bits of byte1
        assert_eq!(unpack_16([0b0000_0111, 0b1100_0000]), [0, 0xF8, 0, 0]);
        // r is bits 1..=5 of byte1, alpha bit 0
        assert_eq!(unpack_16([0, 0b0011_1111]), [0, 0, 0xF8, 0x80]);
    }

    #[test]
    fn cursor_fills_bottom_up_and_spans_rows() {
        let header = TgaHeader {
            data_type: 3,
            width: 2,
            height: 2,
            bpp: 8,
            ..TgaHeader::default()
        };
        let mut image = Image::with_format(2, 2, PixelFormat::Gray8);
        let mut out = LinearWriter::new(&mut image, &header);
        for v in [1u8, 2, 3] {
            out.put(&[v]);
        }
        assert_eq!(out.remaining(), 1);
        out.put(&[4]);
        assert!(out.is_full());
        assert_eq!(image.data(), &[3, 4, 1, 2]);
    }

    #[test]
    fn cursor_top_origin() {
        let header = TgaHeader {
            data_type: 3,
            width: 2,
            height: 2,
            bpp: 8,
            attributes: 0x20,
            ..TgaHeader::default()
        };
        let mut image = Image::with_format(2, 2, PixelFormat::Gray8);
        let mut out = LinearWriter::new(&mut image, &header);
        for v in [1u8, 2, 3, 4] {
            out.put(&[v]);
        }
        assert_eq!(image.data(), &[1, 2, 3, 4]);
    }
}
