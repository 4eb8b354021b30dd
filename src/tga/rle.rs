//! TGA run-length packets.
//!
//! A packet is a header byte followed by pixel data. With the top bit set
//! the next pixel repeats `(header & 0x7f) + 1` times; otherwise that many
//! literal pixels follow. Packets run over the whole image in file order
//! and may cross row boundaries.

use std::io::{Read, Seek, Write};

use enough::Stop;

use super::decode::LinearWriter;
use crate::buffer::Image;
use crate::convert::{Comparator, Converter, comparator, converter};
use crate::error::ImageError;
use crate::pixel::PixelFormat;
use crate::stream::Rewind;

/// Longest run or literal packet.
pub(crate) const MAX_PACKET: usize = 128;
const RUN_FLAG: u8 = 0x80;
const STOP_INTERVAL: usize = 4096;
const FLUSH_AT: usize = 64 * 1024;

pub(crate) fn decode_packets<R: Read + Seek + ?Sized>(
    rd: &mut Rewind<'_, R>,
    out: &mut LinearWriter<'_>,
    px_size: usize,
    stop: &dyn Stop,
) -> Result<(), ImageError> {
    let mut run = [0u8; 4];
    let mut literal = [0u8; MAX_PACKET * 4];
    let mut since_check = 0usize;

    while !out.is_full() {
        let header = rd.read_u8()?;
        // A packet that overshoots the image is cut at the last pixel.
        let count = (usize::from(header & 0x7f) + 1).min(out.remaining());

        if header & RUN_FLAG != 0 {
            let px = &mut run[..px_size];
            rd.read_full(px)?;
            for _ in 0..count {
                out.put(px);
            }
        } else {
            let pixels = &mut literal[..count * px_size];
            rd.read_full(pixels)?;
            for px in pixels.chunks_exact(px_size) {
                out.put(px);
            }
        }

        since_check += count;
        if since_check >= STOP_INTERVAL {
            stop.check()?;
            since_check = 0;
        }
    }
    Ok(())
}

/// Pixels in file order: rows from the bottom, left to right.
struct BottomUp<'a> {
    image: &'a Image,
    width: usize,
}

impl<'a> BottomUp<'a> {
    fn new(image: &'a Image) -> Self {
        Self {
            image,
            width: image.width() as usize,
        }
    }

    fn get(&self, i: usize) -> &'a [u8] {
        let line = i / self.width;
        let x = (i % self.width) as u32;
        self.image.pixel(x, self.image.height() - 1 - line as u32)
    }
}

/// Greedy packetizer over every pixel of `image`, writing `target` pixels.
///
/// From each position, a run packet covers the following pixels whose
/// comparator magnitude against the first one is at most `tolerance`. If no
/// second pixel qualifies, a literal packet collects pixels until one is
/// within `tolerance` of its predecessor. Both packet kinds hold at most
/// [`MAX_PACKET`] pixels. Run pixels are all written as the first pixel's
/// value, so each channel drifts from the original by at most `tolerance`.
pub(crate) fn encode_packets<W: Write + ?Sized>(
    image: &Image,
    target: PixelFormat,
    tolerance: u8,
    out: &mut W,
    stop: &dyn Stop,
) -> Result<(), ImageError> {
    let cmp: Comparator = comparator(image.format());
    let cvt: Converter = converter(image.format(), target);
    let close = |a: &[u8], b: &[u8]| cmp(a, b).unsigned_abs() <= u32::from(tolerance);

    let px_size = target.bytes_per_pixel();
    let pixels = BottomUp::new(image);
    let total = image.width() as usize * image.height() as usize;

    let mut buf: Vec<u8> = Vec::with_capacity(FLUSH_AT + 1 + MAX_PACKET * px_size);
    let mut px = [0u8; 4];
    let mut since_check = 0usize;
    let mut i = 0usize;

    while i < total {
        let first = pixels.get(i);
        let mut k = 1;
        while i + k < total && k < MAX_PACKET && close(first, pixels.get(i + k)) {
            k += 1;
        }

        if k > 1 {
            buf.push(RUN_FLAG | (k - 1) as u8);
            cvt(first, &mut px[..px_size]);
            buf.extend_from_slice(&px[..px_size]);
        } else {
            let header_at = buf.len();
            buf.push(0);
            cvt(first, &mut px[..px_size]);
            buf.extend_from_slice(&px[..px_size]);
            let mut prev = first;
            while i + k < total && k < MAX_PACKET {
                let next = pixels.get(i + k);
                if close(prev, next) {
                    break;
                }
                cvt(next, &mut px[..px_size]);
                buf.extend_from_slice(&px[..px_size]);
                prev = next;
                k += 1;
            }
            buf[header_at] = (k - 1) as u8;
        }
        i += k;

        if buf.len() >= FLUSH_AT {
            out.write_all(&buf)?;
            buf.clear();
        }
        since_check += k;
        if since_check >= STOP_INTERVAL {
            stop.check()?;
            since_check = 0;
        }
    }
    out.write_all(&buf)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use enough::Unstoppable;

    fn gray_row(values: &[u8]) -> Image {
        Image::from_raw(values.len() as u32, 1, PixelFormat::Gray8, values.to_vec()).unwrap()
    }

    fn packets(image: &Image, tolerance: u8) -> Vec<u8> {
        let mut out = Vec::new();
        encode_packets(image, image.format(), tolerance, &mut out, &Unstoppable).unwrap();
        out
    }

    #[test]
    fn run_then_literal() {
        let image = gray_row(&[7, 7, 7, 1, 2, 3]);
        assert_eq!(packets(&image, 0), vec![0x82, 7, 0x02, 1, 2, 3]);
    }

    #[test]
    fn single_pixel_is_a_literal() {
        assert_eq!(packets(&gray_row(&[9]), 0), vec![0x00, 9]);
    }

    #[test]
    fn literal_ends_on_first_repeat() {
        // The literal takes the first 2, which the next 2 then matches.
        let image = gray_row(&[1, 2, 2, 2]);
        assert_eq!(packets(&image, 0), vec![0x01, 1, 2, 0x81, 2]);
    }

    #[test]
    fn packets_cap_at_128() {
        let image = gray_row(&[5; 300]);
        assert_eq!(packets(&image, 0), vec![0xFF, 5, 0xFF, 5, 0xAB, 5]);

        let ramp: Vec<u8> = (0..130).map(|v| (v * 2) as u8).collect();
        let out = packets(&gray_row(&ramp), 0);
        assert_eq!(out[0], 0x7F);
        assert_eq!(out[129], 0x01);
        assert_eq!(out.len(), 1 + 128 + 1 + 2);
    }

    #[test]
    fn runs_cross_rows_bottom_up() {
        // Bottom row [4, 4], top row [4, 9]: file order is 4 4 4 9.
        let image = Image::from_raw(2, 2, PixelFormat::Gray8, vec![4, 9, 4, 4]).unwrap();
        assert_eq!(packets(&image, 0), vec![0x82, 4, 0x00, 9]);
    }

    #[test]
    fn tolerance_merges_near_pixels() {
        let image = gray_row(&[100, 103, 97, 120]);
        assert_eq!(packets(&image, 3), vec![0x82, 100, 0x00, 120]);
        assert_eq!(packets(&image, 2), vec![0x03, 100, 103, 97, 120]);
    }

    #[test]
    fn converts_to_target_layout() {
        let image = Image::from_raw(2, 1, PixelFormat::Rgb8, vec![1, 2, 3, 1, 2, 3]).unwrap();
        let mut out = Vec::new();
        encode_packets(&image, PixelFormat::Bgr8, 0, &mut out, &Unstoppable).unwrap();
        assert_eq!(out, vec![0x81, 3, 2, 1]);
    }
}
