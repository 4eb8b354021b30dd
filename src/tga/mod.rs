//! Truevision TGA: uncompressed and run-length encoded true-color and
//! grayscale images (internal).
//!
//! Color-mapped images (data types 1 and 9) are recognized but unsupported.

mod decode;
mod encode;
pub(crate) mod rle;

use std::io::{Read, Seek, Write};

use enough::Stop;

use crate::buffer::Image;
use crate::error::ImageError;
use crate::format::ImageFormat;
use crate::info::ImageInfo;
use crate::limits::Limits;
use crate::pixel::PixelFormat;
use crate::stream::{Rewind, le_u16};

pub(crate) const HEADER_LEN: usize = 18;

/// Attribute bit: pixel rows are stored right to left.
const ORIGIN_RIGHT: u8 = 0x10;
/// Attribute bit: the first stored row is the top row.
const ORIGIN_TOP: u8 = 0x20;

/// The 18-byte TGA file header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct TgaHeader {
    pub id_length: u8,
    pub colormap_type: u8,
    pub data_type: u8,
    pub colormap_index: u16,
    pub colormap_length: u16,
    pub colormap_size: u8,
    pub x_origin: u16,
    pub y_origin: u16,
    pub width: u16,
    pub height: u16,
    pub bpp: u8,
    pub attributes: u8,
}

impl TgaHeader {
    fn parse(b: &[u8; HEADER_LEN]) -> Self {
        Self {
            id_length: b[0],
            colormap_type: b[1],
            data_type: b[2],
            colormap_index: le_u16(b, 3),
            colormap_length: le_u16(b, 5),
            colormap_size: b[7],
            x_origin: le_u16(b, 8),
            y_origin: le_u16(b, 10),
            width: le_u16(b, 12),
            height: le_u16(b, 14),
            bpp: b[16],
            attributes: b[17],
        }
    }

    fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut b = [0u8; HEADER_LEN];
        b[0] = self.id_length;
        b[1] = self.colormap_type;
        b[2] = self.data_type;
        b[3..5].copy_from_slice(&self.colormap_index.to_le_bytes());
        b[5..7].copy_from_slice(&self.colormap_length.to_le_bytes());
        b[7] = self.colormap_size;
        b[8..10].copy_from_slice(&self.x_origin.to_le_bytes());
        b[10..12].copy_from_slice(&self.y_origin.to_le_bytes());
        b[12..14].copy_from_slice(&self.width.to_le_bytes());
        b[14..16].copy_from_slice(&self.height.to_le_bytes());
        b[16] = self.bpp;
        b[17] = self.attributes;
        b
    }

    fn is_rle(&self) -> bool {
        matches!(self.data_type, 10 | 11)
    }

    fn origin_top(&self) -> bool {
        self.attributes & ORIGIN_TOP != 0
    }

    fn origin_right(&self) -> bool {
        self.attributes & ORIGIN_RIGHT != 0
    }

    /// Stored bytes per pixel.
    fn pixel_size(&self) -> usize {
        usize::from(self.bpp / 8)
    }

    /// The format stored pixels normalize to. 16-bit pixels unpack to BGRA.
    fn native_format(&self) -> PixelFormat {
        match self.bpp {
            8 => PixelFormat::Gray8,
            24 => PixelFormat::Bgr8,
            _ => PixelFormat::Bgra8,
        }
    }
}

/// Read and validate the header. TGA has no signature, so a header whose
/// type fields are out of range is "not a TGA".
fn read_header<R: Read + Seek + ?Sized>(
    rd: &mut Rewind<'_, R>,
) -> Result<TgaHeader, ImageError> {
    let header = TgaHeader::parse(&rd.read_magic::<HEADER_LEN>()?);

    if !matches!(header.colormap_type, 0 | 1)
        || !matches!(header.data_type, 0 | 1 | 2 | 3 | 9 | 10 | 11)
        || !matches!(header.bpp, 8 | 16 | 24 | 32)
    {
        return Err(ImageError::UnrecognizedFormat);
    }

    if header.colormap_type != 0 || matches!(header.data_type, 1 | 9) {
        return Err(ImageError::UnsupportedVariant("color-mapped TGA".into()));
    }
    if header.data_type == 0 {
        return Err(ImageError::UnsupportedVariant(
            "TGA without image data".into(),
        ));
    }
    if header.width == 0 || header.height == 0 {
        return Err(ImageError::InvalidHeader(format!(
            "invalid TGA dimensions {}x{}",
            header.width, header.height
        )));
    }
    Ok(header)
}

/// Decode a TGA. On any error the stream is left where it was.
pub(crate) fn decode<R: Read + Seek + ?Sized>(
    reader: &mut R,
    format: PixelFormat,
    limits: Option<&Limits>,
    stop: &dyn Stop,
) -> Result<Image, ImageError> {
    let mut rd = Rewind::new(reader)?;
    let image = decode::decode_tga(&mut rd, format, limits, stop)?;
    rd.commit();
    Ok(image)
}

/// Header-only probe. Always rewinds.
pub(crate) fn probe<R: Read + Seek + ?Sized>(reader: &mut R) -> Result<ImageInfo, ImageError> {
    let mut rd = Rewind::new(reader)?;
    let header = read_header(&mut rd)?;
    Ok(ImageInfo {
        width: u32::from(header.width),
        height: u32::from(header.height),
        container: ImageFormat::Tga,
        native_format: header.native_format(),
    })
}

/// Encode to TGA. `rle_tolerance` of `None` writes uncompressed pixels.
pub(crate) fn encode<W: Write + ?Sized>(
    image: &Image,
    format: PixelFormat,
    rle_tolerance: Option<u8>,
    out: &mut W,
    stop: &dyn Stop,
) -> Result<(), ImageError> {
    encode::encode_tga(image, format, rle_tolerance, out, stop)
}
