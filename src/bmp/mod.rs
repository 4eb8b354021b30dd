//! Windows bitmap: uncompressed 24/32-bit decode and encode (internal).
//!
//! Use [`crate::DecodeRequest`] and [`crate::EncodeRequest`].

mod decode;
mod encode;

use std::io::{Read, Seek, Write};

use enough::Stop;

use crate::buffer::Image;
use crate::error::ImageError;
use crate::format::ImageFormat;
use crate::info::ImageInfo;
use crate::limits::Limits;
use crate::pixel::PixelFormat;
use crate::stream::Rewind;

/// Decode a BMP. On any error the stream is left where it was.
pub(crate) fn decode<R: Read + Seek + ?Sized>(
    reader: &mut R,
    format: PixelFormat,
    limits: Option<&Limits>,
    stop: &dyn Stop,
) -> Result<Image, ImageError> {
    let mut rd = Rewind::new(reader)?;
    let image = decode::decode_bmp(&mut rd, format, limits, stop)?;
    rd.commit();
    Ok(image)
}

/// Header-only probe. Always rewinds.
pub(crate) fn probe<R: Read + Seek + ?Sized>(reader: &mut R) -> Result<ImageInfo, ImageError> {
    let mut rd = Rewind::new(reader)?;
    let header = decode::read_header(&mut rd)?;
    Ok(ImageInfo {
        width: header.width,
        height: header.height,
        container: ImageFormat::Bmp,
        native_format: header.native_format(),
    })
}

/// Encode to BMP.
pub(crate) fn encode<W: Write + ?Sized>(
    image: &Image,
    format: PixelFormat,
    out: &mut W,
    stop: &dyn Stop,
) -> Result<(), ImageError> {
    encode::encode_bmp(image, format, out, stop)
}
