//! PNG adapter over the `png` crate (internal, decode only).

use std::io::{BufReader, Read, Seek};

use ::png::{BitDepth, ColorType, Transformations};
use enough::Stop;

use crate::buffer::Image;
use crate::codec::guard;
use crate::convert::convert_row;
use crate::error::ImageError;
use crate::format::ImageFormat;
use crate::info::ImageInfo;
use crate::limits::{Limits, check_limits};
use crate::pixel::PixelFormat;
use crate::stream::Rewind;

const CODEC: &str = "png";

const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn decode_error(e: ::png::DecodingError) -> ImageError {
    match e {
        ::png::DecodingError::IoError(io) => io.into(),
        ::png::DecodingError::LimitsExceeded => {
            ImageError::LimitExceeded("PNG decoder memory limit".into())
        }
        other => ImageError::codec(CODEC, other.to_string()),
    }
}

fn check_signature<R: Read + Seek + ?Sized>(rd: &mut Rewind<'_, R>) -> Result<(), ImageError> {
    if rd.read_magic::<8>()? != SIGNATURE {
        return Err(ImageError::UnrecognizedFormat);
    }
    rd.seek_from_start(0)
}

/// Pixel format for the image's color type after `EXPAND | STRIP_16`.
fn native_format(color_type: ColorType) -> Result<PixelFormat, ImageError> {
    match color_type {
        ColorType::Grayscale => Ok(PixelFormat::Gray8),
        ColorType::Rgb => Ok(PixelFormat::Rgb8),
        ColorType::Rgba => Ok(PixelFormat::Rgba8),
        ColorType::Indexed => Err(ImageError::UnsupportedVariant("palette PNG".into())),
        ColorType::GrayscaleAlpha => Err(ImageError::UnsupportedVariant(
            "grayscale+alpha PNG".into(),
        )),
    }
}

fn reader<R: Read + Seek>(stream: R) -> Result<::png::Reader<BufReader<R>>, ImageError> {
    let mut decoder = ::png::Decoder::new(BufReader::new(stream));
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
    decoder.read_info().map_err(decode_error)
}

fn decode_stream<R: Read + Seek>(
    stream: R,
    requested: PixelFormat,
    limits: Option<&Limits>,
    stop: &dyn Stop,
) -> Result<Image, ImageError> {
    let mut reader = reader(stream)?;
    let (width, height, color_type) = {
        let info = reader.info();
        (info.width, info.height, info.color_type)
    };
    let native = native_format(color_type)?;
    let format = requested.or(native);
    check_limits(
        limits,
        width,
        height,
        native.bytes_per_pixel().max(format.bytes_per_pixel()),
    )?;
    tracing::debug!(width, height, ?color_type, "PNG header recognized");

    // A tRNS chunk comes out as an extra alpha channel. The image keeps its
    // IHDR layout and that channel is dropped.
    let (out_color, out_depth) = reader.output_color_type();
    let out_px = out_color.samples();
    let native_px = native.bytes_per_pixel();
    if out_depth != BitDepth::Eight || out_px < native_px {
        return Err(ImageError::UnsupportedVariant(format!(
            "PNG output {out_color:?} at {out_depth:?}"
        )));
    }
    stop.check()?;

    let mut image = Image::with_format(width, height, format);
    let line_size = reader
        .output_line_size(width)
        .ok_or(ImageError::DimensionsTooLarge { width, height })?;
    if format == native && line_size == image.stride() {
        reader.next_frame(image.data_mut()).map_err(decode_error)?;
        return Ok(image);
    }

    let frame_len = line_size
        .checked_mul(height as usize)
        .ok_or(ImageError::DimensionsTooLarge { width, height })?;
    let mut frame = vec![0u8; frame_len];
    reader.next_frame(&mut frame).map_err(decode_error)?;

    let row_bytes = width as usize * native_px;
    let mut packed = vec![0u8; if out_px == native_px { 0 } else { row_bytes }];
    for (y, row) in frame.chunks_exact(line_size).enumerate() {
        if y % 16 == 0 {
            stop.check()?;
        }
        let src = if out_px == native_px {
            &row[..row_bytes]
        } else {
            for (dst, px) in packed.chunks_exact_mut(native_px).zip(row.chunks_exact(out_px)) {
                dst.copy_from_slice(&px[..native_px]);
            }
            &packed[..]
        };
        convert_row(src, native, image.line_mut(y as u32), format);
    }
    Ok(image)
}

/// Decode a PNG. On any error the stream is left where it was.
pub(crate) fn decode<R: Read + Seek + ?Sized>(
    reader: &mut R,
    requested: PixelFormat,
    limits: Option<&Limits>,
    stop: &dyn Stop,
) -> Result<Image, ImageError> {
    let mut rd = Rewind::new(reader)?;
    check_signature(&mut rd)?;
    let image = guard(CODEC, || decode_stream(&mut rd, requested, limits, stop))?;
    rd.commit();
    Ok(image)
}

/// Header probe. Always rewinds.
pub(crate) fn probe<R: Read + Seek + ?Sized>(reader: &mut R) -> Result<ImageInfo, ImageError> {
    let mut rd = Rewind::new(reader)?;
    check_signature(&mut rd)?;
    guard(CODEC, || {
        let reader = self::reader(&mut rd)?;
        let info = reader.info();
        Ok(ImageInfo {
            width: info.width,
            height: info.height,
            container: ImageFormat::Png,
            native_format: native_format(info.color_type)?,
        })
    })
}
