//! JPEG adapter (internal).
//!
//! Decoding runs `jpeg-decoder` directly over the caller's stream; encoding
//! uses the baseline encoder from the `image` crate. Both run inside
//! [`guard`], so a malformed stream can only ever surface as an
//! [`ImageError`].

use std::borrow::Cow;
use std::io::{Read, Seek, Write};

use enough::Stop;

use crate::buffer::Image;
use crate::codec::guard;
use crate::error::ImageError;
use crate::format::ImageFormat;
use crate::info::ImageInfo;
use crate::limits::{Limits, check_limits};
use crate::pixel::PixelFormat;
use crate::stream::Rewind;

const CODEC: &str = "jpeg";

/// Start-of-image marker.
const SOI: [u8; 2] = [0xFF, 0xD8];

/// The largest dimension a baseline JPEG frame header can carry.
const MAX_DIMENSION: u32 = u16::MAX as u32;

fn native_format(pixel_format: jpeg_decoder::PixelFormat) -> Result<PixelFormat, ImageError> {
    match pixel_format {
        jpeg_decoder::PixelFormat::L8 => Ok(PixelFormat::Gray8),
        jpeg_decoder::PixelFormat::RGB24 => Ok(PixelFormat::Rgb8),
        // Four components are passed through as-is.
        jpeg_decoder::PixelFormat::CMYK32 => Ok(PixelFormat::Rgba8),
        jpeg_decoder::PixelFormat::L16 => Err(ImageError::UnsupportedVariant(
            "16-bit grayscale JPEG".into(),
        )),
    }
}

fn decode_error(e: jpeg_decoder::Error) -> ImageError {
    match e {
        jpeg_decoder::Error::Io(io) => io.into(),
        jpeg_decoder::Error::Unsupported(feature) => {
            ImageError::UnsupportedVariant(format!("JPEG {feature:?}"))
        }
        other => ImageError::codec(CODEC, other.to_string()),
    }
}

fn check_signature<R: Read + Seek + ?Sized>(rd: &mut Rewind<'_, R>) -> Result<(), ImageError> {
    if rd.read_magic::<2>()? != SOI {
        return Err(ImageError::UnrecognizedFormat);
    }
    rd.seek_from_start(0)
}

/// Read the frame header and return `(width, height, native format)`.
fn read_info<R: Read>(
    decoder: &mut jpeg_decoder::Decoder<R>,
) -> Result<(u32, u32, PixelFormat), ImageError> {
    decoder.read_info().map_err(decode_error)?;
    let info = decoder
        .info()
        .ok_or_else(|| ImageError::codec(CODEC, "no frame header"))?;
    let format = native_format(info.pixel_format)?;
    let (width, height) = (u32::from(info.width), u32::from(info.height));
    if width == 0 || height == 0 {
        return Err(ImageError::InvalidHeader(format!(
            "invalid JPEG dimensions {width}x{height}"
        )));
    }
    Ok((width, height, format))
}

/// Decode a JPEG. On any error the stream is left where it was.
pub(crate) fn decode<R: Read + Seek + ?Sized>(
    reader: &mut R,
    requested: PixelFormat,
    limits: Option<&Limits>,
    stop: &dyn Stop,
) -> Result<Image, ImageError> {
    let mut rd = Rewind::new(reader)?;
    check_signature(&mut rd)?;

    let image = guard(CODEC, || {
        let mut decoder = jpeg_decoder::Decoder::new(&mut rd);
        let (width, height, native) = read_info(&mut decoder)?;
        let format = requested.or(native);
        check_limits(
            limits,
            width,
            height,
            native.bytes_per_pixel().max(format.bytes_per_pixel()),
        )?;
        tracing::debug!(width, height, ?native, "JPEG frame header recognized");
        stop.check()?;

        let pixels = decoder.decode().map_err(decode_error)?;
        let decoded = Image::from_raw(width, height, native, pixels)?;
        stop.check()?;
        Ok(decoded.convert(format))
    })?;

    rd.commit();
    Ok(image)
}

/// Frame-header probe. Always rewinds.
pub(crate) fn probe<R: Read + Seek + ?Sized>(reader: &mut R) -> Result<ImageInfo, ImageError> {
    let mut rd = Rewind::new(reader)?;
    check_signature(&mut rd)?;
    let (width, height, native_format) = guard(CODEC, || {
        read_info(&mut jpeg_decoder::Decoder::new(&mut rd))
    })?;
    Ok(ImageInfo {
        width,
        height,
        container: ImageFormat::Jpeg,
        native_format,
    })
}

/// JPEG stores grayscale or RGB; alpha is dropped.
pub(crate) fn stored_format(requested: PixelFormat) -> PixelFormat {
    if requested == PixelFormat::Gray8 {
        PixelFormat::Gray8
    } else {
        PixelFormat::Rgb8
    }
}

/// Encode a baseline JPEG at `quality` (1..=100).
pub(crate) fn encode<W: Write + ?Sized>(
    image: &Image,
    requested: PixelFormat,
    quality: u8,
    out: &mut W,
    stop: &dyn Stop,
) -> Result<(), ImageError> {
    let target = stored_format(requested.or(image.format()));
    let (width, height) = (image.width(), image.height());
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(ImageError::DimensionsTooLarge { width, height });
    }

    let pixels: Cow<'_, [u8]> = if image.format() == target {
        Cow::Borrowed(image.data())
    } else {
        Cow::Owned(image.convert(target).into_data())
    };
    let color = if target == PixelFormat::Gray8 {
        ::image::ExtendedColorType::L8
    } else {
        ::image::ExtendedColorType::Rgb8
    };
    stop.check()?;

    guard(CODEC, || {
        let mut encoder =
            ::image::codecs::jpeg::JpegEncoder::new_with_quality(&mut *out, quality);
        encoder
            .encode(&pixels, width, height, color)
            .map_err(|e| match e {
                ::image::ImageError::IoError(io) => ImageError::Io(io),
                other => ImageError::codec(CODEC, other.to_string()),
            })
    })
}
