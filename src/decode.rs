use std::io::{Cursor, Read, Seek};

use enough::Stop;

use crate::buffer::Image;
use crate::error::ImageError;
use crate::format::ImageFormat;
use crate::limits::Limits;
use crate::pixel::PixelFormat;

/// Order in which containers are tried when none is forced.
pub const TRIAL_ORDER: [ImageFormat; 4] = [
    ImageFormat::Bmp,
    ImageFormat::Png,
    ImageFormat::Tga,
    ImageFormat::Jpeg,
];

/// A decoded image and the container it was stored in.
#[derive(Clone, Debug)]
pub struct DecodeOutput {
    pub image: Image,
    pub container: ImageFormat,
}

impl DecodeOutput {
    pub fn into_image(self) -> Image {
        self.image
    }
}

/// Decode request builder.
///
/// ```no_run
/// use zenimage::{DecodeRequest, Limits, PixelFormat, Unstoppable};
///
/// let limits = Limits { max_pixels: Some(1 << 24), ..Limits::default() };
/// let mut file = std::io::BufReader::new(std::fs::File::open("photo.jpg")?);
/// let decoded = DecodeRequest::new()
///     .with_pixel_format(PixelFormat::Rgba8)
///     .with_limits(&limits)
///     .decode(&mut file, Unstoppable)?;
/// println!("{:?} {}x{}", decoded.container, decoded.image.width(), decoded.image.height());
/// # Ok::<(), zenimage::ImageError>(())
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct DecodeRequest<'a> {
    format: PixelFormat,
    limits: Option<&'a Limits>,
    container: Option<ImageFormat>,
}

impl<'a> DecodeRequest<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output pixel format. `Auto` (the default) keeps the source's.
    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Only try `container` instead of every supported one.
    pub fn with_container(mut self, container: ImageFormat) -> Self {
        self.container = Some(container);
        self
    }

    /// Decode from a seekable stream.
    ///
    /// Containers are tried in [`TRIAL_ORDER`]. A decoder that does not
    /// recognize its signature hands over to the next one; once a signature
    /// matches, that decoder's result is final. On failure the stream is
    /// back at its starting position. On success it is positioned after the
    /// consumed image data.
    pub fn decode<R: Read + Seek + ?Sized>(
        &self,
        reader: &mut R,
        stop: impl Stop,
    ) -> Result<DecodeOutput, ImageError> {
        let candidates: &[ImageFormat] = match &self.container {
            Some(container) => core::slice::from_ref(container),
            None => &TRIAL_ORDER,
        };

        for &container in candidates {
            match decode_as(container, reader, self.format, self.limits, &stop) {
                Ok(image) => {
                    tracing::debug!(
                        ?container,
                        width = image.width(),
                        height = image.height(),
                        format = ?image.format(),
                        "decoded image"
                    );
                    return Ok(DecodeOutput { image, container });
                }
                Err(ImageError::UnrecognizedFormat) => {
                    tracing::debug!(?container, "signature mismatch, trying next decoder");
                }
                Err(e) => {
                    tracing::warn!(?container, error = %e, "decode failed");
                    return Err(e);
                }
            }
        }
        Err(ImageError::UnrecognizedFormat)
    }

    /// Decode an in-memory image.
    pub fn decode_bytes(&self, data: &[u8], stop: impl Stop) -> Result<DecodeOutput, ImageError> {
        self.decode(&mut Cursor::new(data), stop)
    }
}

#[allow(unreachable_patterns, unused_variables)]
fn decode_as<R: Read + Seek + ?Sized>(
    container: ImageFormat,
    reader: &mut R,
    format: PixelFormat,
    limits: Option<&Limits>,
    stop: &dyn Stop,
) -> Result<Image, ImageError> {
    match container {
        #[cfg(feature = "bmp")]
        ImageFormat::Bmp => crate::bmp::decode(reader, format, limits, stop),
        #[cfg(feature = "png")]
        ImageFormat::Png => crate::png::decode(reader, format, limits, stop),
        #[cfg(feature = "tga")]
        ImageFormat::Tga => crate::tga::decode(reader, format, limits, stop),
        #[cfg(feature = "jpeg")]
        ImageFormat::Jpeg => crate::jpeg::decode(reader, format, limits, stop),
        _ => Err(ImageError::UnrecognizedFormat),
    }
}
