use std::io::Write;
use std::path::Path;

use enough::Stop;

use crate::buffer::Image;
use crate::error::ImageError;
use crate::format::ImageFormat;
use crate::pixel::PixelFormat;

const DEFAULT_QUALITY: u8 = 95;

/// Merge tolerance for the TGA run-length encoder at a given quality.
///
/// Quality 100 gives 0 (only identical pixels merge, lossless); quality 1
/// gives 25.
pub fn rle_tolerance(quality: u8) -> u8 {
    let q = u32::from(quality.clamp(1, 100));
    ((100 - q) * 25 / 99) as u8
}

/// Encode request builder.
///
/// ```no_run
/// use zenimage::{EncodeRequest, Image, PixelFormat, Unstoppable};
///
/// let image = Image::with_format(64, 64, PixelFormat::Rgb8);
/// let jpeg = EncodeRequest::jpeg()
///     .with_quality(85)
///     .encode_to_vec(&image, Unstoppable)?;
/// let tga = EncodeRequest::tga()
///     .with_rle(false)
///     .encode_to_vec(&image, Unstoppable)?;
/// # Ok::<(), zenimage::ImageError>(())
/// ```
#[derive(Clone, Copy, Debug)]
pub struct EncodeRequest {
    container: ImageFormat,
    quality: u8,
    format: PixelFormat,
    rle: bool,
}

impl EncodeRequest {
    pub fn new(container: ImageFormat) -> Self {
        Self {
            container,
            quality: DEFAULT_QUALITY,
            format: PixelFormat::Auto,
            rle: true,
        }
    }

    pub fn bmp() -> Self {
        Self::new(ImageFormat::Bmp)
    }

    pub fn tga() -> Self {
        Self::new(ImageFormat::Tga)
    }

    pub fn jpeg() -> Self {
        Self::new(ImageFormat::Jpeg)
    }

    /// PNG encoding is not implemented; [`EncodeRequest::encode`] reports
    /// [`ImageError::EncodeUnsupported`].
    pub fn png() -> Self {
        Self::new(ImageFormat::Png)
    }

    /// Pick the container from a file name's extension.
    pub fn for_path(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        let path = path.as_ref();
        ImageFormat::from_path(path)
            .map(Self::new)
            .ok_or_else(|| ImageError::UnknownContainer(path.display().to_string()))
    }

    /// Quality, clamped to 1..=100. JPEG uses it directly; TGA turns it into
    /// the run-length merge tolerance (see [`rle_tolerance`]). BMP ignores it.
    pub fn with_quality(mut self, quality: i32) -> Self {
        self.quality = quality.clamp(1, 100) as u8;
        self
    }

    /// Stored pixel format. Each container picks the closest layout it can
    /// hold; `Auto` (the default) starts from the image's own format.
    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.format = format;
        self
    }

    /// TGA only: run-length encode the pixel data (the default) or store it raw.
    pub fn with_rle(mut self, rle: bool) -> Self {
        self.rle = rle;
        self
    }

    pub fn container(&self) -> ImageFormat {
        self.container
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode `image` into `writer`.
    pub fn encode<W: Write + ?Sized>(
        &self,
        image: &Image,
        writer: &mut W,
        stop: impl Stop,
    ) -> Result<(), ImageError> {
        if image.is_empty() {
            return Err(ImageError::EmptyImage);
        }
        let stop: &dyn Stop = &stop;
        let result = match self.container {
            #[cfg(feature = "bmp")]
            ImageFormat::Bmp => crate::bmp::encode(image, self.format, writer, stop),
            #[cfg(feature = "tga")]
            ImageFormat::Tga => {
                let tolerance = self.rle.then(|| rle_tolerance(self.quality));
                crate::tga::encode(image, self.format, tolerance, writer, stop)
            }
            #[cfg(feature = "jpeg")]
            ImageFormat::Jpeg => {
                crate::jpeg::encode(image, self.format, self.quality, writer, stop)
            }
            other => Err(ImageError::EncodeUnsupported(other)),
        };
        if let Err(e) = &result {
            tracing::warn!(container = ?self.container, error = %e, "encode failed");
        }
        result
    }

    /// Encode `image` into a new buffer.
    pub fn encode_to_vec(&self, image: &Image, stop: impl Stop) -> Result<Vec<u8>, ImageError> {
        let mut out = Vec::new();
        self.encode(image, &mut out, stop)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enough::Unstoppable;

    #[test]
    fn tolerance_endpoints() {
        assert_eq!(rle_tolerance(100), 0);
        assert_eq!(rle_tolerance(1), 25);
        assert_eq!(rle_tolerance(50), 12);
        assert_eq!(rle_tolerance(0), 25);
    }

    #[test]
    fn quality_is_clamped() {
        assert_eq!(EncodeRequest::jpeg().with_quality(0).quality(), 1);
        assert_eq!(EncodeRequest::jpeg().with_quality(-40).quality(), 1);
        assert_eq!(EncodeRequest::jpeg().with_quality(250).quality(), 100);
        assert_eq!(EncodeRequest::jpeg().quality(), DEFAULT_QUALITY);
    }

    #[test]
    fn for_path_picks_container() {
        assert_eq!(
            EncodeRequest::for_path("out/shot.JPEG").unwrap().container(),
            ImageFormat::Jpeg
        );
        assert!(matches!(
            EncodeRequest::for_path("notes.txt"),
            Err(ImageError::UnknownContainer(_))
        ));
    }

    #[test]
    fn empty_and_png_are_rejected() {
        let mut out = Vec::new();
        assert!(matches!(
            EncodeRequest::bmp().encode(&Image::new(), &mut out, Unstoppable),
            Err(ImageError::EmptyImage)
        ));
        let image = Image::with_format(1, 1, PixelFormat::Gray8);
        assert!(matches!(
            EncodeRequest::png().encode(&image, &mut out, Unstoppable),
            Err(ImageError::EncodeUnsupported(ImageFormat::Png))
        ));
        assert!(out.is_empty());
    }
}
