use std::io::{Cursor, Read, Seek};

use crate::decode::TRIAL_ORDER;
use crate::error::ImageError;
use crate::format::ImageFormat;
use crate::pixel::PixelFormat;

/// Image metadata obtained by reading only the header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// Detected container.
    pub container: ImageFormat,
    /// Pixel format a decode with [`PixelFormat::Auto`] produces.
    pub native_format: PixelFormat,
}

impl ImageInfo {
    /// Probe a stream's header, trying containers in decode order.
    ///
    /// The stream is rewound to its starting position whether or not a
    /// container is recognized.
    pub fn probe<R: Read + Seek + ?Sized>(reader: &mut R) -> Result<ImageInfo, ImageError> {
        for &container in TRIAL_ORDER.iter() {
            match probe_as(container, reader) {
                Err(ImageError::UnrecognizedFormat) => continue,
                result => return result,
            }
        }
        Err(ImageError::UnrecognizedFormat)
    }

    /// Probe an in-memory image.
    pub fn from_bytes(data: &[u8]) -> Result<ImageInfo, ImageError> {
        Self::probe(&mut Cursor::new(data))
    }
}

#[allow(unreachable_patterns, unused_variables)]
fn probe_as<R: Read + Seek + ?Sized>(
    container: ImageFormat,
    reader: &mut R,
) -> Result<ImageInfo, ImageError> {
    match container {
        #[cfg(feature = "bmp")]
        ImageFormat::Bmp => crate::bmp::probe(reader),
        #[cfg(feature = "png")]
        ImageFormat::Png => crate::png::probe(reader),
        #[cfg(feature = "tga")]
        ImageFormat::Tga => crate::tga::probe(reader),
        #[cfg(feature = "jpeg")]
        ImageFormat::Jpeg => crate::jpeg::probe(reader),
        _ => Err(ImageError::UnrecognizedFormat),
    }
}
