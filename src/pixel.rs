/// Pixel memory layout.
///
/// `Auto` is only meaningful in requests ("use the source's natural format");
/// a reserved [`crate::Image`] never carries it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Pick the natural format of the source.
    #[default]
    Auto,
    /// Single channel, 8-bit grayscale.
    Gray8,
    /// 3 channels, 8-bit BGR.
    Bgr8,
    /// 4 channels, 8-bit BGRA.
    Bgra8,
    /// 3 channels, 8-bit RGB.
    Rgb8,
    /// 4 channels, 8-bit RGBA.
    Rgba8,
}

impl PixelFormat {
    /// All concrete (non-`Auto`) formats.
    pub const CONCRETE: [PixelFormat; 5] = [
        PixelFormat::Gray8,
        PixelFormat::Bgr8,
        PixelFormat::Bgra8,
        PixelFormat::Rgb8,
        PixelFormat::Rgba8,
    ];

    /// Bits per pixel. `Auto` has none.
    pub fn bits_per_pixel(&self) -> u32 {
        match self {
            Self::Auto => 0,
            Self::Gray8 => 8,
            Self::Bgr8 | Self::Rgb8 => 24,
            Self::Bgra8 | Self::Rgba8 => 32,
        }
    }

    /// Bytes per pixel for this format.
    pub fn bytes_per_pixel(&self) -> usize {
        self.bits_per_pixel() as usize / 8
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.bytes_per_pixel()
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self, Self::Bgra8 | Self::Rgba8)
    }

    pub fn is_auto(&self) -> bool {
        *self == Self::Auto
    }

    /// `self`, unless it is `Auto`, in which case `native`.
    pub(crate) fn or(self, native: PixelFormat) -> PixelFormat {
        if self.is_auto() { native } else { self }
    }
}

/// Typed pixels that can view an [`crate::Image`] buffer without copying.
#[cfg(feature = "rgb")]
pub trait TypedPixel: Copy + 'static {
    /// The pixel format this type's memory layout matches.
    fn format() -> PixelFormat;
}

#[cfg(feature = "rgb")]
impl TypedPixel for rgb::RGB8 {
    fn format() -> PixelFormat {
        PixelFormat::Rgb8
    }
}

#[cfg(feature = "rgb")]
impl TypedPixel for rgb::RGBA8 {
    fn format() -> PixelFormat {
        PixelFormat::Rgba8
    }
}

#[cfg(feature = "rgb")]
impl TypedPixel for rgb::alt::BGR8 {
    fn format() -> PixelFormat {
        PixelFormat::Bgr8
    }
}

#[cfg(feature = "rgb")]
impl TypedPixel for rgb::alt::BGRA8 {
    fn format() -> PixelFormat {
        PixelFormat::Bgra8
    }
}
