//! The canonical in-memory bitmap every codec decodes into and encodes from.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use enough::Unstoppable;

use crate::convert::convert_row;
use crate::decode::DecodeRequest;
use crate::encode::EncodeRequest;
use crate::error::ImageError;
use crate::format::ImageFormat;
use crate::pixel::PixelFormat;

/// A width x height grid of packed pixels in one [`PixelFormat`].
///
/// Rows are stored top to bottom with no padding: `stride == width * bpp / 8`.
/// A default-constructed image is empty; [`Image::reserve`] allocates it and
/// [`Image::release`] returns it to the empty state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Image {
    data: Vec<u8>,
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
}

impl Image {
    /// An empty image.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a zero-filled image.
    ///
    /// # Panics
    ///
    /// Same preconditions as [`Image::reserve`].
    pub fn with_format(width: u32, height: u32, format: PixelFormat) -> Self {
        let mut image = Self::new();
        image.reserve(width, height, format);
        image
    }

    /// Wrap existing packed pixel data (top row first, no padding).
    pub fn from_raw(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::InvalidHeader(format!(
                "zero image dimension {width}x{height}"
            )));
        }
        if format.is_auto() {
            return Err(ImageError::UnsupportedVariant(
                "raw pixel data needs a concrete pixel format".into(),
            ));
        }
        let stride = (width as usize)
            .checked_mul(format.bytes_per_pixel())
            .ok_or(ImageError::DimensionsTooLarge { width, height })?;
        let needed = stride
            .checked_mul(height as usize)
            .ok_or(ImageError::DimensionsTooLarge { width, height })?;
        if data.len() != needed {
            return Err(ImageError::BufferTooSmall {
                needed,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
            format,
        })
    }

    /// Allocate storage for a `width` x `height` image in `format`.
    ///
    /// Pixel contents are zeroed.
    ///
    /// # Panics
    ///
    /// Panics if the image is not empty (call [`Image::release`] first), if
    /// either dimension is zero, or if `format` is [`PixelFormat::Auto`].
    pub fn reserve(&mut self, width: u32, height: u32, format: PixelFormat) {
        assert!(self.is_empty(), "reserve() on an image that is not released");
        assert!(width > 0 && height > 0, "reserve() with zero dimension {width}x{height}");
        assert!(!format.is_auto(), "reserve() with PixelFormat::Auto");

        let stride = width as usize * format.bytes_per_pixel();
        self.data = vec![0u8; stride * height as usize];
        self.width = width;
        self.height = height;
        self.stride = stride;
        self.format = format;
    }

    /// Free the storage and return to the empty state. Idempotent.
    pub fn release(&mut self) {
        *self = Self::default();
    }

    /// An image is empty when either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn bits_per_pixel(&self) -> u32 {
        self.format.bits_per_pixel()
    }

    /// All pixel bytes, top row first.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the image and return its pixel buffer.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    fn pixel_offset(&self, x: u32, y: u32) -> usize {
        assert!(!self.is_empty(), "pixel access on an empty image");
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} image",
            self.width,
            self.height
        );
        y as usize * self.stride + x as usize * self.format.bytes_per_pixel()
    }

    fn line_range(&self, y: u32) -> std::ops::Range<usize> {
        assert!(!self.is_empty(), "line access on an empty image");
        assert!(y < self.height, "line {y} outside image of height {}", self.height);
        let start = y as usize * self.stride;
        start..start + self.stride
    }

    /// Bytes of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the image is empty or `(x, y)` is outside `[0, width) x [0, height)`.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let off = self.pixel_offset(x, y);
        &self.data[off..off + self.format.bytes_per_pixel()]
    }

    /// Mutable bytes of the pixel at `(x, y)`. Panics like [`Image::pixel`].
    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [u8] {
        let off = self.pixel_offset(x, y);
        let bpp = self.format.bytes_per_pixel();
        &mut self.data[off..off + bpp]
    }

    /// Bytes of row `y`.
    ///
    /// # Panics
    ///
    /// Panics if the image is empty or `y >= height`.
    pub fn line(&self, y: u32) -> &[u8] {
        let range = self.line_range(y);
        &self.data[range]
    }

    /// Mutable bytes of row `y`. Panics like [`Image::line`].
    pub fn line_mut(&mut self, y: u32) -> &mut [u8] {
        let range = self.line_range(y);
        &mut self.data[range]
    }

    /// Mirror every row left to right, in place.
    ///
    /// # Panics
    ///
    /// Panics if the image is empty.
    pub fn horizontal_flip(&mut self) {
        assert!(!self.is_empty(), "horizontal_flip() on an empty image");
        let bpp = self.format.bytes_per_pixel();
        let w = self.width as usize;
        for row in self.data.chunks_exact_mut(self.stride) {
            for j in 0..w / 2 {
                let (left, right) = row.split_at_mut((w - 1 - j) * bpp);
                left[j * bpp..(j + 1) * bpp].swap_with_slice(&mut right[..bpp]);
            }
        }
    }

    /// Mirror the image top to bottom, in place.
    ///
    /// # Panics
    ///
    /// Panics if the image is empty.
    pub fn vertical_flip(&mut self) {
        assert!(!self.is_empty(), "vertical_flip() on an empty image");
        let h = self.height as usize;
        let stride = self.stride;
        for i in 0..h / 2 {
            let (top, bottom) = self.data.split_at_mut((h - 1 - i) * stride);
            top[i * stride..(i + 1) * stride].swap_with_slice(&mut bottom[..stride]);
        }
    }

    /// A copy of this image with every pixel converted to `format`.
    ///
    /// `Auto` (or the current format) yields a plain clone.
    ///
    /// # Panics
    ///
    /// Panics if the image is empty.
    pub fn convert(&self, format: PixelFormat) -> Image {
        assert!(!self.is_empty(), "convert() on an empty image");
        let format = format.or(self.format);
        if format == self.format {
            return self.clone();
        }
        let mut out = Image::with_format(self.width, self.height, format);
        for (src, dst) in self
            .data
            .chunks_exact(self.stride)
            .zip(out.data.chunks_exact_mut(out.stride))
        {
            convert_row(src, self.format, dst, format);
        }
        out
    }

    /// Decode from a seekable stream, trying BMP, PNG, TGA, then JPEG.
    ///
    /// `format` selects the output pixel format; `Auto` keeps the source's.
    /// On failure the stream is rewound to where it started.
    pub fn load<R: Read + Seek + ?Sized>(
        reader: &mut R,
        format: PixelFormat,
    ) -> Result<Image, ImageError> {
        DecodeRequest::new()
            .with_pixel_format(format)
            .decode(reader, Unstoppable)
            .map(|out| out.image)
    }

    /// Open and decode an image file.
    pub fn open(path: impl AsRef<Path>, format: PixelFormat) -> Result<Image, ImageError> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::load(&mut reader, format)
    }

    /// Encode into `writer` as `container`.
    ///
    /// `quality` is clamped to 1..=100: JPEG quantization quality, or the
    /// TGA run-length merge tolerance (100 is lossless). `format` selects the
    /// stored pixel format; `Auto` picks the closest one the container holds.
    pub fn write_to<W: Write + ?Sized>(
        &self,
        writer: &mut W,
        container: ImageFormat,
        quality: i32,
        format: PixelFormat,
    ) -> Result<(), ImageError> {
        EncodeRequest::new(container)
            .with_quality(quality)
            .with_pixel_format(format)
            .encode(self, writer, Unstoppable)
    }

    /// Encode to a file. With `container == None` the container comes from
    /// the file extension (`.bmp`, `.tga`, `.jpg`/`.jpeg`, `.png`).
    pub fn save(
        &self,
        path: impl AsRef<Path>,
        quality: i32,
        format: PixelFormat,
        container: Option<ImageFormat>,
    ) -> Result<(), ImageError> {
        let path = path.as_ref();
        let request = match container {
            Some(c) => EncodeRequest::new(c),
            None => EncodeRequest::for_path(path)?,
        };
        if self.is_empty() {
            return Err(ImageError::EmptyImage);
        }
        if !request.container().can_encode() {
            return Err(ImageError::EncodeUnsupported(request.container()));
        }
        let mut writer = BufWriter::new(File::create(path)?);
        request
            .with_quality(quality)
            .with_pixel_format(format)
            .encode(self, &mut writer, Unstoppable)?;
        writer.flush()?;
        Ok(())
    }

    /// Reinterpret the pixel data as a typed pixel slice.
    ///
    /// Returns [`ImageError::UnsupportedVariant`] if the pixel format doesn't match `P`.
    #[cfg(feature = "rgb")]
    pub fn as_pixels<P: crate::TypedPixel>(&self) -> Result<&[P], ImageError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        use rgb::AsPixels as _;
        if self.format != P::format() {
            return Err(ImageError::UnsupportedVariant(format!(
                "image is {:?}, requested {:?} pixels",
                self.format,
                P::format()
            )));
        }
        Ok(self.data().as_pixels())
    }

    /// Zero-copy 2D view of typed pixels.
    #[cfg(feature = "imgref")]
    pub fn as_imgref<P: crate::TypedPixel>(&self) -> Result<imgref::ImgRef<'_, P>, ImageError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        let pixels: &[P] = self.as_pixels()?;
        Ok(imgref::ImgRef::new(
            pixels,
            self.width as usize,
            self.height as usize,
        ))
    }
}
