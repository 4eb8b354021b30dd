//! # zenimage
//!
//! BMP, TGA, JPEG and PNG decoding and encoding into one in-memory bitmap.
//!
//! Every decoder fills an [`Image`]: a packed, top-down pixel grid in one of
//! five 8-bit [`PixelFormat`]s. Any format converts to any other through a
//! fixed conversion matrix ([`convert`]).
//!
//! ## Supported Formats
//!
//! ### BMP (`bmp` feature)
//! - Decode and encode of uncompressed BMP (24-bit BGR, 32-bit BGRA)
//! - Bottom-up and top-down row order
//!
//! ### TGA (`tga` feature)
//! - True-color (16/24/32-bit) and grayscale, raw or run-length encoded
//! - Lossy run-length encoding: lower quality merges near-identical pixels
//!
//! ### JPEG (`jpeg` feature)
//! - Grayscale, RGB and 4-component decode via `jpeg-decoder`
//! - Baseline encode via the `image` crate's JPEG encoder
//!
//! ### PNG (`png` feature)
//! - Grayscale, RGB and RGBA decode via the `png` crate
//! - Encoding is not supported
//!
//! ## Format Detection
//!
//! Streams carry no out-of-band type. [`DecodeRequest::decode`] tries BMP,
//! PNG, TGA, then JPEG. A decoder that does not recognize its signature
//! rewinds the stream and hands over to the next one; once a signature
//! matches, its result (success or error) is final.
//!
//! ## Non-Goals
//!
//! - Color-mapped, compressed or sub-24-bit BMP
//! - Color-mapped TGA
//! - Progressive or animated output, color management
//!
//! ## Usage
//!
//! ```no_run
//! use zenimage::{DecodeRequest, EncodeRequest, Image, ImageInfo, PixelFormat, Unstoppable};
//!
//! let mut file = std::io::BufReader::new(std::fs::File::open("sprite.tga")?);
//!
//! // Probe without decoding
//! let info = ImageInfo::probe(&mut file)?;
//! println!("{}x{} {:?}", info.width, info.height, info.container);
//!
//! // Decode, converting to RGBA
//! let decoded = DecodeRequest::new()
//!     .with_pixel_format(PixelFormat::Rgba8)
//!     .decode(&mut file, Unstoppable)?;
//!
//! // Encode to JPEG
//! let jpeg = EncodeRequest::jpeg()
//!     .with_quality(90)
//!     .encode_to_vec(&decoded.image, Unstoppable)?;
//!
//! // Or go through files directly
//! let image = Image::open("sprite.tga", PixelFormat::Auto)?;
//! image.save("sprite.bmp", 100, PixelFormat::Auto, None)?;
//! # Ok::<(), zenimage::ImageError>(())
//! ```

#![forbid(unsafe_code)]

mod buffer;
mod error;
mod format;
mod info;
mod limits;
mod pixel;
mod stream;

pub mod convert;

#[cfg(any(feature = "jpeg", feature = "png"))]
mod codec;

#[cfg(feature = "bmp")]
mod bmp;
#[cfg(feature = "jpeg")]
mod jpeg;
#[cfg(feature = "png")]
mod png;
#[cfg(feature = "tga")]
mod tga;

mod decode;
mod encode;

// Re-exports
pub use buffer::Image;
pub use decode::{DecodeOutput, DecodeRequest, TRIAL_ORDER};
pub use encode::{EncodeRequest, rle_tolerance};
pub use enough::{Stop, Unstoppable};
pub use error::ImageError;
pub use format::ImageFormat;
pub use info::ImageInfo;
pub use limits::Limits;
pub use pixel::PixelFormat;

#[cfg(feature = "rgb")]
pub use pixel::TypedPixel;

/// Decode an in-memory image of any supported container.
pub fn decode(data: &[u8], stop: impl Stop) -> Result<DecodeOutput, ImageError> {
    DecodeRequest::new().decode_bytes(data, stop)
}

/// Decode an in-memory BMP.
#[cfg(feature = "bmp")]
pub fn decode_bmp(data: &[u8], stop: impl Stop) -> Result<Image, ImageError> {
    decode_only(ImageFormat::Bmp, data, stop)
}

/// Decode an in-memory TGA.
#[cfg(feature = "tga")]
pub fn decode_tga(data: &[u8], stop: impl Stop) -> Result<Image, ImageError> {
    decode_only(ImageFormat::Tga, data, stop)
}

/// Decode an in-memory JPEG.
#[cfg(feature = "jpeg")]
pub fn decode_jpeg(data: &[u8], stop: impl Stop) -> Result<Image, ImageError> {
    decode_only(ImageFormat::Jpeg, data, stop)
}

/// Decode an in-memory PNG.
#[cfg(feature = "png")]
pub fn decode_png(data: &[u8], stop: impl Stop) -> Result<Image, ImageError> {
    decode_only(ImageFormat::Png, data, stop)
}

#[allow(dead_code)]
fn decode_only(container: ImageFormat, data: &[u8], stop: impl Stop) -> Result<Image, ImageError> {
    DecodeRequest::new()
        .with_container(container)
        .decode_bytes(data, stop)
        .map(DecodeOutput::into_image)
}

/// Encode as BMP (24-bit, or 32-bit when the image has alpha).
#[cfg(feature = "bmp")]
pub fn encode_bmp(image: &Image, stop: impl Stop) -> Result<Vec<u8>, ImageError> {
    EncodeRequest::bmp().encode_to_vec(image, stop)
}

/// Encode as run-length compressed TGA. Quality 100 is lossless.
#[cfg(feature = "tga")]
pub fn encode_tga(image: &Image, quality: i32, stop: impl Stop) -> Result<Vec<u8>, ImageError> {
    EncodeRequest::tga().with_quality(quality).encode_to_vec(image, stop)
}

/// Encode as baseline JPEG.
#[cfg(feature = "jpeg")]
pub fn encode_jpeg(image: &Image, quality: i32, stop: impl Stop) -> Result<Vec<u8>, ImageError> {
    EncodeRequest::jpeg().with_quality(quality).encode_to_vec(image, stop)
}
