use std::io::{Cursor, Seek, SeekFrom};

use enough::Unstoppable;
use zenimage::*;

fn pattern(w: u32, h: u32, format: PixelFormat) -> Image {
    let mut image = Image::with_format(w, h, format);
    for y in 0..h {
        for x in 0..w {
            for (c, v) in image.pixel_mut(x, y).iter_mut().enumerate() {
                *v = (x * 37 + y * 11 + c as u32 * 71) as u8;
            }
        }
    }
    image
}

fn decode_stream(bytes: &[u8], format: PixelFormat) -> DecodeOutput {
    DecodeRequest::new()
        .with_pixel_format(format)
        .decode(&mut Cursor::new(bytes), Unstoppable)
        .unwrap()
}

// ── BMP ──────────────────────────────────────────────────────────────

#[test]
fn bmp_roundtrip_bgr8() {
    let image = pattern(3, 2, PixelFormat::Bgr8);
    let encoded = EncodeRequest::bmp().encode_to_vec(&image, Unstoppable).unwrap();
    assert_eq!(&encoded[0..2], b"BM");

    let decoded = decode_stream(&encoded, PixelFormat::Auto);
    assert_eq!(decoded.container, ImageFormat::Bmp);
    assert_eq!(decoded.image, image);
}

#[test]
fn bmp_roundtrip_rgba8() {
    let image = pattern(5, 3, PixelFormat::Rgba8);
    let encoded = EncodeRequest::bmp().encode_to_vec(&image, Unstoppable).unwrap();

    let decoded = decode_stream(&encoded, PixelFormat::Auto);
    assert_eq!(decoded.image.format(), PixelFormat::Bgra8);
    let decoded = decode_stream(&encoded, PixelFormat::Rgba8);
    assert_eq!(decoded.image, image);
}

#[test]
fn bmp_roundtrip_every_pixel_format() {
    for format in PixelFormat::CONCRETE {
        let image = pattern(7, 5, format);
        let encoded = EncodeRequest::bmp().encode_to_vec(&image, Unstoppable).unwrap();
        // Gray8 is stored as BGR and averages back to the same value.
        let decoded = decode_stream(&encoded, format);
        assert_eq!(decoded.image, image, "{format:?}");
    }
}

// ── TGA ──────────────────────────────────────────────────────────────

#[test]
fn tga_roundtrip_raw_and_rle() {
    for format in PixelFormat::CONCRETE {
        let image = pattern(9, 4, format);
        for rle in [false, true] {
            let encoded = EncodeRequest::tga()
                .with_quality(100)
                .with_rle(rle)
                .encode_to_vec(&image, Unstoppable)
                .unwrap();
            let decoded = decode_stream(&encoded, format);
            assert_eq!(decoded.container, ImageFormat::Tga);
            assert_eq!(decoded.image, image, "{format:?} rle={rle}");
        }
    }
}

#[test]
fn tga_lossy_rle_stays_within_tolerance() {
    let mut image = Image::with_format(32, 8, PixelFormat::Rgb8);
    for y in 0..8 {
        for x in 0..32 {
            // slow ramp: neighbours differ by at most 2 per channel
            let v = (x * 2 + y) as u8;
            image.pixel_mut(x, y).copy_from_slice(&[v, v / 2, 255 - v]);
        }
    }

    for quality in [1, 40, 80] {
        let tolerance = i32::from(rle_tolerance(quality as u8));
        let encoded = EncodeRequest::tga()
            .with_quality(quality)
            .encode_to_vec(&image, Unstoppable)
            .unwrap();
        let decoded = decode_stream(&encoded, PixelFormat::Rgb8).image;
        for (a, b) in image.data().iter().zip(decoded.data()) {
            assert!(
                (i32::from(*a) - i32::from(*b)).abs() <= tolerance,
                "quality {quality}: {a} vs {b}"
            );
        }
        let lossless = EncodeRequest::tga()
            .with_quality(100)
            .encode_to_vec(&image, Unstoppable)
            .unwrap();
        assert!(encoded.len() <= lossless.len());
    }
}

#[test]
fn tga_top_right_origin() {
    // 2x2 raw Gray8 TGA stored top-down and right-to-left
    let mut data = vec![0u8; 18];
    data[2] = 3;
    data[12] = 2;
    data[14] = 2;
    data[16] = 8;
    data[17] = 0x20 | 0x10;
    data.extend_from_slice(&[1, 2, 3, 4]);

    let decoded = decode_stream(&data, PixelFormat::Auto).image;
    assert_eq!(decoded.data(), &[2, 1, 4, 3]);
}

#[test]
fn tga_16_bit_expands_to_bgra() {
    let mut data = vec![0u8; 18];
    data[2] = 2;
    data[12] = 1;
    data[14] = 1;
    data[16] = 16;
    // pure blue, attribute bit set
    data.extend_from_slice(&[0b1111_1000, 0b0000_0001]);

    let decoded = decode_stream(&data, PixelFormat::Auto).image;
    assert_eq!(decoded.format(), PixelFormat::Bgra8);
    assert_eq!(decoded.data(), &[0xF8, 0, 0, 0x80]);
}

#[test]
fn tga_rle_packet_spans_rows() {
    // 3x2 Gray8, one run of 4 then a literal of 2
    let mut data = vec![0u8; 18];
    data[2] = 11;
    data[12] = 3;
    data[14] = 2;
    data[16] = 8;
    data.extend_from_slice(&[0x83, 9, 0x01, 5, 6]);

    let decoded = decode_stream(&data, PixelFormat::Auto).image;
    // bottom row first: [9 9 9] then [9 5 6]
    assert_eq!(decoded.data(), &[9, 5, 6, 9, 9, 9]);
}

// ── JPEG ─────────────────────────────────────────────────────────────

#[cfg(feature = "jpeg")]
fn smooth(w: u32, h: u32, format: PixelFormat) -> Image {
    let mut image = Image::with_format(w, h, format);
    for y in 0..h {
        for x in 0..w {
            for (c, v) in image.pixel_mut(x, y).iter_mut().enumerate() {
                *v = (64 + x * 4 + y * 2 + c as u32 * 8) as u8;
            }
        }
    }
    image
}

#[cfg(feature = "jpeg")]
#[test]
fn jpeg_roundtrip_is_close() {
    let image = smooth(32, 24, PixelFormat::Rgb8);
    let encoded = EncodeRequest::jpeg()
        .with_quality(95)
        .encode_to_vec(&image, Unstoppable)
        .unwrap();
    assert_eq!(&encoded[..2], &[0xFF, 0xD8]);

    let decoded = decode_stream(&encoded, PixelFormat::Auto);
    assert_eq!(decoded.container, ImageFormat::Jpeg);
    assert_eq!(decoded.image.format(), PixelFormat::Rgb8);
    assert_eq!((decoded.image.width(), decoded.image.height()), (32, 24));

    let max_diff = image
        .data()
        .iter()
        .zip(decoded.image.data())
        .map(|(a, b)| (i32::from(*a) - i32::from(*b)).abs())
        .max()
        .unwrap();
    assert!(max_diff <= 12, "max diff {max_diff}");
}

#[cfg(feature = "jpeg")]
#[test]
fn jpeg_gray_and_converted_output() {
    let image = smooth(16, 16, PixelFormat::Gray8);
    let encoded = encode_jpeg(&image, 90, Unstoppable).unwrap();
    let info = ImageInfo::from_bytes(&encoded).unwrap();
    assert_eq!(info.container, ImageFormat::Jpeg);
    assert_eq!(info.native_format, PixelFormat::Gray8);

    let decoded = decode_stream(&encoded, PixelFormat::Bgra8).image;
    assert_eq!(decoded.format(), PixelFormat::Bgra8);
    assert!(decoded.data().chunks_exact(4).all(|px| px[3] == 255 && px[0] == px[2]));
}

#[cfg(feature = "jpeg")]
#[test]
fn jpeg_lower_quality_is_smaller() {
    let image = pattern(64, 64, PixelFormat::Rgb8);
    let high = encode_jpeg(&image, 95, Unstoppable).unwrap();
    let low = encode_jpeg(&image, 10, Unstoppable).unwrap();
    assert!(low.len() < high.len());
}

// ── PNG ──────────────────────────────────────────────────────────────

#[cfg(feature = "png")]
fn png_bytes(image: &Image) -> Vec<u8> {
    let color = match image.format() {
        PixelFormat::Gray8 => png::ColorType::Grayscale,
        PixelFormat::Rgb8 => png::ColorType::Rgb,
        PixelFormat::Rgba8 => png::ColorType::Rgba,
        other => panic!("no PNG color type for {other:?}"),
    };
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, image.width(), image.height());
        encoder.set_color(color);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(image.data()).unwrap();
    }
    out
}

#[cfg(feature = "png")]
#[test]
fn png_decodes_each_color_type() {
    for format in [PixelFormat::Gray8, PixelFormat::Rgb8, PixelFormat::Rgba8] {
        let image = pattern(6, 5, format);
        let decoded = decode_stream(&png_bytes(&image), PixelFormat::Auto);
        assert_eq!(decoded.container, ImageFormat::Png);
        assert_eq!(decoded.image, image, "{format:?}");
    }
}

#[cfg(feature = "png")]
#[test]
fn png_to_bmp_transcode() {
    let image = pattern(4, 4, PixelFormat::Rgba8);
    let decoded = decode_stream(&png_bytes(&image), PixelFormat::Auto).image;
    let bmp = encode_bmp(&decoded, Unstoppable).unwrap();
    let back = decode_stream(&bmp, PixelFormat::Rgba8).image;
    assert_eq!(back, image);
}

#[test]
fn png_encode_is_unsupported() {
    let image = pattern(2, 2, PixelFormat::Rgb8);
    let mut out = Vec::new();
    let err = EncodeRequest::png().encode(&image, &mut out, Unstoppable).unwrap_err();
    assert!(matches!(err, ImageError::EncodeUnsupported(ImageFormat::Png)));
    assert!(!ImageFormat::Png.can_encode());
}

// ── Dispatch ─────────────────────────────────────────────────────────

#[cfg(feature = "png")]
#[test]
fn png_passes_through_other_decoders_untouched() {
    let image = pattern(3, 3, PixelFormat::Rgb8);
    let mut cursor = Cursor::new(png_bytes(&image));

    for container in [ImageFormat::Bmp, ImageFormat::Tga, ImageFormat::Jpeg] {
        let err = DecodeRequest::new()
            .with_container(container)
            .decode(&mut cursor, Unstoppable)
            .unwrap_err();
        assert!(err.is_unrecognized(), "{container:?}: {err:?}");
        assert_eq!(cursor.position(), 0);
    }

    let decoded = DecodeRequest::new().decode(&mut cursor, Unstoppable).unwrap();
    assert_eq!(decoded.container, ImageFormat::Png);
    assert_eq!(decoded.image, image);
}

#[test]
fn stream_offset_is_respected() {
    let image = pattern(4, 3, PixelFormat::Bgr8);
    let mut bytes = b"prefix".to_vec();
    bytes.extend(encode_tga(&image, 100, Unstoppable).unwrap());
    bytes.extend_from_slice(b"trailer");

    let mut cursor = Cursor::new(bytes);
    cursor.seek(SeekFrom::Start(6)).unwrap();
    let decoded = DecodeRequest::new().decode(&mut cursor, Unstoppable).unwrap();
    assert_eq!(decoded.image, image);
    let end = cursor.get_ref().len() as u64 - 7;
    assert_eq!(cursor.position(), end);
}

#[test]
fn failed_decode_rewinds_to_start() {
    let mut bytes = b"xx".to_vec();
    let mut bmp = encode_bmp(&pattern(4, 4, PixelFormat::Bgr8), Unstoppable).unwrap();
    bmp.truncate(bmp.len() - 5);
    bytes.extend(bmp);

    let mut cursor = Cursor::new(bytes);
    cursor.set_position(2);
    let err = DecodeRequest::new().decode(&mut cursor, Unstoppable).unwrap_err();
    assert!(matches!(err, ImageError::UnexpectedEof), "{err:?}");
    assert_eq!(cursor.position(), 2);
}

// ── Probing, limits, files ───────────────────────────────────────────

#[test]
fn image_info_probe_rewinds() {
    let encoded = encode_bmp(&pattern(3, 7, PixelFormat::Rgba8), Unstoppable).unwrap();
    let mut cursor = Cursor::new(encoded);
    let info = ImageInfo::probe(&mut cursor).unwrap();
    assert_eq!((info.width, info.height), (3, 7));
    assert_eq!(info.container, ImageFormat::Bmp);
    assert_eq!(info.native_format, PixelFormat::Bgra8);
    assert_eq!(cursor.position(), 0);
}

#[test]
fn limits_reject_large() {
    let encoded = encode_tga(&pattern(4, 4, PixelFormat::Gray8), 100, Unstoppable).unwrap();
    let limits = Limits {
        max_pixels: Some(15),
        ..Default::default()
    };

    let mut cursor = Cursor::new(encoded);
    let result = DecodeRequest::new()
        .with_limits(&limits)
        .decode(&mut cursor, Unstoppable);
    match result {
        Err(ImageError::LimitExceeded(_)) => {}
        other => panic!("expected LimitExceeded, got {other:?}"),
    }
    assert_eq!(cursor.position(), 0);
}

#[test]
fn save_and_open_by_extension() {
    let dir = std::env::temp_dir().join(format!("zenimage-roundtrip-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let image = pattern(5, 4, PixelFormat::Rgb8);

    for name in ["out.bmp", "out.TGA"] {
        let path = dir.join(name);
        image.save(&path, 100, PixelFormat::Auto, None).unwrap();
        let loaded = Image::open(&path, PixelFormat::Rgb8).unwrap();
        assert_eq!(loaded, image, "{name}");
    }

    let err = image.save(dir.join("out.gif"), 100, PixelFormat::Auto, None).unwrap_err();
    assert!(matches!(err, ImageError::UnknownContainer(_)));
    let err = image.save(dir.join("out.png"), 100, PixelFormat::Auto, None).unwrap_err();
    assert!(matches!(err, ImageError::EncodeUnsupported(ImageFormat::Png)));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn empty_image_cannot_be_saved() {
    let err = Image::new()
        .write_to(&mut Vec::<u8>::new(), ImageFormat::Bmp, 100, PixelFormat::Auto)
        .unwrap_err();
    assert!(matches!(err, ImageError::EmptyImage));
}
