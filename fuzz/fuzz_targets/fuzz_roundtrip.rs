#![no_main]
use libfuzzer_sys::fuzz_target;
use zenimage::*;

fuzz_target!(|data: &[u8]| {
    let limits = Limits {
        max_pixels: Some(1 << 20),
        ..Default::default()
    };
    let Ok(decoded) = DecodeRequest::new()
        .with_limits(&limits)
        .decode_bytes(data, enough::Unstoppable)
    else {
        return;
    };
    let image = decoded.image;

    // Lossless containers must give back identical pixels
    let lossless = [
        EncodeRequest::bmp(),
        EncodeRequest::tga().with_quality(100),
        EncodeRequest::tga().with_rle(false),
    ];
    for request in lossless {
        let Ok(encoded) = request.encode_to_vec(&image, enough::Unstoppable) else {
            continue;
        };
        let Ok(again) = DecodeRequest::new()
            .with_pixel_format(image.format())
            .decode_bytes(&encoded, enough::Unstoppable)
        else {
            panic!("re-encoded {:?} failed to decode", request.container());
        };
        assert_eq!(again.container, request.container());
        assert_eq!(again.image, image, "{:?} roundtrip pixel mismatch", request.container());
    }
});
