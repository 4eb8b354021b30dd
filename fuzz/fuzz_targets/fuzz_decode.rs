#![no_main]
use libfuzzer_sys::fuzz_target;
use zenimage::{DecodeRequest, ImageInfo, Limits};

fuzz_target!(|data: &[u8]| {
    let limits = Limits {
        max_pixels: Some(1 << 22),
        ..Default::default()
    };

    // Auto-detect and probe must never panic
    let _ = DecodeRequest::new()
        .with_limits(&limits)
        .decode_bytes(data, enough::Unstoppable);
    let _ = ImageInfo::from_bytes(data);

    // Forced containers, including TGA's header heuristic on foreign data
    for container in zenimage::TRIAL_ORDER {
        let _ = DecodeRequest::new()
            .with_limits(&limits)
            .with_container(container)
            .decode_bytes(data, enough::Unstoppable);
    }
});
