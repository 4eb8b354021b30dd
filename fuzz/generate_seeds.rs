#!/usr/bin/env -S cargo +nightly -Zscript
//! Generate seed corpus files for fuzzing.
//! Run: cargo +nightly -Zscript fuzz/generate_seeds.rs

fn main() {
    use std::fs;
    let dir = "fuzz/corpus/fuzz_decode";
    fs::create_dir_all(dir).unwrap();

    // Minimal BMP 1x1 24-bit
    let mut bmp = vec![0u8; 58]; // 54 header + 4 pixel (3 + 1 padding)
    bmp[0] = b'B'; bmp[1] = b'M';
    bmp[2..6].copy_from_slice(&58u32.to_le_bytes()); // file size
    bmp[10..14].copy_from_slice(&54u32.to_le_bytes()); // data offset
    bmp[14..18].copy_from_slice(&40u32.to_le_bytes()); // info header size
    bmp[18..22].copy_from_slice(&1i32.to_le_bytes()); // width
    bmp[22..26].copy_from_slice(&(-1i32).to_le_bytes()); // height, top-down
    bmp[26..28].copy_from_slice(&1u16.to_le_bytes()); // planes
    bmp[28..30].copy_from_slice(&24u16.to_le_bytes()); // bpp
    bmp[54] = 0xff; // BGR
    fs::write(format!("{dir}/bmp_1x1.bmp"), bmp).unwrap();

    // TGA 2x2 raw 24-bit, bottom-left origin
    let mut tga = vec![0u8; 18];
    tga[2] = 2;
    tga[12] = 2; tga[14] = 2;
    tga[16] = 24;
    tga.extend_from_slice(&[0, 0, 255, 0, 255, 0, 255, 0, 0, 128, 128, 128]);
    fs::write(format!("{dir}/tga_raw_2x2.tga"), tga).unwrap();

    // TGA 3x2 RLE grayscale, top-left origin: run of 4, literal of 2
    let mut tga_rle = vec![0u8; 18];
    tga_rle[2] = 11;
    tga_rle[12] = 3; tga_rle[14] = 2;
    tga_rle[16] = 8;
    tga_rle[17] = 0x20;
    tga_rle.extend_from_slice(&[0x83, 50, 0x01, 100, 200]);
    fs::write(format!("{dir}/tga_rle_gray_3x2.tga"), tga_rle).unwrap();

    // TGA 1x1 16-bit with attribute bit
    let mut tga16 = vec![0u8; 18];
    tga16[2] = 2;
    tga16[12] = 1; tga16[14] = 1;
    tga16[16] = 16;
    tga16[17] = 1;
    tga16.extend_from_slice(&[0x1f, 0x80]);
    fs::write(format!("{dir}/tga_16_1x1.tga"), tga16).unwrap();

    // Truncated/malformed seeds for edge coverage
    fs::write(format!("{dir}/empty.bin"), b"").unwrap();
    fs::write(format!("{dir}/bm_short.bin"), b"BM\x00\x00").unwrap();
    fs::write(format!("{dir}/soi_only.bin"), b"\xff\xd8").unwrap();
    fs::write(format!("{dir}/png_sig_only.bin"), b"\x89PNG\r\n\x1a\n").unwrap();
    fs::write(format!("{dir}/tga_header_only.bin"), [0u8, 0, 10, 0, 0, 0, 0, 0, 0, 0, 0, 0, 4, 0, 4, 0, 32, 8]).unwrap();

    println!("Generated seed corpus in {dir}/");
}
