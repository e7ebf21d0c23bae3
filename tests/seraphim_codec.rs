//! Vectors for the Seraphim tag-byte plane decoder and the image-level
//! finishing steps, derived mechanically from the tag grammar.

use vncodec::{decode_cb, decode_cf, decode_ct, decode_plane, read_palette, DecodeError, PlaneUnit};

/// 0x10-byte image header followed by payload bytes.
fn image(signature: [u8; 2], colors: u16, width: u16, height: u16, packed_size: i32, payload: &[u8]) -> Vec<u8> {
    let mut file = Vec::with_capacity(0x10 + payload.len());
    file.extend_from_slice(&signature);
    file.extend_from_slice(&colors.to_le_bytes());
    file.extend_from_slice(&0i16.to_le_bytes());
    file.extend_from_slice(&0i16.to_le_bytes());
    file.extend_from_slice(&width.to_le_bytes());
    file.extend_from_slice(&height.to_le_bytes());
    file.extend_from_slice(&packed_size.to_le_bytes());
    file.extend_from_slice(payload);
    file
}

#[test]
fn short_literal_then_short_fill() {
    // 0x05: literal, count (5 & 0x3F) + 1 = 6; 0x41: fill, count 3.
    let input = [0x05, 1, 2, 3, 4, 5, 6, 0x41, 0xAA];
    let out = decode_plane(&input, 3, 3, PlaneUnit::Index).unwrap();
    assert_eq!(out, [1, 2, 3, 4, 5, 6, 0xAA, 0xAA, 0xAA]);
}

#[test]
fn medium_fill_has_12_bit_count() {
    // 0x80 submode 0: count = 7 + 2 = 9.
    let input = [0x80, 0x07, 0x55];
    let out = decode_plane(&input, 3, 3, PlaneUnit::Index).unwrap();
    assert_eq!(out, [0x55; 9]);
}

#[test]
fn copy_one_row_back_replicates_first_row() {
    // Literal row, then 0x90 (submode 1): count 8 from one row back.
    // The copy overlaps its own output and repeats the row twice.
    let input = [0x03, 10, 20, 30, 40, 0x90, 0x07];
    let out = decode_plane(&input, 4, 3, PlaneUnit::Index).unwrap();
    assert_eq!(out, [10, 20, 30, 40, 10, 20, 30, 40, 10, 20, 30, 40]);
}

#[test]
fn copy_two_rows_back() {
    let input = [0x03, 1, 2, 3, 4, 0xA0, 0x03];
    let out = decode_plane(&input, 2, 4, PlaneUnit::Index).unwrap();
    assert_eq!(out, [1, 2, 3, 4, 1, 2, 3, 4]);
}

#[test]
fn rgb_three_byte_pattern_tile() {
    // 0xC0: 3-byte pattern, repeat = 6 + 1; total (7 + 1) * 3 = 24.
    let input = [0xC0, 0x06, 9, 8, 7];
    let out = decode_plane(&input, 4, 2, PlaneUnit::Rgb).unwrap();
    let expect: Vec<u8> = [9, 8, 7].repeat(8);
    assert_eq!(out, expect);
}

#[test]
fn rgb_six_byte_pattern_tile() {
    // 0xC8: 6-byte (two-pixel) pattern, repeat = 4 + 1; total 36.
    let input = [0xC8, 0x04, 1, 2, 3, 4, 5, 6];
    let out = decode_plane(&input, 4, 3, PlaneUnit::Rgb).unwrap();
    let expect: Vec<u8> = [1, 2, 3, 4, 5, 6].repeat(6);
    assert_eq!(out, expect);
}

#[test]
fn index_plane_block_tile() {
    // 0xC8 in a single-byte plane: block size 4, repeat = 1 + 1.
    let input = [0xC8, 0x01, 0xA, 0xB, 0xC, 0xD];
    let out = decode_plane(&input, 4, 3, PlaneUnit::Index).unwrap();
    let expect: Vec<u8> = [0xA, 0xB, 0xC, 0xD].repeat(3);
    assert_eq!(out, expect);
}

#[test]
fn rgb_pixel_back_reference() {
    // Two literal pixels, then 0xD0: distance 1 pixel, count 2 pixels;
    // source = dst - 3 - 3 = 0.
    let input = [0x05, 1, 2, 3, 4, 5, 6, 0xD0, 0x01, 0x01];
    let out = decode_plane(&input, 4, 1, PlaneUnit::Rgb).unwrap();
    assert_eq!(out, [1, 2, 3, 4, 5, 6, 1, 2, 3, 4, 5, 6]);
}

#[test]
fn byte_back_reference_with_distance_zero_repeats_last_byte() {
    // 0xE0 distance 0: source = dst - 1; increasing-order copy smears
    // the preceding byte across the run.
    let input = [0x00, 0x42, 0xE0, 0x00, 0x02];
    let out = decode_plane(&input, 4, 1, PlaneUnit::Index).unwrap();
    assert_eq!(out, [0x42; 4]);
}

#[test]
fn f0_high_nibble_is_invalid_for_both_units() {
    for unit in [PlaneUnit::Rgb, PlaneUnit::Index] {
        let err = decode_plane(&[0xF3], 2, 2, unit).unwrap_err();
        assert_eq!(err, DecodeError::InvalidTag(0xF3));
    }
}

#[test]
fn exhausted_input_is_truncated() {
    let err = decode_plane(&[0x05, 1, 2], 3, 3, PlaneUnit::Index).unwrap_err();
    assert!(matches!(err, DecodeError::TruncatedInput(_)));
    let err = decode_plane(&[], 3, 3, PlaneUnit::Index).unwrap_err();
    assert!(matches!(err, DecodeError::TruncatedInput(_)));
}

#[test]
fn row_reference_before_output_start_is_rejected() {
    let err = decode_plane(&[0x90, 0x00], 4, 2, PlaneUnit::Index).unwrap_err();
    assert!(matches!(err, DecodeError::BadReference { .. }));
}

#[test]
fn fill_past_plane_end_is_rejected() {
    let err = decode_plane(&[0x41, 0xAA], 2, 1, PlaneUnit::Index).unwrap_err();
    assert!(matches!(err, DecodeError::OutputOverrun { .. }));
}

#[test]
fn palette_is_padded_to_256_entries() {
    let input = [10, 20, 30, 40, 50, 60];
    let palette = read_palette(&input, 2).unwrap();
    assert_eq!(palette.len(), 256);
    assert_eq!(palette[0], [10, 20, 30]);
    assert_eq!(palette[1], [40, 50, 60]);
    assert!(palette[2..].iter().all(|c| *c == [0, 0, 0]));
}

#[test]
fn short_palette_is_truncated_input() {
    let err = read_palette(&[1, 2, 3], 2).unwrap_err();
    assert!(matches!(err, DecodeError::TruncatedInput(_)));
}

#[test]
fn cf_image_is_flipped_vertically() {
    let mut payload = vec![0x0B];
    payload.extend(0u8..12);
    let file = image(*b"CF", 0, 2, 2, payload.len() as i32, &payload);
    let img = decode_cf(&file).unwrap();
    assert_eq!(img.bpp, 24);
    // Source rows are stored bottom-to-top.
    assert_eq!(img.pixels, [6, 7, 8, 9, 10, 11, 0, 1, 2, 3, 4, 5]);
}

#[test]
fn ct_image_merges_inverted_alpha() {
    // RGB plane: one literal of 6 bytes. Alpha plane at
    // 0x10 + packed_size + 4: opacities 0 and 100 (percent).
    let rgb = [0x05, 1, 2, 3, 4, 5, 6];
    let mut payload = rgb.to_vec();
    payload.extend_from_slice(&[0; 4]); // alpha section size field
    payload.extend_from_slice(&[0x01, 0, 100]);
    let file = image(*b"CT", 0, 2, 1, rgb.len() as i32, &payload);
    let img = decode_ct(&file).unwrap();
    assert_eq!(img.bpp, 32);
    assert_eq!(img.pixels, [1, 2, 3, 255, 4, 5, 6, 0]);
}

#[test]
fn cb_image_reads_palette_then_flips_rows() {
    let mut payload = vec![1, 2, 3, 4, 5, 6]; // two palette entries
    let plane = [0x03, 0, 1, 1, 0];
    payload.extend_from_slice(&plane);
    let file = image(*b"CB", 2, 2, 2, plane.len() as i32, &payload);
    let img = decode_cb(&file).unwrap();
    assert_eq!(img.bpp, 8);
    assert_eq!(img.pixels, [1, 0, 0, 1]);
    let palette = img.palette.unwrap();
    assert_eq!(palette[0], [1, 2, 3]);
    assert_eq!(palette[1], [4, 5, 6]);
}
