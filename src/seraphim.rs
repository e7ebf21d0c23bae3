//! Seraphim engine image formats: CF (24-bit), CT (24-bit + alpha
//! plane, merged to 32-bit) and CB (8-bit paletted). A 0x10-byte header
//! precedes the packed plane data; pixel rows are stored bottom-to-top
//! and flipped while finishing.

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::error::DecodeError;
use crate::plane::{decode_plane, PlaneUnit};

pub const CF_SIGNATURE: u32 = 0x4643;
pub const CT_SIGNATURE: u32 = 0x5443;

/// Parsed 0x10-byte image header.
///
/// Layout (little-endian):
///   0x00 signature ("CF\0\0" / "CT\0\0", or "CB" + u16 color count)
///   0x04 i16 offset_x
///   0x06 i16 offset_y
///   0x08 u16 width
///   0x0A u16 height
///   0x0C i32 packed_size
#[derive(Debug, Clone, Serialize)]
pub struct SeraphMetaData {
    pub offset_x: i16,
    pub offset_y: i16,
    pub width: u16,
    pub height: u16,
    pub bpp: u8,
    pub packed_size: usize,
    pub colors: u16,
}

/// A fully decoded image. `pixels` is row-major top-to-bottom, in the
/// stored byte order (BGR for 24-bit, BGRA for 32-bit, palette indices
/// for 8-bit).
#[derive(Debug, Clone)]
pub struct SeraphImage {
    pub width: u16,
    pub height: u16,
    pub bpp: u8,
    pub offset_x: i16,
    pub offset_y: i16,
    pub pixels: Vec<u8>,
    pub palette: Option<Vec<[u8; 3]>>,
}

fn parse_header(data: &[u8], bpp: u8, colors: u16) -> Result<SeraphMetaData> {
    if data.len() < 0x10 {
        bail!("file too short for a 0x10-byte header");
    }
    let packed_size = i32::from_le_bytes(data[12..16].try_into().unwrap());
    if packed_size <= 0 || packed_size as usize > data.len() - 0x10 {
        bail!("implausible packed size {}", packed_size);
    }
    let width = u16::from_le_bytes(data[8..10].try_into().unwrap());
    let height = u16::from_le_bytes(data[10..12].try_into().unwrap());
    if width == 0 || height == 0 {
        bail!("zero image dimension {}x{}", width, height);
    }
    Ok(SeraphMetaData {
        offset_x: i16::from_le_bytes(data[4..6].try_into().unwrap()),
        offset_y: i16::from_le_bytes(data[6..8].try_into().unwrap()),
        width,
        height,
        bpp,
        packed_size: packed_size as usize,
        colors,
    })
}

/// Parse a CF header (24-bit image).
pub fn read_cf_header(data: &[u8]) -> Result<SeraphMetaData> {
    if data.len() < 4 || u32::from_le_bytes(data[0..4].try_into().unwrap()) != CF_SIGNATURE {
        bail!("not a CF image");
    }
    parse_header(data, 24, 0)
}

/// Parse a CT header (24-bit image with a trailing alpha plane).
pub fn read_ct_header(data: &[u8]) -> Result<SeraphMetaData> {
    if data.len() < 4 || u32::from_le_bytes(data[0..4].try_into().unwrap()) != CT_SIGNATURE {
        bail!("not a CT image");
    }
    parse_header(data, 32, 0)
}

/// Parse a CB header (8-bit paletted image).
pub fn read_cb_header(data: &[u8]) -> Result<SeraphMetaData> {
    if data.len() < 4 || data[0] != b'C' || data[1] != b'B' {
        bail!("not a CB image");
    }
    let colors = u16::from_le_bytes(data[2..4].try_into().unwrap());
    parse_header(data, 8, colors)
}

/// Read `colors * 3` RGB bytes into a 256-entry palette. The working
/// buffer is padded to at least 0x300 bytes, so entries past
/// `colors` come out zeroed.
pub fn read_palette(input: &[u8], colors: u16) -> Result<Vec<[u8; 3]>, DecodeError> {
    let palette_size = usize::from(colors) * 3;
    if input.len() < palette_size {
        return Err(DecodeError::TruncatedInput(input.len()));
    }
    let mut padded = vec![0u8; palette_size.max(0x300)];
    padded[..palette_size].copy_from_slice(&input[..palette_size]);
    let palette = padded[..0x300]
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();
    Ok(palette)
}

/// Decode a CF image: one RGB plane, flipped vertically.
pub fn decode_cf(data: &[u8]) -> Result<SeraphImage> {
    let meta = read_cf_header(data)?;
    log::debug!("CF {}x{}, {} packed bytes", meta.width, meta.height, meta.packed_size);
    let plane = decode_plane(
        &data[0x10..],
        meta.width.into(),
        meta.height.into(),
        PlaneUnit::Rgb,
    )
    .context("CF pixel plane")?;
    let stride = usize::from(meta.width) * 3;
    Ok(SeraphImage {
        width: meta.width,
        height: meta.height,
        bpp: 24,
        offset_x: meta.offset_x,
        offset_y: meta.offset_y,
        pixels: flip_vertical(&plane, stride),
        palette: None,
    })
}

/// Decode a CT image: an RGB plane plus an alpha plane located at
/// `0x10 + packed_size + 4`, merged into 4-byte pixels. The merge walks
/// source rows bottom-to-top, so the flip is folded in.
pub fn decode_ct(data: &[u8]) -> Result<SeraphImage> {
    let meta = read_ct_header(data)?;
    log::debug!("CT {}x{}, {} packed bytes", meta.width, meta.height, meta.packed_size);
    let w = usize::from(meta.width);
    let h = usize::from(meta.height);
    let rgb = decode_plane(&data[0x10..], meta.width.into(), meta.height.into(), PlaneUnit::Rgb)
        .context("CT pixel plane")?;

    let alpha_offset = 0x10 + meta.packed_size + 4;
    if alpha_offset > data.len() {
        bail!("alpha plane offset {:#x} past end of file", alpha_offset);
    }
    let alpha = decode_plane(
        &data[alpha_offset..],
        meta.width.into(),
        meta.height.into(),
        PlaneUnit::Index,
    )
    .context("CT alpha plane")?;

    let stride = w * 3;
    let mut pixels = vec![0u8; w * h * 4];
    let mut dst = 0;
    for y in (0..h).rev() {
        let mut src_rgb = y * stride;
        let mut src_a = y * w;
        for _ in 0..w {
            pixels[dst] = rgb[src_rgb];
            pixels[dst + 1] = rgb[src_rgb + 1];
            pixels[dst + 2] = rgb[src_rgb + 2];
            // Alpha is a 0..100 opacity percentage, inverted on output.
            let v = (u32::from(alpha[src_a]) * 0xFF / 0x64).min(0xFF) as u8;
            pixels[dst + 3] = !v;
            src_rgb += 3;
            src_a += 1;
            dst += 4;
        }
    }
    Ok(SeraphImage {
        width: meta.width,
        height: meta.height,
        bpp: 32,
        offset_x: meta.offset_x,
        offset_y: meta.offset_y,
        pixels,
        palette: None,
    })
}

/// Decode a CB image: optional palette at 0x10, then one index plane,
/// flipped vertically.
pub fn decode_cb(data: &[u8]) -> Result<SeraphImage> {
    let meta = read_cb_header(data)?;
    log::debug!(
        "CB {}x{}, {} colors, {} packed bytes",
        meta.width,
        meta.height,
        meta.colors,
        meta.packed_size
    );
    let mut pos = 0x10;
    let palette = if meta.colors > 0 {
        let p = read_palette(&data[pos..], meta.colors).context("CB palette")?;
        pos += usize::from(meta.colors) * 3;
        Some(p)
    } else {
        None
    };
    let plane = decode_plane(
        &data[pos..],
        meta.width.into(),
        meta.height.into(),
        PlaneUnit::Index,
    )
    .context("CB index plane")?;
    Ok(SeraphImage {
        width: meta.width,
        height: meta.height,
        bpp: 8,
        offset_x: meta.offset_x,
        offset_y: meta.offset_y,
        pixels: flip_vertical(&plane, meta.width.into()),
        palette,
    })
}

/// Reverse the row order of a row-major buffer.
fn flip_vertical(plane: &[u8], stride: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(plane.len());
    for row in plane.chunks_exact(stride).rev() {
        out.extend_from_slice(row);
    }
    out
}
