//! Seraphim plane decoder: a tag-byte state machine shared by the
//! 3-byte-pixel (RGB) rows and the single-byte planes (palette index /
//! alpha). One tag byte selects an operation; the tag grammar is split
//! from the buffer mutation so both can be tested on their own.

use crate::error::DecodeError;

/// Element size of the plane being decoded. It changes both the row
/// stride and which tag ranges are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneUnit {
    /// 3 bytes per pixel, stored BGR.
    Rgb,
    /// 1 byte per element (palette index or alpha).
    Index,
}

impl PlaneUnit {
    pub fn size(self) -> usize {
        match self {
            PlaneUnit::Rgb => 3,
            PlaneUnit::Index => 1,
        }
    }
}

/// One decoded tag operation. Counts are in bytes unless noted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneOp {
    /// Replicate `value` `count` times.
    Fill { count: usize, value: u8 },
    /// Copy `count` bytes verbatim from the input.
    Literal { count: usize },
    /// Copy `count` bytes from `rows_back` rows behind the cursor.
    CopyRows { count: usize, rows_back: usize },
    /// Read a literal block of `block` bytes, then tile it `repeat` more
    /// times by an overlapped forward copy (total `(repeat + 1) * block`
    /// bytes).
    TileBlock { repeat: usize, block: usize },
    /// RGB only: copy `count` whole pixels from `distance` pixels back
    /// (source is `dst - 3 - 3 * distance`).
    CopyPixels { count: usize, distance: usize },
    /// Copy `count` bytes from `dst - 1 - distance`.
    CopyBytes { count: usize, distance: usize },
}

struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or(DecodeError::TruncatedInput(self.pos))?;
        self.pos += 1;
        Ok(b)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.pos + n;
        if end > self.data.len() {
            return Err(DecodeError::TruncatedInput(self.pos));
        }
        let s = &self.data[self.pos..end];
        self.pos = end;
        Ok(s)
    }
}

/// Decode one tag byte (plus its parameter bytes) into an operation.
///
/// Tag ranges, from the engine's dispatch order:
/// - `0x00..=0x7F`: short literal (bit 6 clear) or short fill (bit 6 set);
/// - `0x80..=0xBF`: medium, 12-bit count, submode in bits 5-4
///   (0 = fill, 1/2/3 = copy from 1/2/4 rows back);
/// - RGB `0xC0..=0xCF`: pixel-pattern tile (3- or 6-byte block);
/// - RGB `0xD0..=0xDF`: pixel back-reference;
/// - RGB `0xE0..=0xEF`: byte back-reference;
/// - index `0xC0..=0xDF`: block tile (2/4/8/16-byte block from bits 4-3);
/// - index `0xE0..=0xEF`: byte back-reference;
/// - `0xF0..=0xFF`: invalid.
fn decode_op(input: &mut ByteReader<'_>, unit: PlaneUnit) -> Result<PlaneOp, DecodeError> {
    let v1 = input.u8()?;
    if v1 & 0xF0 == 0xF0 {
        return Err(DecodeError::InvalidTag(v1));
    }
    if v1 & 0x80 == 0 {
        return if v1 & 0x40 != 0 {
            Ok(PlaneOp::Fill {
                count: usize::from(v1 & 0x3F) + 2,
                value: input.u8()?,
            })
        } else {
            Ok(PlaneOp::Literal {
                count: usize::from(v1 & 0x3F) + 1,
            })
        };
    }
    if v1 & 0x40 == 0 {
        let count = usize::from(input.u8()?) | usize::from(v1 & 0xF) << 8;
        return match (v1 >> 4) & 3 {
            0 => Ok(PlaneOp::Fill {
                count: count + 2,
                value: input.u8()?,
            }),
            1 => Ok(PlaneOp::CopyRows { count: count + 1, rows_back: 1 }),
            2 => Ok(PlaneOp::CopyRows { count: count + 1, rows_back: 2 }),
            _ => Ok(PlaneOp::CopyRows { count: count + 1, rows_back: 4 }),
        };
    }
    match unit {
        PlaneUnit::Rgb => {
            if v1 & 0x30 == 0 {
                let repeat = usize::from(input.u8()?) + (usize::from(v1 & 7) << 8) + 1;
                let block = if (v1 >> 3) & 1 != 0 { 6 } else { 3 };
                Ok(PlaneOp::TileBlock { repeat, block })
            } else if v1 & 0x20 == 0 {
                let distance = usize::from(input.u8()?) + (usize::from(v1 & 0xF) << 8);
                let count = usize::from(input.u8()?) + 1;
                Ok(PlaneOp::CopyPixels { count, distance })
            } else {
                let distance = usize::from(input.u8()?) | usize::from(v1 & 0xF) << 8;
                let count = usize::from(input.u8()?) + 1;
                Ok(PlaneOp::CopyBytes { count, distance })
            }
        }
        PlaneUnit::Index => {
            if v1 & 0x20 == 0 {
                let repeat = usize::from(input.u8()?) + (usize::from(v1 & 7) << 8) + 1;
                let block = 2usize << ((v1 >> 3) & 3);
                Ok(PlaneOp::TileBlock { repeat, block })
            } else {
                let distance = usize::from(input.u8()?) | usize::from(v1 & 0xF) << 8;
                let count = usize::from(input.u8()?) + 1;
                Ok(PlaneOp::CopyBytes { count, distance })
            }
        }
    }
}

/// Execute one operation at `dst`, returning how many bytes it wrote.
fn apply_op(
    op: PlaneOp,
    input: &mut ByteReader<'_>,
    output: &mut [u8],
    dst: usize,
    row_stride: usize,
) -> Result<usize, DecodeError> {
    match op {
        PlaneOp::Fill { count, value } => {
            check_room(output, dst, count)?;
            output[dst..dst + count].fill(value);
            Ok(count)
        }
        PlaneOp::Literal { count } => {
            check_room(output, dst, count)?;
            output[dst..dst + count].copy_from_slice(input.take(count)?);
            Ok(count)
        }
        PlaneOp::CopyRows { count, rows_back } => {
            copy_back(output, dst, (rows_back * row_stride) as i64, count)?;
            Ok(count)
        }
        PlaneOp::TileBlock { repeat, block } => {
            let total = block + repeat * block;
            check_room(output, dst, total)?;
            output[dst..dst + block].copy_from_slice(input.take(block)?);
            // Overlapped forward copy tiles the block across the run.
            for i in 0..repeat * block {
                output[dst + block + i] = output[dst + i];
            }
            Ok(total)
        }
        PlaneOp::CopyPixels { count, distance } => {
            let n = count * 3;
            copy_back(output, dst, 3 + 3 * distance as i64, n)?;
            Ok(n)
        }
        PlaneOp::CopyBytes { count, distance } => {
            copy_back(output, dst, 1 + distance as i64, count)?;
            Ok(count)
        }
    }
}

fn check_room(output: &[u8], dst: usize, count: usize) -> Result<(), DecodeError> {
    if count > output.len() - dst {
        return Err(DecodeError::OutputOverrun {
            need: count,
            dst,
            len: output.len(),
        });
    }
    Ok(())
}

/// Back-reference copy from `dst - back`, byte by byte in increasing
/// index order so that short distances replicate a repeating pattern.
fn copy_back(output: &mut [u8], dst: usize, back: i64, count: usize) -> Result<(), DecodeError> {
    let src = dst as i64 - back;
    if src < 0 {
        return Err(DecodeError::BadReference { src, dst });
    }
    let src = src as usize;
    check_room(output, dst, count)?;
    for i in 0..count {
        output[dst + i] = output[src + i];
    }
    Ok(())
}

/// Decode one plane of `width * height` elements of `unit` size.
///
/// The output is exactly `width * height * unit.size()` bytes; running
/// out of input or overrunning the plane is an error.
pub fn decode_plane(
    input: &[u8],
    width: u32,
    height: u32,
    unit: PlaneUnit,
) -> Result<Vec<u8>, DecodeError> {
    let row_stride = width as usize * unit.size();
    let total = row_stride * height as usize;
    let mut output = vec![0u8; total];
    let mut reader = ByteReader::new(input);
    let mut dst = 0;
    while dst < total {
        let op = decode_op(&mut reader, unit)?;
        let advanced = apply_op(op, &mut reader, &mut output, dst, row_stride)?;
        if advanced == 0 {
            return Err(DecodeError::InvalidLength);
        }
        dst += advanced;
    }
    Ok(output)
}
