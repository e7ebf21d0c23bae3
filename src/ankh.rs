//! Ankh GRP entry codecs: the bit-oriented LZ image decoder ("HDJ"
//! payloads) and the two per-channel audio sample decoders.
//!
//! There is no format documentation; the decoders mirror the engine's
//! observed control flow exactly, including its bit/byte ordering and
//! cache refill cycles.

use crate::bit::{BitCursor, ByteCursor, WordReader};
use crate::error::DecodeError;

/// Audio packing variant, from the pack-type byte in the entry header:
/// `'A'` is absolute-only, `'S'` is delta/run coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioMode {
    Absolute,
    DeltaRun,
}

/// Decode an LZ-packed bitmap payload into exactly `unpacked_size` bytes.
///
/// Grammar, one operation per iteration:
/// - bit 0: one literal byte from the byte cache;
/// - bit 1, bit 1: "near" copy, a 16-bit slot holding a 3-bit count
///   (3..=10) and a 13-bit negative offset (-8192..=-1);
/// - bit 1, bit 0: "far" copy, a 2-bit count (2..=5) and a one-byte
///   negative offset (-256..=-1).
///
/// The maximum base count of either copy form marks an extended-length
/// code: a unary prefix of k 1-bits, then (for k > 0) `take(k) + 1` more.
pub fn decode_image(input: &[u8], unpacked_size: u32) -> Result<Vec<u8>, DecodeError> {
    let mut output = vec![0u8; unpacked_size as usize];
    let mut src = WordReader::new(input);
    let mut bits = BitCursor::new();
    // One byte cache serves both literal bytes and far-copy offsets;
    // its refill timing is part of the format.
    let mut bytes = ByteCursor::new();
    // 2-slot cache of 16-bit "near" copy codes, refilled per word.
    let mut near: u32 = 0;
    let mut near_avail: u32 = 0;

    let mut dst = 0;
    while dst < output.len() {
        if bits.take(&mut src, 1)? != 0 {
            let mut count: usize;
            let offset: i64;
            let extended;
            if bits.take(&mut src, 1)? != 0 {
                if near_avail == 0 {
                    near = src.read_u32()?;
                    near_avail = 2;
                }
                count = (((near >> 13) & 7) + 3) as usize;
                // Offset is unconditionally negative: the engine ORs the
                // sign bits in rather than testing the top bit.
                offset = i64::from(((near & 0x1FFF) | 0xFFFF_E000) as i32);
                near >>= 16;
                near_avail -= 1;
                extended = count == 10;
            } else {
                count = bits.take(&mut src, 2)? as usize + 2;
                extended = count == 5;
                offset = i64::from((u32::from(bytes.next(&mut src)?) | 0xFFFF_FF00) as i32);
            }
            if extended {
                let mut k = 0u32;
                while bits.take(&mut src, 1)? != 0 {
                    k += 1;
                    if k > 32 {
                        return Err(DecodeError::InvalidLength);
                    }
                }
                if k > 0 {
                    count += bits.take(&mut src, k)? as usize + 1;
                }
            }
            copy_overlapped(&mut output, dst, offset, count)?;
            dst += count;
        } else {
            output[dst] = bytes.next(&mut src)?;
            dst += 1;
        }
    }
    Ok(output)
}

/// Copy `count` bytes from `dst + offset` to `dst`, byte by byte in
/// increasing index order. The source may intersect the destination;
/// an offset magnitude smaller than `count` replicates a short pattern,
/// which is load-bearing for both codec families.
fn copy_overlapped(
    output: &mut [u8],
    dst: usize,
    offset: i64,
    count: usize,
) -> Result<(), DecodeError> {
    if count == 0 {
        return Err(DecodeError::InvalidLength);
    }
    let src = dst as i64 + offset;
    if src < 0 {
        return Err(DecodeError::BadReference { src, dst });
    }
    let src = src as usize;
    if count > output.len() - dst {
        return Err(DecodeError::OutputOverrun {
            need: count,
            dst,
            len: output.len(),
        });
    }
    for i in 0..count {
        output[dst + i] = output[src + i];
    }
    Ok(())
}

/// Decode a packed audio payload into exactly `unpacked_size` bytes.
///
/// `header_prefix` (already separated by the caller's entry framing) is
/// copied verbatim to the front of the output; decoded 16-bit
/// little-endian samples follow, interleaved at a stride of
/// `2 * channels` bytes. Each channel resets the bit cursor and decodes
/// an independent bitstream segment; for multi-channel streams the
/// input starts with a `(channels - 1) * 4` byte sub-header that is
/// skipped, not decoded.
pub fn decode_audio(
    mode: AudioMode,
    input: &[u8],
    header_prefix: &[u8],
    channels: u8,
    unpacked_size: u32,
) -> Result<Vec<u8>, DecodeError> {
    if channels == 0 {
        return Err(DecodeError::InvalidLength);
    }
    let mut output = vec![0u8; unpacked_size as usize];
    if header_prefix.len() > output.len() {
        return Err(DecodeError::OutputOverrun {
            need: header_prefix.len(),
            dst: 0,
            len: output.len(),
        });
    }
    output[..header_prefix.len()].copy_from_slice(header_prefix);

    let mut src = WordReader::new(input);
    if channels != 1 {
        src.skip((usize::from(channels) - 1) * 4)?;
    }
    let step = usize::from(channels) * 2;
    let mut bits = BitCursor::new();

    let mut dst = header_prefix.len();
    for _ in 0..channels {
        bits.reset();
        match mode {
            AudioMode::Absolute => decode_channel_absolute(&mut src, &mut bits, &mut output, dst, step)?,
            AudioMode::DeltaRun => decode_channel_delta(&mut src, &mut bits, &mut output, dst, step)?,
        }
        dst += 2;
    }
    Ok(output)
}

fn decode_channel_absolute(
    src: &mut WordReader<'_>,
    bits: &mut BitCursor,
    output: &mut [u8],
    mut pos: usize,
    step: usize,
) -> Result<(), DecodeError> {
    while pos < output.len() {
        let sample = (bits.take(src, 10)? << 6) as u16 as i16;
        put_sample(output, pos, sample)?;
        pos += step;
    }
    Ok(())
}

fn decode_channel_delta(
    src: &mut WordReader<'_>,
    bits: &mut BitCursor,
    output: &mut [u8],
    mut pos: usize,
    step: usize,
) -> Result<(), DecodeError> {
    let mut last: i16 = 0;
    while pos < output.len() {
        let sample: i16;
        if bits.take(src, 1)? != 0 {
            if bits.take(src, 1)? != 0 {
                // Absolute 10-bit sample, scaled to 16 bits.
                sample = (bits.take(src, 10)? << 6) as u16 as i16;
            } else {
                let repeat = if bits.take(src, 1)? != 0 {
                    let mut width = 1u32;
                    while bits.take(src, 1)? != 0 {
                        width += 1;
                        if width > 32 {
                            return Err(DecodeError::InvalidLength);
                        }
                    }
                    bits.take(src, width)? + 4
                } else {
                    bits.take(src, 2)?
                };
                for _ in 0..repeat {
                    put_sample(output, pos, 0)?;
                    pos += step;
                }
                // The run falls through to the shared store below, so a
                // run of `repeat` emits repeat + 1 zero samples.
                sample = 0;
            }
        } else {
            // 5-bit signed delta scaled by 64, 16-bit wraparound.
            let adjust = ((bits.take(src, 5)? << 11) as u16 as i16) >> 5;
            sample = last.wrapping_add(adjust);
        }
        put_sample(output, pos, sample)?;
        last = sample;
        pos += step;
    }
    Ok(())
}

fn put_sample(output: &mut [u8], pos: usize, sample: i16) -> Result<(), DecodeError> {
    if pos + 2 > output.len() {
        return Err(DecodeError::OutputOverrun {
            need: 2,
            dst: pos,
            len: output.len(),
        });
    }
    output[pos..pos + 2].copy_from_slice(&sample.to_le_bytes());
    Ok(())
}
