//! Ankh GRP resource archives. The archive is a bare offset table: the
//! first u32 is the offset of the first entry and each following u32 is
//! the end of the previous one. Entry payloads are sniffed for the
//! engine's packed-image ("HDJ\0") and packed-audio ('W' + "RIFF")
//! wrappers; everything else passes through raw.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::ankh::{decode_audio, decode_image, AudioMode};

/// Upper bound on plausible entry counts, used to reject non-archives.
const MAX_ENTRY_COUNT: usize = 0x10000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Image,
    Audio,
    Raw,
}

/// One directory entry. `unpacked_size` equals `size` for raw entries.
#[derive(Debug, Clone, Serialize)]
pub struct GrpEntry {
    pub index: usize,
    pub name: String,
    pub offset: usize,
    pub size: usize,
    pub unpacked_size: usize,
    pub is_packed: bool,
    pub kind: EntryKind,
}

pub struct GrpArchive {
    data: Vec<u8>,
    pub entries: Vec<GrpEntry>,
}

impl GrpArchive {
    pub fn open(path: &Path) -> Result<Self> {
        let data = fs::read(path).with_context(|| format!("open: {path:?}"))?;
        let base = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "entry".to_string());
        Self::from_bytes(data, &base)
    }

    pub fn from_bytes(data: Vec<u8>, base_name: &str) -> Result<Self> {
        if data.len() < 8 {
            bail!("file too short for a GRP index");
        }
        let first_offset = read_u32(&data, 0)? as usize;
        if first_offset < 8 || first_offset >= data.len() {
            bail!("implausible first entry offset {first_offset:#x}");
        }
        let count = (first_offset - 8) / 4;
        if count == 0 || count > MAX_ENTRY_COUNT {
            bail!("implausible entry count {count}");
        }

        let mut entries = Vec::with_capacity(count);
        let mut index_offset = 0;
        let mut next_offset = first_offset;
        for i in 0..count {
            let offset = next_offset;
            index_offset += 4;
            next_offset = read_u32(&data, index_offset)? as usize;
            if next_offset < offset {
                bail!("entry {i} has negative size");
            }
            let size = next_offset - offset;
            if size == 0 {
                continue;
            }
            if next_offset > data.len() {
                bail!("entry {i} extends past end of file");
            }
            entries.push(GrpEntry {
                index: i,
                name: format!("{base_name}#{i:04}"),
                offset,
                size,
                unpacked_size: size,
                is_packed: false,
                kind: EntryKind::Raw,
            });
        }
        if entries.is_empty() {
            bail!("empty archive");
        }

        for entry in &mut entries {
            classify(&data, entry)?;
        }
        log::debug!("GRP index: {} entries", entries.len());
        Ok(Self { data, entries })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Unpack one entry. A packed entry decodes to `unpacked_size`
    /// bytes; raw entries are returned as stored.
    pub fn open_entry(&self, entry: &GrpEntry) -> Result<Vec<u8>> {
        let raw = &self.data[entry.offset..entry.offset + entry.size];
        if entry.size > 8 && raw[4..8] == *b"HDJ\0" {
            return self.open_image(entry, raw);
        }
        if entry.size > 12 && raw[4] == b'W' && raw[8..12] == *b"RIFF" {
            return self.open_audio(entry, raw);
        }
        Ok(raw.to_vec())
    }

    fn open_image(&self, entry: &GrpEntry, raw: &[u8]) -> Result<Vec<u8>> {
        let unpacked_size = i32::from_le_bytes(raw[0..4].try_into().unwrap());
        if unpacked_size <= 0 {
            bail!("entry {}: bad unpacked size {unpacked_size}", entry.index);
        }
        log::debug!(
            "entry {}: HDJ image, {} -> {} bytes",
            entry.index,
            entry.size - 8,
            unpacked_size
        );
        decode_image(&raw[8..], unpacked_size as u32)
            .with_context(|| format!("entry {}: image decode", entry.index))
    }

    fn open_audio(&self, entry: &GrpEntry, raw: &[u8]) -> Result<Vec<u8>> {
        let unpacked_size = i32::from_le_bytes(raw[0..4].try_into().unwrap());
        let pack_type = raw[5];
        let channels = raw[6];
        let header_size = usize::from(raw[7]);
        if unpacked_size <= 0 || header_size > unpacked_size as usize {
            bail!("entry {}: bad audio sizes", entry.index);
        }
        let mode = match pack_type {
            b'A' => AudioMode::Absolute,
            b'S' => AudioMode::DeltaRun,
            _ => bail!("entry {}: unknown audio pack type {pack_type:#04x}", entry.index),
        };
        if raw.len() < 8 + header_size {
            bail!("entry {}: audio header prefix truncated", entry.index);
        }
        log::debug!(
            "entry {}: {:?} audio, {} channels, {} -> {} bytes",
            entry.index,
            mode,
            channels,
            entry.size - 8 - header_size,
            unpacked_size
        );
        decode_audio(
            mode,
            &raw[8 + header_size..],
            &raw[8..8 + header_size],
            channels,
            unpacked_size as u32,
        )
        .with_context(|| format!("entry {}: audio decode", entry.index))
    }
}

/// Second pass over the directory, mirroring the engine's loader: fill
/// in the decoded size, packed flag and a name with a type extension.
fn classify(data: &[u8], entry: &mut GrpEntry) -> Result<()> {
    if entry.size < 4 {
        return Ok(());
    }
    let head = &data[entry.offset..entry.offset + entry.size];
    let unpacked_size = read_u32(head, 0)?;
    if entry.size > 8 && head[4..8] == *b"HDJ\0" {
        if entry.size >= 14 && head[12..14] == *b"BM" {
            entry.name = format!("{}.bmp", entry.name);
            entry.kind = EntryKind::Image;
        }
        entry.unpacked_size = unpacked_size as usize;
        entry.is_packed = true;
    } else if entry.size > 12 && head[8..12] == *b"RIFF" {
        entry.name = format!("{}.wav", entry.name);
        entry.kind = EntryKind::Audio;
        entry.unpacked_size = unpacked_size as usize;
        entry.is_packed = true;
    } else if unpacked_size & 0xFFFF == 0x4D42 {
        entry.name = format!("{}.bmp", entry.name);
        entry.kind = EntryKind::Image;
    }
    Ok(())
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32> {
    let end = offset + 4;
    if end > data.len() {
        bail!("truncated index read at {offset:#x}");
    }
    Ok(u32::from_le_bytes(data[offset..end].try_into().unwrap()))
}
