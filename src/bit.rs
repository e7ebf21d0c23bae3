use crate::error::DecodeError;

/// Sequential little-endian u32 reads over a bounded byte slice.
///
/// The Ankh compressor interleaves bit words, literal words and offset
/// words in one stream; every cache below refills from the same
/// `WordReader` in arrival order, so the reader owns the only input
/// position.
pub struct WordReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WordReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Read the next u32. A partial trailing word is an error.
    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let end = self.pos + 4;
        if end > self.data.len() {
            return Err(DecodeError::TruncatedInput(self.pos));
        }
        let w = u32::from_le_bytes(self.data[self.pos..end].try_into().unwrap());
        self.pos = end;
        Ok(w)
    }

    /// Skip `n` input bytes (per-channel sub-header skip in audio streams).
    pub fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        let end = self.pos + n;
        if end > self.data.len() {
            return Err(DecodeError::TruncatedInput(self.pos));
        }
        self.pos = end;
        Ok(())
    }
}

/// MSB-first bit extraction from 32-bit little-endian words.
///
/// The buffer is left-justified: the most significant bits are the next
/// to be consumed. `cached` stays in 0..=32.
pub struct BitCursor {
    bits: u32,
    cached: u32,
}

impl BitCursor {
    pub fn new() -> Self {
        Self { bits: 0, cached: 0 }
    }

    /// Discard cached bits. The next `take` reads a fresh word at the
    /// reader's current byte position; the reader is not rewound.
    pub fn reset(&mut self) {
        self.cached = 0;
    }

    /// Pull the next `n` bits (1..=32) as an unsigned integer.
    ///
    /// When the cache is short, one more word is read and the result is
    /// the top `n` bits of the concatenation of the old cached bits and
    /// the new word. `cached < 32` before a refill, so one extra word
    /// always suffices, even for n = 32.
    pub fn take(&mut self, src: &mut WordReader<'_>, n: u32) -> Result<u32, DecodeError> {
        debug_assert!((1..=32).contains(&n));
        if self.cached == 0 {
            self.bits = src.read_u32()?;
            self.cached = 32;
        }
        if self.cached < n {
            let next = src.read_u32()?;
            let v = (self.bits | (next >> self.cached)) >> (32 - n);
            self.bits = next << (n - self.cached);
            self.cached = 32 - (n - self.cached);
            Ok(v)
        } else {
            let v = self.bits >> (32 - n);
            self.bits = if n == 32 { 0 } else { self.bits << n };
            self.cached -= n;
            Ok(v)
        }
    }
}

impl Default for BitCursor {
    fn default() -> Self {
        Self::new()
    }
}

/// Up to 4 unconsumed bytes extracted low-byte-first from one
/// little-endian u32 read. Refills independently of any `BitCursor`
/// sharing the same reader.
pub struct ByteCursor {
    word: u32,
    avail: u32,
}

impl ByteCursor {
    pub fn new() -> Self {
        Self { word: 0, avail: 0 }
    }

    pub fn next(&mut self, src: &mut WordReader<'_>) -> Result<u8, DecodeError> {
        if self.avail == 0 {
            self.word = src.read_u32()?;
            self.avail = 4;
        }
        let b = self.word as u8;
        self.word >>= 8;
        self.avail -= 1;
        Ok(b)
    }
}

impl Default for ByteCursor {
    fn default() -> Self {
        Self::new()
    }
}
