use thiserror::Error;

/// Failure modes shared by every decoder in the crate.
///
/// All of these abort the current decode; there is no partial-result
/// recovery. A corrupt entry is reported upward and siblings continue.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The compressed region ended before the decoder finished.
    #[error("input exhausted at offset {0:#x}")]
    TruncatedInput(usize),

    /// A reserved tag-byte pattern (0xF0 high nibble).
    #[error("invalid tag byte {0:#04x}")]
    InvalidTag(u8),

    /// A zero-length operation or an oversized length code.
    #[error("invalid length code")]
    InvalidLength,

    /// A back-reference points before the start of the output.
    #[error("back-reference to {src} with only {dst} bytes decoded")]
    BadReference { src: i64, dst: usize },

    /// A decoded operation would write past the expected output size.
    #[error("output overrun: {need} bytes at {dst} in a {len}-byte buffer")]
    OutputOverrun { need: usize, dst: usize, len: usize },
}
