pub mod ankh;
pub mod bit;
pub mod error;
pub mod grp;
pub mod plane;
pub mod seraphim;

pub use ankh::{decode_audio, decode_image, AudioMode};
pub use error::DecodeError;
pub use grp::{EntryKind, GrpArchive, GrpEntry};
pub use plane::{decode_plane, PlaneUnit};
pub use seraphim::{
    decode_cb, decode_cf, decode_ct, read_palette, SeraphImage, SeraphMetaData,
};
