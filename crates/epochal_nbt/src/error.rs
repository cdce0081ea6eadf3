use std::io;

use thiserror::Error;

use crate::tag::TagType;

#[derive(Error, Debug)]
pub enum NbtError {
    #[error("IO Error: {0}")]
    Io(io::Error),

    #[error("NBT data ended before the tag was complete")]
    TruncatedBuffer,

    #[error("Invalid tag type: {0:#04x}")]
    InvalidTagType(u8),

    #[error("Negative length: {0}")]
    NegativeLength(i32),

    #[error("String of {0} bytes exceeds the 65535 byte limit")]
    StringTooLong(usize),

    #[error("Invalid modified UTF-8 string")]
    InvalidString,

    #[error("List holds {expected:?} elements, cannot add {found:?}")]
    HeterogeneousList { expected: TagType, found: TagType },

    #[error("Tag nesting exceeds the maximum depth of {0}")]
    DepthLimitExceeded(usize),
}

impl From<io::Error> for NbtError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            NbtError::TruncatedBuffer
        } else {
            NbtError::Io(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, NbtError>;
