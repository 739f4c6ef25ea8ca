use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("incomplete packet: expected length {expected}, received {actual}")]
    IncompletePacket { expected: usize, actual: usize },

    #[error("invalid address family: {source_len}-byte source, {destination_len}-byte destination")]
    InvalidAddressFamily {
        source_len: usize,
        destination_len: usize,
    },

    #[error("invalid UDP length {declared}: shorter than the 8-byte header")]
    InvalidLength { declared: u16 },
}

pub type Result<T> = std::result::Result<T, Error>;
