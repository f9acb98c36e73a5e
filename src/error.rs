//! Error types for matchbox

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Token stream error: {0}")]
    TokenStream(String),

    #[error("Term too long: {len} bytes exceeds the {max} byte block size")]
    TermTooLong { len: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
