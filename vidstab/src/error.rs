//! # Framework errors

/// Errors produced by the core stabilization containers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A frame was requested from a buffer that holds none.
    #[error("frame buffer is empty")]
    Empty,
    /// A border type outside of `black`, `reflect` and `replicate`.
    #[error("invalid border type: {0:?}")]
    InvalidBorderType(String),
    /// A border size that is neither an integer nor `auto`.
    #[error("invalid border size: {0:?}")]
    InvalidBorderSize(String),
}

pub type Result<T> = core::result::Result<T, Error>;
