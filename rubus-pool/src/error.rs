use thiserror::Error;

/// Errors raised by the media pool (§4.2, §7).
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("media not found")]
    NotFound,

    #[error("piece {0} not found")]
    PieceNotFound(u32),

    #[error("catalog query failed: {0}")]
    Catalog(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PoolError>;
