use thiserror::Error;

use rubus_wire::ResponseType;

/// Raised by the fetch controller when the server answers with anything
/// other than `OK` (§4.5, §7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("server responded {0:?}")]
pub struct RubusException(pub ResponseType);

/// Raised by the fetch controller when the socket read or response
/// deserialization fails (§4.5, §7).
#[derive(Debug, Error, Clone)]
#[error("fetch failed: {0}")]
pub struct FetchingException(pub String);

/// Surfaced by a decode job or a context-initialization future when the
/// codec provider returns an error (§4.6, §7). Not constructed directly by
/// `purge()`: a purged job's result is discarded, not turned into this.
#[derive(Debug, Error, Clone)]
pub enum DecodingException {
    #[error("codec error: {0}")]
    Codec(String),
}
