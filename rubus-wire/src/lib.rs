pub mod codec;
pub mod error;
pub mod frame;
pub mod types;

pub use codec::BinaryConverter;
pub use error::{WireError, Result};
pub use frame::{RequestHeader, RequestType, ResponseHeader, ResponseType};
pub use types::{FetchedPieces, MediaId, MediaInfo, PlaybackList};
