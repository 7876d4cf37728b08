pub mod buffer;
pub mod codec;
pub mod context;
pub mod decode;
pub mod error;
pub mod fetch;
mod future_slot;

pub use buffer::{BufferManager, PieceState};
pub use codec::{CodecProvider, DecodedFrames, Frame};
pub use context::{LocalContext, StreamContext};
pub use decode::DecodePipeline;
pub use error::{DecodingException, FetchingException, RubusException};
pub use fetch::{FetchController, FetchError, DEFAULT_READ_TIMEOUT};
