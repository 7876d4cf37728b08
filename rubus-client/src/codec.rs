//! The narrow interface onto the native codec (§6 "Codec interface"). The
//! codec library itself is out of scope (§1); `anni-playback` depended on
//! `symphonia` directly for this, but the pipeline here only needs a
//! stream/local-context open, a frame-rate read, and two decode calls, so
//! those are pulled out into a trait a real decoder binds to.

use std::fmt;

/// One decoded video image or PCM buffer. Opaque to the pipeline.
pub type Frame = Vec<u8>;

/// The result of a decode job: `offset` is the absolute piece index of
/// `frames[0]` (§3 "DecodedFrames").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrames {
    pub offset: u32,
    pub frames: Vec<Frame>,
}

/// Provider-supplied codec operations (§6). A stream context is opened
/// from a probe sample; local contexts derive from it; both decode calls
/// take a byte slice of one encoded piece.
pub trait CodecProvider: Send + Sync + 'static {
    type StreamHandle: Send + Sync + 'static;
    type LocalHandle: Send + Sync + 'static;
    type Error: fmt::Display + Send + Sync + 'static;

    fn open_stream_context(&self, sample: &[u8]) -> Result<Self::StreamHandle, Self::Error>;
    fn frame_rate(&self, stream: &Self::StreamHandle) -> u32;
    fn open_local_context(
        &self,
        sample: &[u8],
        stream: &Self::StreamHandle,
    ) -> Result<Self::LocalHandle, Self::Error>;

    fn decode_all_frames(
        &self,
        stream: &Self::StreamHandle,
        encoded_piece: &[u8],
    ) -> Result<DecodedFrames, Self::Error>;

    fn decode_n_frames(
        &self,
        local: &Self::LocalHandle,
        encoded_piece: &[u8],
        start_frame: u32,
        count: u32,
    ) -> Result<DecodedFrames, Self::Error>;

    fn close_stream_context(&self, stream: &Self::StreamHandle);
    fn close_local_context(&self, local: &Self::LocalHandle);
}
