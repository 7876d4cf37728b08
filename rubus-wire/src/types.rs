use std::collections::HashMap;

pub use rubus_common::MediaId;

/// Per-title metadata served by INFO, and the per-entry value carried inside
/// a [`PlaybackList`] the administrative way (`availableMedia`, §4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaInfo {
    pub id: MediaId,
    pub title: String,
    pub video_width: u16,
    pub video_height: u16,
    pub duration: u32,
    pub video_encoding: String,
    pub audio_encoding: String,
    pub video_container: String,
    pub audio_container: String,
}

/// `MediaId -> title` map returned by LIST (`availableMediaFast`, §4.2).
pub type PlaybackList = HashMap<MediaId, String>;

/// The body of a successful FETCH response (§3 "FetchedPieces / MediaFetch").
///
/// Invariant: `video.len() == audio.len()`, and both are non-empty on a
/// successful fetch (enforced by the pool, not re-validated here).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPieces {
    pub id: MediaId,
    pub offset: u32,
    pub video: Vec<Vec<u8>>,
    pub audio: Vec<Vec<u8>>,
}
