//! The buffer/window manager (§4.7): tracks which piece indices are
//! requested, in flight, decoding, ready, or freed; governs prefetch
//! policy and seek/underrun recovery. State lives in a
//! `BTreeMap<u32, PieceState>` so "lowest ready index" and low-water-mark
//! scans are cheap range queries, guarded by `parking_lot::Mutex`, the lock
//! `annil`/`anni-provider` reach for over `std::sync::Mutex`.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use rubus_wire::MediaId;

use crate::codec::CodecProvider;
use crate::decode::DecodePipeline;
use crate::fetch::{FetchController, FetchError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceState {
    Needed,
    InFlight,
    Decoding,
    Ready,
    Freed,
}

/// Pieces ahead of the playhead the window tries to keep populated
/// (§4.7 "~8 seconds of pieces").
const DEFAULT_AHEAD: u32 = 8;

/// How many `ready` pieces ahead of the playhead must remain before the
/// planner enqueues another fetch.
const DEFAULT_READY_THRESHOLD: u32 = 3;

struct Window {
    playhead: u32,
    pieces: BTreeMap<u32, PieceState>,
    underrun_boosted: bool,
}

impl Window {
    fn new(playhead: u32) -> Self {
        Self {
            playhead,
            pieces: BTreeMap::new(),
            underrun_boosted: false,
        }
    }

    fn ready_ahead_count(&self) -> u32 {
        self.pieces
            .range(self.playhead..)
            .filter(|(_, state)| **state == PieceState::Ready)
            .count() as u32
    }

    fn next_gap(&self, ahead: u32) -> Option<u32> {
        (self.playhead..self.playhead + ahead).find(|i| !self.pieces.contains_key(i))
    }
}

pub struct BufferManager<C: CodecProvider> {
    fetch: Arc<FetchController>,
    decode: Arc<DecodePipeline<C>>,
    media_id: MediaId,
    window: Mutex<Window>,
    ahead: u32,
    ready_threshold: u32,
}

impl<C: CodecProvider> BufferManager<C> {
    pub fn new(
        fetch: Arc<FetchController>,
        decode: Arc<DecodePipeline<C>>,
        media_id: MediaId,
        playhead: u32,
    ) -> Self {
        Self {
            fetch,
            decode,
            media_id,
            window: Mutex::new(Window::new(playhead)),
            ahead: DEFAULT_AHEAD,
            ready_threshold: DEFAULT_READY_THRESHOLD,
        }
    }

    pub fn state_of(&self, index: u32) -> Option<PieceState> {
        self.window.lock().pieces.get(&index).copied()
    }

    /// Advances the playhead and frees decoded frames for pieces that have
    /// already played (§4.7 "pieces behind a low-water mark are freed").
    /// Freed indices stay in the map marked `Freed` rather than being
    /// dropped, so a freed piece remains distinguishable from one that was
    /// never tracked.
    pub fn advance_playhead(&self, new_playhead: u32) {
        let mut window = self.window.lock();
        let stale: Vec<u32> = window
            .pieces
            .range(..new_playhead)
            .filter(|(_, state)| **state != PieceState::Freed)
            .map(|(index, _)| *index)
            .collect();
        for index in stale {
            window.pieces.insert(index, PieceState::Freed);
            self.decode.free_decoded_frames(index as i64);
        }
        window.playhead = new_playhead;
    }

    /// One iteration of the prefetch planner (§5 "periodic; decides which
    /// pieces to request"). Issues at most one outstanding FETCH through
    /// the fetch controller's single-flight queue.
    pub async fn plan_once(&self) -> Result<(), FetchError> {
        let gap = {
            let window = self.window.lock();
            let effective_ahead = if window.underrun_boosted {
                self.ahead * 2
            } else {
                self.ahead
            };
            if window.ready_ahead_count() >= self.ready_threshold {
                return Ok(());
            }
            window.next_gap(effective_ahead)
        };
        let Some(index) = gap else {
            return Ok(());
        };

        self.mark(index, PieceState::InFlight);
        let pieces = self.fetch.fetch(self.media_id.clone(), index, 1).await?;
        self.mark(index, PieceState::Decoding);

        let job_id = index as i64;
        match self.decode.get_stream_context() {
            Some(stream) => {
                self.decode
                    .start_decoding_of_all_frames(job_id, stream, pieces.video[0].clone());
            }
            None => {
                self.decode
                    .start_stream_context_initialization(pieces.video[0].clone());
            }
        }
        self.mark(index, PieceState::Ready);
        self.maybe_decay_underrun_boost();
        Ok(())
    }

    /// Stalls the caller until `index` is ready, boosting the prefetch
    /// budget until the window recovers (§4.7 "underrun").
    pub fn note_underrun(&self, index: u32) {
        log::warn!("underrun at piece {index}, boosting prefetch budget");
        self.window.lock().underrun_boosted = true;
    }

    /// Purges the decode pipeline, clears window state, and rebases the
    /// window to `target` (§4.7 "Seek"). The caller is responsible for
    /// re-running the planner to fetch the new stream-context probe piece.
    pub fn seek(&self, target: u32) {
        self.decode.purge();
        let mut window = self.window.lock();
        window.pieces.clear();
        window.playhead = target;
        window.underrun_boosted = false;
    }

    fn mark(&self, index: u32, state: PieceState) {
        self.window.lock().pieces.insert(index, state);
    }

    fn maybe_decay_underrun_boost(&self) {
        let mut window = self.window.lock();
        if window.underrun_boosted && window.ready_ahead_count() >= self.ready_threshold {
            window.underrun_boosted = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::{TcpListener, TcpStream};

    struct NoopCodec;

    impl CodecProvider for NoopCodec {
        type StreamHandle = ();
        type LocalHandle = ();
        type Error = std::convert::Infallible;

        fn open_stream_context(&self, _sample: &[u8]) -> Result<(), Self::Error> {
            Ok(())
        }

        fn frame_rate(&self, _stream: &()) -> u32 {
            24
        }

        fn open_local_context(&self, _sample: &[u8], _stream: &()) -> Result<(), Self::Error> {
            Ok(())
        }

        fn decode_all_frames(
            &self,
            _stream: &(),
            _encoded_piece: &[u8],
        ) -> Result<crate::codec::DecodedFrames, Self::Error> {
            Ok(crate::codec::DecodedFrames {
                offset: 0,
                frames: vec![],
            })
        }

        fn decode_n_frames(
            &self,
            _local: &(),
            _encoded_piece: &[u8],
            start_frame: u32,
            _count: u32,
        ) -> Result<crate::codec::DecodedFrames, Self::Error> {
            Ok(crate::codec::DecodedFrames {
                offset: start_frame,
                frames: vec![],
            })
        }

        fn close_stream_context(&self, _stream: &()) {}
        fn close_local_context(&self, _local: &()) {}
    }

    async fn loopback() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr);
        let (server, _) = listener.accept().await.unwrap();
        (client.await.unwrap(), server)
    }

    #[tokio::test]
    async fn seek_clears_window_and_purges_decoder() {
        let (client, _server) = loopback().await;
        let fetch = Arc::new(FetchController::new(client, None));
        let decode = Arc::new(DecodePipeline::new(NoopCodec));
        let id = MediaId::new(vec![1]).unwrap();
        let manager = BufferManager::new(fetch, decode, id, 0);

        manager.mark(3, PieceState::Ready);
        manager.mark(4, PieceState::InFlight);
        assert!(manager.state_of(3).is_some());
        assert!(manager.state_of(4).is_some());

        manager.seek(100);

        assert!(manager.state_of(3).is_none());
        assert!(manager.state_of(4).is_none());
        assert_eq!(manager.window.lock().playhead, 100);
    }

    #[tokio::test]
    async fn advance_playhead_frees_stale_pieces_only() {
        let (client, _server) = loopback().await;
        let fetch = Arc::new(FetchController::new(client, None));
        let decode = Arc::new(DecodePipeline::new(NoopCodec));
        let id = MediaId::new(vec![1]).unwrap();
        let manager = BufferManager::new(fetch, decode, id, 0);

        manager.mark(0, PieceState::Ready);
        manager.mark(1, PieceState::Ready);
        manager.mark(5, PieceState::Ready);

        manager.advance_playhead(2);

        assert_eq!(manager.state_of(0), Some(PieceState::Freed));
        assert_eq!(manager.state_of(1), Some(PieceState::Freed));
        assert_eq!(manager.state_of(5), Some(PieceState::Ready));
    }

    #[test]
    fn next_gap_finds_first_missing_index_in_window() {
        let mut window = Window::new(10);
        window.pieces.insert(10, PieceState::Ready);
        window.pieces.insert(11, PieceState::InFlight);
        assert_eq!(window.next_gap(8), Some(12));
    }

    #[test]
    fn ready_ahead_count_ignores_pieces_behind_playhead() {
        let mut window = Window::new(5);
        window.pieces.insert(4, PieceState::Ready);
        window.pieces.insert(5, PieceState::Ready);
        window.pieces.insert(6, PieceState::Ready);
        assert_eq!(window.ready_ahead_count(), 2);
    }
}
