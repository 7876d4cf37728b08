//! The decode pipeline (§4.6): owns the codec's stream/local context
//! lifecycle and a job-id-keyed table of decode results. Decode jobs run
//! on a fixed worker pool sized to the available parallelism, each pulling
//! work off a `crossbeam::channel` queue, the same `crossbeam`-backed
//! native-thread pool `anni-playback` already used for its own decode
//! loop, generalized from one continuous decode loop to discrete,
//! multiplexed jobs.

use std::sync::Arc;

use dashmap::DashMap;
use futures::channel::oneshot;

use crate::codec::{CodecProvider, DecodedFrames};
use crate::context::{LocalContext, StreamContext};
use crate::error::DecodingException;
use crate::future_slot::FutureSlot;

enum WorkItem<C: CodecProvider> {
    DecodeAllFrames {
        stream: Arc<StreamContext<C>>,
        encoded_piece: Vec<u8>,
        tx: oneshot::Sender<Result<DecodedFrames, DecodingException>>,
    },
    DecodeNFrames {
        local: Arc<LocalContext<C>>,
        encoded_piece: Vec<u8>,
        start_frame: u32,
        count: u32,
        tx: oneshot::Sender<Result<DecodedFrames, DecodingException>>,
    },
}

pub struct DecodePipeline<C: CodecProvider> {
    codec: Arc<C>,
    stream_context: FutureSlot<Arc<StreamContext<C>>>,
    local_context: FutureSlot<Arc<LocalContext<C>>>,
    jobs: DashMap<i64, FutureSlot<DecodedFrames>>,
    work_tx: crossbeam::channel::Sender<WorkItem<C>>,
}

impl<C: CodecProvider> DecodePipeline<C> {
    /// Spawns a worker pool sized to `std::thread::available_parallelism()`
    /// (§5), falling back to one worker if the platform can't report it.
    pub fn new(codec: C) -> Self {
        let codec = Arc::new(codec);
        let (work_tx, work_rx) = crossbeam::channel::unbounded::<WorkItem<C>>();
        let worker_count = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        for _ in 0..worker_count {
            let codec = codec.clone();
            let work_rx = work_rx.clone();
            std::thread::spawn(move || worker_loop(codec, work_rx));
        }

        Self {
            codec,
            stream_context: FutureSlot::empty(),
            local_context: FutureSlot::empty(),
            jobs: DashMap::new(),
            work_tx,
        }
    }

    pub fn start_stream_context_initialization(&self, sample_bytes: Vec<u8>) {
        let codec = self.codec.clone();
        let (tx, rx) = oneshot::channel();
        std::thread::spawn(move || {
            let result = match codec.open_stream_context(&sample_bytes) {
                Ok(handle) => {
                    let frame_rate = codec.frame_rate(&handle);
                    Ok(Arc::new(StreamContext::new(handle, frame_rate)))
                }
                Err(e) => Err(DecodingException::Codec(e.to_string())),
            };
            let _ = tx.send(result);
        });
        self.stream_context.set_pending(rx);
    }

    pub fn get_stream_context_now(&self) -> Option<Arc<StreamContext<C>>> {
        self.stream_context.get_now()
    }

    pub fn get_stream_context(&self) -> Option<Arc<StreamContext<C>>> {
        self.stream_context.get()
    }

    pub fn get_stream_context_initialization_exception(&self) -> Option<DecodingException> {
        self.stream_context.exception()
    }

    pub fn start_local_context_initialization(
        &self,
        sample_bytes: Vec<u8>,
        stream_context: Arc<StreamContext<C>>,
    ) {
        let codec = self.codec.clone();
        let (tx, rx) = oneshot::channel();
        std::thread::spawn(move || {
            let result = codec
                .open_local_context(&sample_bytes, &stream_context.handle)
                .map(|handle| Arc::new(LocalContext::new(handle)))
                .map_err(|e| DecodingException::Codec(e.to_string()));
            let _ = tx.send(result);
        });
        self.local_context.set_pending(rx);
    }

    pub fn get_local_context_now(&self) -> Option<Arc<LocalContext<C>>> {
        self.local_context.get_now()
    }

    pub fn get_local_context(&self) -> Option<Arc<LocalContext<C>>> {
        self.local_context.get()
    }

    /// Decodes every frame of `encoded_piece` (§4.6
    /// `startDecodingOfAllFrames`).
    pub fn start_decoding_of_all_frames(
        &self,
        job_id: i64,
        stream_context: Arc<StreamContext<C>>,
        encoded_piece: Vec<u8>,
    ) {
        let (tx, rx) = oneshot::channel();
        self.jobs.insert(job_id, FutureSlot::pending(rx));
        let _ = self.work_tx.send(WorkItem::DecodeAllFrames {
            stream: stream_context,
            encoded_piece,
            tx,
        });
    }

    /// Decodes `count` frames starting at in-piece index `start_frame`. The
    /// codec may return additional leading frames back to the nearest
    /// keyframe, reflected in the result's `offset` (§4.6
    /// `startDecodingOfNFrames`).
    pub fn start_decoding_of_n_frames(
        &self,
        job_id: i64,
        local_context: Arc<LocalContext<C>>,
        encoded_piece: Vec<u8>,
        start_frame: u32,
        count: u32,
    ) {
        let (tx, rx) = oneshot::channel();
        self.jobs.insert(job_id, FutureSlot::pending(rx));
        let _ = self.work_tx.send(WorkItem::DecodeNFrames {
            local: local_context,
            encoded_piece,
            start_frame,
            count,
            tx,
        });
    }

    pub fn get_decoded_frames_now(&self, job_id: i64) -> Option<DecodedFrames> {
        self.jobs.get(&job_id).and_then(|slot| slot.get_now())
    }

    pub fn get_decoded_frames(&self, job_id: i64) -> Option<DecodedFrames> {
        self.jobs.get(&job_id).and_then(|slot| slot.get())
    }

    pub fn get_decoding_exception(&self, job_id: i64) -> Option<DecodingException> {
        self.jobs.get(&job_id).and_then(|slot| slot.exception())
    }

    /// Releases the frame memory for one job without affecting any other
    /// (§4.6 `freeDecodedFrames`).
    pub fn free_decoded_frames(&self, job_id: i64) {
        self.jobs.remove(&job_id);
    }

    pub fn frame_rate(&self) -> Option<u32> {
        self.stream_context.get().map(|sc| sc.frame_rate())
    }

    /// Cancels in-flight jobs, closes every context, and clears all cached
    /// frames (§4.6 `purge`). A synchronous fence: dropping each job's
    /// receiver means a worker that finishes after this returns finds its
    /// result channel gone and silently discards it (§5 "Purge is a
    /// synchronous fence").
    pub fn purge(&self) {
        self.jobs.clear();
        if let Some(stream) = self.stream_context.get_now() {
            stream.close(&self.codec);
        }
        if let Some(local) = self.local_context.get_now() {
            local.close(&self.codec);
        }
        self.stream_context.clear();
        self.local_context.clear();
    }
}

fn worker_loop<C: CodecProvider>(codec: Arc<C>, rx: crossbeam::channel::Receiver<WorkItem<C>>) {
    while let Ok(item) = rx.recv() {
        match item {
            WorkItem::DecodeAllFrames {
                stream,
                encoded_piece,
                tx,
            } => {
                let result = codec
                    .decode_all_frames(&stream.handle, &encoded_piece)
                    .map_err(|e| DecodingException::Codec(e.to_string()));
                let _ = tx.send(result);
            }
            WorkItem::DecodeNFrames {
                local,
                encoded_piece,
                start_frame,
                count,
                tx,
            } => {
                let result = codec
                    .decode_n_frames(&local.handle, &encoded_piece, start_frame, count)
                    .map_err(|e| DecodingException::Codec(e.to_string()));
                let _ = tx.send(result);
            }
        }
    }
}
