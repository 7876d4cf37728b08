//! Stream and local codec contexts (§3, §4.6). Modeled as a shared handle
//! plus an atomic closed-flag, per Design Note §9: `StreamContext` is
//! shared-read by multiple `LocalContext`s and decode jobs, and only
//! `purge()` closes it, after cancelling dependents.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::codec::CodecProvider;

pub struct StreamContext<C: CodecProvider> {
    pub(crate) handle: C::StreamHandle,
    closed: AtomicBool,
    frame_rate: u32,
}

impl<C: CodecProvider> StreamContext<C> {
    pub(crate) fn new(handle: C::StreamHandle, frame_rate: u32) -> Self {
        Self {
            handle,
            closed: AtomicBool::new(false),
            frame_rate,
        }
    }

    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Idempotent: only the first call reaches the codec (§6 "Close stream
    /// context / close local context (idempotent)").
    pub(crate) fn close(&self, codec: &C) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            codec.close_stream_context(&self.handle);
        }
    }
}

pub struct LocalContext<C: CodecProvider> {
    pub(crate) handle: C::LocalHandle,
    closed: AtomicBool,
}

impl<C: CodecProvider> LocalContext<C> {
    pub(crate) fn new(handle: C::LocalHandle) -> Self {
        Self {
            handle,
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Never touches the parent `StreamContext`'s closed flag (verifiable
    /// invariant, §4.6).
    pub(crate) fn close(&self, codec: &C) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            codec.close_local_context(&self.handle);
        }
    }
}
