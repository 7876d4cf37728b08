//! A `startX` / `getXNow` / `getX` / `getXInitializationException` slot
//! (§9 "Coroutine/future pattern"): a single-producer, single-consumer
//! one-shot result with a non-blocking poll and a blocking drain, shared
//! by stream/local context initialization and by decode jobs.

use futures::channel::oneshot;
use parking_lot::Mutex;

use crate::error::DecodingException;

enum State<T> {
    Pending(oneshot::Receiver<Result<T, DecodingException>>),
    Ready(Result<T, DecodingException>),
}

pub struct FutureSlot<T: Clone> {
    state: Mutex<Option<State<T>>>,
}

impl<T: Clone> FutureSlot<T> {
    pub fn empty() -> Self {
        Self {
            state: Mutex::new(None),
        }
    }

    pub fn pending(rx: oneshot::Receiver<Result<T, DecodingException>>) -> Self {
        Self {
            state: Mutex::new(Some(State::Pending(rx))),
        }
    }

    pub fn set_pending(&self, rx: oneshot::Receiver<Result<T, DecodingException>>) {
        *self.state.lock() = Some(State::Pending(rx));
    }

    pub fn clear(&self) {
        *self.state.lock() = None;
    }

    /// Non-blocking: drains the channel if a result has arrived, otherwise
    /// returns `None` without waiting.
    pub fn get(&self) -> Option<T> {
        let mut guard = self.state.lock();
        if let Some(State::Pending(rx)) = guard.as_mut() {
            if let Ok(Some(result)) = rx.try_recv() {
                *guard = Some(State::Ready(result));
            }
        }
        match guard.as_ref() {
            Some(State::Ready(Ok(value))) => Some(value.clone()),
            _ => None,
        }
    }

    /// Blocks until the background work completes (or was already done),
    /// returning `None` on failure or cancellation.
    pub fn get_now(&self) -> Option<T> {
        let mut guard = self.state.lock();
        let current = guard.take()?;
        let result = match current {
            State::Ready(result) => result,
            State::Pending(rx) => futures::executor::block_on(rx)
                .unwrap_or_else(|_| Err(DecodingException::Codec("cancelled by purge".into()))),
        };
        let value = result.clone().ok();
        *guard = Some(State::Ready(result));
        value
    }

    pub fn exception(&self) -> Option<DecodingException> {
        match self.state.lock().as_ref() {
            Some(State::Ready(Err(e))) => Some(e.clone()),
            _ => None,
        }
    }
}
