use crate::ring_buffer::RingBuffer;
use crate::types::*;
use crate::view_state::ViewState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Both channel histories. Only reachable through `CaptureBuffers`, so the
/// two rings are always written and read together.
struct ChannelPair {
    ch0: RingBuffer<u32>,
    ch1: RingBuffer<u32>,
}

/// The shared sample history: one guard over both channels.
///
/// The lock is held only for the append or the copy, never across I/O or
/// drawing. Readers always get owned vectors back.
pub struct CaptureBuffers {
    inner: Mutex<ChannelPair>,
    capacity: usize,
}

impl CaptureBuffers {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(ChannelPair {
                ch0: RingBuffer::new(capacity),
                ch1: RingBuffer::new(capacity),
            }),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // The rings hold plain integers and are consistent between pushes, so a
    // panic elsewhere while holding the lock leaves nothing to repair.
    fn lock(&self) -> MutexGuard<'_, ChannelPair> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, sample: Sample) {
        let mut pair = self.lock();
        pair.ch0.push(sample.ch0);
        pair.ch1.push(sample.ch1);
    }

    /// Full history of both channels, oldest → newest, taken under one lock.
    pub fn snapshot(&self) -> (Vec<u32>, Vec<u32>) {
        let pair = self.lock();
        (pair.ch0.snapshot(), pair.ch1.snapshot())
    }

    /// The newest `n` values of both channels, taken under one lock.
    pub fn tail(&self, n: usize) -> (Vec<u32>, Vec<u32>) {
        let pair = self.lock();
        (pair.ch0.tail(n), pair.ch1.tail(n))
    }

    pub fn latest(&self) -> Sample {
        let pair = self.lock();
        Sample::new(*pair.ch0.latest(), *pair.ch1.latest())
    }
}

/// Everything the threads share: sample history, view parameters and the
/// run flag. Built once in `main` and handed out as `Arc<ScopeContext>`.
pub struct ScopeContext {
    pub buffers: CaptureBuffers,
    pub view: ViewState,
    running: AtomicBool,
}

impl ScopeContext {
    /// `capacity` below `MIN_WINDOW` is raised to it, so the narrowest
    /// window always has a full history behind it.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_WINDOW);
        Self {
            buffers: CaptureBuffers::new(capacity),
            view: ViewState::new(capacity),
            running: AtomicBool::new(true),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ask every loop holding this context to finish its current step and exit.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Release);
    }
}

impl Default for ScopeContext {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
