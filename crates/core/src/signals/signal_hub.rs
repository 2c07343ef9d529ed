use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;

use crate::shared::pixel_buffer::PixelBuffer;
use crate::signals::frame_signals::FrameSignals;

/// What a reader sees: the latest signals and the raw frame they came from.
#[derive(Clone, Debug)]
pub struct SignalSnapshot {
    pub signals: FrameSignals,
    pub frame: Option<Arc<PixelBuffer>>,
}

/// Last-write-wins broadcast of the latest [`SignalSnapshot`].
///
/// One frame producer publishes; any number of readers load. Signals and
/// frame are swapped together as one pointer, so a reader never pairs
/// signals with a different frame. Loads never block the producer.
pub struct SignalHub {
    current: ArcSwap<SignalSnapshot>,
    published: AtomicU64,
}

impl SignalHub {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(SignalSnapshot {
                signals: FrameSignals::initial(Instant::now()),
                frame: None,
            }),
            published: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, signals: FrameSignals, frame: Option<Arc<PixelBuffer>>) -> Arc<SignalSnapshot> {
        let snapshot = Arc::new(SignalSnapshot { signals, frame });
        self.current.store(snapshot.clone());
        self.published.fetch_add(1, Ordering::Release);
        snapshot
    }

    pub fn snapshot(&self) -> Arc<SignalSnapshot> {
        self.current.load_full()
    }

    pub fn signals(&self) -> FrameSignals {
        self.current.load().signals.clone()
    }

    pub fn latest_frame(&self) -> Option<Arc<PixelBuffer>> {
        self.current.load().frame.clone()
    }

    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }
}

impl Default for SignalHub {
    fn default() -> Self {
        Self::new()
    }
}
