use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Monotonic time source in milliseconds.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds. Only differences are meaningful.
    fn now_ms(&self) -> f64;
}

/// Clock handle shared between the viewport, images and the drawer.
pub type SharedClock = Arc<dyn Clock>;

/// Wall clock anchored at construction.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock reading `0.0` now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Convenience constructor returning a [`SharedClock`].
    pub fn shared() -> SharedClock {
        Arc::new(Self::new())
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Simulated clock advanced explicitly.
#[derive(Debug, Default)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    /// Create a clock at `start_ms`.
    pub fn new(start_ms: f64) -> Arc<Self> {
        Arc::new(Self {
            bits: AtomicU64::new(start_ms.to_bits()),
        })
    }

    /// Set the absolute time.
    pub fn set(&self, ms: f64) {
        self.bits.store(ms.to_bits(), Ordering::SeqCst);
    }

    /// Move time forward by `ms`.
    pub fn advance(&self, ms: f64) {
        self.set(self.now_ms() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}
