//! Emergency-stop latch
//!
//! Written from interrupt context by the e-stop line watcher and sampled at
//! the start of every controller tick. Only plain loads and stores are used
//! so the latch works on cores without atomic read-modify-write.

use core::sync::atomic::{AtomicBool, Ordering};

/// Interrupt-latched emergency-stop flag
#[derive(Debug, Default)]
pub struct EstopLatch {
    asserted: AtomicBool,
}

impl EstopLatch {
    pub const fn new() -> Self {
        Self {
            asserted: AtomicBool::new(false),
        }
    }

    /// Line asserted; called from the interrupt handler
    pub fn assert(&self) {
        self.asserted.store(true, Ordering::Release);
    }

    /// Line physically released
    pub fn release(&self) {
        self.asserted.store(false, Ordering::Release);
    }

    pub fn is_asserted(&self) -> bool {
        self.asserted.load(Ordering::Acquire)
    }
}
