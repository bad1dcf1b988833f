// src/engine/context.rs

//! Process-wide engine state, passed explicitly instead of living in globals.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative stop request.
///
/// Setting it never interrupts the running job; it only keeps the scheduler
/// from yielding further tasks.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// End-of-run reboot decision, accumulated across jobs.
#[derive(Debug, Clone, Default)]
pub struct RebootFlag(Arc<AtomicBool>);

impl RebootFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_scheduled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything a job may need besides its own descriptor.
///
/// Constructed once in [`crate::run`]; clones share the same flags.
#[derive(Debug, Clone, Default)]
pub struct EngineContext {
    pub stop: StopFlag,
    pub reboot: RebootFlag,
}

impl EngineContext {
    pub fn new() -> Self {
        Self::default()
    }
}
