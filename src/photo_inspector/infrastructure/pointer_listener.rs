use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::domain::pointer::PointerListener;

/// Subscription flag shared with the HTTP layer. The frontend polls
/// `/api/viewer/status` and only forwards pointer moves while it is set.
#[derive(Clone, Default)]
pub struct SharedPointerListener {
    attached: Arc<AtomicBool>,
}

impl SharedPointerListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }
}

impl PointerListener for SharedPointerListener {
    fn attach(&mut self) {
        debug!("pointer listener attached");
        self.attached.store(true, Ordering::SeqCst);
    }

    fn detach(&mut self) {
        debug!("pointer listener detached");
        self.attached.store(false, Ordering::SeqCst);
    }
}
