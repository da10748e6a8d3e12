use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::audio::MicrophoneControl;

/// A microphone that only remembers what it was told.
#[derive(Debug, Default)]
pub struct MockMicrophone {
    muted: AtomicBool,
    mute_calls: AtomicUsize,
    unmute_calls: AtomicUsize,
}

impl MockMicrophone {
    pub fn new(muted: bool) -> Self {
        MockMicrophone {
            muted: AtomicBool::new(muted),
            ..Default::default()
        }
    }

    pub fn mute_calls(&self) -> usize {
        self.mute_calls.load(Ordering::SeqCst)
    }

    pub fn unmute_calls(&self) -> usize {
        self.unmute_calls.load(Ordering::SeqCst)
    }
}

impl MicrophoneControl for MockMicrophone {
    fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    fn mute(&self) {
        self.mute_calls.fetch_add(1, Ordering::SeqCst);
        self.muted.store(true, Ordering::SeqCst);
    }

    fn unmute(&self) {
        self.unmute_calls.fetch_add(1, Ordering::SeqCst);
        self.muted.store(false, Ordering::SeqCst);
    }
}
