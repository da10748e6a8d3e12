pub mod mock;
pub mod pactl;

/// The operating system's microphone mute switch.
///
/// Called from the blocking read loop, so implementations must be thread safe and should return
/// promptly. Failures are the implementation's to log.
pub trait MicrophoneControl: Send + Sync {
    fn is_muted(&self) -> bool;

    fn mute(&self);

    fn unmute(&self);
}
