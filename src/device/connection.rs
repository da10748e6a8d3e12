use std::sync::Arc;
use futures::channel::mpsc::Receiver;
use log::{debug, error, info, warn};
use parking_lot::{Mutex, MutexGuard};
use tokio::spawn;
use tokio::task::{spawn_blocking, JoinHandle};
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

use crate::audio::MicrophoneControl;
use crate::device::color::ColorController;
use crate::device::constants::{DEVICE_CHECK_INTERVAL, OPEN_RETRY_DELAY, READ_TIMEOUT, REPORT_LENGTH};
use crate::device::link::DeviceLink;
use crate::device::locator::DeviceLocator;
use crate::device::touch::TouchDecoder;
use crate::device::types::{ColorAssignment, DeviceIdentity, MuteState, TouchState};
use crate::error::{readable_thread_panic_error, OpenError, UiMessageError};
use crate::ui::channel::ButtonEndpoint;
use crate::ui::listener::ui_listener_task;
use crate::ui::types::UiEnvelope;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimings {
    pub device_check_interval: Duration,
    pub open_retry_delay: Duration,
    pub read_timeout: Duration,
}

impl Default for SessionTimings {
    fn default() -> Self {
        SessionTimings {
            device_check_interval: Duration::from_millis(DEVICE_CHECK_INTERVAL),
            open_retry_delay: Duration::from_millis(OPEN_RETRY_DELAY),
            read_timeout: Duration::from_millis(READ_TIMEOUT),
        }
    }
}

/// Everything the monitor, read and UI loops share. The surrounding lock is the one lock that
/// serializes all reads and writes on the device stream.
pub struct SessionState {
    pub(crate) link: DeviceLink,
    pub(crate) colors: ColorController,
    pub(crate) touch: TouchDecoder,
    pub(crate) mute: MuteState,
}

pub type SharedState = Arc<Mutex<SessionState>>;

impl SessionState {
    pub(crate) fn new(link: DeviceLink, colors: ColorController) -> Self {
        SessionState {
            link,
            colors,
            touch: TouchDecoder::default(),
            mute: MuteState::default(),
        }
    }

    fn reset(&mut self) {
        self.link.reset();
        self.touch.reset();
        self.mute = MuteState::default();
    }

    pub fn mute(&self) -> MuteState {
        self.mute
    }

    pub fn touch_state(&self) -> TouchState {
        self.touch.state()
    }

    pub fn color_assignment(&self) -> ColorAssignment {
        self.colors.assignment()
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    /// Show the color that belongs to the current mute state.
    pub fn refresh_colors(&mut self) {
        self.colors.render(&mut self.link, self.mute);
    }

    fn adjust_for_audio_state(&mut self, microphone: &dyn MicrophoneControl) {
        self.mute = MuteState::from_muted(microphone.is_muted());
        self.refresh_colors();
        self.link.notify(self.mute.into());
    }

    /// Flip the microphone, the LED and the UI to the opposite mute state.
    pub fn toggle_mute(&mut self, microphone: &dyn MicrophoneControl) {
        self.mute = match self.mute {
            MuteState::Muted => {
                info!("Unmuting");
                microphone.unmute();
                MuteState::Unmuted
            },
            MuteState::Unmuted => {
                info!("Muting");
                microphone.mute();
                MuteState::Muted
            },
        };

        self.refresh_colors();
        self.link.notify(self.mute.into());
    }

    pub fn handle_report(&mut self, report: &[u8], microphone: &dyn MicrophoneControl) {
        if self.touch.apply_report(report) {
            self.toggle_mute(microphone);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionPhase {
    Searching,
    Connected {
        identity: DeviceIdentity,
    },
}

/// Owns the button: finds it, keeps it connected and runs the read and UI loops while it is.
pub struct ButtonSession {
    locator: Arc<dyn DeviceLocator>,
    microphone: Arc<dyn MicrophoneControl>,
    state: SharedState,
    // taken by the first connection; the UI listener is started once per session
    requests: Option<Receiver<UiEnvelope>>,
    timings: SessionTimings,
}

impl ButtonSession {
    pub fn new(
        locator: Arc<dyn DeviceLocator>,
        microphone: Arc<dyn MicrophoneControl>,
        endpoint: ButtonEndpoint,
        colors: ColorAssignment,
        timings: SessionTimings,
    ) -> Self {
        let link = DeviceLink::new(endpoint.notifier);
        let state = SessionState::new(link, ColorController::new(colors));

        ButtonSession {
            locator,
            microphone,
            state: Arc::new(Mutex::new(state)),
            requests: Some(endpoint.requests),
            timings,
        }
    }

    pub fn state(&self) -> SharedState {
        self.state.clone()
    }

    // Enumeration, open and the microphone query all block, so each check runs on the blocking pool.
    fn spawn_device_check(&self, phase: SessionPhase) -> JoinHandle<(SessionPhase, Duration)> {
        let locator = self.locator.clone();
        let microphone = self.microphone.clone();
        let state = self.state.clone();
        let timings = self.timings;

        spawn_blocking(move || check_device(locator.as_ref(), microphone.as_ref(), &state, timings, phase))
    }

    fn spawn_read_loop(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let state = self.state.clone();
        let microphone = self.microphone.clone();
        let timeout = self.timings.read_timeout;

        spawn_blocking(move || read_loop(state, microphone, cancel, timeout))
    }

    /// Run until `cancel` fires. Device faults never end this loop.
    ///
    /// Presence is checked every `device_check_interval`. A button that is found but will not open
    /// is retried after the longer `open_retry_delay`. Losing a connected button (unplug, read or
    /// write failure) starts the next search at once instead of waiting for the next tick.
    pub async fn monitor(mut self, cancel: CancellationToken) {
        self.state.lock().reset();

        let mut phase = SessionPhase::Searching;
        let mut connection_cancel = cancel.child_token();
        let mut read_task: Option<JoinHandle<()>> = None;
        let mut ui_task: Option<JoinHandle<Result<(), UiMessageError>>> = None;

        loop {
            let check = self.spawn_device_check(phase);
            let (next_phase, delay) = join_device_check(check, self.timings).await;
            phase = next_phase;

            match phase {
                SessionPhase::Connected { .. } => {
                    if read_task.is_none() {
                        read_task = Some(self.spawn_read_loop(connection_cancel.clone()));
                    }

                    if let Some(requests) = self.requests.take() {
                        ui_task = Some(spawn(ui_listener_task(self.state.clone(), requests, cancel.clone())));
                    }
                },
                SessionPhase::Searching => {
                    // Not connected, stop the read loop of the previous connection if there was one
                    if let Some(handle) = read_task.take() {
                        connection_cancel.cancel();
                        connection_cancel = cancel.child_token();
                        join_read_task(handle).await;
                    }
                },
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(delay) => {},
            }
        }

        info!("Stopping button session");
        connection_cancel.cancel();
        if let Some(handle) = read_task.take() {
            join_read_task(handle).await;
        }

        self.state.lock().link.detach();

        if let Some(handle) = ui_task.take() {
            match handle.await {
                Ok(Ok(())) => {},
                Ok(Err(err)) => error!("UI listener stopped: {}", err),
                Err(err) if err.is_panic() => error!("UI listener failed: {}", readable_thread_panic_error(&err.into_panic())),
                Err(err) => warn!("UI listener was not joined: {}", err),
            }
        }
        info!("Button session stopped");
    }
}

async fn join_device_check(handle: JoinHandle<(SessionPhase, Duration)>, timings: SessionTimings) -> (SessionPhase, Duration) {
    match handle.await {
        Ok(next) => next,
        Err(err) => {
            if err.is_panic() {
                error!("Device check failed: {}", readable_thread_panic_error(&err.into_panic()));
            } else {
                warn!("Device check was not joined: {}", err);
            }
            (SessionPhase::Searching, timings.device_check_interval)
        },
    }
}

async fn join_read_task(handle: JoinHandle<()>) {
    debug!("Waiting for read loop to stop");

    match handle.await {
        Ok(()) => debug!("Read loop stopped"),
        Err(err) if err.is_panic() => error!("Read loop failed: {}", readable_thread_panic_error(&err.into_panic())),
        Err(err) => warn!("Read loop was not joined: {}", err),
    }
}

fn check_device(
    locator: &dyn DeviceLocator,
    microphone: &dyn MicrophoneControl,
    state: &Mutex<SessionState>,
    timings: SessionTimings,
    phase: SessionPhase,
) -> (SessionPhase, Duration) {
    let tick = timings.device_check_interval;

    match phase {
        SessionPhase::Searching => {
            let Some(identity) = locator.find() else {
                state.lock().link.detach();
                return (SessionPhase::Searching, tick);
            };

            match locator.open(identity) {
                Ok(handle) => {
                    let mut state = state.lock();
                    state.touch.reset();
                    state.link.attach(handle);
                    state.adjust_for_audio_state(microphone);
                    (SessionPhase::Connected { identity }, tick)
                },
                Err(err) => {
                    let delay = timings.open_retry_delay;
                    match err {
                        OpenError::NotFound { .. } => warn!("Button disappeared before it could be opened, retrying in {}", humantime::format_duration(delay)),
                        OpenError::Busy { .. } => warn!("Could not open button, retrying in {}: {}", humantime::format_duration(delay), err),
                    }
                    state.lock().link.detach();
                    (SessionPhase::Searching, delay)
                },
            }
        },
        SessionPhase::Connected { identity } => {
            if !state.lock().link.is_connected() {
                // the read loop or a color write already reported the loss
                info!("Connection lost, searching again");
                return (SessionPhase::Searching, Duration::ZERO);
            }

            if !locator.still_present(identity) {
                warn!("Button {} was unplugged", identity);
                state.lock().link.detach();
                return (SessionPhase::Searching, Duration::ZERO);
            }

            (SessionPhase::Connected { identity }, tick)
        },
    }
}

fn read_loop(state: SharedState, microphone: Arc<dyn MicrophoneControl>, cancel: CancellationToken, timeout: Duration) {
    let mut buffer = [0_u8; REPORT_LENGTH];
    debug!("Read loop started");

    while !cancel.is_cancelled() {
        let mut guard = state.lock();

        if !guard.link.has_handle() {
            break;
        }

        match guard.link.read(&mut buffer, timeout) {
            Ok(0) => {},
            Ok(len) => guard.handle_report(&buffer[..len], microphone.as_ref()),
            Err(err) => {
                warn!("Failed to read from button: {}", err);
                guard.link.detach();
                break;
            },
        }

        // hand the lock to a waiting writer before reading again
        MutexGuard::unlock_fair(guard);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::mock::MockMicrophone;
    use crate::device::mock::MockLocator;
    use crate::device::types::Color;
    use crate::ui::channel::{ui_channel, UiEndpoint};
    use crate::ui::types::OutboundUiMessage;
    use futures::StreamExt;

    struct SlowMicrophone {
        delay: Duration,
    }

    impl MicrophoneControl for SlowMicrophone {
        fn is_muted(&self) -> bool {
            std::thread::sleep(self.delay);
            true
        }

        fn mute(&self) {}

        fn unmute(&self) {}
    }

    fn connected_state(locator: &MockLocator) -> (SessionState, UiEndpoint) {
        let (button, ui) = ui_channel(16);
        let mut state = SessionState::new(DeviceLink::new(button.notifier), ColorController::new(ColorAssignment::default()));
        let identity = locator.find().expect("mock should be attached");
        state.link.attach(locator.open(identity).expect("mock should open"));
        (state, ui)
    }

    fn drain(ui: &mut UiEndpoint) -> Vec<OutboundUiMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = ui.notifications.try_recv() {
            messages.push(message);
        }
        messages
    }

    #[test]
    fn touch_cycle_mutes_once() {
        let locator = MockLocator::attached();
        let microphone = MockMicrophone::new(false);
        let (mut state, mut ui) = connected_state(&locator);

        state.handle_report(&[0, 0, 0, 0, 1, 0, 0, 0], &microphone);
        state.handle_report(&[0, 0, 0, 0, 2, 0, 0, 0], &microphone);
        state.handle_report(&[0, 0, 0, 0, 2, 0, 0, 0], &microphone);

        assert_eq!(microphone.mute_calls(), 1);
        assert_eq!(microphone.unmute_calls(), 0);
        assert_eq!(state.mute(), MuteState::Muted);
        assert_eq!(locator.commands(), vec![Color::Red.code()]);
        assert_eq!(drain(&mut ui), vec![OutboundUiMessage::Connected, OutboundUiMessage::Muted]);
    }

    #[test]
    fn second_cycle_unmutes() {
        let locator = MockLocator::attached();
        let microphone = MockMicrophone::new(false);
        let (mut state, _ui) = connected_state(&locator);

        for code in [1, 2, 1, 2] {
            state.handle_report(&[0, 0, 0, 0, code, 0, 0, 0], &microphone);
        }

        assert_eq!(microphone.mute_calls(), 1);
        assert_eq!(microphone.unmute_calls(), 1);
        assert_eq!(state.mute(), MuteState::Unmuted);
        assert_eq!(locator.commands(), vec![Color::Red.code(), Color::Green.code()]);
    }

    #[test]
    fn unknown_report_changes_nothing() {
        let locator = MockLocator::attached();
        let microphone = MockMicrophone::new(false);
        let (mut state, mut ui) = connected_state(&locator);

        state.handle_report(&[0, 0, 0, 0, 7, 0, 0, 0], &microphone);

        assert_eq!(microphone.mute_calls(), 0);
        assert!(locator.written().is_empty());
        assert_eq!(drain(&mut ui), vec![OutboundUiMessage::Connected]);
    }

    #[test]
    fn initial_audio_state_is_rendered() {
        let locator = MockLocator::attached();
        let microphone = MockMicrophone::new(true);
        let (mut state, mut ui) = connected_state(&locator);

        state.adjust_for_audio_state(&microphone);

        assert_eq!(state.mute(), MuteState::Muted);
        assert_eq!(locator.commands(), vec![Color::Red.code()]);
        assert_eq!(drain(&mut ui), vec![OutboundUiMessage::Connected, OutboundUiMessage::Muted]);
    }

    #[test]
    fn reset_restores_defaults() {
        let locator = MockLocator::attached();
        let microphone = MockMicrophone::new(true);
        let (mut state, _ui) = connected_state(&locator);
        state.adjust_for_audio_state(&microphone);
        state.handle_report(&[0, 0, 0, 0, 1, 0, 0, 0], &microphone);

        state.reset();

        assert_eq!(state.mute(), MuteState::Unmuted);
        assert_eq!(state.touch_state(), TouchState::Idle);
        assert!(!state.is_connected());
        assert_eq!(locator.open_handles(), 0);
    }

    // single-threaded runtime: a blocking device check would hold up the timer below
    #[tokio::test]
    async fn device_check_does_not_stall_the_runtime() {
        let locator = MockLocator::attached();
        let (button, mut ui) = ui_channel(16);
        let cancel = CancellationToken::new();
        let timings = SessionTimings {
            device_check_interval: Duration::from_millis(50),
            open_retry_delay: Duration::from_millis(50),
            read_timeout: Duration::from_millis(5),
        };
        let microphone = Arc::new(SlowMicrophone { delay: Duration::from_millis(400) });

        let session = ButtonSession::new(Arc::new(locator.clone()), microphone, button, ColorAssignment::default(), timings);
        let session = spawn(session.monitor(cancel.clone()));

        let started = std::time::Instant::now();
        sleep(Duration::from_millis(20)).await;
        assert!(started.elapsed() < Duration::from_millis(300));

        assert_eq!(ui.notifications.next().await, Some(OutboundUiMessage::Connected));
        assert_eq!(ui.notifications.next().await, Some(OutboundUiMessage::Muted));

        cancel.cancel();
        session.await.expect("session should stop");
        assert_eq!(locator.open_handles(), 0);
    }
}
