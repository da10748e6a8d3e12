use log::{debug, trace};

use crate::device::constants::{REPORT_CODE_IDLE, REPORT_CODE_OFFSET, REPORT_CODE_TOUCH_DOWN, REPORT_CODE_TOUCH_UP};
use crate::device::types::TouchState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchEvent {
    Idle,
    TouchDown,
    TouchUp,
    Unknown(u8),
}

impl TouchEvent {
    /// Decode the touch code of a raw report. `None` if the report is too short to carry one.
    pub fn decode(report: &[u8]) -> Option<TouchEvent> {
        let code = *report.get(REPORT_CODE_OFFSET)?;

        let event = match code {
            REPORT_CODE_IDLE => TouchEvent::Idle,
            REPORT_CODE_TOUCH_DOWN => TouchEvent::TouchDown,
            REPORT_CODE_TOUCH_UP => TouchEvent::TouchUp,
            other => TouchEvent::Unknown(other),
        };
        Some(event)
    }
}

/// Debounces the touch sensor: a release only counts if it follows a touch.
#[derive(Debug, Default)]
pub struct TouchDecoder {
    state: TouchState,
}

impl TouchDecoder {
    pub fn state(&self) -> TouchState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = TouchState::Idle;
    }

    /// Apply one decoded event. Returns true when a touch-release cycle completed.
    pub fn apply(&mut self, event: TouchEvent) -> bool {
        match (event, self.state) {
            (TouchEvent::TouchDown, TouchState::Idle) => {
                debug!("Button touched");
                self.state = TouchState::Touched;
                false
            },
            (TouchEvent::TouchUp, TouchState::Touched) => {
                debug!("Button released");
                self.state = TouchState::Idle;
                true
            },
            (TouchEvent::Unknown(code), _) => {
                trace!("Unknown value from device: {}", code);
                false
            },
            _ => false,
        }
    }

    /// Decode a raw report and apply it.
    pub fn apply_report(&mut self, report: &[u8]) -> bool {
        match TouchEvent::decode(report) {
            Some(event) => self.apply(event),
            None => {
                trace!("Ignoring short report of {} bytes", report.len());
                false
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(code: u8) -> [u8; 8] {
        [0, 0, 0, 0, code, 0, 0, 0]
    }

    #[test]
    fn decodes_code_at_offset_four() {
        assert_eq!(TouchEvent::decode(&report(0)), Some(TouchEvent::Idle));
        assert_eq!(TouchEvent::decode(&report(1)), Some(TouchEvent::TouchDown));
        assert_eq!(TouchEvent::decode(&report(2)), Some(TouchEvent::TouchUp));
        assert_eq!(TouchEvent::decode(&report(7)), Some(TouchEvent::Unknown(7)));
        assert_eq!(TouchEvent::decode(&[1, 2, 1]), None);
    }

    #[test]
    fn touch_then_release_completes_once() {
        let mut decoder = TouchDecoder::default();

        assert!(!decoder.apply_report(&report(1)));
        assert_eq!(decoder.state(), TouchState::Touched);
        assert!(decoder.apply_report(&report(2)));
        assert_eq!(decoder.state(), TouchState::Idle);

        // duplicate release is swallowed
        assert!(!decoder.apply_report(&report(2)));
    }

    #[test]
    fn release_without_touch_is_ignored() {
        let mut decoder = TouchDecoder::default();
        assert!(!decoder.apply_report(&report(2)));
        assert_eq!(decoder.state(), TouchState::Idle);
    }

    #[test]
    fn repeated_touch_does_not_double_count() {
        let mut decoder = TouchDecoder::default();
        decoder.apply_report(&report(1));
        decoder.apply_report(&report(1));
        decoder.apply_report(&report(0));

        assert!(decoder.apply_report(&report(2)));
        assert!(!decoder.apply_report(&report(2)));
    }

    #[test]
    fn completions_match_recognised_cycles() {
        // 1 2 2 1 1 2 7 2 1 0 2 -> three cycles
        let codes = [1, 2, 2, 1, 1, 2, 7, 2, 1, 0, 2];
        let mut decoder = TouchDecoder::default();

        let completed = codes.iter().filter(|code| decoder.apply_report(&report(**code))).count();
        assert_eq!(completed, 3);
    }

    #[test]
    fn unknown_code_keeps_state() {
        let mut decoder = TouchDecoder::default();
        decoder.apply_report(&report(1));

        assert!(!decoder.apply_report(&report(7)));
        assert_eq!(decoder.state(), TouchState::Touched);
    }
}
