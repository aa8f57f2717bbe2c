//! Ctrl+C handling.
//!
//! A signal is only absorbed while the gate is armed, which is the screen
//! recording window. Anywhere else it terminates the process the way an
//! unhandled SIGINT would, leaving the workspace on disk.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::app::error::AppError;

/// Exit status used when Ctrl+C arrives outside the recording window.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Debug, Default)]
struct GateState {
    armed: AtomicBool,
    fired: AtomicBool,
}

#[derive(Debug, Clone, Default)]
pub struct InterruptGate {
    state: Arc<GateState>,
}

impl InterruptGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the process-wide Ctrl+C handler. Call at most once per process.
    pub fn install(&self, trace_id: &str) -> Result<(), AppError> {
        let gate = self.clone();
        ctrlc::set_handler(move || {
            if !gate.on_signal() {
                std::process::exit(INTERRUPTED_EXIT_CODE);
            }
        })
        .map_err(|err| AppError::system(format!("Failed to install Ctrl+C handler: {err}"), trace_id))
    }

    /// Records a signal. Returns `false` when the gate is not armed.
    pub fn on_signal(&self) -> bool {
        if self.state.armed.load(Ordering::SeqCst) {
            self.state.fired.store(true, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    pub fn arm(&self) -> ArmedWindow<'_> {
        self.state.fired.store(false, Ordering::SeqCst);
        self.state.armed.store(true, Ordering::SeqCst);
        ArmedWindow { gate: self }
    }

    pub fn is_armed(&self) -> bool {
        self.state.armed.load(Ordering::SeqCst)
    }

    pub fn is_fired(&self) -> bool {
        self.state.fired.load(Ordering::SeqCst)
    }
}

/// Keeps the gate armed until dropped.
#[derive(Debug)]
pub struct ArmedWindow<'a> {
    gate: &'a InterruptGate,
}

impl Drop for ArmedWindow<'_> {
    fn drop(&mut self) {
        self.gate.state.armed.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_outside_window_is_not_absorbed() {
        let gate = InterruptGate::new();
        assert!(!gate.on_signal());
        assert!(!gate.is_fired());
    }

    #[test]
    fn signal_inside_window_is_recorded() {
        let gate = InterruptGate::new();
        {
            let _window = gate.arm();
            assert!(gate.is_armed());
            assert!(gate.on_signal());
            assert!(gate.is_fired());
        }
        assert!(!gate.is_armed());
        assert!(!gate.on_signal());
    }

    #[test]
    fn arming_clears_a_previous_signal() {
        let gate = InterruptGate::new();
        {
            let _window = gate.arm();
            gate.on_signal();
        }
        let _window = gate.arm();
        assert!(!gate.is_fired());
    }

    #[test]
    fn clones_share_state() {
        let gate = InterruptGate::new();
        let handler_side = gate.clone();
        let _window = gate.arm();
        assert!(handler_side.on_signal());
        assert!(gate.is_fired());
    }
}
