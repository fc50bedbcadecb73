//! Loop lifecycle state.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::Serialize;

/// Lifecycle of a live inference loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    /// Created, not started.
    Idle,
    /// Running; the rolling window is not full yet.
    WarmingUp,
    /// Running; the window is full and no prediction is outstanding.
    Ready,
    /// A prediction is outstanding.
    Inferring,
    /// Stopped. Terminal.
    Stopped,
}

impl LoopState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LoopState::Idle,
            1 => LoopState::WarmingUp,
            2 => LoopState::Ready,
            3 => LoopState::Inferring,
            _ => LoopState::Stopped,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            LoopState::Idle => 0,
            LoopState::WarmingUp => 1,
            LoopState::Ready => 2,
            LoopState::Inferring => 3,
            LoopState::Stopped => 4,
        }
    }

    pub fn is_running(self) -> bool {
        matches!(self, LoopState::WarmingUp | LoopState::Ready | LoopState::Inferring)
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopState::Idle => "idle",
            LoopState::WarmingUp => "warming-up",
            LoopState::Ready => "ready",
            LoopState::Inferring => "inferring",
            LoopState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Shared state cell. Once stopped, it never leaves [`LoopState::Stopped`].
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new(state: LoopState) -> Self {
        Self(AtomicU8::new(state.as_u8()))
    }

    pub(crate) fn get(&self) -> LoopState {
        LoopState::from_u8(self.0.load(Ordering::SeqCst))
    }

    /// Move to `next` unless the loop has stopped. Returns whether the
    /// transition happened.
    pub(crate) fn transition(&self, next: LoopState) -> bool {
        let stopped = LoopState::Stopped.as_u8();
        self.0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                (current != stopped).then_some(next.as_u8())
            })
            .is_ok()
    }

    /// Enter the terminal state. Returns the previous state.
    pub(crate) fn stop(&self) -> LoopState {
        LoopState::from_u8(self.0.swap(LoopState::Stopped.as_u8(), Ordering::SeqCst))
    }
}
