//! Loop policy attached to the track that was started by a play request.

use std::fmt;

/// How many more times the current track repeats before normal continuation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoopState {
    #[default]
    NoLoop,
    Infinite,
    /// Remaining replays. `Finite(0)` means the last scheduled replay just completed.
    Finite(u32),
}

/// What a natural (non-skip) track end resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    Replay,
    Continue,
}

impl LoopState {
    /// Applies one natural track end to the loop state.
    pub fn on_track_end(&mut self) -> LoopAction {
        match *self {
            LoopState::Infinite => LoopAction::Replay,
            LoopState::Finite(remaining) if remaining > 0 => {
                *self = LoopState::Finite(remaining - 1);
                LoopAction::Replay
            }
            LoopState::Finite(_) => {
                *self = LoopState::NoLoop;
                LoopAction::Continue
            }
            LoopState::NoLoop => LoopAction::Continue,
        }
    }

    pub fn is_looping(&self) -> bool {
        !matches!(self, LoopState::NoLoop)
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopState::NoLoop => write!(f, "off"),
            LoopState::Infinite => write!(f, "infinite"),
            LoopState::Finite(n) => write!(f, "{} more", n),
        }
    }
}
