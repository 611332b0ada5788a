//! Per-guild playback state: queue, bounded history, loop state and the transient flags.
//!
//! `GuildSession` does no I/O and no locking of its own. The `MusicManager` hands it out behind
//! a per-guild mutex and every caller mutates it inside a short, non-suspending critical section.

use rand::seq::SliceRandom;
use std::collections::VecDeque;
use tracing::debug;

use super::loop_state::{LoopAction, LoopState};
use crate::commands::music::audio_sources::Track;

/// Number of finished tracks kept for "previous".
pub const HISTORY_CAPACITY: usize = 3;

/// What the session decided after a track-ended notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackEndAction {
    /// A manual transition already decided what plays next; the skip flag was consumed.
    SkipConsumed,
    /// The loop policy asks for the same track again.
    Replay(Track),
    /// The ended track moved to history and this one was popped from the queue to play next.
    Advance(Track),
    /// The ended track moved to history and the queue is empty.
    Idle,
}

/// Result of a shuffle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShuffleOutcome {
    Shuffled,
    /// A playlist is loading; the shuffle runs once ingestion completes.
    Deferred,
    NotEnoughTracks,
}

/// Read-only copy of the session for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub queue: Vec<Track>,
    /// Oldest first.
    pub history: Vec<Track>,
    pub loop_state: LoopState,
    pub loading: bool,
}

#[derive(Debug, Default)]
pub struct GuildSession {
    queue: VecDeque<Track>,
    history: VecDeque<Track>,
    loop_state: LoopState,
    skip_flag: bool,
    loading: bool,
    pending_shuffle: bool,
}

impl GuildSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_queue(&mut self, track: Track) -> usize {
        self.queue.push_back(track);
        self.queue.len()
    }

    pub fn pop_front(&mut self) -> Option<Track> {
        self.queue.pop_front()
    }

    /// Requeues the interrupted track so it plays right after the one restored from history.
    pub fn insert_front(&mut self, track: Track) {
        self.queue.push_front(track);
    }

    /// Appends to history, dropping the oldest entry past capacity.
    pub fn push_history(&mut self, track: Track) {
        self.history.push_back(track);
        while self.history.len() > HISTORY_CAPACITY {
            if let Some(evicted) = self.history.pop_front() {
                debug!("History full, dropping '{}'", evicted.title);
            }
        }
    }

    /// Removes and returns the most recently finished track.
    pub fn pop_history(&mut self) -> Option<Track> {
        self.history.pop_back()
    }

    pub fn set_loop(&mut self, loop_state: LoopState) {
        self.loop_state = loop_state;
    }

    pub fn set_skip_flag(&mut self, value: bool) {
        self.skip_flag = value;
    }

    /// Reads and clears the skip flag in one step.
    pub fn take_skip_flag(&mut self) -> bool {
        std::mem::take(&mut self.skip_flag)
    }

    pub fn set_loading(&mut self, value: bool) {
        self.loading = value;
    }

    pub fn set_pending_shuffle(&mut self, value: bool) {
        self.pending_shuffle = value;
    }

    pub fn loop_state(&self) -> LoopState {
        self.loop_state
    }

    pub fn skip_flag(&self) -> bool {
        self.skip_flag
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn pending_shuffle(&self) -> bool {
        self.pending_shuffle
    }

    pub fn queue(&self) -> &VecDeque<Track> {
        &self.queue
    }

    pub fn history(&self) -> &VecDeque<Track> {
        &self.history
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn has_history(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn shuffle_queue(&mut self) {
        self.queue.make_contiguous().shuffle(&mut rand::rng());
    }

    /// Shuffles now, or defers the shuffle while a playlist is loading.
    pub fn request_shuffle(&mut self) -> ShuffleOutcome {
        if self.loading {
            self.pending_shuffle = true;
            ShuffleOutcome::Deferred
        } else if self.queue.len() < 2 {
            ShuffleOutcome::NotEnoughTracks
        } else {
            self.shuffle_queue();
            ShuffleOutcome::Shuffled
        }
    }

    /// Ends a loading phase. Runs the deferred shuffle if one was requested and reports whether
    /// it did.
    pub fn finish_loading(&mut self) -> bool {
        self.loading = false;
        if std::mem::take(&mut self.pending_shuffle) {
            self.shuffle_queue();
            true
        } else {
            false
        }
    }

    /// Removes the first queued track whose title or URI contains `identifier`, ignoring case.
    pub fn remove_matching(&mut self, identifier: &str) -> Option<Track> {
        let needle = identifier.to_lowercase();
        let position = self.queue.iter().position(|track| {
            track.title.to_lowercase().contains(&needle)
                || track.uri.to_lowercase().contains(&needle)
        })?;
        self.queue.remove(position)
    }

    /// Empties the queue and returns how many tracks were dropped.
    pub fn clear_queue(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        dropped
    }

    /// The end-of-track transition.
    ///
    /// The skip flag is only raised by operations that stop or replace an active track. A
    /// natural advance leaves it clear: nothing is playing any more, so the engine sends no
    /// further end notification that would consume it.
    pub fn on_track_end(&mut self, ended: Track) -> TrackEndAction {
        if self.take_skip_flag() {
            return TrackEndAction::SkipConsumed;
        }

        if self.loop_state.on_track_end() == LoopAction::Replay {
            return TrackEndAction::Replay(ended);
        }

        self.push_history(ended);
        match self.pop_front() {
            Some(next) => TrackEndAction::Advance(next),
            None => TrackEndAction::Idle,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            queue: self.queue.iter().cloned().collect(),
            history: self.history.iter().cloned().collect(),
            loop_state: self.loop_state,
            loading: self.loading,
        }
    }
}
