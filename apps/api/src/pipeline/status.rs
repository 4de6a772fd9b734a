//! Observable pipeline state plus a human-readable narrative.
//!
//! A `StatusTracker` is both the observer channel (handlers poll `current()`)
//! and the re-entrancy guard: `try_begin` only succeeds when no run is active
//! on that tracker.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Uploading,
    Converting,
    UploadingImage,
    Persisting,
    Analyzing,
    Finalizing,
    Done,
    Failed,
}

impl PipelineState {
    /// True while a run owns the tracker.
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Idle | Self::Done | Self::Failed)
    }

    fn narrative(self) -> &'static str {
        match self {
            Self::Idle => "",
            Self::Uploading => "Uploading the file...",
            Self::Converting => "Converting to image...",
            Self::UploadingImage => "Uploading the image...",
            Self::Persisting => "Preparing data...",
            Self::Analyzing => "Analyzing...",
            Self::Finalizing => "Finalizing...",
            Self::Done => "Analysis complete, redirecting...",
            Self::Failed => "Something went wrong",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineStatus {
    pub state: PipelineState,
    pub message: String,
}

impl PipelineStatus {
    fn of(state: PipelineState) -> Self {
        Self {
            state,
            message: state.narrative().to_string(),
        }
    }
}

/// Returned by `try_begin` when a run is already in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlreadyRunning;

#[derive(Clone)]
pub struct StatusTracker {
    tx: Arc<watch::Sender<PipelineStatus>>,
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(PipelineStatus::of(PipelineState::Idle));
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> PipelineStatus {
        self.tx.borrow().clone()
    }

    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<PipelineStatus> {
        self.tx.subscribe()
    }

    /// Atomically claims the tracker and enters `Uploading`.
    pub fn try_begin(&self) -> Result<(), AlreadyRunning> {
        let claimed = self.tx.send_if_modified(|status| {
            if status.state.is_active() {
                return false;
            }
            *status = PipelineStatus::of(PipelineState::Uploading);
            true
        });
        if claimed {
            debug!("status → {:?}", PipelineState::Uploading);
            Ok(())
        } else {
            Err(AlreadyRunning)
        }
    }

    pub fn advance(&self, state: PipelineState) {
        debug!("status → {state:?}");
        self.tx.send_replace(PipelineStatus::of(state));
    }

    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        debug!("status → Failed: {message}");
        self.tx.send_replace(PipelineStatus {
            state: PipelineState::Failed,
            message,
        });
    }
}

/// Subjects held before finished trackers are evicted.
const MAX_TRACKERS: usize = 1024;

/// One tracker per session subject, so each user gets an independent guard.
///
/// Once `max_trackers` subjects are on the board, adding another drops every
/// tracker without an active run. A pruned subject reads as idle again.
#[derive(Clone)]
pub struct StatusBoard {
    trackers: Arc<Mutex<HashMap<String, StatusTracker>>>,
    max_trackers: usize,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::with_max_trackers(MAX_TRACKERS)
    }
}

impl StatusBoard {
    pub fn with_max_trackers(max_trackers: usize) -> Self {
        Self {
            trackers: Arc::default(),
            max_trackers,
        }
    }

    pub fn tracker(&self, subject: &str) -> StatusTracker {
        let mut trackers = self
            .trackers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !trackers.contains_key(subject) && trackers.len() >= self.max_trackers {
            let before = trackers.len();
            trackers.retain(|_, tracker| tracker.current().state.is_active());
            debug!("Pruned {} finished status trackers", before - trackers.len());
        }
        trackers.entry(subject.to_string()).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tracker_is_idle() {
        let tracker = StatusTracker::new();
        assert_eq!(tracker.current().state, PipelineState::Idle);
    }

    #[test]
    fn test_second_begin_is_refused_while_active() {
        let tracker = StatusTracker::new();
        tracker.try_begin().unwrap();
        assert_eq!(tracker.try_begin(), Err(AlreadyRunning));
        tracker.advance(PipelineState::Analyzing);
        assert_eq!(tracker.try_begin(), Err(AlreadyRunning));
    }

    #[test]
    fn test_begin_is_allowed_after_done_or_failed() {
        let tracker = StatusTracker::new();
        tracker.try_begin().unwrap();
        tracker.advance(PipelineState::Done);
        tracker.try_begin().unwrap();
        tracker.fail("Failed to upload file");
        tracker.try_begin().unwrap();
        assert_eq!(tracker.current().message, "Uploading the file...");
    }

    #[test]
    fn test_fail_keeps_the_message() {
        let tracker = StatusTracker::new();
        tracker.fail("Failed to upload image");
        let status = tracker.current();
        assert_eq!(status.state, PipelineState::Failed);
        assert_eq!(status.message, "Failed to upload image");
    }

    #[test]
    fn test_subscribers_see_updates() {
        let tracker = StatusTracker::new();
        let mut rx = tracker.subscribe();
        tracker.advance(PipelineState::Converting);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().message, "Converting to image...");
    }

    #[test]
    fn test_board_shares_tracker_per_subject() {
        let board = StatusBoard::default();
        board.tracker("alice").try_begin().unwrap();
        assert_eq!(board.tracker("alice").try_begin(), Err(AlreadyRunning));
        board.tracker("bob").try_begin().unwrap();
    }

    #[test]
    fn test_full_board_evicts_finished_trackers_only() {
        let board = StatusBoard::with_max_trackers(2);
        board.tracker("alice").try_begin().unwrap();
        let bob = board.tracker("bob");
        bob.try_begin().unwrap();
        bob.advance(PipelineState::Done);

        board.tracker("carol");

        assert_eq!(board.tracker("alice").try_begin(), Err(AlreadyRunning));
        assert_eq!(board.tracker("bob").current().state, PipelineState::Idle);
    }

    #[test]
    fn test_status_serializes_snake_case_state() {
        let json = serde_json::to_value(PipelineStatus::of(PipelineState::UploadingImage)).unwrap();
        assert_eq!(json["state"], "uploading_image");
        assert_eq!(json["message"], "Uploading the image...");
    }
}
