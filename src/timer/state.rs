use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp;
use std::time::Instant;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    Idle,
    Running,
    Stopped,
}

impl Default for TimerStatus {
    fn default() -> Self {
        TimerStatus::Idle
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerMode {
    Focus,
    Break,
}

impl Default for TimerMode {
    fn default() -> Self {
        TimerMode::Focus
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub status: TimerStatus,
    pub mode: TimerMode,
    /// Task being worked on, when the session was started from one.
    pub task_id: Option<String>,
    pub target_ms: u64,
    pub active_ms: u64,
    pub started_at: Option<DateTime<Utc>>,
    /// Time accumulated from earlier running windows; combines with
    /// `running_anchor` to compute the true active duration.
    #[serde(skip)]
    pub active_ms_baseline: u64,
    #[serde(skip)]
    pub running_anchor: Option<Instant>,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            status: TimerStatus::Idle,
            mode: TimerMode::Focus,
            task_id: None,
            target_ms: 0,
            active_ms: 0,
            started_at: None,
            active_ms_baseline: 0,
            running_anchor: None,
        }
    }
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Milliseconds left on the countdown; 0 unless running. Both focus and
    /// break sessions count down toward zero.
    pub fn remaining_ms(&self) -> i64 {
        match self.status {
            TimerStatus::Idle | TimerStatus::Stopped => 0,
            TimerStatus::Running => {
                let remaining = self.target_ms as i64 - self.current_active_ms() as i64;
                cmp::max(remaining, 0)
            }
        }
    }

    pub fn current_active_ms(&self) -> u64 {
        if let (TimerStatus::Running, Some(anchor)) = (self.status, self.running_anchor) {
            self.active_ms_baseline
                .saturating_add(anchor.elapsed().as_millis() as u64)
        } else {
            self.active_ms
        }
    }

    pub fn sync_active_from_anchor(&mut self) {
        if let (TimerStatus::Running, Some(anchor)) = (self.status, self.running_anchor) {
            self.active_ms = self
                .active_ms_baseline
                .saturating_add(anchor.elapsed().as_millis() as u64);
        }
    }

    pub fn begin_session(
        &mut self,
        task_id: Option<String>,
        target_ms: u64,
        mode: TimerMode,
        start_at: DateTime<Utc>,
        now: Instant,
    ) {
        *self = Self {
            status: TimerStatus::Running,
            mode,
            task_id,
            target_ms,
            active_ms: 0,
            started_at: Some(start_at),
            active_ms_baseline: 0,
            running_anchor: Some(now),
        };
    }

    pub fn stop(&mut self) {
        self.sync_active_from_anchor();
        self.status = TimerStatus::Stopped;
        self.running_anchor = None;
        self.active_ms_baseline = self.active_ms;
    }

    pub fn cancel(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_timer_has_nothing_remaining() {
        let state = TimerState::new();
        assert_eq!(state.status, TimerStatus::Idle);
        assert_eq!(state.remaining_ms(), 0);
    }

    #[test]
    fn begin_session_resets_everything() {
        let mut state = TimerState::new();
        state.active_ms = 5_000;

        state.begin_session(
            Some("task-1".to_string()),
            25 * 60 * 1000,
            TimerMode::Focus,
            Utc::now(),
            Instant::now(),
        );

        assert_eq!(state.status, TimerStatus::Running);
        assert_eq!(state.task_id.as_deref(), Some("task-1"));
        assert_eq!(state.active_ms, 0);
        assert!(state.remaining_ms() > 0);
        assert!(state.remaining_ms() <= 25 * 60 * 1000);
    }

    #[test]
    fn stop_freezes_active_time_and_zeroes_remaining() {
        let mut state = TimerState::new();
        state.begin_session(None, 60_000, TimerMode::Break, Utc::now(), Instant::now());
        state.stop();

        assert_eq!(state.status, TimerStatus::Stopped);
        assert!(state.running_anchor.is_none());
        assert_eq!(state.remaining_ms(), 0);
    }

    #[test]
    fn cancel_returns_to_idle_defaults() {
        let mut state = TimerState::new();
        state.begin_session(None, 60_000, TimerMode::Focus, Utc::now(), Instant::now());
        state.cancel();

        assert_eq!(state.status, TimerStatus::Idle);
        assert!(state.task_id.is_none());
        assert_eq!(state.target_ms, 0);
    }
}
