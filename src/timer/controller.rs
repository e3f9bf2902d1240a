use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{anyhow, Result};
use chrono::Utc;
use log::error;
use serde::Serialize;
use tauri::{AppHandle, Emitter};
use tokio::{sync::Mutex, task::JoinHandle, time};

use crate::store::DashboardStore;

use super::{TimerMode, TimerState, TimerStatus};

#[derive(Debug, Serialize, Clone)]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub remaining_ms: i64,
}

#[derive(Serialize, Clone)]
struct TimerStateChangedEvent {
    state: TimerState,
    remaining_ms: i64,
}

#[derive(Serialize, Clone)]
struct TimerHeartbeatEvent {
    state: TimerState,
    active_ms: u64,
    remaining_ms: i64,
}

/// Payload for `timer-finished`. The UI collects a focus score and calls
/// `complete_task` (or `record_session`) itself; the timer never feeds the
/// reducer directly.
#[derive(Serialize, Clone)]
struct TimerFinishedEvent {
    task_id: Option<String>,
    mode: TimerMode,
    active_ms: u64,
}

/// Drives the countdown. One ticker task at most: starting a session aborts
/// any previous ticker, and end/cancel abort it too, so a stopped timer can
/// never fire another tick.
#[derive(Clone)]
pub struct TimerController {
    state: Arc<Mutex<TimerState>>,
    store: Arc<DashboardStore>,
    app_handle: AppHandle,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    tick_interval: Duration,
    heartbeat_every_ticks: u32,
}

impl TimerController {
    pub fn new(app_handle: AppHandle, store: Arc<DashboardStore>) -> Self {
        let debug_mode = std::env::var("POMODASH_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            state: Arc::new(Mutex::new(TimerState::new())),
            store,
            app_handle,
            ticker: Arc::new(Mutex::new(None)),
            tick_interval: Duration::from_secs(1),
            heartbeat_every_ticks: if debug_mode { 1 } else { 10 },
        }
    }

    pub async fn get_state(&self) -> TimerState {
        let mut guard = self.state.lock().await;
        guard.sync_active_from_anchor();
        guard.clone()
    }

    pub async fn get_snapshot(&self) -> TimerSnapshot {
        let mut guard = self.state.lock().await;
        guard.sync_active_from_anchor();
        TimerSnapshot {
            remaining_ms: guard.remaining_ms(),
            state: guard.clone(),
        }
    }

    /// Start a countdown. A session already in flight is cancelled and
    /// replaced; there is only ever one active interval.
    pub async fn start_timer(
        &self,
        target_ms: u64,
        mode: Option<TimerMode>,
        task_id: Option<String>,
    ) -> Result<TimerState> {
        let mode = mode.unwrap_or(TimerMode::Focus);
        if target_ms == 0 {
            return Err(anyhow!("target_ms must be greater than zero"));
        }

        let started_at = Utc::now();

        {
            let mut state = self.state.lock().await;
            state.begin_session(task_id, target_ms, mode, started_at, Instant::now());
        }

        self.store.toggle_timer(true)?;
        self.spawn_ticker().await;

        // Reset the anchor right before emitting, to avoid accumulated time
        // from the setup above.
        {
            let mut state = self.state.lock().await;
            state.running_anchor = Some(Instant::now());
            state.active_ms_baseline = 0;
            state.active_ms = 0;
        }

        self.emit_state_changed().await;

        Ok(self.get_state().await)
    }

    /// End the running session early. Emits `timer-finished` like a natural
    /// completion; the elapsed portion is reported in `active_ms`.
    pub async fn end_timer(&self) -> Result<TimerSnapshot> {
        let snapshot = {
            let mut state = self.state.lock().await;
            if state.status == TimerStatus::Idle {
                return Err(anyhow!("no active session to end"));
            }

            state.sync_active_from_anchor();
            let snapshot = TimerSnapshot {
                remaining_ms: state.remaining_ms(),
                state: state.clone(),
            };
            state.cancel();
            snapshot
        };

        self.cancel_ticker().await;
        self.store.toggle_timer(false)?;
        self.emit_state_changed().await;

        let payload = TimerFinishedEvent {
            task_id: snapshot.state.task_id.clone(),
            mode: snapshot.state.mode,
            active_ms: snapshot.state.active_ms,
        };
        let _ = self.app_handle.emit("timer-finished", payload);

        Ok(snapshot)
    }

    /// Abandon the running session. No completion event; idempotent when
    /// nothing is running.
    pub async fn cancel_timer(&self) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            if state.status == TimerStatus::Idle {
                return Ok(());
            }
            state.cancel();
        }

        self.cancel_ticker().await;
        self.store.toggle_timer(false)?;
        self.emit_state_changed().await;
        Ok(())
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let state = self.state.clone();
        let store = self.store.clone();
        let app_handle = self.app_handle.clone();
        let tick_interval = self.tick_interval;
        let heartbeat_every = self.heartbeat_every_ticks;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(tick_interval);
            let mut ticks: u32 = 0;
            loop {
                interval.tick().await;

                let (snapshot, remaining) = {
                    let mut guard = state.lock().await;
                    if guard.status != TimerStatus::Running {
                        break;
                    }
                    guard.sync_active_from_anchor();
                    let remaining = guard.remaining_ms();
                    (guard.clone(), remaining)
                };

                if remaining <= 0 {
                    let final_snapshot = {
                        let mut guard = state.lock().await;
                        guard.sync_active_from_anchor();
                        guard.stop();
                        guard.active_ms = guard.active_ms.min(guard.target_ms);
                        guard.clone()
                    };

                    if let Err(err) = store.toggle_timer(false) {
                        error!("Failed to mark timer inactive: {err}");
                    }

                    emit_timer_state(&app_handle, final_snapshot.clone());
                    let payload = TimerFinishedEvent {
                        task_id: final_snapshot.task_id.clone(),
                        mode: final_snapshot.mode,
                        active_ms: final_snapshot.active_ms,
                    };
                    let _ = app_handle.emit("timer-finished", payload);

                    break;
                }

                ticks = ticks.wrapping_add(1);

                if ticks % heartbeat_every == 0 {
                    let payload = TimerHeartbeatEvent {
                        active_ms: snapshot.active_ms,
                        remaining_ms: snapshot.remaining_ms(),
                        state: snapshot.clone(),
                    };
                    let _ = app_handle.emit("timer-heartbeat", payload);
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }

    async fn emit_state_changed(&self) {
        let mut guard = self.state.lock().await;
        guard.sync_active_from_anchor();
        emit_timer_state(&self.app_handle, guard.clone());
    }
}

fn emit_timer_state(app_handle: &AppHandle, state: TimerState) {
    let payload = TimerStateChangedEvent {
        remaining_ms: state.remaining_ms(),
        state,
    };

    let _ = app_handle.emit("timer-state-changed", payload);
}
