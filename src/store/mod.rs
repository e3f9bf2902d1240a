pub mod commands;

use std::{fs, path::PathBuf, sync::RwLock};

use anyhow::{bail, Context, Result};
use chrono::{Local, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    achievements::{self, check_achievements, Achievement, UnlockOutcome},
    models::{NewTask, Task, TaskPatch},
    settings::{SettingsPatch, UserSettings},
    stats::{level_for_xp, update_stats, SessionEvent, UserStats},
};

/// Everything the dashboard remembers, serialized wholesale to one JSON
/// file after every action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardState {
    pub tasks: Vec<Task>,
    pub stats: UserStats,
    pub current_task: Option<Task>,
    pub is_timer_active: bool,
    pub settings: UserSettings,
    pub achievements: Vec<Achievement>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            stats: UserStats::default(),
            current_task: None,
            is_timer_active: false,
            settings: UserSettings::default(),
            achievements: achievements::catalog(),
        }
    }
}

/// What one completed session changed: the new stats snapshot plus any
/// achievement unlocks, for the command layer to turn into events.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutcome {
    pub stats: UserStats,
    pub xp_awarded: u64,
    pub unlocked: Vec<Achievement>,
}

/// Single mutable state container behind the UI. Owns the task collection,
/// the stats aggregate, achievement state and user settings; every action
/// method mutates under the write lock and persists before returning.
pub struct DashboardStore {
    path: PathBuf,
    data: RwLock<DashboardState>,
}

impl DashboardStore {
    /// Load the snapshot at `path`, falling back to a default state when the
    /// file is missing or unreadable. Never fatal.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read dashboard state from {}", path.display()))?;
            match serde_json::from_str::<DashboardState>(&contents) {
                Ok(state) => reconcile_achievements(state),
                Err(err) => {
                    warn!("Discarding unreadable dashboard snapshot: {err}");
                    DashboardState::default()
                }
            }
        } else {
            DashboardState::default()
        };

        info!(
            "Dashboard store loaded: {} tasks, level {}",
            data.tasks.len(),
            data.stats.level
        );

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    fn persist(&self, data: &DashboardState) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write dashboard state to {}", self.path.display()))
    }

    pub fn snapshot(&self) -> DashboardState {
        self.data.read().unwrap().clone()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.data.read().unwrap().tasks.clone()
    }

    pub fn task(&self, task_id: &str) -> Option<Task> {
        self.data
            .read()
            .unwrap()
            .tasks
            .iter()
            .find(|t| t.id == task_id)
            .cloned()
    }

    pub fn stats(&self) -> UserStats {
        self.data.read().unwrap().stats.clone()
    }

    pub fn achievements(&self) -> Vec<Achievement> {
        self.data.read().unwrap().achievements.clone()
    }

    pub fn settings(&self) -> UserSettings {
        self.data.read().unwrap().settings.clone()
    }

    pub fn current_task(&self) -> Option<Task> {
        self.data.read().unwrap().current_task.clone()
    }

    pub fn is_timer_active(&self) -> bool {
        self.data.read().unwrap().is_timer_active
    }

    /// Create a task from user input. Title and duration are validated before
    /// anything is mutated.
    pub fn add_task(&self, new_task: NewTask) -> Result<Task> {
        let title = new_task.title.trim();
        if title.is_empty() {
            bail!("task title must not be empty");
        }
        if new_task.duration == 0 {
            bail!("task duration must be at least one minute");
        }

        let task = Task {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            duration: new_task.duration,
            category: new_task.category,
            notes: new_task.notes,
            completed: false,
            created_at: Utc::now(),
            completed_at: None,
            actual_duration: None,
            efficiency: None,
            focus_score: None,
        };

        let mut guard = self.data.write().unwrap();
        guard.tasks.push(task.clone());
        self.persist(&guard)?;
        Ok(task)
    }

    /// Merge `patch` into an existing task. Unknown ids are ignored.
    pub fn update_task(&self, task_id: &str, patch: TaskPatch) -> Result<()> {
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                bail!("task title must not be empty");
            }
        }
        if patch.duration == Some(0) {
            bail!("task duration must be at least one minute");
        }

        let mut guard = self.data.write().unwrap();
        let Some(task) = guard.tasks.iter_mut().find(|t| t.id == task_id) else {
            return Ok(());
        };

        if let Some(title) = patch.title {
            task.title = title.trim().to_string();
        }
        if let Some(duration) = patch.duration {
            task.duration = duration;
        }
        if let Some(category) = patch.category {
            task.category = Some(category);
        }
        if let Some(notes) = patch.notes {
            task.notes = Some(notes);
        }
        if let Some(completed) = patch.completed {
            task.completed = completed;
        }

        self.persist(&guard)?;
        Ok(())
    }

    /// Remove a task. Removing an unknown id changes nothing.
    pub fn delete_task(&self, task_id: &str) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        let before = guard.tasks.len();
        guard.tasks.retain(|t| t.id != task_id);
        if guard.tasks.len() == before {
            return Ok(());
        }
        self.persist(&guard)?;
        Ok(())
    }

    /// Point the dashboard at the task the user is about to work on. A
    /// missing id clears the selection.
    pub fn set_current_task(&self, task_id: Option<String>) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        let state = &mut *guard;
        let selected = task_id.and_then(|id| state.tasks.iter().find(|t| t.id == id).cloned());
        state.current_task = selected;
        self.persist(&guard)?;
        Ok(())
    }

    pub fn toggle_timer(&self, active: bool) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        guard.is_timer_active = active;
        self.persist(&guard)?;
        Ok(())
    }

    pub fn update_settings(&self, patch: SettingsPatch) -> Result<UserSettings> {
        let mut guard = self.data.write().unwrap();
        guard.settings.apply(patch);
        self.persist(&guard)?;
        Ok(guard.settings.clone())
    }

    /// Mark a task completed and fold the session into the stats. Returns
    /// `Ok(None)` without mutating anything when the id is unknown; the UI
    /// may race a delete and that is not an error.
    pub fn complete_task(&self, task_id: &str, focus_score: u32) -> Result<Option<SessionOutcome>> {
        validate_focus_score(focus_score)?;

        let mut guard = self.data.write().unwrap();
        let Some(task) = guard.tasks.iter_mut().find(|t| t.id == task_id) else {
            return Ok(None);
        };

        task.completed = true;
        task.completed_at = Some(Utc::now());
        task.efficiency = Some(focus_score);
        // True elapsed time is not captured; planned and actual are equal.
        task.actual_duration = Some(task.duration);
        let duration = task.duration;

        guard.current_task = None;
        let outcome = apply_session(&mut guard, duration, focus_score);

        self.persist(&guard)?;
        Ok(Some(outcome))
    }

    /// Re-run the achievement pass against the current stats. The completion
    /// paths already do this; the UI can also trigger it directly, and a
    /// repeat call with unchanged stats unlocks nothing.
    pub fn check_achievements(&self) -> Result<UnlockOutcome> {
        let mut guard = self.data.write().unwrap();
        let state = &mut *guard;
        let outcome = check_achievements(&state.stats, &mut state.achievements, Utc::now());
        if outcome.xp_awarded > 0 {
            state.stats.xp += outcome.xp_awarded;
            state.stats.level = level_for_xp(state.stats.xp);
        }
        self.persist(&guard)?;
        Ok(outcome)
    }

    /// Feed a session straight into the reducer without touching the task
    /// collection (timer-driven sessions with no task attached).
    pub fn record_session(&self, duration: u32, focus_score: u32) -> Result<SessionOutcome> {
        if duration == 0 {
            bail!("session duration must be at least one minute");
        }
        validate_focus_score(focus_score)?;

        let mut guard = self.data.write().unwrap();
        let outcome = apply_session(&mut guard, duration, focus_score);
        self.persist(&guard)?;
        Ok(outcome)
    }
}

fn validate_focus_score(focus_score: u32) -> Result<()> {
    if focus_score > 100 {
        bail!("focus score must be between 0 and 100");
    }
    Ok(())
}

/// Run the reducer, evaluate achievements against the new snapshot and fold
/// any bonus XP back in as a second pass, keeping level consistent with XP.
fn apply_session(state: &mut DashboardState, duration: u32, focus_score: u32) -> SessionOutcome {
    let event = SessionEvent {
        duration,
        focus_score,
        current_task_duration: state.current_task.as_ref().map(|t| t.duration).unwrap_or(0),
    };

    let mut stats = update_stats(&state.stats, &event, Local::now().naive_local());

    let UnlockOutcome {
        xp_awarded,
        unlocked,
    } = check_achievements(&stats, &mut state.achievements, Utc::now());
    if xp_awarded > 0 {
        stats.xp += xp_awarded;
        stats.level = level_for_xp(stats.xp);
    }

    state.stats = stats.clone();
    SessionOutcome {
        stats,
        xp_awarded,
        unlocked,
    }
}

/// A persisted achievements list that no longer lines up with the built-in
/// catalog (an app update changed the entry set) is replaced wholesale;
/// unlock state is tracked positionally, so a partial merge would misattribute
/// timestamps.
fn reconcile_achievements(mut state: DashboardState) -> DashboardState {
    let expected = achievements::catalog();
    if state.achievements.len() != expected.len() {
        warn!(
            "Achievement list out of sync with catalog ({} vs {}); resetting unlock state",
            state.achievements.len(),
            expected.len()
        );
        state.achievements = expected;
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> DashboardStore {
        let dir = std::env::temp_dir().join(format!("pomodash-test-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        DashboardStore::new(dir.join("dashboard.json")).unwrap()
    }

    fn quick_task(store: &DashboardStore, title: &str, duration: u32) -> Task {
        store
            .add_task(NewTask {
                title: title.to_string(),
                duration,
                category: None,
                notes: None,
            })
            .unwrap()
    }

    #[test]
    fn add_task_rejects_invalid_input_before_mutation() {
        let store = temp_store();

        assert!(store
            .add_task(NewTask {
                title: "   ".to_string(),
                duration: 25,
                category: None,
                notes: None,
            })
            .is_err());
        assert!(store
            .add_task(NewTask {
                title: "Read chapter 4".to_string(),
                duration: 0,
                category: None,
                notes: None,
            })
            .is_err());
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn completing_the_first_pomodoro_awards_session_and_achievement_xp() {
        let store = temp_store();
        let task = quick_task(&store, "Read chapter 4", 25);

        let outcome = store.complete_task(&task.id, 100).unwrap().unwrap();

        // 25 XP for the session; a perfect first session also unlocks
        // First Pomodoro (+10), Focus Guru (+25), Efficiency Master (+35)
        // and Deep Work (+40) in the same pass.
        assert_eq!(outcome.xp_awarded, 110);
        assert_eq!(outcome.stats.xp, 135);
        assert_eq!(outcome.stats.level, 1);
        assert_eq!(outcome.stats.tasks_completed, 1);
        assert_eq!(outcome.stats.average_efficiency, 100);
        assert_eq!(outcome.stats.deep_work_sessions, 1);
        assert_eq!(outcome.unlocked.len(), 4);
        assert!(outcome.unlocked.iter().any(|a| a.id == "first_pomodoro"));

        let completed = store.task(&task.id).unwrap();
        assert!(completed.completed);
        assert_eq!(completed.efficiency, Some(100));
        assert_eq!(completed.actual_duration, Some(25));
        assert!(completed.completed_at.is_some());
    }

    #[test]
    fn completing_an_unknown_task_is_a_silent_no_op() {
        let store = temp_store();
        quick_task(&store, "Real task", 25);

        let outcome = store.complete_task("no-such-id", 80).unwrap();
        assert!(outcome.is_none());
        assert_eq!(store.stats().tasks_completed, 0);
    }

    #[test]
    fn rookie_unlocks_exactly_on_the_fifth_completion() {
        let store = temp_store();

        for i in 0..5 {
            let task = quick_task(&store, &format!("Task {i}"), 25);
            let outcome = store.complete_task(&task.id, 100).unwrap().unwrap();
            let got_rookie = outcome.unlocked.iter().any(|a| a.id == "pomodoro_rookie");
            assert_eq!(got_rookie, i == 4, "completion {}", i + 1);
        }
    }

    #[test]
    fn delete_task_on_unknown_id_changes_nothing() {
        let store = temp_store();
        quick_task(&store, "Keep me", 25);

        store.delete_task("no-such-id").unwrap();
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn update_task_merges_only_provided_fields() {
        let store = temp_store();
        let task = quick_task(&store, "Draft essay", 50);

        store
            .update_task(
                &task.id,
                TaskPatch {
                    duration: Some(40),
                    notes: Some("outline first".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let updated = store.task(&task.id).unwrap();
        assert_eq!(updated.title, "Draft essay");
        assert_eq!(updated.duration, 40);
        assert_eq!(updated.notes.as_deref(), Some("outline first"));

        // Unknown id: no error, no change.
        store
            .update_task("no-such-id", TaskPatch::default())
            .unwrap();
    }

    #[test]
    fn current_task_feeds_longest_task_through_record_session() {
        let store = temp_store();
        let task = quick_task(&store, "Deep dive", 120);
        store.set_current_task(Some(task.id.clone())).unwrap();

        let outcome = store.record_session(25, 80).unwrap();
        assert_eq!(outcome.stats.longest_task, 120);

        // complete_task clears the selection before the reducer runs, so the
        // completed task itself does not extend longest_task.
        let other = quick_task(&store, "Short", 25);
        store.set_current_task(Some(other.id.clone())).unwrap();
        let outcome = store.complete_task(&other.id, 80).unwrap().unwrap();
        assert_eq!(outcome.stats.longest_task, 120);
        assert!(store.current_task().is_none());
    }

    #[test]
    fn focus_score_above_range_is_rejected() {
        let store = temp_store();
        let task = quick_task(&store, "Task", 25);

        assert!(store.complete_task(&task.id, 101).is_err());
        assert!(!store.task(&task.id).unwrap().completed);
    }

    #[test]
    fn snapshot_survives_a_reload() {
        let dir = std::env::temp_dir().join(format!("pomodash-test-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("dashboard.json");

        {
            let store = DashboardStore::new(path.clone()).unwrap();
            let task = store
                .add_task(NewTask {
                    title: "Persisted".to_string(),
                    duration: 25,
                    category: Some("math".to_string()),
                    notes: None,
                })
                .unwrap();
            store.complete_task(&task.id, 90).unwrap();
        }

        let reloaded = DashboardStore::new(path).unwrap();
        assert_eq!(reloaded.tasks().len(), 1);
        assert_eq!(reloaded.stats().tasks_completed, 1);
        assert!(reloaded
            .achievements()
            .iter()
            .any(|a| a.id == "first_pomodoro" && a.is_unlocked()));
    }

    #[test]
    fn corrupt_snapshot_degrades_to_defaults() {
        let dir = std::env::temp_dir().join(format!("pomodash-test-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("dashboard.json");
        fs::write(&path, "{ not json").unwrap();

        let store = DashboardStore::new(path).unwrap();
        assert!(store.tasks().is_empty());
        assert_eq!(store.stats().level, 1);
        assert_eq!(store.achievements().len(), 15);
    }

    #[test]
    fn manual_achievement_check_is_idempotent() {
        let store = temp_store();
        let task = quick_task(&store, "Task", 25);
        store.complete_task(&task.id, 100).unwrap();
        let xp_before = store.stats().xp;

        let outcome = store.check_achievements().unwrap();
        assert!(outcome.unlocked.is_empty());
        assert_eq!(outcome.xp_awarded, 0);
        assert_eq!(store.stats().xp, xp_before);
    }

    #[test]
    fn toggle_timer_round_trips() {
        let store = temp_store();
        store.toggle_timer(true).unwrap();
        assert!(store.is_timer_active());
        store.toggle_timer(false).unwrap();
        assert!(!store.is_timer_active());
    }
}
