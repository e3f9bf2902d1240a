use serde::Serialize;
use tauri::{AppHandle, Emitter, State};

use crate::{
    achievements::Achievement,
    models::{NewTask, Task, TaskPatch},
    settings::{SettingsPatch, UserSettings},
    stats::UserStats,
    store::{DashboardState, SessionOutcome},
    AppState,
};

#[derive(Serialize, Clone)]
struct AchievementUnlockedEvent {
    achievement: Achievement,
}

#[derive(Serialize, Clone)]
struct StatsUpdatedEvent {
    stats: UserStats,
}

fn emit_session_events(app_handle: &AppHandle, outcome: &SessionOutcome) {
    for achievement in &outcome.unlocked {
        let _ = app_handle.emit(
            "achievement-unlocked",
            AchievementUnlockedEvent {
                achievement: achievement.clone(),
            },
        );
    }
    let _ = app_handle.emit(
        "stats-updated",
        StatsUpdatedEvent {
            stats: outcome.stats.clone(),
        },
    );
}

#[tauri::command]
pub fn get_dashboard(state: State<AppState>) -> Result<DashboardState, String> {
    Ok(state.store.snapshot())
}

#[tauri::command]
pub fn get_tasks(state: State<AppState>) -> Result<Vec<Task>, String> {
    Ok(state.store.tasks())
}

#[tauri::command]
pub fn get_stats(state: State<AppState>) -> Result<UserStats, String> {
    Ok(state.store.stats())
}

/// Catalog entry plus its live progress ratio, for display.
#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AchievementView {
    #[serde(flatten)]
    achievement: Achievement,
    progress: Option<f64>,
}

#[tauri::command]
pub fn get_achievements(state: State<AppState>) -> Result<Vec<AchievementView>, String> {
    let stats = state.store.stats();
    Ok(state
        .store
        .achievements()
        .into_iter()
        .map(|achievement| AchievementView {
            progress: achievement.progress(&stats),
            achievement,
        })
        .collect())
}

#[tauri::command]
pub fn check_achievements(state: State<AppState>, app_handle: AppHandle) -> Result<u64, String> {
    let outcome = state.store.check_achievements().map_err(|e| e.to_string())?;

    for achievement in &outcome.unlocked {
        let _ = app_handle.emit(
            "achievement-unlocked",
            AchievementUnlockedEvent {
                achievement: achievement.clone(),
            },
        );
    }
    if outcome.xp_awarded > 0 {
        let _ = app_handle.emit(
            "stats-updated",
            StatsUpdatedEvent {
                stats: state.store.stats(),
            },
        );
    }

    Ok(outcome.xp_awarded)
}

#[tauri::command]
pub fn get_settings(state: State<AppState>) -> Result<UserSettings, String> {
    Ok(state.store.settings())
}

#[tauri::command]
pub fn add_task(state: State<AppState>, task: NewTask) -> Result<Task, String> {
    state.store.add_task(task).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn update_task(
    state: State<AppState>,
    task_id: String,
    patch: TaskPatch,
) -> Result<(), String> {
    state
        .store
        .update_task(&task_id, patch)
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn delete_task(state: State<AppState>, task_id: String) -> Result<(), String> {
    state.store.delete_task(&task_id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn set_current_task(state: State<AppState>, task_id: Option<String>) -> Result<(), String> {
    state
        .store
        .set_current_task(task_id)
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn complete_task(
    state: State<AppState>,
    app_handle: AppHandle,
    task_id: String,
    focus_score: u32,
) -> Result<Option<UserStats>, String> {
    let outcome = state
        .store
        .complete_task(&task_id, focus_score)
        .map_err(|e| e.to_string())?;

    Ok(outcome.map(|outcome| {
        emit_session_events(&app_handle, &outcome);
        outcome.stats
    }))
}

#[tauri::command]
pub fn record_session(
    state: State<AppState>,
    app_handle: AppHandle,
    duration: u32,
    focus_score: u32,
) -> Result<UserStats, String> {
    let outcome = state
        .store
        .record_session(duration, focus_score)
        .map_err(|e| e.to_string())?;

    emit_session_events(&app_handle, &outcome);
    Ok(outcome.stats)
}

#[tauri::command]
pub fn update_settings(
    state: State<AppState>,
    patch: SettingsPatch,
) -> Result<UserSettings, String> {
    state
        .store
        .update_settings(patch)
        .map_err(|e| e.to_string())
}
