use tauri::State;

use crate::{ai::prompts, AppState};

#[tauri::command]
pub async fn ask_tutor(state: State<'_, AppState>, message: String) -> Result<String, String> {
    state
        .tutor
        .send_prompt(&message)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn explain_concept(
    state: State<'_, AppState>,
    subject: String,
    concept: String,
) -> Result<String, String> {
    let prompt = prompts::explain_concept(&subject, &concept);
    state
        .tutor
        .send_prompt(&prompt)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn analyze_performance(
    state: State<'_, AppState>,
    task_id: String,
) -> Result<String, String> {
    let task = state
        .store
        .task(&task_id)
        .ok_or_else(|| format!("task {task_id} not found"))?;
    let stats = state.store.stats();

    let prompt = prompts::analyze_performance(&task, &stats);
    state
        .tutor
        .send_prompt(&prompt)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn suggest_break_activity(
    state: State<'_, AppState>,
    break_minutes: u32,
    focus_score: u32,
) -> Result<String, String> {
    let prompt = prompts::suggest_break_activity(break_minutes, focus_score);
    state
        .tutor
        .send_prompt(&prompt)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn generate_study_plan(
    state: State<'_, AppState>,
    subject: String,
    target_minutes: u32,
) -> Result<String, String> {
    let stats = state.store.stats();
    let prompt = prompts::generate_study_plan(&subject, target_minutes, &stats);
    state
        .tutor
        .send_prompt(&prompt)
        .await
        .map_err(|e| e.to_string())
}
