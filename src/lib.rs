pub mod achievements;
pub mod ai;
pub mod models;
pub mod settings;
pub mod stats;
pub mod store;
pub mod timer;

use std::sync::Arc;

use ai::TutorClient;
use log::warn;
use store::DashboardStore;
use tauri::Manager;
use timer::TimerController;

use ai::commands::{
    analyze_performance, ask_tutor, explain_concept, generate_study_plan, suggest_break_activity,
};
use store::commands::{
    add_task, check_achievements, complete_task, delete_task, get_achievements, get_dashboard,
    get_settings, get_stats, get_tasks, record_session, set_current_task, update_settings,
    update_task,
};
use timer::commands::{cancel_timer, end_timer, get_timer_state, start_timer};

pub struct AppState {
    pub store: Arc<DashboardStore>,
    pub timer: TimerController,
    pub tutor: TutorClient,
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Pomodash starting up...");

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let result = (|| -> anyhow::Result<()> {
                let app_data_dir = app
                    .path()
                    .app_data_dir()
                    .map_err(|err| anyhow::anyhow!(err))?;
                std::fs::create_dir_all(&app_data_dir)?;

                let store = Arc::new(DashboardStore::new(app_data_dir.join("dashboard.json"))?);

                // A timer flag left set by a crash would wedge the UI in
                // "session running" with no ticker behind it.
                if store.is_timer_active() {
                    warn!("Recovered dashboard with a stale active-timer flag; resetting");
                    store.toggle_timer(false)?;
                }

                let timer_controller = TimerController::new(app.handle().clone(), store.clone());
                let tutor = TutorClient::from_env()?;

                app.manage(AppState {
                    store,
                    timer: timer_controller,
                    tutor,
                });

                Ok(())
            })();

            result.map_err(|err| err.into())
        })
        .invoke_handler(tauri::generate_handler![
            get_dashboard,
            get_tasks,
            get_stats,
            get_achievements,
            get_settings,
            add_task,
            update_task,
            delete_task,
            set_current_task,
            complete_task,
            record_session,
            check_achievements,
            update_settings,
            get_timer_state,
            start_timer,
            end_timer,
            cancel_timer,
            ask_tutor,
            explain_concept,
            analyze_performance,
            suggest_break_activity,
            generate_study_plan,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
