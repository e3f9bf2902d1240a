use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Aggregate gamification metrics for one user. A single instance lives in
/// the dashboard store; only the reducer in this module produces new values.
///
/// Percentage fields (`focus_score`, `average_efficiency`,
/// `weekly_average_efficiency`, `best_focus_score`) stay within `[0, 100]`.
/// `weekly_study_time` is minutes per weekday, Sunday = 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserStats {
    pub level: u32,
    pub xp: u64,
    /// Rolling average of session focus scores.
    pub focus_score: u32,
    /// Consecutive calendar days with at least one completed session.
    pub study_streak: u32,
    pub last_study_date: Option<NaiveDate>,
    /// Total focused minutes.
    pub total_study_time: u64,
    pub tasks_completed: u64,
    pub average_efficiency: u32,
    pub total_breaks: u64,
    pub best_focus_score: u32,
    pub weekly_study_time: [u64; 7],
    pub total_pomodoro_sessions: u64,
    pub daily_pomodoro_sessions: u64,
    /// Fixed-window exponential smoothing, not a true 7-sample mean.
    pub weekly_average_efficiency: f64,
    pub early_bird_sessions: u64,
    pub night_owl_sessions: u64,
    pub deep_work_sessions: u64,
    /// Longest planned duration, in minutes, seen for an in-progress task.
    pub longest_task: u64,
}

impl Default for UserStats {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            focus_score: 0,
            study_streak: 0,
            last_study_date: None,
            total_study_time: 0,
            tasks_completed: 0,
            average_efficiency: 0,
            total_breaks: 0,
            best_focus_score: 0,
            weekly_study_time: [0; 7],
            total_pomodoro_sessions: 0,
            daily_pomodoro_sessions: 0,
            weekly_average_efficiency: 0.0,
            early_bird_sessions: 0,
            night_owl_sessions: 0,
            deep_work_sessions: 0,
            longest_task: 0,
        }
    }
}

/// XP-to-level mapping: 1000 XP per level, starting at level 1.
pub fn level_for_xp(xp: u64) -> u32 {
    (xp / 1000) as u32 + 1
}
