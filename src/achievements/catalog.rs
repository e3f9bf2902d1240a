use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stats::UserStats;

/// Unlock rule over the stats aggregate. Conditions are plain data plus one
/// interpreter so the catalog stays serializable and testable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Condition {
    TotalStudyTimeAtLeast(u64),
    TasksCompletedAtLeast(u64),
    BestFocusScoreAtLeast(u32),
    XpAtLeast(u64),
    StudyStreakAtLeast(u32),
    AverageEfficiencyAtLeast(u32),
    NightOwlSessionsAtLeast(u64),
    LongestTaskAtLeast(u64),
    DeepWorkSessionsAtLeast(u64),
    WeeklyAverageEfficiencyAtLeast(f64),
    TotalPomodoroSessionsAtLeast(u64),
    /// Catalog entries whose tracking data does not exist yet.
    Unimplemented,
}

impl Condition {
    /// Whether the rule holds for `stats`. `Unimplemented` is an error so the
    /// evaluator can log and skip it like any other failing condition.
    pub fn evaluate(&self, stats: &UserStats) -> Result<bool> {
        Ok(match *self {
            Condition::TotalStudyTimeAtLeast(min) => stats.total_study_time >= min,
            Condition::TasksCompletedAtLeast(min) => stats.tasks_completed >= min,
            Condition::BestFocusScoreAtLeast(min) => stats.best_focus_score >= min,
            Condition::XpAtLeast(min) => stats.xp >= min,
            Condition::StudyStreakAtLeast(min) => stats.study_streak >= min,
            Condition::AverageEfficiencyAtLeast(min) => stats.average_efficiency >= min,
            Condition::NightOwlSessionsAtLeast(min) => stats.night_owl_sessions >= min,
            Condition::LongestTaskAtLeast(min) => stats.longest_task >= min,
            Condition::DeepWorkSessionsAtLeast(min) => stats.deep_work_sessions >= min,
            Condition::WeeklyAverageEfficiencyAtLeast(min) => {
                stats.weekly_average_efficiency >= min
            }
            Condition::TotalPomodoroSessionsAtLeast(min) => {
                stats.total_pomodoro_sessions >= min
            }
            Condition::Unimplemented => bail!("condition is not implemented yet"),
        })
    }

    /// Progress toward the threshold as a ratio in `[0, 1]`, for display only.
    pub fn progress(&self, stats: &UserStats) -> f64 {
        let ratio = match *self {
            Condition::TotalStudyTimeAtLeast(min) => {
                stats.total_study_time as f64 / min as f64
            }
            Condition::TasksCompletedAtLeast(min) => stats.tasks_completed as f64 / min as f64,
            Condition::BestFocusScoreAtLeast(min) => {
                f64::from(stats.best_focus_score) / f64::from(min)
            }
            Condition::XpAtLeast(min) => stats.xp as f64 / min as f64,
            Condition::StudyStreakAtLeast(min) => {
                f64::from(stats.study_streak) / f64::from(min)
            }
            Condition::AverageEfficiencyAtLeast(min) => {
                f64::from(stats.average_efficiency) / f64::from(min)
            }
            Condition::NightOwlSessionsAtLeast(min) => {
                stats.night_owl_sessions as f64 / min as f64
            }
            Condition::LongestTaskAtLeast(min) => stats.longest_task as f64 / min as f64,
            Condition::DeepWorkSessionsAtLeast(min) => {
                stats.deep_work_sessions as f64 / min as f64
            }
            Condition::WeeklyAverageEfficiencyAtLeast(min) => {
                stats.weekly_average_efficiency / min
            }
            Condition::TotalPomodoroSessionsAtLeast(min) => {
                stats.total_pomodoro_sessions as f64 / min as f64
            }
            Condition::Unimplemented => 0.0,
        };
        ratio.min(1.0)
    }
}

/// One catalog entry. The definition fields are fixed at build time;
/// `unlocked_at` is the only runtime state and is set exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub description: String,
    pub points: u64,
    pub condition: Condition,
    pub tracks_progress: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl Achievement {
    pub fn is_unlocked(&self) -> bool {
        self.unlocked_at.is_some()
    }

    /// Display-only progress ratio; `None` for entries that don't show one.
    pub fn progress(&self, stats: &UserStats) -> Option<f64> {
        self.tracks_progress.then(|| self.condition.progress(stats))
    }
}

fn entry(
    id: &str,
    name: &str,
    description: &str,
    points: u64,
    condition: Condition,
    tracks_progress: bool,
) -> Achievement {
    Achievement {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        points,
        condition,
        tracks_progress,
        unlocked_at: None,
    }
}

/// The fixed achievement catalog, all locked.
///
/// Two quirks are carried over from the product data on purpose: the id
/// `efficiency_master` appears twice with different thresholds, and the
/// "Night Owl" entry still has the id `level_up`. Unlock state is tracked
/// positionally, so both `efficiency_master` entries unlock independently;
/// only by-id UI lookups are affected.
pub fn catalog() -> Vec<Achievement> {
    vec![
        entry(
            "first_pomodoro",
            "First Pomodoro",
            "Complete your very first 25-minute session.",
            10,
            Condition::TotalStudyTimeAtLeast(25),
            false,
        ),
        entry(
            "pomodoro_rookie",
            "Pomodoro Rookie",
            "Complete 5 study sessions.",
            20,
            Condition::TasksCompletedAtLeast(5),
            true,
        ),
        entry(
            "pomodoro_pro",
            "Pomodoro Pro",
            "Complete 10 study sessions.",
            30,
            Condition::TasksCompletedAtLeast(10),
            true,
        ),
        entry(
            "focus_guru",
            "Focus Guru",
            "Achieve a focus score of 90% or higher.",
            25,
            Condition::BestFocusScoreAtLeast(90),
            true,
        ),
        entry(
            "xp_collector",
            "XP Collector",
            "Earn 500 XP points.",
            40,
            Condition::XpAtLeast(500),
            true,
        ),
        entry(
            "consistency_champion",
            "Consistency Champion",
            "Maintain a study streak for 7 consecutive days.",
            50,
            Condition::StudyStreakAtLeast(7),
            true,
        ),
        entry(
            "efficiency_master",
            "Efficiency Master",
            "Maintain an average efficiency of 85% or higher.",
            35,
            Condition::AverageEfficiencyAtLeast(85),
            true,
        ),
        entry(
            "level_up",
            "Night Owl",
            "Complete 5 Pomodoro sessions between 11 PM and 5 AM in one day.",
            20,
            Condition::NightOwlSessionsAtLeast(5),
            true,
        ),
        entry(
            "task_tamer",
            "Task Tamer",
            "Finish a task that requires 4 or more Pomodoros.",
            30,
            Condition::LongestTaskAtLeast(4),
            true,
        ),
        entry(
            "deep_work",
            "Deep Work",
            "Complete a session with 100% focus for the full 25 minutes.",
            40,
            Condition::DeepWorkSessionsAtLeast(1),
            false,
        ),
        entry(
            "efficiency_master",
            "Efficiency Master",
            "Maintain an average session efficiency of 95% or higher over an entire week.",
            50,
            Condition::WeeklyAverageEfficiencyAtLeast(95.0),
            true,
        ),
        entry(
            "marathoner",
            "Marathoner",
            "Accumulate 100 hours of focused work (tracked over sessions).",
            100,
            Condition::TotalStudyTimeAtLeast(100 * 60),
            true,
        ),
        entry(
            "productivity_legend",
            "Productivity Legend",
            "Reach 1,000 total Pomodoro sessions.",
            200,
            Condition::TotalPomodoroSessionsAtLeast(1000),
            true,
        ),
        entry(
            "achievement_collector",
            "Achievement Collector",
            "Unlock every achievement available in a single month.",
            300,
            Condition::Unimplemented,
            false,
        ),
        entry(
            "pomodoro_champion",
            "Pomodoro Champion",
            "Earn the highest monthly productivity score in a peer challenge.",
            250,
            Condition::Unimplemented,
            false,
        ),
    ]
}
