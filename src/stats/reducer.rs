use chrono::{Datelike, NaiveDateTime, Timelike};

use super::types::{level_for_xp, UserStats};

/// A completed focus session, as reported by the facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    /// Planned minutes of the completed task.
    pub duration: u32,
    /// Session quality rating, 0-100.
    pub focus_score: u32,
    /// Planned minutes of the task in progress when the reducer runs,
    /// 0 when there is none.
    pub current_task_duration: u32,
}

const EARLY_BIRD_START_HOUR: u32 = 5;
const EARLY_BIRD_END_HOUR: u32 = 9;
const NIGHT_OWL_START_HOUR: u32 = 23;
const NIGHT_OWL_END_HOUR: u32 = 5;

/// Minutes of focused work that earn one break.
const MINUTES_PER_BREAK: u64 = 25;

/// Fold one completed session into the stats aggregate.
///
/// Pure: reads `stats` as a simultaneous snapshot, never mutates it, and
/// takes the wall clock as an argument. `now` is local wall time; only its
/// calendar date, weekday and hour matter.
///
/// Streak counting is deliberately literal: a completion on the same
/// calendar day as the previous one still extends the streak, and
/// `daily_pomodoro_sessions` is never reset at a day boundary.
pub fn update_stats(stats: &UserStats, event: &SessionEvent, now: NaiveDateTime) -> UserStats {
    let duration = u64::from(event.duration);
    let focus_score = event.focus_score.min(100);
    // Efficiency mirrors the focus score at completion time; kept as its own
    // quantity so the two can diverge once true elapsed time is captured.
    let efficiency = focus_score;

    let xp_gained = (duration as f64 * f64::from(focus_score) / 100.0).round() as u64;
    let xp = stats.xp + xp_gained;

    let today = now.date();
    let is_consecutive = stats
        .last_study_date
        .is_some_and(|last| last == today || today.pred_opt() == Some(last));
    let study_streak = if is_consecutive {
        stats.study_streak + 1
    } else {
        1
    };

    let mut weekly_study_time = stats.weekly_study_time;
    weekly_study_time[now.weekday().num_days_from_sunday() as usize] += duration;

    let hour = now.hour();
    let is_early_bird = (EARLY_BIRD_START_HOUR..EARLY_BIRD_END_HOUR).contains(&hour);
    let is_night_owl = hour >= NIGHT_OWL_START_HOUR || hour < NIGHT_OWL_END_HOUR;

    UserStats {
        level: level_for_xp(xp),
        xp,
        focus_score: (f64::from(stats.focus_score + focus_score) / 2.0).round() as u32,
        study_streak,
        last_study_date: Some(today),
        total_study_time: stats.total_study_time + duration,
        tasks_completed: stats.tasks_completed + 1,
        average_efficiency: incremental_mean(
            stats.average_efficiency,
            stats.tasks_completed,
            efficiency,
        ),
        total_breaks: stats.total_breaks + duration / MINUTES_PER_BREAK,
        best_focus_score: stats.best_focus_score.max(focus_score),
        weekly_study_time,
        total_pomodoro_sessions: stats.total_pomodoro_sessions + 1,
        daily_pomodoro_sessions: stats.daily_pomodoro_sessions + 1,
        weekly_average_efficiency: (stats.weekly_average_efficiency * 6.0
            + f64::from(efficiency))
            / 7.0,
        early_bird_sessions: stats.early_bird_sessions + u64::from(is_early_bird),
        night_owl_sessions: stats.night_owl_sessions + u64::from(is_night_owl),
        deep_work_sessions: stats.deep_work_sessions + u64::from(focus_score == 100),
        longest_task: stats.longest_task.max(u64::from(event.current_task_duration)),
    }
}

/// Running mean over `count` samples extended by one more, rounded half away
/// from zero.
fn incremental_mean(mean: u32, count: u64, sample: u32) -> u32 {
    let total = u64::from(mean) * count + u64::from(sample);
    (total as f64 / (count + 1) as f64).round() as u32
}
