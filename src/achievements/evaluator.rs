use chrono::{DateTime, Utc};
use log::{info, warn};

use super::catalog::Achievement;
use crate::stats::UserStats;

/// Result of one evaluation pass: the bonus XP to fold back into the stats
/// and clones of the entries that just unlocked (for UI notification).
#[derive(Debug, Clone, Default)]
pub struct UnlockOutcome {
    pub xp_awarded: u64,
    pub unlocked: Vec<Achievement>,
}

/// Evaluate every still-locked achievement against `stats`, stamping
/// `unlocked_at = now` on the ones that qualify.
///
/// Already-unlocked entries are never re-evaluated, so a repeat call with
/// unchanged stats unlocks nothing. A condition that fails to evaluate is
/// logged and counted as not met; the pass continues.
///
/// The caller is responsible for adding `xp_awarded` to the stats and
/// restoring the level/XP relation afterwards.
pub fn check_achievements(
    stats: &UserStats,
    achievements: &mut [Achievement],
    now: DateTime<Utc>,
) -> UnlockOutcome {
    let mut outcome = UnlockOutcome::default();

    for achievement in achievements.iter_mut() {
        if achievement.is_unlocked() {
            continue;
        }
        match achievement.condition.evaluate(stats) {
            Ok(true) => {
                achievement.unlocked_at = Some(now);
                outcome.xp_awarded += achievement.points;
                outcome.unlocked.push(achievement.clone());
                info!("Achievement unlocked: {} (+{} XP)", achievement.name, achievement.points);
            }
            Ok(false) => {}
            Err(err) => {
                warn!("Skipping achievement {}: {err}", achievement.id);
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievements::catalog::catalog;

    fn ids(outcome: &UnlockOutcome) -> Vec<&str> {
        outcome.unlocked.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn first_session_unlocks_first_pomodoro_only() {
        let mut achievements = catalog();
        let stats = UserStats {
            total_study_time: 25,
            tasks_completed: 1,
            best_focus_score: 80,
            xp: 20,
            ..UserStats::default()
        };

        let outcome = check_achievements(&stats, &mut achievements, Utc::now());
        assert_eq!(ids(&outcome), vec!["first_pomodoro"]);
        assert_eq!(outcome.xp_awarded, 10);
    }

    #[test]
    fn repeat_pass_with_unchanged_stats_unlocks_nothing() {
        let mut achievements = catalog();
        let stats = UserStats {
            total_study_time: 25,
            tasks_completed: 1,
            ..UserStats::default()
        };

        let first = check_achievements(&stats, &mut achievements, Utc::now());
        assert_eq!(first.unlocked.len(), 1);

        let second = check_achievements(&stats, &mut achievements, Utc::now());
        assert!(second.unlocked.is_empty());
        assert_eq!(second.xp_awarded, 0);
    }

    #[test]
    fn unlock_timestamp_is_monotonic() {
        let mut achievements = catalog();
        let stats = UserStats {
            total_study_time: 25,
            ..UserStats::default()
        };

        let first_now = Utc::now();
        check_achievements(&stats, &mut achievements, first_now);
        let stamped = achievements
            .iter()
            .find(|a| a.id == "first_pomodoro")
            .unwrap()
            .unlocked_at;
        assert_eq!(stamped, Some(first_now));

        // A later pass must not move or clear the timestamp.
        let richer = UserStats {
            total_study_time: 500,
            ..UserStats::default()
        };
        check_achievements(&richer, &mut achievements, Utc::now());
        let after = achievements
            .iter()
            .find(|a| a.id == "first_pomodoro")
            .unwrap()
            .unlocked_at;
        assert_eq!(after, Some(first_now));
    }

    #[test]
    fn rookie_requires_exactly_five_completions() {
        let mut achievements = catalog();

        let four = UserStats {
            tasks_completed: 4,
            total_study_time: 100,
            ..UserStats::default()
        };
        let outcome = check_achievements(&four, &mut achievements, Utc::now());
        assert!(!ids(&outcome).contains(&"pomodoro_rookie"));

        let five = UserStats {
            tasks_completed: 5,
            total_study_time: 125,
            ..UserStats::default()
        };
        let outcome = check_achievements(&five, &mut achievements, Utc::now());
        assert!(ids(&outcome).contains(&"pomodoro_rookie"));
    }

    #[test]
    fn both_efficiency_master_entries_unlock_independently() {
        let mut achievements = catalog();

        // 85% average but a weekly smoothing below 95 unlocks only the first.
        let stats = UserStats {
            average_efficiency: 90,
            weekly_average_efficiency: 90.0,
            ..UserStats::default()
        };
        let outcome = check_achievements(&stats, &mut achievements, Utc::now());
        assert_eq!(
            ids(&outcome)
                .iter()
                .filter(|id| **id == "efficiency_master")
                .count(),
            1
        );
        assert_eq!(outcome.xp_awarded, 35);

        let stats = UserStats {
            average_efficiency: 96,
            weekly_average_efficiency: 96.0,
            ..UserStats::default()
        };
        let outcome = check_achievements(&stats, &mut achievements, Utc::now());
        assert_eq!(ids(&outcome), vec!["efficiency_master"]);
        assert_eq!(outcome.xp_awarded, 50);
    }

    #[test]
    fn placeholder_conditions_never_unlock_and_never_abort_the_pass() {
        let mut achievements = catalog();
        // Stats rich enough to satisfy everything implementable.
        let stats = UserStats {
            level: 7,
            xp: 6500,
            focus_score: 100,
            study_streak: 30,
            total_study_time: 10_000,
            tasks_completed: 50,
            average_efficiency: 99,
            best_focus_score: 100,
            total_pomodoro_sessions: 2000,
            weekly_average_efficiency: 99.0,
            night_owl_sessions: 10,
            deep_work_sessions: 5,
            longest_task: 200,
            ..UserStats::default()
        };

        let outcome = check_achievements(&stats, &mut achievements, Utc::now());
        assert_eq!(outcome.unlocked.len(), 13);
        for id in ["achievement_collector", "pomodoro_champion"] {
            assert!(
                !achievements.iter().find(|a| a.id == id).unwrap().is_unlocked(),
                "{id} should stay locked"
            );
        }
    }
}
