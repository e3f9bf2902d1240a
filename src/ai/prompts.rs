//! Prompt construction for the tutor. Thin formatting only; the templates
//! carry no logic beyond embedding task and stats context.

use crate::{models::Task, stats::UserStats};

pub const SYSTEM_PROMPT: &str = "You are an experienced educational tutor and study coach \
built into a Pomodoro dashboard. Your expertise is the Pomodoro Technique and effective \
learning strategies, and you communicate in a supportive, encouraging, pedagogical manner. \
Provide clear, structured explanations with relevant examples, break complex concepts into \
manageable steps, and offer constructive feedback. You understand that short breaks enhance \
learning through spaced repetition, longer breaks consolidate learning and prevent cognitive \
fatigue, different subjects benefit from tailored Pomodoro strategies, and sustainable study \
habits require consistent practice.";

pub fn explain_concept(subject: &str, concept: &str) -> String {
    format!(
        "Explain the concept of \"{concept}\" from {subject}. Break it down into \
         manageable steps and finish with one concrete example a student could work through."
    )
}

pub fn analyze_performance(task: &Task, stats: &UserStats) -> String {
    format!(
        "I just finished the task \"{}\" (planned {} minutes, efficiency {}%). \
         Overall I am level {} with {} tasks completed, an average efficiency of {}% \
         and a {}-day study streak. Analyze this performance and suggest one concrete \
         adjustment to my work/break ratio.",
        task.title,
        task.duration,
        task.efficiency.unwrap_or(0),
        stats.level,
        stats.tasks_completed,
        stats.average_efficiency,
        stats.study_streak,
    )
}

pub fn suggest_break_activity(break_minutes: u32, focus_score: u32) -> String {
    format!(
        "My focus session just ended with a focus score of {focus_score}%. \
         Suggest a single restorative activity that fits a {break_minutes}-minute break \
         and explain briefly why it helps before the next session."
    )
}

pub fn generate_study_plan(subject: &str, target_minutes: u32, stats: &UserStats) -> String {
    format!(
        "Create a study plan for {subject} totalling about {target_minutes} minutes of \
         focused work, split into Pomodoro sessions with breaks. I am level {} with an \
         average efficiency of {}%, so calibrate session lengths accordingly and state a \
         learning objective for each session.",
        stats.level, stats.average_efficiency,
    )
}
