//! Experience points, levels, badges and study streaks.

use chrono::{Duration, NaiveDate};
use std::collections::HashSet;

pub const XP_PER_CORRECT: i64 = 10;
pub const HIGH_ACCURACY_BONUS: i64 = 50;
pub const XP_PER_LEVEL: i64 = 1000;

pub const BADGE_PERFECT_SCORE: &str = "Perfect Score";
pub const BADGE_QUIZ_MASTER: &str = "Quiz Master";
pub const BADGE_HIGH_ACHIEVER: &str = "High Achiever";

/// Percentage of correct answers, 0 for an empty quiz.
pub fn accuracy_percent(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    correct as f64 / total as f64 * 100.0
}

/// 10 XP per correct answer plus a 50 XP bonus above 80% accuracy.
pub fn xp_for_quiz(correct: usize, total: usize) -> i64 {
    let base = correct as i64 * XP_PER_CORRECT;
    if accuracy_percent(correct, total) > 80.0 {
        base + HIGH_ACCURACY_BONUS
    } else {
        base
    }
}

pub fn level_for_xp(xp: i64) -> i32 {
    (xp.max(0) / XP_PER_LEVEL + 1) as i32
}

/// Badges unlocked by this quiz that the user does not already hold.
pub fn earned_badges(correct: usize, total: usize, existing: &[String]) -> Vec<String> {
    let accuracy = accuracy_percent(correct, total);
    let mut earned = Vec::new();

    if total > 0 && correct == total {
        earned.push(BADGE_PERFECT_SCORE);
    }
    if correct >= 10 {
        earned.push(BADGE_QUIZ_MASTER);
    }
    if accuracy >= 90.0 {
        earned.push(BADGE_HIGH_ACHIEVER);
    }

    earned
        .into_iter()
        .filter(|b| !existing.iter().any(|e| e == b))
        .map(str::to_string)
        .collect()
}

/// Consecutive study days ending today, or yesterday when today has no
/// activity yet.
pub fn streak(study_days: &[NaiveDate], today: NaiveDate) -> u32 {
    let days: HashSet<NaiveDate> = study_days.iter().copied().collect();

    let mut cursor = if days.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut count = 0;
    while days.contains(&cursor) {
        count += 1;
        cursor -= Duration::days(1);
    }
    count
}
