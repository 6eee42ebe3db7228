use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Longest interval a card can be pushed out to, in days.
pub const MAX_INTERVAL_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: u32,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_reviewed: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub next_review: DateTime<Utc>,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub correct_count: u32,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Card {
    /// A fresh card, due immediately.
    pub fn new(id: u32, question: String, answer: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            question,
            answer,
            difficulty: Difficulty::Medium,
            last_reviewed: None,
            next_review: now,
            review_count: 0,
            correct_count: 0,
            tags: Vec::new(),
        }
    }

    pub fn accuracy(&self) -> f64 {
        if self.review_count == 0 {
            return 0.0;
        }
        f64::from(self.correct_count) / f64::from(self.review_count)
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review <= now
    }

    /// Count a review and reschedule the card.
    ///
    /// Counters are updated first so the interval is derived from the
    /// accuracy that includes this answer.
    pub fn record_review(&mut self, correct: bool, now: DateTime<Utc>) {
        self.review_count = self.review_count.saturating_add(1);
        if correct {
            self.correct_count = self.correct_count.saturating_add(1);
        }
        self.last_reviewed = Some(now);
        self.next_review = now + Duration::days(interval_days(correct, self.accuracy()));
    }
}

/// Days until the next review: `max(1, floor(accuracy * 7))` after a correct
/// answer, one day after a miss.
pub fn interval_days(correct: bool, accuracy: f64) -> i64 {
    if !correct {
        return 1;
    }
    let days = (accuracy.clamp(0.0, 1.0) * MAX_INTERVAL_DAYS as f64).floor() as i64;
    days.max(1)
}

/// Next id for a card appended to `cards`.
pub fn next_card_id(cards: &[Card]) -> u32 {
    cards.iter().map(|c| c.id).max().unwrap_or(0) + 1
}
