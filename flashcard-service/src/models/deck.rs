use super::card::Card;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct DeckStats {
    pub total_views: i64,
    pub total_study_sessions: i64,
    pub average_score: f64,
}

impl DeckStats {
    /// Fold a finished study session (0..=100) into the running mean.
    pub fn record_session(&mut self, score: f64) {
        let sessions = self.total_study_sessions as f64;
        self.average_score = (self.average_score * sessions + score) / (sessions + 1.0);
        self.total_study_sessions += 1;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub stats: DeckStats,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    /// Bumped on every write; guards concurrent read-modify-write cycles.
    #[serde(default)]
    pub version: i64,
}

impl Deck {
    pub fn new(
        user_id: String,
        name: String,
        description: String,
        tags: Vec<String>,
        cards: Vec<Card>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            name,
            description,
            tags,
            cards,
            is_public: false,
            stats: DeckStats::default(),
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn card(&self, card_id: u32) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == card_id)
    }

    pub fn card_mut(&mut self, card_id: u32) -> Option<&mut Card> {
        self.cards.iter_mut().find(|c| c.id == card_id)
    }

    pub fn due_count(&self, now: DateTime<Utc>) -> usize {
        self.cards.iter().filter(|c| c.is_due(now)).count()
    }
}

/// Splits a comma separated tag list, dropping blanks.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_average_over_sessions() {
        let mut stats = DeckStats::default();
        stats.record_session(80.0);
        stats.record_session(100.0);
        stats.record_session(60.0);
        assert_eq!(stats.total_study_sessions, 3);
        assert!((stats.average_score - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_tags_trims_and_drops_empty() {
        assert_eq!(parse_tags(" rust, ,async ,"), vec!["rust", "async"]);
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn due_count_counts_only_due_cards() {
        let now = Utc::now();
        let mut due = Card::new(1, "q1".into(), "a1".into(), now);
        due.next_review = now - chrono::Duration::hours(1);
        let mut later = Card::new(2, "q2".into(), "a2".into(), now);
        later.record_review(true, now);

        let deck = Deck::new("u".into(), "d".into(), String::new(), vec![], vec![due, later]);
        assert_eq!(deck.due_count(now), 1);
        assert!(deck.card(2).is_some());
        assert!(deck.card(3).is_none());
    }
}
