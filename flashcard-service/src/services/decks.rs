use crate::{
    dtos::dashboard::{DashboardResponse, DashboardStats, RecentDeck},
    dtos::decks::{CardRequest, CreateDeckRequest, UpdateCardRequest, UpdateDeckRequest},
    models::{next_card_id, study_day_key, Card, Deck},
    services::{gamification, metrics, MongoDb, ServiceError},
};
use chrono::{DateTime, Utc};

const RECENT_DECKS: usize = 5;
const MAX_WRITE_ATTEMPTS: u32 = 10;

#[derive(Clone)]
pub struct DeckService {
    db: MongoDb,
}

impl DeckService {
    pub fn new(db: MongoDb) -> Self {
        Self { db }
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<Deck>, ServiceError> {
        Ok(self
            .db
            .list_decks_for_user(user_id, "updated_at")
            .await?)
    }

    /// Loads the deck and counts the view.
    pub async fn view(&self, user_id: &str, deck_id: &str) -> Result<Deck, ServiceError> {
        let mut deck = self.load(user_id, deck_id).await?;
        self.db.increment_deck_views(deck_id, user_id).await?;
        deck.stats.total_views += 1;
        Ok(deck)
    }

    pub async fn create(
        &self,
        user_id: &str,
        req: CreateDeckRequest,
    ) -> Result<Deck, ServiceError> {
        let now = Utc::now();
        let cards = req
            .cards
            .into_iter()
            .zip(1u32..)
            .map(|(c, id)| build_card(id, c, now))
            .collect();

        let deck = Deck::new(
            user_id.to_string(),
            req.name.trim().to_string(),
            req.description.unwrap_or_default(),
            clean_tags(req.tags),
            cards,
        );
        self.insert(&deck).await?;
        Ok(deck)
    }

    /// Stores a deck built from AI-generated cards.
    pub async fn create_generated(
        &self,
        user_id: &str,
        name: String,
        description: String,
        tags: Vec<String>,
        cards: Vec<Card>,
    ) -> Result<Deck, ServiceError> {
        let deck = Deck::new(
            user_id.to_string(),
            name.trim().to_string(),
            description,
            clean_tags(tags),
            cards,
        );
        self.insert(&deck).await?;
        Ok(deck)
    }

    pub async fn insert(&self, deck: &Deck) -> Result<(), ServiceError> {
        self.db.insert_deck(deck).await?;
        tracing::info!(
            deck_id = %deck.id,
            user_id = %deck.user_id,
            card_count = deck.cards.len(),
            "Deck created"
        );
        Ok(())
    }

    pub async fn update(
        &self,
        user_id: &str,
        deck_id: &str,
        req: UpdateDeckRequest,
    ) -> Result<Deck, ServiceError> {
        let name = req.name.map(|n| n.trim().to_string());
        let tags = req.tags.map(clean_tags);

        let (deck, ()) = self
            .modify(user_id, deck_id, |deck| {
                if let Some(name) = &name {
                    deck.name = name.clone();
                }
                if let Some(description) = &req.description {
                    deck.description = description.clone();
                }
                if let Some(tags) = &tags {
                    deck.tags = tags.clone();
                }
                if let Some(is_public) = req.is_public {
                    deck.is_public = is_public;
                }
                Ok(())
            })
            .await?;
        Ok(deck)
    }

    pub async fn delete(&self, user_id: &str, deck_id: &str) -> Result<(), ServiceError> {
        if !self.db.delete_deck(deck_id, user_id).await? {
            return Err(ServiceError::DeckNotFound);
        }
        tracing::info!(deck_id = %deck_id, user_id = %user_id, "Deck deleted");
        Ok(())
    }

    pub async fn add_card(
        &self,
        user_id: &str,
        deck_id: &str,
        req: CardRequest,
    ) -> Result<Card, ServiceError> {
        let now = Utc::now();
        let (_, card) = self
            .modify(user_id, deck_id, |deck| {
                let card = build_card(next_card_id(&deck.cards), req.clone(), now);
                deck.cards.push(card.clone());
                Ok(card)
            })
            .await?;

        tracing::info!(deck_id = %deck_id, card_id = card.id, "Card added");
        Ok(card)
    }

    pub async fn update_card(
        &self,
        user_id: &str,
        deck_id: &str,
        card_id: u32,
        req: UpdateCardRequest,
    ) -> Result<Card, ServiceError> {
        let tags = req.tags.map(clean_tags);

        let (_, card) = self
            .modify(user_id, deck_id, |deck| {
                let card = deck.card_mut(card_id).ok_or(ServiceError::CardNotFound)?;
                if let Some(question) = &req.question {
                    card.question = question.trim().to_string();
                }
                if let Some(answer) = &req.answer {
                    card.answer = answer.trim().to_string();
                }
                if let Some(difficulty) = req.difficulty {
                    card.difficulty = difficulty;
                }
                if let Some(tags) = &tags {
                    card.tags = tags.clone();
                }
                Ok(card.clone())
            })
            .await?;
        Ok(card)
    }

    pub async fn delete_card(
        &self,
        user_id: &str,
        deck_id: &str,
        card_id: u32,
    ) -> Result<(), ServiceError> {
        self.modify(user_id, deck_id, |deck| {
            let before = deck.cards.len();
            deck.cards.retain(|c| c.id != card_id);
            if deck.cards.len() == before {
                return Err(ServiceError::CardNotFound);
            }
            Ok(())
        })
        .await?;

        tracing::info!(deck_id = %deck_id, card_id, "Card deleted");
        Ok(())
    }

    pub async fn review_card(
        &self,
        user_id: &str,
        deck_id: &str,
        card_id: u32,
        correct: bool,
    ) -> Result<Card, ServiceError> {
        let now = Utc::now();
        let (_, card) = self
            .modify(user_id, deck_id, |deck| {
                let card = deck.card_mut(card_id).ok_or(ServiceError::CardNotFound)?;
                card.record_review(correct, now);
                Ok(card.clone())
            })
            .await?;

        self.db.record_study_day(user_id, &study_day_key(now)).await?;
        metrics::record_review(correct);

        tracing::info!(
            deck_id = %deck_id,
            card_id,
            correct,
            next_review = %card.next_review,
            "Card reviewed"
        );
        Ok(card)
    }

    pub async fn record_session(
        &self,
        user_id: &str,
        deck_id: &str,
        score: f64,
    ) -> Result<Deck, ServiceError> {
        let (deck, ()) = self
            .modify(user_id, deck_id, |deck| {
                deck.stats.record_session(score);
                Ok(())
            })
            .await?;

        self.db
            .record_study_day(user_id, &study_day_key(Utc::now()))
            .await?;
        Ok(deck)
    }

    pub async fn dashboard(&self, user_id: &str) -> Result<DashboardResponse, ServiceError> {
        let now = Utc::now();

        let decks = self.db.list_decks_for_user(user_id, "created_at").await?;
        let user = self
            .db
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let stats = DashboardStats {
            total_decks: decks.len() as u64,
            total_cards: decks.iter().map(|d| d.cards.len()).sum(),
            due_cards: decks.iter().map(|d| d.due_count(now)).sum(),
            studied_today: studied_on_day(&decks, now),
            streak: gamification::streak(&user.study_dates(), now.date_naive()),
        };

        let recent_decks = decks
            .iter()
            .take(RECENT_DECKS)
            .map(|d| RecentDeck {
                id: d.id.clone(),
                name: d.name.clone(),
                description: d.description.clone(),
                card_count: d.cards.len(),
                tags: d.tags.clone(),
                created_at: d.created_at,
            })
            .collect();

        Ok(DashboardResponse {
            stats,
            recent_decks,
        })
    }

    async fn load(&self, user_id: &str, deck_id: &str) -> Result<Deck, ServiceError> {
        self.db
            .find_deck_for_user(deck_id, user_id)
            .await?
            .ok_or(ServiceError::DeckNotFound)
    }

    /// Load, apply `change`, and write back guarded on the loaded version.
    ///
    /// A concurrent write makes the guard miss; the change is then replayed
    /// on a fresh copy so neither write is lost.
    async fn modify<T, F>(
        &self,
        user_id: &str,
        deck_id: &str,
        mut change: F,
    ) -> Result<(Deck, T), ServiceError>
    where
        F: FnMut(&mut Deck) -> Result<T, ServiceError>,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let mut deck = self.load(user_id, deck_id).await?;
            let out = change(&mut deck)?;

            let expected = deck.version;
            deck.version += 1;
            deck.updated_at = Utc::now();

            if self.db.replace_deck(&deck, expected).await? {
                return Ok((deck, out));
            }
            tracing::debug!(deck_id = %deck_id, attempt, "Deck changed concurrently, retrying");
        }

        tracing::warn!(deck_id = %deck_id, "Giving up on contended deck write");
        Err(ServiceError::DeckBusy)
    }
}

fn build_card(id: u32, req: CardRequest, now: DateTime<Utc>) -> Card {
    let mut card = Card::new(
        id,
        req.question.trim().to_string(),
        req.answer.trim().to_string(),
        now,
    );
    card.difficulty = req.difficulty.unwrap_or_default();
    card.tags = clean_tags(req.tags);
    card
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Cards whose last review falls on the same UTC date as `now`.
fn studied_on_day(decks: &[Deck], now: DateTime<Utc>) -> usize {
    let today = now.date_naive();
    decks
        .iter()
        .flat_map(|d| d.cards.iter())
        .filter(|c| c.last_reviewed.is_some_and(|at| at.date_naive() == today))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Difficulty;
    use chrono::{Duration, TimeZone};

    #[test]
    fn tags_are_trimmed_and_deduplicated() {
        let tags = vec![" rust ".into(), "".into(), "rust".into(), "web".into()];
        assert_eq!(clean_tags(tags), vec!["rust", "web"]);
    }

    #[test]
    fn build_card_applies_request_fields() {
        let now = Utc::now();
        let card = build_card(
            4,
            CardRequest {
                question: " Q ".into(),
                answer: " A ".into(),
                difficulty: Some(Difficulty::Hard),
                tags: vec!["t".into()],
            },
            now,
        );
        assert_eq!(card.id, 4);
        assert_eq!(card.question, "Q");
        assert_eq!(card.answer, "A");
        assert_eq!(card.difficulty, Difficulty::Hard);
        assert!(card.is_due(now));
    }

    #[test]
    fn studied_today_uses_utc_date() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap();
        let mut today = Card::new(1, "q".into(), "a".into(), now);
        today.record_review(true, now - Duration::hours(8));
        let mut yesterday = Card::new(2, "q".into(), "a".into(), now);
        yesterday.record_review(true, now - Duration::hours(10));
        let never = Card::new(3, "q".into(), "a".into(), now);

        let deck = Deck::new(
            "u".into(),
            "d".into(),
            String::new(),
            vec![],
            vec![today, yesterday, never],
        );
        assert_eq!(studied_on_day(&[deck], now), 1);
    }
}
