use crate::models::{Card, Deck, DeckStats, Difficulty};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CardRequest {
    #[validate(length(min = 1, message = "Question is required"))]
    #[schema(example = "What does HTTP stand for?")]
    pub question: String,

    #[validate(length(min = 1, message = "Answer is required"))]
    #[schema(example = "HyperText Transfer Protocol")]
    pub answer: String,

    pub difficulty: Option<Difficulty>,

    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCardRequest {
    #[validate(length(min = 1, message = "Question must not be empty"))]
    pub question: Option<String>,

    #[validate(length(min = 1, message = "Answer must not be empty"))]
    pub answer: Option<String>,

    pub difficulty: Option<Difficulty>,

    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDeckRequest {
    #[validate(length(min = 1, max = 200, message = "Deck name is required"))]
    #[schema(example = "Networking basics")]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    #[validate(nested)]
    pub cards: Vec<CardRequest>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateDeckRequest {
    #[validate(length(min = 1, max = 200, message = "Deck name must not be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReviewRequest {
    pub correct: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StudySessionRequest {
    /// Percentage of cards answered correctly during the session.
    #[validate(range(min = 0.0, max = 100.0, message = "Score must be between 0 and 100"))]
    #[schema(example = 85.0)]
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CardResponse {
    pub id: u32,
    pub question: String,
    pub answer: String,
    pub difficulty: Difficulty,
    pub last_reviewed: Option<DateTime<Utc>>,
    pub next_review: DateTime<Utc>,
    pub review_count: u32,
    pub correct_count: u32,
    pub accuracy: f64,
    pub tags: Vec<String>,
}

impl From<&Card> for CardResponse {
    fn from(card: &Card) -> Self {
        Self {
            id: card.id,
            question: card.question.clone(),
            answer: card.answer.clone(),
            difficulty: card.difficulty,
            last_reviewed: card.last_reviewed,
            next_review: card.next_review,
            review_count: card.review_count,
            correct_count: card.correct_count,
            accuracy: card.accuracy(),
            tags: card.tags.clone(),
        }
    }
}

/// Card without its answer, for list views.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CardSummary {
    pub id: u32,
    pub question: String,
    pub difficulty: Difficulty,
    pub next_review: DateTime<Utc>,
    pub review_count: u32,
    pub correct_count: u32,
}

impl From<&Card> for CardSummary {
    fn from(card: &Card) -> Self {
        Self {
            id: card.id,
            question: card.question.clone(),
            difficulty: card.difficulty,
            next_review: card.next_review,
            review_count: card.review_count,
            correct_count: card.correct_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeckResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub cards: Vec<CardResponse>,
    pub is_public: bool,
    pub stats: DeckStats,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Deck> for DeckResponse {
    fn from(deck: &Deck) -> Self {
        Self {
            id: deck.id.clone(),
            name: deck.name.clone(),
            description: deck.description.clone(),
            tags: deck.tags.clone(),
            cards: deck.cards.iter().map(CardResponse::from).collect(),
            is_public: deck.is_public,
            stats: deck.stats.clone(),
            created_at: deck.created_at,
            updated_at: deck.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeckSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub cards: Vec<CardSummary>,
    pub card_count: usize,
    pub due_count: usize,
    pub is_public: bool,
    pub stats: DeckStats,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeckSummary {
    pub fn from_deck(deck: &Deck, now: DateTime<Utc>) -> Self {
        Self {
            id: deck.id.clone(),
            name: deck.name.clone(),
            description: deck.description.clone(),
            tags: deck.tags.clone(),
            cards: deck.cards.iter().map(CardSummary::from).collect(),
            card_count: deck.cards.len(),
            due_count: deck.due_count(now),
            is_public: deck.is_public,
            stats: deck.stats.clone(),
            created_at: deck.created_at,
            updated_at: deck.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReviewResponse {
    #[schema(example = "Card reviewed successfully")]
    pub message: String,
    pub card: CardResponse,
}
