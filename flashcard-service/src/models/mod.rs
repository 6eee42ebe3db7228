pub mod card;
pub mod deck;
pub mod user;

pub use card::{next_card_id, Card, Difficulty};
pub use deck::{parse_tags, Deck, DeckStats};
pub use user::{normalize_email, study_day_key, SanitizedUser, User};
