//! Business logic for the flashcard service.

pub mod auth;
mod database;
pub mod decks;
pub mod error;
pub mod extraction;
pub mod gamification;
pub mod generation;
mod jwt;
pub mod metrics;
pub mod providers;
pub mod quiz;

pub use auth::AuthService;
pub use database::MongoDb;
pub use decks::DeckService;
pub use error::ServiceError;
pub use extraction::{ContentExtractor, FileKind, UploadedFile};
pub use generation::{FlashcardGenerator, GeneratedCards, GenerationSource};
pub use jwt::{AccessTokenClaims, JwtService};
pub use quiz::QuizService;
