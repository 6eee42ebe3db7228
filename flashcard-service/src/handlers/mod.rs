//! HTTP handlers for the flashcard service.

pub mod auth;
pub mod cards;
pub mod dashboard;
pub mod decks;
pub mod health;
pub mod metrics;
pub mod quiz;
pub mod upload;
pub mod user;
