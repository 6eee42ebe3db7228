use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub total_decks: u64,
    pub total_cards: usize,
    pub due_cards: usize,
    /// Cards reviewed since midnight UTC.
    pub studied_today: usize,
    /// Consecutive days with study activity.
    pub streak: u32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecentDeck {
    pub id: String,
    pub name: String,
    pub description: String,
    pub card_count: usize,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardResponse {
    pub stats: DashboardStats,
    pub recent_decks: Vec<RecentDeck>,
}
