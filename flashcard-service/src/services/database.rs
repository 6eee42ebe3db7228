//! MongoDB access for users and decks.

use crate::models::{Deck, User};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::{FindOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for flashcard-service");

        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .name("email_unique_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.users()
            .create_index(email_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create email index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        // Deck list ordering
        let updated_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "updated_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("user_updated_idx".to_string())
                    .build(),
            )
            .build();

        // Dashboard recent decks
        let created_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("user_created_idx".to_string())
                    .build(),
            )
            .build();

        self.decks()
            .create_indexes(vec![updated_index, created_index], None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create deck indexes: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    pub fn decks(&self) -> Collection<Deck> {
        self.db.collection("decks")
    }

    // Users

    pub async fn find_user_by_id(
        &self,
        user_id: &str,
    ) -> Result<Option<User>, mongodb::error::Error> {
        self.users().find_one(doc! { "_id": user_id }, None).await
    }

    pub async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<User>, mongodb::error::Error> {
        self.users().find_one(doc! { "email": email }, None).await
    }

    pub async fn replace_user(&self, user: &User) -> Result<(), mongodb::error::Error> {
        self.users()
            .replace_one(doc! { "_id": &user.id }, user, None)
            .await?;
        Ok(())
    }

    /// Adds `day` (`YYYY-MM-DD`) to the user's study days.
    pub async fn record_study_day(
        &self,
        user_id: &str,
        day: &str,
    ) -> Result<(), mongodb::error::Error> {
        self.users()
            .update_one(
                doc! { "_id": user_id },
                doc! { "$addToSet": { "study_days": day } },
                None,
            )
            .await?;
        Ok(())
    }

    // Decks

    /// Deck owned by `user_id`; decks of other users are indistinguishable
    /// from missing ones.
    pub async fn find_deck_for_user(
        &self,
        deck_id: &str,
        user_id: &str,
    ) -> Result<Option<Deck>, mongodb::error::Error> {
        self.decks()
            .find_one(doc! { "_id": deck_id, "user_id": user_id }, None)
            .await
    }

    pub async fn list_decks_for_user(
        &self,
        user_id: &str,
        sort_field: &str,
    ) -> Result<Vec<Deck>, mongodb::error::Error> {
        let mut sort = Document::new();
        sort.insert(sort_field, -1);

        let options = FindOptions::builder()
            .sort(sort)
            .build();

        self.decks()
            .find(doc! { "user_id": user_id }, options)
            .await?
            .try_collect()
            .await
    }

    pub async fn insert_deck(&self, deck: &Deck) -> Result<(), mongodb::error::Error> {
        self.decks().insert_one(deck, None).await?;
        Ok(())
    }

    /// Replaces the deck only if it is still at `expected_version`.
    ///
    /// Returns false when another write got there first or the deck is gone.
    pub async fn replace_deck(
        &self,
        deck: &Deck,
        expected_version: i64,
    ) -> Result<bool, mongodb::error::Error> {
        let result = self
            .decks()
            .replace_one(
                doc! {
                    "_id": &deck.id,
                    "user_id": &deck.user_id,
                    "version": expected_version,
                },
                deck,
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    pub async fn delete_deck(
        &self,
        deck_id: &str,
        user_id: &str,
    ) -> Result<bool, mongodb::error::Error> {
        let result = self
            .decks()
            .delete_one(doc! { "_id": deck_id, "user_id": user_id }, None)
            .await?;
        Ok(result.deleted_count > 0)
    }

    pub async fn increment_deck_views(
        &self,
        deck_id: &str,
        user_id: &str,
    ) -> Result<(), mongodb::error::Error> {
        self.decks()
            .update_one(
                doc! { "_id": deck_id, "user_id": user_id },
                doc! { "$inc": { "stats.total_views": 1_i64, "version": 1_i64 } },
                None,
            )
            .await?;
        Ok(())
    }
}
