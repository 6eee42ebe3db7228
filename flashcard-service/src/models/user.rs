use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: Option<String>,
    #[serde(default)]
    pub xp: i64,
    #[serde(default = "default_level")]
    pub level: i32,
    #[serde(default)]
    pub badges: Vec<String>,
    /// UTC dates with study activity, formatted `YYYY-MM-DD`.
    #[serde(default)]
    pub study_days: Vec<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_login: Option<DateTime<Utc>>,
}

fn default_level() -> i32 {
    1
}

impl User {
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email: normalize_email(&email),
            password_hash,
            avatar: None,
            xp: 0,
            level: 1,
            badges: Vec::new(),
            study_days: Vec::new(),
            created_at: now,
            updated_at: now,
            last_login: Some(now),
        }
    }

    pub fn sanitize(&self) -> SanitizedUser {
        SanitizedUser {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            avatar: self.avatar.clone(),
            xp: self.xp,
            level: self.level,
            badges: self.badges.clone(),
        }
    }

    pub fn study_dates(&self) -> Vec<NaiveDate> {
        self.study_days
            .iter()
            .filter_map(|d| NaiveDate::parse_from_str(d, STUDY_DAY_FORMAT).ok())
            .collect()
    }
}

pub const STUDY_DAY_FORMAT: &str = "%Y-%m-%d";

pub fn study_day_key(at: DateTime<Utc>) -> String {
    at.format(STUDY_DAY_FORMAT).to_string()
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// User as exposed over the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SanitizedUser {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: String,
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub avatar: Option<String>,
    #[schema(example = 1250)]
    pub xp: i64,
    #[schema(example = 2)]
    pub level: i32,
    pub badges: Vec<String>,
}
