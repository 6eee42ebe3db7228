use crate::{
    dtos::auth::{AuthResponse, LoginRequest, SignupRequest, UpdateProfileRequest},
    models::{normalize_email, SanitizedUser, User},
    services::{JwtService, MongoDb, ServiceError},
    utils::{hash_password, verify_password, Password, PasswordHashString},
};
use chrono::Utc;
use mongodb::bson::doc;
use mongodb::error::{ErrorKind, WriteFailure};

#[derive(Clone)]
pub struct AuthService {
    db: MongoDb,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(db: MongoDb, jwt: JwtService) -> Self {
        Self { db, jwt }
    }

    pub async fn signup(&self, req: SignupRequest) -> Result<AuthResponse, ServiceError> {
        let email = normalize_email(&req.email);

        if self.db.find_user_by_email(&email).await?.is_some() {
            return Err(ServiceError::UserAlreadyExists);
        }

        let password_hash = hash_password(&Password::new(req.password)).map_err(|e| {
            ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e))
        })?;

        let user = User::new(req.name.trim().to_string(), email, password_hash.into_string());

        // The unique index catches a concurrent signup that slipped past the lookup.
        if let Err(e) = self.db.users().insert_one(&user, None).await {
            if is_duplicate_key(&e) {
                return Err(ServiceError::UserAlreadyExists);
            }
            return Err(e.into());
        }

        tracing::info!(user_id = %user.id, "User signed up");

        let token = self.jwt.generate_access_token(&user.id, &user.email)?;
        Ok(AuthResponse {
            user: user.sanitize(),
            token,
        })
    }

    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, ServiceError> {
        let email = normalize_email(&req.email);

        let user = self
            .db
            .find_user_by_email(&email)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        verify_password(
            &Password::new(req.password),
            &PasswordHashString::new(user.password_hash.clone()),
        )
        .map_err(|_| {
            tracing::info!(user_id = %user.id, "Login failed: wrong password");
            ServiceError::InvalidCredentials
        })?;

        let now = Utc::now();
        self.db
            .users()
            .update_one(
                doc! { "_id": &user.id },
                doc! { "$set": { "last_login": now.timestamp_millis() } },
                None,
            )
            .await?;

        tracing::info!(user_id = %user.id, "User logged in");

        let token = self.jwt.generate_access_token(&user.id, &user.email)?;
        Ok(AuthResponse {
            user: user.sanitize(),
            token,
        })
    }

    pub async fn me(&self, user_id: &str) -> Result<SanitizedUser, ServiceError> {
        self.db
            .find_user_by_id(user_id)
            .await?
            .map(|u| u.sanitize())
            .ok_or(ServiceError::UserNotFound)
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        req: UpdateProfileRequest,
    ) -> Result<SanitizedUser, ServiceError> {
        let mut user = self
            .db
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        if let Some(name) = req.name {
            user.name = name.trim().to_string();
        }
        if let Some(avatar) = req.avatar {
            user.avatar = Some(avatar);
        }
        user.updated_at = Utc::now();

        self.db.replace_user(&user).await?;
        tracing::info!(user_id = %user.id, "Profile updated");

        Ok(user.sanitize())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == 11000
    )
}
