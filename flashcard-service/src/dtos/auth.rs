use crate::models::SanitizedUser;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    #[schema(example = "Ada Lovelace")]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "ada@example.com")]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "password123", min_length = 8)]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "ada@example.com")]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "password123")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: SanitizedUser,
    /// Also set as the HttpOnly `token` cookie.
    pub token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name must not be empty"))]
    #[schema(example = "Ada King")]
    pub name: Option<String>,

    #[validate(url(message = "Avatar must be a URL"))]
    #[schema(example = "https://example.com/avatar.png")]
    pub avatar: Option<String>,
}
