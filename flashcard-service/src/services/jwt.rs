use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// User id
    pub sub: String,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Result<Self, anyhow::Error> {
        if config.secret.is_empty() {
            return Err(anyhow::anyhow!("JWT secret must not be empty"));
        }

        tracing::info!("JWT service initialized with HS256 secret");

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            expiry_days: config.expiry_days,
        })
    }

    pub fn generate_access_token(
        &self,
        user_id: &str,
        email: &str,
    ) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let exp = now + Duration::days(self.expiry_days);

        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode access token: {}", e))
    }

    pub fn validate_access_token(&self, token: &str) -> Result<AccessTokenClaims, anyhow::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let token_data = decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| anyhow::anyhow!("Invalid access token: {}", e))?;

        Ok(token_data.claims)
    }

    pub fn expiry_days(&self) -> i64 {
        self.expiry_days
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            expiry_days: 7,
        }
    }

    #[test]
    fn token_round_trips_claims() -> Result<(), anyhow::Error> {
        let service = JwtService::new(&config("a-test-secret-that-is-long-enough!"))?;

        let token = service.generate_access_token("user_123", "test@example.com")?;
        let claims = service.validate_access_token(&token)?;

        assert_eq!(claims.sub, "user_123");
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
        Ok(())
    }

    #[test]
    fn token_from_other_secret_is_rejected() -> Result<(), anyhow::Error> {
        let issuer = JwtService::new(&config("first-secret-first-secret-first!!"))?;
        let verifier = JwtService::new(&config("second-secret-second-secret-second"))?;

        let token = issuer.generate_access_token("user_123", "test@example.com")?;
        assert!(verifier.validate_access_token(&token).is_err());
        Ok(())
    }

    #[test]
    fn each_token_gets_unique_jti() -> Result<(), anyhow::Error> {
        let service = JwtService::new(&config("a-test-secret-that-is-long-enough!"))?;
        let a = service.validate_access_token(&service.generate_access_token("u", "e@x.io")?)?;
        let b = service.validate_access_token(&service.generate_access_token("u", "e@x.io")?)?;
        assert_ne!(a.jti, b.jti);
        Ok(())
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(JwtService::new(&config("")).is_err());
    }

    #[test]
    fn garbage_token_is_rejected() -> Result<(), anyhow::Error> {
        let service = JwtService::new(&config("a-test-secret-that-is-long-enough!"))?;
        assert!(service.validate_access_token("not.a.jwt").is_err());
        Ok(())
    }
}
