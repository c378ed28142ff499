use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, Result};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// Credential hashing and session-token issuance.
#[derive(Clone)]
pub struct AuthService {
    jwt_secret: String,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(config: &Config) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
            token_ttl: Duration::hours(config.jwt_expiry_hours),
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    pub fn verify_password(&self, password: &str, password_hash: &str) -> bool {
        PasswordHash::new(password_hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    pub fn issue_token(&self, user_id: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )
        .map_err(AppError::from)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let decoding_key = DecodingKey::from_secret(self.jwt_secret.as_ref());
        let validation = Validation::new(Algorithm::HS256);

        match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(token_data) => {
                debug!("Session token verified for user: {}", token_data.claims.sub);
                Ok(token_data.claims)
            }
            Err(e) => {
                warn!("Session token verification failed: {}", e);
                Err(AppError::Authentication("Invalid token".to_string()))
            }
        }
    }

    pub fn session_cookie(&self, token: &str) -> String {
        format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, token)
    }

    pub fn clear_session_cookie(&self) -> String {
        format!("{}=; Path=/; HttpOnly; Max-Age=0", SESSION_COOKIE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(&Config::default())
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let auth = service();
        let hash = auth.hash_password("testpassword").unwrap();
        assert_ne!(hash, "testpassword");
        assert!(auth.verify_password("testpassword", &hash));
        assert!(!auth.verify_password("wrongpassword", &hash));
    }

    #[test]
    fn test_verify_password_rejects_garbage_hash() {
        let auth = service();
        assert!(!auth.verify_password("testpassword", "not-a-phc-string"));
    }

    #[test]
    fn test_token_roundtrip() {
        let auth = service();
        let token = auth.issue_token("user-1").unwrap();
        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_tampered_token_rejected() {
        let auth = service();
        let mut token = auth.issue_token("user-1").unwrap();
        token.push('x');
        assert!(auth.verify_token(&token).is_err());
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let auth = service();
        let mut other_config = Config::default();
        other_config.jwt_secret = "a-different-secret".to_string();
        let other = AuthService::new(&other_config);
        let token = other.issue_token("user-1").unwrap();
        assert!(auth.verify_token(&token).is_err());
    }
}
