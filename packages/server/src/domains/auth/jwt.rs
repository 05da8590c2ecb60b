use anyhow::Result;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access token claims as issued by the hosted auth provider.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,           // User UUID
    pub aud: String,         // Audience ("authenticated")
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    pub exp: i64,            // Expiration timestamp
    #[serde(default)]
    pub iat: Option<i64>,    // Issued at timestamp
}

/// JWT Service - verifies HS256 access tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    audience: String,
}

impl JwtService {
    /// Create new JWT service with the shared signing secret and expected audience
    pub fn new(secret: &str, audience: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            audience: audience.into(),
        }
    }

    /// Issue a token for a user.
    ///
    /// Production tokens come from the auth provider; this exists for tests
    /// and local tooling. Token expires after 1 hour.
    pub fn create_token(&self, user_id: Uuid, email: Option<String>) -> Result<String> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::hours(1);

        let claims = Claims {
            sub: user_id,
            aud: self.audience.clone(),
            email,
            role: Some("authenticated".to_string()),
            exp: exp.timestamp(),
            iat: Some(now.timestamp()),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Verify and decode a JWT token
    ///
    /// Returns claims if token is valid, unexpired and for our audience
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.audience]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_verify_token() {
        let service = JwtService::new("test_secret_key", "authenticated");
        let user_id = Uuid::new_v4();

        let token = service
            .create_token(user_id, Some("owner@example.com".to_string()))
            .unwrap();

        let claims = service.verify_token(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.aud, "authenticated");
        assert_eq!(claims.email.as_deref(), Some("owner@example.com"));
    }

    #[test]
    fn test_invalid_token() {
        let service = JwtService::new("test_secret_key", "authenticated");
        assert!(service.verify_token("invalid_token").is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let service1 = JwtService::new("secret1", "authenticated");
        let service2 = JwtService::new("secret2", "authenticated");

        let token = service1.create_token(Uuid::new_v4(), None).unwrap();

        // Token created with secret1 should not verify with secret2
        assert!(service2.verify_token(&token).is_err());
    }

    #[test]
    fn test_wrong_audience() {
        let issuer = JwtService::new("secret", "anon");
        let verifier = JwtService::new("secret", "authenticated");

        let token = issuer.create_token(Uuid::new_v4(), None).unwrap();
        assert!(verifier.verify_token(&token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let service = JwtService::new("secret", "authenticated");
        let claims = Claims {
            sub: Uuid::new_v4(),
            aud: "authenticated".to_string(),
            email: None,
            role: None,
            exp: chrono::Utc::now().timestamp() - 3600,
            iat: None,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert!(service.verify_token(&token).is_err());
    }
}
