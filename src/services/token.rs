use anyhow::Result;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::AuthConfig;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id
    sub: i32,
    iat: i64,
    exp: i64,
}

/// Issues and verifies the HS256 bearer tokens used by the API.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl TokenService {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            lifetime: config.token_lifetime(),
        }
    }

    /// Signs a token for the given user id.
    pub fn issue(&self, user_id: i32) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        #[allow(clippy::cast_possible_wrap)]
        let claims = Claims {
            sub: user_id,
            iat: now,
            exp: now + self.lifetime.as_secs() as i64,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Verifies a token and returns the user id it was issued for.
    /// `Ok(None)` covers everything a client can cause: malformed,
    /// mis-signed, or expired tokens are indistinguishable to callers.
    /// `Err` is reserved for unexpected verification failures.
    pub fn verify(&self, token: &str) -> Result<Option<i32>> {
        let validation = Validation::new(Algorithm::HS256);
        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Ok(Some(data.claims.sub)),
            Err(err) => match err.kind() {
                ErrorKind::InvalidToken
                | ErrorKind::InvalidSignature
                | ErrorKind::ExpiredSignature
                | ErrorKind::ImmatureSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => Ok(None),
                _ => Err(err.into()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(&AuthConfig {
            jwt_secret: secret.to_string(),
            jwt_expires_in: "1h".to_string(),
        })
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service("test-secret");
        let token = tokens.issue(42).unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), Some(42));
    }

    #[test]
    fn test_rejects_wrong_secret() {
        let token = service("secret-a").issue(7).unwrap();
        assert_eq!(service("secret-b").verify(&token).unwrap(), None);
    }

    #[test]
    fn test_rejects_garbage() {
        let tokens = service("test-secret");
        assert_eq!(tokens.verify("not-a-token").unwrap(), None);
        assert_eq!(tokens.verify("").unwrap(), None);
    }

    #[test]
    fn test_rejects_expired() {
        let tokens = service("test-secret");
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &tokens.encoding_key).unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), None);
    }
}
