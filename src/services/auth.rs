use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while authenticating a request
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing or malformed Authorization header")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    Expired,
}

/// Claims read from an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub role: Option<String>,
}

/// HS256 bearer token verifier
///
/// Tokens are issued by the BaaS auth service and signed with the project's
/// JWT secret. Audience and expiry are always checked.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "sub", "aud"]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Decode and validate a raw token
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        if data.claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidToken("empty subject".to_string()));
        }

        Ok(data.claims)
    }

    /// Resolve the user id from an `Authorization` header value
    pub fn authenticate(&self, header: Option<&str>) -> Result<String, AuthError> {
        let token = header
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;

        self.verify(token).map(|claims| claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn token(sub: &str, aud: &str, exp_offset_secs: i64) -> String {
        let exp = chrono::Utc::now().timestamp() + exp_offset_secs;
        encode(
            &Header::default(),
            &json!({ "sub": sub, "aud": aud, "exp": exp, "role": "authenticated" }),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token_returns_subject() {
        let verifier = TokenVerifier::new(SECRET, "authenticated");
        let header = format!("Bearer {}", token("user-1", "authenticated", 3600));

        assert_eq!(verifier.authenticate(Some(&header)).unwrap(), "user-1");
    }

    #[test]
    fn test_missing_or_malformed_header() {
        let verifier = TokenVerifier::new(SECRET, "authenticated");

        assert_eq!(verifier.authenticate(None), Err(AuthError::MissingToken));
        assert_eq!(verifier.authenticate(Some("Basic abc")), Err(AuthError::MissingToken));
        assert_eq!(verifier.authenticate(Some("Bearer   ")), Err(AuthError::MissingToken));
    }

    #[test]
    fn test_expired_token() {
        let verifier = TokenVerifier::new(SECRET, "authenticated");
        let expired = token("user-1", "authenticated", -3600);

        assert_eq!(verifier.verify(&expired).unwrap_err(), AuthError::Expired);
    }

    #[test]
    fn test_wrong_audience_or_secret() {
        let verifier = TokenVerifier::new(SECRET, "authenticated");
        assert!(matches!(
            verifier.verify(&token("user-1", "anon", 3600)),
            Err(AuthError::InvalidToken(_))
        ));

        let other = TokenVerifier::new("other-secret", "authenticated");
        assert!(matches!(
            other.verify(&token("user-1", "authenticated", 3600)),
            Err(AuthError::InvalidToken(_))
        ));
    }
}
