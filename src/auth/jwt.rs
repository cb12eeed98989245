use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use super::claims::{Claims, Identity};
use crate::{config::JwtConfig, state::AppState};

/// Lifetime of every session token.
pub const SESSION_TTL: Duration = Duration::hours(24);

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token signature does not match")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("token is malformed")]
    Malformed,
    #[error("token signing failed: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

/// Signs and verifies session tokens with the shared HS256 secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl FromRef<AppState> for TokenKeys {
    fn from_ref(state: &AppState) -> Self {
        state.auth.tokens().clone()
    }
}

impl TokenKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
        }
    }

    pub fn issue(&self, identity: &Identity) -> Result<String, TokenError> {
        self.issue_at(identity, OffsetDateTime::now_utc())
    }

    pub(crate) fn issue_at(
        &self,
        identity: &Identity,
        now: OffsetDateTime,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: identity.user_id,
            email: identity.email.clone(),
            name: identity.name.clone(),
            iat: now.unix_timestamp(),
            exp: (now + SESSION_TTL).unix_timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Signing)?;
        debug!(user_id = %identity.user_id, "session token issued");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<Claims, TokenError> {
        // Expiry is checked below so that a token is dead at exactly `exp`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;

        if now.unix_timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }
        debug!(user_id = %data.claims.sub, "session token verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn make_keys(secret: &str) -> TokenKeys {
        TokenKeys::new(&JwtConfig {
            secret: secret.into(),
        })
    }

    fn alice() -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            email: "a@x.com".into(),
            name: "Alice".into(),
        }
    }

    #[test]
    fn issue_then_verify_returns_same_identity() {
        let keys = make_keys("dev-secret");
        let id = alice();
        let token = keys.issue(&id).expect("issue");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.identity(), id);
        assert_eq!(claims.exp - claims.iat, SESSION_TTL.whole_seconds());
    }

    #[test]
    fn token_older_than_a_day_is_expired() {
        let keys = make_keys("dev-secret");
        let issued = OffsetDateTime::now_utc() - Duration::hours(25);
        let token = keys.issue_at(&alice(), issued).expect("issue");
        assert!(matches!(keys.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn token_is_dead_at_exact_expiry() {
        let keys = make_keys("dev-secret");
        let issued = OffsetDateTime::now_utc();
        let token = keys.issue_at(&alice(), issued).expect("issue");
        assert!(keys.verify_at(&token, issued + SESSION_TTL - Duration::seconds(1)).is_ok());
        assert!(matches!(
            keys.verify_at(&token, issued + SESSION_TTL),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let keys = make_keys("dev-secret");
        let token = keys.issue(&alice()).expect("issue");
        let (body, sig) = token.rsplit_once('.').expect("three segments");

        for i in 0..sig.len() {
            let mut bytes = sig.as_bytes().to_vec();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let forged = format!("{}.{}", body, String::from_utf8(bytes).unwrap());
            assert!(
                matches!(keys.verify(&forged), Err(TokenError::InvalidSignature)),
                "byte {} not detected",
                i
            );
        }
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let token = make_keys("secret-one").issue(&alice()).expect("issue");
        let err = make_keys("secret-two").verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::InvalidSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        let keys = make_keys("dev-secret");
        for junk in ["", "garbage", "a.b", "a.b.c", "not.a.jwt"] {
            assert!(
                matches!(keys.verify(junk), Err(TokenError::Malformed)),
                "{:?}",
                junk
            );
        }
    }
}
