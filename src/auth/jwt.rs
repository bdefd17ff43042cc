use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{
    auth::claims::Claims, config::JwtConfig, state::AppState, users::repo_types::Role,
};

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("token signature is invalid")]
    SignatureInvalid,
    #[error("token has expired")]
    Expired,
    #[error("token issuer or audience does not match")]
    ClaimMismatch,
    #[error("token lifetime is out of range")]
    LifetimeOutOfRange,
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::InvalidKeyFormat => TokenError::SignatureInvalid,
            ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience
            | ErrorKind::InvalidSubject
            | ErrorKind::MissingRequiredClaim(_) => TokenError::ClaimMismatch,
            _ => TokenError::Malformed,
        }
    }
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl JwtKeys {
    pub fn new(secret: &str, issuer: &str, audience: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            ttl,
        }
    }

    pub fn from_config(cfg: &JwtConfig) -> Self {
        // config bounds the lifetime; anything that still overflows gets no lifetime at all
        let ttl = u64::try_from(cfg.ttl_minutes)
            .ok()
            .and_then(|minutes| minutes.checked_mul(60))
            .map(Duration::from_secs)
            .unwrap_or(Duration::ZERO);
        Self::new(&cfg.secret, &cfg.issuer, &cfg.audience, ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: i64, username: &str, role: Role) -> Result<String, TokenError> {
        let now = OffsetDateTime::now_utc();
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(TimeDuration::seconds(secs)))
            .ok_or(TokenError::LifetimeOutOfRange)?;
        let claims = Claims {
            user_id,
            username: username.to_string(),
            role,
            jti: Uuid::new_v4().to_string(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = self.sign(&claims)?;
        debug!(user_id, role = %role, jti = %claims.jti, "jwt signed");
        Ok(token)
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(ALGORITHM), claims, &self.encoding).map_err(TokenError::Signing)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_required_spec_claims(&["exp", "iat", "iss", "aud"]);

        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        // The library only rejects exp < now; a token is valid strictly before its expiry.
        if OffsetDateTime::now_utc().unix_timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }
        debug!(user_id = data.claims.user_id, jti = %data.claims.jti, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // base64url of {"alg":"none","typ":"JWT"}
    const NONE_HEADER: &str = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0";

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::new(secret, issuer, audience, Duration::from_secs(300))
    }

    fn claims_expiring_in(keys: &JwtKeys, seconds: i64) -> Claims {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        Claims {
            user_id: 1,
            username: "alice".into(),
            role: Role::User,
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + seconds,
            iss: keys.issuer.clone(),
            aud: keys.audience.clone(),
        }
    }

    #[test]
    fn issue_and_verify() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let token = keys.issue(42, "alice", Role::Admin).expect("issue");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.exp - claims.iat, 300);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn tokens_issued_back_to_back_differ() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let first = keys.issue(1, "alice", Role::User).unwrap();
        let second = keys.issue(1, "alice", Role::User).unwrap();
        assert_ne!(first, second);
        assert_ne!(keys.verify(&first).unwrap().jti, keys.verify(&second).unwrap().jti);
    }

    #[test]
    fn zero_ttl_token_is_expired() {
        let keys = JwtKeys::new("dev-secret", "iss", "aud", Duration::ZERO);
        let token = keys.issue(1, "alice", Role::User).unwrap();
        assert!(matches!(keys.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn oversized_lifetime_is_an_error_not_a_panic() {
        let keys = JwtKeys::new("dev-secret", "iss", "aud", Duration::from_secs(u64::MAX));
        assert!(matches!(
            keys.issue(1, "alice", Role::User),
            Err(TokenError::LifetimeOutOfRange)
        ));

        let huge = JwtConfig {
            secret: "dev-secret".into(),
            issuer: "iss".into(),
            audience: "aud".into(),
            ttl_minutes: i64::MAX,
        };
        let keys = JwtKeys::from_config(&huge);
        assert_eq!(keys.ttl(), Duration::ZERO);
        assert!(keys.issue(1, "alice", Role::User).is_ok());
    }

    #[test]
    fn past_expiry_is_expired() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let token = keys.sign(&claims_expiring_in(&keys, -120)).unwrap();
        assert!(matches!(keys.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn wrong_secret_is_signature_invalid() {
        let signer = make_keys("secret-one", "iss", "aud");
        let verifier = make_keys("secret-two", "iss", "aud");
        let token = signer.issue(1, "alice", Role::User).unwrap();
        assert!(matches!(
            verifier.verify(&token),
            Err(TokenError::SignatureInvalid)
        ));
    }

    #[test]
    fn wrong_issuer_or_audience_is_rejected() {
        let good = make_keys("same-secret", "good-iss", "good-aud");
        let bad = make_keys("same-secret", "bad-iss", "bad-aud");
        let token = good.issue(1, "alice", Role::User).unwrap();
        assert!(matches!(bad.verify(&token), Err(TokenError::ClaimMismatch)));
    }

    #[test]
    fn garbage_is_malformed() {
        let keys = make_keys("dev-secret", "iss", "aud");
        assert!(matches!(keys.verify("not-a-jwt"), Err(TokenError::Malformed)));
        assert!(matches!(keys.verify(""), Err(TokenError::Malformed)));
    }

    #[test]
    fn other_algorithms_are_rejected() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let claims = claims_expiring_in(&keys, 300);

        // Same secret, different HMAC size: still not the expected algorithm.
        let hs384 = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .unwrap();
        assert!(matches!(
            keys.verify(&hs384),
            Err(TokenError::SignatureInvalid)
        ));

        // Unsigned token with alg "none" carrying a genuine payload.
        let genuine = keys.issue(1, "alice", Role::Admin).unwrap();
        let payload = genuine.split('.').nth(1).unwrap();
        let unsigned = format!("{NONE_HEADER}.{payload}.");
        assert!(keys.verify(&unsigned).is_err());
    }
}
