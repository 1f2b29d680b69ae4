use std::time::Duration;

use anyhow::Context;
use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};

use super::{claims::Claims, repo_types::User};
use crate::{config::JwtConfig, error::AppError, state::AppState};

/// Signing and verification keys, built once from config at startup.
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
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: cfg.ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user: &User) -> anyhow::Result<String> {
        self.issue_at(user, OffsetDateTime::now_utc())
    }

    fn issue_at(&self, user: &User, now: OffsetDateTime) -> anyhow::Result<String> {
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(TimeDuration::seconds(secs)))
            .context("token lifetime out of range")?;
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = user.id, "jwt signed");
        Ok(token)
    }

    pub fn decode_claims(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }

    /// Verifies the token and returns its subject.
    pub fn validate(&self, token: &str) -> Result<i64, AppError> {
        let claims = self.decode_claims(token).map_err(|e| {
            warn!(error = %e, "token rejected");
            AppError::unauthorized()
        })?;
        let user_id = claims.sub.parse::<i64>().map_err(|_| {
            warn!(sub = %claims.sub, "token subject is not a user id");
            AppError::unauthorized()
        })?;
        debug!(user_id, "jwt verified");
        Ok(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        keys_with_ttl(secret, issuer, audience, Duration::from_secs(7 * 24 * 3600))
    }

    fn keys_with_ttl(secret: &str, issuer: &str, audience: &str, ttl: Duration) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl,
        })
    }

    fn user(id: i64) -> User {
        User {
            id,
            email: "bob@x.com".into(),
            password_hash: String::new(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn issue_and_validate_round_trips_subject() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let token = keys.issue(&user(42)).expect("sign");
        assert_eq!(keys.validate(&token).expect("verify"), 42);

        let claims = keys.decode_claims(&token).expect("claims");
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.email, "bob@x.com");
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let good = make_keys("secret-a", "iss", "aud");
        let other = make_keys("secret-b", "iss", "aud");
        let token = other.issue(&user(1)).expect("sign");
        let err = good.validate(&token).unwrap_err();
        assert!(matches!(err, AppError::Auth(ref m) if m == "Unauthorized"));
    }

    #[test]
    fn longest_configurable_lifetime_still_validates() {
        let ttl = crate::config::parse_ttl("3650d").expect("ttl");
        let keys = keys_with_ttl("dev-secret", "iss", "aud", ttl);
        let token = keys.issue(&user(7)).expect("sign");
        assert_eq!(keys.validate(&token).expect("verify"), 7);
    }

    #[test]
    fn out_of_range_lifetime_is_an_error_not_a_panic() {
        for secs in [u64::MAX, 100_000_000 * 24 * 3600] {
            let keys = keys_with_ttl("dev-secret", "iss", "aud", Duration::from_secs(secs));
            assert!(keys.issue(&user(1)).is_err(), "{secs}");
        }
    }

    #[test]
    fn rejects_expired_token() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let long_ago = OffsetDateTime::now_utc() - TimeDuration::days(30);
        let token = keys.issue_at(&user(1), long_ago).expect("sign");
        assert!(matches!(keys.validate(&token), Err(AppError::Auth(_))));
    }

    #[test]
    fn rejects_wrong_issuer_or_audience() {
        let good = make_keys("same-secret", "good-iss", "good-aud");
        let bad = make_keys("same-secret", "bad-iss", "bad-aud");
        let token = good.issue(&user(1)).expect("sign");
        assert!(bad.validate(&token).is_err());
    }

    #[test]
    fn rejects_garbage_and_non_numeric_subject() {
        let keys = make_keys("dev-secret", "iss", "aud");
        assert!(keys.validate("not.a.jwt").is_err());
        assert!(keys.validate("").is_err());

        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: "alice".into(),
            email: "a@b.com".into(),
            iat: now.unix_timestamp() as usize,
            exp: (now + TimeDuration::hours(1)).unix_timestamp() as usize,
            iss: "iss".into(),
            aud: "aud".into(),
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).unwrap();
        assert!(keys.validate(&token).is_err());
    }
}
