use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, error, info};
use std::sync::OnceLock;
use uuid::Uuid;

use crate::config::settings::AuthConfig;
use crate::error::AppError;
use crate::models::{Claims, TokenClass};

/// Issuer name embedded in every minted token
pub const TOKEN_ISSUER: &str = "videotube";

/// Codec-level verification failure. Translated into the crate-wide error
/// taxonomy at the session-manager / gate boundary; never shown to clients.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token structure could not be parsed")]
    Malformed,
    #[error("token signature does not match")]
    BadSignature,
    #[error("token is past its expiry")]
    Expired,
    #[error("token class does not match the expected class")]
    WrongClass,
    #[error("token keys not initialized")]
    Unavailable,
}

/// Successfully verified token contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedToken {
    pub subject: Uuid,
    pub issued_at: DateTime<Utc>,
}

struct ClassKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

struct TokenKeys {
    access: ClassKeys,
    refresh: ClassKeys,
}

impl TokenKeys {
    fn for_class(&self, class: TokenClass) -> &ClassKeys {
        match class {
            TokenClass::Access => &self.access,
            TokenClass::Refresh => &self.refresh,
        }
    }
}

// Global static holder for the two per-class key pairs
static TOKEN_KEYS: OnceLock<TokenKeys> = OnceLock::new();

/// Initialize the token keys from the auth configuration.
/// This should be called once at application startup.
pub fn init_token_keys(config: &AuthConfig) -> Result<(), AppError> {
    info!("Initializing token keys from configuration");

    let keys = TokenKeys {
        access: ClassKeys {
            encoding: EncodingKey::from_secret(config.access_token_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.access_token_secret.as_bytes()),
            ttl: Duration::minutes(config.access_token_ttl_minutes),
        },
        refresh: ClassKeys {
            encoding: EncodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            ttl: Duration::days(config.refresh_token_ttl_days),
        },
    };

    TOKEN_KEYS
        .set(keys)
        .map_err(|_| AppError::Internal("Token keys were already initialized".to_string()))?;

    info!("Token keys initialized successfully");
    Ok(())
}

fn get_keys() -> Option<&'static TokenKeys> {
    TOKEN_KEYS.get()
}

/// Mint a signed token of the given class for a subject. TTL comes from the
/// initialized configuration for that class.
pub fn mint(subject: Uuid, class: TokenClass) -> Result<String, AppError> {
    let keys = get_keys()
        .ok_or_else(|| AppError::Configuration("Token keys not initialized".to_string()))?;
    let class_keys = keys.for_class(class);

    let iat = Utc::now();
    let exp = iat
        .checked_add_signed(class_keys.ttl)
        .ok_or_else(|| AppError::Internal("Failed to calculate token expiration time".to_string()))?;

    let claims = Claims {
        sub: subject.to_string(),
        exp: exp.timestamp() as usize,
        iat: iat.timestamp() as usize,
        iss: TOKEN_ISSUER.to_string(),
        cls: class,
        jti: Uuid::new_v4().to_string(),
    };

    let header = Header::new(Algorithm::HS256);

    debug!("Minting {} token for subject {} (exp: {})", class, subject, exp);
    encode(&header, &claims, &class_keys.encoding).map_err(|e| {
        error!("Failed to mint {} token: {}", class, e);
        AppError::Internal(format!("Token minting failed: {}", e))
    })
}

/// Verify a token against the expected class's key, at the current server time.
pub fn verify(token: &str, expected_class: TokenClass) -> Result<VerifiedToken, TokenError> {
    verify_at(token, expected_class, Utc::now())
}

/// Verify a token at an explicit point in time.
///
/// Expiry is checked here rather than by the JWT library so that there is no
/// acceptance leeway: a token with `exp = T` is accepted at `T - 1` and
/// rejected at `T`. Check order: structure, signature, expiry, class.
pub fn verify_at(
    token: &str,
    expected_class: TokenClass,
    now: DateTime<Utc>,
) -> Result<VerifiedToken, TokenError> {
    let keys = get_keys().ok_or(TokenError::Unavailable)?;
    let class_keys = keys.for_class(expected_class);

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[TOKEN_ISSUER]);
    // Expiry is validated manually below, against the caller-supplied clock.
    validation.validate_exp = false;

    let token_data = decode::<Claims>(token, &class_keys.decoding, &validation).map_err(|err| {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::BadSignature,
            jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => TokenError::BadSignature,
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    })?;

    let claims = token_data.claims;

    if now.timestamp() >= claims.exp as i64 {
        return Err(TokenError::Expired);
    }

    if claims.cls != expected_class {
        return Err(TokenError::WrongClass);
    }

    let subject = Uuid::parse_str(&claims.sub).map_err(|_| TokenError::Malformed)?;
    let issued_at =
        DateTime::from_timestamp(claims.iat as i64, 0).ok_or(TokenError::Malformed)?;

    Ok(VerifiedToken { subject, issued_at })
}

#[cfg(test)]
pub(crate) fn init_test_keys() {
    let config = AuthConfig {
        access_token_secret: "test-access-secret".to_string(),
        refresh_token_secret: "test-refresh-secret".to_string(),
        access_token_ttl_minutes: 15,
        refresh_token_ttl_days: 7,
        store_timeout_ms: 3000,
    };
    // Tests from several modules race to initialize; only the first wins and
    // they all use the same config.
    let _ = init_token_keys(&config);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mint_and_verify_roundtrip() {
        init_test_keys();
        let subject = Uuid::new_v4();

        let token = mint(subject, TokenClass::Access).unwrap();
        let verified = verify(&token, TokenClass::Access).unwrap();

        assert_eq!(verified.subject, subject);
    }

    #[test]
    fn test_refresh_token_roundtrip() {
        init_test_keys();
        let subject = Uuid::new_v4();

        let token = mint(subject, TokenClass::Refresh).unwrap();
        let verified = verify(&token, TokenClass::Refresh).unwrap();

        assert_eq!(verified.subject, subject);
    }

    #[test]
    fn test_mints_are_unique_within_one_second() {
        init_test_keys();
        let subject = Uuid::new_v4();

        let a = mint(subject, TokenClass::Refresh).unwrap();
        let b = mint(subject, TokenClass::Refresh).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_is_malformed() {
        init_test_keys();
        assert_eq!(
            verify("not-a-token", TokenClass::Access).unwrap_err(),
            TokenError::Malformed
        );
    }

    #[test]
    fn test_tampered_token_fails_signature_check() {
        init_test_keys();
        let token = mint(Uuid::new_v4(), TokenClass::Access).unwrap();

        // Flip the first character of the signature segment. (The last char
        // only carries base64 padding bits, so it is not a safe target.)
        let (head, sig) = token.rsplit_once('.').unwrap();
        let flipped = if sig.starts_with('A') { 'B' } else { 'A' };
        let tampered = format!("{}.{}{}", head, flipped, &sig[1..]);

        assert_eq!(
            verify(&tampered, TokenClass::Access).unwrap_err(),
            TokenError::BadSignature
        );
    }

    #[test]
    fn test_cross_class_verification_fails() {
        init_test_keys();
        let subject = Uuid::new_v4();

        // A refresh token presented where an access token is expected is
        // signed with the wrong secret, so it must not verify.
        let refresh = mint(subject, TokenClass::Refresh).unwrap();
        assert!(verify(&refresh, TokenClass::Access).is_err());

        let access = mint(subject, TokenClass::Access).unwrap();
        assert!(verify(&access, TokenClass::Refresh).is_err());
    }

    #[test]
    fn test_class_claim_mismatch_is_wrong_class() {
        init_test_keys();

        // Hand-roll a token signed with the access secret whose class claim
        // says refresh. The signature verifies, so the class check must
        // catch it.
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            exp: (now.timestamp() + 900) as usize,
            iat: now.timestamp() as usize,
            iss: TOKEN_ISSUER.to_string(),
            cls: TokenClass::Refresh,
            jti: Uuid::new_v4().to_string(),
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-access-secret"),
        )
        .unwrap();

        assert_eq!(
            verify(&token, TokenClass::Access).unwrap_err(),
            TokenError::WrongClass
        );
    }

    #[test]
    fn test_expiry_boundary_is_strict() {
        init_test_keys();
        let token = mint(Uuid::new_v4(), TokenClass::Access).unwrap();
        let verified = verify(&token, TokenClass::Access).unwrap();

        // exp = iat + 15 minutes under the test config
        let exp = verified.issued_at + Duration::minutes(15);

        // Accepted one second before expiry, rejected at the expiry instant.
        assert!(verify_at(&token, TokenClass::Access, exp - Duration::seconds(1)).is_ok());
        assert_eq!(
            verify_at(&token, TokenClass::Access, exp).unwrap_err(),
            TokenError::Expired
        );
        assert_eq!(
            verify_at(&token, TokenClass::Access, exp + Duration::seconds(1)).unwrap_err(),
            TokenError::Expired
        );
    }

    #[test]
    fn test_expiry_checked_before_class() {
        init_test_keys();
        let token = mint(Uuid::new_v4(), TokenClass::Refresh).unwrap();

        // Far past both TTLs: the refresh key still validates the signature,
        // and expiry must win over any later check.
        let far_future = Utc::now() + Duration::days(365);
        assert_eq!(
            verify_at(&token, TokenClass::Refresh, far_future).unwrap_err(),
            TokenError::Expired
        );
    }
}
