//! Keyed signatures for invitation tokens and session artifacts.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use leasewell_core::{AppError, AppResult};
use leasewell_domain::CustomClaims;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Minimum signing secret length in bytes.
const SECRET_MIN_BYTES: usize = 32;

fn mac_for(secret: &[u8]) -> AppResult<HmacSha256> {
    HmacSha256::new_from_slice(secret)
        .map_err(|error| AppError::Internal(format!("invalid signing key: {error}")))
}

fn checked_secret(secret: impl Into<String>, purpose: &str) -> AppResult<Vec<u8>> {
    let secret = secret.into();
    if secret.len() < SECRET_MIN_BYTES {
        return Err(AppError::Validation(format!(
            "{purpose} secret must be at least {SECRET_MIN_BYTES} bytes"
        )));
    }
    Ok(secret.into_bytes())
}

/// Returns `bytes` random bytes hex-encoded.
pub fn random_hex(bytes: usize) -> AppResult<String> {
    let mut buffer = vec![0u8; bytes];
    getrandom::fill(&mut buffer)
        .map_err(|error| AppError::Internal(format!("failed to gather randomness: {error}")))?;
    Ok(hex::encode(buffer))
}

/// Computes the SHA-256 digest of a string, hex-encoded, for storage.
#[must_use]
pub fn sha256_hex(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

/// Signs invitation tokens over the invitee's email and name.
#[derive(Clone)]
pub struct InvitationSigner {
    secret: Vec<u8>,
}

impl InvitationSigner {
    /// Creates a signer. The secret must be at least 32 bytes.
    pub fn new(secret: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            secret: checked_secret(secret, "invitation")?,
        })
    }

    /// Returns the hex HMAC-SHA256 of `email|first|last`.
    pub fn sign(&self, email: &str, first_name: &str, last_name: &str) -> AppResult<String> {
        let mut mac = mac_for(&self.secret)?;
        mac.update(Self::message(email, first_name, last_name).as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Checks a token in constant time.
    pub fn verify(
        &self,
        token: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> AppResult<()> {
        let provided = hex::decode(token)
            .map_err(|_| AppError::Unauthorized("malformed invitation token".to_owned()))?;
        let mut mac = mac_for(&self.secret)?;
        mac.update(Self::message(email, first_name, last_name).as_bytes());
        mac.verify_slice(&provided)
            .map_err(|_| AppError::Unauthorized("invitation token does not match".to_owned()))
    }

    fn message(email: &str, first_name: &str, last_name: &str) -> String {
        format!("{}|{first_name}|{last_name}", email.to_lowercase())
    }
}

/// Signed session token handed back to a freshly provisioned account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionArtifact {
    /// `base64url(payload).hex(hmac)`.
    pub token: String,
    /// Issue time.
    pub issued_at: DateTime<Utc>,
    /// Expiry time.
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionPayload {
    account_id: String,
    claims: CustomClaims,
    issued_at: i64,
    expires_at: i64,
}

/// Issues and verifies session artifacts.
#[derive(Clone)]
pub struct SessionSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl SessionSigner {
    /// Creates a signer. The secret must be at least 32 bytes.
    pub fn new(secret: impl Into<String>, ttl_seconds: i64) -> AppResult<Self> {
        if ttl_seconds <= 0 {
            return Err(AppError::Validation(
                "session ttl must be positive".to_owned(),
            ));
        }
        let ttl = Duration::try_seconds(ttl_seconds)
            .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
            .ok_or_else(|| {
                AppError::Validation(format!("session ttl of {ttl_seconds}s is out of range"))
            })?;
        Ok(Self {
            secret: checked_secret(secret, "session")?,
            ttl,
        })
    }

    /// Signs a session for the account carrying the given claims.
    pub fn issue(&self, account_id: &str, claims: &CustomClaims) -> AppResult<SessionArtifact> {
        let issued_at = Utc::now();
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal("session expiry is out of range".to_owned()))?;
        let payload = SessionPayload {
            account_id: account_id.to_owned(),
            claims: claims.clone(),
            issued_at: issued_at.timestamp(),
            expires_at: expires_at.timestamp(),
        };
        let json = serde_json::to_vec(&payload)
            .map_err(|error| AppError::Internal(format!("failed to encode session: {error}")))?;
        let encoded = URL_SAFE_NO_PAD.encode(json);

        let mut mac = mac_for(&self.secret)?;
        mac.update(encoded.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        Ok(SessionArtifact {
            token: format!("{encoded}.{signature}"),
            issued_at,
            expires_at,
        })
    }

    /// Verifies signature and expiry and returns the account id and claims.
    pub fn verify(&self, token: &str) -> AppResult<(String, CustomClaims)> {
        let (encoded, signature) = token
            .split_once('.')
            .ok_or_else(|| AppError::Unauthorized("malformed session token".to_owned()))?;
        let signature = hex::decode(signature)
            .map_err(|_| AppError::Unauthorized("malformed session signature".to_owned()))?;

        let mut mac = mac_for(&self.secret)?;
        mac.update(encoded.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AppError::Unauthorized("session signature mismatch".to_owned()))?;

        let json = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| AppError::Unauthorized("malformed session payload".to_owned()))?;
        let payload: SessionPayload = serde_json::from_slice(&json)
            .map_err(|_| AppError::Unauthorized("malformed session payload".to_owned()))?;

        if payload.expires_at <= Utc::now().timestamp() {
            return Err(AppError::Unauthorized("session expired".to_owned()));
        }

        Ok((payload.account_id, payload.claims))
    }
}
