use chrono::{Duration, Utc};
use dashmap::DashMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer claim stamped into every token and required on verification.
pub const ISSUER: &str = "nova-chat-server";

const ACCESS_TOKEN_TYPE: &str = "access";
const REFRESH_TOKEN_TYPE: &str = "refresh";

/// Secrets shorter than this are accepted with a warning.
const MIN_SECRET_LEN: usize = 32;

const MIN_ACCESS_EXPIRY_MINUTES: i64 = 1;
const MAX_ACCESS_EXPIRY_MINUTES: i64 = 525_600;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("token verification failed: {0}")]
    Verify(#[from] jsonwebtoken::errors::Error),
    #[error(
        "access token expiry must be within [{MIN_ACCESS_EXPIRY_MINUTES}, \
         {MAX_ACCESS_EXPIRY_MINUTES}] minutes, got {0}"
    )]
    ExpiryOutOfRange(i64),
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    /// "access" or "refresh", mirrored by the `type` payload field.
    sub: String,
    iat: i64,
    exp: i64,
    user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    login: Option<String>,
    #[serde(rename = "type")]
    token_type: String,
}

/// Verified view of a decoded token.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub user_id: Uuid,
    pub login: Option<String>,
    pub token_type: String,
    pub expires_at: i64,
}

impl TokenInfo {
    pub fn is_access_token(&self) -> bool {
        self.token_type == ACCESS_TOKEN_TYPE
    }

    pub fn is_refresh_token(&self) -> bool {
        self.token_type == REFRESH_TOKEN_TYPE
    }
}

/// Issues and verifies HS256 token pairs and tracks revoked tokens for the
/// lifetime of the process. Revocation is process-local by design; nothing
/// here is durable.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_expiry: Duration,
    refresh_expiry: Duration,
    revoked: DashMap<String, i64>,
}

impl TokenService {
    pub fn new(
        secret: &str,
        access_expiry_minutes: i64,
        refresh_expiry_days: i64,
    ) -> Result<Self, TokenError> {
        if !(MIN_ACCESS_EXPIRY_MINUTES..=MAX_ACCESS_EXPIRY_MINUTES)
            .contains(&access_expiry_minutes)
        {
            return Err(TokenError::ExpiryOutOfRange(access_expiry_minutes));
        }

        if secret.len() < MIN_SECRET_LEN {
            tracing::warn!(
                "jwt.secret_key is shorter than {MIN_SECRET_LEN} bytes; use a longer random secret"
            );
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_expiry: Duration::minutes(access_expiry_minutes),
            refresh_expiry: Duration::days(refresh_expiry_days),
            revoked: DashMap::new(),
        })
    }

    /// Access-token lifetime in seconds, as exposed in `expires_in`.
    pub fn access_expiry_secs(&self) -> i64 {
        self.access_expiry.num_seconds()
    }

    /// Refresh-token lifetime, used when persisting refresh records.
    pub fn refresh_expiry(&self) -> Duration {
        self.refresh_expiry
    }

    pub fn issue_access_token(&self, user_id: &str, login: &str) -> Result<String, TokenError> {
        if user_id.is_empty() {
            return Err(TokenError::InvalidArgument("user id must not be empty".into()));
        }
        if login.is_empty() {
            return Err(TokenError::InvalidArgument("login must not be empty".into()));
        }

        let now = Utc::now();
        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: ACCESS_TOKEN_TYPE.to_string(),
            iat: now.timestamp(),
            exp: (now + self.access_expiry).timestamp(),
            user_id: user_id.to_string(),
            login: Some(login.to_string()),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    pub fn issue_refresh_token(&self, user_id: &str) -> Result<String, TokenError> {
        if user_id.is_empty() {
            return Err(TokenError::InvalidArgument("user id must not be empty".into()));
        }

        let now = Utc::now();
        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: REFRESH_TOKEN_TYPE.to_string(),
            iat: now.timestamp(),
            exp: (now + self.refresh_expiry).timestamp(),
            user_id: user_id.to_string(),
            login: None,
            token_type: REFRESH_TOKEN_TYPE.to_string(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Full verification: signature, issuer, expiry, and the revocation set.
    pub fn verify_and_decode(&self, token: &str) -> Result<TokenInfo, TokenError> {
        if token.is_empty() {
            return Err(TokenError::InvalidArgument("token must not be empty".into()));
        }
        if self.is_revoked(token) {
            return Err(TokenError::InvalidArgument("token has been revoked".into()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.validate_exp = true;

        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        let user_id = Uuid::parse_str(&data.claims.user_id).map_err(|_| {
            TokenError::InvalidArgument("token carries a malformed user id".into())
        })?;

        Ok(TokenInfo {
            user_id,
            login: data.claims.login,
            token_type: data.claims.token_type,
            expires_at: data.claims.exp,
        })
    }

    /// Expiry claim without signature verification. Used when recording
    /// revocations, where the token may already be past validation.
    pub fn token_expiry(&self, token: &str) -> Result<i64, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims.exp)
    }

    /// Record a token as revoked until its own expiry passes. Empty input
    /// is ignored.
    pub fn revoke(&self, token: &str) {
        if token.is_empty() {
            return;
        }
        let expires_at = self
            .token_expiry(token)
            .unwrap_or_else(|_| (Utc::now() + self.access_expiry).timestamp());
        self.revoked.insert(token.to_string(), expires_at);
    }

    /// True iff the token was revoked and its recorded expiry is still in
    /// the future.
    pub fn is_revoked(&self, token: &str) -> bool {
        match self.revoked.get(token) {
            Some(entry) => *entry.value() > Utc::now().timestamp(),
            None => false,
        }
    }

    /// Drop every revocation entry whose expiry has passed.
    pub fn sweep(&self) {
        let now = Utc::now().timestamp();
        self.revoked.retain(|_, expires_at| *expires_at > now);
    }

    #[cfg(test)]
    fn revoked_len(&self) -> usize {
        self.revoked.len()
    }
}
