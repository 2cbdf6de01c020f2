//! Service-account sign-in for the Sheets API.
//!
//! A signed RS256 assertion is exchanged at the key's `token_uri` for a
//! short-lived bearer token (OAuth 2.0 JWT bearer grant).
use crate::error::{describe_http_error, Result, TriageError};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// The fields of a downloaded `service_account.json` that signing needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            TriageError::Access(format!("read service account {}: {e}", path.display()))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            TriageError::Access(format!("parse service account {}: {e}", path.display()))
        })
    }

    /// Signed assertion valid for one hour from `issued_at` (unix seconds).
    pub(crate) fn assertion(&self, scope: &str, issued_at: i64) -> Result<String> {
        let claims = AssertionClaims {
            iss: self.client_email.clone(),
            scope: scope.to_string(),
            aud: self.token_uri.clone(),
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|e| TriageError::Access(format!("service account private key: {e}")))?;
        encode(&header, &claims, &key)
            .map_err(|e| TriageError::Access(format!("sign service account assertion: {e}")))
    }

    /// Exchange a fresh assertion for a bearer token.
    pub fn fetch_token(&self, agent: &ureq::Agent, scope: &str) -> Result<String> {
        let assertion = self.assertion(scope, Utc::now().timestamp())?;
        let mut response = agent
            .post(&self.token_uri)
            .send_form([("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .map_err(|e| {
                TriageError::Access(format!("token exchange: {}", describe_http_error(&e)))
            })?;
        let token: TokenResponse = response
            .body_mut()
            .read_json()
            .map_err(|e| TriageError::Access(format!("decode token response: {e}")))?;
        tracing::debug!(
            account = %self.client_email,
            expires_in = token.expires_in,
            "service account token minted"
        );
        Ok(token.access_token)
    }
}
