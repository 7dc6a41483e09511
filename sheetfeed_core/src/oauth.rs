use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::Credentials;
use crate::error::SourceError;

const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
    pub token_type: Option<String>,
}

fn token_endpoint(tenant_id: &str) -> String {
    format!(
        "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
        if tenant_id.is_empty() {
            "common"
        } else {
            tenant_id
        }
    )
}

async fn request_tokens(
    http: &reqwest::Client,
    url: String,
    body: Vec<(&str, String)>,
) -> Result<OAuthTokens, SourceError> {
    let resp = http
        .post(url)
        .form(&body)
        .send()
        .await
        .map_err(SourceError::HttpRequest)?;
    let status = resp.status();
    let v = resp
        .json::<serde_json::Value>()
        .await
        .map_err(|e| SourceError::Internal(e.to_string()))?;
    if !status.is_success() {
        let code = v
            .get("error")
            .and_then(|s| s.as_str())
            .unwrap_or("unknown_error");
        let description = v
            .get("error_description")
            .and_then(|s| s.as_str())
            .unwrap_or("no error description provided");
        return Err(SourceError::Authentication(format!(
            "token request failed ({}): {}",
            code, description
        )));
    }
    Ok(OAuthTokens {
        access_token: v["access_token"].as_str().unwrap_or_default().to_string(),
        refresh_token: v
            .get("refresh_token")
            .and_then(|s| s.as_str())
            .map(|s| s.to_string()),
        expires_in: v.get("expires_in").and_then(|i| i.as_i64()),
        scope: v
            .get("scope")
            .and_then(|s| s.as_str())
            .map(|s| s.to_string()),
        token_type: v
            .get("token_type")
            .and_then(|s| s.as_str())
            .map(|s| s.to_string()),
    })
}

pub async fn refresh_grant(
    http: &reqwest::Client,
    tenant_id: &str,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<OAuthTokens, SourceError> {
    let body = vec![
        ("grant_type", "refresh_token".to_string()),
        ("client_id", client_id.to_string()),
        ("client_secret", client_secret.to_string()),
        ("refresh_token", refresh_token.to_string()),
        ("scope", GRAPH_SCOPE.to_string()),
    ];
    request_tokens(http, token_endpoint(tenant_id), body).await
}

pub async fn client_credentials_grant(
    http: &reqwest::Client,
    tenant_id: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<OAuthTokens, SourceError> {
    let body = vec![
        ("grant_type", "client_credentials".to_string()),
        ("client_id", client_id.to_string()),
        ("client_secret", client_secret.to_string()),
        ("scope", GRAPH_SCOPE.to_string()),
    ];
    request_tokens(http, token_endpoint(tenant_id), body).await
}

struct CachedToken {
    access_token: String,
    // Epoch seconds; stored 60s short of the real expiry.
    expires_at: i64,
    refresh_token: Option<String>,
}

/// Hands out bearer tokens for Graph calls, re-running the grant only when
/// the cached token has expired. AAD rotates refresh tokens, so a rotated
/// token replaces the configured one for the rest of the process.
pub struct TokenProvider {
    credentials: Credentials,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            cached: Mutex::new(None),
        }
    }

    pub async fn access_token(&self, http: &reqwest::Client) -> Result<String, SourceError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > chrono::Utc::now().timestamp() {
                return Ok(token.access_token.clone());
            }
        }

        let refresh_token = cached
            .as_ref()
            .and_then(|t| t.refresh_token.clone())
            .or_else(|| self.credentials.refresh_token().map(|s| s.to_string()));

        let tokens = match refresh_token {
            Some(rt) => {
                refresh_grant(
                    http,
                    self.credentials.tenant_id(),
                    self.credentials.client_id(),
                    self.credentials.client_secret(),
                    &rt,
                )
                .await?
            }
            None => {
                client_credentials_grant(
                    http,
                    self.credentials.tenant_id(),
                    self.credentials.client_id(),
                    self.credentials.client_secret(),
                )
                .await?
            }
        };

        if tokens.access_token.is_empty() {
            return Err(SourceError::Authentication(
                "token response missing access_token".to_string(),
            ));
        }

        let expires_at = chrono::Utc::now().timestamp() + tokens.expires_in.unwrap_or(3600) - 60;
        *cached = Some(CachedToken {
            access_token: tokens.access_token.clone(),
            expires_at,
            refresh_token: tokens.refresh_token,
        });
        Ok(tokens.access_token)
    }
}
