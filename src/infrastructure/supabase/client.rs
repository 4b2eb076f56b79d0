//! HTTP client for the Supabase auth (GoTrue) and REST (PostgREST) APIs

use std::time::Duration;

use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use super::session::{ProviderUser, Session};
use crate::config::SupabaseConfig;
use crate::domain::DomainError;

pub const PROVIDER: &str = "supabase";

/// PostgREST code for "single object requested, zero rows returned"
pub const NO_ROWS_CODE: &str = "PGRST116";

const SINGLE_OBJECT_MEDIA_TYPE: &str = "application/vnd.pgrst.object+json";

/// Failure talking to the Supabase APIs
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{}", status_message(.message))]
    Status {
        status: u16,
        code: Option<String>,
        message: Option<String>,
        body: String,
    },

    #[error("Failed to parse response: {0}")]
    Decode(String),
}

fn status_message(message: &Option<String>) -> &str {
    message.as_deref().unwrap_or("Unknown error")
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ApiError {
    /// Build a status error from a GoTrue or PostgREST error body
    pub fn from_body(status: u16, body: String) -> Self {
        let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();

        let code = parsed
            .error_code
            .or_else(|| match parsed.code {
                Some(serde_json::Value::String(code)) => Some(code),
                _ => None,
            })
            .or_else(|| parsed.error.clone());

        let message = [
            parsed.msg,
            parsed.message,
            parsed.error_description,
            parsed.error,
        ]
        .into_iter()
        .flatten()
        .find(|m| !m.trim().is_empty());

        Self::Status {
            status,
            code,
            message,
            body,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Decode(_) => None,
        }
    }

    pub fn has_code(&self, expected: &str) -> bool {
        matches!(self, Self::Status { code: Some(code), .. } if code == expected)
    }

    /// Convert into a domain error, prefixing the message with `context`
    ///
    /// A status error without any message becomes `DomainError::Unknown`
    /// carrying the raw response.
    pub fn into_domain(self, context: &str) -> DomainError {
        match self {
            Self::Status {
                status,
                message: None,
                body,
                ..
            } => DomainError::unknown(Some(format!("{}HTTP {}: {}", context, status, body))),
            other => DomainError::provider(PROVIDER, format!("{}{}", context, other)),
        }
    }
}

/// Row of the `profiles` table joined onto the auth user
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone)]
struct Endpoints {
    authorize: Url,
    token: Url,
    user: Url,
    logout: Url,
    profiles: Url,
}

/// Thin wrapper over reqwest bound to one Supabase project
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    anon_key: String,
    endpoints: Endpoints,
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig) -> Result<Self, DomainError> {
        config.validate()?;

        let mut base_url = Url::parse(&config.url)
            .map_err(|e| DomainError::configuration(format!("Invalid SUPABASE_URL: {}", e)))?;

        if base_url.cannot_be_a_base() {
            return Err(DomainError::configuration(format!(
                "Invalid SUPABASE_URL: '{}' cannot be used as a base URL",
                config.url
            )));
        }

        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let join = |path: &str| {
            base_url.join(path).map_err(|e| {
                DomainError::configuration(format!("Invalid endpoint '{}': {}", path, e))
            })
        };

        let endpoints = Endpoints {
            authorize: join("auth/v1/authorize")?,
            token: join("auth/v1/token")?,
            user: join("auth/v1/user")?,
            logout: join("auth/v1/logout")?,
            profiles: join("rest/v1/profiles")?,
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                DomainError::configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            anon_key: config.anon_key.clone(),
            endpoints,
        })
    }

    /// URL that starts the provider's OAuth consent flow (PKCE, S256)
    pub fn authorize_url(&self, provider: &str, redirect_to: &str, code_challenge: &str) -> Url {
        let mut url = self.endpoints.authorize.clone();
        url.query_pairs_mut()
            .append_pair("provider", provider)
            .append_pair("redirect_to", redirect_to)
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", "s256");
        url
    }

    pub async fn exchange_code(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> Result<Session, ApiError> {
        let request = self
            .with_api_key(self.http.post(self.endpoints.token.clone()), None)
            .query(&[("grant_type", "pkce")])
            .json(&json!({
                "auth_code": auth_code,
                "code_verifier": code_verifier,
            }));

        let session: Session = send_json(request).await?;
        Ok(session.with_computed_expiry())
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session, ApiError> {
        let request = self
            .with_api_key(self.http.post(self.endpoints.token.clone()), None)
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": refresh_token }));

        let session: Session = send_json(request).await?;
        Ok(session.with_computed_expiry())
    }

    pub async fn get_user(&self, access_token: &str) -> Result<ProviderUser, ApiError> {
        let request = self.with_api_key(
            self.http.get(self.endpoints.user.clone()),
            Some(access_token),
        );

        send_json(request).await
    }

    pub async fn logout(&self, access_token: &str) -> Result<(), ApiError> {
        let request = self
            .with_api_key(
                self.http.post(self.endpoints.logout.clone()),
                Some(access_token),
            )
            .query(&[("scope", "global")]);

        check_status(request.send().await?).await?;
        Ok(())
    }

    /// Fetch exactly one profile row; zero rows fails with [`NO_ROWS_CODE`]
    pub async fn fetch_profile(
        &self,
        access_token: &str,
        user_id: &str,
    ) -> Result<Profile, ApiError> {
        let id_filter = format!("eq.{}", user_id);
        let request = self
            .with_api_key(
                self.http.get(self.endpoints.profiles.clone()),
                Some(access_token),
            )
            .header(reqwest::header::ACCEPT, SINGLE_OBJECT_MEDIA_TYPE)
            .query(&[("select", "username,avatar_url"), ("id", id_filter.as_str())]);

        send_json(request).await
    }

    fn with_api_key(&self, request: RequestBuilder, access_token: Option<&str>) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token.unwrap_or(self.anon_key.as_str()))
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::from_body(status, body))
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
    let response = check_status(request.send().await?).await?;

    response
        .json()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}
