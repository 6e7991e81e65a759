use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::api::{
    AbandonRequest, AckResponse, AttemptStatusRequest, AttemptStatusResponse, RegisterRequest,
    RegisterResponse, ScreeningApi, StartSessionRequest, StartSessionResponse, SubmitRequest,
    SubmitResponse, VerifyEmailRequest, VerifyEmailResponse,
};
use crate::error::ApiError;

const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl ApiConfig {
    /// Build a config, normalizing the base URL so relative joins append.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidUrl` if `base_url` does not parse.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let trimmed = base_url.trim();
        let normalized = if trimmed.ends_with('/') {
            trimmed.to_owned()
        } else {
            format!("{trimmed}/")
        };
        Ok(Self {
            base_url: Url::parse(&normalized)?,
            timeout,
        })
    }

    /// Read `SCREENING_API_URL` and `SCREENING_API_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidUrl` if the configured URL does not parse.
    pub fn from_env() -> Result<Self, ApiError> {
        let base_url =
            env::var("SCREENING_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let timeout = env::var("SCREENING_API_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self::new(&base_url, Duration::from_secs(timeout))
    }
}

/// `ScreeningApi` over HTTP + JSON.
#[derive(Clone)]
pub struct HttpScreeningApi {
    client: Client,
    config: ApiConfig,
}

impl HttpScreeningApi {
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, ApiError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = self.config.base_url.join(path)?;
        debug!(%url, "screening api request");

        let response = self.client.post(url).json(body).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ScreeningApi for HttpScreeningApi {
    async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        self.post("screening/register", request).await
    }

    async fn verify_email(
        &self,
        request: &VerifyEmailRequest,
    ) -> Result<VerifyEmailResponse, ApiError> {
        self.post("screening/verify-email", request).await
    }

    async fn attempt_status(
        &self,
        request: &AttemptStatusRequest,
    ) -> Result<AttemptStatusResponse, ApiError> {
        self.post("screening/attempts/status", request).await
    }

    async fn start_session(
        &self,
        request: &StartSessionRequest,
    ) -> Result<StartSessionResponse, ApiError> {
        self.post("screening/sessions/start", request).await
    }

    async fn submit_session(&self, request: &SubmitRequest) -> Result<SubmitResponse, ApiError> {
        self.post("screening/sessions/submit", request).await
    }

    async fn abandon_in_progress(&self, request: &AbandonRequest) -> Result<AckResponse, ApiError> {
        self.post("screening/sessions/abandon", request).await
    }
}
