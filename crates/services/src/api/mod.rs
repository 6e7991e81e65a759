//! Request/response contract of the remote screening backend.

mod http;
mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use screening_core::model::{LanguageCode, ModuleId, ScreeningUser, SessionId, UserId};

use crate::error::ApiError;

pub use http::{ApiConfig, HttpScreeningApi};
pub use memory::InMemoryScreeningApi;

#[async_trait]
pub trait ScreeningApi: Send + Sync {
    async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ApiError>;

    async fn verify_email(
        &self,
        request: &VerifyEmailRequest,
    ) -> Result<VerifyEmailResponse, ApiError>;

    async fn attempt_status(
        &self,
        request: &AttemptStatusRequest,
    ) -> Result<AttemptStatusResponse, ApiError>;

    async fn start_session(
        &self,
        request: &StartSessionRequest,
    ) -> Result<StartSessionResponse, ApiError>;

    async fn submit_session(&self, request: &SubmitRequest) -> Result<SubmitResponse, ApiError>;

    async fn abandon_in_progress(&self, request: &AbandonRequest) -> Result<AckResponse, ApiError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub age: u8,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub is_success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailResponse {
    pub is_success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user: Option<ScreeningUser>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptStatusRequest {
    pub user_id: UserId,
    pub language_code: LanguageCode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleRef {
    pub id: ModuleId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptStatusResponse {
    #[serde(default)]
    pub allowed: bool,
    #[serde(default)]
    pub is_completed: bool,
    pub count: u32,
    pub max_attempts: u32,
    #[serde(default)]
    pub last_module_completed: Option<ModuleRef>,
    #[serde(default)]
    pub completion_message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    pub module_id: ModuleId,
    pub user_id: UserId,
    pub language_code: LanguageCode,
    pub resume: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionResponse {
    pub session_id: SessionId,
    #[serde(default)]
    pub module_id: Option<ModuleId>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub module_id: ModuleId,
    pub session_id: SessionId,
    pub payload: serde_json::Value,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    #[serde(default = "default_true")]
    pub is_success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub next_module_id: Option<ModuleId>,
    #[serde(default)]
    pub assessment_completed: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbandonRequest {
    pub user_id: UserId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AckResponse {
    #[serde(default = "default_true")]
    pub is_success: bool,
    #[serde(default)]
    pub message: String,
}
