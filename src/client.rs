// src/client.rs
//! HTTP client for the job-discovery backend

use std::path::Path;

use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, trace};

use crate::board::JobSources;
use crate::form::{AutofillData, FieldDescriptor};
use crate::types::request::{AutofillRequest, Credentials, PaymentIntentRequest};
use crate::types::response::{
    AdminStats, ApiEnvelope, AuthResponse, AutofillResponse, PaymentIntent, User,
};
use crate::utils::cv_content_type;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8001";

const LOGIN_ENDPOINT: &str = "/api/auth/login";
const REGISTER_ENDPOINT: &str = "/api/auth/register";
const ME_ENDPOINT: &str = "/api/auth/me";
const AUTOFILL_ENDPOINT: &str = "/api/autofill/generate";
const ONBOARDING_SAVE_ENDPOINT: &str = "/api/onboarding/save";
const ONBOARDING_GET_ENDPOINT: &str = "/api/onboarding/get";
const ONBOARDING_QUESTIONS_ENDPOINT: &str = "/api/onboarding/questions";
const CV_UPLOAD_ENDPOINT: &str = "/api/cv/upload";
const PAYMENT_INTENT_ENDPOINT: &str = "/api/payment/create-intent";
const ADMIN_USERS_ENDPOINT: &str = "/api/admin/users";
const ADMIN_STATS_ENDPOINT: &str = "/api/admin/stats";
const ADMIN_ONBOARDING_ENDPOINT: &str = "/api/admin/onboarding-data";
const JOBS_ENDPOINT: &str = "/api/jobs";
const JOBS_REFRESH_ENDPOINT: &str = "/api/jobs/refresh";

/// Default payment amount in cents
pub const DEFAULT_PAYMENT_AMOUNT: u64 = 10_000;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

impl ApiError {
    /// True when `err` carries a 401 from the backend
    pub fn is_unauthorized(err: &anyhow::Error) -> bool {
        matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::Unauthorized(_))
        )
    }
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Same client, sending `token` as a bearer credential
    pub fn authorized(&self, token: &str) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token.to_string()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn with_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    // ===== Auth =====

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        info!("Logging in as {}", email);
        self.post_json(LOGIN_ENDPOINT, &Credentials::new(email, password))
            .await
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        payment_intent_id: Option<String>,
    ) -> Result<AuthResponse> {
        info!("Registering {}", email);
        let credentials = Credentials::new(email, password).with_payment_intent(payment_intent_id);
        self.post_json(REGISTER_ENDPOINT, &credentials).await
    }

    /// Token validity probe
    pub async fn current_user(&self) -> Result<User> {
        self.get(ME_ENDPOINT).await
    }

    // ===== Autofill =====

    pub async fn generate_autofill(&self, fields: &[FieldDescriptor]) -> Result<AutofillData> {
        info!("Requesting autofill data for {} fields", fields.len());
        let response: AutofillResponse = self
            .post_json(AUTOFILL_ENDPOINT, &AutofillRequest { form_fields: fields })
            .await?;
        debug!("Received {} autofill values", response.autofill_data.len());
        Ok(response.autofill_data)
    }

    // ===== Onboarding / CV =====

    pub async fn save_onboarding(&self, answers: &Value) -> Result<String> {
        let envelope: ApiEnvelope = self.post_json(ONBOARDING_SAVE_ENDPOINT, answers).await?;
        let message = envelope
            .message
            .clone()
            .unwrap_or_else(|| "Onboarding data saved".to_string());
        envelope.into_data()?;
        Ok(message)
    }

    pub async fn get_onboarding(&self) -> Result<Value> {
        let envelope: ApiEnvelope = self.get(ONBOARDING_GET_ENDPOINT).await?;
        envelope.into_data()
    }

    pub async fn onboarding_questions(&self) -> Result<Value> {
        self.get(ONBOARDING_QUESTIONS_ENDPOINT).await
    }

    /// Upload a CV file, returning the parsed structured data
    pub async fn upload_cv(&self, file_path: &Path) -> Result<Value> {
        let file_name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .context("Invalid CV file name")?;
        let content_type = cv_content_type(file_name)?;

        let file_content = tokio::fs::read(file_path)
            .await
            .with_context(|| format!("Failed to read file: {}", file_path.display()))?;

        let form = Form::new().part(
            "cv_file",
            Part::bytes(file_content)
                .file_name(file_name.to_string())
                .mime_str(content_type)
                .context("Failed to create multipart")?,
        );

        let url = self.url(CV_UPLOAD_ENDPOINT);
        info!("Uploading CV {} to {}", file_name, url);

        let request = self.with_auth(self.client.post(&url).multipart(form));
        let envelope: ApiEnvelope = self.send(request, &url).await?;
        envelope.into_data()
    }

    // ===== Payment =====

    pub async fn create_payment_intent(&self, amount: u64) -> Result<PaymentIntent> {
        self.post_json(PAYMENT_INTENT_ENDPOINT, &PaymentIntentRequest { amount })
            .await
    }

    // ===== Admin =====

    pub async fn admin_users(&self) -> Result<Vec<User>> {
        self.get(ADMIN_USERS_ENDPOINT).await
    }

    pub async fn admin_stats(&self) -> Result<AdminStats> {
        self.get(ADMIN_STATS_ENDPOINT).await
    }

    pub async fn admin_onboarding_data(&self) -> Result<Value> {
        self.get(ADMIN_ONBOARDING_ENDPOINT).await
    }

    // ===== Jobs =====

    /// Scraped jobs grouped by source
    pub async fn list_jobs(&self) -> Result<JobSources> {
        self.get(JOBS_ENDPOINT).await
    }

    pub async fn refresh_jobs(&self) -> Result<Value> {
        self.post_json(JOBS_REFRESH_ENDPOINT, &serde_json::json!({}))
            .await
    }

    /// Generic POST request with JSON
    pub async fn post_json<T, R>(&self, endpoint: &str, payload: &T) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(endpoint);
        trace!("POST {}", url);
        let request = self.with_auth(self.client.post(&url).json(payload));
        self.send(request, &url).await
    }

    /// Generic GET request
    pub async fn get<R>(&self, endpoint: &str) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let url = self.url(endpoint);
        trace!("GET {}", url);
        let request = self.with_auth(self.client.get(&url));
        self.send(request, &url).await
    }

    async fn send<R>(&self, request: RequestBuilder, url: &str) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let response = request
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;
        let response = check_status(response).await?;
        response
            .json::<R>()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    trace!("Response status: {}", status);
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    let body = error_message(&body);

    if status == StatusCode::UNAUTHORIZED {
        error!("Backend rejected credentials: {}", body);
        return Err(ApiError::Unauthorized(body).into());
    }
    error!("Backend error {}: {}", status, body);
    Err(ApiError::Status { status, body }.into())
}

/// Prefer the `error` field of a JSON error body
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
