// src/bridge/background.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::messages::{Envelope, Request, UNKNOWN_ACTION};
use crate::client::BackendClient;
use crate::config::{Endpoints, ProviderConfig};
use crate::form::{AutofillData, FieldDescriptor};
use crate::store::ExtensionStore;
use crate::types::response::User;

/// Actions served by the extension's background context
#[async_trait]
pub trait Background: Send + Sync {
    /// Structured job data from plain page text
    async fn extract_job_data(&self, content: &str, url: &str, config: &ProviderConfig)
        -> Result<Value>;

    async fn analyze_form(&self, form_html: &str, config: &ProviderConfig) -> Result<Value>;

    /// Answer for one form field, given the target job and the user's resume
    async fn generate_answer(
        &self,
        field: &FieldDescriptor,
        job: Option<&Value>,
        resume_data: &Value,
        config: &ProviderConfig,
    ) -> Result<String>;

    /// Current user for the stored token
    async fn get_user_data(&self) -> Result<User>;

    async fn generate_autofill(&self, token: &str, fields: &[FieldDescriptor])
        -> Result<AutofillData>;
}

/// Background backed by the HTTP backend
pub struct HttpBackground {
    client: BackendClient,
    store: ExtensionStore,
    endpoints: Endpoints,
}

impl HttpBackground {
    pub fn new(client: BackendClient, store: ExtensionStore, endpoints: Endpoints) -> Self {
        Self {
            client,
            store,
            endpoints,
        }
    }

    async fn client_with_token(&self) -> Result<BackendClient> {
        match self.store.auth_token().await? {
            Some(token) => Ok(self.client.authorized(&token)),
            None => Ok(self.client.clone()),
        }
    }
}

#[async_trait]
impl Background for HttpBackground {
    async fn extract_job_data(
        &self,
        content: &str,
        url: &str,
        config: &ProviderConfig,
    ) -> Result<Value> {
        info!("Extracting job data from {} ({} chars)", url, content.chars().count());
        let payload = json!({ "content": content, "url": url, "config": config });
        let response: Value = self
            .client_with_token()
            .await?
            .post_json(&self.endpoints.extract_job, &payload)
            .await
            .context("Job extraction failed")?;
        Ok(response.get("jobData").cloned().unwrap_or(response))
    }

    async fn analyze_form(&self, form_html: &str, config: &ProviderConfig) -> Result<Value> {
        let payload = json!({ "formHtml": form_html, "config": config });
        self.client_with_token()
            .await?
            .post_json(&self.endpoints.analyze_form, &payload)
            .await
            .context("Form analysis failed")
    }

    async fn generate_answer(
        &self,
        field: &FieldDescriptor,
        job: Option<&Value>,
        resume_data: &Value,
        config: &ProviderConfig,
    ) -> Result<String> {
        let payload = json!({
            "field": field,
            "job": job,
            "resumeData": resume_data,
            "config": config,
        });
        let response: Value = self
            .client_with_token()
            .await?
            .post_json(&self.endpoints.generate_answer, &payload)
            .await
            .with_context(|| format!("Answer generation failed for {}", field.name))?;
        Ok(response
            .get("answer")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    async fn get_user_data(&self) -> Result<User> {
        let token = self
            .store
            .auth_token()
            .await?
            .context("Not authenticated")?;
        self.client.authorized(&token).current_user().await
    }

    async fn generate_autofill(
        &self,
        token: &str,
        fields: &[FieldDescriptor],
    ) -> Result<AutofillData> {
        self.client.authorized(token).generate_autofill(fields).await
    }
}

/// Dispatches background actions to a [`Background`] and wraps the result
pub struct BackgroundRouter<'a> {
    background: &'a dyn Background,
}

impl<'a> BackgroundRouter<'a> {
    pub fn new(background: &'a dyn Background) -> Self {
        Self { background }
    }

    pub async fn handle_value(&self, message: Value) -> Envelope {
        match Request::from_value(message) {
            Some(request) => self.handle(request).await,
            None => Envelope::err(UNKNOWN_ACTION),
        }
    }

    pub async fn handle(&self, request: Request) -> Envelope {
        let action = request.action();
        let result = match request {
            Request::ExtractJobData {
                content,
                url,
                config,
            } => self
                .background
                .extract_job_data(&content, &url, &config)
                .await
                .map(|job| Envelope::ok().with("jobData", job)),
            Request::AnalyzeForm { form_html, config } => self
                .background
                .analyze_form(&form_html, &config)
                .await
                .map(|analysis| Envelope::ok().with("analysis", analysis)),
            Request::GenerateAnswer {
                field,
                job,
                resume_data,
                config,
            } => self
                .background
                .generate_answer(&field, job.as_ref(), &resume_data, &config)
                .await
                .map(|answer| Envelope::ok().with("answer", answer)),
            Request::GetUserData => self
                .background
                .get_user_data()
                .await
                .map(|user| Envelope::ok().with("user", user)),
            Request::ScrapeJobPage { .. } | Request::AutoFillForm => {
                return Envelope::err(UNKNOWN_ACTION);
            }
        };

        if let Err(e) = &result {
            warn!("Background action {} failed: {:#}", action, e);
        }
        result.into()
    }
}
