// src/bridge/content.rs
//! Content-script side of the bridge: runs against the page itself.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::background::Background;
use super::messages::{Envelope, Request, WindowMessage, UNKNOWN_ACTION};
use crate::config::ProviderConfig;
use crate::form::{
    resolve_field_name, scrape_form_fields, AutofillData, FieldDescriptor, FillOutcome,
    FormFiller, FormSurface, HtmlForm,
};
use crate::page::{PageDocument, PageKind, BADGE_DURATION, MAX_CONTENT_CHARS};
use crate::store::{ExtensionStore, StoredJob};

pub const SCRAPE_CONSENT_REQUIRED: &str = "User consent required for scraping";
pub const FILL_CONSENT_REQUIRED: &str = "User consent required for form filling";
pub const NO_CONTENT: &str = "No content found on page";
pub const NO_FORMS: &str = "No forms found on page";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentAction {
    Scrape,
    Fill,
}

impl ConsentAction {
    pub fn prompt(self) -> &'static str {
        match self {
            ConsentAction::Scrape => {
                "This extension wants to scrape job information from this page. Continue?"
            }
            ConsentAction::Fill => {
                "This extension wants to auto-fill the form on this page. Continue?"
            }
        }
    }
}

/// Asks the user before the page is read or written
pub trait Consent: Send + Sync {
    fn confirm(&self, action: ConsentAction) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysConsent;

impl Consent for AlwaysConsent {
    fn confirm(&self, _action: ConsentAction) -> bool {
        true
    }
}

/// On-page indicator for a classified page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBadge {
    pub kind: PageKind,
    pub text: &'static str,
    pub duration: Duration,
}

pub struct ContentScript {
    background: Arc<dyn Background>,
    store: ExtensionStore,
    consent: Box<dyn Consent>,
    filler: FormFiller,
    content_limit: usize,
    highlight_duration: Option<Duration>,
}

impl ContentScript {
    pub fn new(background: Arc<dyn Background>, store: ExtensionStore) -> Self {
        Self {
            background,
            store,
            consent: Box::new(AlwaysConsent),
            filler: FormFiller::new(),
            content_limit: MAX_CONTENT_CHARS,
            highlight_duration: None,
        }
    }

    pub fn with_consent(mut self, consent: Box<dyn Consent>) -> Self {
        self.consent = consent;
        self
    }

    /// Lower the page text cap. Values above [`MAX_CONTENT_CHARS`] are clamped.
    pub fn with_content_limit(mut self, limit: usize) -> Self {
        self.content_limit = limit.min(MAX_CONTENT_CHARS);
        self
    }

    pub fn with_highlight_duration(mut self, duration: Duration) -> Self {
        self.highlight_duration = Some(duration);
        self
    }

    pub fn store(&self) -> &ExtensionStore {
        &self.store
    }

    /// Classify the page and return the badge to show, if any
    pub fn detect_page(&self, page: &PageDocument) -> Option<PageBadge> {
        let kind = page.kind();
        debug!("Page {} classified as {:?}", page.url(), kind);
        kind.badge_text().map(|text| PageBadge {
            kind,
            text,
            duration: BADGE_DURATION,
        })
    }

    pub async fn handle_value(&self, page: &PageDocument, message: Value) -> Envelope {
        match Request::from_value(message) {
            Some(request) => self.handle(page, request).await,
            None => Envelope::err(UNKNOWN_ACTION),
        }
    }

    pub async fn handle(&self, page: &PageDocument, request: Request) -> Envelope {
        match request {
            Request::ScrapeJobPage { config } => self.scrape_job_page(page, &config).await,
            Request::AutoFillForm => self.auto_fill_form(page).await,
            other => {
                warn!("Content script cannot handle {}", other.action());
                Envelope::err(UNKNOWN_ACTION)
            }
        }
    }

    /// Send the page text to the background for extraction and keep the result
    pub async fn scrape_job_page(&self, page: &PageDocument, config: &ProviderConfig) -> Envelope {
        if !self.consent.confirm(ConsentAction::Scrape) {
            info!("Scrape declined by user");
            return Envelope::err(SCRAPE_CONSENT_REQUIRED);
        }

        let content = page.content(self.content_limit);
        if content.is_empty() {
            return Envelope::err(NO_CONTENT);
        }
        let url = page.url().to_string();

        let job_data = match self
            .background
            .extract_job_data(&content, &url, config)
            .await
        {
            Ok(job_data) => job_data,
            Err(e) => {
                warn!("Job extraction failed: {:#}", e);
                return Envelope::err(format!("{:#}", e));
            }
        };

        let stored = StoredJob::new(job_data.clone(), &url, Utc::now());
        match self.store.push_job(stored).await {
            Ok(jobs) => info!("Stored job from {} ({} kept)", url, jobs.len()),
            Err(e) => warn!("Failed to store job data: {:#}", e),
        }

        Envelope::ok().with("jobData", job_data)
    }

    pub async fn auto_fill_form(&self, page: &PageDocument) -> Envelope {
        match self.fill_first_form(page).await {
            Ok((_, outcome)) => Envelope::ok()
                .with("filled", outcome.filled_count)
                .with("errors", &outcome.errors)
                .with("skipped", &outcome.skipped)
                .with("message", outcome.message()),
            Err(e) => Envelope::err(e.to_string()),
        }
    }

    /// Fill the first form of the page with backend-generated data.
    ///
    /// Descriptors of every form are sent to the backend. A missing token or
    /// a backend failure falls back to empty data.
    pub async fn fill_first_form(&self, page: &PageDocument) -> Result<(HtmlForm, FillOutcome)> {
        if !self.consent.confirm(ConsentAction::Fill) {
            info!("Autofill declined by user");
            anyhow::bail!(FILL_CONSENT_REQUIRED);
        }

        let mut forms = self.page_forms(page);
        if forms.is_empty() {
            anyhow::bail!(NO_FORMS);
        }

        let fields = scrape_form_fields(&forms);
        let data = self.autofill_data(&fields).await;

        let mut form = forms.swap_remove(0);
        let outcome = self.filler.fill(&mut form, &data);
        Ok((form, outcome))
    }

    async fn autofill_data(&self, fields: &[FieldDescriptor]) -> AutofillData {
        let token = match self.store.auth_token().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                info!("No auth token found, filling without generated data");
                return AutofillData::new();
            }
            Err(e) => {
                warn!("Failed to read auth token: {:#}", e);
                return AutofillData::new();
            }
        };

        match self.background.generate_autofill(&token, fields).await {
            Ok(data) => data,
            Err(e) => {
                warn!("Failed to get autofill data: {:#}", e);
                AutofillData::new()
            }
        }
    }

    /// Relay a form's markup to the background for analysis
    pub async fn analyze_form(&self, form: &HtmlForm, config: &ProviderConfig) -> Envelope {
        let result = self
            .background
            .analyze_form(form.outer_html(), config)
            .await
            .map(|analysis| Envelope::ok().with("analysis", analysis));
        result.into()
    }

    /// Ask the background for one answer per field, then fill the first form
    /// with them. Uses the most recently stored job as context.
    pub async fn generate_and_fill(
        &self,
        page: &PageDocument,
        resume_data: &Value,
        config: &ProviderConfig,
    ) -> Envelope {
        let mut forms = self.page_forms(page);
        if forms.is_empty() {
            return Envelope::err(NO_FORMS);
        }
        let mut form = forms.swap_remove(0);

        let job = match self.store.stored_jobs().await {
            Ok(jobs) => jobs
                .into_iter()
                .next()
                .and_then(|job| serde_json::to_value(job).ok()),
            Err(e) => {
                warn!("Failed to read stored jobs: {:#}", e);
                None
            }
        };

        let controls = form.controls().to_vec();
        let total_fields = controls.len();
        let mut answers = AutofillData::new();

        for (index, control) in controls.iter().enumerate() {
            if control.kind().is_ignored() {
                continue;
            }
            let descriptor = FieldDescriptor::from_control(control, form.form_index(), index);
            let answer = match self
                .background
                .generate_answer(&descriptor, job.as_ref(), resume_data, config)
                .await
            {
                Ok(answer) => answer,
                Err(e) => {
                    warn!("No answer for {}: {:#}", descriptor.name, e);
                    continue;
                }
            };
            if answer.is_empty() {
                continue;
            }
            let resolved = resolve_field_name(control);
            let key = if resolved.is_empty() {
                descriptor.name
            } else {
                resolved
            };
            answers.insert(key, answer);
        }

        let outcome = self.filler.fill(&mut form, &answers);
        Envelope::ok()
            .with("filledCount", outcome.filled_count)
            .with("totalFields", total_fields)
    }

    /// Persist a token broadcast by the web app. Other messages are ignored.
    pub async fn on_window_message(&self, message: &Value) -> Result<bool> {
        match WindowMessage::from_value(message) {
            Some(WindowMessage::AuthTokenUpdate { token }) => {
                self.store.set_auth_token(&token).await?;
                info!("Auth token synced with extension");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn page_forms(&self, page: &PageDocument) -> Vec<HtmlForm> {
        let forms = page.forms();
        match self.highlight_duration {
            Some(duration) => forms
                .into_iter()
                .map(|form| form.with_highlight_duration(duration))
                .collect(),
            None => forms,
        }
    }
}
