// src/bridge/popup.rs
use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use super::background::Background;
use super::content::ContentScript;
use super::messages::{Envelope, Request};
use crate::client::ApiError;
use crate::config::ProviderConfig;
use crate::page::PageDocument;
use crate::store::{ExtensionStore, StoredJob};
use crate::types::response::User;

#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Authenticated(User),
    Expired,
    Unauthenticated,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    pub fn describe(&self) -> &'static str {
        match self {
            AuthState::Authenticated(_) => "✅ Connected to web app",
            AuthState::Expired | AuthState::Unauthenticated => "❌ Not connected to web app",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format("%H:%M:%S"), self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Ready,
    Warning,
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub text: String,
    pub kind: StatusKind,
}

/// Popup session: auth state, user-triggered actions and their log
pub struct Popup {
    background: Arc<dyn Background>,
    store: ExtensionStore,
    provider_defaults: ProviderConfig,
    logs: Vec<LogEntry>,
    status: Status,
}

impl Popup {
    pub fn new(background: Arc<dyn Background>, store: ExtensionStore) -> Self {
        Self {
            background,
            store,
            provider_defaults: ProviderConfig::default(),
            logs: Vec::new(),
            status: Status {
                text: "Checking authentication...".to_string(),
                kind: StatusKind::Ready,
            },
        }
    }

    pub fn with_provider_defaults(mut self, provider: ProviderConfig) -> Self {
        self.provider_defaults = provider;
        self
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn clear_logs(&mut self) {
        self.logs.clear();
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    fn log(&mut self, message: impl Into<String>, level: LogLevel) {
        let message = message.into();
        match level {
            LogLevel::Info | LogLevel::Success => info!("{}", message),
            LogLevel::Warning => warn!("{}", message),
            LogLevel::Error => error!("{}", message),
        }
        self.logs.push(LogEntry {
            timestamp: Utc::now(),
            level,
            message,
        });
    }

    fn update_status(&mut self, text: &str, kind: StatusKind) {
        self.status = Status {
            text: text.to_string(),
            kind,
        };
    }

    fn show_auth_state(&mut self, state: &AuthState) {
        if state.is_authenticated() {
            self.update_status("Ready to auto-fill forms", StatusKind::Ready);
        } else {
            self.update_status("Please log in to web app first", StatusKind::Ready);
        }
    }

    /// Probe the stored token against the backend.
    ///
    /// A token rejected with 401 is removed from storage.
    pub async fn check_auth_status(&mut self) -> AuthState {
        let state = match self.store.auth_token().await {
            Ok(Some(_)) => match self.background.get_user_data().await {
                Ok(user) => {
                    self.log("Authenticated with web app", LogLevel::Success);
                    AuthState::Authenticated(user)
                }
                Err(e) => {
                    if ApiError::is_unauthorized(&e) {
                        if let Err(clear_err) = self.store.clear_auth_token().await {
                            warn!("Failed to clear expired token: {:#}", clear_err);
                        }
                    }
                    self.log("Authentication expired", LogLevel::Warning);
                    AuthState::Expired
                }
            },
            Ok(None) => {
                self.log("Not authenticated", LogLevel::Info);
                AuthState::Unauthenticated
            }
            Err(e) => {
                self.log(
                    format!("Error checking authentication: {:#}", e),
                    LogLevel::Error,
                );
                AuthState::Unauthenticated
            }
        };
        self.show_auth_state(&state);
        state
    }

    pub async fn logout(&mut self) -> Result<()> {
        match self.store.clear_auth_token().await {
            Ok(()) => {
                self.show_auth_state(&AuthState::Unauthenticated);
                self.log("Logged out successfully", LogLevel::Info);
                Ok(())
            }
            Err(e) => {
                self.log(format!("Error logging out: {:#}", e), LogLevel::Error);
                Err(e)
            }
        }
    }

    /// Scrape the current page. Requires a provider API key.
    pub async fn scrape_current_page(
        &mut self,
        content: &ContentScript,
        page: &PageDocument,
    ) -> Envelope {
        self.update_status("Scraping...", StatusKind::Warning);

        let config = match self.store.provider_config(&self.provider_defaults).await {
            Ok(config) => config,
            Err(e) => {
                self.log(format!("Error scraping page: {:#}", e), LogLevel::Error);
                self.update_status("Error", StatusKind::Error);
                return Envelope::err(format!("{:#}", e));
            }
        };
        if !config.has_api_key() {
            self.log("Please configure your API key first", LogLevel::Error);
            self.update_status("API Key Required", StatusKind::Error);
            return Envelope::err("API key required");
        }

        let response = content
            .handle(page, Request::ScrapeJobPage { config })
            .await;
        if response.success {
            self.log("Job page scraped successfully", LogLevel::Success);
            self.update_status("Scraped", StatusKind::Success);
        } else {
            self.log(
                format!("Failed to scrape job page: {}", response.error_message()),
                LogLevel::Error,
            );
            self.update_status("Scrape Failed", StatusKind::Error);
        }
        response
    }

    /// Ask the content script to fill the page's form. Requires a stored token.
    pub async fn auto_fill_current_form(
        &mut self,
        content: &ContentScript,
        page: &PageDocument,
    ) -> Envelope {
        self.update_status("Filling Form...", StatusKind::Warning);

        match self.store.auth_token().await {
            Ok(Some(_)) => {}
            Ok(None) => {
                self.log("Please log in to the web app first", LogLevel::Warning);
                self.update_status("Authentication Required", StatusKind::Warning);
                return Envelope::err("Authentication required");
            }
            Err(e) => {
                self.log(format!("Error filling form: {:#}", e), LogLevel::Error);
                self.update_status("Error", StatusKind::Error);
                return Envelope::err(format!("{:#}", e));
            }
        }

        let response = content.handle(page, Request::AutoFillForm).await;
        if response.success {
            let message = response
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or_default()
                .to_string();
            self.log(
                format!("Form filled successfully: {}", message),
                LogLevel::Success,
            );
            self.update_status("Form Filled", StatusKind::Success);
        } else {
            self.log(
                format!("Failed to fill form: {}", response.error_message()),
                LogLevel::Error,
            );
            self.update_status("Fill Failed", StatusKind::Error);
        }
        response
    }

    pub async fn stored_jobs(&mut self) -> Vec<StoredJob> {
        match self.store.stored_jobs().await {
            Ok(jobs) => jobs,
            Err(e) => {
                self.log(format!("Error loading stored jobs: {:#}", e), LogLevel::Error);
                Vec::new()
            }
        }
    }

    pub async fn clear_stored_jobs(&mut self) {
        match self.store.clear_jobs().await {
            Ok(()) => self.log("All stored jobs cleared", LogLevel::Info),
            Err(e) => self.log(format!("Error clearing jobs: {:#}", e), LogLevel::Error),
        }
    }
}
