// src/bridge/messages.rs
//! Wire shapes of the messages exchanged between popup, content script and
//! background, plus the web app's token broadcast.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::ProviderConfig;
use crate::form::FieldDescriptor;

pub const UNKNOWN_ACTION: &str = "Unknown action";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    ScrapeJobPage {
        #[serde(default)]
        config: ProviderConfig,
    },
    AutoFillForm,
    ExtractJobData {
        content: String,
        url: String,
        #[serde(default)]
        config: ProviderConfig,
    },
    AnalyzeForm {
        form_html: String,
        #[serde(default)]
        config: ProviderConfig,
    },
    GenerateAnswer {
        field: FieldDescriptor,
        #[serde(default)]
        job: Option<Value>,
        #[serde(default)]
        resume_data: Value,
        #[serde(default)]
        config: ProviderConfig,
    },
    GetUserData,
}

impl Request {
    pub fn action(&self) -> &'static str {
        match self {
            Request::ScrapeJobPage { .. } => "scrapeJobPage",
            Request::AutoFillForm => "autoFillForm",
            Request::ExtractJobData { .. } => "extractJobData",
            Request::AnalyzeForm { .. } => "analyzeForm",
            Request::GenerateAnswer { .. } => "generateAnswer",
            Request::GetUserData => "getUserData",
        }
    }

    /// Parse a raw message. Unrecognised actions yield `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }
}

/// `{success, error?, ...payload}` response to every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Envelope {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            payload: Map::new(),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            payload: Map::new(),
        }
    }

    /// Add a payload entry. Values that fail to serialize become `null`.
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        self.payload.insert(
            key.to_string(),
            serde_json::to_value(value).unwrap_or(Value::Null),
        );
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("Unknown error")
    }
}

impl From<anyhow::Result<Envelope>> for Envelope {
    fn from(result: anyhow::Result<Envelope>) -> Self {
        result.unwrap_or_else(|e| Envelope::err(format!("{:#}", e)))
    }
}

/// Messages posted to the page window by the companion web app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WindowMessage {
    #[serde(rename = "AUTH_TOKEN_UPDATE")]
    AuthTokenUpdate { token: String },
}

impl WindowMessage {
    /// Any other window traffic is ignored
    pub fn from_value(value: &Value) -> Option<Self> {
        WindowMessage::deserialize(value).ok()
    }
}
