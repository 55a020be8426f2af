#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use job_autofill::bridge::Background;
use job_autofill::client::ApiError;
use job_autofill::config::ProviderConfig;
use job_autofill::form::{ChangeEvent, FillError, FormControl, FormSurface};
use job_autofill::types::response::User;
use job_autofill::{AutofillData, FieldDescriptor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SetValue(usize, String),
    SetChecked(usize, bool),
    Notify(usize, ChangeEvent),
    Highlight(usize),
}

/// In-memory form that records every write and can fail on chosen controls
pub struct RecordingSurface {
    pub controls: Vec<FormControl>,
    pub calls: Vec<Call>,
    failures: HashMap<usize, FillError>,
}

impl RecordingSurface {
    pub fn new(controls: Vec<FormControl>) -> Self {
        Self {
            controls,
            calls: Vec::new(),
            failures: HashMap::new(),
        }
    }

    pub fn failing_at(mut self, index: usize, error: FillError) -> Self {
        self.failures.insert(index, error);
        self
    }

    pub fn value(&self, index: usize) -> &str {
        &self.controls[index].value
    }

    pub fn checked(&self, index: usize) -> bool {
        self.controls[index].checked
    }

    fn check(&self, index: usize) -> Result<(), FillError> {
        match self.failures.get(&index) {
            Some(error) => Err(error.clone()),
            None if index >= self.controls.len() => Err(FillError::OutOfRange(index)),
            None => Ok(()),
        }
    }
}

impl FormSurface for RecordingSurface {
    fn controls(&self) -> &[FormControl] {
        &self.controls
    }

    fn set_value(&mut self, index: usize, value: &str) -> Result<(), FillError> {
        self.check(index)?;
        self.controls[index].value = value.to_string();
        self.calls.push(Call::SetValue(index, value.to_string()));
        Ok(())
    }

    fn set_checked(&mut self, index: usize, checked: bool) -> Result<(), FillError> {
        self.check(index)?;
        self.controls[index].checked = checked;
        self.calls.push(Call::SetChecked(index, checked));
        Ok(())
    }

    fn notify_changed(&mut self, index: usize, event: ChangeEvent) -> Result<(), FillError> {
        self.check(index)?;
        self.calls.push(Call::Notify(index, event));
        Ok(())
    }

    fn highlight(&mut self, index: usize) {
        self.calls.push(Call::Highlight(index));
    }
}

pub fn autofill(pairs: &[(&str, &str)]) -> AutofillData {
    pairs.iter().map(|(k, v)| (*k, *v)).collect()
}

/// How the fake answers `getUserData`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserReply {
    Valid,
    Unauthorized,
    Unreachable,
}

/// Background double with canned replies and a log of received calls
pub struct FakeBackground {
    pub autofill: Mutex<Option<AutofillData>>,
    pub job: Value,
    pub user: UserReply,
    pub answers: HashMap<String, String>,
    pub calls: Mutex<Vec<String>>,
}

impl Default for FakeBackground {
    fn default() -> Self {
        Self {
            autofill: Mutex::new(Some(AutofillData::new())),
            job: json!({"title": "Rust Engineer", "company": "Acme"}),
            user: UserReply::Valid,
            answers: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeBackground {
    pub fn with_autofill(data: AutofillData) -> Self {
        Self {
            autofill: Mutex::new(Some(data)),
            ..Self::default()
        }
    }

    /// Every autofill request fails
    pub fn failing_autofill() -> Self {
        Self {
            autofill: Mutex::new(None),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Background for FakeBackground {
    async fn extract_job_data(
        &self,
        content: &str,
        url: &str,
        _config: &ProviderConfig,
    ) -> Result<Value> {
        self.record(format!("extractJobData {} {}", url, content.len()));
        Ok(self.job.clone())
    }

    async fn analyze_form(&self, form_html: &str, _config: &ProviderConfig) -> Result<Value> {
        self.record("analyzeForm".to_string());
        Ok(json!({"length": form_html.len()}))
    }

    async fn generate_answer(
        &self,
        field: &FieldDescriptor,
        job: Option<&Value>,
        _resume_data: &Value,
        _config: &ProviderConfig,
    ) -> Result<String> {
        let job_title = job
            .and_then(|j| j.get("title"))
            .and_then(Value::as_str)
            .unwrap_or("-");
        self.record(format!("generateAnswer {} {}", field.name, job_title));
        match self.answers.get(&field.name) {
            Some(answer) => Ok(answer.clone()),
            None => anyhow::bail!("no answer for {}", field.name),
        }
    }

    async fn get_user_data(&self) -> Result<User> {
        self.record("getUserData".to_string());
        match self.user {
            UserReply::Valid => Ok(User {
                id: "u1".into(),
                email: "jane@example.com".into(),
                created_at: None,
                payment_completed: true,
                is_admin: false,
                role: "user".into(),
            }),
            UserReply::Unauthorized => Err(ApiError::Unauthorized("Token has expired".into()).into()),
            UserReply::Unreachable => anyhow::bail!("connection refused"),
        }
    }

    async fn generate_autofill(
        &self,
        token: &str,
        fields: &[FieldDescriptor],
    ) -> Result<AutofillData> {
        self.record(format!("generateAutofill {} {}", token, fields.len()));
        match self.autofill.lock().unwrap().clone() {
            Some(data) => Ok(data),
            None => anyhow::bail!("backend unavailable"),
        }
    }
}
