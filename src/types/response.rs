use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::form::AutofillData;

// ===== Auth =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub payment_completed: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "user".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub client_secret: String,
    pub payment_intent_id: String,
}

// ===== Autofill / onboarding =====

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutofillResponse {
    #[serde(default)]
    pub autofill_data: AutofillData,
}

/// `{success, data | message | error}` wrapper used by the onboarding and CV routes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiEnvelope {
    /// Payload of a successful envelope, or the backend's error message
    pub fn into_data(self) -> anyhow::Result<Value> {
        if self.success {
            Ok(self.data.unwrap_or(Value::Object(Map::new())))
        } else {
            anyhow::bail!(
                "{}",
                self.error.unwrap_or_else(|| "Request failed".to_string())
            )
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminStats {
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub admin_users: u64,
    #[serde(default)]
    pub paid_users: u64,
    #[serde(default)]
    pub users_with_onboarding: u64,
    #[serde(default)]
    pub recent_users: u64,
}
