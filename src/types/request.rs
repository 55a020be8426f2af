use serde::{Deserialize, Serialize};

use crate::form::FieldDescriptor;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,
}

impl Credentials {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            payment_intent_id: None,
        }
    }

    pub fn with_payment_intent(mut self, payment_intent_id: Option<String>) -> Self {
        self.payment_intent_id = payment_intent_id;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AutofillRequest<'a> {
    pub form_fields: &'a [FieldDescriptor],
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntentRequest {
    pub amount: u64,
}
