// src/form/extract.rs
use serde::{Deserialize, Serialize};

use super::control::{FieldKind, FormControl, FormSurface};
use super::html::HtmlForm;

/// Normalized description of one form input, as sent to the autofill backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub placeholder: String,
    pub label: String,
    pub required: bool,
    pub form_index: usize,
    pub input_index: usize,
}

impl FieldDescriptor {
    pub fn from_control(control: &FormControl, form_index: usize, input_index: usize) -> Self {
        let name = [&control.name, &control.id]
            .into_iter()
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("field_{}", input_index));

        Self {
            name,
            kind: control.kind(),
            placeholder: control.placeholder.clone(),
            label: control.label.clone(),
            required: control.required,
            form_index,
            input_index,
        }
    }
}

/// Descriptors for every control of one form, in document order
pub fn extract_fields(controls: &[FormControl], form_index: usize) -> Vec<FieldDescriptor> {
    controls
        .iter()
        .enumerate()
        .map(|(input_index, control)| FieldDescriptor::from_control(control, form_index, input_index))
        .collect()
}

/// Descriptors for all forms of a page
pub fn scrape_form_fields(forms: &[HtmlForm]) -> Vec<FieldDescriptor> {
    forms
        .iter()
        .flat_map(|form| extract_fields(form.controls(), form.form_index()))
        .collect()
}
