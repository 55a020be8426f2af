// src/form/control.rs
//! Owned model of a form control and the capability interface the filler
//! writes through.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Email,
    Tel,
    Url,
    Password,
    Textarea,
    Select,
    Radio,
    Checkbox,
    Hidden,
    Submit,
    Button,
    Other,
}

impl FieldKind {
    /// Kind of an element from its tag name and `type` attribute
    pub fn from_element(tag: &str, input_type: Option<&str>) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "textarea" => FieldKind::Textarea,
            "select" => FieldKind::Select,
            "input" => {
                let input_type = input_type
                    .map(|t| t.trim().to_ascii_lowercase())
                    .unwrap_or_default();
                match input_type.as_str() {
                    // a missing or empty type attribute means text
                    "" | "text" => FieldKind::Text,
                    "email" => FieldKind::Email,
                    "tel" => FieldKind::Tel,
                    "url" => FieldKind::Url,
                    "password" => FieldKind::Password,
                    "radio" => FieldKind::Radio,
                    "checkbox" => FieldKind::Checkbox,
                    "hidden" => FieldKind::Hidden,
                    "submit" => FieldKind::Submit,
                    "button" | "reset" | "image" => FieldKind::Button,
                    _ => FieldKind::Other,
                }
            }
            _ => FieldKind::Other,
        }
    }

    pub fn is_text_like(self) -> bool {
        matches!(
            self,
            FieldKind::Text
                | FieldKind::Email
                | FieldKind::Tel
                | FieldKind::Url
                | FieldKind::Password
                | FieldKind::Textarea
        )
    }

    /// Kinds the filler never writes
    pub fn is_ignored(self) -> bool {
        matches!(self, FieldKind::Hidden | FieldKind::Submit | FieldKind::Button)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Email => "email",
            FieldKind::Tel => "tel",
            FieldKind::Url => "url",
            FieldKind::Password => "password",
            FieldKind::Textarea => "textarea",
            FieldKind::Select => "select",
            FieldKind::Radio => "radio",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Hidden => "hidden",
            FieldKind::Submit => "submit",
            FieldKind::Button => "button",
            FieldKind::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
}

/// One `input`, `textarea` or `select` as it was found on the page.
///
/// `label` holds the already-resolved label text; the DOM context needed to
/// find it is gone once the control is extracted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormControl {
    pub tag: String,
    pub input_type: Option<String>,
    pub name: String,
    pub id: String,
    pub placeholder: String,
    pub test_id: String,
    pub aria_label: String,
    pub label: String,
    pub required: bool,
    pub value: String,
    pub checked: bool,
    pub options: Vec<SelectOption>,
    pub border: Option<String>,
}

impl FormControl {
    pub fn input(input_type: &str) -> Self {
        Self {
            tag: "input".to_string(),
            input_type: Some(input_type.to_string()),
            ..Self::default()
        }
    }

    pub fn textarea() -> Self {
        Self {
            tag: "textarea".to_string(),
            ..Self::default()
        }
    }

    pub fn select(options: Vec<SelectOption>) -> Self {
        let value = options.first().map(|o| o.value.clone()).unwrap_or_default();
        Self {
            tag: "select".to_string(),
            value,
            options,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = placeholder.to_string();
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    pub fn kind(&self) -> FieldKind {
        FieldKind::from_element(&self.tag, self.input_type.as_deref())
    }
}

/// Notification sent to listeners bound to a control after its state moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    Input,
    Change,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum FillError {
    #[error("element {0} is no longer attached to the document")]
    Detached(usize),
    #[error("no element at position {0}")]
    OutOfRange(usize),
    #[error("select has no option with value '{0}'")]
    UnknownOption(String),
    #[error("{0}")]
    Rejected(String),
}

/// Capability interface over a form: read the controls, write their state,
/// and notify listeners. Implemented by [`crate::form::HtmlForm`] for parsed
/// pages and by test doubles.
pub trait FormSurface {
    fn controls(&self) -> &[FormControl];

    fn set_value(&mut self, index: usize, value: &str) -> Result<(), FillError>;

    fn set_checked(&mut self, index: usize, checked: bool) -> Result<(), FillError>;

    fn notify_changed(&mut self, index: usize, event: ChangeEvent) -> Result<(), FillError>;

    /// Visual confirmation only. Surfaces without a visual side may ignore it.
    fn highlight(&mut self, _index: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_element() {
        assert_eq!(FieldKind::from_element("INPUT", None), FieldKind::Text);
        assert_eq!(FieldKind::from_element("input", Some("")), FieldKind::Text);
        assert_eq!(FieldKind::from_element("input", Some("E-mail")), FieldKind::Other);
        assert_eq!(FieldKind::from_element("input", Some("EMAIL")), FieldKind::Email);
        assert_eq!(FieldKind::from_element("input", Some("reset")), FieldKind::Button);
        assert_eq!(FieldKind::from_element("input", Some("date")), FieldKind::Other);
        assert_eq!(FieldKind::from_element("textarea", None), FieldKind::Textarea);
        assert_eq!(FieldKind::from_element("select", None), FieldKind::Select);
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        let json = serde_json::to_string(&FieldKind::Textarea).unwrap();
        assert_eq!(json, "\"textarea\"");
    }

    #[test]
    fn test_select_defaults_to_first_option() {
        let select = FormControl::select(vec![
            SelectOption { value: "us".into(), text: "United States".into() },
            SelectOption { value: "fr".into(), text: "France".into() },
        ]);
        assert_eq!(select.value, "us");
        assert_eq!(select.kind(), FieldKind::Select);
    }
}
