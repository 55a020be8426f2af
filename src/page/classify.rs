// src/page/classify.rs
use std::time::Duration;

use serde::{Deserialize, Serialize};

const JOB_TITLE_KEYWORDS: &[&str] = &["job", "career", "position", "opening", "hiring", "employment"];
const JOB_URL_KEYWORDS: &[&str] = &["jobs", "careers", "positions", "hiring"];
const FORM_KEYWORDS: &[&str] = &["apply", "application", "submit", "form"];

/// How long the on-page badge stays visible
pub const BADGE_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageKind {
    JobListing,
    ApplicationForm,
    None,
}

impl PageKind {
    pub fn badge_text(self) -> Option<&'static str> {
        match self {
            PageKind::JobListing => Some("📄 Job Page Detected"),
            PageKind::ApplicationForm => Some("✏️ Application Form Detected"),
            PageKind::None => None,
        }
    }
}

/// Tag a page from its url, title and whether it contains a form.
/// A job listing match wins over an application form match.
pub fn classify(url: &str, title: &str, has_form: bool) -> PageKind {
    let url = url.to_lowercase();
    let title = title.to_lowercase();

    let is_listing = JOB_TITLE_KEYWORDS.iter().any(|k| title.contains(k))
        || JOB_URL_KEYWORDS.iter().any(|k| url.contains(k));
    if is_listing {
        return PageKind::JobListing;
    }

    let is_application = FORM_KEYWORDS
        .iter()
        .any(|k| title.contains(k) || url.contains(k));
    if is_application && has_form {
        return PageKind::ApplicationForm;
    }

    PageKind::None
}
