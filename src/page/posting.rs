// src/page/posting.rs
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::utils::{collapse_whitespace, truncate_chars};

pub const MAX_DESCRIPTION_CHARS: usize = 2_000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
}

/// Best-effort summary of a job posting page.
///
/// Known job-board layouts are tried first, then generic class-name
/// heuristics. Missing parts are left empty.
pub fn summarize(document: &Html) -> JobSummary {
    let title = find_text_by_selectors(
        document,
        &[
            "h1.top-card-layout__title",
            ".job-details-jobs-unified-top-card__job-title",
            "h1[data-test-id='job-title']",
            ".jobs-unified-top-card__job-title",
            "h1",
            "[class*='job-title']",
            "[class*='position']",
        ],
    )
    .unwrap_or_else(|| page_title(document));

    let company = find_text_by_selectors(
        document,
        &[
            ".job-details-jobs-unified-top-card__company-name",
            "a[data-test-id='job-poster-name']",
            ".jobs-unified-top-card__company-name",
            "[class*='company']",
            "[class*='employer']",
            "[class*='organization']",
        ],
    )
    .unwrap_or_default();

    let location = find_text_by_selectors(
        document,
        &[
            ".job-details-jobs-unified-top-card__bullet",
            "[data-test-id='job-location']",
            ".jobs-unified-top-card__bullet",
            "[class*='location']",
        ],
    )
    .unwrap_or_default();

    JobSummary {
        title,
        company,
        location,
        description: job_description(document),
    }
}

/// Description text of a posting, capped at [`MAX_DESCRIPTION_CHARS`].
///
/// Falls back to the meta description and then the page title.
pub fn job_description(document: &Html) -> String {
    let selectors = [
        ".job-description",
        ".job-details",
        ".description",
        ".content",
        "[data-testid*='description']",
        "[class*='description']",
        "[class*='content']",
    ];

    let mut description = String::new();
    for css in selectors {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            description = collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "));
            if description.chars().count() > 100 {
                break;
            }
        }
    }

    if description.is_empty() {
        debug!("No description block, falling back to meta description");
        description = Selector::parse("meta[name='description']")
            .ok()
            .and_then(|selector| document.select(&selector).next())
            .and_then(|meta| meta.value().attr("content"))
            .map(collapse_whitespace)
            .unwrap_or_default();
    }
    if description.is_empty() {
        description = page_title(document);
    }

    truncate_chars(&description, MAX_DESCRIPTION_CHARS)
}

pub fn page_title(document: &Html) -> String {
    Selector::parse("title")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .map(|title| collapse_whitespace(&title.text().collect::<String>()))
        .unwrap_or_default()
}

fn find_text_by_selectors(document: &Html, selectors: &[&str]) -> Option<String> {
    for selector_str in selectors {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = document.select(&selector).next() {
                let text = collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "));
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    None
}
