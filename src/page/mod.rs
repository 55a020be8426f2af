// src/page/mod.rs
//! Parsed web pages: classification, content extraction and form discovery.

pub mod classify;
pub mod content;
pub mod posting;

use std::path::Path;

use anyhow::{Context, Result};
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::info;

use crate::form::HtmlForm;

pub use classify::{classify, PageKind, BADGE_DURATION};
pub use content::{extract_page_content, MAX_CONTENT_CHARS};
pub use posting::{summarize, JobSummary};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// A page as seen by the content script: its address and parsed markup.
pub struct PageDocument {
    url: String,
    html: Html,
}

impl PageDocument {
    pub fn parse(url: &str, markup: &str) -> Self {
        Self {
            url: url.to_string(),
            html: Html::parse_document(markup),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    pub fn title(&self) -> String {
        posting::page_title(&self.html)
    }

    pub fn has_form(&self) -> bool {
        Selector::parse("form")
            .map(|selector| self.html.select(&selector).next().is_some())
            .unwrap_or(false)
    }

    pub fn forms(&self) -> Vec<HtmlForm> {
        HtmlForm::parse_all(&self.html)
    }

    pub fn kind(&self) -> PageKind {
        classify(&self.url, &self.title(), self.has_form())
    }

    pub fn content(&self, max_chars: usize) -> String {
        extract_page_content(&self.html, max_chars)
    }

    pub fn summary(&self) -> JobSummary {
        summarize(&self.html)
    }
}

/// Load a page from an http(s) URL or a local HTML file
pub async fn load_page(source: &str) -> Result<PageDocument> {
    if source.starts_with("http://") || source.starts_with("https://") {
        return fetch_page(source).await;
    }

    let path = Path::new(source);
    let markup = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read page: {}", path.display()))?;
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(path)
    };

    info!("Loaded page from {}", absolute.display());
    Ok(PageDocument::parse(
        &format!("file://{}", absolute.display()),
        &markup,
    ))
}

async fn fetch_page(url: &str) -> Result<PageDocument> {
    info!("Fetching page: {}", url);

    let client = Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to create HTTP client")?;

    let response = client
        .get(url)
        .send()
        .await
        .context("Failed to fetch page")?;

    if !response.status().is_success() {
        anyhow::bail!("HTTP error: {}", response.status());
    }

    let final_url = response.url().to_string();
    let markup = response
        .text()
        .await
        .context("Failed to read response body")?;

    Ok(PageDocument::parse(&final_url, &markup))
}
