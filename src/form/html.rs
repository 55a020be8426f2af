// src/form/html.rs
use std::time::{Duration, Instant};

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::control::{ChangeEvent, FieldKind, FillError, FormControl, FormSurface, SelectOption};
use super::label::{label_for, visible_text};
use crate::utils::collapse_whitespace;

pub const CONTROL_SELECTOR: &str = "input, textarea, select";
pub const HIGHLIGHT_BORDER: &str = "2px solid #10b981";
pub const HIGHLIGHT_DURATION: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone)]
struct ActiveHighlight {
    index: usize,
    previous_border: Option<String>,
    expires_at: Instant,
}

/// A form taken from a parsed page, with live control state.
///
/// Writes land on the owned controls; every notification is kept in an event
/// log so callers can see what bound listeners would have observed.
#[derive(Debug, Clone)]
pub struct HtmlForm {
    form_index: usize,
    outer_html: String,
    controls: Vec<FormControl>,
    detached: Vec<bool>,
    events: Vec<(usize, ChangeEvent)>,
    highlights: Vec<ActiveHighlight>,
    highlight_duration: Duration,
}

impl HtmlForm {
    pub fn from_element(document: &Html, form: ElementRef<'_>, form_index: usize) -> Self {
        let controls = match Selector::parse(CONTROL_SELECTOR) {
            Ok(selector) => form
                .select(&selector)
                .map(|element| control_from_element(document, element))
                .collect(),
            Err(_) => Vec::new(),
        };

        Self {
            outer_html: form.html(),
            ..Self::from_controls(form_index, controls)
        }
    }

    pub fn from_controls(form_index: usize, controls: Vec<FormControl>) -> Self {
        let detached = vec![false; controls.len()];
        Self {
            form_index,
            outer_html: String::new(),
            controls,
            detached,
            events: Vec::new(),
            highlights: Vec::new(),
            highlight_duration: HIGHLIGHT_DURATION,
        }
    }

    /// Every `<form>` of a document, in document order
    pub fn parse_all(document: &Html) -> Vec<Self> {
        let Ok(selector) = Selector::parse("form") else {
            return Vec::new();
        };
        document
            .select(&selector)
            .enumerate()
            .map(|(index, form)| Self::from_element(document, form, index))
            .collect()
    }

    pub fn with_highlight_duration(mut self, duration: Duration) -> Self {
        self.highlight_duration = duration;
        self
    }

    pub fn form_index(&self) -> usize {
        self.form_index
    }

    pub fn outer_html(&self) -> &str {
        &self.outer_html
    }

    pub fn events(&self) -> &[(usize, ChangeEvent)] {
        &self.events
    }

    /// Mark a control as removed from the page; later writes to it fail.
    pub fn detach(&mut self, index: usize) {
        if let Some(flag) = self.detached.get_mut(index) {
            *flag = true;
        }
    }

    pub fn highlighted(&self) -> Vec<usize> {
        self.highlights.iter().map(|h| h.index).collect()
    }

    /// Restore the border of every highlight whose delay has passed.
    pub fn revert_expired_highlights(&mut self, now: Instant) -> usize {
        let (expired, active): (Vec<_>, Vec<_>) = self
            .highlights
            .drain(..)
            .partition(|h| h.expires_at <= now);
        self.highlights = active;

        for highlight in &expired {
            if let Some(control) = self.controls.get_mut(highlight.index) {
                control.border = highlight.previous_border.clone();
            }
        }
        expired.len()
    }

    /// Wait for every active highlight to expire, then restore the borders.
    pub async fn settle_highlights(&mut self) -> usize {
        if let Some(last) = self.highlights.iter().map(|h| h.expires_at).max() {
            tokio::time::sleep_until(last.into()).await;
        }
        self.revert_expired_highlights(Instant::now())
    }

    fn attached(&self, index: usize) -> Result<(), FillError> {
        match self.detached.get(index) {
            None => Err(FillError::OutOfRange(index)),
            Some(true) => Err(FillError::Detached(index)),
            Some(false) => Ok(()),
        }
    }
}

impl FormSurface for HtmlForm {
    fn controls(&self) -> &[FormControl] {
        &self.controls
    }

    fn set_value(&mut self, index: usize, value: &str) -> Result<(), FillError> {
        self.attached(index)?;
        let control = &mut self.controls[index];
        if control.tag == "select" && !control.options.iter().any(|o| o.value == value) {
            return Err(FillError::UnknownOption(value.to_string()));
        }
        control.value = value.to_string();
        Ok(())
    }

    fn set_checked(&mut self, index: usize, checked: bool) -> Result<(), FillError> {
        self.attached(index)?;
        let group = {
            let control = &self.controls[index];
            (control.kind() == FieldKind::Radio && !control.name.is_empty())
                .then(|| control.name.clone())
        };
        if let (Some(group), true) = (group, checked) {
            for other in self.controls.iter_mut() {
                if other.kind() == FieldKind::Radio && other.name == group {
                    other.checked = false;
                }
            }
        }
        self.controls[index].checked = checked;
        Ok(())
    }

    fn notify_changed(&mut self, index: usize, event: ChangeEvent) -> Result<(), FillError> {
        self.attached(index)?;
        self.events.push((index, event));
        Ok(())
    }

    fn highlight(&mut self, index: usize) {
        if self.attached(index).is_err() {
            return;
        }
        let expires_at = Instant::now() + self.highlight_duration;
        if let Some(existing) = self.highlights.iter_mut().find(|h| h.index == index) {
            existing.expires_at = expires_at;
            return;
        }
        let control = &mut self.controls[index];
        self.highlights.push(ActiveHighlight {
            index,
            previous_border: control.border.take(),
            expires_at,
        });
        control.border = Some(HIGHLIGHT_BORDER.to_string());
        debug!("Highlighted control {} of form {}", index, self.form_index);
    }
}

fn control_from_element(document: &Html, element: ElementRef<'_>) -> FormControl {
    let node = element.value();
    let attr = |name: &str| node.attr(name).unwrap_or("").to_string();
    let tag = node.name().to_ascii_lowercase();

    let options = if tag == "select" {
        select_options(element)
    } else {
        Vec::new()
    };

    let value = match tag.as_str() {
        "textarea" => element.text().collect::<String>(),
        "select" => selected_option(element, &options),
        _ => attr("value"),
    };

    FormControl {
        input_type: node.attr("type").map(str::to_string),
        name: attr("name"),
        id: attr("id"),
        placeholder: attr("placeholder"),
        test_id: attr("data-testid"),
        aria_label: attr("aria-label"),
        label: label_for(document, element),
        required: node.attr("required").is_some(),
        value,
        checked: node.attr("checked").is_some(),
        options,
        border: node.attr("style").and_then(border_from_style),
        tag,
    }
}

fn select_options(select: ElementRef<'_>) -> Vec<SelectOption> {
    let Ok(selector) = Selector::parse("option") else {
        return Vec::new();
    };
    select
        .select(&selector)
        .map(|option| {
            let text = visible_text(option);
            let value = option
                .value()
                .attr("value")
                .map(str::to_string)
                .unwrap_or_else(|| text.clone());
            SelectOption { value, text }
        })
        .collect()
}

fn selected_option(select: ElementRef<'_>, options: &[SelectOption]) -> String {
    let explicit = Selector::parse("option[selected]").ok().and_then(|selector| {
        select.select(&selector).next().map(|option| {
            option
                .value()
                .attr("value")
                .map(str::to_string)
                .unwrap_or_else(|| visible_text(option))
        })
    });
    explicit
        .or_else(|| options.first().map(|o| o.value.clone()))
        .unwrap_or_default()
}

fn border_from_style(style: &str) -> Option<String> {
    style.split(';').find_map(|declaration| {
        let (property, value) = declaration.split_once(':')?;
        (property.trim().eq_ignore_ascii_case("border"))
            .then(|| collapse_whitespace(value))
    })
}
