// src/form/label.rs
use scraper::{ElementRef, Html, Selector};

use crate::utils::collapse_whitespace;

/// Visible label text for a form control.
///
/// Checked in order: a `<label for=...>` naming the control's id, the nearest
/// enclosing `<label>`, then the text of the preceding element sibling.
pub fn label_for(document: &Html, element: ElementRef<'_>) -> String {
    let id = element.value().attr("id").unwrap_or("").trim();
    if !id.is_empty() {
        if let Some(text) = label_by_for(document, id) {
            return text;
        }
    }

    let enclosing = element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == "label");
    if let Some(label) = enclosing {
        let text = visible_text(label);
        if !text.is_empty() {
            return text;
        }
    }

    if let Some(previous) = element.prev_siblings().find_map(ElementRef::wrap) {
        let text = visible_text(previous);
        if !text.is_empty() {
            return text;
        }
    }

    String::new()
}

fn label_by_for(document: &Html, id: &str) -> Option<String> {
    let selector = Selector::parse("label[for]").ok()?;
    document
        .select(&selector)
        .find(|label| label.value().attr("for").map(str::trim) == Some(id))
        .map(visible_text)
        .filter(|text| !text.is_empty())
}

/// Text of an element without the option lists and values of nested controls
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    push_text(element, &mut out);
    collapse_whitespace(&out)
}

fn push_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            if matches!(child_element.value().name(), "select" | "textarea" | "script" | "style") {
                continue;
            }
            push_text(child_element, out);
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        }
    }
}
