// src/page/content.rs
use scraper::node::Element;
use scraper::{ElementRef, Html, Selector};

use crate::utils::{collapse_whitespace, truncate_chars};

/// Upper bound on the text sent to the backend for summarization
pub const MAX_CONTENT_CHARS: usize = 10_000;

const STRIPPED_TAGS: &[&str] = &["script", "style", "noscript", "nav", "header", "footer"];
const STRIPPED_CLASSES: &[&str] = &["ad", "advertisement"];

const CONTENT_SELECTORS: &[&str] = &[
    "main",
    "[role='main']",
    ".content",
    ".main-content",
    ".job-description",
    ".job-details",
    ".posting",
    "article",
];

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "tr", "td", "th", "section", "article", "main", "aside",
    "h1", "h2", "h3", "h4", "h5", "h6", "dt", "dd", "blockquote", "pre", "table",
];

/// Plain-text excerpt of the main content area of a page.
///
/// Navigation, chrome, scripts and ad blocks are left out. The first content
/// area selector that matches wins. The whole body is used when no area
/// matches or the area holds no text. The result is whitespace-collapsed and
/// capped at `max_chars`, never more than [`MAX_CONTENT_CHARS`].
pub fn extract_page_content(document: &Html, max_chars: usize) -> String {
    let max_chars = max_chars.min(MAX_CONTENT_CHARS);
    let area = CONTENT_SELECTORS
        .iter()
        .filter_map(|css| Selector::parse(css).ok())
        .find_map(|selector| document.select(&selector).find(|el| !inside_stripped(*el)));

    let text = match area.map(element_text) {
        Some(text) if !text.is_empty() => text,
        _ => element_text(body_or_root(document)),
    };
    truncate_chars(&text, max_chars)
}

fn element_text(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    push_text(element, &mut text);
    collapse_whitespace(&text)
}

pub fn is_stripped(element: &Element) -> bool {
    STRIPPED_TAGS.contains(&element.name())
        || element.classes().any(|class| STRIPPED_CLASSES.contains(&class))
}

fn inside_stripped(element: ElementRef<'_>) -> bool {
    is_stripped(element.value())
        || element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| is_stripped(ancestor.value()))
}

fn body_or_root(document: &Html) -> ElementRef<'_> {
    Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element())
}

fn push_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            if is_stripped(child_element.value()) {
                continue;
            }
            push_text(child_element, out);
            if BLOCK_TAGS.contains(&child_element.value().name()) {
                out.push(' ');
            }
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_main_and_strips_chrome() {
        let document = Html::parse_document(
            r#"<html><body>
                <header>Site header</header>
                <nav>Menu</nav>
                <main>
                    <h1>Rust   Engineer</h1>
                    <p>Build <b>fast</b> things.</p>
                    <div class="ad">Buy now</div>
                    <script>var x = 1;</script>
                </main>
                <footer>Footer</footer>
            </body></html>"#,
        );
        assert_eq!(
            extract_page_content(&document, MAX_CONTENT_CHARS),
            "Rust Engineer Build fast things."
        );
    }

    #[test]
    fn test_falls_back_to_body() {
        let document = Html::parse_document(
            "<html><body><nav>Menu</nav><div>Hello</div><p>world</p></body></html>",
        );
        assert_eq!(extract_page_content(&document, MAX_CONTENT_CHARS), "Hello world");
    }

    #[test]
    fn test_main_inside_stripped_region_is_ignored() {
        let document = Html::parse_document(
            r#"<html><body><header><main>Nope</main></header><article>Yes</article></body></html>"#,
        );
        assert_eq!(extract_page_content(&document, MAX_CONTENT_CHARS), "Yes");
    }

    #[test]
    fn test_output_is_capped() {
        let body = "word ".repeat(5_000);
        let document = Html::parse_document(&format!("<html><body><p>{}</p></body></html>", body));
        let content = extract_page_content(&document, MAX_CONTENT_CHARS);
        assert_eq!(content.chars().count(), MAX_CONTENT_CHARS);
    }

    #[test]
    fn test_cap_cannot_be_raised() {
        let body = "word ".repeat(6_000);
        let document = Html::parse_document(&format!("<html><body><p>{}</p></body></html>", body));
        let content = extract_page_content(&document, 20_000);
        assert_eq!(content.chars().count(), MAX_CONTENT_CHARS);
    }

    #[test]
    fn test_empty_content_area_falls_back_to_body() {
        let document = Html::parse_document(
            r#"<html><body><main><script>init()</script></main>
               <div class="listing">Senior Rust Engineer</div></body></html>"#,
        );
        assert_eq!(
            extract_page_content(&document, MAX_CONTENT_CHARS),
            "Senior Rust Engineer"
        );
    }

    #[test]
    fn test_empty_page() {
        let document = Html::parse_document("<html><body><script>x()</script></body></html>");
        assert_eq!(extract_page_content(&document, MAX_CONTENT_CHARS), "");
    }
}
