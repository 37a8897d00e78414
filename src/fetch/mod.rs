//! C4: Fetcher Pool.
//!
//! One blocking `reqwest` client shared across worker threads (§5 — the
//! pool itself is just N threads pulling from the frontier under its
//! shared `Mutex`, there's no async runtime here). Each fetch extracts
//! title/description/body/outbound-links via `scraper` and content-hashes
//! the body with SHA-256 so the crawler can detect unchanged pages on a
//! recrawl without re-indexing them.

pub mod robots;

use std::time::{Duration, SystemTime};

use scraper::{ElementRef, Html, Node, Selector};
use sha2::{Digest, Sha256};

use crate::canonical;
use crate::error::{Result, SearchError};
use crate::types::Page;

pub use robots::RobotsRules;

pub struct Fetcher {
    client: reqwest::blocking::Client,
    user_agent: String,
}

impl Fetcher {
    pub fn new(connect_timeout: Duration, timeout: Duration, max_redirects: u8, user_agent: impl Into<String>) -> Result<Self> {
        let user_agent = user_agent.into();
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(max_redirects as usize))
            .user_agent(user_agent.clone())
            .build()
            .map_err(|e| SearchError::Config { detail: e.to_string() })?;
        Ok(Fetcher { client, user_agent })
    }

    /// Best-effort `robots.txt` lookup: any failure (network, parse,
    /// missing file) degrades to "everything allowed" rather than
    /// blocking the crawl on a file that most of these sites don't serve
    /// with any real restrictions anyway.
    pub fn fetch_robots(&self, host: &str) -> RobotsRules {
        let url = format!("https://{host}/robots.txt");
        match self.client.get(&url).send() {
            Ok(resp) if resp.status().is_success() => match resp.text() {
                Ok(body) => RobotsRules::parse(&body, &self.user_agent),
                Err(_) => RobotsRules::allow_all(),
            },
            _ => RobotsRules::allow_all(),
        }
    }

    pub fn fetch(&self, url: &str, discovered_from: Option<String>) -> Result<Page> {
        let response = self.client.get(url).send().map_err(|e| {
            if e.is_timeout() {
                SearchError::FetchTimeout { url: url.to_string() }
            } else {
                SearchError::FetchTransport { url: url.to_string(), detail: e.to_string() }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::FetchHttp { url: url.to_string(), status: status.as_u16() });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_string();

        let body_text = response
            .text()
            .map_err(|e| SearchError::FetchParse { url: url.to_string(), detail: e.to_string() })?;

        let document = Html::parse_document(&body_text);
        let title = extract_title(&document);
        let description = extract_meta_description(&document);
        let body = extract_body_text(&document);
        let outbound_links = extract_links(&document, url);
        let content_hash = hash_body(&body);

        Ok(Page {
            id: crate::types::PageId(0),
            url: url.to_string(),
            host: canonical::host_of(url).unwrap_or_default(),
            title,
            description,
            body,
            outbound_links,
            fetched_at: SystemTime::now(),
            status: status.as_u16(),
            size: body_text.len(),
            content_type,
            language: None,
            discovered_from,
            content_hash,
        })
    }
}

fn extract_first_text(document: &Html, selector: &str) -> String {
    let Ok(selector) = Selector::parse(selector) else { return String::new() };
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<Vec<_>>().join(" ").trim().to_string())
        .unwrap_or_default()
}

/// Prefer Open Graph's `og:title` over the `<title>` tag (§4.4): sites
/// that tune their OG metadata for link previews tend to keep it cleaner
/// than a `<title>` stuffed with a site-wide suffix.
fn extract_title(document: &Html) -> String {
    if let Ok(selector) = Selector::parse("meta[property=\"og:title\"]") {
        if let Some(el) = document.select(&selector).next() {
            if let Some(content) = el.value().attr("content") {
                if !content.trim().is_empty() {
                    return content.trim().to_string();
                }
            }
        }
    }
    extract_first_text(document, "title")
}

fn extract_meta_description(document: &Html) -> String {
    for selector_text in ["meta[name=description]", "meta[property=\"og:description\"]"] {
        if let Ok(selector) = Selector::parse(selector_text) {
            if let Some(el) = document.select(&selector).next() {
                if let Some(content) = el.value().attr("content") {
                    if !content.trim().is_empty() {
                        return content.trim().to_string();
                    }
                }
            }
        }
    }
    String::new()
}

/// Elements whose text never belongs in the indexed body (§4.4: "main
/// text with navigation/script elements stripped").
const IGNORED_BODY_ELEMENTS: &[&str] = &["script", "style", "nav"];

fn extract_body_text(document: &Html) -> String {
    let Ok(selector) = Selector::parse("body") else { return String::new() };
    document
        .select(&selector)
        .next()
        .map(|el| collect_text(el).trim().to_string())
        .unwrap_or_default()
}

fn collect_text(element: ElementRef) -> String {
    let mut text = String::new();
    for child in element.children() {
        match child.value() {
            Node::Element(e) => {
                if !IGNORED_BODY_ELEMENTS.contains(&e.name()) {
                    if let Some(el_ref) = ElementRef::wrap(child) {
                        text.push_str(&collect_text(el_ref));
                    }
                }
            }
            Node::Text(t) => {
                let t = t.trim();
                if !t.is_empty() {
                    text.push_str(t);
                    text.push(' ');
                }
            }
            _ => {}
        }
    }
    text
}

fn extract_links(document: &Html, base_url: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else { return Vec::new() };
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| canonical::resolve(base_url, href))
        .collect()
}

fn hash_body(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn extracts_title_description_and_links() {
        let html = r#"<html><head><title>Väder idag</title>
            <meta name="description" content="Prognos för Stockholm"></head>
            <body><p>Soligt i hela landet.</p><a href="/nyheter">nyheter</a></body></html>"#;
        let document = Html::parse_document(html);
        assert_eq!(extract_first_text(&document, "title"), "Väder idag");
        assert_eq!(extract_meta_description(&document), "Prognos för Stockholm");
        assert!(extract_body_text(&document).contains("Soligt"));
        let links = extract_links(&document, "https://example.se/start");
        assert_eq!(links, vec!["https://example.se/nyheter".to_string()]);
    }

    #[test]
    fn hash_is_stable_for_identical_bodies() {
        assert_eq!(hash_body("samma text"), hash_body("samma text"));
        assert_ne!(hash_body("text a"), hash_body("text b"));
    }

    #[test]
    fn missing_description_falls_back_to_empty() {
        let document = Html::parse_document("<html><head></head><body></body></html>");
        assert_eq!(extract_meta_description(&document), "");
    }

    #[test]
    fn og_title_is_preferred_over_the_title_tag() {
        let html = r#"<html><head><title>Site Name | Generic Title</title>
            <meta property="og:title" content="Väder i Stockholm"></head><body></body></html>"#;
        let document = Html::parse_document(html);
        assert_eq!(extract_title(&document), "Väder i Stockholm");
    }

    #[test]
    fn title_tag_is_used_when_no_og_title_present() {
        let document = Html::parse_document("<html><head><title>Väder idag</title></head><body></body></html>");
        assert_eq!(extract_title(&document), "Väder idag");
    }

    #[test]
    fn body_text_excludes_script_style_and_nav_elements() {
        let html = r#"<html><body>
            <nav>Hem Nyheter Sport</nav>
            <script>trackPageView();</script>
            <style>body { color: red; }</style>
            <p>Soligt i hela landet idag.</p>
        </body></html>"#;
        let document = Html::parse_document(html);
        let text = extract_body_text(&document);
        assert!(text.contains("Soligt"));
        assert!(!text.contains("Nyheter"));
        assert!(!text.contains("trackPageView"));
        assert!(!text.contains("color: red"));
    }
}
