use checker_core::SignalSet;
use scraper::{ElementRef, Html, Selector};

use crate::decode::decode_html;
use crate::FetchedPage;

pub trait SignalExtractor: Send + Sync {
    fn extract(&self, page: &FetchedPage) -> SignalSet;
}

const DEAD_PHRASES: &[&str] = &[
    "sorry, this page isn't available",
    "sorry, this page isn\u{2019}t available",
    "page not found",
    "the link you followed may be broken",
    "this content isn't available",
    "this content isn\u{2019}t available",
];

const PRIVATE_PHRASES: &[&str] = &[
    "this account is private",
    "follow this account to see their photos and videos",
];

const MEDIA_DOMAINS: &[&str] = &["cdninstagram.com", "fbcdn.net"];

/// Text never shown to a reader; excluded from phrase matching.
const HIDDEN_TEXT_PARENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Phrase lists and media domains. Phrases are matched case-insensitively as substrings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorRules {
    pub dead_phrases: Vec<String>,
    pub private_phrases: Vec<String>,
    pub media_domains: Vec<String>,
}

impl Default for ExtractorRules {
    fn default() -> Self {
        Self {
            dead_phrases: owned(DEAD_PHRASES),
            private_phrases: owned(PRIVATE_PHRASES),
            media_domains: owned(MEDIA_DOMAINS),
        }
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Extracts signals from visible body text and media markup:
/// - dead/private: any configured phrase in the visible text
/// - media: a `<video>`, an `<img>` served from a media domain,
///   an `og:video*` meta tag, or an `og:type` naming a video or photo.
#[derive(Debug)]
pub struct PhraseSignalExtractor {
    dead_phrases: Vec<String>,
    private_phrases: Vec<String>,
    media_selectors: Vec<Selector>,
    og_type: Option<Selector>,
}

impl Default for PhraseSignalExtractor {
    fn default() -> Self {
        Self::new(ExtractorRules::default())
    }
}

impl PhraseSignalExtractor {
    pub fn new(rules: ExtractorRules) -> Self {
        let lower = |items: Vec<String>| -> Vec<String> {
            items
                .into_iter()
                .map(|s| s.to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        };

        let mut media_selectors: Vec<Selector> = ["video", "meta[property^=\"og:video\"]"]
            .iter()
            .filter_map(|css| Selector::parse(css).ok())
            .collect();
        media_selectors.extend(
            rules
                .media_domains
                .iter()
                .filter_map(|domain| Selector::parse(&format!("img[src*=\"{domain}\"]")).ok()),
        );

        Self {
            dead_phrases: lower(rules.dead_phrases),
            private_phrases: lower(rules.private_phrases),
            media_selectors,
            og_type: Selector::parse("meta[property=\"og:type\"]").ok(),
        }
    }

    pub fn extract_html(&self, html: &str, http_status: Option<u16>) -> SignalSet {
        let doc = Html::parse_document(html);
        let text = visible_text(&doc).to_lowercase();
        let contains_any = |phrases: &[String]| phrases.iter().any(|p| text.contains(p.as_str()));

        SignalSet {
            http_status,
            dead_phrase_matched: contains_any(self.dead_phrases.as_slice()),
            private_phrase_matched: contains_any(self.private_phrases.as_slice()),
            media_present: self.has_media(&doc),
        }
    }

    fn has_media(&self, doc: &Html) -> bool {
        if self
            .media_selectors
            .iter()
            .any(|sel| doc.select(sel).next().is_some())
        {
            return true;
        }
        self.og_type.as_ref().is_some_and(|sel| {
            doc.select(sel)
                .filter_map(|meta| meta.value().attr("content"))
                .map(str::to_ascii_lowercase)
                .any(|kind| {
                    kind.contains("video") || kind.contains("photo") || kind.contains("image")
                })
        })
    }
}

impl SignalExtractor for PhraseSignalExtractor {
    fn extract(&self, page: &FetchedPage) -> SignalSet {
        let decoded = decode_html(&page.body, page.content_type.as_deref());
        self.extract_html(&decoded.html, Some(page.http_status))
    }
}

/// Text of `<body>` (or the whole document when there is none), skipping script-like elements.
fn visible_text(doc: &Html) -> String {
    let root = Selector::parse("body")
        .ok()
        .and_then(|sel| doc.select(&sel).next())
        .unwrap_or_else(|| doc.root_element());

    let mut text = String::new();
    for node in root.descendants() {
        let Some(chunk) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ElementRef::wrap(ancestor)
                .is_some_and(|el| HIDDEN_TEXT_PARENTS.contains(&el.value().name()))
        });
        if !hidden {
            text.push_str(chunk);
            text.push(' ');
        }
    }
    text
}
