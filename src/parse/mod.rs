//! Results page parsing
//!
//! Every assumption about the service's markup lives in this module. The
//! page is loaded into a document tree and queried by CSS selector; each
//! field is checked for presence explicitly.
//!
//! Expected shape of a results page:
//!
//! ```html
//! <li class="trail-card" data-trail-id="123">
//!   <a class="trail-title" href="/rutas/foo-123">Foo</a>
//!   <p class="trail-description">...</p>
//!   <span class="trail-distance">10,5 km</span>
//!   <span class="trail-duration">3h 20min</span>
//! </li>
//! ```
//!
//! A page with no results carries a `.no-results` marker instead.

pub mod details;
pub mod units;


use crate::constants::api::VIEW_PATH;
use crate::constants::limits::RESPONSE_SAMPLE_LEN;
use crate::error::{Error, Result};
use crate::trail::TrailSummary;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

const CARD: &str = ".trail-card";
const CARD_ID_ATTR: &str = "data-trail-id";
const TITLE: &str = "a.trail-title";
const DESCRIPTION: &str = ".trail-description";
const DISTANCE: &str = ".trail-distance";
const DURATION: &str = ".trail-duration";
const NO_RESULTS: &str = ".no-results";

const MAX_ID_LEN: usize = 64;

/// Outcome of parsing one results page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPage {
    /// Well-formed candidates in page order
    pub summaries: Vec<TrailSummary>,
    /// Result cards that were dropped
    pub skipped: Vec<SkippedEntry>,
}

/// A result card that could not be turned into a summary
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEntry {
    /// Zero-based position of the card on the page
    pub position: usize,
    pub external_id: Option<String>,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingId,
    CorruptId,
    MissingTitle,
    /// Same id as an earlier card on the page
    Duplicate,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingId => write!(f, "missing trail id"),
            Self::CorruptId => write!(f, "corrupt trail id"),
            Self::MissingTitle => write!(f, "missing title"),
            Self::Duplicate => write!(f, "duplicate trail id"),
        }
    }
}

impl std::fmt::Display for SkippedEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.external_id {
            Some(id) => write!(f, "result #{} ({}): {}", self.position + 1, id, self.reason),
            None => write!(f, "result #{}: {}", self.position + 1, self.reason),
        }
    }
}

/// Compiled selectors for the results page
struct ResultSelectors {
    card: Selector,
    title: Selector,
    description: Selector,
    distance: Selector,
    duration: Selector,
    no_results: Selector,
}

impl ResultSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            card: selector(CARD)?,
            title: selector(TITLE)?,
            description: selector(DESCRIPTION)?,
            distance: selector(DISTANCE)?,
            duration: selector(DURATION)?,
            no_results: selector(NO_RESULTS)?,
        })
    }
}

/// Parse a results page into trail summaries
///
/// `base_url` resolves relative detail links. Malformed cards are skipped
/// and reported; the page only fails as a whole when it carries neither
/// result cards nor the zero-results marker.
pub fn parse_results(html: &str, base_url: &str) -> Result<ParsedPage> {
    let selectors = ResultSelectors::new()?;
    let document = Html::parse_document(html);

    let cards: Vec<ElementRef> = document.select(&selectors.card).collect();
    if cards.is_empty() {
        if document.select(&selectors.no_results).next().is_some() {
            return Ok(ParsedPage::default());
        }
        return Err(Error::UnparsableResponse {
            message: "results page has neither result cards nor a no-results marker".to_string(),
            sample: sample(html),
        });
    }

    let base_url = base_url.trim_end_matches('/');
    let mut page = ParsedPage::default();
    let mut seen = HashSet::new();

    for (position, card) in cards.into_iter().enumerate() {
        match parse_card(card, &selectors, base_url) {
            Ok(summary) => {
                if seen.insert(summary.external_id.clone()) {
                    page.summaries.push(summary);
                } else {
                    page.skipped.push(SkippedEntry {
                        position,
                        external_id: Some(summary.external_id),
                        reason: SkipReason::Duplicate,
                    });
                }
            }
            Err((external_id, reason)) => page.skipped.push(SkippedEntry {
                position,
                external_id,
                reason,
            }),
        }
    }

    Ok(page)
}

fn parse_card(
    card: ElementRef,
    selectors: &ResultSelectors,
    base_url: &str,
) -> std::result::Result<TrailSummary, (Option<String>, SkipReason)> {
    let raw_id = card
        .value()
        .attr(CARD_ID_ATTR)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or((None, SkipReason::MissingId))?;
    if !is_valid_id(raw_id) {
        return Err((Some(raw_id.to_string()), SkipReason::CorruptId));
    }
    let external_id = raw_id.to_string();

    let title_el = card.select(&selectors.title).next();
    let title = title_el
        .map(element_text)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| (Some(external_id.clone()), SkipReason::MissingTitle))?;

    let detail_reference = title_el
        .and_then(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(|href| resolve_href(base_url, href))
        .unwrap_or_else(|| format!("{}{}?id={}", base_url, VIEW_PATH, external_id));

    Ok(TrailSummary {
        description: first_text(card, &selectors.description),
        approx_distance_km: first_text(card, &selectors.distance)
            .and_then(|t| units::parse_distance_km(&t)),
        approx_duration_min: first_text(card, &selectors.duration)
            .and_then(|t| units::parse_duration_min(&t)),
        external_id,
        title,
        detail_reference,
    })
}

/// Ids are opaque but must be plain tokens
fn is_valid_id(id: &str) -> bool {
    id.len() <= MAX_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::UnparsableResponse {
        message: format!("invalid selector {}: {:?}", css, e),
        sample: String::new(),
    })
}

/// Whitespace-collapsed text of an element
pub(crate) fn element_text(el: ElementRef) -> String {
    el.text()
        .flat_map(|t| t.split(|c: char| c.is_whitespace()))
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first descendant matching `sel`, if present and non-blank
pub(crate) fn first_text(el: ElementRef, sel: &Selector) -> Option<String> {
    el.select(sel)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

fn resolve_href(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if let Some(rest) = href.strip_prefix("//") {
        format!("https://{}", rest)
    } else if href.starts_with('/') {
        format!("{}{}", base_url, href)
    } else {
        format!("{}/{}", base_url, href)
    }
}

/// Leading slice of a page for diagnostics
pub(crate) fn sample(html: &str) -> String {
    html.trim().chars().take(RESPONSE_SAMPLE_LEN).collect()
}
