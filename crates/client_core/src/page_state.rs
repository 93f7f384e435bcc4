//! Reads the state a server-rendered review page carries: the embedded review payload and
//! any review table already present in the markup.

use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use shared::{domain::MatchId, error::PayloadError, protocol::ReviewPayload};
use thiserror::Error;

use crate::view::{ElementIds, MemoryPage, SelectionControl};

const WINDOW_ASSIGNMENT: &str = "REVIEW_DATA";

#[derive(Debug, Error)]
pub enum PageStateError {
    #[error("invalid selector '{0}'")]
    Selector(String),
    #[error(transparent)]
    Payload(#[from] PayloadError),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddedPage {
    pub payload: Option<ReviewPayload>,
    /// Selection controls of a server-rendered `#review-section`, if the page has one.
    pub review_controls: Option<Vec<SelectionControl>>,
}

impl EmbeddedPage {
    /// A fresh in-memory page reflecting what the server rendered.
    pub fn to_memory_page(&self) -> MemoryPage {
        match &self.review_controls {
            Some(controls) => MemoryPage::with_server_review(controls.clone()),
            None if self.payload.is_some() => {
                let mut page = MemoryPage::new();
                page.upload_section_visible = false;
                page
            }
            None => MemoryPage::new(),
        }
    }
}

fn selector(raw: &str) -> Result<Selector, PageStateError> {
    Selector::parse(raw).map_err(|_| PageStateError::Selector(raw.to_string()))
}

pub fn parse_review_page(html: &str) -> Result<EmbeddedPage, PageStateError> {
    let document = Html::parse_document(html);
    Ok(EmbeddedPage {
        payload: embedded_payload(&document)?,
        review_controls: review_controls(&document)?,
    })
}

fn embedded_payload(document: &Html) -> Result<Option<ReviewPayload>, PageStateError> {
    let data_script = selector(&format!("script#{}", ElementIds::REVIEW_DATA))?;
    if let Some(script) = document.select(&data_script).next() {
        let raw: String = script.text().collect();
        return parse_payload_value(raw.trim());
    }

    let scripts = selector("script")?;
    for script in document.select(&scripts) {
        let text: String = script.text().collect();
        if let Some(value) = assigned_value(&text) {
            return parse_payload_value(value);
        }
    }

    Ok(None)
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Text following the first `REVIEW_DATA = ` assignment in a script. Reads and comparisons of
/// the variable are skipped, as are longer identifiers that merely contain the name.
fn assigned_value(script: &str) -> Option<&str> {
    script
        .match_indices(WINDOW_ASSIGNMENT)
        .find_map(|(start, _)| {
            let before = script[..start].chars().next_back();
            if before.is_some_and(is_identifier_char) {
                return None;
            }
            let rest = &script[start + WINDOW_ASSIGNMENT.len()..];
            if rest.chars().next().is_some_and(is_identifier_char) {
                return None;
            }
            let value = rest.trim_start().strip_prefix('=')?;
            if value.starts_with('=') {
                return None;
            }
            Some(value.trim_start())
        })
}

/// Parses the first JSON value of `raw`, ignoring whatever script text follows it.
fn parse_payload_value(raw: &str) -> Result<Option<ReviewPayload>, PageStateError> {
    let mut de = serde_json::Deserializer::from_str(raw);
    let payload = Option::<ReviewPayload>::deserialize(&mut de).map_err(PayloadError::from)?;
    if let Some(payload) = &payload {
        payload.validate()?;
    }
    Ok(payload)
}

fn review_controls(document: &Html) -> Result<Option<Vec<SelectionControl>>, PageStateError> {
    let section = selector(&format!("#{}", ElementIds::REVIEW_SECTION))?;
    let Some(section) = document.select(&section).next() else {
        return Ok(None);
    };

    let selects = selector("select")?;
    let options = selector("option")?;
    let controls = section
        .select(&selects)
        .filter_map(|select| control_from(select, &options))
        .collect();
    Ok(Some(controls))
}

fn control_from(select: ElementRef<'_>, options: &Selector) -> Option<SelectionControl> {
    let name = select.value().attr("name")?;
    let mut count = 0;
    let mut selected = None;
    for (index, option) in select.select(options).enumerate() {
        count += 1;
        if selected.is_none() && option.value().attr("selected").is_some() {
            selected = Some(index);
        }
    }

    Some(SelectionControl {
        match_id: MatchId::new(name),
        selected: selected.unwrap_or(0),
        options: count,
    })
}
