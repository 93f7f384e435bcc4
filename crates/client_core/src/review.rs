//! Review table rendering and per-row confidence tracking.

use std::collections::BTreeMap;

use askama::Template;
use shared::{
    domain::{ConfidenceTier, MatchId},
    error::PayloadError,
    protocol::ReviewPayload,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    transport::ConfirmForm,
    view::{PageView, SelectionControl},
};

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error("failed to render review markup: {0}")]
    Template(#[from] askama::Error),
    #[error("no selection control is bound for match {0}")]
    UnknownControl(MatchId),
    #[error("choice {index} is out of range for match {match_id} ({options} options)")]
    OptionOutOfRange {
        match_id: MatchId,
        index: usize,
        options: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// A server-rendered table was already on the page and was only enhanced.
    Enhanced,
    /// The table was built from the payload and mounted into the dynamic section.
    Built,
}

struct OptionView<'a> {
    value: usize,
    label: &'a str,
    selected: bool,
}

struct RowView<'a> {
    position: usize,
    match_id: &'a str,
    description: &'a str,
    options: Vec<OptionView<'a>>,
    confidence_label: String,
    confidence_class: &'static str,
    confidence_icon: &'static str,
}

#[derive(Template)]
#[template(path = "review.html")]
struct ReviewTemplate<'a> {
    action: String,
    row_count: usize,
    rows: Vec<RowView<'a>>,
}

#[derive(Debug, Clone, Copy)]
struct Binding {
    selected: usize,
    options: usize,
}

pub struct ReviewRenderer {
    payload: ReviewPayload,
    bindings: BTreeMap<MatchId, Binding>,
}

impl ReviewRenderer {
    pub fn new(payload: ReviewPayload) -> Result<Self, ReviewError> {
        payload.validate()?;
        Ok(Self {
            payload,
            bindings: BTreeMap::new(),
        })
    }

    pub fn payload(&self) -> &ReviewPayload {
        &self.payload
    }

    /// Builds the review card markup. Every row-supplied string is HTML-escaped.
    pub fn markup(&self) -> Result<String, ReviewError> {
        let rows = self
            .payload
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let selected = row.initial_selection();
                let tier = ConfidenceTier::for_index(selected);
                RowView {
                    position: index + 1,
                    match_id: row.match_id.as_str(),
                    description: &row.description,
                    options: row
                        .choices
                        .iter()
                        .enumerate()
                        .map(|(value, choice)| OptionView {
                            value,
                            label: choice.label(),
                            selected: value == selected,
                        })
                        .collect(),
                    confidence_label: tier.label(),
                    confidence_class: tier.css_class(),
                    confidence_icon: tier.icon(),
                }
            })
            .collect::<Vec<_>>();

        let template = ReviewTemplate {
            action: self.payload.confirm_action(),
            row_count: rows.len(),
            rows,
        };
        Ok(template.render()?)
    }

    fn controls(&self) -> Vec<SelectionControl> {
        self.payload
            .rows
            .iter()
            .map(|row| SelectionControl {
                match_id: row.match_id.clone(),
                selected: row.initial_selection(),
                options: row.choices.len(),
            })
            .collect()
    }

    /// Shows the review: enhances an existing table, or builds and mounts one.
    pub fn render<P: PageView + ?Sized>(&mut self, page: &mut P) -> Result<RenderMode, ReviewError> {
        page.set_processing_visible(false);

        if page.review_controls().is_some() {
            self.enhance(page);
            return Ok(RenderMode::Enhanced);
        }

        let markup = self.markup()?;
        page.mount_review(markup, self.controls());
        info!(
            doc_id = %self.payload.doc_id,
            rows = self.payload.rows.len(),
            "review table built"
        );
        self.enhance(page);
        Ok(RenderMode::Built)
    }

    /// Binds confidence tracking to every selection control on the page and redraws each
    /// badge. Controls that are already bound keep their single binding.
    pub fn enhance<P: PageView + ?Sized>(&mut self, page: &mut P) -> usize {
        let controls = page.review_controls().unwrap_or_default();
        let mut newly_bound = 0;

        for control in controls {
            if !self.bindings.contains_key(&control.match_id) {
                self.bindings.insert(
                    control.match_id.clone(),
                    Binding {
                        selected: control.selected,
                        options: control.options,
                    },
                );
                newly_bound += 1;
            }
            page.set_confidence(&control.match_id, ConfidenceTier::for_index(control.selected));
        }

        debug!(newly_bound, total = self.bindings.len(), "review controls enhanced");
        newly_bound
    }

    /// Applies a user selection and redraws that row's confidence badge once.
    pub fn handle_change<P: PageView + ?Sized>(
        &mut self,
        page: &mut P,
        match_id: &MatchId,
        index: usize,
    ) -> Result<ConfidenceTier, ReviewError> {
        let binding = self
            .bindings
            .get_mut(match_id)
            .ok_or_else(|| ReviewError::UnknownControl(match_id.clone()))?;
        if index >= binding.options {
            return Err(ReviewError::OptionOutOfRange {
                match_id: match_id.clone(),
                index,
                options: binding.options,
            });
        }

        binding.selected = index;
        let tier = ConfidenceTier::for_index(index);
        page.set_selected(match_id, index);
        page.set_confidence(match_id, tier);
        debug!(match_id = %match_id, index, confidence = %tier.label(), "selection changed");
        Ok(tier)
    }

    pub fn selection(&self, match_id: &MatchId) -> Option<usize> {
        self.bindings.get(match_id).map(|binding| binding.selected)
    }

    pub fn bound_controls(&self) -> usize {
        self.bindings.len()
    }

    /// The confirm submission: one field per row, in payload order.
    pub fn confirm_form(&self) -> ConfirmForm {
        let fields = self
            .payload
            .rows
            .iter()
            .map(|row| {
                let selected = self
                    .selection(&row.match_id)
                    .unwrap_or_else(|| row.initial_selection());
                (row.match_id.to_string(), selected.to_string())
            })
            .collect();

        ConfirmForm {
            action: self.payload.confirm_action(),
            fields,
        }
    }
}

#[cfg(test)]
#[path = "tests/review_tests.rs"]
mod tests;
