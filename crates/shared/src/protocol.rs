//! Review payload as embedded by the backend in the review page.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    domain::{DocId, MatchId},
    error::PayloadError,
};

/// A candidate catalog entry, either bare text or the backend's scored form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Choice {
    Text(String),
    Scored { name: String, score: f64 },
}

impl Choice {
    pub fn label(&self) -> &str {
        match self {
            Choice::Text(text) => text,
            Choice::Scored { name, .. } => name,
        }
    }
}

impl From<&str> for Choice {
    fn from(value: &str) -> Self {
        Choice::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRow {
    pub match_id: MatchId,
    pub description: String,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub confirmed: Option<usize>,
}

impl ReviewRow {
    pub fn initial_selection(&self) -> usize {
        self.confirmed.unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewPayload {
    pub doc_id: DocId,
    #[serde(default)]
    pub rows: Vec<ReviewRow>,
}

impl ReviewPayload {
    pub fn from_json(raw: &str) -> Result<Self, PayloadError> {
        let payload: ReviewPayload = serde_json::from_str(raw)?;
        payload.validate()?;
        Ok(payload)
    }

    pub fn validate(&self) -> Result<(), PayloadError> {
        let mut seen = HashSet::with_capacity(self.rows.len());
        for row in &self.rows {
            if !seen.insert(&row.match_id) {
                return Err(PayloadError::DuplicateMatchId(row.match_id.clone()));
            }
            if row.choices.is_empty() {
                return Err(PayloadError::NoChoices {
                    match_id: row.match_id.clone(),
                });
            }
            if let Some(confirmed) = row.confirmed {
                if confirmed >= row.choices.len() {
                    return Err(PayloadError::ConfirmedOutOfRange {
                        match_id: row.match_id.clone(),
                        confirmed,
                        available: row.choices.len(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn confirm_action(&self) -> String {
        format!("/confirm/{}", self.doc_id)
    }
}
