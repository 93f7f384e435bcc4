use thiserror::Error;

use crate::domain::MatchId;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown workflow stage '{0}'")]
pub struct StageParseError(pub String);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("duplicate match id {0} in review payload")]
    DuplicateMatchId(MatchId),
    #[error("row {match_id} has no candidate choices")]
    NoChoices { match_id: MatchId },
    #[error("row {match_id} confirms choice {confirmed} but only {available} choices exist")]
    ConfirmedOutOfRange {
        match_id: MatchId,
        confirmed: usize,
        available: usize,
    },
    #[error("malformed review payload: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for PayloadError {
    fn from(value: serde_json::Error) -> Self {
        PayloadError::Malformed(value.to_string())
    }
}
