use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::StageParseError;

macro_rules! id_newtype {
    ($name:ident) => {
        /// Backend identifier. Accepts JSON strings or integers on the wire.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                #[derive(Deserialize)]
                #[serde(untagged)]
                enum Raw {
                    Text(String),
                    Int(i64),
                }

                Ok(match Raw::deserialize(deserializer)? {
                    Raw::Text(text) => Self(text),
                    Raw::Int(value) => Self(value.to_string()),
                })
            }
        }
    };
}

id_newtype!(DocId);
id_newtype!(MatchId);

/// One step of the upload → extract → match → review → export sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    Upload,
    Extract,
    Match,
    Review,
    Export,
}

impl WorkflowStage {
    pub const ALL: [WorkflowStage; 5] = [
        WorkflowStage::Upload,
        WorkflowStage::Extract,
        WorkflowStage::Match,
        WorkflowStage::Review,
        WorkflowStage::Export,
    ];

    pub fn ordinal(self) -> usize {
        match self {
            WorkflowStage::Upload => 0,
            WorkflowStage::Extract => 1,
            WorkflowStage::Match => 2,
            WorkflowStage::Review => 3,
            WorkflowStage::Export => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStage::Upload => "upload",
            WorkflowStage::Extract => "extract",
            WorkflowStage::Match => "match",
            WorkflowStage::Review => "review",
            WorkflowStage::Export => "export",
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowStage {
    type Err = StageParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        WorkflowStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == raw.trim())
            .ok_or_else(|| StageParseError(raw.to_string()))
    }
}

/// Visual state of a single step indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepState {
    Complete,
    Active,
    Neutral,
}

impl StepState {
    pub fn for_stage(step: WorkflowStage, target: WorkflowStage) -> Self {
        match step.ordinal().cmp(&target.ordinal()) {
            std::cmp::Ordering::Less => StepState::Complete,
            std::cmp::Ordering::Equal => StepState::Active,
            std::cmp::Ordering::Greater => StepState::Neutral,
        }
    }

    pub fn css_class(self) -> Option<&'static str> {
        match self {
            StepState::Complete => Some("complete"),
            StepState::Active => Some("active"),
            StepState::Neutral => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfidenceLevel {
    High,
    Medium,
}

/// Cosmetic confidence label derived from the rank of the selected choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfidenceTier {
    percent: u8,
    level: ConfidenceLevel,
}

impl ConfidenceTier {
    pub fn for_index(index: usize) -> Self {
        let (percent, level) = match index {
            0 => (100, ConfidenceLevel::High),
            1 => (95, ConfidenceLevel::High),
            2 => (85, ConfidenceLevel::Medium),
            _ => (70, ConfidenceLevel::Medium),
        };
        Self { percent, level }
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn level(&self) -> ConfidenceLevel {
        self.level
    }

    pub fn label(&self) -> String {
        format!("{}%", self.percent)
    }

    pub fn css_class(&self) -> &'static str {
        match self.level {
            ConfidenceLevel::High => "confidence-high",
            ConfidenceLevel::Medium => "confidence-medium",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self.level {
            ConfidenceLevel::High => "fas fa-star",
            ConfidenceLevel::Medium => "fas fa-exclamation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Info,
    Warning,
    Danger,
}

impl AlertLevel {
    pub fn css_class(self) -> &'static str {
        match self {
            AlertLevel::Info => "alert-info",
            AlertLevel::Warning => "alert-warning",
            AlertLevel::Danger => "alert-danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: AlertLevel,
    pub message: String,
}

impl Notification {
    pub fn new(level: AlertLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(AlertLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(AlertLevel::Warning, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(AlertLevel::Danger, message)
    }
}
