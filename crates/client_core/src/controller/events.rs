//! Page events and user-facing error modeling for the review client controller.

use shared::domain::{ConfidenceTier, MatchId};

use crate::{review::RenderMode, upload_intake::SelectedFile, view::NotificationId};

#[derive(Debug, Clone)]
pub enum UiEvent {
    DragEnter,
    DragOver,
    DragLeave,
    Drop(Vec<SelectedFile>),
    FilesSelected(Vec<SelectedFile>),
    UploadZoneClicked,
    Submit,
    SelectionChanged { match_id: MatchId, index: usize },
    DismissNotification(NotificationId),
}

impl UiEvent {
    pub fn name(&self) -> &'static str {
        match self {
            UiEvent::DragEnter => "drag_enter",
            UiEvent::DragOver => "drag_over",
            UiEvent::DragLeave => "drag_leave",
            UiEvent::Drop(_) => "drop",
            UiEvent::FilesSelected(_) => "files_selected",
            UiEvent::UploadZoneClicked => "upload_zone_clicked",
            UiEvent::Submit => "submit",
            UiEvent::SelectionChanged { .. } => "selection_changed",
            UiEvent::DismissNotification(_) => "dismiss_notification",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiOutcome {
    Handled,
    Staged { name: String, size: String },
    Rejected(String),
    /// The upload request is in flight; see `ReviewClient::finish_submission`.
    SubmissionStarted,
    Rendered(RenderMode),
    ConfidenceUpdated(ConfidenceTier),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Validation,
    Transport,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    Upload,
    Review,
    Confirm,
    General,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("malformed")
            || message_lower.contains("out of range")
            || message_lower.contains("duplicate")
            || message_lower.contains("no selection control")
            || message_lower.contains("no candidate")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("timed out")
            || message_lower.contains("connect")
            || message_lower.contains("refused")
            || message_lower.contains("request failed")
            || message_lower.contains("unexpected status")
            || message_lower.contains("network")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_retryable(&self) -> bool {
        self.category == UiErrorCategory::Transport
    }
}

impl std::fmt::Display for UiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} error: {}", self.context, self.message)
    }
}

impl std::error::Error for UiError {}
