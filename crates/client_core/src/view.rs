//! Page integration points and an in-memory page used headlessly and in tests.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use shared::domain::{ConfidenceTier, MatchId, Notification, StepState, WorkflowStage};
use tokio::sync::Mutex;

use crate::upload_intake::SelectedFile;

/// The page is the only resource shared between the controller, timers and the animation.
pub type SharedPage<P> = Arc<Mutex<P>>;

pub fn shared<P: PageView>(page: P) -> SharedPage<P> {
    Arc::new(Mutex::new(page))
}

/// Element identifiers the markup must provide.
pub struct ElementIds;

impl ElementIds {
    pub const UPLOAD_ZONE: &'static str = "upload-zone";
    pub const FILE_INPUT: &'static str = "file-input";
    pub const FILE_INFO: &'static str = "file-info";
    pub const FILE_NAME: &'static str = "file-name";
    pub const FILE_SIZE: &'static str = "file-size";
    pub const UPLOAD_SECTION: &'static str = "upload-section";
    pub const PROCESSING: &'static str = "processing";
    pub const PROGRESS_BAR: &'static str = "progress-bar";
    pub const REVIEW_SECTION: &'static str = "review-section";
    pub const DYNAMIC_REVIEW_SECTION: &'static str = "dynamic-review-section";
    pub const REVIEW_DATA: &'static str = "review-data";
    pub const CONFIRM_FORM: &'static str = "confirm-form";

    pub fn step(stage: WorkflowStage) -> String {
        format!("step-{}", stage.as_str())
    }

    pub fn confidence(match_id: &MatchId) -> String {
        format!("confidence-{match_id}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NotificationId(pub u64);

// Ids stay unique across page loads so a stale dismiss timer never hits a newer notification.
static NEXT_NOTIFICATION: AtomicU64 = AtomicU64::new(1);

impl NotificationId {
    pub fn next() -> Self {
        Self(NEXT_NOTIFICATION.fetch_add(1, Ordering::Relaxed))
    }
}

/// A selection control inside the review table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionControl {
    pub match_id: MatchId,
    pub selected: usize,
    pub options: usize,
}

pub trait PageView: Send {
    fn set_step(&mut self, stage: WorkflowStage, state: StepState, pulsing: bool);
    fn set_drag_active(&mut self, active: bool);
    fn open_file_picker(&mut self);
    fn stage_file(&mut self, file: SelectedFile);
    fn staged_file(&self) -> Option<&SelectedFile>;
    fn show_file_info(&mut self, name: &str, size: &str);
    fn set_upload_section_visible(&mut self, visible: bool);
    fn set_processing_visible(&mut self, visible: bool);
    fn set_progress(&mut self, percent: f64);
    fn navigate(&mut self, url: &str);
    fn push_notification(&mut self, notification: Notification) -> NotificationId;
    /// Returns false when the notification was already gone.
    fn dismiss_notification(&mut self, id: NotificationId) -> bool;
    /// Selection controls of the review table, if one is present on the page.
    fn review_controls(&self) -> Option<Vec<SelectionControl>>;
    fn mount_review(&mut self, markup: String, controls: Vec<SelectionControl>);
    fn set_selected(&mut self, match_id: &MatchId, index: usize);
    fn set_confidence(&mut self, match_id: &MatchId, tier: ConfidenceTier);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepIndicator {
    pub state: StepState,
    pub pulsing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSection {
    /// Markup mounted into the dynamic section; `None` when the page arrived server-rendered.
    pub markup: Option<String>,
    pub controls: Vec<SelectionControl>,
}

#[derive(Debug, Clone)]
pub struct MemoryPage {
    pub steps: BTreeMap<WorkflowStage, StepIndicator>,
    pub drag_active: bool,
    pub picker_requests: usize,
    pub staged: Option<SelectedFile>,
    pub file_info: Option<FileInfo>,
    pub upload_section_visible: bool,
    pub processing_visible: bool,
    pub progress: f64,
    pub progress_history: Vec<f64>,
    pub location: Option<String>,
    pub notifications: Vec<(NotificationId, Notification)>,
    pub review: Option<ReviewSection>,
    pub confidence: BTreeMap<MatchId, ConfidenceTier>,
    pub confidence_updates: Vec<(MatchId, ConfidenceTier)>,
}

impl Default for MemoryPage {
    fn default() -> Self {
        Self {
            steps: BTreeMap::new(),
            drag_active: false,
            picker_requests: 0,
            staged: None,
            file_info: None,
            upload_section_visible: true,
            processing_visible: false,
            progress: 0.0,
            progress_history: Vec::new(),
            location: None,
            notifications: Vec::new(),
            review: None,
            confidence: BTreeMap::new(),
            confidence_updates: Vec::new(),
        }
    }
}

impl MemoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A review page whose table was already rendered by the server.
    pub fn with_server_review(controls: Vec<SelectionControl>) -> Self {
        Self {
            upload_section_visible: false,
            review: Some(ReviewSection {
                markup: None,
                controls,
            }),
            ..Self::default()
        }
    }

    pub fn step(&self, stage: WorkflowStage) -> StepIndicator {
        self.steps.get(&stage).copied().unwrap_or(StepIndicator {
            state: StepState::Neutral,
            pulsing: false,
        })
    }

    pub fn active_stage(&self) -> Option<WorkflowStage> {
        self.steps
            .iter()
            .find(|(_, indicator)| indicator.state == StepState::Active)
            .map(|(stage, _)| *stage)
    }

    pub fn confidence_updates_for(&self, match_id: &MatchId) -> usize {
        self.confidence_updates
            .iter()
            .filter(|(id, _)| id == match_id)
            .count()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.notifications
            .iter()
            .map(|(_, notification)| notification.message.as_str())
            .collect()
    }
}

impl PageView for MemoryPage {
    fn set_step(&mut self, stage: WorkflowStage, state: StepState, pulsing: bool) {
        self.steps.insert(stage, StepIndicator { state, pulsing });
    }

    fn set_drag_active(&mut self, active: bool) {
        self.drag_active = active;
    }

    fn open_file_picker(&mut self) {
        self.picker_requests += 1;
    }

    fn stage_file(&mut self, file: SelectedFile) {
        self.staged = Some(file);
    }

    fn staged_file(&self) -> Option<&SelectedFile> {
        self.staged.as_ref()
    }

    fn show_file_info(&mut self, name: &str, size: &str) {
        self.file_info = Some(FileInfo {
            name: name.to_string(),
            size: size.to_string(),
        });
    }

    fn set_upload_section_visible(&mut self, visible: bool) {
        self.upload_section_visible = visible;
    }

    fn set_processing_visible(&mut self, visible: bool) {
        self.processing_visible = visible;
    }

    fn set_progress(&mut self, percent: f64) {
        self.progress = percent;
        self.progress_history.push(percent);
    }

    fn navigate(&mut self, url: &str) {
        self.location = Some(url.to_string());
    }

    fn push_notification(&mut self, notification: Notification) -> NotificationId {
        let id = NotificationId::next();
        // Newest first, like inserting at the top of the container.
        self.notifications.insert(0, (id, notification));
        id
    }

    fn dismiss_notification(&mut self, id: NotificationId) -> bool {
        let before = self.notifications.len();
        self.notifications.retain(|(existing, _)| *existing != id);
        before != self.notifications.len()
    }

    fn review_controls(&self) -> Option<Vec<SelectionControl>> {
        self.review.as_ref().map(|section| section.controls.clone())
    }

    fn mount_review(&mut self, markup: String, controls: Vec<SelectionControl>) {
        self.review = Some(ReviewSection {
            markup: Some(markup),
            controls,
        });
    }

    fn set_selected(&mut self, match_id: &MatchId, index: usize) {
        if let Some(control) = self
            .review
            .as_mut()
            .and_then(|section| section.controls.iter_mut().find(|c| &c.match_id == match_id))
        {
            control.selected = index;
        }
    }

    fn set_confidence(&mut self, match_id: &MatchId, tier: ConfidenceTier) {
        self.confidence.insert(match_id.clone(), tier);
        self.confidence_updates.push((match_id.clone(), tier));
    }
}
