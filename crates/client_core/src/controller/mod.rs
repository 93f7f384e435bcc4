//! Controller layer: routes page events to intake, submission and review, and tracks the
//! page-level stage (`upload → extract → review → export`, with `extract → upload` on failure).

pub mod events;

use std::sync::Arc;

use shared::{
    domain::{Notification, WorkflowStage},
    protocol::ReviewPayload,
};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::{
    config::ClientSettings,
    notifier::Notifier,
    page_state::parse_review_page,
    progress_animation::StepSource,
    progress_tracker::set_stage,
    review::ReviewRenderer,
    submission::{SubmissionController, SubmissionOutcome},
    transport::{ConfirmResponse, UploadTransport},
    upload_intake::{self, IntakeOutcome},
    view::{MemoryPage, PageView, SharedPage},
};

use events::{UiError, UiErrorContext, UiEvent, UiOutcome};

pub const EXPORT_FAILED_MESSAGE: &str = "Export failed. Please try again.";

pub struct ReviewClient<P: PageView + 'static> {
    page: SharedPage<P>,
    transport: Arc<dyn UploadTransport>,
    notifier: Notifier,
    submission: Arc<SubmissionController>,
    in_flight: Option<JoinHandle<SubmissionOutcome>>,
    renderer: Option<ReviewRenderer>,
    stage: WorkflowStage,
}

impl<P: PageView + 'static> ReviewClient<P> {
    pub fn new(settings: &ClientSettings, page: P, transport: Arc<dyn UploadTransport>) -> Self {
        Self {
            page: crate::view::shared(page),
            submission: Arc::new(SubmissionController::new(Arc::clone(&transport), settings)),
            in_flight: None,
            transport,
            notifier: Notifier::new(settings.notification_ttl()),
            renderer: None,
            stage: WorkflowStage::Upload,
        }
    }

    pub fn with_step_source(mut self, steps: StepSource) -> Self {
        let submission = SubmissionController::clone(&self.submission).with_step_source(steps);
        self.submission = Arc::new(submission);
        self
    }

    pub fn page(&self) -> &SharedPage<P> {
        &self.page
    }

    pub fn stage(&self) -> WorkflowStage {
        self.stage
    }

    pub fn renderer(&self) -> Option<&ReviewRenderer> {
        self.renderer.as_ref()
    }

    async fn enter_stage(&mut self, stage: WorkflowStage) {
        set_stage(&mut *self.page.lock().await, stage);
        if self.stage != stage {
            info!(from = %self.stage, to = %stage, "workflow stage changed");
        }
        self.stage = stage;
    }

    /// Page load: render the review when the page carries a payload, otherwise show upload.
    pub async fn initialize(&mut self, payload: Option<ReviewPayload>) -> Result<UiOutcome, UiError> {
        let Some(payload) = payload else {
            self.renderer = None;
            self.enter_stage(WorkflowStage::Upload).await;
            return Ok(UiOutcome::Handled);
        };

        let mut renderer = ReviewRenderer::new(payload)
            .map_err(|err| UiError::from_message(UiErrorContext::Review, err.to_string()))?;
        let mode = {
            let mut view = self.page.lock().await;
            renderer.render(&mut *view)
        }
        .map_err(|err| UiError::from_message(UiErrorContext::Review, err.to_string()))?;

        self.renderer = Some(renderer);
        self.enter_stage(WorkflowStage::Review).await;
        Ok(UiOutcome::Rendered(mode))
    }

    pub async fn dispatch(&mut self, event: UiEvent) -> Result<UiOutcome, UiError> {
        debug!(event = event.name(), stage = %self.stage, "dispatching ui event");
        match event {
            UiEvent::DragEnter => {
                upload_intake::drag_enter(&mut *self.page.lock().await);
                Ok(UiOutcome::Handled)
            }
            UiEvent::DragOver => {
                upload_intake::drag_over(&mut *self.page.lock().await);
                Ok(UiOutcome::Handled)
            }
            UiEvent::DragLeave => {
                upload_intake::drag_leave(&mut *self.page.lock().await);
                Ok(UiOutcome::Handled)
            }
            UiEvent::UploadZoneClicked => {
                upload_intake::click_zone(&mut *self.page.lock().await);
                Ok(UiOutcome::Handled)
            }
            UiEvent::Drop(files) => {
                let outcome = upload_intake::drop_files(&mut *self.page.lock().await, files);
                Ok(self.intake_outcome(outcome).await)
            }
            UiEvent::FilesSelected(files) => {
                let outcome = upload_intake::select_files(&mut *self.page.lock().await, files);
                Ok(self.intake_outcome(outcome).await)
            }
            UiEvent::Submit => self.submit(),
            UiEvent::SelectionChanged { match_id, index } => {
                let renderer = self.renderer.as_mut().ok_or_else(|| {
                    UiError::from_message(UiErrorContext::Review, "missing review table on this page")
                })?;
                let tier = renderer
                    .handle_change(&mut *self.page.lock().await, &match_id, index)
                    .map_err(|err| UiError::from_message(UiErrorContext::Review, err.to_string()))?;
                Ok(UiOutcome::ConfidenceUpdated(tier))
            }
            UiEvent::DismissNotification(id) => {
                self.notifier.dismiss(&self.page, id).await;
                Ok(UiOutcome::Handled)
            }
        }
    }

    async fn intake_outcome(&self, outcome: IntakeOutcome) -> UiOutcome {
        match outcome {
            IntakeOutcome::Staged { name, size } => UiOutcome::Staged { name, size },
            IntakeOutcome::Rejected(notification) => {
                let message = notification.message.clone();
                self.notifier.show(&self.page, notification).await;
                UiOutcome::Rejected(message)
            }
            IntakeOutcome::Ignored => UiOutcome::Handled,
        }
    }

    /// Starts the upload as its own task so the page keeps handling events while the
    /// request is in flight. [`ReviewClient::finish_submission`] collects the outcome.
    fn submit(&mut self) -> Result<UiOutcome, UiError> {
        if self.stage != WorkflowStage::Upload || self.in_flight.is_some() {
            return Err(UiError::from_message(
                UiErrorContext::Upload,
                format!("invalid state for upload: page is at the {} stage", self.stage),
            ));
        }

        self.stage = WorkflowStage::Extract;
        let submission = Arc::clone(&self.submission);
        let page = Arc::clone(&self.page);
        self.in_flight = Some(tokio::spawn(async move { submission.submit(&page).await }));
        Ok(UiOutcome::SubmissionStarted)
    }

    pub fn submission_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Waits for the submission started by [`UiEvent::Submit`] and applies its outcome.
    pub async fn finish_submission(&mut self) -> Result<SubmissionOutcome, UiError> {
        let task = self.in_flight.take().ok_or_else(|| {
            UiError::from_message(UiErrorContext::Upload, "missing upload in flight")
        })?;
        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.stage = WorkflowStage::Upload;
                return Err(UiError::from_message(
                    UiErrorContext::Upload,
                    format!("upload task stopped: {err}"),
                ));
            }
        };

        self.stage = match &outcome {
            // The browser has left this page; the next page view starts its own stage.
            SubmissionOutcome::Redirected(_) => WorkflowStage::Extract,
            SubmissionOutcome::MissingFile | SubmissionOutcome::Failed(_) => WorkflowStage::Upload,
        };
        Ok(outcome)
    }

    /// Posts the current selections to the confirm endpoint and returns the export.
    pub async fn confirm(&mut self) -> Result<ConfirmResponse, UiError> {
        let form = self
            .renderer
            .as_ref()
            .map(ReviewRenderer::confirm_form)
            .ok_or_else(|| {
                UiError::from_message(UiErrorContext::Confirm, "missing review table on this page")
            })?;

        match self.transport.submit_confirm(&form).await {
            Ok(response) => {
                info!(action = %form.action, bytes = response.body.len(), "matches confirmed");
                self.enter_stage(WorkflowStage::Export).await;
                Ok(response)
            }
            Err(err) => {
                error!(action = %form.action, error = %err, "confirm submission failed");
                self.notifier
                    .show(&self.page, Notification::danger(EXPORT_FAILED_MESSAGE))
                    .await;
                Err(UiError::from_message(UiErrorContext::Confirm, err.to_string()))
            }
        }
    }
}

impl ReviewClient<MemoryPage> {
    /// Follows a navigation: loads the page at `url` and initializes from its embedded state.
    pub async fn open_page(&mut self, url: &str) -> Result<UiOutcome, UiError> {
        let html = self
            .transport
            .fetch_page(url)
            .await
            .map_err(|err| UiError::from_message(UiErrorContext::Review, err.to_string()))?;
        let embedded = parse_review_page(&html)
            .map_err(|err| UiError::from_message(UiErrorContext::Review, err.to_string()))?;

        *self.page.lock().await = embedded.to_memory_page();
        self.renderer = None;
        info!(url, has_payload = embedded.payload.is_some(), "page loaded");
        self.initialize(embedded.payload).await
    }
}

#[cfg(test)]
#[path = "../tests/controller_tests.rs"]
mod tests;
