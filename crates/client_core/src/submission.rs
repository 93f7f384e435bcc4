//! Upload form submission: simulated progress while the request is in flight, then either
//! navigation to the redirect target or a revert to the upload state.

use std::{sync::Arc, time::Duration};

use shared::domain::{Notification, WorkflowStage};
use tracing::{error, info, warn};

use crate::{
    config::ClientSettings,
    notifier::Notifier,
    progress_animation::{random_steps, AnimationConfig, ProgressAnimation, StepSource},
    progress_tracker::set_stage,
    transport::{UploadForm, UploadResponse, UploadTransport},
    view::{PageView, SharedPage},
};

pub const MISSING_FILE_MESSAGE: &str = "Please select a PDF file to upload.";
pub const UPLOAD_FAILED_MESSAGE: &str = "Upload failed. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Nothing was staged; the page did not change beyond a warning.
    MissingFile,
    Redirected(String),
    Failed(String),
}

#[derive(Clone)]
pub struct SubmissionController {
    transport: Arc<dyn UploadTransport>,
    notifier: Notifier,
    animation: AnimationConfig,
    steps: StepSource,
    redirect_delay: Duration,
    action: String,
    field_name: String,
}

impl SubmissionController {
    pub fn new(transport: Arc<dyn UploadTransport>, settings: &ClientSettings) -> Self {
        Self {
            transport,
            notifier: Notifier::new(settings.notification_ttl()),
            animation: settings.animation(),
            steps: random_steps(),
            redirect_delay: settings.redirect_delay(),
            action: settings.upload_path.clone(),
            field_name: settings.file_field.clone(),
        }
    }

    pub fn with_step_source(mut self, steps: StepSource) -> Self {
        self.steps = steps;
        self
    }

    pub async fn submit<P>(&self, page: &SharedPage<P>) -> SubmissionOutcome
    where
        P: PageView + 'static,
    {
        let staged = page.lock().await.staged_file().cloned();
        let Some(file) = staged else {
            warn!("upload submitted without a staged file");
            self.notifier
                .show(page, Notification::warning(MISSING_FILE_MESSAGE))
                .await;
            return SubmissionOutcome::MissingFile;
        };

        let form = UploadForm {
            action: self.action.clone(),
            field_name: self.field_name.clone(),
            file,
        };

        {
            let mut view = page.lock().await;
            view.set_upload_section_visible(false);
            view.set_processing_visible(true);
            view.set_progress(0.0);
            set_stage(&mut *view, WorkflowStage::Extract);
        }
        info!(file = %form.file.name, action = %form.action, "upload started");

        let animation =
            ProgressAnimation::start(Arc::clone(page), self.animation, Arc::clone(&self.steps));
        let response = self.transport.submit_upload(&form).await;
        animation.cancel();

        match response {
            Ok(UploadResponse::Redirect(target)) => {
                page.lock().await.set_progress(100.0);
                info!(target = %target, "upload accepted; navigating to review");
                tokio::time::sleep(self.redirect_delay).await;
                page.lock().await.navigate(&target);
                SubmissionOutcome::Redirected(target)
            }
            Ok(UploadResponse::Other(status)) => {
                self.fail(page, format!("upload answered with status {status} instead of a redirect"))
                    .await
            }
            Err(err) => self.fail(page, err.to_string()).await,
        }
    }

    async fn fail<P>(&self, page: &SharedPage<P>, reason: String) -> SubmissionOutcome
    where
        P: PageView + 'static,
    {
        error!(reason = %reason, "upload failed");
        self.notifier
            .show(page, Notification::danger(UPLOAD_FAILED_MESSAGE))
            .await;
        reset_to_upload(&mut *page.lock().await);
        SubmissionOutcome::Failed(reason)
    }
}

/// Back to the initial upload state after a failed submission.
pub fn reset_to_upload<P: PageView + ?Sized>(page: &mut P) {
    page.set_upload_section_visible(true);
    page.set_processing_visible(false);
    set_stage(page, WorkflowStage::Upload);
}

#[cfg(test)]
#[path = "tests/submission_tests.rs"]
mod tests;
