//! Client layer for the document review workflow: upload intake, simulated progress,
//! submission, and the review table with its confirm step.
//!
//! Page access goes through [`PageView`]; [`MemoryPage`] is the in-memory implementation used
//! by the CLI and the tests.

pub mod config;
pub mod controller;
pub mod notifier;
pub mod page_state;
pub mod progress_animation;
pub mod progress_tracker;
pub mod review;
pub mod submission;
pub mod transport;
pub mod upload_intake;
pub mod view;

pub use config::{load_settings, load_settings_from, ClientSettings};
pub use controller::{
    events::{UiError, UiErrorCategory, UiErrorContext, UiEvent, UiOutcome},
    ReviewClient,
};
pub use notifier::Notifier;
pub use page_state::{parse_review_page, EmbeddedPage};
pub use progress_animation::{AnimationConfig, AnimationState, ProgressAnimation, StepSource};
pub use review::{RenderMode, ReviewError, ReviewRenderer};
pub use submission::{SubmissionController, SubmissionOutcome};
pub use transport::{
    ConfirmForm, ConfirmResponse, HttpTransport, TransportError, UploadForm, UploadResponse,
    UploadTransport,
};
pub use upload_intake::{IntakeOutcome, SelectedFile};
pub use view::{MemoryPage, PageView, SelectionControl, SharedPage};
