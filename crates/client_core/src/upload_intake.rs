//! Drag-and-drop and file-picker intake with the client-side PDF gate.

use std::path::{Path, PathBuf};

use shared::{domain::Notification, format::format_file_size};
use tracing::{debug, info, warn};

use crate::view::PageView;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// A file offered by a drop or picker selection, with its declared media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub media_type: String,
    pub size: u64,
    pub source: FileSource,
}

impl SelectedFile {
    pub fn from_bytes(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            size: bytes.len() as u64,
            source: FileSource::Bytes(bytes),
        }
    }

    /// Describes a local file, guessing the media type from its extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = tokio::fs::metadata(path).await?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let media_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();

        Ok(Self {
            name,
            media_type,
            size: metadata.len(),
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    pub fn is_pdf(&self) -> bool {
        self.media_type.eq_ignore_ascii_case(PDF_MEDIA_TYPE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeOutcome {
    Staged { name: String, size: String },
    Rejected(Notification),
    Ignored,
}

pub fn drag_enter<P: PageView + ?Sized>(page: &mut P) {
    page.set_drag_active(true);
}

pub fn drag_over<P: PageView + ?Sized>(page: &mut P) {
    page.set_drag_active(true);
}

pub fn drag_leave<P: PageView + ?Sized>(page: &mut P) {
    page.set_drag_active(false);
}

/// Handles a drop on the upload zone. The highlight is cleared whatever was dropped.
pub fn drop_files<P: PageView + ?Sized>(page: &mut P, files: Vec<SelectedFile>) -> IntakeOutcome {
    page.set_drag_active(false);
    stage(page, files)
}

/// Handles a manual selection through the file picker.
pub fn select_files<P: PageView + ?Sized>(page: &mut P, files: Vec<SelectedFile>) -> IntakeOutcome {
    stage(page, files)
}

/// Clicking anywhere in the upload zone opens the same picker as the file input.
pub fn click_zone<P: PageView + ?Sized>(page: &mut P) {
    debug!("upload zone clicked; opening file picker");
    page.open_file_picker();
}

fn stage<P: PageView + ?Sized>(page: &mut P, mut files: Vec<SelectedFile>) -> IntakeOutcome {
    if files.is_empty() {
        return IntakeOutcome::Ignored;
    }

    if files.len() > 1 {
        warn!(count = files.len(), "rejected multi-file selection");
        return IntakeOutcome::Rejected(Notification::warning("Please upload a single PDF file."));
    }

    let file = files.remove(0);
    if !file.is_pdf() {
        warn!(name = %file.name, media_type = %file.media_type, "rejected non-pdf file");
        return IntakeOutcome::Rejected(Notification::warning("Please upload a PDF file."));
    }

    let name = file.name.clone();
    let size = format_file_size(file.size);
    info!(name = %name, size = %size, "staged upload file");
    page.stage_file(file);
    page.show_file_info(&name, &size);
    IntakeOutcome::Staged { name, size }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::MemoryPage;

    fn pdf(name: &str, size: usize) -> SelectedFile {
        SelectedFile::from_bytes(name, PDF_MEDIA_TYPE, vec![b'%'; size])
    }

    #[test]
    fn dropping_a_pdf_stages_it_and_shows_info() {
        let mut page = MemoryPage::new();
        drag_enter(&mut page);
        assert!(page.drag_active);

        let outcome = drop_files(&mut page, vec![pdf("invoice.pdf", 1536)]);
        assert_eq!(
            outcome,
            IntakeOutcome::Staged {
                name: "invoice.pdf".into(),
                size: "1.50 KB".into()
            }
        );
        assert!(!page.drag_active);
        assert_eq!(page.staged.as_ref().map(|f| f.name.as_str()), Some("invoice.pdf"));
        let info = page.file_info.as_ref().expect("file info");
        assert_eq!(info.size, "1.50 KB");
    }

    #[test]
    fn dropping_a_non_pdf_warns_and_clears_highlight() {
        let mut page = MemoryPage::new();
        drag_over(&mut page);

        let outcome = drop_files(
            &mut page,
            vec![SelectedFile::from_bytes("notes.txt", "text/plain", b"hi".to_vec())],
        );
        match outcome {
            IntakeOutcome::Rejected(notification) => {
                assert_eq!(notification.message, "Please upload a PDF file.")
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(!page.drag_active);
        assert!(page.staged.is_none());
        assert!(page.file_info.is_none());
    }

    #[test]
    fn multiple_files_are_rejected() {
        let mut page = MemoryPage::new();
        let outcome = select_files(&mut page, vec![pdf("a.pdf", 1), pdf("b.pdf", 1)]);
        assert!(matches!(outcome, IntakeOutcome::Rejected(_)));
        assert!(page.staged.is_none());
    }

    #[test]
    fn empty_drop_is_ignored_but_clears_highlight() {
        let mut page = MemoryPage::new();
        drag_enter(&mut page);
        assert_eq!(drop_files(&mut page, Vec::new()), IntakeOutcome::Ignored);
        assert!(!page.drag_active);
    }

    #[test]
    fn drag_leave_clears_highlight() {
        let mut page = MemoryPage::new();
        drag_enter(&mut page);
        drag_leave(&mut page);
        assert!(!page.drag_active);
    }

    #[test]
    fn clicking_zone_opens_picker() {
        let mut page = MemoryPage::new();
        click_zone(&mut page);
        click_zone(&mut page);
        assert_eq!(page.picker_requests, 2);
    }

    #[test]
    fn media_type_check_ignores_case() {
        let file = SelectedFile::from_bytes("scan.pdf", "Application/PDF", Vec::new());
        assert!(file.is_pdf());
    }
}
