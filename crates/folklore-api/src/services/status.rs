//! Status aggregation.
//!
//! Pure read-model projections over current record state; no mutation. The
//! diary view only exposes per-page detail once the parent is completed, and
//! progress never reads 100 until the parent record itself says completed.

use folklore_core::models::{
    progress_percent, DiaryImage, DiaryStatus, DiaryStatusView, DiaryUpload, PageResult,
    ResponseStatusView, StoryResponse,
};

pub fn response_view(response: &StoryResponse) -> ResponseStatusView {
    ResponseStatusView::from(response)
}

pub fn diary_view(upload: &DiaryUpload, pages: &[DiaryImage]) -> DiaryStatusView {
    let mut view = DiaryStatusView {
        upload_id: upload.id,
        status: upload.processing_status,
        progress: None,
        pages: None,
        combined_text: None,
        overall_confidence: None,
        error: None,
    };

    match upload.processing_status {
        DiaryStatus::Completed => {
            view.pages = Some(pages.iter().map(PageResult::from).collect());
            view.combined_text = upload.combined_text.clone();
            view.overall_confidence = upload.overall_confidence;
        }
        DiaryStatus::Processing => {
            let terminal = pages
                .iter()
                .filter(|p| p.processing_status.is_terminal())
                .count();
            view.progress = Some(progress_percent(terminal, pages.len()));
        }
        DiaryStatus::Failed => {
            // Page-level detail stays available per page; the summary view
            // only carries a generic indicator.
            view.error = Some("Processing failed".to_string());
        }
        DiaryStatus::Uploading | DiaryStatus::Pending => {}
    }

    view
}
