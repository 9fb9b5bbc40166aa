// client/bulk.rs
use crate::client::api::BackOfficeApi;
use crate::client::http::ApiError;
use crate::client::toast::Toast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Delete,
    Complete,
}

impl BulkAction {
    fn done_label(self) -> &'static str {
        match self {
            BulkAction::Delete => "silindi",
            BulkAction::Complete => "tamamlandı",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BulkReport {
    pub action: BulkAction,
    pub succeeded: Vec<i64>,
    pub failed: Vec<(i64, ApiError)>,
}

impl BulkReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// One toast for the whole run.
    pub fn toast(&self) -> Toast {
        let total = self.succeeded.len() + self.failed.len();
        if self.is_clean() {
            Toast::success(format!("{total} rezervasyon {}", self.action.done_label()))
        } else {
            Toast::error(format!(
                "İşlem tamamlanamadı: {}/{total} rezervasyon {}",
                self.succeeded.len(),
                self.action.done_label()
            ))
        }
    }
}

/// Applies `action` to each id in order. Earlier successes are not undone
/// when a later id fails.
pub fn run_bulk<A>(api: &A, action: BulkAction, ids: &[i64]) -> BulkReport
where
    A: BackOfficeApi + ?Sized,
{
    let mut report = BulkReport {
        action,
        succeeded: Vec::with_capacity(ids.len()),
        failed: Vec::new(),
    };
    for &id in ids {
        let result = match action {
            BulkAction::Delete => api.delete_reservation(id),
            BulkAction::Complete => api.complete_reservation(id).map(|_| ()),
        };
        match result {
            Ok(()) => report.succeeded.push(id),
            Err(e) => {
                tracing::warn!(reservation_id = id, ?action, error = %e, "bulk step failed");
                report.failed.push((id, e));
            }
        }
    }
    tracing::info!(
        ?action,
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "bulk run finished"
    );
    report
}
