use async_trait::async_trait;
use tracing::{error, info, warn};

use super::traits::{Notice, NoticeKind, Notifier};

/// Notifier that writes notices to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, notice: Notice) {
        let origin = notice.origin.as_deref().unwrap_or("-");
        match notice.kind {
            NoticeKind::Error => error!(origin, message = %notice.message, "Notice"),
            NoticeKind::Warning => warn!(origin, message = %notice.message, "Notice"),
            NoticeKind::Info | NoticeKind::Success => {
                info!(origin, kind = %notice.kind, message = %notice.message, "Notice")
            }
        }
    }
}
