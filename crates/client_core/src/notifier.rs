use std::{sync::Arc, time::Duration};

use shared::domain::Notification;
use tracing::debug;

use crate::view::{NotificationId, PageView, SharedPage};

pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_secs(5);

/// Shows dismissible notifications that remove themselves after a fixed time.
#[derive(Debug, Clone, Copy)]
pub struct Notifier {
    ttl: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_TTL)
    }
}

impl Notifier {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn show<P>(&self, page: &SharedPage<P>, notification: Notification) -> NotificationId
    where
        P: PageView + 'static,
    {
        let level = notification.level;
        let id = page.lock().await.push_notification(notification);
        debug!(?level, id = id.0, "notification shown");

        let page = Arc::clone(page);
        let ttl = self.ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if page.lock().await.dismiss_notification(id) {
                debug!(id = id.0, "notification auto-dismissed");
            }
        });

        id
    }

    pub async fn dismiss<P>(&self, page: &SharedPage<P>, id: NotificationId) -> bool
    where
        P: PageView + 'static,
    {
        page.lock().await.dismiss_notification(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{shared, MemoryPage};

    #[tokio::test(start_paused = true)]
    async fn notification_is_removed_after_ttl() {
        let page = shared(MemoryPage::new());
        let notifier = Notifier::default();
        notifier
            .show(&page, Notification::warning("Please upload a PDF file."))
            .await;

        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert_eq!(page.lock().await.notifications.len(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(page.lock().await.notifications.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn manual_dismiss_before_ttl_is_tolerated() {
        let page = shared(MemoryPage::new());
        let notifier = Notifier::new(Duration::from_secs(1));
        let id = notifier
            .show(&page, Notification::danger("Upload failed. Please try again."))
            .await;

        assert!(notifier.dismiss(&page, id).await);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(page.lock().await.notifications.is_empty());
        assert!(!notifier.dismiss(&page, id).await);
    }
}
