//! Notifications for the signed-in user

use async_trait::async_trait;
use cursor_pagination::{Page, PageRequest, PageSource, PaginatedCollection};
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::Service;
use crate::error::{ClientError, Result};
use crate::http::{page_state_query, path_id, ApiClient, Envelope};
use crate::models::{MarkReadRequest, Notification};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotificationPage {
    #[serde(default)]
    notifications: Vec<Notification>,
    #[serde(default)]
    page_state: Option<String>,
    #[serde(default)]
    has_more: Option<bool>,
}

/// `GET /notifications/me?fetchSize=&pageState=`
#[derive(Debug, Clone)]
pub struct NotificationSource {
    client: ApiClient,
}

impl NotificationSource {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for NotificationSource {
    type Item = Notification;
    type Error = ClientError;

    async fn fetch_page(&self, request: PageRequest) -> Result<Page<Notification>> {
        let builder = self
            .client
            .request(Method::GET, Service::Notifications, "/notifications/me")?
            .query(&page_state_query(&request));
        let page: NotificationPage = self.client.execute(builder, Envelope::Wrapped).await?;
        debug!(count = page.notifications.len(), "Notification page fetched");
        Ok(Page::from_wire(page.notifications, page.page_state, page.has_more))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnreadCount {
    count: u64,
}

impl ApiClient {
    pub fn notifications(&self) -> PaginatedCollection<NotificationSource> {
        PaginatedCollection::new(NotificationSource::new(self.clone()), self.config().page_size)
    }

    /// GET /notifications/me/unread-count
    pub async fn unread_notification_count(&self) -> Result<u64> {
        let builder = self.request(
            Method::GET,
            Service::Notifications,
            "/notifications/me/unread-count",
        )?;
        let unread: UnreadCount = self.execute(builder, Envelope::Wrapped).await?;
        Ok(unread.count)
    }

    /// PATCH /notifications/mark-read
    ///
    /// An empty id list is a no-op and makes no request.
    pub async fn mark_read(&self, notification_ids: &[String]) -> Result<()> {
        if notification_ids.is_empty() {
            return Ok(());
        }
        let builder = self
            .request(Method::PATCH, Service::Notifications, "/notifications/mark-read")?
            .json(&MarkReadRequest { notification_ids });
        self.execute_empty(builder).await?;
        info!(count = notification_ids.len(), "Notifications marked read");
        Ok(())
    }

    /// PATCH /notifications/mark-all-read
    pub async fn mark_all_read(&self) -> Result<()> {
        let builder = self.request(
            Method::PATCH,
            Service::Notifications,
            "/notifications/mark-all-read",
        )?;
        self.execute_empty(builder).await?;
        info!("All notifications marked read");
        Ok(())
    }

    /// DELETE /notifications/{id}
    pub async fn delete_notification(&self, notification_id: &str) -> Result<()> {
        let path = format!(
            "/notifications/{}",
            path_id("notification id", notification_id)?
        );
        let builder = self.request(Method::DELETE, Service::Notifications, &path)?;
        self.execute_empty(builder).await
    }
}
