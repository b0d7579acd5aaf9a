//! Home feed
//!
//! The feed is the one list endpoint that pages with `limit`/`cursor`
//! instead of `fetchSize`/`pageState`, and it answers without the `data`
//! envelope.

use async_trait::async_trait;
use cursor_pagination::{Page, PageRequest, PageSource, PaginatedCollection};
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use crate::config::Service;
use crate::error::{ClientError, Result};
use crate::http::{ApiClient, Envelope};
use crate::models::Post;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedResponse {
    #[serde(default)]
    posts: Vec<Post>,
    #[serde(default)]
    next_cursor: Option<String>,
    #[serde(default)]
    has_more: Option<bool>,
}

/// `GET /feed?limit=&cursor=`
#[derive(Debug, Clone)]
pub struct FeedSource {
    client: ApiClient,
}

impl FeedSource {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for FeedSource {
    type Item = Post;
    type Error = ClientError;

    async fn fetch_page(&self, request: PageRequest) -> Result<Page<Post>> {
        let mut query = vec![("limit", request.page_size.to_string())];
        if let Some(cursor) = &request.cursor {
            query.push(("cursor", cursor.clone()));
        }

        let builder = self
            .client
            .request(Method::GET, Service::Posts, "/feed")?
            .query(&query);
        let response: FeedResponse = self.client.execute(builder, Envelope::Bare).await?;

        debug!(
            count = response.posts.len(),
            has_more = ?response.has_more,
            "Feed page fetched"
        );
        Ok(Page::from_wire(
            response.posts,
            response.next_cursor,
            response.has_more,
        ))
    }
}

impl ApiClient {
    /// Empty feed collection using the configured page size
    pub fn feed(&self) -> PaginatedCollection<FeedSource> {
        PaginatedCollection::new(FeedSource::new(self.clone()), self.config().page_size)
    }
}
