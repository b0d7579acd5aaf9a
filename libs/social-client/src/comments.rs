//! Comments and replies

use async_trait::async_trait;
use cursor_pagination::{Page, PageRequest, PageSource, PaginatedCollection};
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::Service;
use crate::error::{ClientError, Result};
use crate::http::{page_state_query, path_id, ApiClient, Envelope};
use crate::mentions::validate_mentions;
use crate::models::{Comment, CommentLike, NewComment};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentPage {
    #[serde(default)]
    comments: Vec<Comment>,
    #[serde(default)]
    page_state: Option<String>,
    #[serde(default)]
    has_more: Option<bool>,
}

impl From<CommentPage> for Page<Comment> {
    fn from(page: CommentPage) -> Self {
        Page::from_wire(page.comments, page.page_state, page.has_more)
    }
}

/// Top-level comments of a post:
/// `GET /comments/post/{postId}?fetchSize=&pageState=`
#[derive(Debug, Clone)]
pub struct CommentSource {
    client: ApiClient,
    post_id: String,
}

impl CommentSource {
    pub fn new(client: ApiClient, post_id: &str) -> Result<Self> {
        let post_id = path_id("post id", post_id)?.to_string();
        Ok(Self { client, post_id })
    }
}

#[async_trait]
impl PageSource for CommentSource {
    type Item = Comment;
    type Error = ClientError;

    async fn fetch_page(&self, request: PageRequest) -> Result<Page<Comment>> {
        let path = format!("/comments/post/{}", self.post_id);
        let builder = self
            .client
            .request(Method::GET, Service::Posts, &path)?
            .query(&page_state_query(&request));
        let page: CommentPage = self.client.execute(builder, Envelope::Wrapped).await?;
        debug!(post_id = %self.post_id, count = page.comments.len(), "Comment page fetched");
        Ok(page.into())
    }
}

/// Replies to one comment: `GET /comments/{id}/replies?fetchSize=&pageState=`
#[derive(Debug, Clone)]
pub struct ReplySource {
    client: ApiClient,
    comment_id: String,
}

impl ReplySource {
    pub fn new(client: ApiClient, comment_id: &str) -> Result<Self> {
        let comment_id = path_id("comment id", comment_id)?.to_string();
        Ok(Self { client, comment_id })
    }
}

#[async_trait]
impl PageSource for ReplySource {
    type Item = Comment;
    type Error = ClientError;

    async fn fetch_page(&self, request: PageRequest) -> Result<Page<Comment>> {
        let path = format!("/comments/{}/replies", self.comment_id);
        let builder = self
            .client
            .request(Method::GET, Service::Posts, &path)?
            .query(&page_state_query(&request));
        let page: CommentPage = self.client.execute(builder, Envelope::Wrapped).await?;
        debug!(comment_id = %self.comment_id, count = page.comments.len(), "Reply page fetched");
        Ok(page.into())
    }
}

impl ApiClient {
    pub fn comments(&self, post_id: &str) -> Result<PaginatedCollection<CommentSource>> {
        let source = CommentSource::new(self.clone(), post_id)?;
        Ok(PaginatedCollection::new(source, self.config().page_size))
    }

    pub fn replies(&self, comment_id: &str) -> Result<PaginatedCollection<ReplySource>> {
        let source = ReplySource::new(self.clone(), comment_id)?;
        Ok(PaginatedCollection::new(source, self.config().page_size))
    }

    /// POST /comments
    pub async fn create_comment(&self, comment: &NewComment) -> Result<Comment> {
        if comment.content.trim().is_empty() {
            return Err(ClientError::Validation("Comment cannot be empty".to_string()));
        }
        path_id("post id", &comment.post_id)?;
        validate_mentions(&comment.content, &comment.mentions)?;

        let builder = self
            .request(Method::POST, Service::Posts, "/comments")?
            .json(comment);
        let created: Comment = self.execute(builder, Envelope::Wrapped).await?;
        info!(
            comment_id = %created.id,
            post_id = %created.post_id,
            reply = created.parent_id.is_some(),
            "Comment created"
        );
        Ok(created)
    }

    /// POST /comments/{id}/like, toggling the signed-in user's like
    pub async fn like_comment(&self, comment_id: &str) -> Result<CommentLike> {
        let path = format!("/comments/{}/like", path_id("comment id", comment_id)?);
        let builder = self.request(Method::POST, Service::Posts, &path)?;
        self.execute(builder, Envelope::Wrapped).await
    }

    /// DELETE /comments/{id}
    pub async fn delete_comment(&self, comment_id: &str) -> Result<()> {
        let comment_id = path_id("comment id", comment_id)?;
        let path = format!("/comments/{}", comment_id);
        let builder = self.request(Method::DELETE, Service::Posts, &path)?;
        self.execute_empty(builder).await?;
        info!(comment_id, "Comment deleted");
        Ok(())
    }
}
