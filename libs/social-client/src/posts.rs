//! Posts: create, edit, delete, share, and hashtag listings

use async_trait::async_trait;
use cursor_pagination::{Page, PageRequest, PageSource, PaginatedCollection};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::Service;
use crate::error::{ClientError, Result};
use crate::http::{page_state_query, path_id, ApiClient, Envelope};
use crate::mentions::validate_mentions;
use crate::models::{Attachment, NewPost, Post, PostUpdate, ShareRequest};

/// Maximum files attached to one post
pub const MAX_POST_FILES: usize = 10;

fn validate_new_post(post: &NewPost) -> Result<()> {
    if post.content.trim().is_empty() && post.files.is_empty() {
        return Err(ClientError::Validation("Post cannot be empty".to_string()));
    }
    if post.files.len() > MAX_POST_FILES {
        return Err(ClientError::Validation(format!(
            "A post can have at most {} files",
            MAX_POST_FILES
        )));
    }
    validate_mentions(&post.content, &post.mentions)
}

fn file_part(file: &Attachment) -> Result<Part> {
    Ok(Part::bytes(file.bytes.clone())
        .file_name(file.file_name.clone())
        .mime_str(&file.mime_type)?)
}

impl ApiClient {
    /// GET /posts/{id}
    pub async fn get_post(&self, post_id: &str) -> Result<Post> {
        let path = format!("/posts/{}", path_id("post id", post_id)?);
        let builder = self.request(Method::GET, Service::Posts, &path)?;
        self.execute(builder, Envelope::Wrapped).await
    }

    /// POST /posts as multipart: `content`, `mentions` (JSON) and one
    /// `files` part per attachment
    ///
    /// A post with blank content and no files is rejected before any
    /// request is made.
    pub async fn create_post(&self, post: &NewPost) -> Result<Post> {
        validate_new_post(post)?;

        let mut form = Form::new().text("content", post.content.clone());
        if !post.mentions.is_empty() {
            let mentions = serde_json::to_string(&post.mentions)
                .map_err(|e| ClientError::Validation(format!("Invalid mentions: {}", e)))?;
            form = form.text("mentions", mentions);
        }
        for file in &post.files {
            form = form.part("files", file_part(file)?);
        }

        let builder = self
            .request(Method::POST, Service::Posts, "/posts")?
            .multipart(form);
        let created: Post = self.execute(builder, Envelope::Wrapped).await?;
        info!(
            post_id = %created.id,
            files = post.files.len(),
            mentions = post.mentions.len(),
            "Post created"
        );
        Ok(created)
    }

    /// PATCH /posts/{id}
    pub async fn update_post(&self, post_id: &str, update: &PostUpdate) -> Result<Post> {
        if update.content.trim().is_empty() {
            return Err(ClientError::Validation("Post cannot be empty".to_string()));
        }
        validate_mentions(&update.content, &update.mentions)?;

        let path = format!("/posts/{}", path_id("post id", post_id)?);
        let builder = self
            .request(Method::PATCH, Service::Posts, &path)?
            .json(update);
        let updated: Post = self.execute(builder, Envelope::Wrapped).await?;
        info!(post_id = %updated.id, "Post updated");
        Ok(updated)
    }

    /// DELETE /posts/{id}
    pub async fn delete_post(&self, post_id: &str) -> Result<()> {
        let post_id = path_id("post id", post_id)?;
        let path = format!("/posts/{}", post_id);
        let builder = self.request(Method::DELETE, Service::Posts, &path)?;
        self.execute_empty(builder).await?;
        info!(post_id, "Post deleted");
        Ok(())
    }

    /// POST /posts/{id}/share, optionally with a caption
    pub async fn share_post(&self, post_id: &str, caption: Option<&str>) -> Result<Post> {
        let path = format!("/posts/{}/share", path_id("post id", post_id)?);
        let builder = self
            .request(Method::POST, Service::Posts, &path)?
            .json(&ShareRequest {
                content: caption.filter(|c| !c.trim().is_empty()),
            });
        let shared: Post = self.execute(builder, Envelope::Wrapped).await?;
        info!(post_id, share_id = %shared.id, "Post shared");
        Ok(shared)
    }

    /// Posts tagged with `hashtag` (leading `#` optional)
    pub fn hashtag_posts(&self, hashtag: &str) -> Result<PaginatedCollection<HashtagSource>> {
        let source = HashtagSource::new(self.clone(), hashtag)?;
        Ok(PaginatedCollection::new(source, self.config().page_size))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HashtagPage {
    #[serde(default)]
    posts: Vec<Post>,
    #[serde(default)]
    page_state: Option<String>,
    #[serde(default)]
    has_more: Option<bool>,
}

/// `GET /posts/hashtag/{tag}?fetchSize=&pageState=`
#[derive(Debug, Clone)]
pub struct HashtagSource {
    client: ApiClient,
    hashtag: String,
}

impl HashtagSource {
    pub fn new(client: ApiClient, hashtag: &str) -> Result<Self> {
        let hashtag = path_id("hashtag", hashtag.trim().trim_start_matches('#'))?.to_lowercase();
        Ok(Self { client, hashtag })
    }

    pub fn hashtag(&self) -> &str {
        &self.hashtag
    }
}

#[async_trait]
impl PageSource for HashtagSource {
    type Item = Post;
    type Error = ClientError;

    async fn fetch_page(&self, request: PageRequest) -> Result<Page<Post>> {
        let path = format!("/posts/hashtag/{}", self.hashtag);
        let builder = self
            .client
            .request(Method::GET, Service::Posts, &path)?
            .query(&page_state_query(&request));
        let page: HashtagPage = self.client.execute(builder, Envelope::Wrapped).await?;

        debug!(hashtag = %self.hashtag, count = page.posts.len(), "Hashtag page fetched");
        Ok(Page::from_wire(page.posts, page.page_state, page.has_more))
    }
}
