//! User profiles, search and avatars

use async_trait::async_trait;
use cursor_pagination::{Page, PageRequest, PageSource, PaginatedCollection};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::Service;
use crate::error::{ClientError, Result};
use crate::http::{page_state_query, path_id, ApiClient, Envelope};
use crate::models::{Attachment, UserProfile, UserSummary};

/// Largest avatar accepted before upload
pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchPage {
    #[serde(default)]
    users: Vec<UserSummary>,
    #[serde(default)]
    page_state: Option<String>,
    #[serde(default)]
    has_more: Option<bool>,
}

/// `GET /users/search?query=&fetchSize=&pageState=`
#[derive(Debug, Clone)]
pub struct UserSearchSource {
    client: ApiClient,
    query: String,
}

impl UserSearchSource {
    /// Blank queries are rejected; the server would return everyone
    pub fn new(client: ApiClient, query: &str) -> Result<Self> {
        let query = query.trim().trim_start_matches('@');
        if query.is_empty() {
            return Err(ClientError::Validation("Search query cannot be empty".to_string()));
        }
        Ok(Self {
            client,
            query: query.to_string(),
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

#[async_trait]
impl PageSource for UserSearchSource {
    type Item = UserSummary;
    type Error = ClientError;

    async fn fetch_page(&self, request: PageRequest) -> Result<Page<UserSummary>> {
        let builder = self
            .client
            .request(Method::GET, Service::Users, "/users/search")?
            .query(&[("query", self.query.as_str())])
            .query(&page_state_query(&request));
        let page: SearchPage = self.client.execute(builder, Envelope::Wrapped).await?;
        debug!(query = %self.query, count = page.users.len(), "User search page fetched");
        Ok(Page::from_wire(page.users, page.page_state, page.has_more))
    }
}

impl ApiClient {
    pub fn search_users(&self, query: &str) -> Result<PaginatedCollection<UserSearchSource>> {
        let source = UserSearchSource::new(self.clone(), query)?;
        Ok(PaginatedCollection::new(source, self.config().page_size))
    }

    /// GET /users/{id}
    pub async fn get_user(&self, user_id: &str) -> Result<UserProfile> {
        let path = format!("/users/{}", path_id("user id", user_id)?);
        let builder = self.request(Method::GET, Service::Users, &path)?;
        self.execute(builder, Envelope::Wrapped).await
    }

    /// Profile of the signed-in user
    pub async fn me(&self) -> Result<UserProfile> {
        let user_id = self.require_user_id()?;
        self.get_user(&user_id).await
    }

    /// POST /users/{id}/avatar as multipart with a single `avatar` part
    pub async fn upload_avatar(&self, avatar: &Attachment) -> Result<UserProfile> {
        let user_id = self.require_user_id()?;
        if !avatar.mime_type.starts_with("image/") {
            return Err(ClientError::Validation("Avatar must be an image".to_string()));
        }
        if avatar.bytes.is_empty() || avatar.bytes.len() > MAX_AVATAR_BYTES {
            return Err(ClientError::Validation(format!(
                "Avatar must be between 1 byte and {} MB",
                MAX_AVATAR_BYTES / (1024 * 1024)
            )));
        }

        let part = Part::bytes(avatar.bytes.clone())
            .file_name(avatar.file_name.clone())
            .mime_str(&avatar.mime_type)?;
        let path = format!("/users/{}/avatar", path_id("user id", &user_id)?);
        let builder = self
            .request(Method::POST, Service::Users, &path)?
            .multipart(Form::new().part("avatar", part));
        let profile: UserProfile = self.execute(builder, Envelope::Wrapped).await?;
        info!(user_id = %profile.id, bytes = avatar.bytes.len(), "Avatar uploaded");
        Ok(profile)
    }
}
